#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Centipede session.

mod summary;

use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use centipede_core::GameConfig;
use centipede_simulation::{FrameInput, Simulation};
use clap::Parser;
use tracing::info;

use crate::summary::SessionSummary;

/// Runs the Centipede engine without a window and reports what happened.
#[derive(Debug, Parser)]
#[command(name = "centipede", version, about)]
struct CliArgs {
    /// TOML file with game preferences; missing keys keep their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Presses fire every N frames.
    #[arg(long, value_name = "N")]
    fire_every: Option<u64>,
    /// Prints the summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Centipede command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }

    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let starting_lives = config.enable_player.then_some(config.player_lives);
    let mut simulation = Simulation::new(config).context("game configuration is not playable")?;
    let mut summary = SessionSummary::new(starting_lives);

    for index in 0..args.frames {
        let fire = args
            .fire_every
            .is_some_and(|every| every > 0 && index % every == 0);
        let events = simulation.step(frame, FrameInput { fire, steer: None });
        summary.record(&events);

        if starting_lives.is_some() && simulation.player().is_none() {
            info!(frame = index, "player ran out of lives");
            break;
        }
    }

    summary.finish(simulation.world(), simulation.frames(), frame);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode the summary")?
        );
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid configuration in {}", path.display()))
}

fn parse_config(text: &str) -> Result<GameConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_override_only_the_listed_keys() {
        let config = parse_config(
            "GRID_ROWS = 20\nNUM_MUSHROOMS = 12\nENABLE_SCORPIONS = false\nRNG_SEED = 99\n",
        )
        .expect("valid preferences");
        assert_eq!(config.grid_rows, 20);
        assert_eq!(config.num_mushrooms, 12);
        assert!(!config.enable_scorpions);
        assert_eq!(config.rng_seed, 99);
        assert_eq!(config.grid_columns, GameConfig::default().grid_columns);
    }

    #[test]
    fn malformed_preferences_are_reported() {
        assert!(parse_config("GRID_ROWS = \"many\"").is_err());
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "centipede",
            "--frames",
            "30",
            "--fps",
            "30",
            "--fire-every",
            "5",
            "--json",
        ])
        .expect("valid flags");
        assert_eq!(args.frames, 30);
        assert_eq!(args.fire_every, Some(5));
        assert!(args.json);
        assert!(CliArgs::try_parse_from(["centipede", "--fps", "0"]).is_err());
    }
}
