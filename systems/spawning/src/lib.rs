#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system for scorpions, fleas and player bullets.
//!
//! The system owns the scorpion and flea spawn timers, rolls the flea's
//! mushroom drops, keeps the player supplied with bullets and turns the
//! edge-triggered fire input into fire commands.

mod timer;

use std::time::Duration;

use centipede_core::{
    ActorId, ActorKind, ActorSpawn, CellCoord, Command, DeactivationCause, Direction, Event,
    GameConfig, MoverConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

pub use timer::IntervalTimer;

/// Chance that a flea plants a mushroom in a cell it enters.
const FLEA_DROP_PROBABILITY: f64 = 0.25;

/// Stream of the shared seed reserved for this system.
const RNG_STREAM: u64 = 1;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    scorpion_interval: Duration,
    flea_interval: Duration,
    scorpion_speed: f32,
    flea_speed: f32,
    bullet_speed: f32,
    player_area_height: u32,
    scorpions: bool,
    fleas: bool,
    mushrooms: bool,
    rng_seed: u64,
}

impl Config {
    /// Extracts the spawning parameters from the game configuration.
    #[must_use]
    pub fn new(game: &GameConfig) -> Self {
        Self {
            scorpion_interval: game.scorpion_interval(),
            flea_interval: game.flea_interval(),
            scorpion_speed: game.scorpion_speed,
            flea_speed: game.flea_speed,
            bullet_speed: game.bullet_speed,
            player_area_height: game.player_area_height,
            scorpions: game.enable_scorpions,
            fleas: game.enable_fleas,
            mushrooms: game.enable_mushrooms,
            rng_seed: game.rng_seed,
        }
    }
}

/// Pure system that emits spawn, mover and bullet commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
    scorpion_timer: IntervalTimer,
    flea_timer: IntervalTimer,
    rows: u32,
    columns: u32,
    flea: Option<ActorId>,
    player: Option<ActorId>,
    bullet_in_flight: Option<ActorId>,
    fire_latched: bool,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        rng.set_stream(RNG_STREAM);

        Self {
            config,
            rng,
            scorpion_timer: IntervalTimer::new(config.scorpion_interval),
            flea_timer: IntervalTimer::new(config.flea_interval),
            rows: 0,
            columns: 0,
            flea: None,
            player: None,
            bullet_in_flight: None,
            fire_latched: false,
        }
    }

    /// Flea spawn timer, exposed for inspection.
    #[must_use]
    pub const fn flea_timer(&self) -> &IntervalTimer {
        &self.flea_timer
    }

    /// Flea currently alive, if any.
    #[must_use]
    pub const fn flea(&self) -> Option<ActorId> {
        self.flea
    }

    /// Player tracked by the system, if it is alive.
    #[must_use]
    pub const fn player(&self) -> Option<ActorId> {
        self.player
    }

    /// Handles a fire key press.
    ///
    /// The shot happens immediately when the player stands still; otherwise
    /// it is latched and taken when the player arrives in its next cell.
    pub fn press_fire(&mut self, player_in_transit: bool, out: &mut Vec<Command>) {
        let Some(player) = self.player else {
            return;
        };
        self.fire_latched = true;
        if !player_in_transit {
            self.fire_latched = false;
            out.push(Command::FireBullet { player });
        }
    }

    /// Consumes events to emit spawn and bullet commands.
    pub fn handle<F>(&mut self, events: &[Event], is_mushroom_in_cell: F, out: &mut Vec<Command>)
    where
        F: Fn(CellCoord) -> bool,
    {
        for event in events {
            match event {
                Event::GridConfigured { rows, columns } => self.reset(*rows, *columns),
                Event::TimeAdvanced { dt } => self.advance_timers(*dt, out),
                Event::ActorSpawned { actor, spawn, cell } => {
                    self.on_spawned(*actor, *spawn, *cell, out);
                }
                Event::AdjacentMoveEnded { actor, cell, .. } => {
                    if Some(*actor) == self.flea {
                        self.roll_mushroom_drop(*cell, &is_mushroom_in_cell, out);
                    } else if Some(*actor) == self.player && self.fire_latched {
                        self.fire_latched = false;
                        out.push(Command::FireBullet { player: *actor });
                    }
                }
                Event::BulletFired { bullet, .. } => {
                    self.bullet_in_flight = Some(*bullet);
                    out.push(Command::AttachMover {
                        actor: *bullet,
                        config: MoverConfig::cruising(self.config.bullet_speed, Direction::Up),
                    });
                }
                Event::ActorDeactivated { actor, kind, cause } => {
                    self.on_deactivated(*actor, *kind, *cause, out);
                }
                _ => {}
            }
        }
    }

    fn reset(&mut self, rows: u32, columns: u32) {
        self.rows = rows;
        self.columns = columns;
        self.flea = None;
        self.player = None;
        self.bullet_in_flight = None;
        self.fire_latched = false;
        self.scorpion_timer = IntervalTimer::new(self.config.scorpion_interval);
        self.flea_timer = IntervalTimer::new(self.config.flea_interval);
    }

    fn advance_timers(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let scorpions = self.scorpion_timer.advance(dt);
        if self.config.scorpions {
            for _ in 0..scorpions {
                self.spawn_scorpion(out);
            }
        }

        if self.config.fleas && self.flea_timer.advance(dt) > 0 {
            self.spawn_flea(out);
        }
    }

    fn spawn_scorpion(&mut self, out: &mut Vec<Command>) {
        if self.rows == 0 || self.columns == 0 {
            return;
        }
        let last_row = self.rows - 1;
        let row = self
            .rng
            .gen_range(0..=last_row.saturating_sub(self.config.player_area_height));
        let column = if self.rng.gen_bool(0.5) {
            0
        } else {
            self.columns - 1
        };
        trace!(row, column, "scorpion spawn");
        out.push(Command::SpawnActor {
            spawn: ActorSpawn::Scorpion,
            cell: CellCoord::new(row, column),
        });
    }

    fn spawn_flea(&mut self, out: &mut Vec<Command>) {
        if self.columns == 0 {
            return;
        }
        self.flea_timer.pause();
        let column = self.rng.gen_range(0..self.columns);
        trace!(column, "flea spawn");
        out.push(Command::SpawnActor {
            spawn: ActorSpawn::Flea,
            cell: CellCoord::new(0, column),
        });
    }

    fn on_spawned(
        &mut self,
        actor: ActorId,
        spawn: ActorSpawn,
        cell: CellCoord,
        out: &mut Vec<Command>,
    ) {
        match spawn {
            ActorSpawn::Player { .. } => self.player = Some(actor),
            ActorSpawn::Scorpion => {
                let heading = if cell.column() == 0 {
                    Direction::Right
                } else {
                    Direction::Left
                };
                out.push(Command::AttachMover {
                    actor,
                    config: MoverConfig::cruising(self.config.scorpion_speed, heading),
                });
            }
            ActorSpawn::Flea => {
                self.flea = Some(actor);
                out.push(Command::AttachMover {
                    actor,
                    config: MoverConfig::cruising(self.config.flea_speed, Direction::Down),
                });
            }
            _ => {}
        }
    }

    fn roll_mushroom_drop<F>(
        &mut self,
        cell: CellCoord,
        is_mushroom_in_cell: &F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> bool,
    {
        let drop = self.rng.gen_bool(FLEA_DROP_PROBABILITY);
        if !self.config.mushrooms || !drop {
            return;
        }
        if cell.row() + 1 >= self.rows || is_mushroom_in_cell(cell) {
            return;
        }
        debug!(row = cell.row(), column = cell.column(), "flea plants a mushroom");
        out.push(Command::SpawnActor {
            spawn: ActorSpawn::Mushroom,
            cell,
        });
    }

    fn on_deactivated(
        &mut self,
        actor: ActorId,
        kind: ActorKind,
        cause: DeactivationCause,
        out: &mut Vec<Command>,
    ) {
        if Some(actor) == self.flea {
            self.flea = None;
            if cause == DeactivationCause::Shot {
                self.spawn_flea(out);
            } else {
                self.flea_timer.restart();
            }
        } else if Some(actor) == self.bullet_in_flight {
            self.bullet_in_flight = None;
            if let Some(player) = self.player {
                out.push(Command::IssueBullet { player });
            }
        } else if kind == ActorKind::Player && Some(actor) == self.player {
            self.player = None;
            self.fire_latched = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawning() -> Spawning {
        let mut spawning = Spawning::new(Config::new(&GameConfig::default()));
        let mut commands = Vec::new();
        spawning.handle(
            &[Event::GridConfigured {
                rows: 30,
                columns: 30,
            }],
            |_| false,
            &mut commands,
        );
        spawning
    }

    #[test]
    fn fire_without_player_is_ignored() {
        let mut spawning = spawning();
        let mut commands = Vec::new();
        spawning.press_fire(false, &mut commands);
        assert!(commands.is_empty());
        assert!(!spawning.fire_latched);
    }

    #[test]
    fn flea_drop_rate_is_roughly_a_quarter() {
        let mut spawning = spawning();
        spawning.flea = Some(ActorId::new(1));
        let mut drops = 0;
        for _ in 0..4_000 {
            let mut commands = Vec::new();
            spawning.roll_mushroom_drop(CellCoord::new(3, 3), &|_| false, &mut commands);
            drops += commands.len();
        }
        assert!((800..1_200).contains(&drops), "unexpected drop count {drops}");
    }

    #[test]
    fn fleas_never_plant_in_the_player_row_or_on_mushrooms() {
        let mut spawning = spawning();
        for _ in 0..200 {
            let mut commands = Vec::new();
            spawning.roll_mushroom_drop(CellCoord::new(29, 3), &|_| false, &mut commands);
            spawning.roll_mushroom_drop(CellCoord::new(4, 3), &|_| true, &mut commands);
            assert!(commands.is_empty());
        }
    }
}
