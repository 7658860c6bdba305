//! Aggregated statistics reported at the end of a headless session.

use std::{collections::BTreeMap, fmt, time::Duration};

use centipede_core::{ActorKind, ActorSpawn, DeactivationCause, Event};
use centipede_world::{query, World};
use serde::Serialize;

/// Running tally of what happened during a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct SessionSummary {
    pub(crate) frames: u64,
    pub(crate) simulated_seconds: f64,
    pub(crate) shots_fired: u32,
    pub(crate) segments_destroyed: u32,
    pub(crate) mushrooms_destroyed: u32,
    pub(crate) fleas_destroyed: u32,
    pub(crate) scorpions_spawned: u32,
    pub(crate) fleas_spawned: u32,
    pub(crate) mushrooms_poisoned: u32,
    pub(crate) lives_lost: u32,
    pub(crate) player_lives: Option<u32>,
    pub(crate) remaining: BTreeMap<String, usize>,
}

impl SessionSummary {
    /// Starts a tally for a player holding `lives`, if one takes part.
    pub(crate) fn new(lives: Option<u32>) -> Self {
        Self {
            player_lives: lives,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::BulletFired { .. } => self.shots_fired += 1,
                Event::ActorSpawned { spawn, .. } => match spawn {
                    ActorSpawn::Scorpion => self.scorpions_spawned += 1,
                    ActorSpawn::Flea => self.fleas_spawned += 1,
                    _ => {}
                },
                Event::ActorDeactivated {
                    kind,
                    cause: DeactivationCause::Shot,
                    ..
                } => match kind {
                    ActorKind::CentipedeSegment => self.segments_destroyed += 1,
                    ActorKind::Mushroom => self.mushrooms_destroyed += 1,
                    ActorKind::Flea => self.fleas_destroyed += 1,
                    _ => {}
                },
                Event::MushroomPoisoned { .. } => self.mushrooms_poisoned += 1,
                Event::PlayerLivesChanged { lives, .. } => {
                    if let Some(previous) = self.player_lives {
                        self.lives_lost += previous.saturating_sub(*lives);
                    }
                    self.player_lives = Some(*lives);
                }
                _ => {}
            }
        }
    }

    /// Records the session length and the actors still on the field.
    pub(crate) fn finish(&mut self, world: &World, frames: u64, frame: Duration) {
        self.frames = frames;
        self.simulated_seconds = frame.as_secs_f64() * frames as f64;
        self.remaining.clear();
        for snapshot in query::actor_view(world).iter() {
            *self
                .remaining
                .entry(format!("{:?}", snapshot.kind))
                .or_default() += 1;
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} frames ({:.1}s simulated)",
            self.frames, self.simulated_seconds
        )?;
        writeln!(f, "shots fired:         {}", self.shots_fired)?;
        writeln!(f, "segments destroyed:  {}", self.segments_destroyed)?;
        writeln!(f, "mushrooms destroyed: {}", self.mushrooms_destroyed)?;
        writeln!(f, "mushrooms poisoned:  {}", self.mushrooms_poisoned)?;
        writeln!(
            f,
            "fleas destroyed:     {} of {}",
            self.fleas_destroyed, self.fleas_spawned
        )?;
        writeln!(f, "scorpions spawned:   {}", self.scorpions_spawned)?;
        match self.player_lives {
            Some(lives) => writeln!(f, "lives left:          {lives} ({} lost)", self.lives_lost)?,
            None => writeln!(f, "lives left:          -")?,
        }
        write!(f, "remaining actors:")?;
        for (kind, count) in &self.remaining {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}
