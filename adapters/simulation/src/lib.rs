#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that runs the Centipede world and its systems.
//!
//! Every call to [`Simulation::step`] processes player input, advances the
//! world clock, lets the systems react until no further commands are issued,
//! and finally sweeps the actors that became inactive during the frame.

use std::time::Duration;

use centipede_core::{
    ActorId, ActorKind, Command, ConfigError, Direction, Event, GameConfig, MovementState,
};
use centipede_system_bootstrap::Bootstrap;
use centipede_system_centipede::{self as centipede_system, Centipede};
use centipede_system_spawning::{self as spawning_system, Spawning};
use centipede_world::{self as world, query, World};
use tracing::{debug, info, warn};

/// Upper bound on world/system exchanges performed for a single batch.
const MAX_SETTLE_PASSES: usize = 64;

/// Player input gathered for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Whether the fire key went down during the frame.
    pub fire: bool,
    /// Direction the player steers toward, if any.
    pub steer: Option<Direction>,
}

/// Owns the world and every system, advancing them in lockstep.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    bootstrap: Bootstrap,
    centipede: Centipede,
    spawning: Spawning,
    frames: u64,
}

impl Simulation {
    /// Validates the configuration and lays out the opening field.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut simulation = Self {
            world: World::new(),
            bootstrap: Bootstrap::new(&config),
            centipede: Centipede::new(centipede_system::Config::new(config.player_area_height)),
            spawning: Spawning::new(spawning_system::Config::new(&config)),
            frames: 0,
        };
        let plan = simulation.bootstrap.plan();
        let events = simulation.submit(plan);
        let (rows, columns) = query::grid_dimensions(&simulation.world);
        let actors = query::actor_view(&simulation.world);
        info!(
            rows,
            columns,
            mushrooms = actors.count_of(ActorKind::Mushroom),
            segments = actors.count_of(ActorKind::CentipedeSegment),
            events = events.len(),
            "field prepared"
        );
        Ok(simulation)
    }

    /// Runs one frame, returning every event the world emitted.
    pub fn step(&mut self, dt: Duration, input: FrameInput) -> Vec<Event> {
        self.frames += 1;
        let mut commands = Vec::new();

        if input.fire {
            self.spawning
                .press_fire(self.player_in_transit(), &mut commands);
        }
        if let (Some(direction), Some(player)) = (input.steer, self.spawning.player()) {
            commands.push(Command::RequestDirection {
                actor: player,
                direction,
            });
        }
        commands.push(Command::Tick { dt });

        let mut events = self.submit(commands);
        events.extend(self.submit(vec![Command::EndFrame]));
        events
    }

    /// Executes externally scripted commands and lets the systems react.
    pub fn submit(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut emitted = Vec::new();
        let mut pending = commands;

        for _ in 0..MAX_SETTLE_PASSES {
            if pending.is_empty() {
                return emitted;
            }
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.dispatch(&events, &mut pending);
            emitted.extend(events);
        }

        if !pending.is_empty() {
            warn!(
                frame = self.frames,
                dropped = pending.len(),
                "systems did not settle; dropping remaining commands"
            );
        }
        emitted
    }

    fn dispatch(&mut self, events: &[Event], out: &mut Vec<Command>) {
        if events.is_empty() {
            return;
        }
        self.bootstrap.handle(events, out);
        self.centipede.handle(events, out);
        let world = &self.world;
        self.spawning
            .handle(events, |cell| query::is_mushroom_in_cell(world, cell), out);
        debug!(events = events.len(), commands = out.len(), "systems reacted");
    }

    fn player_in_transit(&self) -> bool {
        self.spawning
            .player()
            .and_then(|player| query::mover_for(&self.world, player))
            .is_some_and(|mover| mover.state == MovementState::MovingToAdjacentCell)
    }

    /// Read-only access to the world for queries and rendering.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Player currently alive, if any.
    #[must_use]
    pub const fn player(&self) -> Option<ActorId> {
        self.spawning.player()
    }

    /// Number of frames stepped so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = GameConfig {
            grid_rows: 1,
            ..GameConfig::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn default_field_boots_with_an_armed_player() {
        let simulation = Simulation::new(GameConfig::default()).expect("valid configuration");
        let player = simulation.player().expect("player spawned");
        assert!(query::mover_for(simulation.world(), player).is_some());
        assert_eq!(simulation.frames(), 0);
    }

    #[test]
    fn idle_frames_advance_the_world_clock() {
        let mut simulation = Simulation::new(GameConfig::default()).expect("valid configuration");
        for _ in 0..3 {
            let events = simulation.step(Duration::from_millis(16), FrameInput::default());
            assert!(matches!(events.first(), Some(Event::TimeAdvanced { .. })));
        }
        assert_eq!(query::tick_index(simulation.world()), 3);
    }
}
