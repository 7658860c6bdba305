#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that lays out the opening Centipede field.
//!
//! [`Bootstrap::plan`] produces the commands that build the grid, the
//! invisible wall fencing in the player's zone, the centipede chain, the
//! mushroom field and the player. [`Bootstrap::handle`] then wires the freshly
//! spawned actors together once the world confirms them.

use std::collections::BTreeSet;

use centipede_core::{
    ActorId, ActorSpawn, CellCoord, Command, Direction, Event, GameConfig, MoverConfig,
    SegmentType,
};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Pure system describing the initial layout of a session.
#[derive(Debug)]
pub struct Bootstrap {
    config: GameConfig,
    last_segment: Option<ActorId>,
}

impl Bootstrap {
    /// Creates a bootstrap system for the provided configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            config: config.clone(),
            last_segment: None,
        }
    }

    /// Commands that build the opening field from scratch.
    ///
    /// # Panics
    ///
    /// Panics when more mushrooms are requested than free cells remain.
    #[must_use]
    pub fn plan(&self) -> Vec<Command> {
        let config = &self.config;
        let mut commands = vec![Command::ConfigureGrid {
            rows: config.grid_rows,
            columns: config.grid_columns,
        }];

        if config.enable_player {
            for column in 0..config.grid_columns {
                commands.push(Command::SpawnActor {
                    spawn: ActorSpawn::InvisibleWall,
                    cell: CellCoord::new(config.wall_row(), column),
                });
            }
        }

        let centipede = self.centipede_cells();
        for (index, cell) in centipede.iter().enumerate() {
            let segment_type = if index == 0 {
                SegmentType::Head
            } else {
                SegmentType::Body
            };
            commands.push(Command::SpawnActor {
                spawn: ActorSpawn::CentipedeSegment {
                    segment_type,
                    direction: Direction::Right,
                },
                cell: *cell,
            });
        }

        if config.enable_mushrooms {
            for cell in self.mushroom_cells(&centipede) {
                commands.push(Command::SpawnActor {
                    spawn: ActorSpawn::Mushroom,
                    cell,
                });
            }
        }

        if config.enable_player {
            commands.push(Command::SpawnActor {
                spawn: ActorSpawn::Player {
                    lives: config.player_lives,
                },
                cell: CellCoord::new(config.last_row(), config.center_column()),
            });
        }

        commands
    }

    /// Attaches movers, chains segments and arms the player.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GridConfigured { .. } => self.last_segment = None,
                Event::ActorSpawned {
                    actor,
                    spawn: ActorSpawn::CentipedeSegment { .. },
                    ..
                } => {
                    out.push(Command::AttachMover {
                        actor: *actor,
                        config: MoverConfig::steered(self.config.centipede_speed),
                    });
                    if let Some(leader) = self.last_segment.replace(*actor) {
                        out.push(Command::AttachSegment {
                            segment: leader,
                            follower: *actor,
                        });
                    }
                }
                Event::ActorSpawned {
                    actor,
                    spawn: ActorSpawn::Player { .. },
                    ..
                } => {
                    out.push(Command::AttachMover {
                        actor: *actor,
                        config: MoverConfig::steered(self.config.player_speed),
                    });
                    out.push(Command::IssueBullet { player: *actor });
                }
                _ => {}
            }
        }
    }

    fn centipede_cells(&self) -> Vec<CellCoord> {
        if !self.config.enable_centipedes {
            return Vec::new();
        }
        let head = self.config.center_column();
        (0..self.config.centipede_length)
            .filter_map(|index| head.checked_sub(index))
            .map(|column| CellCoord::new(0, column))
            .collect()
    }

    fn mushroom_cells(&self, centipede: &[CellCoord]) -> Vec<CellCoord> {
        let config = &self.config;
        let taken: BTreeSet<CellCoord> = centipede.iter().copied().collect();
        let mut free: Vec<CellCoord> = (0..config.last_row())
            .filter(|row| *row != config.wall_row())
            .flat_map(|row| (0..config.grid_columns).map(move |column| CellCoord::new(row, column)))
            .filter(|cell| !taken.contains(cell))
            .collect();

        let wanted = config.num_mushrooms as usize;
        assert!(
            wanted <= free.len(),
            "{wanted} mushrooms do not fit into {} free cells",
            free.len()
        );

        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let (chosen, _) = free.partial_shuffle(&mut rng, wanted);
        let mut cells = chosen.to_vec();
        cells.sort();
        debug!(count = cells.len(), "mushroom field planted");
        cells
    }
}
