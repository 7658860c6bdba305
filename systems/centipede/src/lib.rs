#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Row-switching behaviour of centipede segments.
//!
//! Every segment crawls horizontally until it runs into a mushroom or the
//! grid border. It then drops (or climbs) one row along a diagonal while
//! ignoring mushrooms, and continues in the opposite horizontal direction.
//! Segments descend until they reach the bottom row, climb back up to the top
//! of the player's zone, and descend again from there.

use std::collections::BTreeMap;

use centipede_core::{ActorId, ActorSpawn, CollisionGroup, Command, Direction, Event};
use tracing::{debug, trace};

/// Configuration parameters required to construct the centipede system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    player_area_height: u32,
}

impl Config {
    /// Creates a new configuration for a field whose player zone spans
    /// `player_area_height` rows above the bottom row.
    #[must_use]
    pub const fn new(player_area_height: u32) -> Self {
        Self { player_area_height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Traveling,
    SwitchingRow { resume: Direction },
}

#[derive(Clone, Copy, Debug)]
struct SegmentBrain {
    heading: Direction,
    phase: Phase,
    descending: bool,
}

/// Pure system steering every centipede segment.
#[derive(Debug)]
pub struct Centipede {
    player_area_height: u32,
    last_row: u32,
    segments: BTreeMap<ActorId, SegmentBrain>,
}

impl Centipede {
    /// Creates a new centipede system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            player_area_height: config.player_area_height,
            last_row: 0,
            segments: BTreeMap::new(),
        }
    }

    /// Consumes world events and emits the segments' movement commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GridConfigured { rows, .. } => {
                    self.last_row = rows.saturating_sub(1);
                    self.segments.clear();
                }
                Event::ActorSpawned {
                    actor,
                    spawn: ActorSpawn::CentipedeSegment { direction, .. },
                    ..
                } => {
                    let _ = self.segments.insert(
                        *actor,
                        SegmentBrain {
                            heading: *direction,
                            phase: Phase::Traveling,
                            descending: true,
                        },
                    );
                }
                Event::MoverAttached { actor, .. } => {
                    if let Some(brain) = self.segments.get(actor) {
                        out.push(Command::RequestDirection {
                            actor: *actor,
                            direction: brain.heading,
                        });
                    }
                }
                Event::AdjacentMoveEnded { actor, .. } => self.arrive(*actor, out),
                Event::SegmentStruckMushroom { segment, cell, .. } => {
                    self.switch_row(*segment, cell.row(), out);
                }
                Event::GridBorderCollision {
                    actor,
                    cell,
                    direction,
                } => self.hit_border(*actor, cell.row(), *direction, out),
                Event::ActorRemoved { actor, .. } => {
                    let _ = self.segments.remove(actor);
                }
                _ => {}
            }
        }
    }

    fn arrive(&mut self, segment: ActorId, out: &mut Vec<Command>) {
        let Some(brain) = self.segments.get_mut(&segment) else {
            return;
        };
        if let Phase::SwitchingRow { resume } = brain.phase {
            out.push(Command::SetCollisionExclusion {
                actor: segment,
                group: CollisionGroup::Mushroom,
                excluded: false,
            });
            brain.heading = resume;
            brain.phase = Phase::Traveling;
        }
        out.push(Command::RequestDirection {
            actor: segment,
            direction: brain.heading,
        });
    }

    fn hit_border(
        &mut self,
        segment: ActorId,
        row: u32,
        direction: Direction,
        out: &mut Vec<Command>,
    ) {
        let Some(&SegmentBrain {
            phase, descending, ..
        }) = self.segments.get(&segment)
        else {
            return;
        };
        match phase {
            Phase::Traveling => self.switch_row(segment, row, out),
            Phase::SwitchingRow { .. } if !direction.is_vertical() => {
                let straight = if descending {
                    Direction::Down
                } else {
                    Direction::Up
                };
                trace!(segment = segment.get(), ?straight, "diagonal left the grid");
                out.push(Command::RequestDirection {
                    actor: segment,
                    direction: straight,
                });
            }
            Phase::SwitchingRow { .. } => {
                debug!(segment = segment.get(), "segment is boxed in by the border");
            }
        }
    }

    fn switch_row(&mut self, segment: ActorId, row: u32, out: &mut Vec<Command>) {
        let last_row = self.last_row;
        let turnaround_row = last_row.saturating_sub(self.player_area_height);
        let Some(brain) = self.segments.get_mut(&segment) else {
            return;
        };
        if brain.phase != Phase::Traveling {
            return;
        }

        if row == last_row {
            brain.descending = false;
        } else if row == turnaround_row {
            brain.descending = true;
        }

        let diagonal = match (brain.heading, brain.descending) {
            (Direction::Right, true) => Direction::DownLeft,
            (Direction::Right, false) => Direction::UpLeft,
            (Direction::Left, true) => Direction::DownRight,
            (Direction::Left, false) => Direction::UpRight,
            (heading, _) => panic!("segment switched rows while heading {heading:?}"),
        };
        brain.phase = Phase::SwitchingRow {
            resume: brain.heading.opposite(),
        };

        out.push(Command::SetCollisionExclusion {
            actor: segment,
            group: CollisionGroup::Mushroom,
            excluded: true,
        });
        out.push(Command::RequestDirection {
            actor: segment,
            direction: diagonal,
        });
    }
}

#[cfg(test)]
mod tests {
    use centipede_core::{CellCoord, SegmentType};

    use super::*;

    fn system_with_segment(rows: u32, heading: Direction) -> (Centipede, ActorId) {
        let segment = ActorId::new(4);
        let mut centipede = Centipede::new(Config::new(2));
        let mut commands = Vec::new();
        centipede.handle(
            &[
                Event::GridConfigured { rows, columns: 8 },
                Event::ActorSpawned {
                    actor: segment,
                    spawn: ActorSpawn::CentipedeSegment {
                        segment_type: SegmentType::Head,
                        direction: heading,
                    },
                    cell: CellCoord::new(0, 3),
                },
            ],
            &mut commands,
        );
        assert!(commands.is_empty());
        (centipede, segment)
    }

    fn border(actor: ActorId, row: u32, direction: Direction) -> Event {
        Event::GridBorderCollision {
            actor,
            cell: CellCoord::new(row, 0),
            direction,
        }
    }

    #[test]
    fn border_collision_descends_toward_the_opposite_side() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Right);
        let mut commands = Vec::new();
        centipede.handle(&[border(segment, 0, Direction::Right)], &mut commands);

        assert_eq!(
            commands,
            vec![
                Command::SetCollisionExclusion {
                    actor: segment,
                    group: CollisionGroup::Mushroom,
                    excluded: true,
                },
                Command::RequestDirection {
                    actor: segment,
                    direction: Direction::DownLeft,
                },
            ]
        );
    }

    #[test]
    fn arrival_after_switch_restores_mushrooms_and_reverses() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Left);
        let mut commands = Vec::new();
        centipede.handle(&[border(segment, 2, Direction::Left)], &mut commands);
        commands.clear();

        centipede.handle(
            &[Event::AdjacentMoveEnded {
                actor: segment,
                from: CellCoord::new(2, 0),
                cell: CellCoord::new(3, 1),
            }],
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![
                Command::SetCollisionExclusion {
                    actor: segment,
                    group: CollisionGroup::Mushroom,
                    excluded: false,
                },
                Command::RequestDirection {
                    actor: segment,
                    direction: Direction::Right,
                },
            ]
        );
    }

    #[test]
    fn bottom_row_turns_segments_upward_until_the_player_zone_top() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Right);
        let mut commands = Vec::new();

        centipede.handle(&[border(segment, 7, Direction::Right)], &mut commands);
        assert_eq!(
            commands.last(),
            Some(&Command::RequestDirection {
                actor: segment,
                direction: Direction::UpLeft,
            })
        );

        commands.clear();
        centipede.handle(
            &[
                Event::AdjacentMoveEnded {
                    actor: segment,
                    from: CellCoord::new(7, 7),
                    cell: CellCoord::new(6, 6),
                },
                border(segment, 6, Direction::Left),
            ],
            &mut commands,
        );
        assert_eq!(
            commands.last(),
            Some(&Command::RequestDirection {
                actor: segment,
                direction: Direction::UpRight,
            })
        );

        commands.clear();
        centipede.handle(
            &[
                Event::AdjacentMoveEnded {
                    actor: segment,
                    from: CellCoord::new(6, 0),
                    cell: CellCoord::new(5, 1),
                },
                border(segment, 5, Direction::Right),
            ],
            &mut commands,
        );
        assert_eq!(
            commands.last(),
            Some(&Command::RequestDirection {
                actor: segment,
                direction: Direction::DownLeft,
            })
        );
    }

    #[test]
    fn diagonal_leaving_the_grid_falls_back_to_a_straight_step() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Right);
        let mut commands = Vec::new();
        centipede.handle(&[border(segment, 0, Direction::Right)], &mut commands);
        commands.clear();

        centipede.handle(&[border(segment, 0, Direction::DownLeft)], &mut commands);
        assert_eq!(
            commands,
            vec![Command::RequestDirection {
                actor: segment,
                direction: Direction::Down,
            }]
        );

        commands.clear();
        centipede.handle(&[border(segment, 0, Direction::Down)], &mut commands);
        assert!(commands.is_empty());
    }

    #[test]
    fn removed_segments_are_forgotten() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Right);
        let mut commands = Vec::new();
        centipede.handle(
            &[
                Event::ActorRemoved {
                    actor: segment,
                    kind: centipede_core::ActorKind::CentipedeSegment,
                },
                border(segment, 0, Direction::Right),
            ],
            &mut commands,
        );
        assert!(commands.is_empty());
    }

    #[test]
    #[should_panic(expected = "segment switched rows while heading")]
    fn row_switch_requires_a_horizontal_heading() {
        let (mut centipede, segment) = system_with_segment(8, Direction::Down);
        let mut commands = Vec::new();
        centipede.handle(
            &[Event::SegmentStruckMushroom {
                segment,
                mushroom: ActorId::new(9),
                cell: CellCoord::new(1, 1),
            }],
            &mut commands,
        );
    }
}
