//! Actor records and their variant-specific state.

use std::collections::BTreeSet;

use centipede_core::{
    ActorDetails, ActorId, ActorKind, ActorSnapshot, ActorSpawn, CellCoord, CollisionGroup,
    Direction, MoverId, SegmentType,
};
use glam::Vec2;

use crate::notify::SubscriptionId;

/// An entity living in the world, placed in the grid or carried by a player.
#[derive(Clone, Debug)]
pub(crate) struct Actor {
    pub(crate) id: ActorId,
    pub(crate) active: bool,
    pub(crate) position: Vec2,
    pub(crate) filters: CollisionFilters,
    pub(crate) mover: Option<MoverId>,
    pub(crate) state: ActorState,
}

impl Actor {
    pub(crate) fn spawned(id: ActorId, spawn: ActorSpawn, cell: CellCoord) -> Self {
        let state = match spawn {
            ActorSpawn::Player { lives } => ActorState::Player(PlayerState {
                lives,
                bullet: None,
            }),
            ActorSpawn::CentipedeSegment {
                segment_type,
                direction,
            } => ActorState::Segment(SegmentState {
                segment_type,
                direction,
                link: None,
                link_watch: None,
                promotion: None,
            }),
            ActorSpawn::Scorpion => ActorState::Scorpion,
            ActorSpawn::Flea => ActorState::Flea { hit_count: 0 },
            ActorSpawn::Mushroom => ActorState::Mushroom {
                hit_count: 0,
                poisoned: false,
            },
            ActorSpawn::InvisibleWall => ActorState::Obstacle,
        };
        Self::with_state(id, state, cell.center())
    }

    pub(crate) fn bullet(id: ActorId, position: Vec2) -> Self {
        Self::with_state(id, ActorState::Bullet(BulletState::default()), position)
    }

    fn with_state(id: ActorId, state: ActorState, position: Vec2) -> Self {
        Self {
            id,
            active: true,
            position,
            filters: CollisionFilters::for_kind(state.kind()),
            mover: None,
            state,
        }
    }

    pub(crate) fn kind(&self) -> ActorKind {
        self.state.kind()
    }

    pub(crate) fn snapshot(&self, cell: Option<CellCoord>) -> ActorSnapshot {
        let details = match &self.state {
            ActorState::Player(player) => ActorDetails::Player {
                lives: player.lives,
                bullet: player.bullet,
            },
            ActorState::Bullet(bullet) => ActorDetails::Bullet {
                owner: bullet.owner,
                fired: bullet.fired,
            },
            ActorState::Segment(segment) => ActorDetails::CentipedeSegment {
                segment_type: segment.segment_type,
                direction: segment.direction,
                link: segment.link,
            },
            ActorState::Scorpion => ActorDetails::Scorpion,
            ActorState::Flea { hit_count } => ActorDetails::Flea {
                hit_count: *hit_count,
            },
            ActorState::Mushroom {
                hit_count,
                poisoned,
            } => ActorDetails::Mushroom {
                hit_count: *hit_count,
                poisoned: *poisoned,
            },
            ActorState::Obstacle => ActorDetails::Obstacle,
        };

        ActorSnapshot {
            id: self.id,
            kind: self.kind(),
            active: self.active,
            cell,
            position: self.position,
            details,
        }
    }
}

/// Variant payload of an [`Actor`].
#[derive(Clone, Debug)]
pub(crate) enum ActorState {
    Player(PlayerState),
    Bullet(BulletState),
    Segment(SegmentState),
    Scorpion,
    Flea { hit_count: u32 },
    Mushroom { hit_count: u32, poisoned: bool },
    Obstacle,
}

impl ActorState {
    pub(crate) const fn kind(&self) -> ActorKind {
        match self {
            Self::Player(_) => ActorKind::Player,
            Self::Bullet(_) => ActorKind::Bullet,
            Self::Segment(_) => ActorKind::CentipedeSegment,
            Self::Scorpion => ActorKind::Scorpion,
            Self::Flea { .. } => ActorKind::Flea,
            Self::Mushroom { .. } => ActorKind::Mushroom,
            Self::Obstacle => ActorKind::Obstacle,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PlayerState {
    pub(crate) lives: u32,
    pub(crate) bullet: Option<ActorId>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct BulletState {
    pub(crate) owner: Option<ActorId>,
    pub(crate) fired: bool,
    /// Subscription to the owner's position changes.
    pub(crate) tracking: Option<SubscriptionId>,
    /// Subscription to the owner's destruction.
    pub(crate) owner_watch: Option<SubscriptionId>,
}

#[derive(Clone, Debug)]
pub(crate) struct SegmentState {
    pub(crate) segment_type: SegmentType,
    pub(crate) direction: Direction,
    pub(crate) link: Option<ActorId>,
    /// Subscription to the follower's destruction.
    pub(crate) link_watch: Option<SubscriptionId>,
    /// Subscription to this segment's own deactivation.
    pub(crate) promotion: Option<SubscriptionId>,
}

/// Tag-based filters deciding which actors block or react to each other.
#[derive(Clone, Debug)]
pub(crate) struct CollisionFilters {
    pub(crate) group: CollisionGroup,
    pub(crate) excludes: BTreeSet<CollisionGroup>,
    pub(crate) obstacle: bool,
    pub(crate) allows: BTreeSet<CollisionGroup>,
}

impl CollisionFilters {
    pub(crate) fn for_kind(kind: ActorKind) -> Self {
        let (excludes, obstacle, allows): (&[CollisionGroup], bool, &[CollisionGroup]) = match kind
        {
            ActorKind::Player => (&[], false, &[]),
            ActorKind::Bullet => (&[CollisionGroup::InvisibleWall], false, &[]),
            ActorKind::CentipedeSegment => (
                &[CollisionGroup::InvisibleWall, CollisionGroup::Scorpion],
                false,
                &[],
            ),
            ActorKind::Scorpion => (&[CollisionGroup::InvisibleWall], false, &[]),
            ActorKind::Flea => (
                &[
                    CollisionGroup::InvisibleWall,
                    CollisionGroup::Mushroom,
                    CollisionGroup::Scorpion,
                ],
                false,
                &[],
            ),
            // Scorpions and bullets must overlap mushrooms to poison or hit them.
            ActorKind::Mushroom => (
                &[],
                true,
                &[CollisionGroup::Scorpion, CollisionGroup::Bullet],
            ),
            ActorKind::Obstacle => (&[], true, &[]),
        };

        Self {
            group: kind.collision_group(),
            excludes: excludes.iter().copied().collect(),
            obstacle,
            allows: allows.iter().copied().collect(),
        }
    }

    /// Whether either side excludes the other's group.
    pub(crate) fn ignores(&self, other: &CollisionFilters) -> bool {
        self.excludes.contains(&other.group) || other.excludes.contains(&self.group)
    }

    /// Whether this actor prevents `other` from entering its cell.
    pub(crate) fn blocks(&self, other: &CollisionFilters) -> bool {
        self.obstacle && !self.allows.contains(&other.group) && !self.ignores(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mushrooms_block_players_but_not_bullets() {
        let mushroom = CollisionFilters::for_kind(ActorKind::Mushroom);
        assert!(mushroom.blocks(&CollisionFilters::for_kind(ActorKind::Player)));
        assert!(mushroom.blocks(&CollisionFilters::for_kind(ActorKind::CentipedeSegment)));
        assert!(!mushroom.blocks(&CollisionFilters::for_kind(ActorKind::Bullet)));
        assert!(!mushroom.blocks(&CollisionFilters::for_kind(ActorKind::Scorpion)));
        assert!(!mushroom.blocks(&CollisionFilters::for_kind(ActorKind::Flea)));
    }

    #[test]
    fn invisible_walls_only_stop_the_player() {
        let wall = CollisionFilters::for_kind(ActorKind::Obstacle);
        assert!(wall.blocks(&CollisionFilters::for_kind(ActorKind::Player)));
        for kind in [
            ActorKind::Bullet,
            ActorKind::CentipedeSegment,
            ActorKind::Scorpion,
            ActorKind::Flea,
        ] {
            assert!(!wall.blocks(&CollisionFilters::for_kind(kind)), "{kind:?}");
        }
    }

    #[test]
    fn excluded_mushrooms_stop_blocking_segments() {
        let mushroom = CollisionFilters::for_kind(ActorKind::Mushroom);
        let mut segment = CollisionFilters::for_kind(ActorKind::CentipedeSegment);
        let _ = segment.excludes.insert(CollisionGroup::Mushroom);
        assert!(!mushroom.blocks(&segment));
        assert!(mushroom.ignores(&segment));
    }
}
