#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Centipede engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod config;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{ConfigError, GameConfig};

/// Number of bullet hits a mushroom absorbs before it is destroyed.
pub const MUSHROOM_MAX_HITS: u32 = 4;

/// Number of bullet hits a flea absorbs before it is destroyed.
pub const FLEA_MAX_HITS: u32 = 2;

/// Vertical distance, in cells, between a player and the bullet it carries.
pub const BULLET_CARRY_OFFSET: f32 = 0.25;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the playing grid with the provided dimensions, discarding all actors.
    ConfigureGrid {
        /// Number of rows laid out in the grid.
        rows: u32,
        /// Number of columns laid out in the grid.
        columns: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Creates an actor and registers it in the grid at the provided cell.
    SpawnActor {
        /// Description of the actor to create.
        spawn: ActorSpawn,
        /// Cell the actor occupies once spawned.
        cell: CellCoord,
    },
    /// Creates a fresh, unfired bullet and hands it to the player.
    IssueBullet {
        /// Player receiving the bullet.
        player: ActorId,
    },
    /// Attaches a grid mover to the actor so it can travel between cells.
    AttachMover {
        /// Actor that the mover drives.
        actor: ActorId,
        /// Speed and autopilot settings for the mover.
        config: MoverConfig,
    },
    /// Requests that the actor's mover heads toward the adjacent cell in `direction`.
    RequestDirection {
        /// Actor whose mover receives the request.
        actor: ActorId,
        /// Direction of the requested step.
        direction: Direction,
    },
    /// Links `follower` behind `segment` in a centipede chain.
    AttachSegment {
        /// Segment that leads.
        segment: ActorId,
        /// Segment directly behind the leader.
        follower: ActorId,
    },
    /// Replaces or clears the owner of an unfired bullet.
    SetBulletOwner {
        /// Bullet whose owner changes.
        bullet: ActorId,
        /// New owner, or `None` to clear the current one.
        owner: Option<ActorId>,
    },
    /// Fires the bullet currently held by the player.
    FireBullet {
        /// Player pulling the trigger.
        player: ActorId,
    },
    /// Overwrites the number of lives a player has left.
    SetPlayerLives {
        /// Player whose lives change.
        player: ActorId,
        /// New life count.
        lives: u32,
    },
    /// Adds or removes a collision group from the actor's exclusion list.
    SetCollisionExclusion {
        /// Actor whose exclusion list changes.
        actor: ActorId,
        /// Group to add or remove.
        group: CollisionGroup,
        /// Whether collisions with `group` are ignored.
        excluded: bool,
    },
    /// Removes every inactive actor, closing the current frame.
    EndFrame,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Number of rows in the new grid.
        rows: u32,
        /// Number of columns in the new grid.
        columns: u32,
    },
    /// Confirms that an actor entered the world.
    ActorSpawned {
        /// Identifier assigned to the actor.
        actor: ActorId,
        /// Description used to create the actor.
        spawn: ActorSpawn,
        /// Cell the actor occupies after spawning.
        cell: CellCoord,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Description of the rejected actor.
        spawn: ActorSpawn,
        /// Requested cell.
        cell: CellCoord,
        /// Reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a new unfired bullet was handed to a player.
    BulletIssued {
        /// Identifier assigned to the bullet.
        bullet: ActorId,
        /// Player now carrying the bullet.
        player: ActorId,
    },
    /// Reports that an unfired bullet changed hands.
    BulletOwnerChanged {
        /// Bullet whose owner changed.
        bullet: ActorId,
        /// Owner after the change.
        owner: Option<ActorId>,
    },
    /// Confirms that a player fired its bullet.
    BulletFired {
        /// Bullet that left the player.
        bullet: ActorId,
        /// Player that fired.
        player: ActorId,
        /// Cell the bullet starts travelling from.
        cell: CellCoord,
    },
    /// Confirms that a mover now drives the actor.
    MoverAttached {
        /// Identifier assigned to the mover.
        mover: MoverId,
        /// Actor driven by the mover.
        actor: ActorId,
    },
    /// Confirms that a mover was destroyed together with its target.
    MoverRemoved {
        /// Identifier of the destroyed mover.
        mover: MoverId,
    },
    /// Announces that a mover started travelling in a new direction.
    DirectionChanged {
        /// Actor being moved.
        actor: ActorId,
        /// Direction of travel.
        direction: Direction,
    },
    /// Confirms that an actor finished a move into an adjacent cell.
    AdjacentMoveEnded {
        /// Actor that arrived.
        actor: ActorId,
        /// Cell the actor left.
        from: CellCoord,
        /// Cell the actor occupies now.
        cell: CellCoord,
    },
    /// Reports that a requested move would leave the grid.
    GridBorderCollision {
        /// Actor whose move was refused.
        actor: ActorId,
        /// Cell the actor still occupies.
        cell: CellCoord,
        /// Direction that points outside the grid.
        direction: Direction,
    },
    /// Reports that a requested move ran into a blocking obstacle.
    MovementBlocked {
        /// Actor whose move was refused.
        actor: ActorId,
        /// Obstacle occupying the destination cell.
        obstacle: ActorId,
        /// Direction of the refused move.
        direction: Direction,
    },
    /// Reports that a centipede segment ran into a mushroom.
    SegmentStruckMushroom {
        /// Segment that collided.
        segment: ActorId,
        /// Mushroom that was struck.
        mushroom: ActorId,
        /// Cell the segment occupies.
        cell: CellCoord,
    },
    /// Confirms that two segments were chained.
    SegmentAttached {
        /// Leading segment.
        segment: ActorId,
        /// Segment directly behind the leader.
        follower: ActorId,
    },
    /// Reports that a body segment became a head.
    SegmentPromoted {
        /// Segment that became a head.
        segment: ActorId,
    },
    /// Reports that a mushroom absorbed a bullet without being destroyed.
    MushroomDamaged {
        /// Mushroom that was hit.
        mushroom: ActorId,
        /// Number of hits absorbed so far.
        hit_count: u32,
    },
    /// Reports that a mushroom became poisoned.
    MushroomPoisoned {
        /// Mushroom that was poisoned.
        mushroom: ActorId,
    },
    /// Reports that a flea absorbed a bullet.
    FleaHit {
        /// Flea that was hit.
        flea: ActorId,
        /// Number of hits absorbed so far.
        hit_count: u32,
    },
    /// Reports a change in a player's life count.
    PlayerLivesChanged {
        /// Player whose lives changed.
        player: ActorId,
        /// Lives left after the change.
        lives: u32,
    },
    /// Reports that an actor became inactive and will be removed at the end of the frame.
    ActorDeactivated {
        /// Actor that became inactive.
        actor: ActorId,
        /// Kind of the actor.
        kind: ActorKind,
        /// Reason for the deactivation.
        cause: DeactivationCause,
    },
    /// Confirms that an inactive actor was removed from the world.
    ActorRemoved {
        /// Actor that was removed.
        actor: ActorId,
        /// Kind of the actor.
        kind: ActorKind,
    },
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell, growing downwards.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell, growing to the right.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Returns the neighbouring cell in `direction`, if it lies inside a
    /// `rows` by `columns` grid.
    #[must_use]
    pub fn step(self, direction: Direction, rows: u32, columns: u32) -> Option<CellCoord> {
        let (row_delta, column_delta) = direction.delta();
        let row = self.row.checked_add_signed(row_delta)?;
        let column = self.column.checked_add_signed(column_delta)?;
        if row < rows && column < columns {
            Some(CellCoord::new(row, column))
        } else {
            None
        }
    }

    /// Position of the cell centre expressed in cell units.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Grid-aligned directions available to movers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
    /// Up and to the left.
    UpLeft,
    /// Up and to the right.
    UpRight,
    /// Down and to the left.
    DownLeft,
    /// Down and to the right.
    DownRight,
}

impl Direction {
    /// Row and column offsets produced by one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
            Self::UpLeft => (-1, -1),
            Self::UpRight => (-1, 1),
            Self::DownLeft => (1, -1),
            Self::DownRight => (1, 1),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::UpLeft => Self::DownRight,
            Self::UpRight => Self::DownLeft,
            Self::DownLeft => Self::UpRight,
            Self::DownRight => Self::UpLeft,
        }
    }

    /// Whether the direction only changes the column.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Whether the direction only changes the row.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Unique identifier assigned to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a grid mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoverId(u32);

impl MoverId {
    /// Creates a new mover identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Closed set of actor variants living in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActorKind {
    /// The user-controlled shooter.
    Player,
    /// Projectile carried and fired by the player.
    Bullet,
    /// One link of a centipede chain.
    CentipedeSegment,
    /// Horizontal crawler that poisons mushrooms.
    Scorpion,
    /// Vertical dropper that plants mushrooms.
    Flea,
    /// Destructible obstacle.
    Mushroom,
    /// Invisible wall delimiting the player's zone.
    Obstacle,
}

impl ActorKind {
    /// Collision group every actor of this kind belongs to.
    #[must_use]
    pub const fn collision_group(self) -> CollisionGroup {
        match self {
            Self::Player => CollisionGroup::Player,
            Self::Bullet => CollisionGroup::Bullet,
            Self::CentipedeSegment => CollisionGroup::CentipedeSegment,
            Self::Scorpion => CollisionGroup::Scorpion,
            Self::Flea => CollisionGroup::Flea,
            Self::Mushroom => CollisionGroup::Mushroom,
            Self::Obstacle => CollisionGroup::InvisibleWall,
        }
    }
}

/// Tags used to decide which actors may overlap, block or react.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionGroup {
    /// Group of the player.
    Player,
    /// Group of bullets.
    Bullet,
    /// Group of centipede segments.
    CentipedeSegment,
    /// Group of scorpions.
    Scorpion,
    /// Group of fleas.
    Flea,
    /// Group of mushrooms.
    Mushroom,
    /// Group of the walls fencing in the player.
    InvisibleWall,
}

/// Role of a segment within its centipede chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// Leading segment.
    Head,
    /// Trailing segment.
    Body,
}

/// Phase of a grid mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    /// Waiting for a direction request.
    Idle,
    /// Travelling toward the centre of an adjacent cell.
    MovingToAdjacentCell,
}

/// Reaction of a mover when a request would leave the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderPolicy {
    /// Only report the border collision.
    Report,
    /// Report the border collision and deactivate the target.
    Deactivate,
}

/// Settings used when attaching a mover to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoverConfig {
    /// Travel speed in cells per second.
    pub speed: f32,
    /// Direction requested on attachment and again after every arrival.
    pub cruise: Option<Direction>,
    /// Behaviour when the target runs into the grid border.
    pub on_border: BorderPolicy,
}

impl MoverConfig {
    /// Mover that only moves on explicit requests and reports borders.
    #[must_use]
    pub const fn steered(speed: f32) -> Self {
        Self {
            speed,
            cruise: None,
            on_border: BorderPolicy::Report,
        }
    }

    /// Mover that keeps heading in `direction` until it leaves the grid.
    #[must_use]
    pub const fn cruising(speed: f32, direction: Direction) -> Self {
        Self {
            speed,
            cruise: Some(direction),
            on_border: BorderPolicy::Deactivate,
        }
    }
}

/// Description of an actor to be created by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorSpawn {
    /// Player starting with the provided number of lives.
    Player {
        /// Initial life count.
        lives: u32,
    },
    /// Centipede segment facing the provided direction.
    CentipedeSegment {
        /// Head or body.
        segment_type: SegmentType,
        /// Initial heading.
        direction: Direction,
    },
    /// Scorpion.
    Scorpion,
    /// Flea.
    Flea,
    /// Mushroom.
    Mushroom,
    /// Invisible wall cell.
    InvisibleWall,
}

impl ActorSpawn {
    /// Kind of actor produced by this spawn description.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        match self {
            Self::Player { .. } => ActorKind::Player,
            Self::CentipedeSegment { .. } => ActorKind::CentipedeSegment,
            Self::Scorpion => ActorKind::Scorpion,
            Self::Flea => ActorKind::Flea,
            Self::Mushroom => ActorKind::Mushroom,
            Self::InvisibleWall => ActorKind::Obstacle,
        }
    }
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
}

/// Reasons an actor may become inactive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeactivationCause {
    /// Destroyed by bullet hits.
    Shot,
    /// A bullet that struck its target.
    Spent,
    /// Travelled into the grid border.
    LeftGrid,
    /// A player that ran out of lives.
    LivesExhausted,
    /// An unfired bullet that was replaced or lost its owner.
    Released,
}

/// Variant-specific state captured by an [`ActorSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActorDetails {
    /// Player state.
    Player {
        /// Lives left.
        lives: u32,
        /// Unfired bullet currently carried, if any.
        bullet: Option<ActorId>,
    },
    /// Bullet state.
    Bullet {
        /// Player owning the bullet, if any.
        owner: Option<ActorId>,
        /// Whether the bullet left its owner.
        fired: bool,
    },
    /// Centipede segment state.
    CentipedeSegment {
        /// Head or body.
        segment_type: SegmentType,
        /// Current heading.
        direction: Direction,
        /// Segment directly behind this one, if any.
        link: Option<ActorId>,
    },
    /// Scorpion state.
    Scorpion,
    /// Flea state.
    Flea {
        /// Bullet hits absorbed.
        hit_count: u32,
    },
    /// Mushroom state.
    Mushroom {
        /// Bullet hits absorbed.
        hit_count: u32,
        /// Whether a scorpion poisoned the mushroom.
        poisoned: bool,
    },
    /// Invisible wall.
    Obstacle,
}

/// Immutable representation of a single actor used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Unique identifier assigned to the actor.
    pub id: ActorId,
    /// Variant of the actor.
    pub kind: ActorKind,
    /// Whether the actor still takes part in the simulation.
    pub active: bool,
    /// Grid cell registered for the actor, if it is placed in the grid.
    pub cell: Option<CellCoord>,
    /// Continuous position in cell units.
    pub position: Vec2,
    /// Variant-specific state.
    pub details: ActorDetails,
}

/// Read-only snapshot describing all actors in the world.
#[derive(Clone, Debug, Default)]
pub struct ActorView {
    snapshots: Vec<ActorSnapshot>,
}

impl ActorView {
    /// Creates a new actor view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the actor with the provided identifier.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorSnapshot> {
        self.snapshots
            .binary_search_by_key(&actor, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured actors of the provided kind.
    #[must_use]
    pub fn count_of(&self, kind: ActorKind) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == kind)
            .count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ActorSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a grid mover.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoverSnapshot {
    /// Identifier assigned to the mover.
    pub id: MoverId,
    /// Actor driven by the mover, or `None` when the mover idles.
    pub target: Option<ActorId>,
    /// Current phase of the mover.
    pub state: MovementState,
    /// Direction of the most recent move.
    pub direction: Option<Direction>,
    /// Direction waiting to be applied once the mover is idle.
    pub queued: Option<Direction>,
    /// Travel speed in cells per second.
    pub speed: f32,
}

#[cfg(test)]
mod tests {
    use super::{ActorKind, ActorSpawn, CellCoord, CollisionGroup, Direction};

    #[test]
    fn step_stays_inside_grid() {
        let cell = CellCoord::new(0, 0);
        assert_eq!(cell.step(Direction::Up, 5, 5), None);
        assert_eq!(cell.step(Direction::Left, 5, 5), None);
        assert_eq!(
            cell.step(Direction::DownRight, 5, 5),
            Some(CellCoord::new(1, 1))
        );

        let corner = CellCoord::new(4, 4);
        assert_eq!(corner.step(Direction::Down, 5, 5), None);
        assert_eq!(corner.step(Direction::Right, 5, 5), None);
        assert_eq!(
            corner.step(Direction::UpLeft, 5, 5),
            Some(CellCoord::new(3, 3))
        );
    }

    #[test]
    fn opposite_directions_cancel_out() {
        let all = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::UpLeft,
            Direction::UpRight,
            Direction::DownLeft,
            Direction::DownRight,
        ];
        for direction in all {
            let (row, column) = direction.delta();
            let (opposite_row, opposite_column) = direction.opposite().delta();
            assert_eq!(row + opposite_row, 0);
            assert_eq!(column + opposite_column, 0);
        }
    }

    #[test]
    fn cell_center_sits_half_a_cell_in() {
        let center = CellCoord::new(2, 3).center();
        assert!((center.x - 3.5).abs() < f32::EPSILON);
        assert!((center.y - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn invisible_walls_spawn_as_obstacles() {
        assert_eq!(ActorSpawn::InvisibleWall.kind(), ActorKind::Obstacle);
        assert_eq!(
            ActorKind::Obstacle.collision_group(),
            CollisionGroup::InvisibleWall
        );
    }
}
