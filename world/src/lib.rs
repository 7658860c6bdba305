#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Centipede engine.
//!
//! The world owns the grid, every actor and every grid mover. It is mutated
//! exclusively through [`apply`], which executes one [`Command`] and reports
//! the resulting [`Event`]s, and it is observed through the [`query`] module.

mod actor;
mod bullets;
mod chain;
mod collision;
mod grid;
mod mover;
mod notify;

use std::collections::BTreeMap;

use centipede_core::{
    ActorId, ActorSpawn, CellCoord, CollisionGroup, Command, DeactivationCause, Event, MoverId,
};
use tracing::{debug, trace};

use crate::{
    actor::Actor,
    collision::Contacts,
    grid::Grid,
    mover::GridMover,
    notify::{Listener, Subscriptions, Topic},
};

const DEFAULT_GRID_ROWS: u32 = 30;
const DEFAULT_GRID_COLUMNS: u32 = 30;

/// Represents the authoritative Centipede world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    actors: BTreeMap<ActorId, Actor>,
    movers: BTreeMap<MoverId, GridMover>,
    subscriptions: Subscriptions,
    contacts: Contacts,
    next_actor: u32,
    next_mover: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with the default grid dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: Grid::new(DEFAULT_GRID_ROWS, DEFAULT_GRID_COLUMNS),
            actors: BTreeMap::new(),
            movers: BTreeMap::new(),
            subscriptions: Subscriptions::default(),
            contacts: Contacts::default(),
            next_actor: 0,
            next_mover: 0,
            tick_index: 0,
        }
    }

    fn configure_grid(&mut self, rows: u32, columns: u32) {
        self.grid = Grid::new(rows, columns);
        self.actors.clear();
        self.movers.clear();
        self.subscriptions.clear();
        self.contacts.clear();
        self.tick_index = 0;
    }

    fn allocate_actor_id(&mut self) -> ActorId {
        let id = ActorId::new(self.next_actor);
        self.next_actor = self.next_actor.wrapping_add(1);
        id
    }

    fn spawn_actor(&mut self, spawn: ActorSpawn, cell: CellCoord, out: &mut Vec<Event>) {
        let id = ActorId::new(self.next_actor);
        if let Err(reason) = self.grid.add_actor(id, spawn.kind(), cell) {
            debug!(?spawn, row = cell.row(), column = cell.column(), "spawn rejected");
            out.push(Event::SpawnRejected {
                spawn,
                cell,
                reason,
            });
            return;
        }

        let _ = self.allocate_actor_id();
        let _ = self.actors.insert(id, Actor::spawned(id, spawn, cell));
        out.push(Event::ActorSpawned {
            actor: id,
            spawn,
            cell,
        });
    }

    fn set_collision_exclusion(&mut self, actor: ActorId, group: CollisionGroup, excluded: bool) {
        let Some(target) = self.actors.get_mut(&actor) else {
            debug!(actor = actor.get(), "exclusion change for unknown actor");
            return;
        };
        let excludes = &mut target.filters.excludes;
        let _ = if excluded {
            excludes.insert(group)
        } else {
            excludes.remove(&group)
        };
    }

    /// Flags the actor inactive, detaching its mover and notifying listeners.
    fn deactivate(&mut self, actor: ActorId, cause: DeactivationCause, out: &mut Vec<Event>) {
        let Some(target) = self.actors.get_mut(&actor) else {
            return;
        };
        if !target.active {
            return;
        }
        target.active = false;
        let kind = target.kind();
        let mover = target.mover;

        if let Some(mover) = mover.and_then(|id| self.movers.get_mut(&id)) {
            mover.detach();
        }
        trace!(actor = actor.get(), ?kind, ?cause, "actor deactivated");
        out.push(Event::ActorDeactivated { actor, kind, cause });

        for listener in self.subscriptions.listeners(actor, Topic::Deactivated) {
            if let Listener::PromoteFollower { segment } = listener {
                self.promote_follower(segment, out);
            }
        }
    }

    /// Removes every inactive actor, repeating while destruction deactivates more.
    fn sweep(&mut self, out: &mut Vec<Event>) {
        loop {
            let inactive: Vec<ActorId> = self
                .actors
                .values()
                .filter(|actor| !actor.active)
                .map(|actor| actor.id)
                .collect();
            if inactive.is_empty() {
                break;
            }
            for actor in inactive {
                self.destroy(actor, out);
            }
        }
    }

    fn destroy(&mut self, actor: ActorId, out: &mut Vec<Event>) {
        for listener in self.subscriptions.listeners(actor, Topic::Destroyed) {
            match listener {
                Listener::ForgetOwner { bullet } => self.forget_owner(bullet, out),
                Listener::ForgetFollower { segment } => self.forget_follower(segment, actor),
                Listener::TearDownMover { mover } => {
                    if self.movers.remove(&mover).is_some() {
                        out.push(Event::MoverRemoved { mover });
                    }
                }
                Listener::SyncBullet { .. } | Listener::PromoteFollower { .. } => {}
            }
        }

        let _ = self.subscriptions.revoke_involving(actor);
        let _ = self.grid.remove(actor);
        self.contacts.forget(actor);
        if let Some(removed) = self.actors.remove(&actor) {
            out.push(Event::ActorRemoved {
                actor,
                kind: removed.kind(),
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { rows, columns } => {
            world.configure_grid(rows, columns);
            out_events.push(Event::GridConfigured { rows, columns });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            let arrivals = world.advance_movers(dt, out_events);
            world.evaluate_contacts(out_events);
            world.resume_movers(arrivals, out_events);
        }
        Command::SpawnActor { spawn, cell } => world.spawn_actor(spawn, cell, out_events),
        Command::IssueBullet { player } => world.issue_bullet(player, out_events),
        Command::AttachMover { actor, config } => world.attach_mover(actor, config, out_events),
        Command::RequestDirection { actor, direction } => {
            world.request_direction(actor, direction, out_events);
        }
        Command::AttachSegment { segment, follower } => {
            world.attach_segment(segment, follower, out_events);
        }
        Command::SetBulletOwner { bullet, owner } => {
            world.set_bullet_owner(bullet, owner, out_events);
        }
        Command::FireBullet { player } => world.fire_bullet(player, out_events),
        Command::SetPlayerLives { player, lives } => {
            world.set_player_lives(player, lives, out_events);
        }
        Command::SetCollisionExclusion {
            actor,
            group,
            excluded,
        } => world.set_collision_exclusion(actor, group, excluded),
        Command::EndFrame => world.sweep(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use centipede_core::{
        ActorId, ActorKind, ActorSnapshot, ActorView, CellCoord, CollisionGroup, MoverSnapshot,
    };

    use super::World;

    /// Rows and columns of the grid, in that order.
    #[must_use]
    pub fn grid_dimensions(world: &World) -> (u32, u32) {
        (world.grid.rows(), world.grid.columns())
    }

    /// Number of ticks processed since the grid was configured.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every actor, active or awaiting removal.
    #[must_use]
    pub fn actor_view(world: &World) -> ActorView {
        ActorView::from_snapshots(
            world
                .actors
                .values()
                .map(|actor| actor.snapshot(world.grid.actor_cell(actor.id)))
                .collect(),
        )
    }

    /// Snapshot of a single actor.
    #[must_use]
    pub fn actor(world: &World, actor: ActorId) -> Option<ActorSnapshot> {
        world
            .actors
            .get(&actor)
            .map(|found| found.snapshot(world.grid.actor_cell(actor)))
    }

    /// Snapshots of every live mover ordered by identifier.
    #[must_use]
    pub fn mover_view(world: &World) -> Vec<MoverSnapshot> {
        world.movers.values().map(|mover| mover.snapshot()).collect()
    }

    /// Snapshot of the mover attached to the actor, if it still exists.
    #[must_use]
    pub fn mover_for(world: &World, actor: ActorId) -> Option<MoverSnapshot> {
        world
            .actors
            .get(&actor)
            .and_then(|found| found.mover)
            .and_then(|mover| world.movers.get(&mover))
            .map(|mover| mover.snapshot())
    }

    /// Reports whether any registered actor occupies the cell.
    #[must_use]
    pub fn is_cell_occupied(world: &World, cell: CellCoord) -> bool {
        world.grid.is_cell_occupied(cell)
    }

    /// Reports whether a mushroom occupies the cell.
    #[must_use]
    pub fn is_mushroom_in_cell(world: &World, cell: CellCoord) -> bool {
        world.grid.is_mushroom_in_cell(cell)
    }

    /// Cell registered for the actor, or `None` when it is not in the grid.
    #[must_use]
    pub fn actor_cell(world: &World, actor: ActorId) -> Option<CellCoord> {
        world.grid.actor_cell(actor)
    }

    /// Actors registered at the cell in arrival order.
    #[must_use]
    pub fn occupants(world: &World, cell: CellCoord) -> Vec<ActorId> {
        world.grid.occupants(cell).collect()
    }

    /// Actors of the provided kind currently registered in the grid.
    #[must_use]
    pub fn actors_of_kind(world: &World, kind: ActorKind) -> Vec<ActorId> {
        world.grid.group(kind).collect()
    }

    /// Reports whether the actor currently ignores the collision group.
    #[must_use]
    pub fn is_excluding(world: &World, actor: ActorId, group: CollisionGroup) -> bool {
        world
            .actors
            .get(&actor)
            .is_some_and(|found| found.filters.excludes.contains(&group))
    }

    /// Number of live notification subscriptions.
    #[must_use]
    pub fn subscription_count(world: &World) -> usize {
        world.subscriptions.len()
    }
}
