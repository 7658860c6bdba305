//! Grid movers converting direction requests into cell-to-cell motion.

use std::time::Duration;

use centipede_core::{
    ActorId, BorderPolicy, CellCoord, DeactivationCause, Direction, Event, MoverConfig, MoverId,
    MoverSnapshot, MovementState,
};
use tracing::{debug, trace};

use crate::{
    actor::ActorState,
    notify::{Listener, SubscriptionId, Topic},
    World,
};

/// Distance, in cells, under which a mover counts as arrived.
const ARRIVAL_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Transit {
    Idle,
    Moving { from: CellCoord, to: CellCoord },
}

/// Component driving one actor between adjacent cells.
#[derive(Clone, Debug)]
pub(crate) struct GridMover {
    pub(crate) id: MoverId,
    pub(crate) target: Option<ActorId>,
    pub(crate) speed: f32,
    pub(crate) cruise: Option<Direction>,
    pub(crate) on_border: BorderPolicy,
    pub(crate) transit: Transit,
    pub(crate) direction: Option<Direction>,
    pub(crate) queued: Option<Direction>,
    /// Subscription to the target's destruction.
    pub(crate) teardown: SubscriptionId,
}

impl GridMover {
    /// Releases the target, leaving the mover idle until it is destroyed.
    pub(crate) fn detach(&mut self) {
        self.target = None;
        self.transit = Transit::Idle;
        self.queued = None;
    }

    pub(crate) fn snapshot(&self) -> MoverSnapshot {
        MoverSnapshot {
            id: self.id,
            target: self.target,
            state: match self.transit {
                Transit::Idle => MovementState::Idle,
                Transit::Moving { .. } => MovementState::MovingToAdjacentCell,
            },
            direction: self.direction,
            queued: self.queued,
            speed: self.speed,
        }
    }
}

impl World {
    pub(crate) fn attach_mover(
        &mut self,
        actor: ActorId,
        config: MoverConfig,
        out_events: &mut Vec<Event>,
    ) {
        let Some(target) = self.actors.get(&actor) else {
            debug!(actor = actor.get(), "mover requested for unknown actor");
            return;
        };
        if !target.active {
            debug!(actor = actor.get(), "mover requested for inactive actor");
            return;
        }
        let previous = target.mover;

        if let Some(previous) = previous.and_then(|id| self.movers.remove(&id)) {
            let _ = self.subscriptions.unsubscribe(previous.teardown);
            out_events.push(Event::MoverRemoved { mover: previous.id });
        }

        let id = MoverId::new(self.next_mover);
        self.next_mover = self.next_mover.wrapping_add(1);
        let teardown = self
            .subscriptions
            .subscribe(actor, Topic::Destroyed, Listener::TearDownMover { mover: id });
        let _ = self.movers.insert(
            id,
            GridMover {
                id,
                target: Some(actor),
                speed: config.speed,
                cruise: config.cruise,
                on_border: config.on_border,
                transit: Transit::Idle,
                direction: None,
                queued: None,
                teardown,
            },
        );
        if let Some(target) = self.actors.get_mut(&actor) {
            target.mover = Some(id);
        }
        out_events.push(Event::MoverAttached { mover: id, actor });

        if let Some(direction) = config.cruise {
            self.request_direction(actor, direction, out_events);
        }
    }

    /// Routes a direction request to the actor's mover.
    pub(crate) fn request_direction(
        &mut self,
        actor: ActorId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(mover_id) = self.actors.get(&actor).and_then(|actor| actor.mover) else {
            debug!(actor = actor.get(), "direction requested for actor without mover");
            return;
        };
        let Some(mover) = self.movers.get_mut(&mover_id) else {
            return;
        };
        if mover.target.is_none() {
            return;
        }

        match mover.transit {
            Transit::Moving { .. } => mover.queued = Some(direction),
            Transit::Idle => self.try_start_move(mover_id, direction, out_events),
        }
    }

    fn try_start_move(&mut self, mover_id: MoverId, direction: Direction, out: &mut Vec<Event>) {
        let Some(mover) = self.movers.get(&mover_id) else {
            return;
        };
        let Some(actor) = mover.target else {
            return;
        };
        let on_border = mover.on_border;
        if !self.actors.get(&actor).is_some_and(|target| target.active) {
            return;
        }
        let Some(cell) = self.grid.actor_cell(actor) else {
            trace!(actor = actor.get(), "mover target is not placed in the grid");
            return;
        };

        if let Some(obstacle) = self.blocking_obstacle(actor, cell) {
            trace!(actor = actor.get(), "mover target stands inside an obstacle");
            out.push(Event::MovementBlocked {
                actor,
                obstacle,
                direction,
            });
            self.react_to_contact(actor, obstacle, out);
            return;
        }

        let Some(next) = cell.step(direction, self.grid.rows(), self.grid.columns()) else {
            out.push(Event::GridBorderCollision {
                actor,
                cell,
                direction,
            });
            if on_border == BorderPolicy::Deactivate {
                self.deactivate(actor, DeactivationCause::LeftGrid, out);
            }
            return;
        };

        if let Some(obstacle) = self.blocking_obstacle(actor, next) {
            out.push(Event::MovementBlocked {
                actor,
                obstacle,
                direction,
            });
            self.react_to_contact(actor, obstacle, out);
            return;
        }

        let Some(mover) = self.movers.get_mut(&mover_id) else {
            return;
        };
        mover.transit = Transit::Moving { from: cell, to: next };
        if mover.direction != Some(direction) {
            mover.direction = Some(direction);
            out.push(Event::DirectionChanged { actor, direction });
        }
        if let Some(ActorState::Segment(segment)) =
            self.actors.get_mut(&actor).map(|target| &mut target.state)
        {
            segment.direction = direction;
        }
    }

    /// First active occupant of `cell` that stops `actor` from entering it.
    fn blocking_obstacle(&self, actor: ActorId, cell: CellCoord) -> Option<ActorId> {
        let mover = self.actors.get(&actor)?;
        self.grid.occupants(cell).find(|occupant| {
            *occupant != actor
                && self.actors.get(occupant).is_some_and(|other| {
                    other.active && other.filters.blocks(&mover.filters)
                })
        })
    }

    /// Moves every travelling target toward its destination cell.
    ///
    /// Returns the follow-up direction of every mover that arrived; they are
    /// applied by [`World::resume_movers`] once contacts in the new cells
    /// have been evaluated.
    pub(crate) fn advance_movers(
        &mut self,
        dt: Duration,
        out: &mut Vec<Event>,
    ) -> Vec<(MoverId, Direction)> {
        let distance = dt.as_secs_f32();
        let ids: Vec<MoverId> = self.movers.keys().copied().collect();
        let mut arrivals = Vec::new();

        for id in ids {
            let Some(mover) = self.movers.get(&id) else {
                continue;
            };
            let (Some(actor), Transit::Moving { from, to }) = (mover.target, mover.transit) else {
                continue;
            };
            let step = mover.speed * distance;
            let Some(target) = self.actors.get_mut(&actor) else {
                continue;
            };

            let destination = to.center();
            let remaining = destination - target.position;
            if remaining.length() > step + ARRIVAL_EPSILON {
                target.position += remaining.normalize_or_zero() * step;
                self.notify_position(actor);
                continue;
            }

            target.position = destination;
            self.grid.relocate(actor, to);
            let next = self.movers.get_mut(&id).and_then(|mover| {
                mover.transit = Transit::Idle;
                mover.queued.take().or(mover.cruise)
            });
            out.push(Event::AdjacentMoveEnded {
                actor,
                from,
                cell: to,
            });
            self.notify_position(actor);

            if let Some(direction) = next {
                arrivals.push((id, direction));
            }
        }
        arrivals
    }

    /// Starts the follow-up moves collected by [`World::advance_movers`].
    ///
    /// Movers whose target was deactivated in the meantime stay idle.
    pub(crate) fn resume_movers(
        &mut self,
        arrivals: Vec<(MoverId, Direction)>,
        out: &mut Vec<Event>,
    ) {
        for (id, direction) in arrivals {
            let ready = self
                .movers
                .get(&id)
                .is_some_and(|mover| mover.target.is_some() && mover.transit == Transit::Idle);
            if ready {
                self.try_start_move(id, direction, out);
            }
        }
    }
}
