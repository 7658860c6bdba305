//! Player lives and bullet ownership.

use centipede_core::{ActorId, ActorKind, DeactivationCause, Event, BULLET_CARRY_OFFSET};
use glam::Vec2;
use tracing::debug;

use crate::{
    actor::{Actor, ActorState, BulletState},
    notify::{Listener, Topic},
    World,
};

impl World {
    /// Hands a fresh unfired bullet to the player, releasing the one it held.
    pub(crate) fn issue_bullet(&mut self, player: ActorId, out: &mut Vec<Event>) {
        let Some(Actor {
            active: true,
            state: ActorState::Player(_),
            position,
            ..
        }) = self.actors.get(&player)
        else {
            debug!(player = player.get(), "bullet issued to an absent player");
            return;
        };
        let position = *position;

        let bullet = self.allocate_actor_id();
        let _ = self.actors.insert(bullet, Actor::bullet(bullet, position));
        self.set_bullet_owner(bullet, Some(player), out);
        out.push(Event::BulletIssued { bullet, player });
    }

    /// Replaces or clears the owner of an unfired bullet.
    ///
    /// The bullet leaves the previous owner's slot and takes the new owner's
    /// slot; an unfired bullet the new owner held before is released.
    pub(crate) fn set_bullet_owner(
        &mut self,
        bullet: ActorId,
        owner: Option<ActorId>,
        out: &mut Vec<Event>,
    ) {
        let Some(state) = self.bullet_state_mut(bullet) else {
            debug!(bullet = bullet.get(), "owner change for unknown bullet");
            return;
        };
        if state.fired {
            return;
        }
        let previous_owner = state.owner.take();
        let revoked = [state.tracking.take(), state.owner_watch.take()];
        for subscription in revoked.into_iter().flatten() {
            let _ = self.subscriptions.unsubscribe(subscription);
        }
        if let Some(previous_owner) = previous_owner {
            if let Some(slot) = self.bullet_slot_mut(previous_owner) {
                if *slot == Some(bullet) {
                    *slot = None;
                }
            }
        }

        let Some(owner) = owner else {
            out.push(Event::BulletOwnerChanged {
                bullet,
                owner: None,
            });
            return;
        };
        if !self.actors.get(&owner).is_some_and(|actor| {
            actor.active && matches!(actor.state, ActorState::Player(_))
        }) {
            debug!(owner = owner.get(), "bullet owner must be an active player");
            out.push(Event::BulletOwnerChanged {
                bullet,
                owner: None,
            });
            return;
        }

        let held = self.bullet_slot_mut(owner).and_then(|slot| *slot);
        if let Some(held) = held.filter(|held| *held != bullet) {
            self.set_bullet_owner(held, None, out);
            self.deactivate(held, DeactivationCause::Released, out);
        }

        let tracking = self
            .subscriptions
            .subscribe(owner, Topic::Position, Listener::SyncBullet { bullet });
        let owner_watch = self
            .subscriptions
            .subscribe(owner, Topic::Destroyed, Listener::ForgetOwner { bullet });
        if let Some(state) = self.bullet_state_mut(bullet) {
            state.owner = Some(owner);
            state.tracking = Some(tracking);
            state.owner_watch = Some(owner_watch);
        }
        if let Some(slot) = self.bullet_slot_mut(owner) {
            *slot = Some(bullet);
        }
        self.sync_bullet(bullet, owner);
        out.push(Event::BulletOwnerChanged {
            bullet,
            owner: Some(owner),
        });
    }

    /// Fires the bullet held by the player from the player's cell.
    pub(crate) fn fire_bullet(&mut self, player: ActorId, out: &mut Vec<Event>) {
        let Some(cell) = self.grid.actor_cell(player) else {
            debug!(player = player.get(), "fire requested by an unplaced player");
            return;
        };
        let Some(bullet) = self.actors.get(&player).and_then(|actor| match &actor.state {
            ActorState::Player(holder) if actor.active => holder.bullet,
            _ => None,
        }) else {
            debug!(player = player.get(), "player has no bullet to fire");
            return;
        };
        if !self.fire(bullet, player) {
            debug!(bullet = bullet.get(), "bullet refused to fire");
            return;
        }

        if let Some(ActorState::Player(holder)) =
            self.actors.get_mut(&player).map(|actor| &mut actor.state)
        {
            holder.bullet = None;
        }
        if self.grid.add_actor(bullet, ActorKind::Bullet, cell).is_err() {
            return;
        }
        if let Some(actor) = self.actors.get_mut(&bullet) {
            actor.position = cell.center();
        }
        out.push(Event::BulletFired {
            bullet,
            player,
            cell,
        });
    }

    /// Marks the bullet fired, releasing its position tracking.
    fn fire(&mut self, bullet: ActorId, player: ActorId) -> bool {
        let active = self.actors.get(&bullet).is_some_and(|actor| actor.active);
        let Some(state) = self.bullet_state_mut(bullet) else {
            return false;
        };
        if state.fired || state.owner != Some(player) || !active {
            return false;
        }
        state.fired = true;
        if let Some(tracking) = state.tracking.take() {
            let _ = self.subscriptions.unsubscribe(tracking);
        }
        true
    }

    /// Overwrites the player's life count; a player without lives deactivates.
    pub(crate) fn set_player_lives(&mut self, player: ActorId, lives: u32, out: &mut Vec<Event>) {
        let Some(ActorState::Player(state)) =
            self.actors.get_mut(&player).map(|actor| &mut actor.state)
        else {
            debug!(player = player.get(), "lives set on unknown player");
            return;
        };
        if state.lives == lives {
            return;
        }
        state.lives = lives;
        out.push(Event::PlayerLivesChanged { player, lives });
        if lives == 0 {
            self.deactivate(player, DeactivationCause::LivesExhausted, out);
        }
    }

    /// Runs the position listeners registered on `actor`.
    pub(crate) fn notify_position(&mut self, actor: ActorId) {
        for listener in self.subscriptions.listeners(actor, Topic::Position) {
            if let Listener::SyncBullet { bullet } = listener {
                self.sync_bullet(bullet, actor);
            }
        }
    }

    /// Clears the owner of a bullet whose owner is being destroyed.
    pub(crate) fn forget_owner(&mut self, bullet: ActorId, out: &mut Vec<Event>) {
        let Some(state) = self.bullet_state_mut(bullet) else {
            return;
        };
        let fired = state.fired;
        state.owner = None;
        state.tracking = None;
        state.owner_watch = None;
        if !fired {
            self.deactivate(bullet, DeactivationCause::Released, out);
        }
    }

    fn sync_bullet(&mut self, bullet: ActorId, owner: ActorId) {
        let Some(anchor) = self.actors.get(&owner).map(|actor| actor.position) else {
            return;
        };
        if let Some(actor) = self.actors.get_mut(&bullet) {
            actor.position = anchor - Vec2::new(0.0, BULLET_CARRY_OFFSET);
        }
    }

    fn bullet_slot_mut(&mut self, player: ActorId) -> Option<&mut Option<ActorId>> {
        match self.actors.get_mut(&player).map(|actor| &mut actor.state) {
            Some(ActorState::Player(holder)) => Some(&mut holder.bullet),
            _ => None,
        }
    }

    fn bullet_state_mut(&mut self, bullet: ActorId) -> Option<&mut BulletState> {
        match self.actors.get_mut(&bullet).map(|actor| &mut actor.state) {
            Some(ActorState::Bullet(state)) => Some(state),
            _ => None,
        }
    }
}
