//! Typed notification channels between actors.
//!
//! A subscription couples a source actor and a [`Topic`] with a [`Listener`]
//! describing the reaction. Every subscription is identified by a
//! [`SubscriptionId`] handle which its holder must release once the coupling
//! is no longer wanted; the world additionally revokes all subscriptions held
//! by or pointing at an actor when that actor is destroyed.

use std::collections::BTreeMap;

use centipede_core::{ActorId, MoverId};

/// Handle identifying a single subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SubscriptionId(u64);

/// Lifecycle or property changes an actor broadcasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Topic {
    /// The actor's continuous position changed.
    Position,
    /// The actor's active flag turned false.
    Deactivated,
    /// The actor is being removed from the world.
    Destroyed,
}

/// Reaction executed by the world when a topic fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Listener {
    /// Keeps a carried bullet glued to its owner.
    SyncBullet { bullet: ActorId },
    /// Clears a bullet's owner reference once the owner disappears.
    ForgetOwner { bullet: ActorId },
    /// Promotes the source segment's follower to head.
    PromoteFollower { segment: ActorId },
    /// Clears a segment's link once its follower disappears.
    ForgetFollower { segment: ActorId },
    /// Destroys the mover that drove the source actor.
    TearDownMover { mover: MoverId },
}

impl Listener {
    /// Actor that owns the subscription, if it is held by an actor at all.
    fn holder(self) -> Option<ActorId> {
        match self {
            Self::SyncBullet { bullet } | Self::ForgetOwner { bullet } => Some(bullet),
            Self::PromoteFollower { segment } | Self::ForgetFollower { segment } => Some(segment),
            Self::TearDownMover { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Subscription {
    source: ActorId,
    topic: Topic,
    listener: Listener,
}

/// Registry of live subscriptions.
#[derive(Clone, Debug, Default)]
pub(crate) struct Subscriptions {
    next_id: u64,
    entries: BTreeMap<SubscriptionId, Subscription>,
}

impl Subscriptions {
    pub(crate) fn subscribe(
        &mut self,
        source: ActorId,
        topic: Topic,
        listener: Listener,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            Subscription {
                source,
                topic,
                listener,
            },
        );
        id
    }

    /// Releases the subscription, reporting whether it was still live.
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Listeners registered for `topic` on `source`, in subscription order.
    pub(crate) fn listeners(&self, source: ActorId, topic: Topic) -> Vec<Listener> {
        self.entries
            .values()
            .filter(|entry| entry.source == source && entry.topic == topic)
            .map(|entry| entry.listener)
            .collect()
    }

    /// Revokes every subscription pointing at or held by `actor`.
    pub(crate) fn revoke_involving(&mut self, actor: ActorId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.source != actor && entry.listener.holder() != Some(actor));
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribe_releases_only_the_named_handle() {
        let mut subscriptions = Subscriptions::default();
        let player = ActorId::new(1);
        let bullet = ActorId::new(2);
        let tracking =
            subscriptions.subscribe(player, Topic::Position, Listener::SyncBullet { bullet });
        let _ = subscriptions.subscribe(player, Topic::Destroyed, Listener::ForgetOwner { bullet });

        assert!(subscriptions.unsubscribe(tracking));
        assert!(!subscriptions.unsubscribe(tracking));
        assert!(subscriptions.listeners(player, Topic::Position).is_empty());
        assert_eq!(
            subscriptions.listeners(player, Topic::Destroyed),
            vec![Listener::ForgetOwner { bullet }]
        );
    }

    #[test]
    fn revoke_involving_drops_held_and_sourced_subscriptions() {
        let mut subscriptions = Subscriptions::default();
        let player = ActorId::new(1);
        let bullet = ActorId::new(2);
        let segment = ActorId::new(3);
        let _ = subscriptions.subscribe(player, Topic::Position, Listener::SyncBullet { bullet });
        let _ = subscriptions.subscribe(
            bullet,
            Topic::Destroyed,
            Listener::TearDownMover {
                mover: MoverId::new(0),
            },
        );
        let _ = subscriptions.subscribe(
            segment,
            Topic::Deactivated,
            Listener::PromoteFollower { segment },
        );

        assert_eq!(subscriptions.revoke_involving(bullet), 2);
        assert_eq!(subscriptions.len(), 1);
    }
}
