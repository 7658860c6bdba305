//! Centipede chains.

use centipede_core::{ActorId, Event, SegmentType};
use tracing::debug;

use crate::{
    actor::{ActorState, SegmentState},
    notify::{Listener, Topic},
    World,
};

impl World {
    /// Links `follower` directly behind `segment`.
    ///
    /// # Panics
    ///
    /// Panics when a segment is attached to itself.
    pub(crate) fn attach_segment(
        &mut self,
        segment: ActorId,
        follower: ActorId,
        out: &mut Vec<Event>,
    ) {
        assert_ne!(segment, follower, "a segment cannot follow itself");
        if self.segment_state_mut(follower).is_none() {
            debug!(follower = follower.get(), "follower is not a centipede segment");
            return;
        }
        let Some(leader) = self.segment_state_mut(segment) else {
            debug!(segment = segment.get(), "leader is not a centipede segment");
            return;
        };
        let previous_watch = leader.link_watch.take();
        let needs_promotion = leader.promotion.is_none();
        if let Some(previous) = previous_watch {
            let _ = self.subscriptions.unsubscribe(previous);
        }

        let link_watch = self.subscriptions.subscribe(
            follower,
            Topic::Destroyed,
            Listener::ForgetFollower { segment },
        );
        let promotion = needs_promotion.then(|| {
            self.subscriptions.subscribe(
                segment,
                Topic::Deactivated,
                Listener::PromoteFollower { segment },
            )
        });
        if let Some(leader) = self.segment_state_mut(segment) {
            leader.link = Some(follower);
            leader.link_watch = Some(link_watch);
            if promotion.is_some() {
                leader.promotion = promotion;
            }
        }
        if let Some(trailing) = self.segment_state_mut(follower) {
            trailing.segment_type = SegmentType::Body;
        }
        out.push(Event::SegmentAttached { segment, follower });
    }

    /// Turns the follower of a deactivated segment into a head.
    pub(crate) fn promote_follower(&mut self, segment: ActorId, out: &mut Vec<Event>) {
        let Some(follower) = self.segment_state_mut(segment).and_then(|state| state.link) else {
            return;
        };
        if let Some(trailing) = self.segment_state_mut(follower) {
            if trailing.segment_type == SegmentType::Body {
                trailing.segment_type = SegmentType::Head;
                out.push(Event::SegmentPromoted { segment: follower });
            }
        }
    }

    /// Clears the link of a segment whose follower is being destroyed.
    pub(crate) fn forget_follower(&mut self, segment: ActorId, follower: ActorId) {
        if let Some(state) = self.segment_state_mut(segment) {
            if state.link == Some(follower) {
                state.link = None;
                state.link_watch = None;
            }
        }
    }

    fn segment_state_mut(&mut self, segment: ActorId) -> Option<&mut SegmentState> {
        match self.actors.get_mut(&segment).map(|actor| &mut actor.state) {
            Some(ActorState::Segment(state)) => Some(state),
            _ => None,
        }
    }
}
