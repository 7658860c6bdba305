//! Collision reaction layer.
//!
//! Two actors are in contact while they share a grid cell and neither
//! excludes the other's collision group. Reactions run once when a contact
//! begins, and again whenever a mover is refused entry by an obstacle.

use std::collections::BTreeSet;

use centipede_core::{
    ActorId, ActorKind, DeactivationCause, Event, FLEA_MAX_HITS, MUSHROOM_MAX_HITS,
};

use crate::{actor::ActorState, World};

/// Pairs of actors currently sharing a cell, smaller id first.
#[derive(Clone, Debug, Default)]
pub(crate) struct Contacts {
    touching: BTreeSet<(ActorId, ActorId)>,
}

impl Contacts {
    pub(crate) fn forget(&mut self, actor: ActorId) {
        self.touching.retain(|(a, b)| *a != actor && *b != actor);
    }

    pub(crate) fn clear(&mut self) {
        self.touching.clear();
    }
}

/// State change applied to the first actor of a contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reaction {
    /// A bullet that struck something.
    Spend,
    /// Counts a bullet hit, deactivating at the limit.
    AbsorbHit { limit: u32 },
    /// Killed outright.
    Kill,
    /// Poisons the mushroom the actor crawls over.
    Poison,
    /// A centipede segment ran into a mushroom.
    SwitchRow,
    /// The player was touched by a hostile.
    LoseLife,
}

const fn reaction(actor: ActorKind, other: ActorKind) -> Option<Reaction> {
    use ActorKind::{Bullet, CentipedeSegment, Flea, Mushroom, Player, Scorpion};

    match (actor, other) {
        (Bullet, Mushroom | Scorpion | Flea | CentipedeSegment) => Some(Reaction::Spend),
        (Mushroom, Bullet) => Some(Reaction::AbsorbHit {
            limit: MUSHROOM_MAX_HITS,
        }),
        (Flea, Bullet) => Some(Reaction::AbsorbHit {
            limit: FLEA_MAX_HITS,
        }),
        (Scorpion | CentipedeSegment, Bullet) => Some(Reaction::Kill),
        (Scorpion, Mushroom) => Some(Reaction::Poison),
        (CentipedeSegment, Mushroom) => Some(Reaction::SwitchRow),
        (Player, CentipedeSegment | Flea) => Some(Reaction::LoseLife),
        _ => None,
    }
}

impl World {
    /// Reacts to every contact that began since the previous evaluation.
    pub(crate) fn evaluate_contacts(&mut self, out: &mut Vec<Event>) {
        let mut current = BTreeSet::new();
        for occupants in self.grid.crowded_cells() {
            for (index, (first, _)) in occupants.iter().enumerate() {
                for (second, _) in &occupants[index + 1..] {
                    if self.in_contact(*first, *second) {
                        let _ = current.insert((*first.min(second), *first.max(second)));
                    }
                }
            }
        }

        let begun: Vec<(ActorId, ActorId)> = current
            .difference(&self.contacts.touching)
            .copied()
            .collect();
        self.contacts.touching = current;

        for (first, second) in begun {
            self.react_to_contact(first, second, out);
        }
    }

    fn in_contact(&self, first: ActorId, second: ActorId) -> bool {
        match (self.actors.get(&first), self.actors.get(&second)) {
            (Some(a), Some(b)) => a.active && b.active && !a.filters.ignores(&b.filters),
            _ => false,
        }
    }

    /// Applies the reactions of both actors to each other.
    ///
    /// Both sides see the pair as it was before either reaction ran, so a
    /// bullet spending itself on a mushroom still damages the mushroom.
    pub(crate) fn react_to_contact(
        &mut self,
        first: ActorId,
        second: ActorId,
        out: &mut Vec<Event>,
    ) {
        if !self.in_contact(first, second) {
            return;
        }
        let (Some(first_kind), Some(second_kind)) = (self.kind_of(first), self.kind_of(second))
        else {
            return;
        };

        let forward = reaction(first_kind, second_kind);
        let backward = reaction(second_kind, first_kind);
        if let Some(effect) = forward {
            self.apply_reaction(first, second, effect, out);
        }
        if let Some(effect) = backward {
            self.apply_reaction(second, first, effect, out);
        }
    }

    fn apply_reaction(
        &mut self,
        actor: ActorId,
        other: ActorId,
        reaction: Reaction,
        out: &mut Vec<Event>,
    ) {
        match reaction {
            Reaction::Spend => self.deactivate(actor, DeactivationCause::Spent, out),
            Reaction::Kill => self.deactivate(actor, DeactivationCause::Shot, out),
            Reaction::AbsorbHit { limit } => self.absorb_hit(actor, limit, out),
            Reaction::Poison => {
                if let Some(ActorState::Mushroom { poisoned, .. }) =
                    self.actors.get_mut(&other).map(|mushroom| &mut mushroom.state)
                {
                    if !*poisoned {
                        *poisoned = true;
                        out.push(Event::MushroomPoisoned { mushroom: other });
                    }
                }
            }
            Reaction::SwitchRow => {
                if let Some(cell) = self.grid.actor_cell(actor) {
                    out.push(Event::SegmentStruckMushroom {
                        segment: actor,
                        mushroom: other,
                        cell,
                    });
                }
            }
            Reaction::LoseLife => {
                if let Some(ActorState::Player(player)) =
                    self.actors.get(&actor).map(|player| &player.state)
                {
                    let lives = player.lives.saturating_sub(1);
                    self.set_player_lives(actor, lives, out);
                }
            }
        }
    }

    fn absorb_hit(&mut self, actor: ActorId, limit: u32, out: &mut Vec<Event>) {
        let hit_count = match self.actors.get_mut(&actor).map(|target| &mut target.state) {
            Some(ActorState::Mushroom { hit_count, .. }) => {
                *hit_count = (*hit_count + 1).min(limit);
                if *hit_count < limit {
                    out.push(Event::MushroomDamaged {
                        mushroom: actor,
                        hit_count: *hit_count,
                    });
                }
                *hit_count
            }
            Some(ActorState::Flea { hit_count }) => {
                *hit_count = (*hit_count + 1).min(limit);
                out.push(Event::FleaHit {
                    flea: actor,
                    hit_count: *hit_count,
                });
                *hit_count
            }
            _ => return,
        };

        if hit_count >= limit {
            self.deactivate(actor, DeactivationCause::Shot, out);
        }
    }

    fn kind_of(&self, actor: ActorId) -> Option<ActorKind> {
        self.actors.get(&actor).map(|actor| actor.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_spend_themselves_on_every_hostile() {
        for target in [
            ActorKind::Mushroom,
            ActorKind::Scorpion,
            ActorKind::Flea,
            ActorKind::CentipedeSegment,
        ] {
            assert_eq!(reaction(ActorKind::Bullet, target), Some(Reaction::Spend));
        }
        assert_eq!(reaction(ActorKind::Bullet, ActorKind::Player), None);
    }

    #[test]
    fn scorpions_poison_mushrooms_without_counting_hits() {
        assert_eq!(
            reaction(ActorKind::Scorpion, ActorKind::Mushroom),
            Some(Reaction::Poison)
        );
        assert_eq!(reaction(ActorKind::Mushroom, ActorKind::Scorpion), None);
    }

    #[test]
    fn segments_switch_rows_on_mushrooms_and_die_to_bullets() {
        assert_eq!(
            reaction(ActorKind::CentipedeSegment, ActorKind::Mushroom),
            Some(Reaction::SwitchRow)
        );
        assert_eq!(
            reaction(ActorKind::CentipedeSegment, ActorKind::Bullet),
            Some(Reaction::Kill)
        );
        assert_eq!(
            reaction(ActorKind::Player, ActorKind::CentipedeSegment),
            Some(Reaction::LoseLife)
        );
    }
}
