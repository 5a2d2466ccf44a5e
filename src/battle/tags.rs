use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::EnumIter;

use crate::battle::commands::BattleCommand;
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleState, BattlerIndex};
use schema::{MoveId, StatusType};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemiInvulnerableState {
    Underground,
    InAir,
}

/// Volatile condition kinds. At most one tag per kind per Pokemon.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter,
)]
pub enum BattlerTagType {
    Substitute,
    Confused,
    Trapped,
    Seeded,
    Protected,
    Frenzy,
    Flinched,
    Disabled,
    SemiInvulnerable,
    Charging,
    Recharging,
    SaltCured,
    Endure,
    FocusEnergy,
    AquaRing,
    Ingrain,
    Drowsy,
    BypassSpeed,
}

/// What happens when a tag of a kind already present is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    Reject,
    Refresh,
    Stack { max_layers: u8 },
    /// Adding again removes the existing tag.
    Toggle,
}

impl BattlerTagType {
    pub fn merge_policy(self) -> MergePolicy {
        use BattlerTagType::*;
        match self {
            Substitute | Confused | Trapped | Seeded | Protected | Frenzy | Flinched | Disabled
            | SaltCured | Endure | FocusEnergy | AquaRing | Ingrain | Drowsy => MergePolicy::Reject,
            SemiInvulnerable | Charging | Recharging | BypassSpeed => MergePolicy::Refresh,
        }
    }

    /// Closed allow-list of tags Baton Pass hands to the incoming ally.
    pub fn is_baton_passable(self) -> bool {
        use BattlerTagType::*;
        match self {
            Substitute | Confused | Seeded | FocusEnergy | AquaRing | Ingrain => true,
            Trapped | Protected | Frenzy | Flinched | Disabled | SemiInvulnerable | Charging
            | Recharging | SaltCured | Endure | Drowsy | BypassSpeed => false,
        }
    }

    /// Turn-end countdown for a freshly added tag. Zero means permanent until removed.
    pub fn roll_duration(self, rng: &mut dyn BattleRng) -> u8 {
        use BattlerTagType::*;
        match self {
            Confused => rng.next_range(2, 5, "confusion duration") as u8,
            Trapped => rng.next_range(4, 5, "trap duration") as u8,
            Frenzy => rng.next_range(2, 3, "rampage duration") as u8,
            Disabled => 4,
            Drowsy => 2,
            Flinched | Protected | Endure | BypassSpeed => 1,
            Substitute | Seeded | SemiInvulnerable | Charging | Recharging | SaltCured
            | FocusEnergy | AquaRing | Ingrain => 0,
        }
    }
}

/// Per-kind payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TagData {
    Substitute { hp: u16 },
    Confused,
    Trapped,
    Seeded { source: BattlerIndex },
    Protected,
    Frenzy { move_id: MoveId },
    Flinched,
    Disabled { move_id: MoveId },
    SemiInvulnerable(SemiInvulnerableState),
    Charging { move_id: MoveId, targets: Vec<BattlerIndex> },
    Recharging,
    SaltCured,
    Endure,
    FocusEnergy,
    AquaRing,
    Ingrain,
    Drowsy,
    BypassSpeed,
}

impl TagData {
    pub fn kind(&self) -> BattlerTagType {
        match self {
            TagData::Substitute { .. } => BattlerTagType::Substitute,
            TagData::Confused => BattlerTagType::Confused,
            TagData::Trapped => BattlerTagType::Trapped,
            TagData::Seeded { .. } => BattlerTagType::Seeded,
            TagData::Protected => BattlerTagType::Protected,
            TagData::Frenzy { .. } => BattlerTagType::Frenzy,
            TagData::Flinched => BattlerTagType::Flinched,
            TagData::Disabled { .. } => BattlerTagType::Disabled,
            TagData::SemiInvulnerable(_) => BattlerTagType::SemiInvulnerable,
            TagData::Charging { .. } => BattlerTagType::Charging,
            TagData::Recharging => BattlerTagType::Recharging,
            TagData::SaltCured => BattlerTagType::SaltCured,
            TagData::Endure => BattlerTagType::Endure,
            TagData::FocusEnergy => BattlerTagType::FocusEnergy,
            TagData::AquaRing => BattlerTagType::AquaRing,
            TagData::Ingrain => BattlerTagType::Ingrain,
            TagData::Drowsy => BattlerTagType::Drowsy,
            TagData::BypassSpeed => BattlerTagType::BypassSpeed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BattlerTag {
    pub data: TagData,
    pub turns_remaining: u8,
    pub source_move: MoveId,
    /// Battle id of the Pokemon that created the tag.
    pub source_id: Option<u32>,
}

impl BattlerTag {
    pub fn new(data: TagData, turns_remaining: u8, source_move: MoveId, source_id: Option<u32>) -> Self {
        Self {
            data,
            turns_remaining,
            source_move,
            source_id,
        }
    }

    pub fn kind(&self) -> BattlerTagType {
        self.data.kind()
    }

    pub fn is_permanent(&self) -> bool {
        self.turns_remaining == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAddOutcome {
    Added,
    Refreshed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstituteHit {
    pub absorbed: u16,
    pub broke: bool,
}

/// Volatile tags of one Pokemon, iterated in kind order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeMap<BattlerTagType, BattlerTag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: BattlerTag) -> TagAddOutcome {
        let kind = tag.kind();
        if !self.tags.contains_key(&kind) {
            self.tags.insert(kind, tag);
            return TagAddOutcome::Added;
        }
        match kind.merge_policy() {
            MergePolicy::Reject => TagAddOutcome::Rejected,
            MergePolicy::Refresh => {
                self.tags.insert(kind, tag);
                TagAddOutcome::Refreshed
            }
            // Battler tags never stack or toggle; those policies belong to arena tags.
            MergePolicy::Stack { .. } | MergePolicy::Toggle => TagAddOutcome::Rejected,
        }
    }

    pub fn remove(&mut self, kind: BattlerTagType) -> Option<BattlerTag> {
        self.tags.remove(&kind)
    }

    pub fn has(&self, kind: BattlerTagType) -> bool {
        self.tags.contains_key(&kind)
    }

    pub fn get(&self, kind: BattlerTagType) -> Option<&BattlerTag> {
        self.tags.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattlerTag> {
        self.tags.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Counts down every timed tag and returns the ones that reached zero.
    pub fn tick_turn_end(&mut self) -> Vec<BattlerTag> {
        let mut expired_kinds = Vec::new();
        for (kind, tag) in self.tags.iter_mut() {
            if tag.turns_remaining > 0 {
                tag.turns_remaining -= 1;
                if tag.turns_remaining == 0 {
                    expired_kinds.push(*kind);
                }
            }
        }
        expired_kinds
            .into_iter()
            .filter_map(|kind| self.tags.remove(&kind))
            .collect()
    }

    /// Clears everything on switch-out, handing back the Baton Pass allow-list.
    pub fn take_on_switch_out(&mut self) -> Vec<BattlerTag> {
        std::mem::take(&mut self.tags)
            .into_values()
            .filter(|tag| tag.kind().is_baton_passable())
            .collect()
    }

    pub fn substitute_hp(&self) -> Option<u16> {
        match self.tags.get(&BattlerTagType::Substitute) {
            Some(BattlerTag {
                data: TagData::Substitute { hp },
                ..
            }) => Some(*hp),
            _ => None,
        }
    }

    /// Routes damage into the Substitute's own pool. Excess damage is discarded.
    pub fn damage_substitute(&mut self, amount: u16) -> Option<SubstituteHit> {
        let tag = self.tags.get_mut(&BattlerTagType::Substitute)?;
        let TagData::Substitute { hp } = &mut tag.data else {
            return None;
        };
        let absorbed = amount.min(*hp);
        *hp -= absorbed;
        Some(SubstituteHit {
            absorbed,
            broke: *hp == 0,
        })
    }

    pub fn semi_invulnerable_state(&self) -> Option<SemiInvulnerableState> {
        match self.tags.get(&BattlerTagType::SemiInvulnerable) {
            Some(BattlerTag {
                data: TagData::SemiInvulnerable(state),
                ..
            }) => Some(*state),
            _ => None,
        }
    }

    pub fn disabled_move(&self) -> Option<MoveId> {
        match self.tags.get(&BattlerTagType::Disabled) {
            Some(BattlerTag {
                data: TagData::Disabled { move_id },
                ..
            }) => Some(*move_id),
            _ => None,
        }
    }
}

/// Follow-up commands when a timed tag runs out on `owner`.
pub fn expire_commands(
    state: &BattleState,
    owner: BattlerIndex,
    tag: &BattlerTag,
    rng: &mut dyn BattleRng,
) -> Vec<BattleCommand> {
    let Some(pokemon) = state.pokemon(owner) else {
        return Vec::new();
    };
    let actor = Actor::new(owner, pokemon);
    match &tag.data {
        TagData::Confused => vec![BattleCommand::EmitEvent(BattleEvent::ConfusionEnded {
            target: actor,
        })],
        TagData::Trapped => vec![BattleCommand::EmitEvent(BattleEvent::TagRemoved {
            target: actor,
            tag: BattlerTagType::Trapped,
        })],
        TagData::Disabled { move_id } => vec![BattleCommand::EmitEvent(BattleEvent::DisableEnded {
            target: actor,
            move_id: *move_id,
        })],
        TagData::Frenzy { .. } => {
            // Rampage ends in fatigue-induced confusion.
            if crate::battle::pipeline::tag_blocked(state, owner, BattlerTagType::Confused, false)
                .is_some()
                || pokemon.tags.has(BattlerTagType::Confused)
            {
                return Vec::new();
            }
            let turns = BattlerTagType::Confused.roll_duration(rng);
            vec![BattleCommand::AddTag {
                target: owner,
                tag: BattlerTag::new(TagData::Confused, turns, tag.source_move, Some(pokemon.id)),
            }]
        }
        TagData::Drowsy => {
            if pokemon.status.is_some()
                || crate::battle::pipeline::status_blocked(state, owner, StatusType::Sleep, false)
                    .is_some()
            {
                return Vec::new();
            }
            vec![BattleCommand::InflictStatus {
                target: owner,
                status: StatusType::Sleep,
            }]
        }
        TagData::Substitute { .. }
        | TagData::Seeded { .. }
        | TagData::Protected
        | TagData::Flinched
        | TagData::SemiInvulnerable(_)
        | TagData::Charging { .. }
        | TagData::Recharging
        | TagData::SaltCured
        | TagData::Endure
        | TagData::FocusEnergy
        | TagData::AquaRing
        | TagData::Ingrain
        | TagData::BypassSpeed => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::rng::TurnRng;
    use crate::battle::state::SideId;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn simple(data: TagData, turns: u8) -> BattlerTag {
        BattlerTag::new(data, turns, MoveId::None, None)
    }

    #[test]
    fn test_reject_policy_keeps_original() {
        let mut tags = TagSet::new();
        assert_eq!(tags.add(simple(TagData::Confused, 3)), TagAddOutcome::Added);
        assert_eq!(tags.add(simple(TagData::Confused, 5)), TagAddOutcome::Rejected);
        assert_eq!(tags.get(BattlerTagType::Confused).map(|t| t.turns_remaining), Some(3));
    }

    #[test]
    fn test_refresh_policy_replaces() {
        let mut tags = TagSet::new();
        tags.add(simple(TagData::SemiInvulnerable(SemiInvulnerableState::Underground), 0));
        assert_eq!(
            tags.add(simple(TagData::SemiInvulnerable(SemiInvulnerableState::InAir), 0)),
            TagAddOutcome::Refreshed
        );
        assert_eq!(tags.semi_invulnerable_state(), Some(SemiInvulnerableState::InAir));
    }

    #[test]
    fn test_every_kind_has_a_battler_policy() {
        for kind in BattlerTagType::iter() {
            assert!(matches!(
                kind.merge_policy(),
                MergePolicy::Reject | MergePolicy::Refresh
            ));
        }
    }

    #[test]
    fn test_tick_turn_end_expires_at_zero_and_keeps_permanent() {
        let mut tags = TagSet::new();
        tags.add(simple(TagData::Flinched, 1));
        tags.add(simple(TagData::Drowsy, 2));
        tags.add(simple(TagData::SaltCured, 0));

        let expired: Vec<BattlerTagType> = tags.tick_turn_end().iter().map(|t| t.kind()).collect();
        assert_eq!(expired, vec![BattlerTagType::Flinched]);

        let expired: Vec<BattlerTagType> = tags.tick_turn_end().iter().map(|t| t.kind()).collect();
        assert_eq!(expired, vec![BattlerTagType::Drowsy]);
        assert!(tags.has(BattlerTagType::SaltCured));
    }

    #[test]
    fn test_substitute_absorbs_without_carry_over() {
        let mut tags = TagSet::new();
        tags.add(simple(TagData::Substitute { hp: 25 }, 0));

        let hit = tags.damage_substitute(10).unwrap();
        assert_eq!(hit, SubstituteHit { absorbed: 10, broke: false });
        assert_eq!(tags.substitute_hp(), Some(15));

        let hit = tags.damage_substitute(50).unwrap();
        assert_eq!(hit, SubstituteHit { absorbed: 15, broke: true });
        assert_eq!(tags.substitute_hp(), Some(0));
    }

    #[test]
    fn test_switch_out_returns_only_allow_listed_tags() {
        let mut tags = TagSet::new();
        tags.add(simple(TagData::Substitute { hp: 10 }, 0));
        tags.add(simple(TagData::SaltCured, 0));
        tags.add(simple(TagData::Trapped, 4));
        tags.add(simple(
            TagData::Seeded {
                source: BattlerIndex::new(SideId::Enemy, 0),
            },
            0,
        ));

        let passed: Vec<BattlerTagType> = tags.take_on_switch_out().iter().map(|t| t.kind()).collect();
        assert_eq!(passed, vec![BattlerTagType::Substitute, BattlerTagType::Seeded]);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_rolled_durations_stay_in_range() {
        let mut rng = TurnRng::new_for_test(vec![0, 99, 0, 99]);
        assert_eq!(BattlerTagType::Confused.roll_duration(&mut rng), 2);
        assert_eq!(BattlerTagType::Confused.roll_duration(&mut rng), 5);
        assert_eq!(BattlerTagType::Trapped.roll_duration(&mut rng), 4);
        assert_eq!(BattlerTagType::Trapped.roll_duration(&mut rng), 5);
        assert_eq!(BattlerTagType::Substitute.roll_duration(&mut rng), 0);
    }
}
