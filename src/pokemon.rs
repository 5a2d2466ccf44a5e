use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::battle::state::BattlerIndex;
use crate::battle::tags::{BattlerTag, TagSet};
use crate::errors::{BattleResult, MoveDataResult};
use crate::move_data::get_move_data;
use crate::species::{get_species_data, species_name, BaseStats};
use schema::{AbilityId, HeldItem, MoveId, PokemonType, Species, StatType, StatusType};

/// Stat array index for HP.
pub const HP: usize = 0;
pub const ATTACK: usize = 1;
pub const DEFENSE: usize = 2;
pub const SP_ATTACK: usize = 3;
pub const SP_DEFENSE: usize = 4;
pub const SPEED: usize = 5;

/// At most one non-volatile status at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    Sleep { turns_remaining: u8 },
    Poison,
    /// `counter` grows each turn end; damage is counter/16 of max HP.
    Toxic { counter: u8 },
    Burn,
    Freeze,
    Paralysis,
}

impl StatusCondition {
    pub fn kind(&self) -> StatusType {
        match self {
            StatusCondition::Sleep { .. } => StatusType::Sleep,
            StatusCondition::Poison => StatusType::Poison,
            StatusCondition::Toxic { .. } => StatusType::Toxic,
            StatusCondition::Burn => StatusType::Burn,
            StatusCondition::Freeze => StatusType::Freeze,
            StatusCondition::Paralysis => StatusType::Paralysis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub pp: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    /// Create a new move slot with max PP
    pub fn new(move_id: MoveId) -> MoveDataResult<Self> {
        let max_pp = get_move_data(move_id)?.max_pp;
        Ok(MoveSlot {
            move_id,
            pp: max_pp,
            max_pp,
        })
    }

    /// Use the move (decrease PP). PP never goes below zero.
    pub fn use_pp(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }

    pub fn restore_pp(&mut self, amount: u8) {
        self.pp = self.pp.saturating_add(amount).min(self.max_pp);
    }
}

/// How a move use was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseMode {
    /// Chosen directly by a player or the AI.
    Normal,
    /// Forced continuation (rampage, second turn of a charge move); no PP.
    IgnorePp,
    /// Selected by a move-calling move.
    FollowUp,
    /// Copied by an ability such as Dancer; never debits PP or re-triggers copies.
    Indirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveResult {
    Pending,
    Success,
    Fail,
    Miss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistoryEntry {
    pub move_id: MoveId,
    pub targets: Vec<BattlerIndex>,
    pub result: MoveResult,
    pub use_mode: UseMode,
    pub turn: u32,
}

/// Last move an opponent aimed at this Pokemon, read by Mirror Move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMoveTargeting {
    pub move_id: MoveId,
    pub attacker: BattlerIndex,
    pub attacker_id: u32,
}

/// Data that lives as long as the Pokemon stays on the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonData {
    pub turns_on_field: u32,
    pub last_move_targeting: Option<LastMoveTargeting>,
    pub types_override: Option<Vec<PokemonType>>,
}

/// Data reset at the start of every turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnData {
    pub moved: bool,
    pub switched_in: bool,
    /// Physical damage taken this turn and who dealt it, for Counter.
    pub physical_damage_taken: Option<(u16, BattlerIndex)>,
}

/// Stat stages clamped to -6..=+6, including accuracy, evasion and crit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatStages {
    stages: BTreeMap<StatType, i8>,
}

impl StatStages {
    pub fn get(&self, stat: StatType) -> i8 {
        self.stages.get(&stat).copied().unwrap_or(0)
    }

    /// Applies `delta` and returns the change that actually happened.
    pub fn change(&mut self, stat: StatType, delta: i8) -> i8 {
        let current = self.get(stat);
        let next = (current as i16 + delta as i16).clamp(-6, 6) as i8;
        if next == 0 {
            self.stages.remove(&stat);
        } else {
            self.stages.insert(stat, next);
        }
        next - current
    }

    pub fn reset(&mut self) {
        self.stages.clear();
    }

    pub fn is_neutral(&self) -> bool {
        self.stages.is_empty()
    }
}

/// What Baton Pass can hand to the incoming ally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassedState {
    pub stat_stages: StatStages,
    pub tags: Vec<BattlerTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonInst {
    /// Unique within one battle; assigned when the battle is created.
    pub id: u32,
    pub species: Species,
    pub nickname: Option<String>,
    pub level: u8,
    hp: u16,
    /// HP, ATK, DEF, SP.ATK, SP.DEF, SPD
    pub stats: [u16; 6],
    pub types: Vec<PokemonType>,
    pub ability: AbilityId,
    pub item: Option<HeldItem>,
    pub status: Option<StatusCondition>,
    pub moves: Vec<MoveSlot>,
    pub stat_stages: StatStages,
    pub tags: TagSet,
    pub history: Vec<MoveHistoryEntry>,
    pub turn_data: TurnData,
    pub summon_data: SummonData,
    pub is_boss: bool,
}

impl PokemonInst {
    /// Create a new Pokemon instance from species data
    pub fn new(species: Species, level: u8, moves: &[MoveId]) -> BattleResult<Self> {
        let data = get_species_data(species)?;
        let stats = Self::calculate_stats(&data.base_stats, level);
        let moves = moves
            .iter()
            .take(4)
            .map(|move_id| MoveSlot::new(*move_id))
            .collect::<MoveDataResult<Vec<_>>>()?;

        Ok(PokemonInst {
            id: 0,
            species,
            nickname: None,
            level,
            hp: stats[HP],
            stats,
            types: data.types.clone(),
            ability: data.ability,
            item: None,
            status: None,
            moves,
            stat_stages: StatStages::default(),
            tags: TagSet::new(),
            history: Vec::new(),
            turn_data: TurnData::default(),
            summon_data: SummonData::default(),
            is_boss: false,
        })
    }

    /// Gen 3+ stat formula with perfect IVs, no EVs and a neutral nature.
    fn calculate_stats(base_stats: &BaseStats, level: u8) -> [u16; 6] {
        const IV: u16 = 31;
        let level = level as u16;
        let mut stats = [0u16; 6];
        for (index, base) in base_stats.as_array().into_iter().enumerate() {
            let base_calculation = 2 * base as u16 + IV;
            stats[index] = if index == HP {
                (base_calculation * level) / 100 + level + 10
            } else {
                (base_calculation * level) / 100 + 5
            };
        }
        stats
    }

    pub fn name(&self) -> String {
        self.nickname
            .clone()
            .unwrap_or_else(|| species_name(self.species))
    }

    pub fn current_hp(&self) -> u16 {
        self.hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats[HP]
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    /// Lowers HP, returning the damage actually taken.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Raises HP up to the maximum, returning the amount restored.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let restored = amount.min(self.max_hp() - self.hp);
        self.hp += restored;
        restored
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.hp = hp.min(self.max_hp());
    }

    /// Current types, honouring in-battle type changes.
    pub fn types(&self) -> &[PokemonType] {
        self.summon_data
            .types_override
            .as_deref()
            .unwrap_or(&self.types)
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types().contains(&pokemon_type)
    }

    pub fn move_slot(&self, move_id: MoveId) -> Option<usize> {
        self.moves.iter().position(|slot| slot.move_id == move_id)
    }

    pub fn has_move(&self, move_id: MoveId) -> bool {
        self.move_slot(move_id).is_some()
    }

    /// Slots that can be selected this turn: PP left and not disabled.
    pub fn usable_move_slots(&self) -> Vec<usize> {
        let disabled = self.tags.disabled_move();
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.pp > 0 && Some(slot.move_id) != disabled)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn last_move(&self) -> Option<&MoveHistoryEntry> {
        self.history.last()
    }

    pub fn has_status(&self, status: StatusType) -> bool {
        self.status.map(|s| s.kind()) == Some(status)
    }

    /// Leaves the field: clears volatile state and returns what Baton Pass may carry.
    pub fn withdraw(&mut self) -> PassedState {
        let passed = PassedState {
            stat_stages: std::mem::take(&mut self.stat_stages),
            tags: self.tags.take_on_switch_out(),
        };
        self.summon_data = SummonData::default();
        self.turn_data = TurnData::default();
        if let Some(StatusCondition::Toxic { counter }) = self.status.as_mut() {
            *counter = 1;
        }
        passed
    }
}
