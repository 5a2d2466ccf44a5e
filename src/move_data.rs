use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::battle::move_calling::CallingMove;
use crate::battle::tags::{BattlerTagType, SemiInvulnerableState};
use crate::errors::{MoveDataError, MoveDataResult};
use schema::{
    ArenaTagType, MoveCategory, MoveFlag, MoveId, MoveTarget, PokemonType, StatType, StatusType,
    TerrainType, WeatherType,
};

/// Which side of the exchange a move attribute applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    User,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedDamage {
    /// Damage equal to the user's level.
    UserLevel,
    Amount(u16),
}

/// Closed set of move behaviours. Each move lists the attributes it carries
/// and the pipeline dispatches on them with exhaustive matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveAttr {
    /// Non-volatile status; `chance` is a percentage and 100 for status moves.
    Status { status: StatusType, chance: u8 },
    StatStage {
        stats: Vec<StatType>,
        delta: i8,
        chance: u8,
        target: EffectTarget,
    },
    AddTag {
        tag: BattlerTagType,
        chance: u8,
        target: EffectTarget,
    },
    /// Recoil as a fraction of the damage dealt.
    Recoil { denominator: u16 },
    /// Recoil as a fraction of the user's max HP.
    RecoilMaxHp { denominator: u16 },
    HealUser { denominator: u16 },
    ForceSwitch,
    BatonPass,
    Substitute,
    ShedTail,
    SetWeather(WeatherType),
    SetTerrain(TerrainType),
    AddArenaTag(ArenaTagType),
    StealItem,
    RemoveItem,
    ResetTargetStages,
    CallMove(CallingMove),
    /// Charge on the first turn, strike on the second.
    TwoTurn { state: Option<SemiInvulnerableState> },
    Recharge,
    MultiHit { min: u8, max: u8 },
    FixedDamage(FixedDamage),
    Counter,
    HighCrit,
    FirstTurnOnly,
    Rampage,
    Protect,
    Endure,
    Disable,
    /// "But nothing happened!"
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: Option<u16>,
    /// `None` never misses.
    pub accuracy: Option<u8>,
    pub max_pp: u8,
    pub priority: i8,
    pub target: MoveTarget,
    pub flags: Vec<MoveFlag>,
    pub attrs: Vec<MoveAttr>,
}

impl MoveData {
    fn new(
        id: MoveId,
        name: &str,
        move_type: PokemonType,
        category: MoveCategory,
        power: Option<u16>,
        accuracy: Option<u8>,
        max_pp: u8,
        target: MoveTarget,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            move_type,
            category,
            power,
            accuracy,
            max_pp,
            priority: 0,
            target,
            flags: Vec::new(),
            attrs: Vec::new(),
        }
    }

    fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    fn with_flags(mut self, flags: &[MoveFlag]) -> Self {
        self.flags = flags.to_vec();
        self
    }

    fn with_attrs(mut self, attrs: Vec<MoveAttr>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_status(&self) -> bool {
        self.category == MoveCategory::Status
    }

    pub fn is_attack(&self) -> bool {
        !self.is_status()
    }

    pub fn calling_move(&self) -> Option<CallingMove> {
        self.attrs.iter().find_map(|attr| match attr {
            MoveAttr::CallMove(calling) => Some(*calling),
            _ => None,
        })
    }

    pub fn multi_hit(&self) -> Option<(u8, u8)> {
        self.attrs.iter().find_map(|attr| match attr {
            MoveAttr::MultiHit { min, max } => Some((*min, *max)),
            _ => None,
        })
    }

    pub fn two_turn(&self) -> Option<Option<SemiInvulnerableState>> {
        self.attrs.iter().find_map(|attr| match attr {
            MoveAttr::TwoTurn { state } => Some(*state),
            _ => None,
        })
    }

    pub fn has_attr(&self, predicate: impl Fn(&MoveAttr) -> bool) -> bool {
        self.attrs.iter().any(predicate)
    }
}

fn status(status: StatusType, chance: u8) -> MoveAttr {
    MoveAttr::Status { status, chance }
}

fn stages(stats: &[StatType], delta: i8, chance: u8, target: EffectTarget) -> MoveAttr {
    MoveAttr::StatStage {
        stats: stats.to_vec(),
        delta,
        chance,
        target,
    }
}

fn tag(tag: BattlerTagType, chance: u8, target: EffectTarget) -> MoveAttr {
    MoveAttr::AddTag {
        tag,
        chance,
        target,
    }
}

static MOVE_DATA: LazyLock<HashMap<MoveId, MoveData>> = LazyLock::new(|| {
    use EffectTarget::{Target as Foe, User as Own};
    use MoveCategory::{Physical, Special, Status};
    use MoveFlag::*;
    use MoveId as M;
    use MoveTarget as T;
    use PokemonType::*;
    use StatType::*;

    let moves = vec![
        // --- Damaging moves ---
        MoveData::new(M::Tackle, "Tackle", Normal, Physical, Some(40), Some(100), 35, T::NearOther)
            .with_flags(&[Contact]),
        MoveData::new(M::QuickAttack, "Quick Attack", Normal, Physical, Some(40), Some(100), 30, T::NearOther)
            .with_priority(1)
            .with_flags(&[Contact]),
        MoveData::new(M::ExtremeSpeed, "Extreme Speed", Normal, Physical, Some(80), Some(100), 5, T::NearOther)
            .with_priority(2)
            .with_flags(&[Contact]),
        MoveData::new(M::BodySlam, "Body Slam", Normal, Physical, Some(85), Some(100), 15, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![status(StatusType::Paralysis, 30)]),
        MoveData::new(M::Bite, "Bite", Dark, Physical, Some(60), Some(100), 25, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![tag(BattlerTagType::Flinched, 30, Foe)]),
        MoveData::new(M::Ember, "Ember", Fire, Special, Some(40), Some(100), 25, T::NearOther)
            .with_attrs(vec![status(StatusType::Burn, 10)]),
        MoveData::new(M::Flamethrower, "Flamethrower", Fire, Special, Some(90), Some(100), 15, T::NearOther)
            .with_attrs(vec![status(StatusType::Burn, 10)]),
        MoveData::new(M::SacredFire, "Sacred Fire", Fire, Physical, Some(100), Some(95), 5, T::NearOther)
            .with_flags(&[Signature])
            .with_attrs(vec![status(StatusType::Burn, 50)]),
        MoveData::new(M::WaterGun, "Water Gun", Water, Special, Some(40), Some(100), 25, T::NearOther),
        MoveData::new(M::Surf, "Surf", Water, Special, Some(90), Some(100), 15, T::AllNearOthers),
        MoveData::new(M::Thunderbolt, "Thunderbolt", Electric, Special, Some(90), Some(100), 15, T::NearOther)
            .with_attrs(vec![status(StatusType::Paralysis, 10)]),
        MoveData::new(M::Nuzzle, "Nuzzle", Electric, Physical, Some(20), Some(100), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![status(StatusType::Paralysis, 100)]),
        MoveData::new(M::IceBeam, "Ice Beam", Ice, Special, Some(90), Some(100), 10, T::NearOther)
            .with_attrs(vec![status(StatusType::Freeze, 10)]),
        MoveData::new(M::SludgeBomb, "Sludge Bomb", Poison, Special, Some(90), Some(100), 10, T::NearOther)
            .with_attrs(vec![status(StatusType::Poison, 30)]),
        MoveData::new(M::Earthquake, "Earthquake", Ground, Physical, Some(100), Some(100), 10, T::AllNearOthers),
        MoveData::new(M::EchoedVoice, "Echoed Voice", Normal, Special, Some(40), Some(100), 15, T::NearOther)
            .with_flags(&[Sound]),
        MoveData::new(M::HyperVoice, "Hyper Voice", Normal, Special, Some(90), Some(100), 10, T::AllNearEnemies)
            .with_flags(&[Sound]),
        MoveData::new(M::RelicSong, "Relic Song", Normal, Special, Some(75), Some(100), 10, T::AllNearEnemies)
            .with_flags(&[Sound, Dance, Signature])
            .with_attrs(vec![status(StatusType::Sleep, 10)]),
        MoveData::new(M::FieryDance, "Fiery Dance", Fire, Special, Some(80), Some(100), 10, T::NearOther)
            .with_flags(&[Dance])
            .with_attrs(vec![stages(&[SpAtk], 1, 50, Own)]),
        MoveData::new(M::GigaImpact, "Giga Impact", Normal, Physical, Some(150), Some(90), 5, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::Recharge]),
        MoveData::new(M::Dig, "Dig", Ground, Physical, Some(80), Some(100), 10, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::TwoTurn {
                state: Some(SemiInvulnerableState::Underground),
            }]),
        MoveData::new(M::Fly, "Fly", Flying, Physical, Some(90), Some(95), 15, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::TwoTurn {
                state: Some(SemiInvulnerableState::InAir),
            }]),
        MoveData::new(M::Outrage, "Outrage", Dragon, Physical, Some(120), Some(100), 10, T::RandomNearEnemy)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::Rampage]),
        MoveData::new(M::Bind, "Bind", Normal, Physical, Some(15), Some(85), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![tag(BattlerTagType::Trapped, 100, Foe)]),
        MoveData::new(M::Wrap, "Wrap", Normal, Physical, Some(15), Some(90), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![tag(BattlerTagType::Trapped, 100, Foe)]),
        MoveData::new(M::DragonTail, "Dragon Tail", Dragon, Physical, Some(60), Some(90), 10, T::NearOther)
            .with_priority(-6)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::ForceSwitch]),
        MoveData::new(M::Thief, "Thief", Dark, Physical, Some(60), Some(100), 25, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::StealItem]),
        MoveData::new(M::KnockOff, "Knock Off", Dark, Physical, Some(65), Some(100), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::RemoveItem]),
        MoveData::new(M::ClearSmog, "Clear Smog", Poison, Special, Some(50), None, 15, T::NearOther)
            .with_attrs(vec![MoveAttr::ResetTargetStages]),
        MoveData::new(M::Counter, "Counter", Fighting, Physical, None, Some(100), 20, T::NearEnemy)
            .with_priority(-5)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::Counter]),
        MoveData::new(M::SeismicToss, "Seismic Toss", Fighting, Physical, None, Some(100), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::FixedDamage(FixedDamage::UserLevel)]),
        MoveData::new(M::DoubleKick, "Double Kick", Fighting, Physical, Some(30), Some(100), 30, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::MultiHit { min: 2, max: 2 }]),
        MoveData::new(M::BulletSeed, "Bullet Seed", Grass, Physical, Some(25), Some(100), 30, T::NearOther)
            .with_attrs(vec![MoveAttr::MultiHit { min: 2, max: 5 }]),
        MoveData::new(M::Slash, "Slash", Normal, Physical, Some(70), Some(100), 20, T::NearOther)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::HighCrit]),
        MoveData::new(M::FakeOut, "Fake Out", Normal, Physical, Some(40), Some(100), 10, T::NearOther)
            .with_priority(3)
            .with_flags(&[Contact])
            .with_attrs(vec![
                MoveAttr::FirstTurnOnly,
                tag(BattlerTagType::Flinched, 100, Foe),
            ]),
        MoveData::new(M::Swift, "Swift", Normal, Special, Some(60), None, 20, T::AllNearEnemies),
        MoveData::new(M::SaltCure, "Salt Cure", Rock, Physical, Some(40), Some(100), 15, T::NearOther)
            .with_attrs(vec![tag(BattlerTagType::SaltCured, 100, Foe)]),
        // --- Status moves ---
        MoveData::new(M::Growl, "Growl", Normal, Status, None, Some(100), 40, T::AllNearEnemies)
            .with_flags(&[Sound])
            .with_attrs(vec![stages(&[Atk], -1, 100, Foe)]),
        MoveData::new(M::Charm, "Charm", Fairy, Status, None, Some(100), 20, T::NearOther)
            .with_attrs(vec![stages(&[Atk], -2, 100, Foe)]),
        MoveData::new(M::SwordsDance, "Swords Dance", Normal, Status, None, None, 20, T::User)
            .with_flags(&[Dance])
            .with_attrs(vec![stages(&[Atk], 2, 100, Own)]),
        MoveData::new(M::FeatherDance, "Feather Dance", Flying, Status, None, Some(100), 15, T::NearOther)
            .with_flags(&[Dance])
            .with_attrs(vec![stages(&[Atk], -2, 100, Foe)]),
        MoveData::new(M::DragonDance, "Dragon Dance", Dragon, Status, None, None, 20, T::User)
            .with_flags(&[Dance])
            .with_attrs(vec![stages(&[Atk, Spe], 1, 100, Own)]),
        MoveData::new(M::TeeterDance, "Teeter Dance", Normal, Status, None, Some(100), 20, T::AllNearOthers)
            .with_flags(&[Dance])
            .with_attrs(vec![tag(BattlerTagType::Confused, 100, Foe)]),
        MoveData::new(M::QuiverDance, "Quiver Dance", Bug, Status, None, None, 20, T::User)
            .with_flags(&[Dance])
            .with_attrs(vec![stages(&[SpAtk, SpDef, Spe], 1, 100, Own)]),
        MoveData::new(M::Spore, "Spore", Grass, Status, None, Some(100), 15, T::NearOther)
            .with_attrs(vec![status(StatusType::Sleep, 100)]),
        MoveData::new(M::DarkVoid, "Dark Void", Dark, Status, None, Some(50), 10, T::AllNearEnemies)
            .with_flags(&[Signature])
            .with_attrs(vec![status(StatusType::Sleep, 100)]),
        MoveData::new(M::Toxic, "Toxic", Poison, Status, None, Some(90), 10, T::NearOther)
            .with_attrs(vec![status(StatusType::Toxic, 100)]),
        MoveData::new(M::ThunderWave, "Thunder Wave", Electric, Status, None, Some(90), 20, T::NearOther)
            .with_attrs(vec![status(StatusType::Paralysis, 100)]),
        MoveData::new(M::ConfuseRay, "Confuse Ray", Ghost, Status, None, Some(100), 10, T::NearOther)
            .with_attrs(vec![tag(BattlerTagType::Confused, 100, Foe)]),
        MoveData::new(M::Yawn, "Yawn", Normal, Status, None, None, 10, T::NearOther)
            .with_attrs(vec![tag(BattlerTagType::Drowsy, 100, Foe)]),
        MoveData::new(M::LeechSeed, "Leech Seed", Grass, Status, None, Some(90), 10, T::NearOther)
            .with_attrs(vec![tag(BattlerTagType::Seeded, 100, Foe)]),
        MoveData::new(M::FocusEnergy, "Focus Energy", Normal, Status, None, None, 30, T::User)
            .with_attrs(vec![tag(BattlerTagType::FocusEnergy, 100, Own)]),
        MoveData::new(M::AquaRing, "Aqua Ring", Water, Status, None, None, 20, T::User)
            .with_attrs(vec![tag(BattlerTagType::AquaRing, 100, Own)]),
        MoveData::new(M::Ingrain, "Ingrain", Grass, Status, None, None, 20, T::User)
            .with_attrs(vec![tag(BattlerTagType::Ingrain, 100, Own)]),
        MoveData::new(M::Disable, "Disable", Normal, Status, None, Some(100), 20, T::NearOther)
            .with_attrs(vec![MoveAttr::Disable]),
        MoveData::new(M::Protect, "Protect", Normal, Status, None, None, 10, T::User)
            .with_priority(4)
            .with_attrs(vec![MoveAttr::Protect]),
        MoveData::new(M::Detect, "Detect", Fighting, Status, None, None, 5, T::User)
            .with_priority(4)
            .with_attrs(vec![MoveAttr::Protect]),
        MoveData::new(M::Endure, "Endure", Normal, Status, None, None, 10, T::User)
            .with_priority(4)
            .with_attrs(vec![MoveAttr::Endure]),
        MoveData::new(M::Recover, "Recover", Normal, Status, None, None, 5, T::User)
            .with_attrs(vec![MoveAttr::HealUser { denominator: 2 }]),
        MoveData::new(M::Substitute, "Substitute", Normal, Status, None, None, 10, T::User)
            .with_attrs(vec![MoveAttr::Substitute]),
        MoveData::new(M::ShedTail, "Shed Tail", Normal, Status, None, None, 10, T::User)
            .with_attrs(vec![MoveAttr::ShedTail]),
        MoveData::new(M::BatonPass, "Baton Pass", Normal, Status, None, None, 40, T::User)
            .with_attrs(vec![MoveAttr::BatonPass]),
        MoveData::new(M::Roar, "Roar", Normal, Status, None, None, 20, T::NearOther)
            .with_priority(-6)
            .with_flags(&[Sound, IgnoreProtect, IgnoreSubstitute])
            .with_attrs(vec![MoveAttr::ForceSwitch]),
        MoveData::new(M::Whirlwind, "Whirlwind", Normal, Status, None, None, 20, T::NearOther)
            .with_priority(-6)
            .with_flags(&[IgnoreProtect, IgnoreSubstitute])
            .with_attrs(vec![MoveAttr::ForceSwitch]),
        MoveData::new(M::Splash, "Splash", Normal, Status, None, None, 40, T::User)
            .with_attrs(vec![MoveAttr::Nothing]),
        // --- Move-calling moves ---
        MoveData::new(M::Metronome, "Metronome", Normal, Status, None, None, 10, T::User)
            .with_attrs(vec![MoveAttr::CallMove(CallingMove::Metronome)]),
        MoveData::new(M::SleepTalk, "Sleep Talk", Normal, Status, None, None, 10, T::User)
            .with_flags(&[BypassSleep])
            .with_attrs(vec![MoveAttr::CallMove(CallingMove::SleepTalk)]),
        MoveData::new(M::Assist, "Assist", Normal, Status, None, None, 20, T::User)
            .with_attrs(vec![MoveAttr::CallMove(CallingMove::Assist)]),
        MoveData::new(M::MirrorMove, "Mirror Move", Flying, Status, None, None, 20, T::User)
            .with_attrs(vec![MoveAttr::CallMove(CallingMove::MirrorMove)]),
        MoveData::new(M::Copycat, "Copycat", Normal, Status, None, None, 20, T::User)
            .with_attrs(vec![MoveAttr::CallMove(CallingMove::Copycat)]),
        // --- Field moves ---
        MoveData::new(M::TrickRoom, "Trick Room", Psychic, Status, None, None, 5, T::BothSides)
            .with_priority(-7)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::TrickRoom)]),
        MoveData::new(M::RainDance, "Rain Dance", Water, Status, None, None, 5, T::BothSides)
            .with_attrs(vec![MoveAttr::SetWeather(WeatherType::Rain)]),
        MoveData::new(M::SunnyDay, "Sunny Day", Fire, Status, None, None, 5, T::BothSides)
            .with_attrs(vec![MoveAttr::SetWeather(WeatherType::Sun)]),
        MoveData::new(M::Sandstorm, "Sandstorm", Rock, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetWeather(WeatherType::Sandstorm)]),
        MoveData::new(M::Hail, "Hail", Ice, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetWeather(WeatherType::Hail)]),
        MoveData::new(M::ElectricTerrain, "Electric Terrain", Electric, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetTerrain(TerrainType::Electric)]),
        MoveData::new(M::GrassyTerrain, "Grassy Terrain", Grass, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetTerrain(TerrainType::Grassy)]),
        MoveData::new(M::MistyTerrain, "Misty Terrain", Fairy, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetTerrain(TerrainType::Misty)]),
        MoveData::new(M::PsychicTerrain, "Psychic Terrain", Psychic, Status, None, None, 10, T::BothSides)
            .with_attrs(vec![MoveAttr::SetTerrain(TerrainType::Psychic)]),
        MoveData::new(M::Spikes, "Spikes", Ground, Status, None, None, 20, T::EnemySide)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::Spikes)]),
        MoveData::new(M::ToxicSpikes, "Toxic Spikes", Poison, Status, None, None, 20, T::EnemySide)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::ToxicSpikes)]),
        MoveData::new(M::StealthRock, "Stealth Rock", Rock, Status, None, None, 20, T::EnemySide)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::StealthRock)]),
        MoveData::new(M::Reflect, "Reflect", Psychic, Status, None, None, 20, T::UserSide)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::Reflect)]),
        MoveData::new(M::LightScreen, "Light Screen", Psychic, Status, None, None, 30, T::UserSide)
            .with_attrs(vec![MoveAttr::AddArenaTag(ArenaTagType::LightScreen)]),
        MoveData::new(M::Struggle, "Struggle", Typeless, Physical, Some(50), None, 1, T::RandomNearEnemy)
            .with_flags(&[Contact])
            .with_attrs(vec![MoveAttr::RecoilMaxHp { denominator: 4 }]),
    ];

    moves.into_iter().map(|data| (data.id, data)).collect()
});

/// Look up the read-only entry for a move.
pub fn get_move_data(move_id: MoveId) -> MoveDataResult<&'static MoveData> {
    MOVE_DATA
        .get(&move_id)
        .ok_or(MoveDataError::MoveNotFound(move_id))
}

/// Resolve a raw table key into a move entry.
pub fn get_move_data_by_id(raw: u16) -> MoveDataResult<&'static MoveData> {
    let move_id = MoveId::from_repr(raw).ok_or(MoveDataError::InvalidMoveReference(raw))?;
    get_move_data(move_id)
}

/// Every move with a table entry, in id order.
pub fn all_moves() -> Vec<MoveId> {
    let mut ids: Vec<MoveId> = MOVE_DATA.keys().copied().collect();
    ids.sort();
    ids
}

/// Get max PP for a specific move
pub fn get_move_max_pp(move_id: MoveId) -> u8 {
    get_move_data(move_id).map(|data| data.max_pp).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_move_except_none_has_an_entry() {
        for move_id in MoveId::iter() {
            let lookup = get_move_data(move_id);
            if move_id == MoveId::None {
                assert_eq!(lookup, Err(MoveDataError::MoveNotFound(MoveId::None)));
            } else {
                let data = lookup.expect("move table entry");
                assert_eq!(data.id, move_id);
            }
        }
    }

    #[test]
    fn test_raw_ids_round_trip() {
        assert_eq!(get_move_data_by_id(66).map(|d| d.id), Ok(MoveId::Metronome));
        assert_eq!(
            get_move_data_by_id(9999),
            Err(MoveDataError::InvalidMoveReference(9999))
        );
    }

    #[test]
    fn test_calling_moves_are_tagged() {
        let calling: Vec<MoveId> = all_moves()
            .into_iter()
            .filter(|id| get_move_data(*id).map(|d| d.calling_move().is_some()).unwrap_or(false))
            .collect();
        assert_eq!(
            calling,
            vec![
                MoveId::Metronome,
                MoveId::SleepTalk,
                MoveId::Assist,
                MoveId::MirrorMove,
                MoveId::Copycat
            ]
        );
    }
}
