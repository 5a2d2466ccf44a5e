use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::battle::tags::BattlerTagType;
use crate::errors::{AbilityDataError, AbilityDataResult};
use schema::{AbilityId, MoveCategory, PokemonType, StatType, StatusType, TerrainType, WeatherType};

/// Closed set of ability behaviours.
///
/// Some attributes answer queries (priority, speed, immunities) and some are
/// handlers subscribed to an event kind; the registry in
/// `battle::abilities` decides which is which with an exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityAttr {
    ChangeMovePriority { category: MoveCategory, delta: i8 },
    BypassSpeedChance { percent: u8 },
    /// Applied to every opposing active Pokemon on entry.
    PostSummonStatStage { stat: StatType, delta: i8 },
    PostSummonWeather(WeatherType),
    PostSummonTerrain(TerrainType),
    SuppressFieldAbilities,
    IgnoreTargetAbilities,
    BypassSubstitute,
    StatusImmunity(Vec<StatusType>),
    TagImmunity(BattlerTagType),
    MoveTypeImmunity {
        move_type: PokemonType,
        heal_denominator: Option<u16>,
    },
    SoundImmunity,
    PostDefendContactDamage { denominator: u16 },
    PostDefendContactStatus { status: StatusType, chance: u8 },
    PostAttackContactStatus { status: StatusType, chance: u8 },
    PostVictoryStatStage { stat: StatType, delta: i8 },
    PostTurnStatStage { stat: StatType, delta: i8 },
    ProtectStats,
    /// Boost when an opponent lowers one of the holder's stats.
    StatLoweredBoost { stat: StatType, delta: i8 },
    WeatherSpeedMultiplier { weather: WeatherType, multiplier: u8 },
    PostDancingMove,
    RunAway,
    AlwaysHit,
    AccuracyMultiplier { percent: u16 },
    PostFaintContactDamage { denominator: u16 },
    PreSwitchOutHeal { denominator: u16 },
    PreSwitchOutCureStatus,
    PreMoveTypeChange,
    /// Takes the type matching the weather, or Normal when it clears.
    PostWeatherChangeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityData {
    pub id: AbilityId,
    pub name: String,
    pub attrs: Vec<AbilityAttr>,
    /// Ignored while a Mold Breaker-class move is resolving against the holder.
    pub breakable: bool,
    /// Removed from play while a field-suppressing ability is active.
    pub suppressable: bool,
}

impl AbilityData {
    fn new(id: AbilityId, name: &str, attrs: Vec<AbilityAttr>) -> Self {
        Self {
            id,
            name: name.to_string(),
            attrs,
            breakable: false,
            suppressable: true,
        }
    }

    fn breakable(mut self) -> Self {
        self.breakable = true;
        self
    }

    fn unsuppressable(mut self) -> Self {
        self.suppressable = false;
        self
    }
}

static ABILITY_DATA: LazyLock<HashMap<AbilityId, AbilityData>> = LazyLock::new(|| {
    use AbilityAttr as Attr;
    use AbilityId as A;

    let abilities = vec![
        AbilityData::new(A::None, "None", vec![]),
        AbilityData::new(A::Dancer, "Dancer", vec![Attr::PostDancingMove]),
        AbilityData::new(A::NeutralizingGas, "Neutralizing Gas", vec![Attr::SuppressFieldAbilities])
            .unsuppressable(),
        AbilityData::new(A::MoldBreaker, "Mold Breaker", vec![Attr::IgnoreTargetAbilities]),
        AbilityData::new(A::Infiltrator, "Infiltrator", vec![Attr::BypassSubstitute]),
        AbilityData::new(
            A::Prankster,
            "Prankster",
            vec![Attr::ChangeMovePriority {
                category: MoveCategory::Status,
                delta: 1,
            }],
        ),
        AbilityData::new(A::QuickDraw, "Quick Draw", vec![Attr::BypassSpeedChance { percent: 30 }]),
        AbilityData::new(
            A::Intimidate,
            "Intimidate",
            vec![Attr::PostSummonStatStage {
                stat: StatType::Atk,
                delta: -1,
            }],
        ),
        AbilityData::new(A::Drizzle, "Drizzle", vec![Attr::PostSummonWeather(WeatherType::Rain)]),
        AbilityData::new(A::Drought, "Drought", vec![Attr::PostSummonWeather(WeatherType::Sun)]),
        AbilityData::new(
            A::SandStream,
            "Sand Stream",
            vec![Attr::PostSummonWeather(WeatherType::Sandstorm)],
        ),
        AbilityData::new(
            A::ElectricSurge,
            "Electric Surge",
            vec![Attr::PostSummonTerrain(TerrainType::Electric)],
        ),
        AbilityData::new(
            A::GrassySurge,
            "Grassy Surge",
            vec![Attr::PostSummonTerrain(TerrainType::Grassy)],
        ),
        AbilityData::new(A::MistySurge, "Misty Surge", vec![Attr::PostSummonTerrain(TerrainType::Misty)]),
        AbilityData::new(
            A::PsychicSurge,
            "Psychic Surge",
            vec![Attr::PostSummonTerrain(TerrainType::Psychic)],
        ),
        AbilityData::new(A::Insomnia, "Insomnia", vec![Attr::StatusImmunity(vec![StatusType::Sleep])])
            .breakable(),
        AbilityData::new(A::Limber, "Limber", vec![Attr::StatusImmunity(vec![StatusType::Paralysis])])
            .breakable(),
        AbilityData::new(A::OwnTempo, "Own Tempo", vec![Attr::TagImmunity(BattlerTagType::Confused)])
            .breakable(),
        AbilityData::new(
            A::Levitate,
            "Levitate",
            vec![Attr::MoveTypeImmunity {
                move_type: PokemonType::Ground,
                heal_denominator: None,
            }],
        )
        .breakable(),
        AbilityData::new(
            A::VoltAbsorb,
            "Volt Absorb",
            vec![Attr::MoveTypeImmunity {
                move_type: PokemonType::Electric,
                heal_denominator: Some(4),
            }],
        )
        .breakable(),
        AbilityData::new(
            A::WaterAbsorb,
            "Water Absorb",
            vec![Attr::MoveTypeImmunity {
                move_type: PokemonType::Water,
                heal_denominator: Some(4),
            }],
        )
        .breakable(),
        AbilityData::new(A::Soundproof, "Soundproof", vec![Attr::SoundImmunity]).breakable(),
        AbilityData::new(A::RoughSkin, "Rough Skin", vec![Attr::PostDefendContactDamage { denominator: 8 }]),
        AbilityData::new(
            A::Static,
            "Static",
            vec![Attr::PostDefendContactStatus {
                status: StatusType::Paralysis,
                chance: 30,
            }],
        ),
        AbilityData::new(
            A::PoisonTouch,
            "Poison Touch",
            vec![Attr::PostAttackContactStatus {
                status: StatusType::Poison,
                chance: 30,
            }],
        ),
        AbilityData::new(
            A::Moxie,
            "Moxie",
            vec![Attr::PostVictoryStatStage {
                stat: StatType::Atk,
                delta: 1,
            }],
        ),
        AbilityData::new(
            A::SpeedBoost,
            "Speed Boost",
            vec![Attr::PostTurnStatStage {
                stat: StatType::Spe,
                delta: 1,
            }],
        ),
        AbilityData::new(A::ClearBody, "Clear Body", vec![Attr::ProtectStats]).breakable(),
        AbilityData::new(
            A::Defiant,
            "Defiant",
            vec![Attr::StatLoweredBoost {
                stat: StatType::Atk,
                delta: 2,
            }],
        ),
        AbilityData::new(
            A::SwiftSwim,
            "Swift Swim",
            vec![Attr::WeatherSpeedMultiplier {
                weather: WeatherType::Rain,
                multiplier: 2,
            }],
        ),
        AbilityData::new(
            A::Chlorophyll,
            "Chlorophyll",
            vec![Attr::WeatherSpeedMultiplier {
                weather: WeatherType::Sun,
                multiplier: 2,
            }],
        ),
        AbilityData::new(A::RunAway, "Run Away", vec![Attr::RunAway]),
        AbilityData::new(A::NoGuard, "No Guard", vec![Attr::AlwaysHit]),
        AbilityData::new(A::CompoundEyes, "Compound Eyes", vec![Attr::AccuracyMultiplier { percent: 130 }]),
        AbilityData::new(A::Aftermath, "Aftermath", vec![Attr::PostFaintContactDamage { denominator: 4 }]),
        AbilityData::new(A::Regenerator, "Regenerator", vec![Attr::PreSwitchOutHeal { denominator: 3 }]),
        AbilityData::new(A::NaturalCure, "Natural Cure", vec![Attr::PreSwitchOutCureStatus]),
        AbilityData::new(A::Protean, "Protean", vec![Attr::PreMoveTypeChange]),
        AbilityData::new(A::Forecast, "Forecast", vec![Attr::PostWeatherChangeType]),
    ];

    abilities.into_iter().map(|data| (data.id, data)).collect()
});

pub fn get_ability_data(ability: AbilityId) -> AbilityDataResult<&'static AbilityData> {
    ABILITY_DATA
        .get(&ability)
        .ok_or(AbilityDataError::AbilityNotFound(ability))
}

pub fn get_ability_data_by_id(raw: u16) -> AbilityDataResult<&'static AbilityData> {
    let ability = AbilityId::from_repr(raw).ok_or(AbilityDataError::InvalidAbilityReference(raw))?;
    get_ability_data(ability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_ability_has_an_entry() {
        for ability in AbilityId::iter() {
            let data = get_ability_data(ability).expect("ability table entry");
            assert_eq!(data.id, ability);
        }
    }

    #[test]
    fn test_only_neutralizing_gas_is_unsuppressable() {
        let unsuppressable: Vec<AbilityId> = AbilityId::iter()
            .filter(|id| !get_ability_data(*id).map(|d| d.suppressable).unwrap_or(true))
            .collect();
        assert_eq!(unsuppressable, vec![AbilityId::NeutralizingGas]);
        assert_eq!(
            get_ability_data_by_id(500),
            Err(AbilityDataError::InvalidAbilityReference(500))
        );
    }
}
