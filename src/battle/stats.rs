use crate::ability_data::AbilityAttr;
use crate::battle::abilities::active_ability;
use crate::battle::state::{BattleState, BattlerIndex};
use crate::pokemon::{PokemonInst, StatusCondition, ATTACK, DEFENSE, SPEED, SP_ATTACK, SP_DEFENSE};
use schema::{HeldItem, MoveCategory, StatType};

/// Critical hit odds (1 in N) indexed by crit stage.
const CRIT_RATES: [u32; 4] = [24, 8, 2, 1];

/// Multiplier for Attack, Defense, Sp. Atk, Sp. Def and Speed stages.
pub fn stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6) as f64;
    if stage >= 0.0 {
        (2.0 + stage) / 2.0
    } else {
        2.0 / (2.0 - stage)
    }
}

/// Multiplier for the combined accuracy/evasion stage.
pub fn accuracy_stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6) as f64;
    if stage >= 0.0 {
        (3.0 + stage) / 3.0
    } else {
        3.0 / (3.0 - stage)
    }
}

pub fn apply_stage(value: u16, stage: i8) -> u16 {
    ((value as f64) * stage_multiplier(stage)).floor() as u16
}

/// Stat array index for a battle stat. Accuracy, evasion and crit have none.
pub fn stat_index(stat: StatType) -> Option<usize> {
    match stat {
        StatType::Atk => Some(ATTACK),
        StatType::Def => Some(DEFENSE),
        StatType::SpAtk => Some(SP_ATTACK),
        StatType::SpDef => Some(SP_DEFENSE),
        StatType::Spe => Some(SPEED),
        StatType::Acc | StatType::Eva | StatType::Crit => None,
    }
}

/// Offensive stat for a category with stages applied. A critical hit ignores
/// the attacker's negative stages.
pub fn effective_attack(pokemon: &PokemonInst, category: MoveCategory, critical: bool) -> u16 {
    let stat = match category {
        MoveCategory::Physical => StatType::Atk,
        MoveCategory::Special => StatType::SpAtk,
        MoveCategory::Status => return 0,
    };
    let mut stage = pokemon.stat_stages.get(stat);
    if critical {
        stage = stage.max(0);
    }
    let base = stat_index(stat).map(|index| pokemon.stats[index]).unwrap_or(0);
    apply_stage(base, stage).max(1)
}

/// Defensive stat for a category with stages applied. A critical hit ignores
/// the defender's positive stages.
pub fn effective_defense(pokemon: &PokemonInst, category: MoveCategory, critical: bool) -> u16 {
    let stat = match category {
        MoveCategory::Physical => StatType::Def,
        MoveCategory::Special => StatType::SpDef,
        MoveCategory::Status => return 1,
    };
    let mut stage = pokemon.stat_stages.get(stat);
    if critical {
        stage = stage.min(0);
    }
    let base = stat_index(stat).map(|index| pokemon.stats[index]).unwrap_or(1);
    apply_stage(base, stage).max(1)
}

/// Speed used for turn order: stages, paralysis, Choice Scarf and weather abilities.
pub fn effective_speed(state: &BattleState, battler: BattlerIndex) -> u16 {
    let Some(pokemon) = state.pokemon(battler) else {
        return 0;
    };
    let mut speed = apply_stage(pokemon.stats[SPEED], pokemon.stat_stages.get(StatType::Spe)) as u32;

    if let Some(ability) = active_ability(state, battler) {
        for attr in &ability.attrs {
            if let AbilityAttr::WeatherSpeedMultiplier { weather, multiplier } = attr {
                if state.arena.weather() == Some(*weather) {
                    speed *= *multiplier as u32;
                }
            }
        }
    }
    if pokemon.item == Some(HeldItem::ChoiceScarf) {
        speed = speed * 3 / 2;
    }
    if matches!(pokemon.status, Some(StatusCondition::Paralysis)) {
        speed /= 2;
    }
    speed.min(u16::MAX as u32) as u16
}

/// One-in-N odds of a critical hit at the given stage.
pub fn crit_rate(stage: u8) -> u32 {
    CRIT_RATES[(stage as usize).min(CRIT_RATES.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 1.5)]
    #[case(2, 2.0)]
    #[case(6, 4.0)]
    #[case(-1, 2.0 / 3.0)]
    #[case(-2, 0.5)]
    #[case(-6, 0.25)]
    #[case(9, 4.0)]
    fn test_stage_multiplier(#[case] stage: i8, #[case] expected: f64) {
        assert!((stage_multiplier(stage) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 4.0 / 3.0)]
    #[case(3, 2.0)]
    #[case(6, 3.0)]
    #[case(-3, 0.5)]
    #[case(-6, 1.0 / 3.0)]
    fn test_accuracy_stage_multiplier(#[case] stage: i8, #[case] expected: f64) {
        assert!((accuracy_stage_multiplier(stage) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_crit_rate_caps_at_guaranteed() {
        assert_eq!(crit_rate(0), 24);
        assert_eq!(crit_rate(1), 8);
        assert_eq!(crit_rate(3), 1);
        assert_eq!(crit_rate(7), 1);
    }

    #[test]
    fn test_apply_stage_floors() {
        assert_eq!(apply_stage(101, 1), 151);
        assert_eq!(apply_stage(101, -1), 67);
    }
}
