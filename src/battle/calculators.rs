use crate::ability_data::AbilityAttr;
use crate::battle::abilities::{active_ability, defending_ability};
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleState, BattlerIndex};
use crate::battle::stats::{accuracy_stage_multiplier, crit_rate, effective_attack, effective_defense};
use crate::battle::tags::BattlerTagType;
use crate::move_data::{MoveAttr, MoveData};
use crate::pokemon::{PokemonInst, StatusCondition};
use schema::{ArenaTagType, HeldItem, MoveCategory, PokemonType, StatType, WeatherType};

/// Result of one damage calculation against one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: u16,
    pub critical: bool,
    pub effectiveness: f32,
}

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    value * numerator / denominator
}

fn has_always_hit(state: &BattleState, battler: BattlerIndex) -> bool {
    active_ability(state, battler)
        .is_some_and(|data| data.attrs.contains(&AbilityAttr::AlwaysHit))
}

/// Hit check for one target. Moves without an accuracy value and No Guard
/// short-circuit before any stage math or draw.
pub fn move_hits(
    state: &BattleState,
    attacker: BattlerIndex,
    defender: BattlerIndex,
    move_data: &MoveData,
    rng: &mut dyn BattleRng,
) -> bool {
    let (Some(attacker_mon), Some(defender_mon)) = (state.pokemon(attacker), state.pokemon(defender))
    else {
        return false;
    };
    let no_guard = has_always_hit(state, attacker) || has_always_hit(state, defender);

    if attacker != defender && defender_mon.tags.semi_invulnerable_state().is_some() && !no_guard {
        return false;
    }
    let Some(accuracy) = move_data.accuracy else {
        return true;
    };
    if no_guard || attacker == defender {
        return true;
    }

    let stage = (attacker_mon.stat_stages.get(StatType::Acc) as i16
        - defender_mon.stat_stages.get(StatType::Eva) as i16)
        .clamp(-6, 6) as i8;
    let mut threshold = accuracy as f64 * accuracy_stage_multiplier(stage);

    if let Some(ability) = active_ability(state, attacker) {
        for attr in &ability.attrs {
            if let AbilityAttr::AccuracyMultiplier { percent } = attr {
                threshold = threshold * *percent as f64 / 100.0;
            }
        }
    }
    if attacker_mon.item == Some(HeldItem::WideLens) {
        threshold *= 1.1;
    }
    if defender_mon.item == Some(HeldItem::BrightPowder) {
        threshold *= 0.9;
    }

    let roll = rng.next_int(100, "accuracy");
    (roll as f64) < threshold.floor()
}

/// Crit stage from stat stages, high-crit moves and Focus Energy, capped at 3.
pub fn crit_stage(attacker: &PokemonInst, move_data: &MoveData) -> u8 {
    let mut stage = attacker.stat_stages.get(StatType::Crit).max(0) as u8;
    if move_data.has_attr(|attr| matches!(attr, MoveAttr::HighCrit)) {
        stage += 1;
    }
    if attacker.tags.has(BattlerTagType::FocusEnergy) {
        stage += 2;
    }
    stage.min(3)
}

pub fn is_critical_hit(attacker: &PokemonInst, move_data: &MoveData, rng: &mut dyn BattleRng) -> bool {
    let rate = crit_rate(crit_stage(attacker, move_data));
    if rate <= 1 {
        return true;
    }
    rng.next_int(rate, "critical hit") == 0
}

/// Type multiplier of a move against the defender's current types.
pub fn type_effectiveness(move_type: PokemonType, defender: &PokemonInst) -> f32 {
    PokemonType::effectiveness_against(move_type, defender.types())
}

/// `floor(floor(floor(2L/5+2) * P * A / D) / 50) + 2`
pub fn base_damage(level: u8, power: u16, attack: u16, defense: u16) -> u32 {
    let level_factor = 2 * level as u32 / 5 + 2;
    (level_factor * power as u32 * attack as u32 / defense.max(1) as u32) / 50 + 2
}

/// Full damage calculation for one target. Draws crit then variance.
pub fn calculate_damage(
    state: &BattleState,
    attacker: BattlerIndex,
    defender: BattlerIndex,
    move_data: &MoveData,
    spread: bool,
    rng: &mut dyn BattleRng,
) -> DamageRoll {
    let (Some(attacker_mon), Some(defender_mon)) = (state.pokemon(attacker), state.pokemon(defender))
    else {
        return DamageRoll {
            damage: 0,
            critical: false,
            effectiveness: 1.0,
        };
    };
    let effectiveness = type_effectiveness(move_data.move_type, defender_mon);
    if effectiveness == 0.0 {
        return DamageRoll {
            damage: 0,
            critical: false,
            effectiveness,
        };
    }

    let critical = is_critical_hit(attacker_mon, move_data, rng);
    let power = move_data.power.unwrap_or(0);
    let attack = effective_attack(attacker_mon, move_data.category, critical);
    let defense = effective_defense(defender_mon, move_data.category, critical);
    let mut damage = base_damage(attacker_mon.level, power, attack, defense);

    if spread {
        damage = scale(damage, 3, 4);
    }
    match (state.arena.weather(), move_data.move_type) {
        (Some(WeatherType::Sun), PokemonType::Fire) | (Some(WeatherType::Rain), PokemonType::Water) => {
            damage = scale(damage, 3, 2)
        }
        (Some(WeatherType::Sun), PokemonType::Water) | (Some(WeatherType::Rain), PokemonType::Fire) => {
            damage = scale(damage, 1, 2)
        }
        _ => {}
    }
    if critical {
        damage = scale(damage, 3, 2);
    }
    let variance = 85 + rng.next_int(16, "damage variance");
    damage = scale(damage, variance, 100);
    if attacker_mon.has_type(move_data.move_type) {
        damage = scale(damage, 3, 2);
    }
    damage = (damage as f64 * effectiveness as f64).floor() as u32;
    if move_data.category == MoveCategory::Physical
        && matches!(attacker_mon.status, Some(StatusCondition::Burn))
    {
        damage = scale(damage, 1, 2);
    }
    let screen = match move_data.category {
        MoveCategory::Physical => Some(ArenaTagType::Reflect),
        MoveCategory::Special => Some(ArenaTagType::LightScreen),
        MoveCategory::Status => None,
    };
    if let Some(screen) = screen {
        if !critical && state.arena.has_tag(screen, Some(defender.side)) {
            damage = scale(damage, 1, 2);
        }
    }
    if attacker_mon.item == Some(HeldItem::LifeOrb) {
        damage = scale(damage, 13, 10);
    }

    DamageRoll {
        damage: damage.clamp(1, u16::MAX as u32) as u16,
        critical,
        effectiveness,
    }
}

/// Confusion self-hit: 40 power, typeless, physical, no crit.
pub fn confusion_damage(pokemon: &PokemonInst, rng: &mut dyn BattleRng) -> u16 {
    let attack = effective_attack(pokemon, MoveCategory::Physical, false);
    let defense = effective_defense(pokemon, MoveCategory::Physical, false);
    let damage = base_damage(pokemon.level, 40, attack, defense);
    let variance = 85 + rng.next_int(16, "confusion variance");
    scale(damage, variance, 100).max(1) as u16
}

/// Ability immunity to a move's type, with the heal fraction if it absorbs.
pub fn ability_type_immunity(
    state: &BattleState,
    defender: BattlerIndex,
    move_type: PokemonType,
    ignore_abilities: bool,
) -> Option<(schema::AbilityId, Option<u16>)> {
    let ability = defending_ability(state, defender, ignore_abilities)?;
    ability.attrs.iter().find_map(|attr| match attr {
        AbilityAttr::MoveTypeImmunity {
            move_type: immune,
            heal_denominator,
        } if *immune == move_type => Some((ability.id, *heal_denominator)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::rng::TurnRng;
    use crate::battle::state::{BattleType, SideId};
    use crate::move_data::get_move_data;
    use schema::{MoveId, Species};

    fn state_with(attacker: PokemonInst, defender: PokemonInst) -> BattleState {
        BattleState::new(BattleType::Trainer, false, vec![attacker], vec![defender]).unwrap()
    }

    const PLAYER: BattlerIndex = BattlerIndex::new(SideId::Player, 0);
    const ENEMY: BattlerIndex = BattlerIndex::new(SideId::Enemy, 0);

    #[test]
    fn test_base_damage_formula() {
        // Level 50: floor(2*50/5 + 2) = 22; 22*40*100/100 = 880; 880/50 = 17; +2
        assert_eq!(base_damage(50, 40, 100, 100), 19);
        assert_eq!(base_damage(100, 90, 200, 100), 2 + (42 * 90 * 2) / 50);
    }

    #[test]
    fn test_never_miss_moves_do_not_draw() {
        let state = state_with(
            PokemonInst::new(Species::Pikachu, 50, &[MoveId::Swift]).unwrap(),
            PokemonInst::new(Species::Eevee, 50, &[MoveId::Tackle]).unwrap(),
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let swift = get_move_data(MoveId::Swift).unwrap();
        assert!(move_hits(&state, PLAYER, ENEMY, swift, &mut rng));
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn test_accuracy_roll_is_strictly_below_threshold() {
        let state = state_with(
            PokemonInst::new(Species::Pikachu, 50, &[MoveId::ThunderWave]).unwrap(),
            PokemonInst::new(Species::Eevee, 50, &[MoveId::Tackle]).unwrap(),
        );
        let wave = get_move_data(MoveId::ThunderWave).unwrap();
        let mut rng = TurnRng::new_for_test(vec![89, 90]);
        assert!(move_hits(&state, PLAYER, ENEMY, wave, &mut rng));
        assert!(!move_hits(&state, PLAYER, ENEMY, wave, &mut rng));
    }

    #[test]
    fn test_focus_energy_and_high_crit_cap_at_guaranteed() {
        let mut slasher = PokemonInst::new(Species::Pikachu, 50, &[MoveId::Slash]).unwrap();
        let slash = get_move_data(MoveId::Slash).unwrap();
        assert_eq!(crit_stage(&slasher, slash), 1);
        slasher.tags.add(crate::battle::tags::BattlerTag::new(
            crate::battle::tags::TagData::FocusEnergy,
            0,
            MoveId::FocusEnergy,
            None,
        ));
        assert_eq!(crit_stage(&slasher, slash), 3);
        let mut rng = TurnRng::new_for_test(vec![]);
        assert!(is_critical_hit(&slasher, slash, &mut rng));
    }

    #[test]
    fn test_immune_target_takes_no_damage_and_draws_nothing() {
        let state = state_with(
            PokemonInst::new(Species::Rattata, 50, &[MoveId::Tackle]).unwrap(),
            PokemonInst::new(Species::Gengar, 50, &[MoveId::Tackle]).unwrap(),
        );
        let tackle = get_move_data(MoveId::Tackle).unwrap();
        let mut rng = TurnRng::new_for_test(vec![]);
        let roll = calculate_damage(&state, PLAYER, ENEMY, tackle, false, &mut rng);
        assert_eq!(roll.damage, 0);
        assert_eq!(roll.effectiveness, 0.0);
    }

    #[test]
    fn test_max_variance_roll_is_deterministic() {
        let state = state_with(
            PokemonInst::new(Species::Rattata, 50, &[MoveId::Tackle]).unwrap(),
            PokemonInst::new(Species::Snorlax, 50, &[MoveId::Tackle]).unwrap(),
        );
        let tackle = get_move_data(MoveId::Tackle).unwrap();
        let mut first = TurnRng::new_for_test(vec![1, 15]);
        let mut second = TurnRng::new_for_test(vec![1, 15]);
        let a = calculate_damage(&state, PLAYER, ENEMY, tackle, false, &mut first);
        let b = calculate_damage(&state, PLAYER, ENEMY, tackle, false, &mut second);
        assert_eq!(a, b);
        assert!(!a.critical);
        assert!(a.damage >= 1);
    }
}
