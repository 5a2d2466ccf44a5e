use log::debug;

use crate::ability_data::AbilityAttr;
use crate::battle::abilities::has_ability_attr;
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::state::{BattleOutcome, BattleState, SideId};
use crate::battle::stats::effective_speed;
use crate::battle::tags::BattlerTagType;

/// Lowest escape chance in percent, whatever the speeds.
pub const ESCAPE_FLOOR: u32 = 5;

/// Curve parameters for one kind of encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EscapeCurve {
    /// Highest chance in percent.
    ceiling: u32,
    /// Speed ratio at which the ceiling is reached with no retries.
    ratio_at_ceiling: u32,
    /// Flat percent added per earlier failed attempt.
    retry_bonus: u32,
}

const NORMAL_CURVE: EscapeCurve = EscapeCurve {
    ceiling: 95,
    ratio_at_ceiling: 4,
    retry_bonus: 10,
};

const BOSS_CURVE: EscapeCurve = EscapeCurve {
    ceiling: 25,
    ratio_at_ceiling: 6,
    retry_bonus: 2,
};

/// Escape chance in percent for a fleeing side whose total Speed is
/// `fleeing_speed` against an opposing total of `opposing_speed`.
///
/// The chance grows linearly with the speed ratio from the floor, gains a flat
/// bonus per failed attempt and is rounded half up before clamping. Exact
/// integer arithmetic keeps the result independent of float rounding.
pub fn escape_chance(fleeing_speed: u32, opposing_speed: u32, attempts: u32, is_boss: bool) -> u8 {
    let curve = if is_boss { BOSS_CURVE } else { NORMAL_CURVE };
    if opposing_speed == 0 {
        return curve.ceiling as u8;
    }
    let fleeing = fleeing_speed as u64;
    let opposing = opposing_speed as u64;
    let slope = (curve.ceiling - ESCAPE_FLOOR) as u64;
    let ratio_cap = curve.ratio_at_ceiling as u64;
    let flat = ESCAPE_FLOOR as u64 + (curve.retry_bonus as u64).saturating_mul(attempts.min(100) as u64);

    // chance = slope * fleeing / (ratio_cap * opposing) + flat
    let denominator = ratio_cap * opposing;
    let numerator = slope * fleeing + flat * denominator;
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    rounded.clamp(ESCAPE_FLOOR as u64, curve.ceiling as u64) as u8
}

/// Total effective Speed of a side's active Pokemon.
fn side_speed(state: &BattleState, side: SideId) -> u32 {
    state
        .active_battlers()
        .into_iter()
        .filter(|battler| battler.side == side)
        .map(|battler| effective_speed(state, battler) as u32)
        .sum()
}

/// Escape chance for `side` in the current battle state.
pub fn calculate_escape_chance(state: &BattleState, side: SideId) -> u8 {
    let opponent = side.opponent();
    let is_boss = state
        .active_battlers()
        .into_iter()
        .filter(|battler| battler.side == opponent)
        .any(|battler| state.pokemon(battler).is_some_and(|pokemon| pokemon.is_boss));
    escape_chance(
        side_speed(state, side),
        side_speed(state, opponent),
        state.escape_attempts,
        is_boss,
    )
}

fn flee_outcome(side: SideId) -> BattleOutcome {
    match side {
        SideId::Player => BattleOutcome::PlayerFled,
        SideId::Enemy => BattleOutcome::EnemyFled,
    }
}

/// Rolls an escape for `side`. Run Away always succeeds; a trapped
/// Pokemon never does.
pub fn attempt_escape(ctx: &mut BattleContext, side: SideId) {
    let fleeing: Vec<_> = ctx
        .state
        .active_battlers()
        .into_iter()
        .filter(|battler| battler.side == side)
        .collect();
    if fleeing.is_empty() {
        return;
    }

    let run_away = fleeing
        .iter()
        .copied()
        .find(|battler| has_ability_attr(ctx.state, *battler, |attr| matches!(attr, AbilityAttr::RunAway)));

    let escaped = if let Some(runner) = run_away {
        if let Some(pokemon) = ctx.state.pokemon(runner) {
            ctx.bus.push(BattleEvent::AbilityActivated {
                actor: Actor::new(runner, pokemon),
                ability: pokemon.ability,
            });
        }
        true
    } else if fleeing.iter().any(|battler| {
        ctx.state
            .pokemon(*battler)
            .is_some_and(|pokemon| pokemon.tags.has(BattlerTagType::Trapped))
    }) {
        false
    } else {
        let chance = calculate_escape_chance(ctx.state, side);
        let roll = ctx.rng.next_int(100, "escape roll");
        debug!(
            "Escape roll {} against {}% (attempt {})",
            roll,
            chance,
            ctx.state.escape_attempts + 1
        );
        roll < chance as u32
    };

    if escaped {
        ctx.bus.push(BattleEvent::Fled { side });
        ctx.queue.unshift(Phase::BattleEnd {
            outcome: flee_outcome(side),
        });
    } else {
        ctx.state.escape_attempts += 1;
        ctx.bus.push(BattleEvent::EscapeFailed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // Ratios are expressed against an opposing Speed of 100.
    #[rstest]
    #[case(1, 0, 5)]
    #[case(10, 0, 7)]
    #[case(25, 0, 11)]
    #[case(50, 0, 16)]
    #[case(80, 0, 23)]
    #[case(100, 0, 28)]
    #[case(120, 0, 32)]
    #[case(150, 0, 39)]
    #[case(300, 0, 73)]
    #[case(380, 0, 91)]
    #[case(400, 0, 95)]
    #[case(420, 0, 95)]
    #[case(1000, 0, 95)]
    #[case(40, 1, 24)]
    #[case(160, 2, 61)]
    #[case(370, 5, 95)]
    #[case(20, 2, 30)]
    #[case(100, 3, 58)]
    #[case(290, 0, 70)]
    #[case(1, 7, 75)]
    #[case(1620, 4, 95)]
    #[case(200, 3, 80)]
    fn test_single_non_boss(#[case] speed: u32, #[case] attempts: u32, #[case] expected: u8) {
        assert_eq!(escape_chance(speed, 100, attempts, false), expected);
    }

    #[rstest]
    #[case(1, 0, 5)]
    #[case(10, 0, 5)]
    #[case(25, 0, 6)]
    #[case(50, 0, 7)]
    #[case(80, 0, 8)]
    #[case(100, 0, 8)]
    #[case(120, 0, 9)]
    #[case(150, 0, 10)]
    #[case(300, 0, 15)]
    #[case(380, 0, 18)]
    #[case(400, 0, 18)]
    #[case(420, 0, 19)]
    #[case(470, 0, 21)]
    #[case(500, 0, 22)]
    #[case(590, 0, 25)]
    #[case(1000, 0, 25)]
    #[case(40, 1, 8)]
    #[case(160, 2, 14)]
    #[case(370, 5, 25)]
    #[case(20, 2, 10)]
    #[case(100, 3, 14)]
    #[case(290, 0, 15)]
    #[case(1, 7, 19)]
    #[case(200, 3, 18)]
    #[case(450, 1, 22)]
    #[case(510, 1, 24)]
    fn test_single_boss(#[case] speed: u32, #[case] attempts: u32, #[case] expected: u8) {
        assert_eq!(escape_chance(speed, 100, attempts, true), expected);
    }

    // Double battles sum both sides' Speed; the opposing total here is 200.
    #[rstest]
    #[case(60, 0, 12)]
    #[case(140, 0, 21)]
    #[case(540, 0, 66)]
    #[case(420, 0, 52)]
    #[case(360, 0, 46)]
    #[case(180, 1, 35)]
    #[case(6, 7, 76)]
    #[case(4, 7, 75)]
    #[case(200, 5, 78)]
    #[case(140, 3, 51)]
    #[case(480, 9, 95)]
    fn test_double_non_boss(#[case] speed: u32, #[case] attempts: u32, #[case] expected: u8) {
        assert_eq!(escape_chance(speed, 200, attempts, false), expected);
    }

    #[rstest]
    #[case(60, 0, 6)]
    #[case(140, 0, 7)]
    #[case(300, 0, 10)]
    #[case(860, 0, 19)]
    #[case(540, 0, 14)]
    #[case(1140, 0, 24)]
    fn test_double_boss(#[case] speed: u32, #[case] attempts: u32, #[case] expected: u8) {
        assert_eq!(escape_chance(speed, 200, attempts, true), expected);
    }

    #[test]
    fn test_chance_is_monotonic_and_bounded() {
        for is_boss in [false, true] {
            let ceiling = if is_boss { 25 } else { 95 };
            for attempts in 0..12 {
                let mut previous = 0;
                for speed in (0..2000).step_by(7) {
                    let chance = escape_chance(speed, 100, attempts, is_boss);
                    assert!(chance >= previous, "not monotonic in speed at {}", speed);
                    assert!((ESCAPE_FLOOR as u8..=ceiling).contains(&chance));
                    previous = chance;
                }
            }
            for speed in [1, 100, 350] {
                let mut previous = 0;
                for attempts in 0..20 {
                    let chance = escape_chance(speed, 100, attempts, is_boss);
                    assert!(chance >= previous, "not monotonic in attempts at {}", attempts);
                    previous = chance;
                }
            }
        }
    }
}
