use log::debug;
use std::cmp::Ordering;

use crate::ability_data::AbilityAttr;
use crate::battle::abilities::active_ability;
use crate::battle::commands::{execute_or_log, BattleCommand};
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::pipeline::MovePhase;
use crate::battle::rng::{shuffle, BattleRng};
use crate::battle::state::{BattleState, BattlerIndex, SwitchKind};
use crate::battle::stats::effective_speed;
use crate::battle::tags::{BattlerTag, BattlerTagType, TagData};
use crate::move_data::{get_move_data, MoveData};
use crate::pokemon::UseMode;
use schema::{HeldItem, MoveId};

/// Chance in percent that a Quick Claw holder acts first in its bracket.
const QUICK_CLAW_CHANCE: u8 = 20;

/// What one active Pokemon does this turn, after input has been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnAction {
    pub battler: BattlerIndex,
    pub pokemon_id: u32,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Switch {
        team_index: usize,
    },
    Move {
        move_id: MoveId,
        move_slot: Option<usize>,
        targets: Vec<BattlerIndex>,
        use_mode: UseMode,
    },
    Run,
}

/// Sort key for one action. Higher sorts first, except speed under Trick Room.
#[derive(Debug, Clone, Copy)]
struct ActionPriority {
    bracket: i8,
    move_priority: i8,
    bypass_speed: bool,
    speed: u16,
}

const SWITCH_BRACKET: i8 = 1;
const MOVE_BRACKET: i8 = 0;
const RUN_BRACKET: i8 = -1;

/// Move priority after ability modifiers such as Prankster.
pub fn effective_priority(state: &BattleState, battler: BattlerIndex, move_data: &MoveData) -> i8 {
    let bonus: i8 = active_ability(state, battler)
        .map(|ability| {
            ability
                .attrs
                .iter()
                .filter_map(|attr| match attr {
                    AbilityAttr::ChangeMovePriority { category, delta } if *category == move_data.category => {
                        Some(*delta)
                    }
                    _ => None,
                })
                .sum()
        })
        .unwrap_or(0);
    move_data.priority.saturating_add(bonus)
}

/// Fastest first, ties by field position. Used where the rules ask for
/// "speed order" outside of turn ordering, so it never draws randomness.
pub fn speed_order(state: &BattleState, battlers: &[BattlerIndex]) -> Vec<BattlerIndex> {
    let mut ordered: Vec<(BattlerIndex, u16)> = battlers
        .iter()
        .map(|battler| (*battler, effective_speed(state, *battler)))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ordered.into_iter().map(|(battler, _)| battler).collect()
}

fn bypass_speed_chance(state: &BattleState, battler: BattlerIndex) -> Option<(u8, bool)> {
    let ability_chance = active_ability(state, battler).and_then(|ability| {
        ability.attrs.iter().find_map(|attr| match attr {
            AbilityAttr::BypassSpeedChance { percent } => Some(*percent),
            _ => None,
        })
    });
    if let Some(percent) = ability_chance {
        return Some((percent, true));
    }
    let holds_claw = state
        .pokemon(battler)
        .is_some_and(|pokemon| pokemon.item == Some(HeldItem::QuickClaw));
    holds_claw.then_some((QUICK_CLAW_CHANCE, false))
}

/// Rolls Quick Claw and Quick Draw for attacking moves. A success tags the
/// holder for the turn; it never changes the move's priority.
fn roll_bypass_speed(ctx: &mut BattleContext, actions: &[TurnAction]) {
    for action in actions {
        let ActionKind::Move { move_id, .. } = &action.kind else {
            continue;
        };
        let is_attack = get_move_data(*move_id).is_ok_and(|data| data.is_attack());
        if !is_attack {
            continue;
        }
        let Some((percent, from_ability)) = bypass_speed_chance(ctx.state, action.battler) else {
            continue;
        };
        if !ctx.rng.chance(percent, "bypass speed") {
            continue;
        }
        let Some(pokemon) = ctx.state.pokemon(action.battler) else {
            continue;
        };
        let actor = Actor::new(action.battler, pokemon);
        let announcement = if from_ability {
            BattleEvent::AbilityActivated {
                actor,
                ability: pokemon.ability,
            }
        } else {
            BattleEvent::ItemActivated {
                actor,
                item: HeldItem::QuickClaw,
            }
        };
        execute_or_log(
            vec![
                BattleCommand::AddTag {
                    target: action.battler,
                    tag: BattlerTag::new(TagData::BypassSpeed, 1, *move_id, Some(action.pokemon_id)),
                },
                BattleCommand::EmitEvent(announcement),
            ],
            ctx,
        );
    }
}

fn action_priority(state: &BattleState, action: &TurnAction) -> ActionPriority {
    let speed = effective_speed(state, action.battler);
    let bypass_speed = state
        .pokemon(action.battler)
        .is_some_and(|pokemon| pokemon.tags.has(BattlerTagType::BypassSpeed));
    match &action.kind {
        ActionKind::Switch { .. } => ActionPriority {
            bracket: SWITCH_BRACKET,
            move_priority: 0,
            bypass_speed: false,
            speed,
        },
        ActionKind::Move { move_id, .. } => ActionPriority {
            bracket: MOVE_BRACKET,
            move_priority: get_move_data(*move_id)
                .map(|data| effective_priority(state, action.battler, data))
                .unwrap_or(0),
            bypass_speed,
            speed,
        },
        ActionKind::Run => ActionPriority {
            bracket: RUN_BRACKET,
            move_priority: 0,
            bypass_speed: false,
            speed,
        },
    }
}

fn compare(a: &ActionPriority, b: &ActionPriority, trick_room: bool) -> Ordering {
    b.bracket
        .cmp(&a.bracket)
        .then(b.move_priority.cmp(&a.move_priority))
        .then(b.bypass_speed.cmp(&a.bypass_speed))
        .then_with(|| {
            if trick_room {
                a.speed.cmp(&b.speed)
            } else {
                b.speed.cmp(&a.speed)
            }
        })
}

/// Orders the turn's actions. Exact ties keep the order of a seeded shuffle,
/// so they are random but replayable.
pub fn sort_actions(state: &BattleState, mut actions: Vec<TurnAction>, rng: &mut dyn BattleRng) -> Vec<TurnAction> {
    shuffle(rng, &mut actions, "speed tie");
    let trick_room = state.arena.is_trick_room();
    let mut keyed: Vec<(ActionPriority, TurnAction)> = actions
        .into_iter()
        .map(|action| (action_priority(state, &action), action))
        .collect();
    keyed.sort_by(|a, b| compare(&a.0, &b.0, trick_room));
    keyed.into_iter().map(|(_, action)| action).collect()
}

fn to_phase(action: TurnAction) -> Phase {
    match action.kind {
        ActionKind::Switch { team_index } => Phase::Switch {
            battler: action.battler,
            team_index,
            kind: SwitchKind::Normal,
        },
        ActionKind::Move {
            move_id,
            move_slot,
            targets,
            use_mode,
        } => Phase::Move(MovePhase {
            user: action.battler,
            user_id: action.pokemon_id,
            move_id,
            targets,
            use_mode,
            move_slot,
            call_depth: 0,
        }),
        ActionKind::Run => Phase::AttemptRun {
            side: action.battler.side,
        },
    }
}

/// Rolls bypass-speed effects, sorts the actions and queues one phase per
/// action behind whatever is already pending.
pub fn order_turn(ctx: &mut BattleContext, actions: Vec<TurnAction>) {
    roll_bypass_speed(ctx, &actions);
    let ordered = sort_actions(ctx.state, actions, ctx.rng);
    debug!(
        "Turn {} order: {:?}",
        ctx.state.turn,
        ordered
            .iter()
            .map(|action| (action.battler, &action.kind))
            .collect::<Vec<_>>()
    );
    for action in ordered {
        ctx.queue.push(to_phase(action));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::rng::TurnRng;
    use crate::battle::state::{BattleType, SideId};
    use crate::pokemon::PokemonInst;
    use crate::species::Species;
    use pretty_assertions::assert_eq;

    fn state_with(player: Species, enemy: Species) -> BattleState {
        BattleState::new(
            BattleType::Trainer,
            false,
            vec![PokemonInst::new(player, 50, &[MoveId::Tackle, MoveId::QuickAttack]).unwrap()],
            vec![PokemonInst::new(enemy, 50, &[MoveId::Tackle]).unwrap()],
        )
        .unwrap()
    }

    fn fight(battler: BattlerIndex, id: u32, move_id: MoveId) -> TurnAction {
        TurnAction {
            battler,
            pokemon_id: id,
            kind: ActionKind::Move {
                move_id,
                move_slot: Some(0),
                targets: Vec::new(),
                use_mode: UseMode::Normal,
            },
        }
    }

    const PLAYER: BattlerIndex = BattlerIndex::new(SideId::Player, 0);
    const ENEMY: BattlerIndex = BattlerIndex::new(SideId::Enemy, 0);

    #[test]
    fn test_faster_pokemon_moves_first() {
        // Regieleki outspeeds Snorlax by a wide margin.
        let state = state_with(Species::Snorlax, Species::Regieleki);
        let mut rng = TurnRng::new_for_test(vec![0]);
        let ordered = sort_actions(
            &state,
            vec![fight(PLAYER, 1, MoveId::Tackle), fight(ENEMY, 2, MoveId::Tackle)],
            &mut rng,
        );
        assert_eq!(ordered[0].battler, ENEMY);
    }

    #[test]
    fn test_priority_beats_speed() {
        let state = state_with(Species::Snorlax, Species::Regieleki);
        let mut rng = TurnRng::new_for_test(vec![0]);
        let ordered = sort_actions(
            &state,
            vec![fight(PLAYER, 1, MoveId::QuickAttack), fight(ENEMY, 2, MoveId::Tackle)],
            &mut rng,
        );
        assert_eq!(ordered[0].battler, PLAYER);
    }

    #[test]
    fn test_switch_and_run_brackets() {
        let state = state_with(Species::Snorlax, Species::Regieleki);
        let mut rng = TurnRng::new_for_test(vec![0, 0]);
        let ordered = sort_actions(
            &state,
            vec![
                TurnAction {
                    battler: PLAYER,
                    pokemon_id: 1,
                    kind: ActionKind::Run,
                },
                fight(ENEMY, 2, MoveId::Tackle),
            ],
            &mut rng,
        );
        assert_eq!(ordered[0].battler, ENEMY);

        let ordered = sort_actions(
            &state,
            vec![
                fight(ENEMY, 2, MoveId::QuickAttack),
                TurnAction {
                    battler: PLAYER,
                    pokemon_id: 1,
                    kind: ActionKind::Switch { team_index: 0 },
                },
            ],
            &mut rng,
        );
        assert_eq!(ordered[0].battler, PLAYER);
    }

    #[test]
    fn test_speed_order_is_deterministic_on_ties() {
        let state = state_with(Species::Pikachu, Species::Pikachu);
        assert_eq!(speed_order(&state, &[ENEMY, PLAYER]), vec![PLAYER, ENEMY]);
    }
}
