use log::{debug, error, info};
use std::collections::VecDeque;

use crate::battle::abilities::{self, AbilityEvent, AbilityTrigger};
use crate::battle::arena::{entry_hazard_commands, weather_damage};
use crate::battle::commands::{execute_command_batch, execute_or_log, BattleCommand, DamageSource, ExecutionError};
use crate::battle::escape::attempt_escape;
use crate::battle::events::{Actor, BattleEvent, EventBus};
use crate::battle::pipeline::{
    self, apply_stat_stage_change, is_grounded, MovePhase, MoveUseContext,
};
use crate::battle::rng::BattleRng;
use crate::battle::scheduler::speed_order;
use crate::battle::state::{BattleOutcome, BattleState, BattlerIndex, GameState, SideId, SwitchKind};
use crate::battle::tags::{expire_commands, BattlerTag, BattlerTagType, TagData};
use crate::pokemon::{PassedState, StatusCondition, TurnData};
use schema::{HeldItem, MoveId, PokemonType, StatType, TerrainType};

/// Everything a phase may touch. Passed explicitly; there is no global battle.
pub struct BattleContext<'a> {
    pub state: &'a mut BattleState,
    pub bus: &'a mut EventBus,
    pub queue: &'a mut PhaseQueue,
    pub rng: &'a mut dyn BattleRng,
}

/// One discrete step of battle resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    BattleStart,
    Switch {
        battler: BattlerIndex,
        team_index: usize,
        kind: SwitchKind,
    },
    /// Player side waits for a party choice; the enemy picks on its own.
    SwitchPrompt {
        battler: BattlerIndex,
        kind: SwitchKind,
    },
    AttemptRun {
        side: SideId,
    },
    Move(MovePhase),
    MoveEffect(Box<MoveUseContext>),
    MoveSecondary(Box<MoveUseContext>),
    MoveEnd(Box<MoveUseContext>),
    StatStageChange {
        target: BattlerIndex,
        target_id: u32,
        stats: Vec<StatType>,
        delta: i8,
        source: Option<BattlerIndex>,
        ignore_abilities: bool,
    },
    Faint {
        battler: BattlerIndex,
        pokemon_id: u32,
    },
    WeatherEffect,
    PostTurnStatus,
    TurnEnd,
    ReplaceFainted,
    BattleEnd {
        outcome: BattleOutcome,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::BattleStart => "BattleStart",
            Phase::Switch { .. } => "Switch",
            Phase::SwitchPrompt { .. } => "SwitchPrompt",
            Phase::AttemptRun { .. } => "AttemptRun",
            Phase::Move(_) => "Move",
            Phase::MoveEffect(_) => "MoveEffect",
            Phase::MoveSecondary(_) => "MoveSecondary",
            Phase::MoveEnd(_) => "MoveEnd",
            Phase::StatStageChange { .. } => "StatStageChange",
            Phase::Faint { .. } => "Faint",
            Phase::WeatherEffect => "WeatherEffect",
            Phase::PostTurnStatus => "PostTurnStatus",
            Phase::TurnEnd => "TurnEnd",
            Phase::ReplaceFainted => "ReplaceFainted",
            Phase::BattleEnd { .. } => "BattleEnd",
        }
    }
}

/// Whether the controller keeps going after a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Continue,
    AwaitInput,
}

/// FIFO queue of phases with a front-insertion buffer.
///
/// Phases unshifted while one phase runs are collected in order and moved to
/// the front together, so children run in the order they were created and
/// before anything queued earlier.
#[derive(Debug, Clone, Default)]
pub struct PhaseQueue {
    queue: VecDeque<Phase>,
    prepend: Vec<Phase>,
}

impl PhaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a phase to the end of the queue.
    pub fn push(&mut self, phase: Phase) {
        self.queue.push_back(phase);
    }

    /// Schedules a phase ahead of everything already queued.
    pub fn unshift(&mut self, phase: Phase) {
        self.prepend.push(phase);
    }

    /// Moves buffered front insertions to the head of the queue, keeping their order.
    pub fn flush_prepend(&mut self) {
        for phase in self.prepend.drain(..).rev() {
            self.queue.push_front(phase);
        }
    }

    pub fn pop(&mut self) -> Option<Phase> {
        self.flush_prepend();
        self.queue.pop_front()
    }

    /// Drops every pending phase, used when the battle ends mid-turn.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.prepend.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len() + self.prepend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.prepend.is_empty()
    }

    /// Pending phases in run order.
    pub fn pending(&self) -> Vec<&Phase> {
        self.prepend.iter().chain(self.queue.iter()).collect()
    }
}

/// Runs one phase to completion or to an input suspension point.
pub fn run_phase(ctx: &mut BattleContext, phase: Phase) -> PhaseOutcome {
    let name = phase.name();
    debug!("[PHASE] {} (turn {})", name, ctx.state.turn);
    let result = match phase {
        Phase::BattleStart => run_battle_start(ctx),
        Phase::Switch {
            battler,
            team_index,
            kind,
        } => run_switch(ctx, battler, team_index, kind),
        Phase::SwitchPrompt { battler, kind } => return run_switch_prompt(ctx, battler, kind),
        Phase::AttemptRun { side } => {
            attempt_escape(ctx, side);
            Ok(())
        }
        Phase::Move(move_phase) => pipeline::run_move_phase(ctx, move_phase),
        Phase::MoveEffect(use_ctx) => pipeline::run_move_effect(ctx, *use_ctx),
        Phase::MoveSecondary(use_ctx) => pipeline::run_move_secondary(ctx, *use_ctx),
        Phase::MoveEnd(use_ctx) => pipeline::run_move_end(ctx, *use_ctx),
        Phase::StatStageChange {
            target,
            target_id,
            stats,
            delta,
            source,
            ignore_abilities,
        } => {
            if ctx.state.is_active(target, target_id) {
                apply_stat_stage_change(ctx, target, &stats, delta, source, ignore_abilities);
            }
            Ok(())
        }
        Phase::Faint {
            battler,
            pokemon_id,
        } => run_faint(ctx, battler, pokemon_id),
        Phase::WeatherEffect => run_weather_effect(ctx),
        Phase::PostTurnStatus => run_post_turn_status(ctx),
        Phase::TurnEnd => run_turn_end(ctx),
        Phase::ReplaceFainted => run_replace_fainted(ctx),
        Phase::BattleEnd { outcome } => {
            run_battle_end(ctx, outcome);
            Ok(())
        }
    };
    if let Err(err) = result {
        error!("{} phase aborted: {}", name, err);
    }
    PhaseOutcome::Continue
}

fn actor_at(state: &BattleState, battler: BattlerIndex) -> Result<Actor, ExecutionError> {
    state
        .pokemon(battler)
        .map(|pokemon| Actor::new(battler, pokemon))
        .ok_or(ExecutionError::NoPokemon(battler))
}

fn run_battle_start(ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    ctx.bus.push(BattleEvent::BattleStarted {
        battle_type: ctx.state.battle_type,
        double_battle: ctx.state.double_battle,
    });
    let battlers = ctx.state.active_battlers();
    for battler in &battlers {
        let actor = actor_at(ctx.state, *battler)?;
        ctx.bus.push(BattleEvent::PokemonSentOut {
            actor,
            kind: SwitchKind::Normal,
        });
    }
    for battler in speed_order(ctx.state, &battlers) {
        abilities::dispatch(ctx, AbilityTrigger::new(AbilityEvent::OnSwitchIn), &[battler]);
    }
    Ok(())
}

/// Ends Bind-style traps whose user is leaving the field.
fn release_traps(ctx: &mut BattleContext, source_id: u32) {
    for battler in ctx.state.active_battlers() {
        let Some(pokemon) = ctx.state.pokemon_mut(battler) else {
            continue;
        };
        let held_by_source = pokemon
            .tags
            .get(BattlerTagType::Trapped)
            .is_some_and(|tag| tag.source_id == Some(source_id));
        if held_by_source {
            pokemon.tags.remove(BattlerTagType::Trapped);
            let actor = Actor::new(battler, pokemon);
            ctx.bus.push(BattleEvent::TagRemoved {
                target: actor,
                tag: BattlerTagType::Trapped,
            });
        }
    }
}

fn run_switch(
    ctx: &mut BattleContext,
    battler: BattlerIndex,
    team_index: usize,
    kind: SwitchKind,
) -> Result<(), ExecutionError> {
    let side = ctx.state.side(battler.side);
    let incoming = side.team.get(team_index).ok_or_else(|| {
        ExecutionError::StateValidationError(format!("no team member at index {}", team_index))
    })?;
    if incoming.is_fainted() || side.is_on_field(team_index) {
        return Err(ExecutionError::StateValidationError(format!(
            "team member {} cannot be sent out",
            team_index
        )));
    }
    let outgoing = side.active.get(battler.slot).copied().flatten();

    let mut passed = PassedState::default();
    let mut shed_tail_hp = None;
    let mut outgoing_suppressor = false;
    if let Some(outgoing_index) = outgoing {
        let outgoing_mon = &ctx.state.side(battler.side).team[outgoing_index];
        let outgoing_id = outgoing_mon.id;
        if !outgoing_mon.is_fainted() {
            outgoing_suppressor = abilities::is_field_suppressor(outgoing_mon.ability);
            if kind == SwitchKind::ShedTail {
                shed_tail_hp = Some(outgoing_mon.max_hp() / 4);
            }
            abilities::dispatch(ctx, AbilityTrigger::new(AbilityEvent::OnSwitchOut), &[battler]);
            let actor = actor_at(ctx.state, battler)?;
            ctx.bus.push(BattleEvent::PokemonWithdrawn { actor });
        }
        if let Some(pokemon) = ctx.state.pokemon_mut(battler) {
            passed = pokemon.withdraw();
        }
        release_traps(ctx, outgoing_id);
    }

    ctx.state.side_mut(battler.side).active[battler.slot] = Some(team_index);
    let incoming = ctx
        .state
        .pokemon_mut(battler)
        .ok_or(ExecutionError::NoPokemon(battler))?;
    incoming.turn_data = TurnData {
        switched_in: true,
        ..TurnData::default()
    };
    match kind {
        SwitchKind::BatonPass => {
            incoming.stat_stages = passed.stat_stages;
            for tag in passed.tags {
                incoming.tags.add(tag);
            }
        }
        SwitchKind::ShedTail => {
            if let Some(hp) = shed_tail_hp {
                incoming.tags.add(BattlerTag::new(
                    TagData::Substitute { hp },
                    0,
                    MoveId::ShedTail,
                    None,
                ));
            }
        }
        SwitchKind::Normal | SwitchKind::Forced | SwitchKind::Replacement => {}
    }
    let actor = Actor::new(battler, incoming);
    ctx.bus.push(BattleEvent::PokemonSentOut { actor, kind });

    execute_or_log(entry_hazard_commands(ctx.state, battler), ctx);

    if ctx.state.is_active(battler, actor.id) {
        abilities::dispatch(ctx, AbilityTrigger::new(AbilityEvent::OnSwitchIn), &[battler]);
    }

    abilities::restore_suppressed_abilities(ctx, battler, outgoing_suppressor);
    Ok(())
}

fn run_switch_prompt(ctx: &mut BattleContext, battler: BattlerIndex, kind: SwitchKind) -> PhaseOutcome {
    let candidates = ctx.state.side(battler.side).bench_candidates();
    let Some(first) = candidates.first().copied() else {
        debug!("No bench candidates for {:?}; switch skipped", battler);
        return PhaseOutcome::Continue;
    };
    match battler.side {
        SideId::Player => {
            ctx.state.game_state = GameState::AwaitingPartySelection { battler, kind };
            ctx.bus.push(BattleEvent::PartySelectionRequested { battler, kind });
            PhaseOutcome::AwaitInput
        }
        SideId::Enemy => {
            ctx.queue.unshift(Phase::Switch {
                battler,
                team_index: first,
                kind,
            });
            PhaseOutcome::Continue
        }
    }
}

fn run_faint(ctx: &mut BattleContext, battler: BattlerIndex, pokemon_id: u32) -> Result<(), ExecutionError> {
    let Some(pokemon) = ctx.state.pokemon(battler) else {
        return Ok(());
    };
    if pokemon.id != pokemon_id || !pokemon.is_fainted() {
        return Ok(());
    }
    let actor = Actor::new(battler, pokemon);
    let was_suppressor = abilities::is_field_suppressor(pokemon.ability);
    ctx.bus.push(BattleEvent::Fainted { target: actor });
    if let Some(pokemon) = ctx.state.pokemon_mut(battler) {
        pokemon.withdraw();
        pokemon.status = None;
    }
    release_traps(ctx, pokemon_id);
    abilities::restore_suppressed_abilities(ctx, battler, was_suppressor);

    if let Some(outcome) = ctx.state.check_win_condition() {
        ctx.queue.unshift(Phase::BattleEnd { outcome });
    }
    Ok(())
}

fn run_weather_effect(ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    if ctx.state.arena.weather().is_none() {
        return Ok(());
    }
    let battlers = ctx.state.active_battlers();
    for battler in speed_order(ctx.state, &battlers) {
        if let Some(command) = weather_damage(ctx.state, battler) {
            execute_command_batch(vec![command], ctx)?;
        }
    }
    Ok(())
}

/// Residual damage and healing for one Pokemon at the end of the turn.
fn residual_commands(state: &BattleState, battler: BattlerIndex) -> Vec<BattleCommand> {
    let Some(pokemon) = state.pokemon(battler) else {
        return Vec::new();
    };
    let max_hp = pokemon.max_hp();
    let fraction = |denominator: u16| (max_hp / denominator).max(1);
    let mut commands = Vec::new();

    match pokemon.status {
        Some(StatusCondition::Burn) => commands.push(BattleCommand::DealDamage {
            target: battler,
            amount: fraction(16),
            source: DamageSource::Status(schema::StatusType::Burn),
        }),
        Some(StatusCondition::Poison) => commands.push(BattleCommand::DealDamage {
            target: battler,
            amount: fraction(8),
            source: DamageSource::Status(schema::StatusType::Poison),
        }),
        Some(StatusCondition::Toxic { counter }) => commands.push(BattleCommand::DealDamage {
            target: battler,
            amount: ((max_hp as u32 * counter as u32) / 16).max(1) as u16,
            source: DamageSource::Status(schema::StatusType::Toxic),
        }),
        Some(StatusCondition::Sleep { .. })
        | Some(StatusCondition::Freeze)
        | Some(StatusCondition::Paralysis)
        | None => {}
    }

    for tag in pokemon.tags.iter() {
        match &tag.data {
            TagData::Seeded { source } => {
                let amount = fraction(8);
                commands.push(BattleCommand::DealDamage {
                    target: battler,
                    amount,
                    source: DamageSource::Tag(BattlerTagType::Seeded),
                });
                if state.pokemon(*source).is_some_and(|seeder| !seeder.is_fainted()) {
                    commands.push(BattleCommand::Heal {
                        target: *source,
                        amount: amount.min(pokemon.current_hp()),
                    });
                }
            }
            TagData::Trapped => commands.push(BattleCommand::DealDamage {
                target: battler,
                amount: fraction(8),
                source: DamageSource::Tag(BattlerTagType::Trapped),
            }),
            TagData::SaltCured => {
                let denominator = if pokemon.has_type(PokemonType::Water) || pokemon.has_type(PokemonType::Steel) {
                    4
                } else {
                    8
                };
                commands.push(BattleCommand::DealDamage {
                    target: battler,
                    amount: fraction(denominator),
                    source: DamageSource::Tag(BattlerTagType::SaltCured),
                });
            }
            TagData::AquaRing | TagData::Ingrain => commands.push(BattleCommand::Heal {
                target: battler,
                amount: fraction(16),
            }),
            _ => {}
        }
    }

    if state.arena.terrain() == Some(TerrainType::Grassy) && is_grounded(state, battler, false) {
        commands.push(BattleCommand::Heal {
            target: battler,
            amount: fraction(16),
        });
    }
    if pokemon.item == Some(HeldItem::Leftovers) && pokemon.current_hp() < max_hp {
        commands.push(BattleCommand::EmitEvent(BattleEvent::ItemActivated {
            actor: Actor::new(battler, pokemon),
            item: HeldItem::Leftovers,
        }));
        commands.push(BattleCommand::Heal {
            target: battler,
            amount: fraction(16),
        });
    }
    commands
}

fn run_post_turn_status(ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    let battlers = ctx.state.active_battlers();
    for battler in speed_order(ctx.state, &battlers) {
        let Some(pokemon_id) = ctx.state.pokemon(battler).map(|p| p.id) else {
            continue;
        };
        for command in residual_commands(ctx.state, battler) {
            if !ctx.state.is_active(battler, pokemon_id) {
                break;
            }
            execute_command_batch(vec![command], ctx)?;
        }
        if let Some(pokemon) = ctx.state.pokemon_mut(battler) {
            if let Some(StatusCondition::Toxic { counter }) = pokemon.status.as_mut() {
                *counter = (*counter + 1).min(15);
            }
        }
        if ctx.state.is_active(battler, pokemon_id) {
            abilities::dispatch(ctx, AbilityTrigger::new(AbilityEvent::TurnEnd), &[battler]);
        }
    }
    Ok(())
}

fn run_turn_end(ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    for battler in ctx.state.active_battlers() {
        let expired = match ctx.state.pokemon_mut(battler) {
            Some(pokemon) => pokemon.tags.tick_turn_end(),
            None => continue,
        };
        for tag in expired {
            let commands = expire_commands(ctx.state, battler, &tag, ctx.rng);
            execute_command_batch(commands, ctx)?;
        }
    }

    let tick = ctx.state.arena.tick_turn_end();
    if let Some(weather) = tick.weather_ended {
        ctx.bus.push(BattleEvent::WeatherEnded { weather });
        abilities::weather_changed(ctx);
    }
    if let Some(terrain) = tick.terrain_ended {
        ctx.bus.push(BattleEvent::TerrainEnded { terrain });
    }
    for tag in tick.tags_ended {
        ctx.bus.push(BattleEvent::ArenaTagRemoved {
            tag: tag.tag,
            side: tag.side,
        });
    }

    for battler in ctx.state.active_battlers() {
        if let Some(pokemon) = ctx.state.pokemon_mut(battler) {
            pokemon.summon_data.turns_on_field += 1;
            pokemon.turn_data = TurnData::default();
        }
    }
    ctx.bus.push(BattleEvent::TurnEnded {
        turn: ctx.state.turn,
    });
    ctx.state.turn += 1;
    Ok(())
}

fn run_replace_fainted(ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    for side in SideId::ALL {
        if side == SideId::Enemy && ctx.state.is_wild() {
            continue;
        }
        let slots = ctx.state.side(side).active.len();
        let mut open_slots = Vec::new();
        for slot in 0..slots {
            let battler = BattlerIndex::new(side, slot);
            if ctx.state.pokemon(battler).is_some_and(|p| p.is_fainted()) {
                open_slots.push(battler);
            }
        }
        let available = ctx.state.side(side).bench_candidates().len();
        for (position, battler) in open_slots.into_iter().enumerate() {
            if position < available {
                ctx.queue.unshift(Phase::SwitchPrompt {
                    battler,
                    kind: SwitchKind::Replacement,
                });
            } else {
                ctx.state.side_mut(side).active[battler.slot] = None;
            }
        }
    }
    Ok(())
}

fn run_battle_end(ctx: &mut BattleContext, outcome: BattleOutcome) {
    ctx.state.game_state = GameState::Ended(outcome);
    ctx.bus.push(BattleEvent::BattleEnded { outcome });
    info!("Battle ended on turn {}: {:?}", ctx.state.turn, outcome);
    ctx.queue.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_is_fifo() {
        let mut queue = PhaseQueue::new();
        queue.push(Phase::WeatherEffect);
        queue.push(Phase::PostTurnStatus);
        queue.push(Phase::TurnEnd);
        assert_eq!(queue.pop(), Some(Phase::WeatherEffect));
        assert_eq!(queue.pop(), Some(Phase::PostTurnStatus));
        assert_eq!(queue.pop(), Some(Phase::TurnEnd));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_unshift_runs_first_in_insertion_order() {
        let mut queue = PhaseQueue::new();
        queue.push(Phase::TurnEnd);
        queue.unshift(Phase::WeatherEffect);
        queue.unshift(Phase::PostTurnStatus);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(Phase::WeatherEffect));
        assert_eq!(queue.pop(), Some(Phase::PostTurnStatus));
        assert_eq!(queue.pop(), Some(Phase::TurnEnd));
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut queue = PhaseQueue::new();
        queue.push(Phase::TurnEnd);
        queue.unshift(Phase::ReplaceFainted);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
