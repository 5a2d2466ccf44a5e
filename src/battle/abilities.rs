use log::debug;

use crate::ability_data::{get_ability_data, AbilityAttr, AbilityData};
use crate::battle::arena::{TERRAIN_TURNS, WEATHER_TURNS};
use crate::battle::commands::{execute_or_log, BattleCommand, DamageSource};
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::move_calling::dancer_copy;
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::pipeline::status_blocked;
use crate::battle::scheduler::speed_order;
use crate::battle::state::{BattleState, BattlerIndex};
use schema::{AbilityId, MoveId, PokemonType, StatusType, WeatherType};

/// Event kinds ability handlers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityEvent {
    PreMove,
    PostDamageDealt,
    PostDamageReceived,
    OnSwitchIn,
    OnSwitchOut,
    OnFaint,
    OnStatStageChange,
    OnWeatherChange,
    TurnEnd,
    PostMoveUsed,
}

/// The event an attribute reacts to, or `None` for attributes that only answer queries.
pub fn subscribed_event(attr: &AbilityAttr) -> Option<AbilityEvent> {
    match attr {
        AbilityAttr::PreMoveTypeChange => Some(AbilityEvent::PreMove),
        AbilityAttr::PostAttackContactStatus { .. } | AbilityAttr::PostVictoryStatStage { .. } => {
            Some(AbilityEvent::PostDamageDealt)
        }
        AbilityAttr::PostDefendContactDamage { .. } | AbilityAttr::PostDefendContactStatus { .. } => {
            Some(AbilityEvent::PostDamageReceived)
        }
        AbilityAttr::PostSummonStatStage { .. }
        | AbilityAttr::PostSummonWeather(_)
        | AbilityAttr::PostSummonTerrain(_)
        | AbilityAttr::SuppressFieldAbilities => Some(AbilityEvent::OnSwitchIn),
        AbilityAttr::PreSwitchOutHeal { .. } | AbilityAttr::PreSwitchOutCureStatus => {
            Some(AbilityEvent::OnSwitchOut)
        }
        AbilityAttr::PostFaintContactDamage { .. } => Some(AbilityEvent::OnFaint),
        AbilityAttr::StatLoweredBoost { .. } => Some(AbilityEvent::OnStatStageChange),
        AbilityAttr::PostTurnStatStage { .. } => Some(AbilityEvent::TurnEnd),
        AbilityAttr::PostDancingMove => Some(AbilityEvent::PostMoveUsed),
        AbilityAttr::PostWeatherChangeType => Some(AbilityEvent::OnWeatherChange),
        AbilityAttr::ChangeMovePriority { .. }
        | AbilityAttr::BypassSpeedChance { .. }
        | AbilityAttr::IgnoreTargetAbilities
        | AbilityAttr::BypassSubstitute
        | AbilityAttr::StatusImmunity(_)
        | AbilityAttr::TagImmunity(_)
        | AbilityAttr::MoveTypeImmunity { .. }
        | AbilityAttr::SoundImmunity
        | AbilityAttr::ProtectStats
        | AbilityAttr::WeatherSpeedMultiplier { .. }
        | AbilityAttr::RunAway
        | AbilityAttr::AlwaysHit
        | AbilityAttr::AccuracyMultiplier { .. } => None,
    }
}

pub fn is_field_suppressor(ability: AbilityId) -> bool {
    get_ability_data(ability)
        .map(|data| data.attrs.contains(&AbilityAttr::SuppressFieldAbilities))
        .unwrap_or(false)
}

/// True while any conscious Pokemon on the field holds a suppressing ability.
pub fn field_suppressed(state: &BattleState) -> bool {
    state
        .active_battlers()
        .into_iter()
        .filter_map(|battler| state.pokemon(battler))
        .any(|pokemon| is_field_suppressor(pokemon.ability))
}

/// Lets every active Pokemon react to the weather starting or clearing.
pub fn weather_changed(ctx: &mut BattleContext) {
    let battlers = ctx.state.active_battlers();
    dispatch(ctx, AbilityTrigger::new(AbilityEvent::OnWeatherChange), &battlers);
}

/// Re-announces the on-entry abilities of everyone still on the field once a
/// suppressing Pokemon has left it by any route.
pub fn restore_suppressed_abilities(ctx: &mut BattleContext, leaving: BattlerIndex, was_suppressor: bool) {
    if !was_suppressor || field_suppressed(ctx.state) {
        return;
    }
    let others: Vec<BattlerIndex> = ctx
        .state
        .active_battlers()
        .into_iter()
        .filter(|other| *other != leaving)
        .collect();
    for other in speed_order(ctx.state, &others) {
        dispatch(ctx, AbilityTrigger::new(AbilityEvent::OnSwitchIn), &[other]);
    }
}

/// The holder's ability, unless suppressed by a field-wide suppressor.
pub fn active_ability(state: &BattleState, battler: BattlerIndex) -> Option<&'static AbilityData> {
    let pokemon = state.pokemon(battler)?;
    let data = get_ability_data(pokemon.ability).ok()?;
    if data.suppressable && field_suppressed(state) {
        return None;
    }
    Some(data)
}

/// Ability of a Pokemon being targeted. Breakable abilities are ignored while
/// a Mold Breaker-class move is resolving.
pub fn defending_ability(
    state: &BattleState,
    battler: BattlerIndex,
    ignore_abilities: bool,
) -> Option<&'static AbilityData> {
    active_ability(state, battler).filter(|data| !(ignore_abilities && data.breakable))
}

pub fn has_ability_attr(
    state: &BattleState,
    battler: BattlerIndex,
    predicate: impl Fn(&AbilityAttr) -> bool,
) -> bool {
    active_ability(state, battler).is_some_and(|data| data.attrs.iter().any(predicate))
}

/// Whether moves used by `battler` ignore breakable defensive abilities.
pub fn ignores_target_abilities(state: &BattleState, battler: BattlerIndex) -> bool {
    has_ability_attr(state, battler, |attr| matches!(attr, AbilityAttr::IgnoreTargetAbilities))
}

/// What happened, from the point of view of the Pokemon whose ability reacts.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityTrigger {
    pub event: AbilityEvent,
    /// The other party: attacker for defensive triggers, target for offensive ones.
    pub other: Option<BattlerIndex>,
    pub move_id: Option<MoveId>,
    pub targets: Vec<BattlerIndex>,
    pub contact: bool,
    pub ignore_abilities: bool,
}

impl AbilityTrigger {
    pub fn new(event: AbilityEvent) -> Self {
        Self {
            event,
            other: None,
            move_id: None,
            targets: Vec::new(),
            contact: false,
            ignore_abilities: false,
        }
    }

    pub fn with_other(mut self, other: BattlerIndex) -> Self {
        self.other = Some(other);
        self
    }

    pub fn with_move(mut self, move_id: MoveId, contact: bool) -> Self {
        self.move_id = Some(move_id);
        self.contact = contact;
        self
    }

    pub fn with_targets(mut self, targets: Vec<BattlerIndex>) -> Self {
        self.targets = targets;
        self
    }

    pub fn ignoring_abilities(mut self, ignore: bool) -> Self {
        self.ignore_abilities = ignore;
        self
    }
}

/// Runs every matching handler of `holders`, fastest holder first.
pub fn dispatch(ctx: &mut BattleContext, trigger: AbilityTrigger, holders: &[BattlerIndex]) {
    for holder in speed_order(ctx.state, holders) {
        let Some(ability) = (match trigger.event {
            AbilityEvent::PostDamageReceived => {
                defending_ability(ctx.state, holder, trigger.ignore_abilities)
            }
            _ => active_ability(ctx.state, holder),
        }) else {
            continue;
        };
        for attr in &ability.attrs {
            if subscribed_event(attr) != Some(trigger.event) {
                continue;
            }
            let commands = handle(ctx, holder, ability.id, attr, &trigger);
            if !commands.is_empty() {
                debug!("{:?} on {:?} reacted to {:?}", ability.id, holder, trigger.event);
                execute_or_log(commands, ctx);
            }
        }
    }
}

fn activated(actor: Actor, ability: AbilityId) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::AbilityActivated { actor, ability })
}

fn can_inflict(state: &BattleState, target: BattlerIndex, status: StatusType) -> bool {
    state
        .pokemon(target)
        .is_some_and(|pokemon| pokemon.status.is_none() && !pokemon.is_fainted())
        && status_blocked(state, target, status, false).is_none()
}

fn handle(
    ctx: &mut BattleContext,
    holder: BattlerIndex,
    ability: AbilityId,
    attr: &AbilityAttr,
    trigger: &AbilityTrigger,
) -> Vec<BattleCommand> {
    let state = &*ctx.state;
    let Some(pokemon) = state.pokemon(holder) else {
        return Vec::new();
    };
    let actor = Actor::new(holder, pokemon);

    match attr {
        AbilityAttr::PostWeatherChangeType => {
            let forecast = match state.arena.weather() {
                Some(WeatherType::Sun) => PokemonType::Fire,
                Some(WeatherType::Rain) => PokemonType::Water,
                Some(WeatherType::Hail) => PokemonType::Ice,
                Some(WeatherType::Sandstorm) | None => PokemonType::Normal,
            };
            if pokemon.types() == [forecast] {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::SetTypes {
                    target: holder,
                    types: vec![forecast],
                },
                BattleCommand::EmitEvent(BattleEvent::TypeChanged {
                    actor,
                    types: vec![forecast],
                }),
            ]
        }
        AbilityAttr::PreMoveTypeChange => {
            let Some(move_type) = trigger
                .move_id
                .and_then(|id| crate::move_data::get_move_data(id).ok())
                .map(|data| data.move_type)
            else {
                return Vec::new();
            };
            if pokemon.types() == [move_type] || move_type == PokemonType::Typeless {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::SetTypes {
                    target: holder,
                    types: vec![move_type],
                },
                BattleCommand::EmitEvent(BattleEvent::TypeChanged {
                    actor,
                    types: vec![move_type],
                }),
            ]
        }
        AbilityAttr::PostAttackContactStatus { status, chance } => {
            let Some(target) = trigger.other else {
                return Vec::new();
            };
            if !trigger.contact || !can_inflict(state, target, *status) {
                return Vec::new();
            }
            if !ctx.rng.chance(*chance, "contact status ability") {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::InflictStatus {
                    target,
                    status: *status,
                },
            ]
        }
        AbilityAttr::PostVictoryStatStage { stat, delta } => {
            let knocked_out = trigger
                .other
                .and_then(|target| state.pokemon(target))
                .is_some_and(|target| target.is_fainted());
            if !knocked_out {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::UnshiftPhase(Phase::StatStageChange {
                    target: holder,
                    target_id: pokemon.id,
                    stats: vec![*stat],
                    delta: *delta,
                    source: Some(holder),
                    ignore_abilities: false,
                }),
            ]
        }
        AbilityAttr::PostDefendContactDamage { denominator } => {
            let Some(attacker) = trigger.other.filter(|_| trigger.contact) else {
                return Vec::new();
            };
            let Some(attacker_mon) = state.pokemon(attacker).filter(|p| !p.is_fainted()) else {
                return Vec::new();
            };
            vec![
                activated(actor, ability),
                BattleCommand::DealDamage {
                    target: attacker,
                    amount: (attacker_mon.max_hp() / denominator).max(1),
                    source: DamageSource::Ability(ability),
                },
            ]
        }
        AbilityAttr::PostDefendContactStatus { status, chance } => {
            let Some(attacker) = trigger.other.filter(|_| trigger.contact) else {
                return Vec::new();
            };
            if !can_inflict(state, attacker, *status) {
                return Vec::new();
            }
            if !ctx.rng.chance(*chance, "contact status ability") {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::InflictStatus {
                    target: attacker,
                    status: *status,
                },
            ]
        }
        AbilityAttr::PostSummonStatStage { stat, delta } => {
            let mut commands = vec![activated(actor, ability)];
            for opponent in state.opponents_of(holder) {
                if let Some(opponent_mon) = state.pokemon(opponent) {
                    commands.push(BattleCommand::UnshiftPhase(Phase::StatStageChange {
                        target: opponent,
                        target_id: opponent_mon.id,
                        stats: vec![*stat],
                        delta: *delta,
                        source: Some(holder),
                        ignore_abilities: false,
                    }));
                }
            }
            commands
        }
        AbilityAttr::PostSummonWeather(weather) => {
            if state.arena.weather() == Some(*weather) {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::SetWeather {
                    weather: *weather,
                    turns: WEATHER_TURNS,
                },
            ]
        }
        AbilityAttr::PostSummonTerrain(terrain) => {
            if state.arena.terrain() == Some(*terrain) {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::SetTerrain {
                    terrain: *terrain,
                    turns: TERRAIN_TURNS,
                },
            ]
        }
        AbilityAttr::SuppressFieldAbilities => vec![activated(actor, ability)],
        AbilityAttr::PreSwitchOutHeal { denominator } => {
            if pokemon.current_hp() >= pokemon.max_hp() || pokemon.is_fainted() {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::Heal {
                    target: holder,
                    amount: (pokemon.max_hp() / denominator).max(1),
                },
            ]
        }
        AbilityAttr::PreSwitchOutCureStatus => {
            let Some(status) = pokemon.status else {
                return Vec::new();
            };
            vec![
                activated(actor, ability),
                BattleCommand::SetStatus {
                    target: holder,
                    status: None,
                },
                BattleCommand::EmitEvent(BattleEvent::StatusCured {
                    target: actor,
                    status: status.kind(),
                }),
            ]
        }
        AbilityAttr::PostFaintContactDamage { denominator } => {
            let Some(attacker) = trigger.other.filter(|_| trigger.contact) else {
                return Vec::new();
            };
            let Some(attacker_mon) = state.pokemon(attacker).filter(|p| !p.is_fainted()) else {
                return Vec::new();
            };
            vec![
                activated(actor, ability),
                BattleCommand::DealDamage {
                    target: attacker,
                    amount: (attacker_mon.max_hp() / denominator).max(1),
                    source: DamageSource::Ability(ability),
                },
            ]
        }
        AbilityAttr::StatLoweredBoost { stat, delta } => {
            let by_opponent = trigger.other.is_some_and(|other| other.side != holder.side);
            if !by_opponent {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::UnshiftPhase(Phase::StatStageChange {
                    target: holder,
                    target_id: pokemon.id,
                    stats: vec![*stat],
                    delta: *delta,
                    source: Some(holder),
                    ignore_abilities: false,
                }),
            ]
        }
        AbilityAttr::PostTurnStatStage { stat, delta } => {
            if pokemon.turn_data.switched_in {
                return Vec::new();
            }
            vec![
                activated(actor, ability),
                BattleCommand::UnshiftPhase(Phase::StatStageChange {
                    target: holder,
                    target_id: pokemon.id,
                    stats: vec![*stat],
                    delta: *delta,
                    source: Some(holder),
                    ignore_abilities: false,
                }),
            ]
        }
        AbilityAttr::PostDancingMove => {
            let (Some(dancer_source), Some(move_id)) = (trigger.other, trigger.move_id) else {
                return Vec::new();
            };
            match dancer_copy(state, holder, dancer_source, move_id, &trigger.targets) {
                Some(phase) => vec![activated(actor, ability), BattleCommand::UnshiftPhase(phase)],
                None => Vec::new(),
            }
        }
        AbilityAttr::ChangeMovePriority { .. }
        | AbilityAttr::BypassSpeedChance { .. }
        | AbilityAttr::IgnoreTargetAbilities
        | AbilityAttr::BypassSubstitute
        | AbilityAttr::StatusImmunity(_)
        | AbilityAttr::TagImmunity(_)
        | AbilityAttr::MoveTypeImmunity { .. }
        | AbilityAttr::SoundImmunity
        | AbilityAttr::ProtectStats
        | AbilityAttr::WeatherSpeedMultiplier { .. }
        | AbilityAttr::RunAway
        | AbilityAttr::AlwaysHit
        | AbilityAttr::AccuracyMultiplier { .. } => Vec::new(),
    }
}
