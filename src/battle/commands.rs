use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::abilities;
use crate::battle::arena::ArenaTagAddOutcome;
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::state::{BattlerIndex, SideId};
use crate::battle::tags::{BattlerTag, BattlerTagType, TagAddOutcome};
use crate::pokemon::StatusCondition;
use schema::{
    AbilityId, ArenaTagType, HeldItem, MoveId, PokemonType, StatType, StatusType, TerrainType,
    WeatherType,
};

/// Where a chunk of HP loss came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Move(MoveId),
    Confusion,
    Recoil,
    Weather(WeatherType),
    Hazard(ArenaTagType),
    Status(StatusType),
    Tag(BattlerTagType),
    Ability(AbilityId),
    Item(HeldItem),
    SubstituteCost,
}

/// Atomic commands representing final state changes
#[derive(Debug, Clone)]
pub enum BattleCommand {
    // Pokemon modifications
    DealDamage {
        target: BattlerIndex,
        amount: u16,
        source: DamageSource,
    },
    DamageSubstitute {
        target: BattlerIndex,
        amount: u16,
    },
    Heal {
        target: BattlerIndex,
        amount: u16,
    },
    /// Applies a fresh non-volatile status, rolling its counters.
    InflictStatus {
        target: BattlerIndex,
        status: StatusType,
    },
    SetStatus {
        target: BattlerIndex,
        status: Option<StatusCondition>,
    },
    ChangeStatStage {
        target: BattlerIndex,
        stat: StatType,
        delta: i8,
    },
    ResetStatStages {
        target: BattlerIndex,
    },
    AddTag {
        target: BattlerIndex,
        tag: BattlerTag,
    },
    RemoveTag {
        target: BattlerIndex,
        kind: BattlerTagType,
    },
    SetItem {
        target: BattlerIndex,
        item: Option<HeldItem>,
    },
    SetTypes {
        target: BattlerIndex,
        types: Vec<PokemonType>,
    },

    // Field
    SetWeather {
        weather: WeatherType,
        turns: u8,
    },
    SetTerrain {
        terrain: TerrainType,
        turns: u8,
    },
    AddArenaTag {
        tag: ArenaTagType,
        side: Option<SideId>,
        turns: u8,
        source_id: Option<u32>,
    },
    RemoveArenaTag {
        tag: ArenaTagType,
        side: Option<SideId>,
    },

    // Battle flow
    EmitEvent(BattleEvent),
    /// Runs before anything already queued.
    UnshiftPhase(Phase),
}

/// Error types for command execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("no Pokemon in {:?} slot {}", .0.side, .0.slot)]
    NoPokemon(BattlerIndex),
    #[error("{0}")]
    StateValidationError(String),
}

/// Execute a batch of commands in order, stopping at the first failure.
pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    ctx: &mut BattleContext,
) -> Result<(), ExecutionError> {
    for command in commands {
        execute_command(command, ctx)?;
    }
    Ok(())
}

/// Like `execute_command_batch`, but logs a failure instead of returning it.
pub fn execute_or_log(commands: Vec<BattleCommand>, ctx: &mut BattleContext) {
    if let Err(err) = execute_command_batch(commands, ctx) {
        error!("Command execution failed: {}", err);
    }
}

fn actor(ctx: &BattleContext, target: BattlerIndex) -> Result<Actor, ExecutionError> {
    ctx.state
        .pokemon(target)
        .map(|pokemon| Actor::new(target, pokemon))
        .ok_or(ExecutionError::NoPokemon(target))
}

fn execute_deal_damage_command(
    target: BattlerIndex,
    amount: u16,
    source: DamageSource,
    ctx: &mut BattleContext,
) -> Result<(), ExecutionError> {
    let actor = actor(ctx, target)?;
    let pokemon = ctx
        .state
        .pokemon_mut(target)
        .ok_or(ExecutionError::NoPokemon(target))?;
    if pokemon.is_fainted() || amount == 0 {
        return Ok(());
    }

    let mut amount = amount;
    let mut endured = false;
    if matches!(source, DamageSource::Move(_))
        && pokemon.tags.has(BattlerTagType::Endure)
        && amount >= pokemon.current_hp()
    {
        amount = pokemon.current_hp() - 1;
        endured = true;
    }

    let dealt = pokemon.take_damage(amount);
    let remaining_hp = pokemon.current_hp();
    let max_hp = pokemon.max_hp();
    let pokemon_id = pokemon.id;
    let sitrus = pokemon.item == Some(HeldItem::SitrusBerry);

    ctx.bus.push(BattleEvent::DamageDealt {
        target: actor,
        amount: dealt,
        remaining_hp,
        source,
    });
    if endured {
        ctx.bus.push(BattleEvent::Endured { target: actor });
    }

    if remaining_hp == 0 {
        ctx.queue.unshift(Phase::Faint {
            battler: target,
            pokemon_id,
        });
    } else if sitrus && remaining_hp <= max_hp / 2 {
        if let Some(pokemon) = ctx.state.pokemon_mut(target) {
            pokemon.item = None;
            let healed = pokemon.heal(max_hp / 4);
            let remaining_hp = pokemon.current_hp();
            ctx.bus.push(BattleEvent::ItemActivated {
                actor,
                item: HeldItem::SitrusBerry,
            });
            ctx.bus.push(BattleEvent::Healed {
                target: actor,
                amount: healed,
                remaining_hp,
            });
        }
    }
    Ok(())
}

fn execute_command(command: BattleCommand, ctx: &mut BattleContext) -> Result<(), ExecutionError> {
    match command {
        BattleCommand::EmitEvent(event) => {
            ctx.bus.push(event);
            Ok(())
        }
        BattleCommand::DealDamage {
            target,
            amount,
            source,
        } => execute_deal_damage_command(target, amount, source, ctx),
        BattleCommand::DamageSubstitute { target, amount } => {
            let actor = actor(ctx, target)?;
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            let hit = pokemon.tags.damage_substitute(amount).ok_or_else(|| {
                ExecutionError::StateValidationError("substitute damage without a substitute".into())
            })?;
            if hit.broke {
                pokemon.tags.remove(BattlerTagType::Substitute);
            }
            ctx.bus.push(BattleEvent::SubstituteTookDamage {
                target: actor,
                amount: hit.absorbed,
            });
            if hit.broke {
                ctx.bus.push(BattleEvent::SubstituteFaded { target: actor });
            }
            Ok(())
        }
        BattleCommand::Heal { target, amount } => {
            let actor = actor(ctx, target)?;
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            let healed = pokemon.heal(amount);
            if healed > 0 {
                let remaining_hp = pokemon.current_hp();
                ctx.bus.push(BattleEvent::Healed {
                    target: actor,
                    amount: healed,
                    remaining_hp,
                });
            }
            Ok(())
        }
        BattleCommand::InflictStatus { target, status } => {
            let actor = actor(ctx, target)?;
            let pokemon = ctx
                .state
                .pokemon(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            if pokemon.status.is_some() || pokemon.is_fainted() {
                debug!("{} already has a status; {} not applied", pokemon.name(), status);
                return Ok(());
            }
            let condition = match status {
                StatusType::Sleep => StatusCondition::Sleep {
                    turns_remaining: ctx.rng.next_range(1, 3, "sleep duration") as u8,
                },
                StatusType::Poison => StatusCondition::Poison,
                StatusType::Toxic => StatusCondition::Toxic { counter: 1 },
                StatusType::Burn => StatusCondition::Burn,
                StatusType::Freeze => StatusCondition::Freeze,
                StatusType::Paralysis => StatusCondition::Paralysis,
            };
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.status = Some(condition);
            ctx.bus.push(BattleEvent::StatusApplied {
                target: actor,
                status,
            });
            Ok(())
        }
        BattleCommand::SetStatus { target, status } => {
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.status = status;
            Ok(())
        }
        BattleCommand::ChangeStatStage {
            target,
            stat,
            delta,
        } => {
            let actor = actor(ctx, target)?;
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            let actual = pokemon.stat_stages.change(stat, delta);
            if actual == 0 {
                ctx.bus.push(BattleEvent::StatStageUnchanged {
                    target: actor,
                    stat,
                    rising: delta > 0,
                });
            } else {
                ctx.bus.push(BattleEvent::StatStageChanged {
                    target: actor,
                    stat,
                    delta: actual,
                });
            }
            Ok(())
        }
        BattleCommand::ResetStatStages { target } => {
            let actor = actor(ctx, target)?;
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.stat_stages.reset();
            ctx.bus.push(BattleEvent::StagesReset { target: actor });
            Ok(())
        }
        BattleCommand::AddTag { target, tag } => {
            let actor = actor(ctx, target)?;
            let kind = tag.kind();
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            match pokemon.tags.add(tag) {
                TagAddOutcome::Added => ctx.bus.push(BattleEvent::TagAdded { target: actor, tag: kind }),
                TagAddOutcome::Refreshed => {}
                TagAddOutcome::Rejected => debug!("{:?} rejected on {}", kind, pokemon.name()),
            }
            Ok(())
        }
        BattleCommand::RemoveTag { target, kind } => {
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.tags.remove(kind);
            Ok(())
        }
        BattleCommand::SetItem { target, item } => {
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.item = item;
            Ok(())
        }
        BattleCommand::SetTypes { target, types } => {
            let pokemon = ctx
                .state
                .pokemon_mut(target)
                .ok_or(ExecutionError::NoPokemon(target))?;
            pokemon.summon_data.types_override = Some(types);
            Ok(())
        }
        BattleCommand::SetWeather { weather, turns } => {
            if ctx.state.arena.set_weather(weather, turns) {
                ctx.bus.push(BattleEvent::WeatherStarted { weather });
                abilities::weather_changed(ctx);
            }
            Ok(())
        }
        BattleCommand::SetTerrain { terrain, turns } => {
            if ctx.state.arena.set_terrain(terrain, turns) {
                ctx.bus.push(BattleEvent::TerrainStarted { terrain });
            }
            Ok(())
        }
        BattleCommand::AddArenaTag {
            tag,
            side,
            turns,
            source_id,
        } => {
            match ctx.state.arena.add_tag(tag, side, turns, source_id) {
                ArenaTagAddOutcome::Added => ctx.bus.push(BattleEvent::ArenaTagAdded {
                    tag,
                    side,
                    layers: 1,
                }),
                ArenaTagAddOutcome::Stacked { layers } => {
                    ctx.bus.push(BattleEvent::ArenaTagAdded { tag, side, layers })
                }
                ArenaTagAddOutcome::Removed => {
                    ctx.bus.push(BattleEvent::ArenaTagRemoved { tag, side })
                }
                ArenaTagAddOutcome::Rejected => debug!("{:?} rejected on {:?}", tag, side),
            }
            Ok(())
        }
        BattleCommand::RemoveArenaTag { tag, side } => {
            if ctx.state.arena.remove_tag(tag, side).is_some() {
                ctx.bus.push(BattleEvent::ArenaTagRemoved { tag, side });
            }
            Ok(())
        }
        BattleCommand::UnshiftPhase(phase) => {
            ctx.queue.unshift(phase);
            Ok(())
        }
    }
}
