use log::debug;

use crate::ability_data::AbilityAttr;
use crate::battle::abilities::{
    self, defending_ability, has_ability_attr, ignores_target_abilities, AbilityEvent, AbilityTrigger,
};
use crate::battle::arena::{arena_tag_policy, arena_tag_turns, is_field_wide, TERRAIN_TURNS, WEATHER_TURNS};
use crate::battle::calculators::{
    ability_type_immunity, calculate_damage, confusion_damage, move_hits, type_effectiveness,
};
use crate::battle::commands::{execute_command_batch, BattleCommand, DamageSource, ExecutionError};
use crate::battle::events::{Actor, BattleEvent, BlockReason, HitResult, PreventReason};
use crate::battle::move_calling::dispatch_called_move;
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::rng::sample;
use crate::battle::scheduler::effective_priority;
use crate::battle::state::{BattleOutcome, BattleState, BattlerIndex, SideId, SwitchKind};
use crate::battle::tags::{BattlerTag, BattlerTagType, MergePolicy, SemiInvulnerableState, TagData};
use crate::move_data::{get_move_data, EffectTarget, FixedDamage, MoveAttr, MoveData};
use crate::pokemon::{LastMoveTargeting, MoveHistoryEntry, MoveResult, StatusCondition, UseMode};
use schema::{
    ArenaTagType, HeldItem, MoveCategory, MoveFlag, MoveId, MoveTarget, PokemonType, StatType,
    StatusType, TerrainType,
};

/// One request to use a move, before targets are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePhase {
    pub user: BattlerIndex,
    pub user_id: u32,
    pub move_id: MoveId,
    /// Chosen targets. Empty means the move's own pattern decides.
    pub targets: Vec<BattlerIndex>,
    pub use_mode: UseMode,
    /// Slot to debit PP from, if the user knows the move.
    pub move_slot: Option<usize>,
    /// How many calling moves deep this use is.
    pub call_depth: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    pub battler: BattlerIndex,
    pub pokemon_id: u32,
    pub result: Option<HitResult>,
    pub damage: u32,
    /// Whether the latest hit landed on a Substitute.
    pub hit_substitute: bool,
}

/// State of a move use carried through its effect, secondary and end phases.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveUseContext {
    pub user: BattlerIndex,
    pub user_id: u32,
    pub move_id: MoveId,
    pub use_mode: UseMode,
    pub call_depth: u8,
    /// Breakable defensive abilities are ignored for this use only.
    pub ignore_abilities: bool,
    pub targets: Vec<TargetOutcome>,
    pub hits_total: u8,
    pub hit_index: u8,
    pub hits_landed: u8,
    /// Result for side and field moves, which have no battler targets.
    pub field_result: Option<HitResult>,
    /// Switches and other phases that run once the move has finished.
    pub follow_ups: Vec<Phase>,
}

impl MoveUseContext {
    fn any_hit(&self) -> bool {
        self.targets
            .iter()
            .any(|target| target.result.is_some_and(|result| result.is_hit()))
    }

    fn target_battlers(&self) -> Vec<BattlerIndex> {
        self.targets.iter().map(|target| target.battler).collect()
    }
}

fn data_error(err: impl std::fmt::Display) -> ExecutionError {
    ExecutionError::StateValidationError(err.to_string())
}

fn actor_for(state: &BattleState, battler: BattlerIndex) -> Result<Actor, ExecutionError> {
    state
        .pokemon(battler)
        .map(|pokemon| Actor::new(battler, pokemon))
        .ok_or(ExecutionError::NoPokemon(battler))
}

fn record_history(
    state: &mut BattleState,
    user_id: u32,
    move_id: MoveId,
    targets: Vec<BattlerIndex>,
    result: MoveResult,
    use_mode: UseMode,
) {
    let turn = state.turn;
    if let Some(pokemon) = state.pokemon_by_id_mut(user_id) {
        pokemon.history.push(MoveHistoryEntry {
            move_id,
            targets,
            result,
            use_mode,
            turn,
        });
    }
}

// --- Immunity queries ---

/// Not Flying, no active Levitate and not up in the air.
pub fn is_grounded(state: &BattleState, battler: BattlerIndex, ignore_abilities: bool) -> bool {
    let Some(pokemon) = state.pokemon(battler) else {
        return false;
    };
    if pokemon.has_type(PokemonType::Flying) {
        return false;
    }
    if pokemon.tags.semi_invulnerable_state() == Some(SemiInvulnerableState::InAir) {
        return false;
    }
    let levitating = defending_ability(state, battler, ignore_abilities).is_some_and(|data| {
        data.attrs.iter().any(|attr| {
            matches!(
                attr,
                AbilityAttr::MoveTypeImmunity {
                    move_type: PokemonType::Ground,
                    ..
                }
            )
        })
    });
    !levitating
}

/// Why `status` cannot be inflicted on `target`, if it cannot.
pub fn status_blocked(
    state: &BattleState,
    target: BattlerIndex,
    status: StatusType,
    ignore_abilities: bool,
) -> Option<BlockReason> {
    let pokemon = state.pokemon(target)?;
    let immune_types: &[PokemonType] = match status {
        StatusType::Poison | StatusType::Toxic => &[PokemonType::Poison, PokemonType::Steel],
        StatusType::Paralysis => &[PokemonType::Electric],
        StatusType::Burn => &[PokemonType::Fire],
        StatusType::Freeze => &[PokemonType::Ice],
        StatusType::Sleep => &[],
    };
    if let Some(immune) = immune_types.iter().find(|t| pokemon.has_type(**t)) {
        return Some(BlockReason::Type(*immune));
    }

    match state.arena.terrain() {
        Some(TerrainType::Electric) if status == StatusType::Sleep && is_grounded(state, target, ignore_abilities) => {
            return Some(BlockReason::Terrain(TerrainType::Electric));
        }
        Some(TerrainType::Misty) if is_grounded(state, target, ignore_abilities) => {
            return Some(BlockReason::Terrain(TerrainType::Misty));
        }
        _ => {}
    }

    let ability = defending_ability(state, target, ignore_abilities)?;
    ability.attrs.iter().find_map(|attr| match attr {
        AbilityAttr::StatusImmunity(statuses) if statuses.contains(&status) => {
            Some(BlockReason::Ability(ability.id))
        }
        _ => None,
    })
}

/// Why a volatile tag cannot be added to `target`, if it cannot.
pub fn tag_blocked(
    state: &BattleState,
    target: BattlerIndex,
    kind: BattlerTagType,
    ignore_abilities: bool,
) -> Option<BlockReason> {
    let pokemon = state.pokemon(target)?;
    match kind {
        BattlerTagType::Seeded if pokemon.has_type(PokemonType::Grass) => {
            return Some(BlockReason::Type(PokemonType::Grass));
        }
        BattlerTagType::Confused
            if state.arena.terrain() == Some(TerrainType::Misty)
                && is_grounded(state, target, ignore_abilities) =>
        {
            return Some(BlockReason::Terrain(TerrainType::Misty));
        }
        BattlerTagType::Drowsy => {
            if pokemon.status.is_some() {
                return Some(BlockReason::AlreadyAffected);
            }
            if let Some(reason) = status_blocked(state, target, StatusType::Sleep, ignore_abilities) {
                return Some(reason);
            }
        }
        _ => {}
    }

    let ability = defending_ability(state, target, ignore_abilities)?;
    ability.attrs.iter().find_map(|attr| match attr {
        AbilityAttr::TagImmunity(immune) if *immune == kind => Some(BlockReason::Ability(ability.id)),
        _ => None,
    })
}

/// Applies stage changes to `target`, honouring Clear Body-class protection
/// against opponents. Returns true if any stage moved.
pub fn apply_stat_stage_change(
    ctx: &mut BattleContext,
    target: BattlerIndex,
    stats: &[StatType],
    delta: i8,
    source: Option<BattlerIndex>,
    ignore_abilities: bool,
) -> bool {
    let Ok(actor) = actor_for(ctx.state, target) else {
        return false;
    };
    let by_opponent = source.is_some_and(|source| source.side != target.side);
    if delta < 0 && by_opponent {
        if let Some(ability) = defending_ability(ctx.state, target, ignore_abilities) {
            if ability.attrs.contains(&AbilityAttr::ProtectStats) {
                ctx.bus.push(BattleEvent::EffectBlocked {
                    target: actor,
                    reason: BlockReason::Ability(ability.id),
                });
                return false;
            }
        }
    }

    let mut changed = false;
    let mut lowered = false;
    for stat in stats {
        let before = ctx.state.pokemon(target).map(|p| p.stat_stages.get(*stat)).unwrap_or(0);
        let command = BattleCommand::ChangeStatStage {
            target,
            stat: *stat,
            delta,
        };
        if execute_command_batch(vec![command], ctx).is_err() {
            return changed;
        }
        let after = ctx.state.pokemon(target).map(|p| p.stat_stages.get(*stat)).unwrap_or(0);
        changed |= after != before;
        lowered |= after < before;
    }

    if lowered && by_opponent {
        if let Some(source) = source {
            abilities::dispatch(
                ctx,
                AbilityTrigger::new(AbilityEvent::OnStatStageChange).with_other(source),
                &[target],
            );
        }
    }
    changed
}

// --- Move phase ---

/// Checks that can stop a Pokemon from acting at all. Mutates sleep and
/// freeze counters and deals confusion damage as it goes.
fn pre_move_interrupt(
    ctx: &mut BattleContext,
    user: BattlerIndex,
    move_data: &MoveData,
) -> Result<Option<PreventReason>, ExecutionError> {
    let actor = actor_for(ctx.state, user)?;
    let status = ctx.state.pokemon(user).and_then(|p| p.status);

    match status {
        Some(StatusCondition::Sleep { turns_remaining: 0 }) => {
            if let Some(pokemon) = ctx.state.pokemon_mut(user) {
                pokemon.status = None;
            }
            ctx.bus.push(BattleEvent::WokeUp { target: actor });
        }
        Some(StatusCondition::Sleep { turns_remaining }) => {
            if let Some(pokemon) = ctx.state.pokemon_mut(user) {
                pokemon.status = Some(StatusCondition::Sleep {
                    turns_remaining: turns_remaining - 1,
                });
            }
            if !move_data.has_flag(MoveFlag::BypassSleep) {
                return Ok(Some(PreventReason::Asleep));
            }
        }
        Some(StatusCondition::Freeze) => {
            if ctx.rng.chance(20, "thaw") {
                if let Some(pokemon) = ctx.state.pokemon_mut(user) {
                    pokemon.status = None;
                }
                ctx.bus.push(BattleEvent::StatusCured {
                    target: actor,
                    status: StatusType::Freeze,
                });
            } else {
                return Ok(Some(PreventReason::Frozen));
            }
        }
        Some(StatusCondition::Poison)
        | Some(StatusCondition::Toxic { .. })
        | Some(StatusCondition::Burn)
        | Some(StatusCondition::Paralysis)
        | None => {}
    }

    let pokemon = ctx.state.pokemon_mut(user).ok_or(ExecutionError::NoPokemon(user))?;
    if pokemon.tags.remove(BattlerTagType::Recharging).is_some() {
        return Ok(Some(PreventReason::Recharging));
    }
    if pokemon.tags.remove(BattlerTagType::Flinched).is_some() {
        return Ok(Some(PreventReason::Flinched));
    }
    if pokemon.tags.disabled_move() == Some(move_data.id) {
        return Ok(Some(PreventReason::Disabled(move_data.id)));
    }

    if pokemon.tags.has(BattlerTagType::Confused) && ctx.rng.next_int(3, "confusion self-hit") == 0 {
        let damage = match ctx.state.pokemon(user) {
            Some(pokemon) => confusion_damage(pokemon, ctx.rng),
            None => 0,
        };
        execute_command_batch(
            vec![BattleCommand::DealDamage {
                target: user,
                amount: damage,
                source: DamageSource::Confusion,
            }],
            ctx,
        )?;
        return Ok(Some(PreventReason::Confused));
    }

    let paralyzed = matches!(
        ctx.state.pokemon(user).and_then(|p| p.status),
        Some(StatusCondition::Paralysis)
    );
    if paralyzed && ctx.rng.chance(25, "full paralysis") {
        return Ok(Some(PreventReason::Paralyzed));
    }
    Ok(None)
}

fn is_present(state: &BattleState, battler: BattlerIndex) -> bool {
    state.pokemon(battler).is_some_and(|pokemon| !pokemon.is_fainted())
}

/// Expands the move's target pattern against the current field.
fn resolve_targets(
    ctx: &mut BattleContext,
    user: BattlerIndex,
    move_data: &MoveData,
    chosen: &[BattlerIndex],
) -> Vec<BattlerIndex> {
    let state = &*ctx.state;
    match move_data.target {
        MoveTarget::User => vec![user],
        MoveTarget::UserSide | MoveTarget::EnemySide | MoveTarget::BothSides => Vec::new(),
        MoveTarget::AllNearEnemies => state.opponents_of(user),
        MoveTarget::AllNearOthers => {
            let mut targets = state.allies_of(user);
            targets.extend(state.opponents_of(user));
            targets.sort();
            targets
        }
        MoveTarget::NearOther | MoveTarget::NearEnemy | MoveTarget::NearAlly | MoveTarget::RandomNearEnemy => {
            let present: Vec<BattlerIndex> = chosen
                .iter()
                .copied()
                .filter(|target| is_present(state, *target))
                .collect();
            if !present.is_empty() {
                return present;
            }
            if !chosen.is_empty() && move_data.is_status() {
                // The chosen target left the field; status moves do not redirect.
                return Vec::new();
            }
            let pool = if move_data.target == MoveTarget::NearAlly {
                state.allies_of(user)
            } else {
                state.opponents_of(user)
            };
            sample(ctx.rng, &pool, "random target")
                .copied()
                .into_iter()
                .collect()
        }
    }
}

fn hit_count(move_data: &MoveData, ctx: &mut BattleContext) -> u8 {
    match move_data.multi_hit() {
        None => 1,
        Some((2, 5)) => match ctx.rng.next_int(100, "multi-hit count") {
            roll if roll < 35 => 2,
            roll if roll < 70 => 3,
            roll if roll < 85 => 4,
            _ => 5,
        },
        Some((min, max)) if min == max => min,
        Some((min, max)) => ctx.rng.next_range(min as u32, max as u32, "multi-hit count") as u8,
    }
}

fn fail_move(
    ctx: &mut BattleContext,
    mv: &MovePhase,
    actor: Actor,
    targets: Vec<BattlerIndex>,
    event: Option<BattleEvent>,
) {
    ctx.bus.push(event.unwrap_or(BattleEvent::MoveFailed {
        actor,
        move_id: mv.move_id,
    }));
    record_history(ctx.state, mv.user_id, mv.move_id, targets, MoveResult::Fail, mv.use_mode);
}

/// Runs everything up to the first hit: interrupts, PP, targeting and the
/// checks that fail a move before it connects.
pub fn run_move_phase(ctx: &mut BattleContext, mv: MovePhase) -> Result<(), ExecutionError> {
    if !ctx.state.is_active(mv.user, mv.user_id) {
        debug!("{:?} is no longer on the field; {} skipped", mv.user, mv.move_id);
        return Ok(());
    }
    let move_data = get_move_data(mv.move_id).map_err(data_error)?;
    let actor = actor_for(ctx.state, mv.user)?;

    if matches!(mv.use_mode, UseMode::Normal | UseMode::IgnorePp) {
        let mut prevented = pre_move_interrupt(ctx, mv.user, move_data)?;
        if prevented.is_none() && mv.use_mode == UseMode::Normal {
            if let Some(slot) = mv.move_slot {
                let has_pp = ctx
                    .state
                    .pokemon(mv.user)
                    .and_then(|p| p.moves.get(slot))
                    .is_some_and(|slot| slot.pp > 0);
                if !has_pp {
                    prevented = Some(PreventReason::NoPp(mv.move_id));
                }
            }
        }
        if let Some(reason) = prevented {
            ctx.bus.push(BattleEvent::ActionPrevented { actor, reason });
            if let Some(pokemon) = ctx.state.pokemon_mut(mv.user) {
                pokemon.tags.remove(BattlerTagType::Frenzy);
                pokemon.tags.remove(BattlerTagType::Charging);
                pokemon.tags.remove(BattlerTagType::SemiInvulnerable);
                pokemon.turn_data.moved = true;
            }
            record_history(ctx.state, mv.user_id, mv.move_id, Vec::new(), MoveResult::Fail, mv.use_mode);
            return Ok(());
        }
        if !ctx.state.is_active(mv.user, mv.user_id) {
            return Ok(());
        }
    }

    if let Some(pokemon) = ctx.state.pokemon_mut(mv.user) {
        match mv.use_mode {
            UseMode::Normal | UseMode::FollowUp => {
                if let Some(slot) = mv.move_slot.and_then(|slot| pokemon.moves.get_mut(slot)) {
                    if !slot.use_pp() {
                        debug!("{:?} used {} with no PP left", mv.user, mv.move_id);
                    }
                }
            }
            UseMode::IgnorePp | UseMode::Indirect => {}
        }
        pokemon.turn_data.moved = true;
    }

    ctx.bus.push(BattleEvent::MoveUsed {
        actor,
        move_id: mv.move_id,
        use_mode: mv.use_mode,
    });
    if !matches!(mv.move_id, MoveId::Copycat | MoveId::MirrorMove) {
        ctx.state.last_move = Some(mv.move_id);
    }

    if let Some(calling) = move_data.calling_move() {
        let called = dispatch_called_move(ctx, &mv, calling);
        let result = if called { MoveResult::Success } else { MoveResult::Fail };
        record_history(ctx.state, mv.user_id, mv.move_id, Vec::new(), result, mv.use_mode);
        return Ok(());
    }

    let targets = resolve_targets(ctx, mv.user, move_data, &mv.targets);
    if targets.is_empty() && !move_data.target.is_field_target() {
        fail_move(ctx, &mv, actor, Vec::new(), Some(BattleEvent::NoTarget { actor }));
        return Ok(());
    }

    for target in &targets {
        if target.side == mv.user.side {
            continue;
        }
        if let Some(pokemon) = ctx.state.pokemon_mut(*target) {
            pokemon.summon_data.last_move_targeting = Some(LastMoveTargeting {
                move_id: mv.move_id,
                attacker: mv.user,
                attacker_id: mv.user_id,
            });
        }
    }

    let turns_on_field = ctx
        .state
        .pokemon(mv.user)
        .map(|p| p.summon_data.turns_on_field)
        .unwrap_or(0);
    if move_data.has_attr(|attr| matches!(attr, MoveAttr::FirstTurnOnly)) && turns_on_field > 0 {
        fail_move(ctx, &mv, actor, targets, None);
        return Ok(());
    }

    if ctx.state.arena.terrain() == Some(TerrainType::Psychic)
        && effective_priority(ctx.state, mv.user, move_data) > 0
        && targets.len() == 1
        && targets[0].side != mv.user.side
        && is_grounded(ctx.state, targets[0], false)
    {
        let target = actor_for(ctx.state, targets[0])?;
        let blocked = BattleEvent::EffectBlocked {
            target,
            reason: BlockReason::Terrain(TerrainType::Psychic),
        };
        fail_move(ctx, &mv, actor, targets, Some(blocked));
        return Ok(());
    }

    if let Some(semi_invulnerable) = move_data.two_turn() {
        let charged = ctx.state.pokemon(mv.user).is_some_and(|p| {
            matches!(
                p.tags.get(BattlerTagType::Charging).map(|tag| &tag.data),
                Some(TagData::Charging { move_id, .. }) if *move_id == mv.move_id
            )
        });
        if !charged {
            let mut commands = vec![BattleCommand::AddTag {
                target: mv.user,
                tag: BattlerTag::new(
                    TagData::Charging {
                        move_id: mv.move_id,
                        targets: targets.clone(),
                    },
                    0,
                    mv.move_id,
                    Some(mv.user_id),
                ),
            }];
            if let Some(state) = semi_invulnerable {
                commands.push(BattleCommand::AddTag {
                    target: mv.user,
                    tag: BattlerTag::new(TagData::SemiInvulnerable(state), 0, mv.move_id, Some(mv.user_id)),
                });
            }
            commands.push(BattleCommand::EmitEvent(BattleEvent::ChargingTurn {
                actor,
                move_id: mv.move_id,
            }));
            return execute_command_batch(commands, ctx);
        }
        if let Some(pokemon) = ctx.state.pokemon_mut(mv.user) {
            pokemon.tags.remove(BattlerTagType::Charging);
            pokemon.tags.remove(BattlerTagType::SemiInvulnerable);
        }
    }

    if move_data.has_attr(|attr| matches!(attr, MoveAttr::Rampage)) {
        let rampaging = ctx.state.pokemon(mv.user).is_some_and(|p| p.tags.has(BattlerTagType::Frenzy));
        if !rampaging {
            let turns = BattlerTagType::Frenzy.roll_duration(ctx.rng);
            execute_command_batch(
                vec![BattleCommand::AddTag {
                    target: mv.user,
                    tag: BattlerTag::new(
                        TagData::Frenzy { move_id: mv.move_id },
                        turns,
                        mv.move_id,
                        Some(mv.user_id),
                    ),
                }],
                ctx,
            )?;
        }
    }

    abilities::dispatch(
        ctx,
        AbilityTrigger::new(AbilityEvent::PreMove).with_move(mv.move_id, false),
        &[mv.user],
    );

    let hits_total = if move_data.is_attack() { hit_count(move_data, ctx) } else { 1 };
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in &targets {
        if let Some(pokemon) = ctx.state.pokemon(*target) {
            outcomes.push(TargetOutcome {
                battler: *target,
                pokemon_id: pokemon.id,
                result: None,
                damage: 0,
                hit_substitute: false,
            });
        }
    }

    let use_ctx = MoveUseContext {
        user: mv.user,
        user_id: mv.user_id,
        move_id: mv.move_id,
        use_mode: mv.use_mode,
        call_depth: mv.call_depth,
        ignore_abilities: ignores_target_abilities(ctx.state, mv.user),
        targets: outcomes,
        hits_total,
        hit_index: 0,
        hits_landed: 0,
        field_result: None,
        follow_ups: Vec::new(),
    };
    ctx.queue.unshift(Phase::MoveEffect(Box::new(use_ctx)));
    Ok(())
}

// --- Move effect (one hit) ---

fn field_tag_side(tag: ArenaTagType, user: BattlerIndex, target: MoveTarget) -> Option<SideId> {
    if is_field_wide(tag) {
        return None;
    }
    match target {
        MoveTarget::EnemySide => Some(user.side.opponent()),
        _ => Some(user.side),
    }
}

/// Weather, terrain and side conditions. Fails if the field already has it.
fn apply_field_move(
    ctx: &mut BattleContext,
    use_ctx: &mut MoveUseContext,
    move_data: &MoveData,
) -> Result<(), ExecutionError> {
    let mut commands = Vec::new();
    for attr in &move_data.attrs {
        match attr {
            MoveAttr::SetWeather(weather) if ctx.state.arena.weather() != Some(*weather) => {
                commands.push(BattleCommand::SetWeather {
                    weather: *weather,
                    turns: WEATHER_TURNS,
                });
            }
            MoveAttr::SetTerrain(terrain) if ctx.state.arena.terrain() != Some(*terrain) => {
                commands.push(BattleCommand::SetTerrain {
                    terrain: *terrain,
                    turns: TERRAIN_TURNS,
                });
            }
            MoveAttr::AddArenaTag(tag) => {
                let side = field_tag_side(*tag, use_ctx.user, move_data.target);
                let existing = ctx.state.arena.get_tag(*tag, side);
                let rejected = match (arena_tag_policy(*tag), existing) {
                    (_, None) => false,
                    (MergePolicy::Reject, Some(_)) => true,
                    (MergePolicy::Stack { max_layers }, Some(existing)) => existing.layers >= max_layers,
                    (MergePolicy::Refresh | MergePolicy::Toggle, Some(_)) => false,
                };
                if !rejected {
                    commands.push(BattleCommand::AddArenaTag {
                        tag: *tag,
                        side,
                        turns: arena_tag_turns(*tag),
                        source_id: Some(use_ctx.user_id),
                    });
                }
            }
            _ => {}
        }
    }

    if commands.is_empty() {
        let actor = actor_for(ctx.state, use_ctx.user)?;
        ctx.bus.push(BattleEvent::MoveFailed {
            actor,
            move_id: use_ctx.move_id,
        });
        use_ctx.field_result = Some(HitResult::Fail);
        return Ok(());
    }
    use_ctx.field_result = Some(HitResult::Effective);
    execute_command_batch(commands, ctx)
}

/// Checks made once per target on the first hit. `None` means it connects.
fn first_hit_block(
    ctx: &mut BattleContext,
    use_ctx: &MoveUseContext,
    target: BattlerIndex,
    move_data: &MoveData,
) -> Result<Option<HitResult>, ExecutionError> {
    let user = use_ctx.user;
    if target == user {
        return Ok(None);
    }
    let target_actor = actor_for(ctx.state, target)?;
    let user_actor = actor_for(ctx.state, user)?;

    let protected = ctx
        .state
        .pokemon(target)
        .is_some_and(|p| p.tags.has(BattlerTagType::Protected));
    if protected && !move_data.has_flag(MoveFlag::IgnoreProtect) {
        ctx.bus.push(BattleEvent::Protected { target: target_actor });
        return Ok(Some(HitResult::Blocked(BlockReason::Protect)));
    }

    if !move_hits(ctx.state, user, target, move_data, ctx.rng) {
        ctx.bus.push(BattleEvent::MoveMissed {
            actor: user_actor,
            target: target_actor,
        });
        return Ok(Some(HitResult::Miss));
    }

    let soundproof = move_data.has_flag(MoveFlag::Sound)
        && defending_ability(ctx.state, target, use_ctx.ignore_abilities)
            .is_some_and(|data| data.attrs.contains(&AbilityAttr::SoundImmunity));
    if soundproof {
        ctx.bus.push(BattleEvent::EffectBlocked {
            target: target_actor,
            reason: BlockReason::Soundproof,
        });
        return Ok(Some(HitResult::Blocked(BlockReason::Soundproof)));
    }

    if let Some((ability, heal)) =
        ability_type_immunity(ctx.state, target, move_data.move_type, use_ctx.ignore_abilities)
    {
        let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::EffectBlocked {
            target: target_actor,
            reason: BlockReason::Ability(ability),
        })];
        if let (Some(denominator), Some(pokemon)) = (heal, ctx.state.pokemon(target)) {
            commands.push(BattleCommand::Heal {
                target,
                amount: (pokemon.max_hp() / denominator).max(1),
            });
        }
        execute_command_batch(commands, ctx)?;
        return Ok(Some(HitResult::Blocked(BlockReason::Ability(ability))));
    }

    if move_data.is_attack() {
        let immune = ctx
            .state
            .pokemon(target)
            .is_some_and(|p| type_effectiveness(move_data.move_type, p) == 0.0);
        if immune {
            ctx.bus.push(BattleEvent::Effectiveness {
                target: target_actor,
                result: HitResult::Immune,
            });
            return Ok(Some(HitResult::Immune));
        }
    }
    Ok(None)
}

fn substitute_applies(state: &BattleState, use_ctx: &MoveUseContext, target: BattlerIndex, move_data: &MoveData) -> bool {
    if target == use_ctx.user
        || move_data.has_flag(MoveFlag::Sound)
        || move_data.has_flag(MoveFlag::IgnoreSubstitute)
    {
        return false;
    }
    let has_substitute = state.pokemon(target).is_some_and(|p| p.tags.substitute_hp().is_some());
    has_substitute && !has_ability_attr(state, use_ctx.user, |attr| matches!(attr, AbilityAttr::BypassSubstitute))
}

/// Damage for one hit before it is routed to the Pokemon or its Substitute.
fn hit_damage(
    ctx: &mut BattleContext,
    use_ctx: &MoveUseContext,
    target: BattlerIndex,
    move_data: &MoveData,
) -> Result<Option<(u16, bool, HitResult)>, ExecutionError> {
    let user = ctx.state.pokemon(use_ctx.user).ok_or(ExecutionError::NoPokemon(use_ctx.user))?;
    for attr in &move_data.attrs {
        match attr {
            MoveAttr::Counter => {
                return Ok(match user.turn_data.physical_damage_taken {
                    Some((amount, _)) if amount > 0 => {
                        Some((amount.saturating_mul(2), false, HitResult::Effective))
                    }
                    _ => None,
                });
            }
            MoveAttr::FixedDamage(FixedDamage::UserLevel) => {
                return Ok(Some((user.level as u16, false, HitResult::Effective)));
            }
            MoveAttr::FixedDamage(FixedDamage::Amount(amount)) => {
                return Ok(Some((*amount, false, HitResult::Effective)));
            }
            _ => {}
        }
    }
    let spread = use_ctx.targets.len() > 1;
    let roll = calculate_damage(ctx.state, use_ctx.user, target, move_data, spread, ctx.rng);
    Ok(Some((
        roll.damage,
        roll.critical,
        HitResult::from_effectiveness(roll.effectiveness),
    )))
}

/// One hit against every still-valid target, then hands over to secondary effects.
pub fn run_move_effect(ctx: &mut BattleContext, mut use_ctx: MoveUseContext) -> Result<(), ExecutionError> {
    let move_data = get_move_data(use_ctx.move_id).map_err(data_error)?;
    if !ctx.state.is_active(use_ctx.user, use_ctx.user_id) {
        ctx.queue.unshift(Phase::MoveEnd(Box::new(use_ctx)));
        return Ok(());
    }
    if move_data.target.is_field_target() {
        apply_field_move(ctx, &mut use_ctx, move_data)?;
        ctx.queue.unshift(Phase::MoveEnd(Box::new(use_ctx)));
        return Ok(());
    }

    let first_hit = use_ctx.hit_index == 0;
    let contact = move_data.has_flag(MoveFlag::Contact);
    let mut landed = false;

    for index in 0..use_ctx.targets.len() {
        let TargetOutcome {
            battler: target,
            pokemon_id,
            result,
            ..
        } = use_ctx.targets[index].clone();
        if !first_hit && !result.is_some_and(|r| r.is_hit()) {
            continue;
        }
        if !ctx.state.is_active(target, pokemon_id) || !ctx.state.is_active(use_ctx.user, use_ctx.user_id) {
            continue;
        }

        if first_hit {
            if let Some(blocked) = first_hit_block(ctx, &use_ctx, target, move_data)? {
                use_ctx.targets[index].result = Some(blocked);
                continue;
            }
        }

        let target_actor = actor_for(ctx.state, target)?;
        let hit_substitute = substitute_applies(ctx.state, &use_ctx, target, move_data);
        use_ctx.targets[index].hit_substitute = hit_substitute;

        if move_data.is_status() {
            if hit_substitute {
                ctx.bus.push(BattleEvent::EffectBlocked {
                    target: target_actor,
                    reason: BlockReason::Substitute,
                });
                use_ctx.targets[index].result = Some(HitResult::Blocked(BlockReason::Substitute));
            } else {
                use_ctx.targets[index].result = Some(HitResult::Effective);
            }
            continue;
        }

        let Some((damage, critical, hit_result)) = hit_damage(ctx, &use_ctx, target, move_data)? else {
            let actor = actor_for(ctx.state, use_ctx.user)?;
            ctx.bus.push(BattleEvent::MoveFailed {
                actor,
                move_id: use_ctx.move_id,
            });
            use_ctx.targets[index].result = Some(HitResult::Fail);
            continue;
        };

        let hp_before = ctx.state.pokemon(target).map(|p| p.current_hp()).unwrap_or(0);
        let command = if hit_substitute {
            BattleCommand::DamageSubstitute { target, amount: damage }
        } else {
            BattleCommand::DealDamage {
                target,
                amount: damage,
                source: DamageSource::Move(use_ctx.move_id),
            }
        };
        execute_command_batch(vec![command], ctx)?;
        let dealt = if hit_substitute {
            damage
        } else {
            hp_before.saturating_sub(ctx.state.pokemon(target).map(|p| p.current_hp()).unwrap_or(0))
        };

        if move_data.category == MoveCategory::Physical && !hit_substitute {
            if let Some(pokemon) = ctx.state.pokemon_mut(target) {
                pokemon.turn_data.physical_damage_taken = Some((dealt, use_ctx.user));
            }
        }
        if critical {
            ctx.bus.push(BattleEvent::CriticalHit { target: target_actor });
        }
        if first_hit && hit_result != HitResult::Effective {
            ctx.bus.push(BattleEvent::Effectiveness {
                target: target_actor,
                result: hit_result,
            });
        }
        let outcome = &mut use_ctx.targets[index];
        outcome.result = Some(hit_result);
        outcome.damage += dealt as u32;
        landed = true;

        if !hit_substitute {
            let trigger = AbilityTrigger::new(AbilityEvent::PostDamageReceived)
                .with_other(use_ctx.user)
                .with_move(use_ctx.move_id, contact)
                .ignoring_abilities(use_ctx.ignore_abilities);
            abilities::dispatch(ctx, trigger, &[target]);
            let trigger = AbilityTrigger::new(AbilityEvent::PostDamageDealt)
                .with_other(target)
                .with_move(use_ctx.move_id, contact);
            abilities::dispatch(ctx, trigger, &[use_ctx.user]);
            if ctx.state.pokemon(target).is_some_and(|p| p.is_fainted()) {
                let trigger = AbilityTrigger::new(AbilityEvent::OnFaint)
                    .with_other(use_ctx.user)
                    .with_move(use_ctx.move_id, contact);
                abilities::dispatch(ctx, trigger, &[target]);
            }
        }
    }

    if landed {
        use_ctx.hits_landed += 1;
    }
    ctx.queue.unshift(Phase::MoveSecondary(Box::new(use_ctx)));
    Ok(())
}

// --- Secondary effects ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOutcome {
    Applied,
    Failed,
    /// Chance roll missed or the attribute does not act here.
    Skipped,
}

fn target_side_attr(attr: &MoveAttr) -> bool {
    matches!(
        attr,
        MoveAttr::Status { .. }
            | MoveAttr::StatStage {
                target: EffectTarget::Target,
                ..
            }
            | MoveAttr::AddTag {
                target: EffectTarget::Target,
                ..
            }
            | MoveAttr::ForceSwitch
            | MoveAttr::StealItem
            | MoveAttr::RemoveItem
            | MoveAttr::ResetTargetStages
            | MoveAttr::Disable
    )
}

fn user_side_attr(attr: &MoveAttr) -> bool {
    matches!(
        attr,
        MoveAttr::StatStage {
            target: EffectTarget::User,
            ..
        } | MoveAttr::AddTag {
            target: EffectTarget::User,
            ..
        } | MoveAttr::HealUser { .. }
            | MoveAttr::Protect
            | MoveAttr::Endure
            | MoveAttr::Substitute
            | MoveAttr::ShedTail
            | MoveAttr::BatonPass
            | MoveAttr::Nothing
    )
}

fn roll_chance(ctx: &mut BattleContext, chance: u8) -> bool {
    ctx.rng.chance(chance, "secondary effect chance")
}

fn tag_data_for(kind: BattlerTagType, user: BattlerIndex, move_id: MoveId) -> Option<TagData> {
    Some(match kind {
        BattlerTagType::Confused => TagData::Confused,
        BattlerTagType::Trapped => TagData::Trapped,
        BattlerTagType::Seeded => TagData::Seeded { source: user },
        BattlerTagType::Flinched => TagData::Flinched,
        BattlerTagType::SaltCured => TagData::SaltCured,
        BattlerTagType::FocusEnergy => TagData::FocusEnergy,
        BattlerTagType::AquaRing => TagData::AquaRing,
        BattlerTagType::Ingrain => TagData::Ingrain,
        BattlerTagType::Drowsy => TagData::Drowsy,
        BattlerTagType::Protected => TagData::Protected,
        BattlerTagType::Endure => TagData::Endure,
        BattlerTagType::Recharging => TagData::Recharging,
        BattlerTagType::Frenzy => TagData::Frenzy { move_id },
        BattlerTagType::Disabled
        | BattlerTagType::Substitute
        | BattlerTagType::SemiInvulnerable
        | BattlerTagType::Charging
        | BattlerTagType::BypassSpeed => return None,
    })
}

fn add_tag(
    ctx: &mut BattleContext,
    use_ctx: &MoveUseContext,
    target: BattlerIndex,
    kind: BattlerTagType,
    chance: u8,
    announce: bool,
) -> Result<AttrOutcome, ExecutionError> {
    let actor = actor_for(ctx.state, target)?;
    if ctx.state.pokemon(target).is_some_and(|p| p.tags.has(kind)) {
        if announce {
            ctx.bus.push(BattleEvent::TagAlreadyPresent { target: actor, tag: kind });
        }
        return Ok(AttrOutcome::Failed);
    }
    let ignore = use_ctx.ignore_abilities && target != use_ctx.user;
    if let Some(reason) = tag_blocked(ctx.state, target, kind, ignore) {
        if announce {
            ctx.bus.push(BattleEvent::EffectBlocked { target: actor, reason });
        }
        return Ok(AttrOutcome::Failed);
    }
    let Some(data) = tag_data_for(kind, use_ctx.user, use_ctx.move_id) else {
        return Ok(AttrOutcome::Skipped);
    };
    if !roll_chance(ctx, chance) {
        return Ok(AttrOutcome::Skipped);
    }
    let turns = kind.roll_duration(ctx.rng);
    execute_command_batch(
        vec![BattleCommand::AddTag {
            target,
            tag: BattlerTag::new(data, turns, use_ctx.move_id, Some(use_ctx.user_id)),
        }],
        ctx,
    )?;
    Ok(AttrOutcome::Applied)
}

fn force_switch(
    ctx: &mut BattleContext,
    use_ctx: &mut MoveUseContext,
    target: BattlerIndex,
) -> Result<AttrOutcome, ExecutionError> {
    let actor = actor_for(ctx.state, target)?;
    if ctx.state.pokemon(target).is_some_and(|p| p.tags.has(BattlerTagType::Ingrain)) {
        return Ok(AttrOutcome::Failed);
    }

    if ctx.state.is_wild() && target.side == SideId::Enemy {
        // A wild Pokemon is blown away instead of replaced.
        let was_suppressor = ctx
            .state
            .pokemon(target)
            .is_some_and(|p| abilities::is_field_suppressor(p.ability));
        if let Some(pokemon) = ctx.state.pokemon_mut(target) {
            pokemon.withdraw();
        }
        ctx.state.side_mut(target.side).active[target.slot] = None;
        ctx.bus.push(BattleEvent::PokemonWithdrawn { actor });
        ctx.bus.push(BattleEvent::Fled { side: SideId::Enemy });
        abilities::restore_suppressed_abilities(ctx, target, was_suppressor);
        let enemy_left = ctx
            .state
            .active_battlers()
            .iter()
            .any(|battler| battler.side == SideId::Enemy);
        if !enemy_left {
            use_ctx.follow_ups.push(Phase::BattleEnd {
                outcome: BattleOutcome::EnemyFled,
            });
        }
        return Ok(AttrOutcome::Applied);
    }

    let candidates = ctx.state.side(target.side).bench_candidates();
    let Some(team_index) = sample(ctx.rng, &candidates, "forced switch-in").copied() else {
        return Ok(AttrOutcome::Failed);
    };
    use_ctx.follow_ups.push(Phase::Switch {
        battler: target,
        team_index,
        kind: SwitchKind::Forced,
    });
    Ok(AttrOutcome::Applied)
}

fn apply_target_attr(
    ctx: &mut BattleContext,
    use_ctx: &mut MoveUseContext,
    target: BattlerIndex,
    attr: &MoveAttr,
    status_move: bool,
) -> Result<AttrOutcome, ExecutionError> {
    let actor = actor_for(ctx.state, target)?;
    let user = use_ctx.user;
    match attr {
        MoveAttr::Status { status, chance } => {
            let current = ctx.state.pokemon(target).and_then(|p| p.status);
            if current.is_some() {
                if status_move {
                    ctx.bus.push(BattleEvent::EffectBlocked {
                        target: actor,
                        reason: BlockReason::AlreadyAffected,
                    });
                }
                return Ok(AttrOutcome::Failed);
            }
            if let Some(reason) = status_blocked(ctx.state, target, *status, use_ctx.ignore_abilities) {
                if status_move {
                    ctx.bus.push(BattleEvent::EffectBlocked { target: actor, reason });
                }
                return Ok(AttrOutcome::Failed);
            }
            if !roll_chance(ctx, *chance) {
                return Ok(AttrOutcome::Skipped);
            }
            execute_command_batch(
                vec![BattleCommand::InflictStatus {
                    target,
                    status: *status,
                }],
                ctx,
            )?;
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::StatStage {
            stats, delta, chance, ..
        } => {
            if !roll_chance(ctx, *chance) {
                return Ok(AttrOutcome::Skipped);
            }
            let changed =
                apply_stat_stage_change(ctx, target, stats, *delta, Some(user), use_ctx.ignore_abilities);
            Ok(if changed { AttrOutcome::Applied } else { AttrOutcome::Failed })
        }
        MoveAttr::AddTag { tag, chance, .. } => add_tag(ctx, use_ctx, target, *tag, *chance, status_move),
        MoveAttr::ForceSwitch => force_switch(ctx, use_ctx, target),
        MoveAttr::StealItem => {
            let user_item = ctx.state.pokemon(user).and_then(|p| p.item);
            let target_item = ctx.state.pokemon(target).and_then(|p| p.item);
            match (user_item, target_item) {
                (None, Some(item)) => {
                    let thief = actor_for(ctx.state, user)?;
                    execute_command_batch(
                        vec![
                            BattleCommand::SetItem { target, item: None },
                            BattleCommand::SetItem {
                                target: user,
                                item: Some(item),
                            },
                            BattleCommand::EmitEvent(BattleEvent::ItemStolen {
                                thief,
                                victim: actor,
                                item,
                            }),
                        ],
                        ctx,
                    )?;
                    Ok(AttrOutcome::Applied)
                }
                _ => Ok(AttrOutcome::Skipped),
            }
        }
        MoveAttr::RemoveItem => match ctx.state.pokemon(target).and_then(|p| p.item) {
            Some(item) => {
                execute_command_batch(
                    vec![
                        BattleCommand::SetItem { target, item: None },
                        BattleCommand::EmitEvent(BattleEvent::ItemKnockedOff { target: actor, item }),
                    ],
                    ctx,
                )?;
                Ok(AttrOutcome::Applied)
            }
            None => Ok(AttrOutcome::Skipped),
        },
        MoveAttr::ResetTargetStages => {
            if ctx.state.pokemon(target).is_some_and(|p| p.stat_stages.is_neutral()) {
                return Ok(AttrOutcome::Skipped);
            }
            execute_command_batch(vec![BattleCommand::ResetStatStages { target }], ctx)?;
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::Disable => {
            let Some(pokemon) = ctx.state.pokemon(target) else {
                return Ok(AttrOutcome::Failed);
            };
            let last = pokemon
                .last_move()
                .map(|entry| entry.move_id)
                .filter(|move_id| *move_id != MoveId::Struggle && pokemon.has_move(*move_id));
            let Some(move_id) = last else {
                return Ok(AttrOutcome::Failed);
            };
            if pokemon.tags.has(BattlerTagType::Disabled) {
                return Ok(AttrOutcome::Failed);
            }
            let turns = BattlerTagType::Disabled.roll_duration(ctx.rng);
            execute_command_batch(
                vec![BattleCommand::AddTag {
                    target,
                    tag: BattlerTag::new(
                        TagData::Disabled { move_id },
                        turns,
                        use_ctx.move_id,
                        Some(use_ctx.user_id),
                    ),
                }],
                ctx,
            )?;
            Ok(AttrOutcome::Applied)
        }
        _ => Ok(AttrOutcome::Skipped),
    }
}

/// Successful Protect-class uses in a row at the end of the history.
fn consecutive_protects(history: &[MoveHistoryEntry]) -> u32 {
    history
        .iter()
        .rev()
        .take_while(|entry| {
            entry.result == MoveResult::Success
                && matches!(entry.move_id, MoveId::Protect | MoveId::Detect | MoveId::Endure)
        })
        .count() as u32
}

fn apply_user_attr(
    ctx: &mut BattleContext,
    use_ctx: &mut MoveUseContext,
    attr: &MoveAttr,
) -> Result<AttrOutcome, ExecutionError> {
    let user = use_ctx.user;
    let actor = actor_for(ctx.state, user)?;
    let pokemon = ctx.state.pokemon(user).ok_or(ExecutionError::NoPokemon(user))?;
    let max_hp = pokemon.max_hp();
    let hp = pokemon.current_hp();

    match attr {
        MoveAttr::StatStage {
            stats, delta, chance, ..
        } => {
            if !roll_chance(ctx, *chance) {
                return Ok(AttrOutcome::Skipped);
            }
            let changed = apply_stat_stage_change(ctx, user, stats, *delta, Some(user), false);
            Ok(if changed { AttrOutcome::Applied } else { AttrOutcome::Failed })
        }
        MoveAttr::AddTag { tag, chance, .. } => add_tag(ctx, use_ctx, user, *tag, *chance, true),
        MoveAttr::HealUser { denominator } => {
            if hp >= max_hp {
                return Ok(AttrOutcome::Failed);
            }
            execute_command_batch(
                vec![BattleCommand::Heal {
                    target: user,
                    amount: (max_hp / denominator).max(1),
                }],
                ctx,
            )?;
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::Protect | MoveAttr::Endure => {
            let streak = consecutive_protects(&pokemon.history);
            if streak > 0 {
                let odds = 3u32.saturating_pow(streak.min(6));
                if ctx.rng.next_int(odds, "protect streak") != 0 {
                    return Ok(AttrOutcome::Failed);
                }
            }
            let kind = if matches!(attr, MoveAttr::Protect) {
                BattlerTagType::Protected
            } else {
                BattlerTagType::Endure
            };
            add_tag(ctx, use_ctx, user, kind, 100, true)
        }
        MoveAttr::Substitute => {
            let cost = max_hp / 4;
            if hp <= cost || pokemon.tags.substitute_hp().is_some() {
                return Ok(AttrOutcome::Failed);
            }
            execute_command_batch(
                vec![
                    BattleCommand::DealDamage {
                        target: user,
                        amount: cost,
                        source: DamageSource::SubstituteCost,
                    },
                    BattleCommand::AddTag {
                        target: user,
                        tag: BattlerTag::new(TagData::Substitute { hp: cost }, 0, use_ctx.move_id, Some(use_ctx.user_id)),
                    },
                    BattleCommand::EmitEvent(BattleEvent::SubstituteCreated { actor, hp: cost }),
                ],
                ctx,
            )?;
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::ShedTail => {
            let cost = max_hp.div_ceil(2);
            if hp <= cost || ctx.state.side(user.side).bench_candidates().is_empty() {
                return Ok(AttrOutcome::Failed);
            }
            execute_command_batch(
                vec![BattleCommand::DealDamage {
                    target: user,
                    amount: cost,
                    source: DamageSource::SubstituteCost,
                }],
                ctx,
            )?;
            use_ctx.follow_ups.push(Phase::SwitchPrompt {
                battler: user,
                kind: SwitchKind::ShedTail,
            });
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::BatonPass => {
            if ctx.state.side(user.side).bench_candidates().is_empty() {
                return Ok(AttrOutcome::Failed);
            }
            use_ctx.follow_ups.push(Phase::SwitchPrompt {
                battler: user,
                kind: SwitchKind::BatonPass,
            });
            Ok(AttrOutcome::Applied)
        }
        MoveAttr::Nothing => {
            ctx.bus.push(BattleEvent::NothingHappened);
            Ok(AttrOutcome::Applied)
        }
        _ => Ok(AttrOutcome::Skipped),
    }
}

/// Secondary effects of the current hit, then the next hit or the end phase.
pub fn run_move_secondary(ctx: &mut BattleContext, mut use_ctx: MoveUseContext) -> Result<(), ExecutionError> {
    let move_data = get_move_data(use_ctx.move_id).map_err(data_error)?;
    let status_move = move_data.is_status();
    let user_active = ctx.state.is_active(use_ctx.user, use_ctx.user_id);

    if user_active && !move_data.target.is_field_target() {
        for index in 0..use_ctx.targets.len() {
            let outcome = use_ctx.targets[index].clone();
            let hit = outcome.result.is_some_and(|r| r.is_hit());
            if !hit || outcome.hit_substitute || outcome.battler == use_ctx.user {
                continue;
            }
            if !ctx.state.is_active(outcome.battler, outcome.pokemon_id) {
                continue;
            }
            let mut attempted = false;
            let mut applied = false;
            for attr in move_data.attrs.iter().filter(|attr| target_side_attr(attr)) {
                if !ctx.state.is_active(outcome.battler, outcome.pokemon_id) {
                    break;
                }
                attempted = true;
                match apply_target_attr(ctx, &mut use_ctx, outcome.battler, attr, status_move)? {
                    AttrOutcome::Applied => applied = true,
                    AttrOutcome::Failed | AttrOutcome::Skipped => {}
                }
            }
            if status_move && attempted && !applied {
                use_ctx.targets[index].result = Some(HitResult::Fail);
            }
        }

        if use_ctx.hit_index == 0 && use_ctx.any_hit() {
            let mut attempted = false;
            let mut applied = false;
            for attr in move_data.attrs.iter().filter(|attr| user_side_attr(attr)) {
                if !ctx.state.is_active(use_ctx.user, use_ctx.user_id) {
                    break;
                }
                attempted = true;
                match apply_user_attr(ctx, &mut use_ctx, attr)? {
                    AttrOutcome::Applied => applied = true,
                    AttrOutcome::Failed | AttrOutcome::Skipped => {}
                }
            }
            if status_move && move_data.target == MoveTarget::User && attempted && !applied {
                if let Some(outcome) = use_ctx.targets.first_mut() {
                    outcome.result = Some(HitResult::Fail);
                }
                let actor = actor_for(ctx.state, use_ctx.user)?;
                ctx.bus.push(BattleEvent::MoveFailed {
                    actor,
                    move_id: use_ctx.move_id,
                });
            }
        }

        let all_failed = status_move
            && move_data.target != MoveTarget::User
            && !use_ctx.targets.is_empty()
            && use_ctx
                .targets
                .iter()
                .all(|t| t.result == Some(HitResult::Fail));
        if all_failed && use_ctx.hit_index == 0 {
            debug!("{} had no effect on any target", use_ctx.move_id);
        }
    }

    let next_hit = use_ctx.hit_index + 1;
    let more_hits = next_hit < use_ctx.hits_total
        && ctx.state.is_active(use_ctx.user, use_ctx.user_id)
        && use_ctx.targets.iter().any(|t| {
            t.result.is_some_and(|r| r.is_hit()) && ctx.state.is_active(t.battler, t.pokemon_id)
        });
    if more_hits {
        use_ctx.hit_index = next_hit;
        ctx.queue.unshift(Phase::MoveEffect(Box::new(use_ctx)));
    } else {
        ctx.queue.unshift(Phase::MoveEnd(Box::new(use_ctx)));
    }
    Ok(())
}

// --- Move end ---

fn overall_result(use_ctx: &MoveUseContext) -> MoveResult {
    if let Some(field) = use_ctx.field_result {
        return if field.is_hit() { MoveResult::Success } else { MoveResult::Fail };
    }
    if use_ctx.any_hit() {
        MoveResult::Success
    } else if !use_ctx.targets.is_empty()
        && use_ctx.targets.iter().all(|t| t.result == Some(HitResult::Miss))
    {
        MoveResult::Miss
    } else {
        MoveResult::Fail
    }
}

/// History, recoil and recharge, Dancer copies, then queued switches.
pub fn run_move_end(ctx: &mut BattleContext, use_ctx: MoveUseContext) -> Result<(), ExecutionError> {
    let move_data = get_move_data(use_ctx.move_id).map_err(data_error)?;
    let result = overall_result(&use_ctx);
    record_history(
        ctx.state,
        use_ctx.user_id,
        use_ctx.move_id,
        use_ctx.target_battlers(),
        result,
        use_ctx.use_mode,
    );

    if use_ctx.hits_total > 1 && use_ctx.hits_landed > 0 {
        ctx.bus.push(BattleEvent::HitCount {
            hits: use_ctx.hits_landed,
        });
    }

    if ctx.state.is_active(use_ctx.user, use_ctx.user_id) && result == MoveResult::Success {
        let user = use_ctx.user;
        let (max_hp, item) = match ctx.state.pokemon(user) {
            Some(pokemon) => (pokemon.max_hp(), pokemon.item),
            None => (0, None),
        };
        let total_damage: u32 = use_ctx.targets.iter().map(|t| t.damage).sum();
        let mut commands = Vec::new();
        for attr in &move_data.attrs {
            match attr {
                MoveAttr::Recoil { denominator } if total_damage > 0 => {
                    commands.push(BattleCommand::DealDamage {
                        target: user,
                        amount: (total_damage / *denominator as u32).max(1) as u16,
                        source: DamageSource::Recoil,
                    });
                }
                MoveAttr::RecoilMaxHp { denominator } => commands.push(BattleCommand::DealDamage {
                    target: user,
                    amount: (max_hp / denominator).max(1),
                    source: DamageSource::Recoil,
                }),
                MoveAttr::Recharge => commands.push(BattleCommand::AddTag {
                    target: user,
                    tag: BattlerTag::new(TagData::Recharging, 0, use_ctx.move_id, Some(use_ctx.user_id)),
                }),
                _ => {}
            }
        }
        if item == Some(HeldItem::LifeOrb) && move_data.is_attack() && total_damage > 0 {
            commands.push(BattleCommand::DealDamage {
                target: user,
                amount: (max_hp / 10).max(1),
                source: DamageSource::Item(HeldItem::LifeOrb),
            });
        }
        execute_command_batch(commands, ctx)?;
    }

    if result == MoveResult::Success
        && move_data.has_flag(MoveFlag::Dance)
        && use_ctx.use_mode != UseMode::Indirect
    {
        let dancers: Vec<BattlerIndex> = ctx
            .state
            .active_battlers()
            .into_iter()
            .filter(|battler| *battler != use_ctx.user)
            .collect();
        let trigger = AbilityTrigger::new(AbilityEvent::PostMoveUsed)
            .with_other(use_ctx.user)
            .with_move(use_ctx.move_id, false)
            .with_targets(use_ctx.target_battlers());
        abilities::dispatch(ctx, trigger, &dancers);
    }

    for phase in use_ctx.follow_ups {
        ctx.queue.unshift(phase);
    }
    Ok(())
}
