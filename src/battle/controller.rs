use log::{debug, warn};
use std::collections::HashSet;

use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::phases::{run_phase, BattleContext, Phase, PhaseOutcome, PhaseQueue};
use crate::battle::rng::{sample, BattleRng, SeededRng};
use crate::battle::scheduler::{order_turn, ActionKind, TurnAction};
use crate::battle::state::{BattleState, BattlerIndex, GameState, QueuedCommand, SideId, TurnCommand};
use crate::battle::tags::{BattlerTagType, TagData};
use crate::config::BattleConfig;
use crate::errors::{ActionError, BattleResult};
use crate::pokemon::{PokemonInst, UseMode};
use schema::MoveId;

/// Owns one battle and drives its phase queue between input points.
pub struct BattleController {
    state: BattleState,
    queue: PhaseQueue,
    rng: Box<dyn BattleRng>,
}

impl BattleController {
    /// Builds a battle from config. Starting weather and terrain are laid
    /// down before the first switch-in abilities run.
    pub fn new(
        config: &BattleConfig,
        player_team: Vec<PokemonInst>,
        enemy_team: Vec<PokemonInst>,
    ) -> BattleResult<Self> {
        let mut state = BattleState::new(config.battle_type, config.double_battle, player_team, enemy_team)?;
        state.max_call_depth = config.max_call_depth;
        if let Some(weather) = config.starting_weather {
            state.arena.set_weather(weather, config.weather_turns);
        }
        if let Some(terrain) = config.starting_terrain {
            state.arena.set_terrain(terrain, config.terrain_turns);
        }
        let rng = SeededRng::new(config.resolved_seed());
        debug!("Battle seeded with {}", rng.initial_seed());
        Ok(Self::with_rng(state, Box::new(rng)))
    }

    pub fn with_rng(state: BattleState, rng: Box<dyn BattleRng>) -> Self {
        Self {
            state,
            queue: PhaseQueue::new(),
            rng,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn queue(&self) -> &PhaseQueue {
        &self.queue
    }

    /// Replaces the generator, e.g. with scripted outcomes mid-battle.
    pub fn set_rng(&mut self, rng: Box<dyn BattleRng>) {
        self.rng = rng;
    }

    pub fn into_state(self) -> BattleState {
        self.state
    }

    /// Sends out the leads and runs until the first command is needed.
    pub fn start(&mut self) -> EventBus {
        self.queue.push(Phase::BattleStart);
        self.run()
    }

    /// Runs phases until the queue is empty, input is needed or the battle ends.
    fn run(&mut self) -> EventBus {
        let mut bus = EventBus::new();
        let mut ctx = BattleContext {
            state: &mut self.state,
            bus: &mut bus,
            queue: &mut self.queue,
            rng: self.rng.as_mut(),
        };
        if !ctx.state.is_over() {
            ctx.state.game_state = GameState::Resolving;
        }
        loop {
            if ctx.state.is_over() {
                ctx.queue.clear();
                break;
            }
            let Some(phase) = ctx.queue.pop() else {
                ctx.state.game_state = GameState::AwaitingCommands;
                break;
            };
            if run_phase(&mut ctx, phase) == PhaseOutcome::AwaitInput {
                break;
            }
        }
        bus
    }

    /// Validates and runs one turn. Player battlers that are locked into a
    /// move need no command; enemy battlers without one choose for themselves.
    pub fn submit_commands(&mut self, commands: Vec<QueuedCommand>) -> BattleResult<EventBus> {
        if self.state.game_state != GameState::AwaitingCommands {
            return Err(ActionError::InvalidAction(format!(
                "not awaiting commands ({:?})",
                self.state.game_state
            ))
            .into());
        }

        let active = self.state.active_battlers();
        for command in &commands {
            if !active.contains(&command.battler) {
                return Err(ActionError::UnexpectedBattler(command.battler.slot).into());
            }
        }

        let mut actions = Vec::with_capacity(active.len());
        let mut claimed_switches = HashSet::new();
        for battler in active {
            let pokemon_id = match self.state.pokemon(battler) {
                Some(pokemon) => pokemon.id,
                None => continue,
            };
            if let Some(kind) = forced_action(&self.state, battler) {
                actions.push(TurnAction {
                    battler,
                    pokemon_id,
                    kind,
                });
                continue;
            }
            let submitted = commands.iter().find(|command| command.battler == battler);
            let command = match (submitted, battler.side) {
                (Some(queued), _) => queued.command.clone(),
                (None, SideId::Enemy) => choose_enemy_command(&self.state, battler, self.rng.as_mut()),
                (None, SideId::Player) => return Err(ActionError::MissingCommand(battler.slot).into()),
            };
            if let TurnCommand::Switch { team_index } = command {
                if !claimed_switches.insert((battler.side, team_index)) {
                    return Err(ActionError::AlreadyActive(team_index).into());
                }
            }
            let kind = validate_command(&self.state, battler, &command)?;
            actions.push(TurnAction {
                battler,
                pokemon_id,
                kind,
            });
        }

        self.state.queued_commands = commands;
        let mut bus = EventBus::new();
        bus.push(BattleEvent::TurnStarted { turn: self.state.turn });
        {
            let mut ctx = BattleContext {
                state: &mut self.state,
                bus: &mut bus,
                queue: &mut self.queue,
                rng: self.rng.as_mut(),
            };
            order_turn(&mut ctx, actions);
        }
        self.queue.push(Phase::WeatherEffect);
        self.queue.push(Phase::PostTurnStatus);
        self.queue.push(Phase::TurnEnd);
        self.queue.push(Phase::ReplaceFainted);

        bus.extend(self.run());
        self.state.queued_commands.clear();
        Ok(bus)
    }

    /// Answers a pending party prompt and resumes the turn.
    pub fn submit_party_selection(&mut self, team_index: usize) -> BattleResult<EventBus> {
        let GameState::AwaitingPartySelection { battler, kind } = self.state.game_state else {
            return Err(ActionError::InvalidAction("no party selection is pending".to_string()).into());
        };
        let side = self.state.side(battler.side);
        let pokemon = side
            .team
            .get(team_index)
            .ok_or(ActionError::InvalidPokemonIndex(team_index))?;
        if pokemon.is_fainted() {
            return Err(ActionError::FaintedSwitchTarget(team_index).into());
        }
        if side.is_on_field(team_index) {
            return Err(ActionError::AlreadyActive(team_index).into());
        }
        self.queue.unshift(Phase::Switch {
            battler,
            team_index,
            kind,
        });
        Ok(self.run())
    }

    /// Commands the given player battler could submit right now.
    pub fn valid_commands(&self, battler: BattlerIndex) -> Vec<TurnCommand> {
        let Some(pokemon) = self.state.pokemon(battler) else {
            return Vec::new();
        };
        let mut commands: Vec<TurnCommand> = (0..pokemon.moves.len())
            .map(|move_slot| TurnCommand::Fight { move_slot, target: None })
            .filter(|command| validate_command(&self.state, battler, command).is_ok())
            .collect();
        for team_index in self.state.side(battler.side).bench_candidates() {
            let command = TurnCommand::Switch { team_index };
            if validate_command(&self.state, battler, &command).is_ok() {
                commands.push(command);
            }
        }
        if validate_command(&self.state, battler, &TurnCommand::Run).is_ok() {
            commands.push(TurnCommand::Run);
        }
        commands
    }
}

fn struggle() -> ActionKind {
    ActionKind::Move {
        move_id: MoveId::Struggle,
        move_slot: None,
        targets: Vec::new(),
        use_mode: UseMode::Normal,
    }
}

/// Charging, rampaging and recharging Pokemon repeat their move without input.
fn forced_action(state: &BattleState, battler: BattlerIndex) -> Option<ActionKind> {
    let pokemon = state.pokemon(battler)?;
    if let Some(TagData::Charging { move_id, targets }) = pokemon.tags.get(BattlerTagType::Charging).map(|t| &t.data) {
        return Some(ActionKind::Move {
            move_id: *move_id,
            move_slot: None,
            targets: targets.clone(),
            use_mode: UseMode::IgnorePp,
        });
    }
    if let Some(TagData::Frenzy { move_id }) = pokemon.tags.get(BattlerTagType::Frenzy).map(|t| &t.data) {
        return Some(ActionKind::Move {
            move_id: *move_id,
            move_slot: None,
            targets: Vec::new(),
            use_mode: UseMode::IgnorePp,
        });
    }
    if pokemon.tags.has(BattlerTagType::Recharging) {
        let move_id = pokemon.last_move().map(|entry| entry.move_id).unwrap_or(MoveId::Struggle);
        return Some(ActionKind::Move {
            move_id,
            move_slot: None,
            targets: Vec::new(),
            use_mode: UseMode::IgnorePp,
        });
    }
    None
}

fn is_trapped(state: &BattleState, battler: BattlerIndex) -> bool {
    state
        .pokemon(battler)
        .is_some_and(|pokemon| pokemon.tags.has(BattlerTagType::Trapped))
}

/// Turns a command into a schedulable action, or explains why it is illegal.
fn validate_command(
    state: &BattleState,
    battler: BattlerIndex,
    command: &TurnCommand,
) -> Result<ActionKind, ActionError> {
    let pokemon = state
        .pokemon(battler)
        .ok_or(ActionError::UnexpectedBattler(battler.slot))?;
    match command {
        TurnCommand::Fight { move_slot, target } => {
            if pokemon.usable_move_slots().is_empty() {
                return Ok(struggle());
            }
            let slot = pokemon
                .moves
                .get(*move_slot)
                .ok_or(ActionError::InvalidMoveIndex(*move_slot))?;
            if slot.pp == 0 {
                return Err(ActionError::NoPpRemaining(slot.move_id));
            }
            if pokemon.tags.disabled_move() == Some(slot.move_id) {
                return Err(ActionError::MoveDisabled(slot.move_id));
            }
            if let Some(target) = target {
                if target.slot >= state.slots_per_side() {
                    return Err(ActionError::InvalidAction(format!("no field slot {:?}", target)));
                }
            }
            Ok(ActionKind::Move {
                move_id: slot.move_id,
                move_slot: Some(*move_slot),
                targets: target.iter().copied().collect(),
                use_mode: UseMode::Normal,
            })
        }
        TurnCommand::Switch { team_index } => {
            let side = state.side(battler.side);
            let incoming = side
                .team
                .get(*team_index)
                .ok_or(ActionError::InvalidPokemonIndex(*team_index))?;
            if incoming.is_fainted() {
                return Err(ActionError::FaintedSwitchTarget(*team_index));
            }
            if side.is_on_field(*team_index) {
                return Err(ActionError::AlreadyActive(*team_index));
            }
            if is_trapped(state, battler) {
                return Err(ActionError::Trapped);
            }
            Ok(ActionKind::Switch {
                team_index: *team_index,
            })
        }
        TurnCommand::Run => {
            if !state.is_wild() {
                return Err(ActionError::CannotFleeTrainerBattle);
            }
            if is_trapped(state, battler) {
                return Err(ActionError::Trapped);
            }
            Ok(ActionKind::Run)
        }
    }
}

/// A random usable move at default targets, or Struggle.
fn choose_enemy_command(state: &BattleState, battler: BattlerIndex, rng: &mut dyn BattleRng) -> TurnCommand {
    let usable = state
        .pokemon(battler)
        .map(|pokemon| pokemon.usable_move_slots())
        .unwrap_or_default();
    let move_slot = match sample(rng, &usable, "enemy move choice") {
        Some(slot) => *slot,
        None => {
            warn!("{:?} has no usable move; it will struggle", battler);
            0
        }
    };
    TurnCommand::Fight { move_slot, target: None }
}
