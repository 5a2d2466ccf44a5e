use crate::battle::controller::BattleController;
use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::rng::{BattleRng, TurnRng};
use crate::battle::state::{BattleState, BattleType, BattlerIndex, QueuedCommand, SideId, TurnCommand};
use crate::pokemon::{PokemonInst, StatusCondition, UseMode};
use crate::species::Species;
use schema::{AbilityId, HeldItem, MoveId};

pub const PLAYER: BattlerIndex = BattlerIndex::new(SideId::Player, 0);
pub const ENEMY: BattlerIndex = BattlerIndex::new(SideId::Enemy, 0);

/// A builder for creating test Pokemon instances with common defaults.
///
/// # Example
/// ```ignore
/// let pokemon = TestPokemonBuilder::new(Species::Pikachu, 25)
///     .with_moves(vec![MoveId::Tackle])
///     .with_status(StatusCondition::Paralysis)
///     .build();
/// ```
pub struct TestPokemonBuilder {
    species: Species,
    level: u8,
    moves: Vec<MoveId>,
    status: Option<StatusCondition>,
    current_hp: Option<u16>,
    ability: Option<AbilityId>,
    item: Option<HeldItem>,
}

impl TestPokemonBuilder {
    /// Creates a new builder for a given species and level.
    pub fn new(species: Species, level: u8) -> Self {
        Self {
            species,
            level,
            moves: vec![MoveId::Tackle],
            status: None,
            current_hp: None,
            ability: None,
            item: None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<MoveId>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP for the test Pokemon. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    /// Overrides the species' ability.
    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_item(mut self, item: HeldItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn build(self) -> PokemonInst {
        let mut pokemon = match PokemonInst::new(self.species, self.level, &self.moves) {
            Ok(pokemon) => pokemon,
            Err(err) => panic!("Failed to build {:?}: {}", self.species, err),
        };
        pokemon.status = self.status;
        if let Some(hp) = self.current_hp {
            pokemon.set_hp(hp);
        }
        if let Some(ability) = self.ability {
            pokemon.ability = ability;
        }
        pokemon.item = self.item;
        pokemon
    }
}

/// Scripted generator that always answers 50, clamped to the bound.
///
/// With it every accuracy check passes, no critical hit lands, damage rolls
/// at full strength and any chance of 50% or less misses.
pub fn predictable_rng() -> Box<dyn BattleRng> {
    Box::new(TurnRng::new_for_test(vec![50; 2000]))
}

/// Same as `predictable_rng`, with `first` consumed before the steady 50s.
pub fn rng_starting_with(first: &[u8]) -> Box<dyn BattleRng> {
    let mut outcomes = first.to_vec();
    outcomes.extend(std::iter::repeat(50).take(2000));
    Box::new(TurnRng::new_for_test(outcomes))
}

/// Builds a battle from full teams and runs it up to the first command prompt.
pub fn create_battle(
    battle_type: BattleType,
    player_team: Vec<PokemonInst>,
    enemy_team: Vec<PokemonInst>,
) -> (BattleController, EventBus) {
    let state = match BattleState::new(battle_type, false, player_team, enemy_team) {
        Ok(state) => state,
        Err(err) => panic!("Failed to create battle: {}", err),
    };
    let mut controller = BattleController::with_rng(state, predictable_rng());
    let bus = controller.start();
    (controller, bus)
}

/// A started single trainer battle between two Pokemon.
pub fn create_test_battle(player: PokemonInst, enemy: PokemonInst) -> BattleController {
    create_battle(BattleType::Trainer, vec![player], vec![enemy]).0
}

/// The player's lead picks move slot `move_slot`.
pub fn fight(move_slot: usize) -> Vec<QueuedCommand> {
    vec![QueuedCommand {
        battler: PLAYER,
        command: TurnCommand::Fight {
            move_slot,
            target: None,
        },
    }]
}

pub fn player_command(command: TurnCommand) -> Vec<QueuedCommand> {
    vec![QueuedCommand {
        battler: PLAYER,
        command,
    }]
}

/// Every move use in the log, in order.
pub fn moves_used(bus: &EventBus) -> Vec<(BattlerIndex, MoveId, UseMode)> {
    bus.events()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::MoveUsed {
                actor,
                move_id,
                use_mode,
            } => Some((actor.battler, *move_id, *use_mode)),
            _ => None,
        })
        .collect()
}

pub fn has_event(bus: &EventBus, predicate: impl Fn(&BattleEvent) -> bool) -> bool {
    bus.events().iter().any(predicate)
}
