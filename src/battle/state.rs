use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::arena::Arena;
use crate::errors::{BattleResult, BattleStateError};
use crate::pokemon::PokemonInst;
use schema::MoveId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SideId {
    Player,
    Enemy,
}

impl SideId {
    pub const ALL: [SideId; 2] = [SideId::Player, SideId::Enemy];

    pub fn to_index(self) -> usize {
        match self {
            SideId::Player => 0,
            SideId::Enemy => 1,
        }
    }

    pub fn opponent(self) -> SideId {
        match self {
            SideId::Player => SideId::Enemy,
            SideId::Enemy => SideId::Player,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::Player => write!(f, "your side"),
            SideId::Enemy => write!(f, "the opposing side"),
        }
    }
}

/// Field position: the only back-reference entities hold to each other.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BattlerIndex {
    pub side: SideId,
    pub slot: usize,
}

impl BattlerIndex {
    pub const fn new(side: SideId, slot: usize) -> Self {
        Self { side, slot }
    }

    pub fn is_ally_of(&self, other: BattlerIndex) -> bool {
        self.side == other.side
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleType {
    Wild,
    Trainer,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    PlayerWon,
    EnemyWon,
    PlayerFled,
    /// A wild Pokemon left the field (blown away or fled).
    EnemyFled,
    Draw,
}

/// Why a Pokemon is being brought in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Normal,
    BatonPass,
    ShedTail,
    /// Dragged in by Roar-class effects.
    Forced,
    /// Filling a slot left by a fainted Pokemon.
    Replacement,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    AwaitingCommands,
    AwaitingPartySelection {
        battler: BattlerIndex,
        kind: SwitchKind,
    },
    Resolving,
    Ended(BattleOutcome),
}

/// One active Pokemon's choice for the turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TurnCommand {
    Fight {
        move_slot: usize,
        target: Option<BattlerIndex>,
    },
    Switch {
        team_index: usize,
    },
    Run,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub battler: BattlerIndex,
    pub command: TurnCommand,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BattleSide {
    pub id: SideId,
    pub team: Vec<PokemonInst>,
    /// Team index occupying each field slot.
    pub active: Vec<Option<usize>>,
}

impl BattleSide {
    fn new(id: SideId, team: Vec<PokemonInst>, slots: usize) -> Self {
        let mut active = Vec::with_capacity(slots);
        let mut candidates = team
            .iter()
            .enumerate()
            .filter(|(_, pokemon)| !pokemon.is_fainted())
            .map(|(index, _)| index);
        for _ in 0..slots {
            active.push(candidates.next());
        }
        Self { id, team, active }
    }

    pub fn active_pokemon(&self, slot: usize) -> Option<&PokemonInst> {
        let team_index = (*self.active.get(slot)?)?;
        self.team.get(team_index)
    }

    pub fn is_on_field(&self, team_index: usize) -> bool {
        self.active.contains(&Some(team_index))
    }

    /// Benched, conscious Pokemon that could be sent in.
    pub fn bench_candidates(&self) -> Vec<usize> {
        self.team
            .iter()
            .enumerate()
            .filter(|(index, pokemon)| !pokemon.is_fainted() && !self.is_on_field(*index))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn has_remaining(&self) -> bool {
        self.team.iter().any(|pokemon| !pokemon.is_fainted())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub turn: u32,
    pub battle_type: BattleType,
    pub double_battle: bool,
    pub sides: [BattleSide; 2],
    pub arena: Arena,
    pub escape_attempts: u32,
    pub game_state: GameState,
    /// Last move used by anyone, read by Copycat.
    pub last_move: Option<MoveId>,
    pub queued_commands: Vec<QueuedCommand>,
    pub max_call_depth: u8,
}

impl BattleState {
    pub fn new(
        battle_type: BattleType,
        double_battle: bool,
        player_team: Vec<PokemonInst>,
        enemy_team: Vec<PokemonInst>,
    ) -> BattleResult<Self> {
        for team in [&player_team, &enemy_team] {
            if team.is_empty() {
                return Err(BattleStateError::EmptyTeam.into());
            }
            if team.len() > 6 {
                return Err(BattleStateError::TeamTooLarge(team.len()).into());
            }
        }

        let slots = if double_battle { 2 } else { 1 };
        let mut next_id = 1;
        let mut assign_ids = |team: Vec<PokemonInst>| -> Vec<PokemonInst> {
            team.into_iter()
                .map(|mut pokemon| {
                    pokemon.id = next_id;
                    next_id += 1;
                    pokemon
                })
                .collect()
        };
        let player_team = assign_ids(player_team);
        let enemy_team = assign_ids(enemy_team);

        let state = Self {
            turn: 1,
            battle_type,
            double_battle,
            sides: [
                BattleSide::new(SideId::Player, player_team, slots),
                BattleSide::new(SideId::Enemy, enemy_team, slots),
            ],
            arena: Arena::default(),
            escape_attempts: 0,
            game_state: GameState::Resolving,
            last_move: None,
            queued_commands: Vec::new(),
            max_call_depth: 3,
        };
        if state.active_battlers().is_empty() {
            return Err(BattleStateError::NoActivePokemon.into());
        }
        Ok(state)
    }

    pub fn slots_per_side(&self) -> usize {
        if self.double_battle {
            2
        } else {
            1
        }
    }

    pub fn side(&self, side: SideId) -> &BattleSide {
        &self.sides[side.to_index()]
    }

    pub fn side_mut(&mut self, side: SideId) -> &mut BattleSide {
        &mut self.sides[side.to_index()]
    }

    /// The Pokemon currently in a field slot, fainted or not.
    pub fn pokemon(&self, index: BattlerIndex) -> Option<&PokemonInst> {
        self.side(index.side).active_pokemon(index.slot)
    }

    pub fn pokemon_mut(&mut self, index: BattlerIndex) -> Option<&mut PokemonInst> {
        let side = self.side_mut(index.side);
        let team_index = (*side.active.get(index.slot)?)?;
        side.team.get_mut(team_index)
    }

    /// Every occupied slot holding a conscious Pokemon, player side first.
    pub fn active_battlers(&self) -> Vec<BattlerIndex> {
        let mut battlers = Vec::new();
        for side in SideId::ALL {
            for slot in 0..self.side(side).active.len() {
                let index = BattlerIndex::new(side, slot);
                if self.pokemon(index).is_some_and(|p| !p.is_fainted()) {
                    battlers.push(index);
                }
            }
        }
        battlers
    }

    /// True if the slot still holds the same conscious Pokemon.
    pub fn is_active(&self, index: BattlerIndex, pokemon_id: u32) -> bool {
        self.pokemon(index)
            .is_some_and(|p| p.id == pokemon_id && !p.is_fainted())
    }

    pub fn battler_by_id(&self, pokemon_id: u32) -> Option<BattlerIndex> {
        self.active_battlers()
            .into_iter()
            .find(|index| self.pokemon(*index).is_some_and(|p| p.id == pokemon_id))
    }

    /// Any team member by battle id, on the field or not.
    pub fn pokemon_by_id(&self, pokemon_id: u32) -> Option<&PokemonInst> {
        self.sides
            .iter()
            .flat_map(|side| side.team.iter())
            .find(|pokemon| pokemon.id == pokemon_id)
    }

    pub fn pokemon_by_id_mut(&mut self, pokemon_id: u32) -> Option<&mut PokemonInst> {
        self.sides
            .iter_mut()
            .flat_map(|side| side.team.iter_mut())
            .find(|pokemon| pokemon.id == pokemon_id)
    }

    pub fn opponents_of(&self, index: BattlerIndex) -> Vec<BattlerIndex> {
        self.active_battlers()
            .into_iter()
            .filter(|other| other.side != index.side)
            .collect()
    }

    pub fn allies_of(&self, index: BattlerIndex) -> Vec<BattlerIndex> {
        self.active_battlers()
            .into_iter()
            .filter(|other| other.side == index.side && *other != index)
            .collect()
    }

    pub fn is_wild(&self) -> bool {
        self.battle_type == BattleType::Wild
    }

    pub fn is_over(&self) -> bool {
        matches!(self.game_state, GameState::Ended(_))
    }

    /// Outcome if one side has nothing left to fight with. Wild Pokemon never
    /// come off a bench, so only the field counts for a wild enemy side.
    pub fn check_win_condition(&self) -> Option<BattleOutcome> {
        let player_left = self.side(SideId::Player).has_remaining();
        let enemy_left = if self.is_wild() {
            self.active_battlers()
                .iter()
                .any(|index| index.side == SideId::Enemy)
        } else {
            self.side(SideId::Enemy).has_remaining()
        };
        match (player_left, enemy_left) {
            (true, true) => None,
            (true, false) => Some(BattleOutcome::PlayerWon),
            (false, true) => Some(BattleOutcome::EnemyWon),
            (false, false) => Some(BattleOutcome::Draw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use pretty_assertions::assert_eq;

    fn mon(species: Species) -> PokemonInst {
        PokemonInst::new(species, 50, &[MoveId::Tackle]).unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_slots_filled() {
        let state = BattleState::new(
            BattleType::Trainer,
            true,
            vec![mon(Species::Pikachu), mon(Species::Eevee), mon(Species::Mew)],
            vec![mon(Species::Snorlax)],
        )
        .unwrap();

        let ids: Vec<u32> = state
            .sides
            .iter()
            .flat_map(|side| side.team.iter().map(|p| p.id))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(state.side(SideId::Player).active, vec![Some(0), Some(1)]);
        assert_eq!(state.side(SideId::Enemy).active, vec![Some(0), None]);
        assert_eq!(state.side(SideId::Player).bench_candidates(), vec![2]);
        assert_eq!(state.active_battlers().len(), 3);
    }

    #[test]
    fn test_empty_team_is_rejected() {
        let result = BattleState::new(BattleType::Wild, false, vec![], vec![mon(Species::Mew)]);
        assert_eq!(result.unwrap_err(), BattleStateError::EmptyTeam.into());
    }

    #[test]
    fn test_win_condition() {
        let mut state = BattleState::new(
            BattleType::Wild,
            false,
            vec![mon(Species::Pikachu)],
            vec![mon(Species::Magikarp)],
        )
        .unwrap();
        assert_eq!(state.check_win_condition(), None);
        let enemy = BattlerIndex::new(SideId::Enemy, 0);
        state.pokemon_mut(enemy).unwrap().set_hp(0);
        assert_eq!(state.check_win_condition(), Some(BattleOutcome::PlayerWon));
    }
}
