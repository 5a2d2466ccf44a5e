use crate::species::Species;
use schema::{AbilityId, MoveId};
use thiserror::Error;

/// Main error type for the battle engine.
///
/// In-battle outcomes (misses, failures, immunities) are never errors; they are
/// reported through events and `MoveResult`. Everything here is either rejected
/// input or a mismatch between the engine and its data tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Error related to move data lookup or processing
    #[error("Move data error: {0}")]
    MoveData(#[from] MoveDataError),
    /// Error related to ability data lookup
    #[error("Ability data error: {0}")]
    AbilityData(#[from] AbilityDataError),
    /// Error related to species data lookup or processing
    #[error("Species data error: {0}")]
    SpeciesData(#[from] SpeciesDataError),
    /// Error related to invalid battle state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error related to invalid player actions
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors related to move data operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveDataError {
    /// The specified move was not found in the database
    #[error("Move not found: {0:?}")]
    MoveNotFound(MoveId),
    /// Raw id does not map to any move
    #[error("Invalid move reference: {0}")]
    InvalidMoveReference(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityDataError {
    #[error("Ability not found: {0:?}")]
    AbilityNotFound(AbilityId),
    #[error("Invalid ability reference: {0}")]
    InvalidAbilityReference(u16),
}

/// Errors related to species data operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeciesDataError {
    /// The specified species was not found in the database
    #[error("Species not found: {0:?}")]
    SpeciesNotFound(Species),
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    /// No active Pokemon found when one was expected
    #[error("No active Pokemon found")]
    NoActivePokemon,
    #[error("Team is empty")]
    EmptyTeam,
    #[error("Team has {0} members; at most 6 are allowed")]
    TeamTooLarge(usize),
    /// Battle state is in an inconsistent or corrupted state
    #[error("Inconsistent battle state: {0}")]
    InconsistentState(String),
}

/// Errors related to player input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Move index is out of bounds
    #[error("Invalid move index: {0}")]
    InvalidMoveIndex(usize),
    #[error("Move {0:?} has no PP left")]
    NoPpRemaining(MoveId),
    #[error("Move {0:?} is disabled")]
    MoveDisabled(MoveId),
    /// Pokemon index is out of bounds
    #[error("Invalid Pokemon index: {0}")]
    InvalidPokemonIndex(usize),
    #[error("Pokemon at index {0} has fainted")]
    FaintedSwitchTarget(usize),
    #[error("Pokemon at index {0} is already in battle")]
    AlreadyActive(usize),
    #[error("The active Pokemon is trapped and cannot switch out or flee")]
    Trapped,
    #[error("There is no running from a trainer battle")]
    CannotFleeTrainerBattle,
    #[error("No command is expected for field slot {0}")]
    UnexpectedBattler(usize),
    #[error("Missing command for field slot {0}")]
    MissingCommand(usize),
    /// Action is not valid in the current battle state
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// Malformed external configuration. Detected at load time; the battle falls
/// back to defaults instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(String),
    #[error("could not parse config: {0}")]
    Parse(String),
    #[error("max_call_depth must be within 1..=8, got {0}")]
    InvalidCallDepth(u8),
    #[error("custom seed {0:?} must be 1-32 ASCII alphanumeric characters")]
    InvalidCustomSeed(String),
    #[error("{0} turn count must be non-zero")]
    ZeroDuration(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshots can only be taken while awaiting commands")]
    NotAtTurnBoundary,
    #[error("could not encode snapshot: {0}")]
    Encode(String),
    #[error("could not decode snapshot: {0}")]
    Decode(String),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using MoveDataError
pub type MoveDataResult<T> = Result<T, MoveDataError>;

pub type AbilityDataResult<T> = Result<T, AbilityDataError>;

/// Type alias for Results using SpeciesDataError
pub type SpeciesDataResult<T> = Result<T, SpeciesDataError>;
