// In: src/lib.rs

//! Pokemon Battle Core
//!
//! Turn-based battle resolution: turn ordering, the move pipeline, ability
//! triggers, battler tags, move-calling moves and escape odds, all driven by
//! a phase queue. Data tables are compiled in; every random draw goes through
//! a seedable generator so battles can be replayed.

// --- MODULE DECLARATIONS ---
pub mod ability_data;
pub mod battle;
pub mod config;
pub mod errors;
pub mod move_data;
pub mod pokemon;
pub mod species;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AbilityId, ArenaTagType, HeldItem, MoveCategory, MoveFlag, MoveId, MoveTarget, PokemonType, Species, StatType,
    StatusType, TerrainType, WeatherType,
};

// --- From this crate's modules (`src/`) ---

// Driving a battle.
pub use battle::controller::BattleController;
pub use battle::events::{BattleEvent, EventBus};
pub use battle::rng::{BattleRng, SeededRng};
pub use battle::state::{BattleOutcome, BattleState, BattleType, BattlerIndex, GameState, QueuedCommand, SideId, TurnCommand};
pub use config::BattleConfig;

// Core runtime types for a battle.
pub use pokemon::{PokemonInst, StatusCondition, UseMode};

// Primary data access functions.
pub use ability_data::get_ability_data;
pub use move_data::get_move_data;
pub use species::get_species_data;

// Crate-specific error and result types.
pub use errors::{
    AbilityDataError, ActionError, BattleEngineError, BattleResult, BattleStateError, ConfigError, MoveDataError,
    MoveDataResult, SnapshotError, SpeciesDataError, SpeciesDataResult,
};
