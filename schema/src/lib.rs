// Pokemon Battle Core Schema - Shared type definitions
// This crate holds the stable-ID enums shared between the static data tables
// and the battle engine. Every ID round-trips through its `u16` repr so
// snapshots and external tables can refer to moves, abilities and species
// by number.

// Re-export the main types
pub use ability_types::*;
pub use battle_data::*;
pub use move_types::*;
pub use pokemon_types::*;
pub use species::*;

pub mod ability_types;
pub mod battle_data;
pub mod move_types;
pub mod pokemon_types;
pub mod species;
