pub mod abilities;
pub mod arena;
pub mod calculators;
pub mod commands;
pub mod controller;
pub mod escape;
pub mod events;
pub mod move_calling;
pub mod phases;
pub mod pipeline;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod tags;

#[cfg(test)]
mod tests;
