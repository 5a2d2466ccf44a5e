//! Save and resume support for battles paused between turns.

use crate::battle::state::{BattleState, GameState};
use crate::errors::SnapshotError;

fn ensure_turn_boundary(state: &BattleState) -> Result<(), SnapshotError> {
    match state.game_state {
        GameState::AwaitingCommands => Ok(()),
        _ => Err(SnapshotError::NotAtTurnBoundary),
    }
}

/// Compact binary snapshot.
pub fn to_bytes(state: &BattleState) -> Result<Vec<u8>, SnapshotError> {
    ensure_turn_boundary(state)?;
    postcard::to_allocvec(state).map_err(|e| SnapshotError::Encode(e.to_string()))
}

pub fn from_bytes(bytes: &[u8]) -> Result<BattleState, SnapshotError> {
    let state: BattleState = postcard::from_bytes(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    ensure_turn_boundary(&state)?;
    Ok(state)
}

/// Human-readable snapshot, for debugging and save inspection.
pub fn to_json(state: &BattleState) -> Result<String, SnapshotError> {
    ensure_turn_boundary(state)?;
    serde_json::to_string_pretty(state).map_err(|e| SnapshotError::Encode(e.to_string()))
}

pub fn from_json(json: &str) -> Result<BattleState, SnapshotError> {
    let state: BattleState = serde_json::from_str(json).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    ensure_turn_boundary(&state)?;
    Ok(state)
}
