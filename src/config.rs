//! Battle setup loaded from RON.
//!
//! A malformed file never stops a battle: `load_or_default` logs the problem
//! and hands back the defaults.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::arena::{TERRAIN_TURNS, WEATHER_TURNS};
use crate::battle::state::BattleType;
use crate::errors::ConfigError;
use schema::{TerrainType, WeatherType};

const MAX_CALL_DEPTH_LIMIT: u8 = 8;
const MAX_CUSTOM_SEED_LEN: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BattleConfig {
    /// Fixed RNG seed. `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Daily-seed style string, hashed into the numeric seed when present.
    pub custom_seed: Option<String>,
    pub battle_type: BattleType,
    pub double_battle: bool,
    pub starting_weather: Option<WeatherType>,
    pub weather_turns: u8,
    pub starting_terrain: Option<TerrainType>,
    pub terrain_turns: u8,
    /// How many calling moves may nest before the innermost one fails.
    pub max_call_depth: u8,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: None,
            custom_seed: None,
            battle_type: BattleType::Wild,
            double_battle: false,
            starting_weather: None,
            weather_turns: WEATHER_TURNS,
            starting_terrain: None,
            terrain_turns: TERRAIN_TURNS,
            max_call_depth: 3,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Loads `path`, falling back to the defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Invalid battle config {}: {}; using defaults", path.display(), err);
                Self::default()
            }
        }
    }

    /// Same fallback as `load_or_default` for config that is already in memory.
    pub fn parse_or_default(content: &str) -> Self {
        Self::from_ron_str(content).unwrap_or_else(|err| {
            warn!("Invalid battle config: {}; using defaults", err);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 || self.max_call_depth > MAX_CALL_DEPTH_LIMIT {
            return Err(ConfigError::InvalidCallDepth(self.max_call_depth));
        }
        if let Some(custom) = &self.custom_seed {
            let well_formed = !custom.is_empty()
                && custom.len() <= MAX_CUSTOM_SEED_LEN
                && custom.chars().all(|c| c.is_ascii_alphanumeric());
            if !well_formed {
                return Err(ConfigError::InvalidCustomSeed(custom.clone()));
            }
        }
        if self.weather_turns == 0 {
            return Err(ConfigError::ZeroDuration("weather"));
        }
        if self.terrain_turns == 0 {
            return Err(ConfigError::ZeroDuration("terrain"));
        }
        Ok(())
    }

    /// Seed the battle RNG should start from. A custom seed wins over `seed`.
    pub fn resolved_seed(&self) -> Option<u64> {
        match &self.custom_seed {
            Some(custom) => Some(hash_custom_seed(custom)),
            None => self.seed,
        }
    }
}

/// 64-bit FNV-1a over the seed string's bytes.
pub fn hash_custom_seed(custom: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    custom
        .bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}
