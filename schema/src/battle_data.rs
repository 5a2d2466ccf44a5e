use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum WeatherType {
    Sun,
    Rain,
    Sandstorm,
    Hail,
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            WeatherType::Sun => "harsh sunlight",
            WeatherType::Rain => "rain",
            WeatherType::Sandstorm => "sandstorm",
            WeatherType::Hail => "hail",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TerrainType {
    Electric,
    Grassy,
    Misty,
    Psychic,
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            TerrainType::Electric => "Electric Terrain",
            TerrainType::Grassy => "Grassy Terrain",
            TerrainType::Misty => "Misty Terrain",
            TerrainType::Psychic => "Psychic Terrain",
        };
        write!(f, "{}", display_name)
    }
}

/// Side and field conditions keyed by (tag, side).
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter,
)]
pub enum ArenaTagType {
    Spikes,
    ToxicSpikes,
    StealthRock,
    Reflect,
    LightScreen,
    TrickRoom,
}

impl fmt::Display for ArenaTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            ArenaTagType::Spikes => "Spikes",
            ArenaTagType::ToxicSpikes => "Toxic Spikes",
            ArenaTagType::StealthRock => "Stealth Rock",
            ArenaTagType::Reflect => "Reflect",
            ArenaTagType::LightScreen => "Light Screen", // Use a space for better readability
            ArenaTagType::TrickRoom => "Trick Room",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum HeldItem {
    WideLens,
    BrightPowder,
    ChoiceScarf,
    QuickClaw,
    Leftovers,
    LifeOrb,
    SitrusBerry,
}

impl fmt::Display for HeldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            HeldItem::WideLens => "Wide Lens",
            HeldItem::BrightPowder => "Bright Powder",
            HeldItem::ChoiceScarf => "Choice Scarf",
            HeldItem::QuickClaw => "Quick Claw",
            HeldItem::Leftovers => "Leftovers",
            HeldItem::LifeOrb => "Life Orb",
            HeldItem::SitrusBerry => "Sitrus Berry",
        };
        write!(f, "{}", display_name)
    }
}
