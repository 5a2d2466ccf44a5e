use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, FromRepr};

/// Stable ability identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, FromRepr,
)]
#[repr(u16)]
pub enum AbilityId {
    None = 0,
    Dancer = 1,
    NeutralizingGas = 2,
    MoldBreaker = 3,
    Infiltrator = 4,
    Prankster = 5,
    QuickDraw = 6,
    Intimidate = 7,
    Drizzle = 8,
    Drought = 9,
    SandStream = 10,
    ElectricSurge = 11,
    GrassySurge = 12,
    MistySurge = 13,
    PsychicSurge = 14,
    Insomnia = 15,
    Limber = 16,
    OwnTempo = 17,
    Levitate = 18,
    VoltAbsorb = 19,
    WaterAbsorb = 20,
    Soundproof = 21,
    RoughSkin = 22,
    Static = 23,
    PoisonTouch = 24,
    Moxie = 25,
    SpeedBoost = 26,
    ClearBody = 27,
    Defiant = 28,
    SwiftSwim = 29,
    Chlorophyll = 30,
    RunAway = 31,
    NoGuard = 32,
    CompoundEyes = 33,
    Aftermath = 34,
    Regenerator = 35,
    NaturalCure = 36,
    Protean = 37,
    Forecast = 38,
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
