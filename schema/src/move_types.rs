use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, FromRepr};

/// Stable move identifiers. The discriminant is the table key and never changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, FromRepr,
)]
#[repr(u16)]
pub enum MoveId {
    None = 0,
    // Damaging moves
    Tackle = 1,
    QuickAttack = 2,
    ExtremeSpeed = 3,
    BodySlam = 4,
    Bite = 5,
    Ember = 6,
    Flamethrower = 7,
    SacredFire = 8,
    WaterGun = 9,
    Surf = 10,
    Thunderbolt = 11,
    Nuzzle = 12,
    IceBeam = 13,
    SludgeBomb = 14,
    Earthquake = 15,
    EchoedVoice = 16,
    HyperVoice = 17,
    RelicSong = 18,
    FieryDance = 19,
    GigaImpact = 20,
    Dig = 21,
    Fly = 22,
    Outrage = 23,
    Bind = 24,
    Wrap = 25,
    DragonTail = 26,
    Thief = 27,
    KnockOff = 28,
    ClearSmog = 29,
    Counter = 30,
    SeismicToss = 31,
    DoubleKick = 32,
    BulletSeed = 33,
    Slash = 34,
    FakeOut = 35,
    Swift = 36,
    SaltCure = 37,
    // Status moves
    Growl = 38,
    Charm = 39,
    SwordsDance = 40,
    FeatherDance = 41,
    DragonDance = 42,
    TeeterDance = 43,
    QuiverDance = 44,
    Spore = 45,
    DarkVoid = 46,
    Toxic = 47,
    ThunderWave = 48,
    ConfuseRay = 49,
    Yawn = 50,
    LeechSeed = 51,
    FocusEnergy = 52,
    AquaRing = 53,
    Ingrain = 54,
    Disable = 55,
    Protect = 56,
    Detect = 57,
    Endure = 58,
    Recover = 59,
    Substitute = 60,
    ShedTail = 61,
    BatonPass = 62,
    Roar = 63,
    Whirlwind = 64,
    Splash = 65,
    // Move-calling moves
    Metronome = 66,
    SleepTalk = 67,
    Assist = 68,
    MirrorMove = 69,
    Copycat = 70,
    // Field moves
    TrickRoom = 71,
    RainDance = 72,
    SunnyDay = 73,
    Sandstorm = 74,
    Hail = 75,
    ElectricTerrain = 76,
    GrassyTerrain = 77,
    MistyTerrain = 78,
    PsychicTerrain = 79,
    Spikes = 80,
    ToxicSpikes = 81,
    StealthRock = 82,
    Reflect = 83,
    LightScreen = 84,
    Struggle = 85,
}

impl MoveId {
    pub fn id(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// Target pattern expanded against the field at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum MoveTarget {
    User,
    /// One adjacent Pokemon, ally or foe.
    NearOther,
    NearEnemy,
    RandomNearEnemy,
    NearAlly,
    AllNearEnemies,
    AllNearOthers,
    UserSide,
    EnemySide,
    BothSides,
}

impl MoveTarget {
    /// Patterns that resolve to a single chosen battler.
    pub fn is_single_target(self) -> bool {
        matches!(
            self,
            MoveTarget::NearOther | MoveTarget::NearEnemy | MoveTarget::NearAlly
        )
    }

    /// Patterns that affect a side or the whole field rather than battlers.
    pub fn is_field_target(self) -> bool {
        matches!(
            self,
            MoveTarget::UserSide | MoveTarget::EnemySide | MoveTarget::BothSides
        )
    }

    pub fn is_spread(self) -> bool {
        matches!(self, MoveTarget::AllNearEnemies | MoveTarget::AllNearOthers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum MoveFlag {
    Contact,
    Sound,
    Dance,
    Punch,
    IgnoreProtect,
    IgnoreSubstitute,
    /// Usable while the user is asleep.
    BypassSleep,
    /// Exclusive to one species; Metronome never picks it.
    Signature,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
pub enum StatType {
    Atk,
    Def,
    SpAtk,
    SpDef,
    Spe,
    Acc,
    Eva,
    Crit,
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Atk => write!(f, "Attack"),
            StatType::Def => write!(f, "Defense"),
            StatType::SpAtk => write!(f, "Special Attack"),
            StatType::SpDef => write!(f, "Special Defense"),
            StatType::Spe => write!(f, "Speed"),
            StatType::Acc => write!(f, "accuracy"),
            StatType::Eva => write!(f, "evasiveness"),
            StatType::Crit => write!(f, "critical-hit ratio"),
        }
    }
}

/// Non-volatile status kinds, without their counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum StatusType {
    Sleep,
    Poison,
    Toxic,
    Burn,
    Freeze,
    Paralysis,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusType::Sleep => "asleep",
            StatusType::Poison => "poisoned",
            StatusType::Toxic => "badly poisoned",
            StatusType::Burn => "burned",
            StatusType::Freeze => "frozen",
            StatusType::Paralysis => "paralyzed",
        };
        write!(f, "{}", name)
    }
}
