use serde::{Deserialize, Serialize};

use crate::battle::commands::DamageSource;
use crate::battle::state::{BattleOutcome, BattleState, BattleType, BattlerIndex, SideId, SwitchKind};
use crate::battle::tags::BattlerTagType;
use crate::pokemon::{PokemonInst, UseMode};
use crate::species::species_name;
use schema::{
    AbilityId, ArenaTagType, HeldItem, MoveId, PokemonType, Species, StatType, StatusType,
    TerrainType, WeatherType,
};

/// A Pokemon as it was on the field when the event happened.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub battler: BattlerIndex,
    pub id: u32,
    pub species: Species,
}

impl Actor {
    pub fn new(battler: BattlerIndex, pokemon: &PokemonInst) -> Self {
        Self {
            battler,
            id: pokemon.id,
            species: pokemon.species,
        }
    }

    /// "Pikachu" for the player's side, "The opposing Pikachu" otherwise.
    fn display_name(&self, state: &BattleState) -> String {
        let name = state
            .sides
            .iter()
            .flat_map(|side| side.team.iter())
            .find(|pokemon| pokemon.id == self.id)
            .map(|pokemon| pokemon.name())
            .unwrap_or_else(|| species_name(self.species));
        match self.battler.side {
            SideId::Player => name,
            SideId::Enemy => format!("The opposing {}", name),
        }
    }
}

/// Why an effect did not land on its target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Protect,
    Substitute,
    Terrain(TerrainType),
    Ability(AbilityId),
    Type(PokemonType),
    AlreadyAffected,
    Soundproof,
}

/// Per-target result of one hit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    Effective,
    SuperEffective,
    NotVeryEffective,
    Immune,
    Blocked(BlockReason),
    Miss,
    Fail,
}

impl HitResult {
    pub fn from_effectiveness(multiplier: f32) -> Self {
        if multiplier == 0.0 {
            HitResult::Immune
        } else if multiplier > 1.0 {
            HitResult::SuperEffective
        } else if multiplier < 1.0 {
            HitResult::NotVeryEffective
        } else {
            HitResult::Effective
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(
            self,
            HitResult::Effective | HitResult::SuperEffective | HitResult::NotVeryEffective
        )
    }
}

/// Why a Pokemon could not act this turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventReason {
    Asleep,
    Frozen,
    Recharging,
    Flinched,
    Disabled(MoveId),
    Confused,
    Paralyzed,
    NoPp(MoveId),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Battle and turn flow
    BattleStarted {
        battle_type: BattleType,
        double_battle: bool,
    },
    TurnStarted {
        turn: u32,
    },
    TurnEnded {
        turn: u32,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
    PartySelectionRequested {
        battler: BattlerIndex,
        kind: SwitchKind,
    },

    // Field presence
    PokemonSentOut {
        actor: Actor,
        kind: SwitchKind,
    },
    PokemonWithdrawn {
        actor: Actor,
    },
    Fainted {
        target: Actor,
    },

    // Moves
    MoveUsed {
        actor: Actor,
        move_id: MoveId,
        use_mode: UseMode,
    },
    MoveCalled {
        actor: Actor,
        calling: MoveId,
        called: MoveId,
    },
    MoveFailed {
        actor: Actor,
        move_id: MoveId,
    },
    MoveMissed {
        actor: Actor,
        target: Actor,
    },
    NoTarget {
        actor: Actor,
    },
    ChargingTurn {
        actor: Actor,
        move_id: MoveId,
    },
    HitCount {
        hits: u8,
    },
    CriticalHit {
        target: Actor,
    },
    Effectiveness {
        target: Actor,
        result: HitResult,
    },
    ActionPrevented {
        actor: Actor,
        reason: PreventReason,
    },
    NothingHappened,

    // HP
    DamageDealt {
        target: Actor,
        amount: u16,
        remaining_hp: u16,
        source: DamageSource,
    },
    Healed {
        target: Actor,
        amount: u16,
        remaining_hp: u16,
    },
    Protected {
        target: Actor,
    },
    Endured {
        target: Actor,
    },
    EffectBlocked {
        target: Actor,
        reason: BlockReason,
    },

    // Status and stages
    StatusApplied {
        target: Actor,
        status: StatusType,
    },
    StatusCured {
        target: Actor,
        status: StatusType,
    },
    WokeUp {
        target: Actor,
    },
    StatStageChanged {
        target: Actor,
        stat: StatType,
        delta: i8,
    },
    StatStageUnchanged {
        target: Actor,
        stat: StatType,
        rising: bool,
    },
    StagesReset {
        target: Actor,
    },

    // Volatile tags
    TagAdded {
        target: Actor,
        tag: BattlerTagType,
    },
    TagRemoved {
        target: Actor,
        tag: BattlerTagType,
    },
    TagAlreadyPresent {
        target: Actor,
        tag: BattlerTagType,
    },
    ConfusionEnded {
        target: Actor,
    },
    DisableEnded {
        target: Actor,
        move_id: MoveId,
    },
    SubstituteCreated {
        actor: Actor,
        hp: u16,
    },
    SubstituteTookDamage {
        target: Actor,
        amount: u16,
    },
    SubstituteFaded {
        target: Actor,
    },

    // Field
    WeatherStarted {
        weather: WeatherType,
    },
    WeatherEnded {
        weather: WeatherType,
    },
    TerrainStarted {
        terrain: TerrainType,
    },
    TerrainEnded {
        terrain: TerrainType,
    },
    ArenaTagAdded {
        tag: ArenaTagType,
        side: Option<SideId>,
        layers: u8,
    },
    ArenaTagRemoved {
        tag: ArenaTagType,
        side: Option<SideId>,
    },
    HazardAbsorbed {
        actor: Actor,
        tag: ArenaTagType,
    },

    // Abilities and items
    AbilityActivated {
        actor: Actor,
        ability: AbilityId,
    },
    TypeChanged {
        actor: Actor,
        types: Vec<PokemonType>,
    },
    ItemStolen {
        thief: Actor,
        victim: Actor,
        item: HeldItem,
    },
    ItemKnockedOff {
        target: Actor,
        item: HeldItem,
    },
    ItemActivated {
        actor: Actor,
        item: HeldItem,
    },

    // Escape
    EscapeFailed,
    Fled {
        side: SideId,
    },
}

impl BattleEvent {
    /// Player-facing text for the event, or `None` for bookkeeping events.
    pub fn format(&self, battle_state: &BattleState) -> Option<String> {
        let name = |actor: &Actor| actor.display_name(battle_state);
        match self {
            // === Battle Flow ===
            BattleEvent::BattleStarted { battle_type, .. } => Some(match battle_type {
                BattleType::Wild => "A wild Pokemon appeared!".to_string(),
                BattleType::Trainer => "The battle begins!".to_string(),
            }),
            BattleEvent::TurnStarted { turn } => Some(format!("=== Turn {} ===", turn)),
            BattleEvent::TurnEnded { .. } => None,
            BattleEvent::BattleEnded { outcome } => Some(match outcome {
                BattleOutcome::PlayerWon => "You won the battle!".to_string(),
                BattleOutcome::EnemyWon => "You lost the battle...".to_string(),
                BattleOutcome::PlayerFled => "Got away safely!".to_string(),
                BattleOutcome::EnemyFled => "The wild Pokemon left the battle.".to_string(),
                BattleOutcome::Draw => "The battle ended in a draw.".to_string(),
            }),
            BattleEvent::PartySelectionRequested { .. } => None,

            // === Field Presence ===
            BattleEvent::PokemonSentOut { actor, kind } => Some(match kind {
                SwitchKind::Forced => format!("{} was dragged out!", name(actor)),
                _ => format!("Go! {}!", name(actor)),
            }),
            BattleEvent::PokemonWithdrawn { actor } => {
                Some(format!("{} was withdrawn.", name(actor)))
            }
            BattleEvent::Fainted { target } => Some(format!("{} fainted!", name(target))),

            // === Moves ===
            BattleEvent::MoveUsed { actor, move_id, .. } => {
                Some(format!("{} used {}!", name(actor), move_id))
            }
            BattleEvent::MoveCalled { called, .. } => {
                Some(format!("{} was called!", called))
            }
            BattleEvent::MoveFailed { .. } => Some("But it failed!".to_string()),
            BattleEvent::MoveMissed { target, .. } => {
                Some(format!("{} avoided the attack!", name(target)))
            }
            BattleEvent::NoTarget { .. } => Some("But there was no target...".to_string()),
            BattleEvent::ChargingTurn { actor, move_id } => {
                Some(format!("{} is preparing {}!", name(actor), move_id))
            }
            BattleEvent::HitCount { hits } => Some(format!("Hit {} time(s)!", hits)),
            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::Effectiveness { target, result } => match result {
                HitResult::SuperEffective => Some("It's super effective!".to_string()),
                HitResult::NotVeryEffective => Some("It's not very effective...".to_string()),
                HitResult::Immune => Some(format!("It doesn't affect {}...", name(target))),
                _ => None,
            },
            BattleEvent::ActionPrevented { actor, reason } => Some(match reason {
                PreventReason::Asleep => format!("{} is fast asleep.", name(actor)),
                PreventReason::Frozen => format!("{} is frozen solid!", name(actor)),
                PreventReason::Recharging => format!("{} must recharge!", name(actor)),
                PreventReason::Flinched => format!("{} flinched and couldn't move!", name(actor)),
                PreventReason::Disabled(move_id) => {
                    format!("{}'s {} is disabled!", name(actor), move_id)
                }
                PreventReason::Confused => "It hurt itself in its confusion!".to_string(),
                PreventReason::Paralyzed => {
                    format!("{} is paralyzed! It can't move!", name(actor))
                }
                PreventReason::NoPp(move_id) => {
                    format!("{} has no PP left for {}!", name(actor), move_id)
                }
            }),
            BattleEvent::NothingHappened => Some("But nothing happened!".to_string()),

            // === HP ===
            BattleEvent::DamageDealt {
                target,
                amount,
                source,
                ..
            } => Some(match source {
                DamageSource::Move(_) => format!("{} took {} damage!", name(target), amount),
                DamageSource::Recoil => format!("{} is damaged by recoil!", name(target)),
                DamageSource::Confusion => format!("{} took {} damage!", name(target), amount),
                DamageSource::Weather(weather) => {
                    format!("{} is buffeted by the {}!", name(target), weather)
                }
                DamageSource::Hazard(tag) => {
                    format!("{} was hurt by {}!", name(target), tag)
                }
                DamageSource::Status(status) => {
                    format!("{} is hurt because it is {}!", name(target), status)
                }
                DamageSource::Tag(tag) => format!("{} is hurt by {:?}!", name(target), tag),
                DamageSource::Ability(ability) => {
                    format!("{} was hurt by {}!", name(target), ability)
                }
                DamageSource::Item(item) => format!("{} lost some HP to its {}!", name(target), item),
                DamageSource::SubstituteCost => {
                    format!("{} put some of its HP into a substitute.", name(target))
                }
            }),
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::Protected { target } => {
                Some(format!("{} protected itself!", name(target)))
            }
            BattleEvent::Endured { target } => {
                Some(format!("{} endured the hit!", name(target)))
            }
            BattleEvent::EffectBlocked { target, reason } => Some(match reason {
                BlockReason::Protect => format!("{} protected itself!", name(target)),
                BlockReason::Substitute => format!("The substitute took it instead of {}!", name(target)),
                BlockReason::Terrain(terrain) => {
                    format!("{} is protected by the {}!", name(target), terrain)
                }
                BlockReason::Ability(ability) => {
                    format!("{}'s {} blocks the effect!", name(target), ability)
                }
                BlockReason::Type(pokemon_type) => {
                    format!("{}'s {} typing is unaffected!", name(target), pokemon_type)
                }
                BlockReason::AlreadyAffected => format!("{} is already affected!", name(target)),
                BlockReason::Soundproof => format!("{} cannot hear it!", name(target)),
            }),

            // === Status and Stages ===
            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} is now {}!", name(target), status))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} is no longer {}.", name(target), status))
            }
            BattleEvent::WokeUp { target } => Some(format!("{} woke up!", name(target))),
            BattleEvent::StatStageChanged {
                target,
                stat,
                delta,
            } => {
                let change = match delta {
                    d if *d >= 3 => "rose drastically",
                    2 => "rose sharply",
                    1 => "rose",
                    -1 => "fell",
                    -2 => "harshly fell",
                    _ => "severely fell",
                };
                Some(format!("{}'s {} {}!", name(target), stat, change))
            }
            BattleEvent::StatStageUnchanged {
                target,
                stat,
                rising,
            } => {
                let limit = if *rising { "higher" } else { "lower" };
                Some(format!("{}'s {} won't go any {}!", name(target), stat, limit))
            }
            BattleEvent::StagesReset { target } => {
                Some(format!("{}'s stat changes were removed!", name(target)))
            }

            // === Volatile Tags ===
            BattleEvent::TagAdded { target, tag } => match tag {
                BattlerTagType::Confused => Some(format!("{} became confused!", name(target))),
                BattlerTagType::Seeded => Some(format!("{} was seeded!", name(target))),
                BattlerTagType::Trapped => Some(format!("{} can't escape!", name(target))),
                BattlerTagType::Drowsy => Some(format!("{} grew drowsy!", name(target))),
                BattlerTagType::FocusEnergy => Some(format!("{} is getting pumped!", name(target))),
                BattlerTagType::Disabled => Some(format!("{}'s move was disabled!", name(target))),
                BattlerTagType::SaltCured => Some(format!("{} is being salt cured!", name(target))),
                BattlerTagType::AquaRing => {
                    Some(format!("{} surrounded itself with a veil of water!", name(target)))
                }
                BattlerTagType::Ingrain => Some(format!("{} planted its roots!", name(target))),
                BattlerTagType::Protected => Some(format!("{} protected itself!", name(target))),
                BattlerTagType::Endure => Some(format!("{} braced itself!", name(target))),
                _ => None,
            },
            BattleEvent::TagRemoved { target, tag } => match tag {
                BattlerTagType::Trapped => Some(format!("{} was freed!", name(target))),
                _ => None,
            },
            BattleEvent::TagAlreadyPresent { .. } => Some("But it failed!".to_string()),
            BattleEvent::ConfusionEnded { target } => {
                Some(format!("{} snapped out of its confusion!", name(target)))
            }
            BattleEvent::DisableEnded { target, move_id } => {
                Some(format!("{}'s {} is no longer disabled!", name(target), move_id))
            }
            BattleEvent::SubstituteCreated { actor, .. } => {
                Some(format!("{} put in a substitute!", name(actor)))
            }
            BattleEvent::SubstituteTookDamage { target, .. } => {
                Some(format!("The substitute took damage for {}!", name(target)))
            }
            BattleEvent::SubstituteFaded { target } => {
                Some(format!("{}'s substitute faded!", name(target)))
            }

            // === Field ===
            BattleEvent::WeatherStarted { weather } => Some(format!("The {} started!", weather)),
            BattleEvent::WeatherEnded { weather } => Some(format!("The {} subsided.", weather)),
            BattleEvent::TerrainStarted { terrain } => {
                Some(format!("The {} spread across the battlefield!", terrain))
            }
            BattleEvent::TerrainEnded { terrain } => Some(format!("The {} faded.", terrain)),
            BattleEvent::ArenaTagAdded { tag, side, .. } => Some(match side {
                Some(side) => format!("{} appeared on {}!", tag, side),
                None => format!("{} took effect!", tag),
            }),
            BattleEvent::ArenaTagRemoved { tag, side } => Some(match side {
                Some(side) => format!("{} wore off on {}.", tag, side),
                None => format!("{} wore off.", tag),
            }),
            BattleEvent::HazardAbsorbed { actor, tag } => {
                Some(format!("{} absorbed the {}!", name(actor), tag))
            }

            // === Abilities and Items ===
            BattleEvent::AbilityActivated { .. } => None,
            BattleEvent::TypeChanged { actor, types } => Some(format!(
                "{} became {:?} type!",
                name(actor),
                types
            )),
            BattleEvent::ItemStolen {
                thief,
                victim,
                item,
            } => Some(format!("{} stole {}'s {}!", name(thief), name(victim), item)),
            BattleEvent::ItemKnockedOff { target, item } => {
                Some(format!("{}'s {} was knocked off!", name(target), item))
            }
            BattleEvent::ItemActivated { actor, item } => {
                Some(format!("{}'s {} activated!", name(actor), item))
            }

            // === Escape ===
            BattleEvent::EscapeFailed => Some("Can't escape!".to_string()),
            BattleEvent::Fled { side } => Some(match side {
                SideId::Player => "Got away safely!".to_string(),
                SideId::Enemy => "The wild Pokemon fled!".to_string(),
            }),
        }
    }
}

/// Ordered log of everything that happened while resolving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, other: EventBus) {
        self.events.extend(other.events);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events in debug format with a custom prefix message.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        self.print_debug();
    }

    /// Print all events using their formatted text when available.
    /// Falls back to debug format for silent events.
    pub fn print_formatted(&self, battle_state: &BattleState) {
        for event in &self.events {
            match event.format(battle_state) {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", event),
            }
        }
    }

    pub fn print_formatted_with_message(&self, message: &str, battle_state: &BattleState) {
        println!("{}", message);
        self.print_formatted(battle_state);
    }

    /// Player-facing lines only, in order.
    pub fn formatted_lines(&self, battle_state: &BattleState) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.format(battle_state))
            .collect()
    }

    /// Machine-readable export of the log.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}
