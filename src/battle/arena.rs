use serde::{Deserialize, Serialize};

use crate::battle::commands::{BattleCommand, DamageSource};
use crate::battle::events::{Actor, BattleEvent};
use crate::battle::pipeline::{is_grounded, status_blocked};
use crate::battle::state::{BattleState, BattlerIndex, SideId};
use crate::battle::tags::MergePolicy;
use schema::{ArenaTagType, PokemonType, StatusType, TerrainType, WeatherType};

pub const WEATHER_TURNS: u8 = 5;
pub const TERRAIN_TURNS: u8 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherState {
    pub weather: WeatherType,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainState {
    pub terrain: TerrainType,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArenaTag {
    pub tag: ArenaTagType,
    /// `None` for field-wide tags such as Trick Room.
    pub side: Option<SideId>,
    /// Zero means the tag stays until removed.
    pub turns_remaining: u8,
    pub layers: u8,
    pub source_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaTagAddOutcome {
    Added,
    Stacked { layers: u8 },
    Rejected,
    /// Toggle-policy tag was already up and has been removed.
    Removed,
}

/// Merge rule per arena tag kind.
pub fn arena_tag_policy(tag: ArenaTagType) -> MergePolicy {
    match tag {
        ArenaTagType::Spikes => MergePolicy::Stack { max_layers: 3 },
        ArenaTagType::ToxicSpikes => MergePolicy::Stack { max_layers: 2 },
        ArenaTagType::StealthRock => MergePolicy::Stack { max_layers: 1 },
        ArenaTagType::Reflect | ArenaTagType::LightScreen => MergePolicy::Reject,
        ArenaTagType::TrickRoom => MergePolicy::Toggle,
    }
}

pub fn arena_tag_turns(tag: ArenaTagType) -> u8 {
    match tag {
        ArenaTagType::Spikes | ArenaTagType::ToxicSpikes | ArenaTagType::StealthRock => 0,
        ArenaTagType::Reflect | ArenaTagType::LightScreen | ArenaTagType::TrickRoom => 5,
    }
}

pub fn is_field_wide(tag: ArenaTagType) -> bool {
    matches!(tag, ArenaTagType::TrickRoom)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArenaTick {
    pub weather_ended: Option<WeatherType>,
    pub terrain_ended: Option<TerrainType>,
    pub tags_ended: Vec<ArenaTag>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Arena {
    pub weather: Option<WeatherState>,
    pub terrain: Option<TerrainState>,
    tags: Vec<ArenaTag>,
}

impl Arena {
    pub fn weather(&self) -> Option<WeatherType> {
        self.weather.map(|w| w.weather)
    }

    pub fn terrain(&self) -> Option<TerrainType> {
        self.terrain.map(|t| t.terrain)
    }

    /// Starts a weather. Fails if the same weather is already active.
    pub fn set_weather(&mut self, weather: WeatherType, turns: u8) -> bool {
        if self.weather() == Some(weather) {
            return false;
        }
        self.weather = Some(WeatherState {
            weather,
            turns_remaining: turns,
        });
        true
    }

    pub fn clear_weather(&mut self) -> Option<WeatherType> {
        self.weather.take().map(|w| w.weather)
    }

    pub fn set_terrain(&mut self, terrain: TerrainType, turns: u8) -> bool {
        if self.terrain() == Some(terrain) {
            return false;
        }
        self.terrain = Some(TerrainState {
            terrain,
            turns_remaining: turns,
        });
        true
    }

    pub fn clear_terrain(&mut self) -> Option<TerrainType> {
        self.terrain.take().map(|t| t.terrain)
    }

    pub fn get_tag(&self, tag: ArenaTagType, side: Option<SideId>) -> Option<&ArenaTag> {
        self.tags.iter().find(|t| t.tag == tag && t.side == side)
    }

    pub fn has_tag(&self, tag: ArenaTagType, side: Option<SideId>) -> bool {
        self.get_tag(tag, side).is_some()
    }

    pub fn tags(&self) -> &[ArenaTag] {
        &self.tags
    }

    pub fn is_trick_room(&self) -> bool {
        self.has_tag(ArenaTagType::TrickRoom, None)
    }

    pub fn add_tag(
        &mut self,
        tag: ArenaTagType,
        side: Option<SideId>,
        turns: u8,
        source_id: Option<u32>,
    ) -> ArenaTagAddOutcome {
        let existing = self.tags.iter().position(|t| t.tag == tag && t.side == side);
        let Some(position) = existing else {
            self.tags.push(ArenaTag {
                tag,
                side,
                turns_remaining: turns,
                layers: 1,
                source_id,
            });
            return ArenaTagAddOutcome::Added;
        };

        match arena_tag_policy(tag) {
            MergePolicy::Reject => ArenaTagAddOutcome::Rejected,
            MergePolicy::Refresh => {
                self.tags[position].turns_remaining = turns;
                ArenaTagAddOutcome::Added
            }
            MergePolicy::Stack { max_layers } => {
                let existing = &mut self.tags[position];
                if existing.layers >= max_layers {
                    ArenaTagAddOutcome::Rejected
                } else {
                    existing.layers += 1;
                    ArenaTagAddOutcome::Stacked {
                        layers: existing.layers,
                    }
                }
            }
            MergePolicy::Toggle => {
                self.tags.remove(position);
                ArenaTagAddOutcome::Removed
            }
        }
    }

    pub fn remove_tag(&mut self, tag: ArenaTagType, side: Option<SideId>) -> Option<ArenaTag> {
        let position = self.tags.iter().position(|t| t.tag == tag && t.side == side)?;
        Some(self.tags.remove(position))
    }

    /// Counts down weather, terrain and timed tags.
    pub fn tick_turn_end(&mut self) -> ArenaTick {
        let mut tick = ArenaTick::default();

        if let Some(weather) = self.weather.as_mut() {
            if weather.turns_remaining > 0 {
                weather.turns_remaining -= 1;
                if weather.turns_remaining == 0 {
                    tick.weather_ended = self.clear_weather();
                }
            }
        }
        if let Some(terrain) = self.terrain.as_mut() {
            if terrain.turns_remaining > 0 {
                terrain.turns_remaining -= 1;
                if terrain.turns_remaining == 0 {
                    tick.terrain_ended = self.clear_terrain();
                }
            }
        }

        let mut kept = Vec::with_capacity(self.tags.len());
        for mut tag in std::mem::take(&mut self.tags) {
            if tag.turns_remaining > 0 {
                tag.turns_remaining -= 1;
                if tag.turns_remaining == 0 {
                    tick.tags_ended.push(tag);
                    continue;
                }
            }
            kept.push(tag);
        }
        self.tags = kept;
        tick
    }
}

/// Hazard effects applied to a Pokemon entering the field.
pub fn entry_hazard_commands(state: &BattleState, battler: BattlerIndex) -> Vec<BattleCommand> {
    let Some(pokemon) = state.pokemon(battler) else {
        return Vec::new();
    };
    let side = Some(battler.side);
    let max_hp = pokemon.max_hp() as u32;
    let mut commands = Vec::new();

    if let Some(rocks) = state.arena.get_tag(ArenaTagType::StealthRock, side) {
        let effectiveness = PokemonType::effectiveness_against(PokemonType::Rock, pokemon.types());
        let damage = ((max_hp as f32 * effectiveness) / 8.0).floor().max(1.0) as u16;
        if rocks.layers > 0 {
            commands.push(BattleCommand::DealDamage {
                target: battler,
                amount: damage,
                source: DamageSource::Hazard(ArenaTagType::StealthRock),
            });
        }
    }

    if !is_grounded(state, battler, false) {
        return commands;
    }

    if let Some(spikes) = state.arena.get_tag(ArenaTagType::Spikes, side) {
        let divisor = 10 - 2 * spikes.layers.min(3) as u32;
        commands.push(BattleCommand::DealDamage {
            target: battler,
            amount: (max_hp / divisor).max(1) as u16,
            source: DamageSource::Hazard(ArenaTagType::Spikes),
        });
    }

    if let Some(toxic_spikes) = state.arena.get_tag(ArenaTagType::ToxicSpikes, side) {
        if pokemon.has_type(PokemonType::Poison) {
            commands.push(BattleCommand::RemoveArenaTag {
                tag: ArenaTagType::ToxicSpikes,
                side,
            });
            commands.push(BattleCommand::EmitEvent(BattleEvent::HazardAbsorbed {
                actor: Actor::new(battler, pokemon),
                tag: ArenaTagType::ToxicSpikes,
            }));
        } else {
            let status = if toxic_spikes.layers >= 2 {
                StatusType::Toxic
            } else {
                StatusType::Poison
            };
            if pokemon.status.is_none() && status_blocked(state, battler, status, false).is_none() {
                commands.push(BattleCommand::InflictStatus {
                    target: battler,
                    status,
                });
            }
        }
    }

    commands
}

/// Residual weather damage for one Pokemon, if any.
pub fn weather_damage(state: &BattleState, battler: BattlerIndex) -> Option<BattleCommand> {
    let weather = state.arena.weather()?;
    let pokemon = state.pokemon(battler)?;
    let immune = match weather {
        WeatherType::Sandstorm => [PokemonType::Rock, PokemonType::Ground, PokemonType::Steel]
            .iter()
            .any(|t| pokemon.has_type(*t)),
        WeatherType::Hail => pokemon.has_type(PokemonType::Ice),
        WeatherType::Sun | WeatherType::Rain => true,
    };
    if immune || pokemon.is_fainted() {
        return None;
    }
    Some(BattleCommand::DealDamage {
        target: battler,
        amount: (pokemon.max_hp() / 16).max(1),
        source: DamageSource::Weather(weather),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spikes_stack_to_three_layers() {
        let mut arena = Arena::default();
        let side = Some(SideId::Enemy);
        assert_eq!(arena.add_tag(ArenaTagType::Spikes, side, 0, None), ArenaTagAddOutcome::Added);
        assert_eq!(
            arena.add_tag(ArenaTagType::Spikes, side, 0, None),
            ArenaTagAddOutcome::Stacked { layers: 2 }
        );
        assert_eq!(
            arena.add_tag(ArenaTagType::Spikes, side, 0, None),
            ArenaTagAddOutcome::Stacked { layers: 3 }
        );
        assert_eq!(arena.add_tag(ArenaTagType::Spikes, side, 0, None), ArenaTagAddOutcome::Rejected);
        assert!(!arena.has_tag(ArenaTagType::Spikes, Some(SideId::Player)));
    }

    #[test]
    fn test_stealth_rock_single_layer_and_screens_reject() {
        let mut arena = Arena::default();
        let side = Some(SideId::Player);
        arena.add_tag(ArenaTagType::StealthRock, side, 0, None);
        assert_eq!(
            arena.add_tag(ArenaTagType::StealthRock, side, 0, None),
            ArenaTagAddOutcome::Rejected
        );
        arena.add_tag(ArenaTagType::Reflect, side, 5, None);
        assert_eq!(arena.add_tag(ArenaTagType::Reflect, side, 5, None), ArenaTagAddOutcome::Rejected);
    }

    #[test]
    fn test_trick_room_toggles() {
        let mut arena = Arena::default();
        assert_eq!(arena.add_tag(ArenaTagType::TrickRoom, None, 5, None), ArenaTagAddOutcome::Added);
        assert!(arena.is_trick_room());
        assert_eq!(arena.add_tag(ArenaTagType::TrickRoom, None, 5, None), ArenaTagAddOutcome::Removed);
        assert!(!arena.is_trick_room());
    }

    #[test]
    fn test_tick_expires_weather_terrain_and_timed_tags() {
        let mut arena = Arena::default();
        arena.set_weather(WeatherType::Rain, 2);
        arena.set_terrain(TerrainType::Grassy, 1);
        arena.add_tag(ArenaTagType::LightScreen, Some(SideId::Player), 1, None);
        arena.add_tag(ArenaTagType::Spikes, Some(SideId::Enemy), 0, None);

        let tick = arena.tick_turn_end();
        assert_eq!(tick.weather_ended, None);
        assert_eq!(tick.terrain_ended, Some(TerrainType::Grassy));
        assert_eq!(tick.tags_ended.len(), 1);
        assert_eq!(arena.tags().len(), 1);

        let tick = arena.tick_turn_end();
        assert_eq!(tick.weather_ended, Some(WeatherType::Rain));
        assert_eq!(arena.weather(), None);
    }

    #[test]
    fn test_same_weather_cannot_be_restarted() {
        let mut arena = Arena::default();
        assert!(arena.set_weather(WeatherType::Sun, 5));
        assert!(!arena.set_weather(WeatherType::Sun, 5));
        assert!(arena.set_weather(WeatherType::Rain, 5));
    }
}
