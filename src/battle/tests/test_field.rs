#[cfg(test)]
mod tests {
    use crate::battle::controller::BattleController;
    use crate::battle::events::{BattleEvent, BlockReason};
    use crate::battle::state::BattleType;
    use crate::battle::tags::BattlerTagType;
    use crate::battle::tests::common::{create_test_battle, fight, has_event, TestPokemonBuilder, ENEMY};
    use crate::config::BattleConfig;
    use crate::species::Species;
    use pretty_assertions::assert_eq;
    use schema::{MoveId, StatusType, TerrainType, WeatherType};

    #[test]
    fn test_psychic_terrain_blocks_priority_moves() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::QuickAttack])
            .build();
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(snorlax, pikachu);
        battle.state_mut().arena.set_terrain(TerrainType::Psychic, 5);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::EffectBlocked {
                reason: BlockReason::Terrain(TerrainType::Psychic),
                ..
            }
        )));
        let pikachu = battle.state().pokemon(ENEMY).unwrap();
        assert_eq!(pikachu.current_hp(), pikachu.max_hp());
    }

    #[test]
    fn test_electric_terrain_prevents_sleep() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Spore])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle.state_mut().arena.set_terrain(TerrainType::Electric, 5);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::EffectBlocked {
                reason: BlockReason::Terrain(TerrainType::Electric),
                ..
            }
        )));
        assert_eq!(battle.state().pokemon(ENEMY).unwrap().status, None);
    }

    #[test]
    fn test_misty_terrain_shields_grounded_pokemon_from_status_and_confusion() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Toxic, MoveId::ConfuseRay])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle.state_mut().arena.set_terrain(TerrainType::Misty, 5);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::EffectBlocked {
                reason: BlockReason::Terrain(TerrainType::Misty),
                ..
            }
        )));
        assert_eq!(battle.state().pokemon(ENEMY).unwrap().status, None);

        let bus = battle.submit_commands(fight(1)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::EffectBlocked {
                reason: BlockReason::Terrain(TerrainType::Misty),
                ..
            }
        )));
        assert!(!battle.state().pokemon(ENEMY).unwrap().tags.has(BattlerTagType::Confused));
    }

    #[test]
    fn test_misty_terrain_does_not_shield_flying_pokemon() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Toxic, MoveId::ConfuseRay])
            .build();
        let gyarados = TestPokemonBuilder::new(Species::Gyarados, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, gyarados);
        battle.state_mut().arena.set_terrain(TerrainType::Misty, 5);

        battle.submit_commands(fight(0)).unwrap();
        assert!(battle.state().pokemon(ENEMY).unwrap().has_status(StatusType::Toxic));

        let bus = battle.submit_commands(fight(1)).unwrap();
        assert!(!has_event(&bus, |event| matches!(event, BattleEvent::EffectBlocked { .. })));
        assert!(battle.state().pokemon(ENEMY).unwrap().tags.has(BattlerTagType::Confused));
    }

    #[test]
    fn test_weather_move_fails_when_weather_is_already_up() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::RainDance, MoveId::SunnyDay])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle.state_mut().arena.set_weather(WeatherType::Rain, 5);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::RainDance,
                ..
            }
        )));

        let bus = battle.submit_commands(fight(1)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::WeatherStarted {
                weather: WeatherType::Sun
            }
        )));
        assert_eq!(battle.state().arena.weather(), Some(WeatherType::Sun));
    }

    #[test]
    fn test_config_sets_up_the_starting_field() {
        let config = BattleConfig {
            seed: Some(1),
            battle_type: BattleType::Trainer,
            starting_weather: Some(WeatherType::Sun),
            starting_terrain: Some(TerrainType::Grassy),
            max_call_depth: 2,
            ..BattleConfig::default()
        };
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50).build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();

        let battle = BattleController::new(&config, vec![pikachu], vec![snorlax]).unwrap();

        let state = battle.state();
        assert_eq!(state.arena.weather(), Some(WeatherType::Sun));
        assert_eq!(state.arena.terrain(), Some(TerrainType::Grassy));
        assert_eq!(state.max_call_depth, 2);
        assert_eq!(state.battle_type, BattleType::Trainer);
    }
}
