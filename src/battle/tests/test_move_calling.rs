#[cfg(test)]
mod tests {
    use crate::battle::events::BattleEvent;
    use crate::battle::move_calling::CallingMove;
    use crate::move_data::all_moves;
    use crate::battle::tests::common::{
        create_test_battle, fight, has_event, moves_used, TestPokemonBuilder, ENEMY, PLAYER,
    };
    use crate::pokemon::{StatusCondition, UseMode};
    use crate::species::Species;
    use pretty_assertions::assert_eq;
    use schema::{MoveId, StatType, WeatherType};
    use strum::IntoEnumIterator;

    #[test]
    fn test_mirror_move_repeats_the_last_move_aimed_at_the_user() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::MirrorMove])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50).build();
        let mut battle = create_test_battle(snorlax, regieleki);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveCalled {
                calling: MoveId::MirrorMove,
                called: MoveId::Tackle,
                ..
            }
        )));
        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::Tackle, UseMode::FollowUp)));
        let regieleki = battle.state().pokemon(ENEMY).unwrap();
        assert!(regieleki.current_hp() < regieleki.max_hp());
    }

    #[test]
    fn test_mirror_move_fails_without_a_move_to_copy() {
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::MirrorMove])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let mut battle = create_test_battle(regieleki, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::MirrorMove,
                ..
            }
        )));
        assert!(!has_event(&bus, |event| matches!(event, BattleEvent::MoveCalled { .. })));
    }

    #[test]
    fn test_copycat_uses_the_last_move_in_battle() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Copycat])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::Growl])
            .build();
        let mut battle = create_test_battle(snorlax, regieleki);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveCalled {
                calling: MoveId::Copycat,
                called: MoveId::Growl,
                ..
            }
        )));
        let state = battle.state();
        assert_eq!(state.pokemon(ENEMY).unwrap().stat_stages.get(StatType::Atk), -1);
        assert_eq!(state.pokemon(PLAYER).unwrap().stat_stages.get(StatType::Atk), -1);
        assert_eq!(state.last_move, Some(MoveId::Growl));
    }

    #[test]
    fn test_interrupted_move_is_not_copied() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Copycat])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::Growl])
            .with_status(StatusCondition::Sleep { turns_remaining: 3 })
            .build();
        let mut battle = create_test_battle(snorlax, regieleki);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::Copycat,
                ..
            }
        )));
        assert_eq!(battle.state().last_move, None);
    }

    #[test]
    fn test_move_that_failed_after_starting_is_still_copied() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Copycat])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::RainDance])
            .build();
        let mut battle = create_test_battle(snorlax, regieleki);
        battle.state_mut().arena.set_weather(WeatherType::Rain, 5);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::RainDance,
                ..
            }
        )));
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveCalled {
                calling: MoveId::Copycat,
                called: MoveId::RainDance,
                ..
            }
        )));
        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::RainDance, UseMode::FollowUp)));
    }

    #[test]
    fn test_call_depth_limit_fails_the_call() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Metronome])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle.state_mut().max_call_depth = 0;

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::Metronome,
                ..
            }
        )));
        assert!(!has_event(&bus, |event| matches!(event, BattleEvent::MoveCalled { .. })));
    }

    #[test]
    fn test_metronome_never_offers_banned_moves() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Metronome])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let battle = create_test_battle(pikachu, snorlax);

        let candidates = CallingMove::Metronome.candidates(battle.state(), PLAYER);

        assert!(candidates.contains(&MoveId::Tackle));
        for banned in [
            MoveId::Metronome,
            MoveId::SleepTalk,
            MoveId::Assist,
            MoveId::MirrorMove,
            MoveId::Copycat,
            MoveId::Struggle,
            MoveId::Protect,
            MoveId::SacredFire,
            MoveId::RelicSong,
            MoveId::DarkVoid,
            MoveId::None,
        ] {
            assert!(!candidates.contains(&banned), "{:?} offered", banned);
        }
    }

    #[test]
    fn test_banned_moves_are_never_selectable_across_the_move_table() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Metronome])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let metronome = CallingMove::Metronome.candidates(battle.state(), PLAYER);
        let expected: Vec<MoveId> = all_moves()
            .into_iter()
            .filter(|id| !CallingMove::Metronome.is_banned(*id))
            .collect();
        assert_eq!(metronome, expected);

        for move_id in MoveId::iter() {
            battle.state_mut().last_move = Some(move_id);
            let copycat = CallingMove::Copycat.candidates(battle.state(), PLAYER);
            assert_eq!(copycat.is_empty(), CallingMove::Copycat.is_banned(move_id), "{:?}", move_id);
        }
    }

    #[test]
    fn test_sleep_talk_calls_a_known_move_while_asleep() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::SleepTalk, MoveId::Tackle])
            .with_status(StatusCondition::Sleep { turns_remaining: 3 })
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveCalled {
                calling: MoveId::SleepTalk,
                called: MoveId::Tackle,
                ..
            }
        )));
        let state = battle.state();
        let snorlax = state.pokemon(ENEMY).unwrap();
        assert!(snorlax.current_hp() < snorlax.max_hp());
        let pikachu = state.pokemon(PLAYER).unwrap();
        assert_eq!(pikachu.status, Some(StatusCondition::Sleep { turns_remaining: 2 }));
    }

    #[test]
    fn test_called_move_in_the_moveset_spends_its_own_pp_once() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::SleepTalk, MoveId::Tackle])
            .with_status(StatusCondition::Sleep { turns_remaining: 3 })
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::Tackle, UseMode::FollowUp)));
        let pikachu = battle.state().pokemon(PLAYER).unwrap();
        let sleep_talk = &pikachu.moves[0];
        let tackle = &pikachu.moves[1];
        assert_eq!(sleep_talk.pp, sleep_talk.max_pp - 1);
        assert_eq!(tackle.pp, tackle.max_pp - 1);
    }

    #[test]
    fn test_called_move_outside_the_moveset_spends_no_other_pp() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::MirrorMove, MoveId::Splash])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50).build();
        let mut battle = create_test_battle(snorlax, regieleki);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::Tackle, UseMode::FollowUp)));
        let snorlax = battle.state().pokemon(PLAYER).unwrap();
        assert_eq!(snorlax.moves.len(), 2);
        let mirror_move = &snorlax.moves[0];
        let splash = &snorlax.moves[1];
        assert_eq!(mirror_move.pp, mirror_move.max_pp - 1);
        assert_eq!(splash.pp, splash.max_pp);
    }

    #[test]
    fn test_sleep_talk_fails_when_awake() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::SleepTalk, MoveId::Tackle])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::SleepTalk,
                ..
            }
        )));
    }
}
