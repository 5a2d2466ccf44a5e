#[cfg(test)]
mod tests {
    use crate::battle::events::BattleEvent;
    use crate::battle::state::{BattleOutcome, BattleType, GameState, SideId, SwitchKind, TurnCommand};
    use crate::battle::tests::common::{
        create_battle, fight, has_event, moves_used, player_command, TestPokemonBuilder, ENEMY, PLAYER,
    };
    use crate::species::Species;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use schema::{MoveId, StatType};

    fn pikachu_and_eevee(first_move: MoveId) -> Vec<crate::pokemon::PokemonInst> {
        vec![
            TestPokemonBuilder::new(Species::Pikachu, 50)
                .with_moves(vec![first_move])
                .build(),
            TestPokemonBuilder::new(Species::Eevee, 50).build(),
        ]
    }

    #[test]
    fn test_switch_resolves_before_moves() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let (mut battle, _) = create_battle(BattleType::Trainer, pikachu_and_eevee(MoveId::Tackle), vec![snorlax]);

        let bus = battle
            .submit_commands(player_command(TurnCommand::Switch { team_index: 1 }))
            .unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::PokemonSentOut {
                kind: SwitchKind::Normal,
                actor,
            } if actor.species == Species::Eevee
        )));
        let side = battle.state().side(SideId::Player);
        assert_eq!(side.active, vec![Some(1)]);
        assert_eq!(side.team[0].current_hp(), side.team[0].max_hp());
        assert!(side.team[1].current_hp() < side.team[1].max_hp());
    }

    #[test]
    fn test_baton_pass_hands_over_stat_stages() {
        let mut team = pikachu_and_eevee(MoveId::BatonPass);
        team[0].stat_stages.change(StatType::Atk, 2);
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let (mut battle, _) = create_battle(BattleType::Trainer, team, vec![snorlax]);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::PartySelectionRequested {
                kind: SwitchKind::BatonPass,
                ..
            }
        )));
        assert_eq!(
            battle.state().game_state,
            GameState::AwaitingPartySelection {
                battler: PLAYER,
                kind: SwitchKind::BatonPass,
            }
        );

        let bus = battle.submit_party_selection(1).unwrap();

        let eevee = battle.state().pokemon(PLAYER).unwrap();
        assert_eq!(eevee.species, Species::Eevee);
        assert_eq!(eevee.stat_stages.get(StatType::Atk), 2);
        assert_eq!(battle.state().side(SideId::Player).team[0].stat_stages.get(StatType::Atk), 0);
        // The rest of the turn still runs after the selection.
        assert!(moves_used(&bus).iter().any(|(battler, move_id, _)| *battler == ENEMY && *move_id == MoveId::Splash));
        assert_eq!(battle.state().game_state, GameState::AwaitingCommands);
    }

    #[test]
    fn test_shed_tail_leaves_a_substitute_for_the_replacement() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let (mut battle, _) = create_battle(BattleType::Trainer, pikachu_and_eevee(MoveId::ShedTail), vec![snorlax]);
        let pikachu_max = battle.state().pokemon(PLAYER).unwrap().max_hp();

        battle.submit_commands(fight(0)).unwrap();
        battle.submit_party_selection(1).unwrap();

        let state = battle.state();
        let eevee = state.pokemon(PLAYER).unwrap();
        assert_eq!(eevee.tags.substitute_hp(), Some(pikachu_max / 4));
        let pikachu = &state.side(SideId::Player).team[0];
        assert_eq!(pikachu.current_hp(), pikachu_max - pikachu_max.div_ceil(2));
    }

    #[test]
    fn test_baton_pass_fails_with_no_bench() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::BatonPass])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let (mut battle, _) = create_battle(BattleType::Trainer, vec![pikachu], vec![snorlax]);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::BatonPass,
                ..
            }
        )));
        assert_eq!(battle.state().game_state, GameState::AwaitingCommands);
    }

    #[test]
    fn test_roar_ends_a_wild_battle() {
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Roar])
            .build();
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50).build();
        let (mut battle, _) = create_battle(BattleType::Wild, vec![snorlax], vec![regieleki]);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(event, BattleEvent::Fled { side: SideId::Enemy })));
        assert_eq!(battle.state().game_state, GameState::Ended(BattleOutcome::EnemyFled));
        assert!(battle.queue().is_empty());
    }

    #[test]
    fn test_roar_drags_in_a_trainer_replacement() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Roar])
            .build();
        let enemy_team = vec![
            TestPokemonBuilder::new(Species::Snorlax, 50)
                .with_moves(vec![MoveId::Splash])
                .build(),
            TestPokemonBuilder::new(Species::Eevee, 50).build(),
        ];
        let (mut battle, _) = create_battle(BattleType::Trainer, vec![pikachu], enemy_team);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::PokemonSentOut {
                kind: SwitchKind::Forced,
                ..
            }
        )));
        assert_eq!(battle.state().pokemon(ENEMY).unwrap().species, Species::Eevee);
    }

    #[test]
    fn test_running_from_a_wild_battle() {
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50).build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let (mut battle, _) = create_battle(BattleType::Wild, vec![regieleki], vec![snorlax]);

        let bus = battle.submit_commands(player_command(TurnCommand::Run)).unwrap();

        assert!(has_event(&bus, |event| matches!(event, BattleEvent::Fled { side: SideId::Player })));
        assert_eq!(battle.state().game_state, GameState::Ended(BattleOutcome::PlayerFled));
        assert_matches!(battle.submit_commands(fight(0)), Err(_));
    }

    #[test]
    fn test_fainted_pokemon_is_replaced_by_choice() {
        let team = vec![
            TestPokemonBuilder::new(Species::Pikachu, 50).with_hp(1).build(),
            TestPokemonBuilder::new(Species::Eevee, 50).build(),
        ];
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let (mut battle, _) = create_battle(BattleType::Trainer, team, vec![snorlax]);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::Fainted { target } if target.species == Species::Pikachu
        )));
        assert_eq!(
            battle.state().game_state,
            GameState::AwaitingPartySelection {
                battler: PLAYER,
                kind: SwitchKind::Replacement,
            }
        );
        assert!(battle.submit_party_selection(0).is_err());

        battle.submit_party_selection(1).unwrap();

        assert_eq!(battle.state().pokemon(PLAYER).unwrap().species, Species::Eevee);
        assert_eq!(battle.state().game_state, GameState::AwaitingCommands);
    }

    #[test]
    fn test_last_pokemon_fainting_ends_the_battle() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50).with_hp(1).build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let (mut battle, _) = create_battle(BattleType::Trainer, vec![pikachu], vec![snorlax]);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::BattleEnded {
                outcome: BattleOutcome::EnemyWon
            }
        )));
        assert_eq!(battle.state().game_state, GameState::Ended(BattleOutcome::EnemyWon));
    }
}
