#[cfg(test)]
mod tests {
    use crate::battle::events::{BattleEvent, PreventReason};
    use crate::battle::state::GameState;
    use crate::battle::tags::{BattlerTag, TagData};
    use crate::battle::tests::common::{
        create_test_battle, fight, has_event, moves_used, TestPokemonBuilder, ENEMY, PLAYER,
    };
    use crate::pokemon::UseMode;
    use crate::species::Species;
    use pretty_assertions::assert_eq;
    use schema::{AbilityId, MoveId};

    #[test]
    fn test_pp_is_spent_once_per_use() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50).build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        let max_pp = battle.state().pokemon(PLAYER).unwrap().moves[0].max_pp;

        battle.submit_commands(fight(0)).unwrap();

        assert_eq!(battle.state().pokemon(PLAYER).unwrap().moves[0].pp, max_pp - 1);
    }

    #[test]
    fn test_out_of_pp_falls_back_to_struggle() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50).build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle.state_mut().pokemon_mut(PLAYER).unwrap().moves[0].pp = 0;

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::Struggle, UseMode::Normal)));
        let pikachu = battle.state().pokemon(PLAYER).unwrap();
        assert_eq!(pikachu.current_hp(), pikachu.max_hp() - pikachu.max_hp() / 4);
        assert!(battle.state().pokemon(ENEMY).unwrap().current_hp() < battle.state().pokemon(ENEMY).unwrap().max_hp());
    }

    #[test]
    fn test_sleeping_pokemon_cannot_act() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_status(crate::pokemon::StatusCondition::Sleep { turns_remaining: 2 })
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::ActionPrevented {
                reason: PreventReason::Asleep,
                ..
            }
        )));
        let snorlax = battle.state().pokemon(ENEMY).unwrap();
        assert_eq!(snorlax.current_hp(), snorlax.max_hp());
    }

    #[test]
    fn test_substitute_absorbs_damage() {
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::Substitute])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let mut battle = create_test_battle(regieleki, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(event, BattleEvent::SubstituteCreated { .. })));
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::SubstituteTookDamage { target, .. } if target.battler == PLAYER
        )));
        let regieleki = battle.state().pokemon(PLAYER).unwrap();
        assert_eq!(regieleki.current_hp(), regieleki.max_hp() - regieleki.max_hp() / 4);
    }

    #[test]
    fn test_substitute_breaks_without_passing_damage_through() {
        let garchomp = TestPokemonBuilder::new(Species::Garchomp, 50)
            .with_moves(vec![MoveId::Earthquake])
            .build();
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(garchomp, pikachu);
        let pikachu = battle.state_mut().pokemon_mut(ENEMY).unwrap();
        let substitute_hp = pikachu.max_hp() / 4;
        pikachu.tags.add(BattlerTag::new(
            TagData::Substitute { hp: substitute_hp },
            0,
            MoveId::Substitute,
            None,
        ));

        let bus = battle.submit_commands(fight(0)).unwrap();

        let faded = bus
            .events()
            .iter()
            .filter(|event| matches!(event, BattleEvent::SubstituteFaded { target } if target.battler == ENEMY))
            .count();
        assert_eq!(faded, 1);
        let pikachu = battle.state().pokemon(ENEMY).unwrap();
        assert_eq!(pikachu.current_hp(), pikachu.max_hp());
        assert_eq!(pikachu.tags.substitute_hp(), None);
    }

    #[test]
    fn test_substitute_needs_more_than_a_quarter_of_max_hp() {
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::Substitute])
            .with_hp(30)
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(regieleki, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::Substitute,
                ..
            }
        )));
        assert_eq!(battle.state().pokemon(PLAYER).unwrap().current_hp(), 30);
    }

    #[test]
    fn test_sound_moves_pass_through_substitute() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::HyperVoice])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle
            .state_mut()
            .pokemon_mut(ENEMY)
            .unwrap()
            .tags
            .add(BattlerTag::new(TagData::Substitute { hp: 50 }, 0, MoveId::Substitute, None));

        battle.submit_commands(fight(0)).unwrap();

        let snorlax = battle.state().pokemon(ENEMY).unwrap();
        assert!(snorlax.current_hp() < snorlax.max_hp());
        assert_eq!(snorlax.tags.substitute_hp(), Some(50));
    }

    #[test]
    fn test_infiltrator_hits_through_substitute() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_ability(AbilityId::Infiltrator)
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);
        battle
            .state_mut()
            .pokemon_mut(ENEMY)
            .unwrap()
            .tags
            .add(BattlerTag::new(TagData::Substitute { hp: 50 }, 0, MoveId::Substitute, None));

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(!has_event(&bus, |event| matches!(event, BattleEvent::SubstituteTookDamage { .. })));
        let snorlax = battle.state().pokemon(ENEMY).unwrap();
        assert!(snorlax.current_hp() < snorlax.max_hp());
        assert_eq!(snorlax.tags.substitute_hp(), Some(50));
    }

    #[test]
    fn test_protect_blocks_and_fails_when_repeated() {
        let regieleki = TestPokemonBuilder::new(Species::Regieleki, 50)
            .with_moves(vec![MoveId::Protect])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let mut battle = create_test_battle(regieleki, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::Protected { target } if target.battler == PLAYER
        )));
        let regieleki = battle.state().pokemon(PLAYER).unwrap();
        assert_eq!(regieleki.current_hp(), regieleki.max_hp());

        // A second Protect in a row only succeeds one time in three.
        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveFailed {
                move_id: MoveId::Protect,
                ..
            }
        )));
        let regieleki = battle.state().pokemon(PLAYER).unwrap();
        assert!(regieleki.current_hp() < regieleki.max_hp());
    }

    #[test]
    fn test_multi_hit_reports_hit_count() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::BulletSeed])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::Splash])
            .build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();

        assert!(has_event(&bus, |event| matches!(event, BattleEvent::HitCount { hits: 3 })));
        let hits = bus
            .events()
            .iter()
            .filter(|event| matches!(event, BattleEvent::DamageDealt { target, .. } if target.battler == ENEMY))
            .count();
        assert_eq!(hits, 3);
    }

    #[test]
    fn test_two_turn_move_charges_then_strikes() {
        let pikachu = TestPokemonBuilder::new(Species::Pikachu, 50)
            .with_moves(vec![MoveId::Dig])
            .build();
        let snorlax = TestPokemonBuilder::new(Species::Snorlax, 50).build();
        let mut battle = create_test_battle(pikachu, snorlax);

        let bus = battle.submit_commands(fight(0)).unwrap();
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::ChargingTurn {
                move_id: MoveId::Dig,
                ..
            }
        )));
        assert!(has_event(&bus, |event| matches!(
            event,
            BattleEvent::MoveMissed { actor, .. } if actor.battler == ENEMY
        )));
        let snorlax = battle.state().pokemon(ENEMY).unwrap();
        assert_eq!(snorlax.current_hp(), snorlax.max_hp());
        assert_eq!(battle.state().game_state, GameState::AwaitingCommands);

        // The second turn is locked in and needs no command.
        let bus = battle.submit_commands(vec![]).unwrap();
        assert!(moves_used(&bus).contains(&(PLAYER, MoveId::Dig, UseMode::IgnorePp)));
        let snorlax = battle.state().pokemon(ENEMY).unwrap();
        assert!(snorlax.current_hp() < snorlax.max_hp());
        let dig = &battle.state().pokemon(PLAYER).unwrap().moves[0];
        assert_eq!(dig.pp, dig.max_pp - 1);
    }
}
