#[cfg(test)]
mod tests {
    use crate::battle::controller::BattleController;
    use crate::battle::rng::SeededRng;
    use crate::battle::snapshot;
    use crate::battle::state::{BattleState, BattleType, GameState};
    use crate::battle::tests::common::{fight, TestPokemonBuilder};
    use crate::species::Species;
    use pretty_assertions::assert_eq;
    use schema::MoveId;

    fn fresh_state() -> BattleState {
        let player = vec![
            TestPokemonBuilder::new(Species::Pikachu, 50)
                .with_moves(vec![MoveId::Thunderbolt, MoveId::QuickAttack])
                .build(),
            TestPokemonBuilder::new(Species::Eevee, 50).build(),
        ];
        let enemy = vec![TestPokemonBuilder::new(Species::Snorlax, 50)
            .with_moves(vec![MoveId::BodySlam, MoveId::Tackle])
            .build()];
        BattleState::new(BattleType::Trainer, false, player, enemy).unwrap()
    }

    fn seeded(seed: u64) -> BattleController {
        BattleController::with_rng(fresh_state(), Box::new(SeededRng::new(Some(seed))))
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut first = seeded(99);
        let mut second = seeded(99);

        assert_eq!(first.start(), second.start());
        for slot in [0, 1, 0] {
            if first.state().game_state != GameState::AwaitingCommands {
                break;
            }
            let left = first.submit_commands(fight(slot)).unwrap();
            let right = second.submit_commands(fight(slot)).unwrap();
            assert_eq!(left, right);
        }
        assert_eq!(first.state(), second.state());
    }

    #[test]
    fn test_snapshot_resumes_the_same_battle() {
        let mut original = seeded(7);
        original.start();
        original.submit_commands(fight(0)).unwrap();
        if original.state().game_state != GameState::AwaitingCommands {
            return;
        }

        let bytes = snapshot::to_bytes(original.state()).unwrap();
        let restored_state = snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(&restored_state, original.state());

        let mut restored = BattleController::with_rng(restored_state, Box::new(SeededRng::new(Some(11))));
        let mut continued = BattleController::with_rng(original.into_state(), Box::new(SeededRng::new(Some(11))));
        let left = restored.submit_commands(fight(1)).unwrap();
        let right = continued.submit_commands(fight(1)).unwrap();
        assert_eq!(left, right);
        assert_eq!(restored.state(), continued.state());
    }
}
