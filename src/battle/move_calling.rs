use log::warn;
use serde::{Deserialize, Serialize};

use crate::battle::events::{Actor, BattleEvent};
use crate::battle::phases::{BattleContext, Phase};
use crate::battle::pipeline::MovePhase;
use crate::battle::rng::{sample, BattleRng};
use crate::battle::state::{BattleState, BattlerIndex};
use crate::move_data::{all_moves, get_move_data};
use crate::pokemon::UseMode;
use schema::{MoveFlag, MoveId, MoveTarget, StatusType};

/// Moves whose effect is to pick and use a different move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingMove {
    Metronome,
    SleepTalk,
    Assist,
    MirrorMove,
    Copycat,
}

/// Every calling move. No calling move may ever select one of these.
const CALLING_MOVES: [MoveId; 5] = [
    MoveId::Metronome,
    MoveId::SleepTalk,
    MoveId::Assist,
    MoveId::MirrorMove,
    MoveId::Copycat,
];

const METRONOME_BANS: &[MoveId] = &[
    MoveId::Counter,
    MoveId::Protect,
    MoveId::Detect,
    MoveId::Endure,
    MoveId::Thief,
    MoveId::Struggle,
];

const SLEEP_TALK_BANS: &[MoveId] = &[MoveId::Dig, MoveId::Fly, MoveId::Struggle];

const ASSIST_BANS: &[MoveId] = &[
    MoveId::Counter,
    MoveId::Protect,
    MoveId::Detect,
    MoveId::Endure,
    MoveId::Thief,
    MoveId::Dig,
    MoveId::Fly,
    MoveId::Roar,
    MoveId::Whirlwind,
    MoveId::DragonTail,
    MoveId::Struggle,
];

const MIRROR_MOVE_BANS: &[MoveId] = &[MoveId::Struggle];

const COPYCAT_BANS: &[MoveId] = &[
    MoveId::Counter,
    MoveId::Protect,
    MoveId::Detect,
    MoveId::Endure,
    MoveId::Thief,
    MoveId::Roar,
    MoveId::Whirlwind,
    MoveId::DragonTail,
    MoveId::Struggle,
];

/// A selection made by a calling move. Empty `targets` means default targeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalledMove {
    pub move_id: MoveId,
    pub targets: Vec<BattlerIndex>,
}

impl CallingMove {
    pub fn move_id(self) -> MoveId {
        match self {
            CallingMove::Metronome => MoveId::Metronome,
            CallingMove::SleepTalk => MoveId::SleepTalk,
            CallingMove::Assist => MoveId::Assist,
            CallingMove::MirrorMove => MoveId::MirrorMove,
            CallingMove::Copycat => MoveId::Copycat,
        }
    }

    fn own_bans(self) -> &'static [MoveId] {
        match self {
            CallingMove::Metronome => METRONOME_BANS,
            CallingMove::SleepTalk => SLEEP_TALK_BANS,
            CallingMove::Assist => ASSIST_BANS,
            CallingMove::MirrorMove => MIRROR_MOVE_BANS,
            CallingMove::Copycat => COPYCAT_BANS,
        }
    }

    /// Whether this calling move may never select `move_id`.
    pub fn is_banned(self, move_id: MoveId) -> bool {
        if move_id == MoveId::None || CALLING_MOVES.contains(&move_id) || self.own_bans().contains(&move_id) {
            return true;
        }
        match get_move_data(move_id) {
            Ok(data) if self == CallingMove::Metronome => data.has_flag(MoveFlag::Signature),
            // Charge moves cannot be started from a calling move that only lasts one turn.
            Ok(data) => self == CallingMove::SleepTalk && data.two_turn().is_some(),
            Err(_) => true,
        }
    }

    /// Legal selections, banlist already applied. Order is stable.
    pub fn candidates(self, state: &BattleState, user: BattlerIndex) -> Vec<MoveId> {
        let Some(pokemon) = state.pokemon(user) else {
            return Vec::new();
        };
        let mut candidates: Vec<MoveId> = match self {
            CallingMove::Metronome => all_moves(),
            CallingMove::SleepTalk if pokemon.has_status(StatusType::Sleep) => {
                pokemon.moves.iter().map(|slot| slot.move_id).collect()
            }
            CallingMove::SleepTalk => Vec::new(),
            CallingMove::Assist => state
                .side(user.side)
                .team
                .iter()
                .filter(|member| member.id != pokemon.id)
                .flat_map(|member| member.moves.iter().map(|slot| slot.move_id))
                .collect(),
            CallingMove::MirrorMove => pokemon
                .summon_data
                .last_move_targeting
                .map(|last| vec![last.move_id])
                .unwrap_or_default(),
            CallingMove::Copycat => state.last_move.into_iter().collect(),
        };
        candidates.retain(|move_id| !self.is_banned(*move_id));
        let mut seen = Vec::with_capacity(candidates.len());
        candidates.retain(|move_id| {
            if seen.contains(move_id) {
                false
            } else {
                seen.push(*move_id);
                true
            }
        });
        candidates
    }

    /// Picks the move to call, or `None` when there is no legal candidate.
    pub fn select(
        self,
        state: &BattleState,
        user: BattlerIndex,
        rng: &mut dyn BattleRng,
    ) -> Option<CalledMove> {
        let candidates = self.candidates(state, user);
        match self {
            CallingMove::MirrorMove => {
                // Re-aims only at the Pokemon that used the move on us, if it is still there.
                let last = state.pokemon(user)?.summon_data.last_move_targeting?;
                if !state.is_active(last.attacker, last.attacker_id) || candidates.is_empty() {
                    return None;
                }
                Some(CalledMove {
                    move_id: last.move_id,
                    targets: vec![last.attacker],
                })
            }
            CallingMove::Metronome | CallingMove::SleepTalk | CallingMove::Assist | CallingMove::Copycat => {
                let reason = match self {
                    CallingMove::Metronome => "metronome selection",
                    CallingMove::SleepTalk => "sleep talk selection",
                    CallingMove::Assist => "assist selection",
                    _ => "copycat selection",
                };
                sample(rng, &candidates, reason).map(|move_id| CalledMove {
                    move_id: *move_id,
                    targets: Vec::new(),
                })
            }
        }
    }
}

/// Resolves a calling move: queues the selected move as a follow-up, or fails visibly.
pub fn dispatch_called_move(ctx: &mut BattleContext, caller: &MovePhase, calling: CallingMove) -> bool {
    let Some(pokemon) = ctx.state.pokemon(caller.user) else {
        return false;
    };
    let actor = Actor::new(caller.user, pokemon);
    if caller.call_depth >= ctx.state.max_call_depth {
        warn!(
            "{} hit the call depth limit ({}); the call fails",
            calling.move_id(),
            ctx.state.max_call_depth
        );
        ctx.bus.push(BattleEvent::MoveFailed {
            actor,
            move_id: calling.move_id(),
        });
        return false;
    }

    let Some(called) = calling.select(ctx.state, caller.user, ctx.rng) else {
        ctx.bus.push(BattleEvent::MoveFailed {
            actor,
            move_id: calling.move_id(),
        });
        return false;
    };
    // The caller's own copy is debited when it knows the called move.
    let move_slot = ctx
        .state
        .pokemon(caller.user)
        .and_then(|pokemon| pokemon.move_slot(called.move_id));
    ctx.bus.push(BattleEvent::MoveCalled {
        actor,
        calling: calling.move_id(),
        called: called.move_id,
    });
    ctx.queue.unshift(Phase::Move(MovePhase {
        user: caller.user,
        user_id: caller.user_id,
        move_id: called.move_id,
        targets: called.targets,
        use_mode: UseMode::FollowUp,
        move_slot,
        call_depth: caller.call_depth + 1,
    }));
    true
}

/// Copy of a dance move for a Dancer holder. Opponents of the dancer are
/// aimed at the original user; everything else keeps the original targets.
pub fn dancer_copy(
    state: &BattleState,
    dancer: BattlerIndex,
    original_user: BattlerIndex,
    move_id: MoveId,
    original_targets: &[BattlerIndex],
) -> Option<Phase> {
    if dancer == original_user {
        return None;
    }
    let pokemon = state.pokemon(dancer).filter(|p| !p.is_fainted())?;
    let data = get_move_data(move_id).ok()?;
    if !data.has_flag(MoveFlag::Dance) {
        return None;
    }

    let targets = if data.target == MoveTarget::User || data.target.is_field_target() {
        Vec::new()
    } else if original_user.side != dancer.side {
        vec![original_user]
    } else {
        original_targets
            .iter()
            .copied()
            .filter(|target| *target != dancer && target.side != dancer.side)
            .collect()
    };

    Some(Phase::Move(MovePhase {
        user: dancer,
        user_id: pokemon.id,
        move_id,
        targets,
        use_mode: UseMode::Indirect,
        move_slot: None,
        call_depth: 1,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_calling_moves_ban_each_other() {
        for calling in [
            CallingMove::Metronome,
            CallingMove::SleepTalk,
            CallingMove::Assist,
            CallingMove::MirrorMove,
            CallingMove::Copycat,
        ] {
            for called in CALLING_MOVES {
                assert!(calling.is_banned(called), "{:?} may call {:?}", calling, called);
            }
            assert!(calling.is_banned(MoveId::Struggle));
            assert!(calling.is_banned(MoveId::None));
        }
    }

    #[test]
    fn test_sleep_talk_bans_charge_moves() {
        assert!(CallingMove::SleepTalk.is_banned(MoveId::Dig));
        assert!(CallingMove::SleepTalk.is_banned(MoveId::Fly));
        assert!(!CallingMove::SleepTalk.is_banned(MoveId::Tackle));
        assert_eq!(CallingMove::Metronome.is_banned(MoveId::Dig), false);
    }

    #[test]
    fn test_only_metronome_bans_signature_moves() {
        for signature in [MoveId::SacredFire, MoveId::RelicSong, MoveId::DarkVoid] {
            assert!(CallingMove::Metronome.is_banned(signature), "{:?}", signature);
            assert!(!CallingMove::Copycat.is_banned(signature), "{:?}", signature);
        }
    }
}
