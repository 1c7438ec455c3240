//! Applies legal moves to the game state.
//!
//! The executor trusts its input: the move must come from the current
//! legal-move set. The boundary check lives in [`contracts`](super::contracts).
//!
//! A hit is two transitions. Phase A sends the blot to the bar and leaves
//! the mover on its origin; Phase B, after a settle delay chosen by the
//! caller, lands the mover and consumes the die. Everything else lands in
//! one step.

use super::action::{Destination, HistoryEntry, Move};
use super::board::Board;
use super::phases::{Outcome, WinReason};
use super::state::GameState;
use super::types::Player;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A hit between Phase A (capture) and Phase B (arrival).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHit {
    player: Player,
    played: Move,
    prior_board: Board,
}

impl PendingHit {
    /// Player making the hit.
    pub fn player(&self) -> Player {
        self.player
    }

    /// The move being played.
    pub fn played(&self) -> Move {
        self.played
    }

    /// Board before the capture.
    pub fn prior_board(&self) -> &Board {
        &self.prior_board
    }
}

/// Result of starting a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Execution {
    /// The move landed.
    Landed(HistoryEntry),
    /// Phase A done; Phase B still to run.
    HitPending(PendingHit),
}

pub(crate) struct MoveExecutor;

impl MoveExecutor {
    /// Starts `mv` for the current player.
    #[instrument(skip(state), fields(player = %state.current_player))]
    pub(crate) fn execute(state: &mut GameState, mv: Move) -> Execution {
        let player = state.current_player;
        let prior_board = state.board.clone();

        let captured = match mv.to {
            Destination::Point(to) => state.board.capture(usize::from(to), player),
            Destination::Off => None,
        };
        if let Some(victim) = captured {
            debug!(%mv, %victim, "Blot sent to the bar, arrival pending");
            return Execution::HitPending(PendingHit {
                player,
                played: mv,
                prior_board,
            });
        }

        Execution::Landed(Self::land(state, player, mv, prior_board, false))
    }

    /// Phase B of a hit.
    #[instrument(skip(state, pending), fields(mv = %pending.played))]
    pub(crate) fn complete_hit(state: &mut GameState, pending: PendingHit) -> HistoryEntry {
        Self::land(state, pending.player, pending.played, pending.prior_board, true)
    }

    fn land(
        state: &mut GameState,
        player: Player,
        mv: Move,
        prior_board: Board,
        hit: bool,
    ) -> HistoryEntry {
        state.board.relocate(player, &mv);
        let consumed = state.dice.consume(mv.die);
        debug_assert!(consumed.is_ok(), "executor given a move for an unavailable die");

        let entry = HistoryEntry::new(prior_board, player, mv, hit);
        state.history.push(entry.clone());
        state.selected_origin = None;

        if mv.is_bear_off() && state.board.has_borne_off_all(player) {
            info!(%player, "All checkers borne off");
            state.finish(Outcome::new(player, WinReason::BoreOff));
        } else {
            state.refresh_legal_moves();
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceSet, RollKind};
    use crate::phases::Phase;
    use crate::types::CHECKERS_PER_PLAYER;

    fn moving(board: Board, player: Player, dice: Vec<u8>) -> GameState {
        let mut state = GameState::opening(board);
        state.current_player = player;
        state.phase = Phase::Moving;
        state.dice = DiceSet::new(RollKind::Turn(player), dice)
            .expect("valid dice")
            .expand();
        state.refresh_legal_moves();
        state
    }

    fn conserved(state: &GameState) -> bool {
        [Player::White, Player::Black]
            .iter()
            .all(|p| state.board.checker_total(*p) == CHECKERS_PER_PLAYER)
    }

    #[test]
    fn hit_runs_in_two_phases() {
        let board = Board::empty()
            .with_checkers(10, Player::White, 1)
            .with_checkers(0, Player::White, 14)
            .with_checkers(4, Player::Black, 1)
            .with_checkers(23, Player::Black, 14);
        let mut state = moving(board, Player::White, vec![6, 1]);

        let pending = match MoveExecutor::execute(&mut state, Move::step(10, 4, 6)) {
            Execution::HitPending(p) => p,
            other => panic!("expected a pending hit, got {:?}", other),
        };

        // Phase A: blot on the bar, mover still home, die unspent.
        assert_eq!(state.board.bar(Player::Black), 1);
        assert!(state.board.point(4).is_empty());
        assert!(state.board.point(10).is_owned_by(Player::White));
        assert_eq!(state.dice.as_slice(), &[6, 1]);
        assert!(conserved(&state));

        let entry = MoveExecutor::complete_hit(&mut state, pending);
        assert!(*entry.hit());
        assert_eq!(state.board.bar(Player::Black), 1);
        assert_eq!(state.board.point(4).count(), 1);
        assert!(state.board.point(4).is_owned_by(Player::White));
        assert!(state.board.point(10).is_empty());
        assert_eq!(state.dice.as_slice(), &[1]);
        assert!(conserved(&state));
    }

    #[test]
    fn plain_move_lands_immediately() {
        let mut state = moving(Board::standard(), Player::White, vec![3, 1]);
        let execution = MoveExecutor::execute(&mut state, Move::step(7, 4, 3));
        assert!(matches!(execution, Execution::Landed(_)));
        assert_eq!(state.board.point(4).count(), 1);
        assert_eq!(state.board.point(7).count(), 2);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.dice.as_slice(), &[1]);
    }

    #[test]
    fn last_bear_off_finishes_the_game() {
        let board = Board::empty()
            .with_checkers(2, Player::White, 1)
            .with_off(Player::White, 14)
            .with_checkers(12, Player::Black, 15);
        let mut state = moving(board, Player::White, vec![6, 2]);
        MoveExecutor::execute(&mut state, Move::bear_off(2, 6));
        assert_eq!(state.phase, Phase::Finished);
        assert_eq!(
            state.outcome,
            Some(Outcome::new(Player::White, WinReason::BoreOff))
        );
        assert!(conserved(&state));
    }
}
