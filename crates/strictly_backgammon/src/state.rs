//! The aggregate owned by the turn state machine.

use super::action::{HistoryEntry, Move, Origin};
use super::board::Board;
use super::dice::DicePool;
use super::executor::PendingHit;
use super::phases::{Outcome, Phase};
use super::rules;
use super::types::{PerPlayer, Player};
use serde::{Deserialize, Serialize};

/// Complete game state.
///
/// Only [`TurnStateMachine`](super::TurnStateMachine) mutates it; everything
/// here is read-only for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) current_player: Player,
    pub(crate) dice: DicePool,
    pub(crate) selected_origin: Option<Origin>,
    pub(crate) phase: Phase,
    pub(crate) legal_moves: Vec<Move>,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) opening_roll: PerPlayer<Option<u8>>,
    pub(crate) pending_hit: Option<PendingHit>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) turn_id: u64,
}

impl GameState {
    /// A fresh game in the opening phase.
    pub(crate) fn opening(board: Board) -> Self {
        Self {
            board,
            current_player: Player::White,
            dice: DicePool::empty(),
            selected_origin: None,
            phase: Phase::Opening,
            legal_moves: Vec::new(),
            history: Vec::new(),
            opening_roll: PerPlayer::default(),
            pending_hit: None,
            outcome: None,
            turn_id: 0,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the player to act.
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Returns the unused dice.
    pub fn dice(&self) -> &DicePool {
        &self.dice
    }

    /// Returns the origin the player has selected, if any.
    pub fn selected_origin(&self) -> Option<Origin> {
        self.selected_origin
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the legal moves for the current dice.
    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    /// Returns this turn's moves, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Returns the opening dice recorded so far.
    pub fn opening_roll(&self) -> &PerPlayer<Option<u8>> {
        &self.opening_roll
    }

    /// Returns the hit waiting for its second phase.
    pub fn pending_hit(&self) -> Option<&PendingHit> {
        self.pending_hit.as_ref()
    }

    /// Returns the outcome once the game is finished.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Identifier of the current turn. Changes on every hand-off, opening
    /// resolution, tie, timeout and reset.
    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub(crate) fn refresh_legal_moves(&mut self) {
        self.legal_moves = rules::legal_moves(&self.board, self.current_player, self.dice.as_slice());
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Finished;
        self.outcome = Some(outcome);
        self.legal_moves.clear();
        self.selected_origin = None;
        self.pending_hit = None;
        self.turn_id += 1;
    }

    /// Passes play to the opponent and clears all per-turn state.
    pub(crate) fn hand_off(&mut self) -> Player {
        self.current_player = self.current_player.opponent();
        self.dice.clear();
        self.history.clear();
        self.legal_moves.clear();
        self.selected_origin = None;
        self.pending_hit = None;
        self.phase = Phase::Waiting;
        self.turn_id += 1;
        self.current_player
    }
}
