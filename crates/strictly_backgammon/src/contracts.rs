//! Contract-based validation for backgammon moves.
//!
//! The executor never validates; the precondition here is the only thing
//! standing between a caller-supplied move and the board.

use super::action::{Move, MoveError};
use super::invariants::{BackgammonInvariants, BoardInvariants, InvariantSet, InvariantViolation};
use super::phases::Phase;
use super::state::GameState;
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// A contract defines preconditions and postconditions for state transitions.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), MoveError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), MoveError>;
}

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game is in the moving phase.
pub struct IsMoving;

impl IsMoving {
    /// Checks the phase.
    pub fn check(state: &GameState) -> Result<(), MoveError> {
        match state.phase() {
            Phase::Moving => Ok(()),
            other => Err(MoveError::WrongPhase(other)),
        }
    }
}

/// Precondition: no hit is halfway through.
pub struct NoHitSettling;

impl NoHitSettling {
    /// Checks for a pending hit.
    pub fn check(state: &GameState) -> Result<(), MoveError> {
        if state.pending_hit().is_some() {
            Err(MoveError::HitPending)
        } else {
            Ok(())
        }
    }
}

/// Precondition: the move is one the validator produced.
pub struct InLegalSet;

impl InLegalSet {
    /// Checks membership in the current legal-move set.
    pub fn check(mv: &Move, state: &GameState) -> Result<(), MoveError> {
        if state.legal_moves().contains(mv) {
            Ok(())
        } else {
            Err(MoveError::NotLegal(*mv))
        }
    }
}

/// Composite precondition checked at the boundary before the executor.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(skip(state))]
    pub fn check(mv: &Move, state: &GameState) -> Result<(), MoveError> {
        IsMoving::check(state)?;
        NoHitSettling::check(state)?;
        InLegalSet::check(mv, state).inspect_err(|_| {
            warn!(%mv, legal = state.legal_moves().len(), "Rejected move outside legal set");
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Contracts
// ─────────────────────────────────────────────────────────────

fn describe(violations: Vec<InvariantViolation>) -> MoveError {
    let descriptions = violations
        .iter()
        .map(|v| v.description.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    MoveError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
}

/// Contract for completed moves.
///
/// Preconditions: moving phase, no hit settling, move in the legal set.
///
/// Postconditions: all invariants hold, one more history entry, exactly
/// one die fewer.
pub struct MoveContract;

impl Contract<GameState, Move> for MoveContract {
    fn pre(state: &GameState, action: &Move) -> Result<(), MoveError> {
        LegalMove::check(action, state)
    }

    fn post(before: &GameState, after: &GameState) -> Result<(), MoveError> {
        BackgammonInvariants::check_all(after).map_err(describe)?;
        if after.history().len() != before.history().len() + 1 {
            return Err(MoveError::InvariantViolation(
                "Postcondition failed: history must grow by one entry".to_string(),
            ));
        }
        if after.dice().len() + 1 != before.dice().len() {
            return Err(MoveError::InvariantViolation(
                "Postcondition failed: exactly one die must be consumed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contract for the capture half of a hit: the board stays conserved while
/// the mover has not yet landed.
pub struct CaptureContract;

impl Contract<GameState, Move> for CaptureContract {
    fn pre(state: &GameState, action: &Move) -> Result<(), MoveError> {
        LegalMove::check(action, state)
    }

    fn post(before: &GameState, after: &GameState) -> Result<(), MoveError> {
        BoardInvariants::check_all(after).map_err(describe)?;
        if after.dice() != before.dice() {
            return Err(MoveError::InvariantViolation(
                "Postcondition failed: capture must not consume a die".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TurnStateMachine;
    use crate::board::Board;
    use crate::dice::{DiceSet, RollKind};
    use crate::types::Player;

    fn white_to_move(dice: Vec<u8>) -> TurnStateMachine {
        let mut machine = TurnStateMachine::starting_at(Board::standard(), Player::White);
        machine
            .roll_resolved(DiceSet::new(RollKind::Turn(Player::White), dice).expect("valid"))
            .expect("roll accepted");
        machine
    }

    #[test]
    fn legal_move_passes_precondition() {
        let machine = white_to_move(vec![3, 1]);
        assert!(MoveContract::pre(machine.state(), &Move::step(7, 4, 3)).is_ok());
    }

    #[test]
    fn invented_move_is_rejected() {
        let machine = white_to_move(vec![3, 1]);
        assert_eq!(
            MoveContract::pre(machine.state(), &Move::step(7, 2, 5)),
            Err(MoveError::NotLegal(Move::step(7, 2, 5)))
        );
    }

    #[test]
    fn moves_rejected_before_rolling() {
        let machine = TurnStateMachine::starting_at(Board::standard(), Player::White);
        assert_eq!(
            MoveContract::pre(machine.state(), &Move::step(7, 4, 3)),
            Err(MoveError::WrongPhase(Phase::Waiting))
        );
    }

    #[test]
    fn postcondition_detects_lost_checker() {
        let machine = white_to_move(vec![3, 1]);
        let before = machine.state().clone();
        let mut after = before.clone();
        after.board = after.board.clone().with_checkers(12, Player::White, 4);
        assert!(MoveContract::post(&before, &after).is_err());
    }
}
