//! Strictly Backgammon - pure rules and turn logic
//!
//! This crate holds everything about a backgammon game that does not need
//! a network or a screen: the board, legal-move generation, move
//! application (including the two-phase hit), the turn state machine and
//! chess-clock reconciliation.
//!
//! # Architecture
//!
//! - **Rules**: [`legal_moves`] computes every legal single-die move
//! - **Executor**: applies moves the rules produced; hits run in two phases
//! - **Machine**: [`TurnStateMachine`] owns the [`GameState`] and gates
//!   every transition behind [`MoveContract`]
//! - **Clock**: [`ClockReconciler`] absorbs authoritative snapshots and
//!   ticks cosmetically in between
//!
//! Dice never originate here. They arrive as a [`DiceSet`] built from the
//! values an external authority produced.
//!
//! # Example
//!
//! ```
//! use strictly_backgammon::{Board, DiceSet, Move, Player, RollKind, TurnStateMachine};
//!
//! let mut game = TurnStateMachine::starting_at(Board::standard(), Player::White);
//! let dice = DiceSet::new(RollKind::Turn(Player::White), vec![3, 1]).unwrap();
//! game.roll_resolved(dice).unwrap();
//! game.move_applied(Move::step(7, 4, 3)).unwrap();
//! game.move_applied(Move::step(5, 4, 1)).unwrap();
//! assert_eq!(game.end_turn().unwrap(), Player::Black);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod board;
mod clock;
mod contracts;
mod dice;
mod executor;
mod invariants;
mod machine;
mod phases;
mod rules;
mod state;
mod types;

// Crate-level exports - Domain types
pub use board::{Board, Point};
pub use types::{CHECKERS_PER_PLAYER, POINT_COUNT, PerPlayer, Player};

// Crate-level exports - Actions
pub use action::{BAR, Destination, HistoryEntry, LocationError, Move, MoveError, OFF, Origin};

// Crate-level exports - Dice
pub use dice::{DIE_FACES, DiceError, DicePool, DiceSet, RollKind};

// Crate-level exports - Rules
pub use rules::{can_bear_off, is_valid_bear_off, legal_moves};

// Crate-level exports - Game state and transitions
pub use executor::PendingHit;
pub use machine::{MoveOutcome, RollOutcome, TransitionError, TurnStateMachine};
pub use phases::{Outcome, Phase, WinReason};
pub use state::GameState;

// Crate-level exports - Clock
pub use clock::{ClockReconciler, ClockState, TICK_MS, TimeoutCheck, TimeoutVerdict};

// Crate-level exports - Contracts and invariants
pub use contracts::{CaptureContract, Contract, InLegalSet, IsMoving, LegalMove, MoveContract, NoHitSettling};
pub use invariants::{
    BackgammonInvariants, BarPriorityInvariant, BoardInvariants, CheckerConservationInvariant,
    DiceConsistencyInvariant, Invariant, InvariantSet, InvariantViolation, PointOwnershipInvariant,
};
