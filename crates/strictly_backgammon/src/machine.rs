//! Turn state machine.
//!
//! Phases run `Opening → Waiting → Moving → Finished`. Dice only enter
//! through [`TurnStateMachine::roll_resolved`], which takes a [`DiceSet`]
//! built from the randomness authority's values; the machine never
//! invents dice.
//!
//! Liveness: a player holding dice with no legal move cannot act. When
//! that happens straight after a roll the turn passes immediately; when it
//! happens after some moves, [`TurnStateMachine::is_blocked`] reports it
//! and [`TurnStateMachine::end_turn_if_blocked`] ends the turn after the
//! caller's grace delay. Both routes go through the same hand-off.

use super::action::{HistoryEntry, Move, MoveError, Origin};
use super::board::Board;
#[cfg(debug_assertions)]
use super::contracts::CaptureContract;
use super::contracts::{Contract, IsMoving, MoveContract, NoHitSettling};
use super::dice::{DiceError, DiceSet, RollKind};
use super::executor::{Execution, MoveExecutor, PendingHit};
use super::phases::{Outcome, Phase, WinReason};
use super::state::GameState;
use super::types::Player;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

/// Error returned by roll, turn and game-level transitions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TransitionError {
    /// The transition is not allowed in this phase.
    #[display("{} is not allowed in the {:?} phase", transition, phase)]
    WrongPhase {
        /// Transition attempted.
        transition: &'static str,
        /// Phase the game was in.
        phase: Phase,
    },

    /// The dice answer a roll the machine is not waiting for.
    #[display("Unexpected {:?} roll (expected {:?})", actual, expected)]
    UnexpectedRoll {
        /// Roll the machine is waiting for.
        expected: Option<RollKind>,
        /// Roll that arrived.
        actual: RollKind,
    },

    /// Malformed dice.
    #[display("Invalid dice: {}", _0)]
    Dice(DiceError),

    /// A hit is still settling.
    #[display("A hit is still settling")]
    HitPending,

    /// The player still has legal moves.
    #[display("Turn is not over: {} legal moves remain", _0)]
    TurnNotOver(usize),
}

impl std::error::Error for TransitionError {}

impl From<DiceError> for TransitionError {
    fn from(err: DiceError) -> Self {
        TransitionError::Dice(err)
    }
}

/// What a resolved roll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// One opening die recorded; the other player still has to roll.
    OpeningRecorded(Player),
    /// Both opening dice matched; both were cleared for a re-roll.
    OpeningTie,
    /// The opening roll decided who starts.
    OpeningDecided {
        /// Player who moves first.
        first: Player,
    },
    /// The player has moves to make.
    Moving {
        /// Number of legal moves.
        legal: usize,
    },
    /// No legal move existed; the turn passed without the player acting.
    AutoPassed {
        /// Player who could not move.
        player: Player,
        /// Player now on turn.
        next: Player,
    },
}

/// What applying a move did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The checker landed; the turn continues.
    Landed(HistoryEntry),
    /// The blot is on the bar; call [`TurnStateMachine::resolve_hit`]
    /// once the settle delay has elapsed.
    HitPending(PendingHit),
    /// The move won the game.
    Won(Outcome),
}

/// Owns a [`GameState`] and enforces the legality of every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStateMachine {
    state: GameState,
}

impl TurnStateMachine {
    /// Creates a new game from the standard position, in the opening phase.
    #[instrument]
    pub fn new() -> Self {
        Self::with_board(Board::standard())
    }

    /// Creates a new game from `board`, in the opening phase.
    #[instrument(skip(board))]
    pub fn with_board(board: Board) -> Self {
        Self {
            state: GameState::opening(board),
        }
    }

    /// Creates a game that skips the opening: `player` is waiting to roll.
    #[instrument(skip(board))]
    pub fn starting_at(board: Board, player: Player) -> Self {
        let mut state = GameState::opening(board);
        state.phase = Phase::Waiting;
        state.current_player = player;
        Self { state }
    }

    /// Returns the game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Roll the machine is waiting for, if any.
    pub fn expected_roll(&self) -> Option<RollKind> {
        match self.state.phase {
            Phase::Opening => [Player::White, Player::Black]
                .into_iter()
                .find(|p| self.state.opening_roll[*p].is_none())
                .map(RollKind::Opening),
            Phase::Waiting => Some(RollKind::Turn(self.state.current_player)),
            Phase::Moving | Phase::Finished => None,
        }
    }

    /// Feeds authoritative dice into the machine.
    #[instrument(skip(self), fields(turn_id = self.state.turn_id))]
    pub fn roll_resolved(&mut self, dice: DiceSet) -> Result<RollOutcome, TransitionError> {
        match (self.state.phase, dice.kind()) {
            (Phase::Opening, RollKind::Opening(player))
                if self.state.opening_roll[player].is_none() =>
            {
                Ok(self.record_opening(player, dice.values()[0]))
            }
            (Phase::Waiting, RollKind::Turn(player)) if player == self.state.current_player => {
                Ok(self.start_turn(&dice))
            }
            (Phase::Opening, _) | (Phase::Waiting, _) => {
                warn!(actual = ?dice.kind(), "Roll does not answer the pending request");
                Err(TransitionError::UnexpectedRoll {
                    expected: self.expected_roll(),
                    actual: dice.kind(),
                })
            }
            (phase, _) => Err(TransitionError::WrongPhase {
                transition: "roll",
                phase,
            }),
        }
    }

    fn record_opening(&mut self, player: Player, value: u8) -> RollOutcome {
        self.state.opening_roll[player] = Some(value);
        let (Some(white), Some(black)) = (self.state.opening_roll.white, self.state.opening_roll.black)
        else {
            debug!(%player, value, "Opening die recorded");
            return RollOutcome::OpeningRecorded(player);
        };

        let first = match white.cmp(&black) {
            Ordering::Equal => {
                info!(value, "Opening tie, re-rolling");
                self.state.opening_roll = Default::default();
                self.state.turn_id += 1;
                return RollOutcome::OpeningTie;
            }
            Ordering::Greater => Player::White,
            Ordering::Less => Player::Black,
        };

        info!(%first, white, black, "Opening roll decided");
        self.state.current_player = first;
        self.state.dice.clear();
        self.state.phase = Phase::Waiting;
        self.state.turn_id += 1;
        RollOutcome::OpeningDecided { first }
    }

    fn start_turn(&mut self, dice: &DiceSet) -> RollOutcome {
        let player = self.state.current_player;
        self.state.dice = dice.expand();
        self.state.refresh_legal_moves();

        if self.state.legal_moves.is_empty() {
            let next = self.state.hand_off();
            info!(%player, dice = ?dice.values(), "No legal moves, turn passes");
            return RollOutcome::AutoPassed { player, next };
        }

        self.state.phase = Phase::Moving;
        if self.state.board.bar(player) > 0 {
            self.state.selected_origin = Some(Origin::Bar);
        }
        debug!(%player, dice = ?dice.values(), legal = self.state.legal_moves.len(), "Turn started");
        RollOutcome::Moving {
            legal: self.state.legal_moves.len(),
        }
    }

    /// Selects the checker to move and returns the moves available from it.
    #[instrument(skip(self))]
    pub fn select_origin(&mut self, origin: Origin) -> Result<Vec<Move>, MoveError> {
        IsMoving::check(&self.state)?;
        NoHitSettling::check(&self.state)?;
        let moves: Vec<Move> = self
            .state
            .legal_moves
            .iter()
            .filter(|m| m.from == origin)
            .copied()
            .collect();
        if moves.is_empty() {
            return Err(MoveError::NoMovesFrom(origin));
        }
        self.state.selected_origin = Some(origin);
        Ok(moves)
    }

    /// Applies a move after checking it against the legal-move set.
    #[instrument(skip(self, mv), fields(player = %self.state.current_player, mv = %mv))]
    pub fn move_applied(&mut self, mv: Move) -> Result<MoveOutcome, MoveError> {
        MoveContract::pre(&self.state, &mv)?;

        #[cfg(debug_assertions)]
        let before = self.state.clone();

        match MoveExecutor::execute(&mut self.state, mv) {
            Execution::HitPending(pending) => {
                self.state.pending_hit = Some(pending.clone());
                #[cfg(debug_assertions)]
                CaptureContract::post(&before, &self.state)?;
                Ok(MoveOutcome::HitPending(pending))
            }
            Execution::Landed(entry) => {
                #[cfg(debug_assertions)]
                MoveContract::post(&before, &self.state)?;
                Ok(self.landed(entry))
            }
        }
    }

    /// Runs the second phase of a pending hit.
    #[instrument(skip(self))]
    pub fn resolve_hit(&mut self) -> Result<MoveOutcome, MoveError> {
        let pending = self.state.pending_hit.take().ok_or(MoveError::NoHitPending)?;

        #[cfg(debug_assertions)]
        let before = self.state.clone();

        let entry = MoveExecutor::complete_hit(&mut self.state, pending);

        #[cfg(debug_assertions)]
        MoveContract::post(&before, &self.state)?;

        Ok(self.landed(entry))
    }

    fn landed(&self, entry: HistoryEntry) -> MoveOutcome {
        match self.state.outcome {
            Some(outcome) => MoveOutcome::Won(outcome),
            None => {
                debug!(mv = %entry.played(), dice_left = self.state.dice.len(), "Move landed");
                MoveOutcome::Landed(entry)
            }
        }
    }

    /// Takes back the last move of this turn.
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<Move, MoveError> {
        IsMoving::check(&self.state)?;
        NoHitSettling::check(&self.state)?;
        let entry = self.state.history.pop().ok_or(MoveError::NothingToUndo)?;
        let played = *entry.played();
        self.state.board = entry.prior_board().clone();
        self.state.dice.restore(played.die);
        self.state.selected_origin = None;
        self.state.refresh_legal_moves();
        debug!(mv = %played, "Move undone");
        Ok(played)
    }

    /// Returns true if the player holds dice but cannot use any of them.
    pub fn is_blocked(&self) -> bool {
        self.state.phase == Phase::Moving
            && self.state.pending_hit.is_none()
            && !self.state.dice.is_empty()
            && self.state.legal_moves.is_empty()
    }

    /// Returns true if the current player may end their turn.
    pub fn can_end_turn(&self) -> bool {
        self.state.phase == Phase::Moving
            && self.state.pending_hit.is_none()
            && (self.state.dice.is_empty() || self.state.legal_moves.is_empty())
    }

    /// Ends the current turn and returns the player now on turn.
    #[instrument(skip(self), fields(player = %self.state.current_player))]
    pub fn end_turn(&mut self) -> Result<Player, TransitionError> {
        if self.state.phase != Phase::Moving {
            return Err(TransitionError::WrongPhase {
                transition: "end turn",
                phase: self.state.phase,
            });
        }
        if self.state.pending_hit.is_some() {
            return Err(TransitionError::HitPending);
        }
        if !self.can_end_turn() {
            return Err(TransitionError::TurnNotOver(self.state.legal_moves.len()));
        }
        let next = self.state.hand_off();
        info!(%next, "Turn ended");
        Ok(next)
    }

    /// Ends the turn identified by `turn_id` if the player is still blocked.
    ///
    /// Returns the player now on turn, or `None` if the turn already moved
    /// on or the player can act again (e.g. after an undo).
    #[instrument(skip(self))]
    pub fn end_turn_if_blocked(&mut self, turn_id: u64) -> Option<Player> {
        if self.state.turn_id != turn_id || !self.is_blocked() {
            return None;
        }
        let player = self.state.current_player;
        let next = self.state.hand_off();
        info!(%player, %next, "Blocked player's turn ended");
        Some(next)
    }

    /// Finishes the game because `loser` ran out of time.
    ///
    /// Only call this once the authority has confirmed the timeout.
    #[instrument(skip(self))]
    pub fn declare_timeout(&mut self, loser: Player) -> Result<Outcome, TransitionError> {
        match self.state.phase {
            Phase::Waiting | Phase::Moving => {
                let outcome = Outcome::new(loser.opponent(), WinReason::Timeout);
                self.state.finish(outcome);
                info!(%outcome, "Game finished on time");
                Ok(outcome)
            }
            phase => Err(TransitionError::WrongPhase {
                transition: "timeout",
                phase,
            }),
        }
    }

    /// Starts a rematch from the standard position.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        let turn_id = self.state.turn_id + 1;
        self.state = GameState::opening(Board::standard());
        self.state.turn_id = turn_id;
        info!(turn_id, "Game reset for rematch");
    }
}

impl Default for TurnStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
