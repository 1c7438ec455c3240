//! Match-level error types.

use derive_more::{Display, Error, From};
use strictly_backgammon::{DiceError, MoveError, Player, TransitionError};
use tracing::instrument;

/// Failure talking to an external collaborator, with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Collaborator error: {} at {}:{}", message, file, line)]
pub struct CollaboratorError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CollaboratorError {
    /// Creates a new collaborator error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err))
    }
}

/// Everything a match operation can fail with.
#[derive(Debug, Clone, Display, From)]
pub enum MatchError {
    /// A collaborator was unreachable or answered badly. Retryable.
    #[display("{}", _0)]
    Collaborator(CollaboratorError),

    /// The move was rejected at the boundary.
    #[display("Move rejected: {}", _0)]
    Move(MoveError),

    /// The transition is not allowed right now.
    #[display("Transition rejected: {}", _0)]
    Transition(TransitionError),

    /// The authority sent dice that are not a valid roll.
    #[display("Authority sent invalid dice: {}", _0)]
    Dice(DiceError),

    /// The player to act is not automated.
    #[from(ignore)]
    #[display("{} is not an automated player", _0)]
    NotAutomated(Player),

    /// The move service returned nothing usable.
    #[from(ignore)]
    #[display("Move service returned no playable move")]
    NoPlayableMove,
}

impl std::error::Error for MatchError {}

impl MatchError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::Collaborator(_))
    }
}
