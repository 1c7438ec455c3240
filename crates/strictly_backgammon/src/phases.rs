//! Game phases and outcomes.

use super::types::Player;
use serde::{Deserialize, Serialize};

/// Phase of the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Each player rolls one die to decide who starts.
    Opening,
    /// The current player must roll.
    Waiting,
    /// The current player is spending dice.
    Moving,
    /// The game is over.
    Finished,
}

/// How a game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinReason {
    /// The winner bore off all fifteen checkers.
    BoreOff,
    /// The loser's clock ran out (confirmed by the authority).
    Timeout,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning player.
    pub winner: Player,
    /// Why the game ended.
    pub reason: WinReason,
}

impl Outcome {
    /// Creates a new outcome.
    pub fn new(winner: Player, reason: WinReason) -> Self {
        Self { winner, reason }
    }

    /// Returns the losing player.
    pub fn loser(&self) -> Player {
        self.winner.opponent()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            WinReason::BoreOff => write!(f, "{} wins by bearing off", self.winner),
            WinReason::Timeout => write!(f, "{} wins on time", self.winner),
        }
    }
}
