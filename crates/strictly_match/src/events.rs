//! Events published to UI consumers.

use crate::collaborators::MoveRecord;
use serde::Serialize;
use strictly_backgammon::{ClockState, Move, Outcome, Player, RollKind};

/// Something that happened in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum MatchEvent {
    /// Authoritative dice are on the table.
    DiceShown {
        /// Which roll this was.
        kind: RollKind,
        /// The values.
        values: Vec<u8>,
    },
    /// An automated player started its turn.
    Thinking {
        /// Automated player.
        player: Player,
    },
    /// A blot is on the bar; the hitter lands after the settle delay.
    HitPending {
        /// Player hitting.
        player: Player,
        /// Move being played.
        mv: Move,
    },
    /// A move landed.
    MoveApplied {
        /// What was played.
        record: MoveRecord,
    },
    /// The turn passed.
    TurnEnded {
        /// Player whose turn ended.
        player: Player,
        /// Player now on turn.
        next: Player,
        /// True if the player rolled without any legal move.
        auto_passed: bool,
    },
    /// The game is over.
    GameFinished {
        /// Result.
        outcome: Outcome,
    },
    /// The clock was replaced from an authoritative snapshot.
    ClockUpdated {
        /// New clock.
        clock: ClockState,
    },
    /// The game was reset for a rematch.
    Reset,
}
