//! First-class action types for backgammon.
//!
//! Moves are domain events: the validator produces them, the boundary
//! check compares against them, and the executor applies them. On the
//! wire, origins and destinations are plain integers where `-1` is the
//! bar and `-2` is off the board.

use super::board::Board;
use super::phases::Phase;
use super::types::{POINT_COUNT, Player};
use serde::{Deserialize, Serialize};

/// Wire sentinel for the bar.
pub const BAR: i8 = -1;

/// Wire sentinel for a borne-off checker.
pub const OFF: i8 = -2;

/// Where a moving checker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Origin {
    /// Re-entering from the bar.
    Bar,
    /// A point index (0-23).
    Point(u8),
}

/// Where a moving checker ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Destination {
    /// A point index (0-23).
    Point(u8),
    /// Borne off the board.
    Off,
}

/// An integer that is neither a sentinel nor a valid point index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{} is not a valid board location", _0)]
pub struct LocationError(pub i8);

impl std::error::Error for LocationError {}

fn point_index(raw: i8) -> Result<u8, LocationError> {
    if (0..POINT_COUNT as i8).contains(&raw) {
        Ok(raw as u8)
    } else {
        Err(LocationError(raw))
    }
}

impl From<Origin> for i8 {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Bar => BAR,
            Origin::Point(p) => p as i8,
        }
    }
}

impl TryFrom<i8> for Origin {
    type Error = LocationError;

    fn try_from(raw: i8) -> Result<Self, Self::Error> {
        if raw == BAR {
            Ok(Origin::Bar)
        } else {
            point_index(raw).map(Origin::Point)
        }
    }
}

impl From<Destination> for i8 {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Point(p) => p as i8,
            Destination::Off => OFF,
        }
    }
}

impl TryFrom<i8> for Destination {
    type Error = LocationError;

    fn try_from(raw: i8) -> Result<Self, Self::Error> {
        if raw == OFF {
            Ok(Destination::Off)
        } else {
            point_index(raw).map(Destination::Point)
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Bar => write!(f, "bar"),
            Origin::Point(p) => write!(f, "{}", p),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Point(p) => write!(f, "{}", p),
            Destination::Off => write!(f, "off"),
        }
    }
}

/// A single checker movement consuming one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    /// Starting location.
    pub from: Origin,
    /// Ending location.
    pub to: Destination,
    /// Die value consumed.
    pub die: u8,
}

impl Move {
    /// Creates a new move.
    pub fn new(from: Origin, to: Destination, die: u8) -> Self {
        Self { from, to, die }
    }

    /// Point-to-point move.
    pub fn step(from: u8, to: u8, die: u8) -> Self {
        Self::new(Origin::Point(from), Destination::Point(to), die)
    }

    /// Bar-entry move.
    pub fn enter(to: u8, die: u8) -> Self {
        Self::new(Origin::Bar, Destination::Point(to), die)
    }

    /// Bear-off move.
    pub fn bear_off(from: u8, die: u8) -> Self {
        Self::new(Origin::Point(from), Destination::Off, die)
    }

    /// Returns true if the checker leaves the board.
    pub fn is_bear_off(&self) -> bool {
        self.to == Destination::Off
    }

    /// Returns true if the checker enters from the bar.
    pub fn is_bar_entry(&self) -> bool {
        self.from == Origin::Bar
    }

    /// Returns true if this move captures an opposing blot on `board`.
    pub fn is_hit(&self, board: &Board, player: Player) -> bool {
        match self.to {
            Destination::Point(p) => board.point(usize::from(p)).is_blot_of(player.opponent()),
            Destination::Off => false,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.from, self.to, self.die)
    }
}

/// A completed move together with the board it was played on.
///
/// Undo restores `prior_board` and hands `die` back to the pool instead
/// of reversing the move, since a hit cannot be inverted from the move
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct HistoryEntry {
    /// Board before the move (and before any capture).
    prior_board: Board,
    /// Player who moved.
    player: Player,
    /// The move played.
    played: Move,
    /// Whether an opposing blot went to the bar.
    hit: bool,
}

impl HistoryEntry {
    pub(crate) fn new(prior_board: Board, player: Player, played: Move, hit: bool) -> Self {
        Self {
            prior_board,
            player,
            played,
            hit,
        }
    }
}

/// Error that can occur when validating or applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The move is not in the current legal-move set.
    #[display("{} is not a legal move", _0)]
    NotLegal(Move),

    /// Moves are only accepted while a player is moving.
    #[display("Moves are not accepted in the {:?} phase", _0)]
    WrongPhase(Phase),

    /// A hit is waiting for its second phase.
    #[display("A hit is still settling")]
    HitPending,

    /// There is no hit waiting to be resolved.
    #[display("No hit is waiting to be resolved")]
    NoHitPending,

    /// Nothing has been played this turn.
    #[display("No move to undo")]
    NothingToUndo,

    /// The selected origin has no legal moves.
    #[display("No legal moves from {}", _0)]
    NoMovesFrom(Origin),

    /// An invariant was violated (postcondition failure).
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for MoveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_convert_both_ways() {
        assert_eq!(i8::from(Origin::Bar), BAR);
        assert_eq!(i8::from(Destination::Off), OFF);
        assert_eq!(Origin::try_from(-1), Ok(Origin::Bar));
        assert_eq!(Destination::try_from(-2), Ok(Destination::Off));
        assert_eq!(Origin::try_from(7), Ok(Origin::Point(7)));
    }

    #[test]
    fn rejects_swapped_sentinels() {
        assert_eq!(Origin::try_from(OFF), Err(LocationError(OFF)));
        assert_eq!(Destination::try_from(BAR), Err(LocationError(BAR)));
        assert_eq!(Origin::try_from(24), Err(LocationError(24)));
    }

    #[test]
    fn moves_serialize_with_integer_locations() {
        let mv = Move::enter(20, 4);
        let json = serde_json::to_value(mv).expect("serialize");
        assert_eq!(json, serde_json::json!({"from": -1, "to": 20, "die": 4}));

        let back: Move = serde_json::from_value(serde_json::json!({"from": 3, "to": -2, "die": 5}))
            .expect("deserialize");
        assert_eq!(back, Move::bear_off(3, 5));
    }
}
