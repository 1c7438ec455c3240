//! Point ownership: a point's color and count agree.

use super::Invariant;
use crate::state::GameState;

/// Invariant: an empty point has no owner and an owned point is non-empty.
pub struct PointOwnershipInvariant;

impl Invariant<GameState> for PointOwnershipInvariant {
    fn holds(state: &GameState) -> bool {
        state
            .board()
            .points()
            .iter()
            .all(|p| p.is_empty() == p.owner().is_none())
    }

    fn description() -> &'static str {
        "Every point is either empty or owned by exactly one color"
    }
}
