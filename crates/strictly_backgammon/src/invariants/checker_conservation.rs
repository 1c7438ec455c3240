//! Checker conservation: nothing is created or destroyed.

use super::Invariant;
use crate::state::GameState;
use crate::types::{CHECKERS_PER_PLAYER, Player};

/// Invariant: each color has exactly 15 checkers across points, bar and off.
pub struct CheckerConservationInvariant;

impl Invariant<GameState> for CheckerConservationInvariant {
    fn holds(state: &GameState) -> bool {
        [Player::White, Player::Black]
            .into_iter()
            .all(|p| state.board().checker_total(p) == CHECKERS_PER_PLAYER)
    }

    fn description() -> &'static str {
        "Each player has exactly 15 checkers on points, bar and off"
    }
}
