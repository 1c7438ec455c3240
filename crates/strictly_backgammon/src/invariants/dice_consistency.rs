//! Dice consistency: legal moves only spend dice that are available.

use super::Invariant;
use crate::state::GameState;

/// Invariant: every legal move consumes a die still in the pool.
pub struct DiceConsistencyInvariant;

impl Invariant<GameState> for DiceConsistencyInvariant {
    fn holds(state: &GameState) -> bool {
        state
            .legal_moves()
            .iter()
            .all(|m| state.dice().contains(m.die))
    }

    fn description() -> &'static str {
        "Legal moves only use dice remaining in the pool"
    }
}
