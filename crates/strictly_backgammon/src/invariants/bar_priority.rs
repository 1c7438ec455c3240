//! Bar priority: checkers on the bar must enter first.

use super::Invariant;
use crate::action::Origin;
use crate::state::GameState;

/// Invariant: while the mover has a checker on the bar, every legal move
/// starts from the bar.
pub struct BarPriorityInvariant;

impl Invariant<GameState> for BarPriorityInvariant {
    fn holds(state: &GameState) -> bool {
        state.board().bar(state.current_player()) == 0
            || state.legal_moves().iter().all(|m| m.from == Origin::Bar)
    }

    fn description() -> &'static str {
        "With a checker on the bar only bar entries are legal"
    }
}
