//! Move validation.
//!
//! [`legal_moves`] is a pure function of the board, the acting player and
//! the unused dice. It never mutates and never rolls.

mod bear_off;
mod movement;

pub use bear_off::{can_bear_off, is_valid_bear_off};

use super::action::Move;
use super::board::Board;
use super::dice::DIE_FACES;
use super::types::Player;
use tracing::{debug, instrument};

/// Computes every legal single-die move for `player`.
///
/// Priority order:
/// 1. With a checker on the bar only bar entries are generated, even if
///    none is possible.
/// 2. Otherwise every forward move landing on an open point.
/// 3. Bear-off moves once the player may bear off.
///
/// Each distinct die value is considered once, so doubles do not produce
/// duplicate moves. Values outside 1..=6 are ignored.
#[instrument(skip(board))]
pub fn legal_moves(board: &Board, player: Player, dice: &[u8]) -> Vec<Move> {
    let mut distinct = dice
        .iter()
        .copied()
        .filter(|die| DIE_FACES.contains(die))
        .collect::<Vec<_>>();
    distinct.sort_unstable();
    distinct.dedup();

    let moves = if board.bar(player) > 0 {
        movement::bar_entries(board, player, &distinct)
    } else {
        let mut moves = movement::standard_moves(board, player, &distinct);
        moves.extend(bear_off::bear_off_moves(board, player, &distinct));
        moves
    };

    debug!(count = moves.len(), "Generated legal moves");
    moves
}
