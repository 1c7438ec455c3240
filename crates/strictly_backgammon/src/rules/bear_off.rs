//! Bearing off.

use crate::action::Move;
use crate::board::Board;
use crate::types::Player;
use tracing::instrument;

/// Returns true if `player` may bear off: nothing on the bar and every
/// checker in play inside the home board.
#[instrument(skip(board))]
pub fn can_bear_off(board: &Board, player: Player) -> bool {
    board.all_home(player)
}

/// Returns true if `player` may bear off the checker on `from` with `die`.
///
/// Exact rolls always work. A larger die works only for the rearmost
/// checker, i.e. when no checker of that color sits further from home.
#[instrument(skip(board))]
pub fn is_valid_bear_off(board: &Board, player: Player, from: usize, die: u8) -> bool {
    if !player.is_home(from) || !board.point(from).is_owned_by(player) {
        return false;
    }
    if !can_bear_off(board, player) {
        return false;
    }
    let position = player.bear_off_position(from);
    die == position || (die > position && !board.has_checker_beyond(player, position))
}

/// Bear-off moves for every home point and die.
pub(super) fn bear_off_moves(board: &Board, player: Player, dice: &[u8]) -> Vec<Move> {
    if !can_bear_off(board, player) {
        return Vec::new();
    }
    player
        .home_range()
        .flat_map(|from| dice.iter().map(move |&die| (from, die)))
        .filter(|&(from, die)| is_valid_bear_off(board, player, from, die))
        .map(|(from, die)| Move::bear_off(from as u8, die))
        .collect()
}
