//! Bar entries and ordinary forward moves.

use crate::action::Move;
use crate::board::Board;
use crate::types::{POINT_COUNT, Player};

/// Moves entering a checker from the bar.
pub(super) fn bar_entries(board: &Board, player: Player, dice: &[u8]) -> Vec<Move> {
    dice.iter()
        .filter_map(|&die| {
            let entry = player.entry_point(die);
            board
                .point(entry)
                .is_open_for(player)
                .then(|| Move::enter(entry as u8, die))
        })
        .collect()
}

/// Point-to-point moves that stay on the board.
pub(super) fn standard_moves(board: &Board, player: Player, dice: &[u8]) -> Vec<Move> {
    let mut moves = Vec::new();
    for from in 0..POINT_COUNT {
        if !board.point(from).is_owned_by(player) {
            continue;
        }
        for &die in dice {
            match player.advance(from, die) {
                Some(to) if board.point(to).is_open_for(player) => {
                    moves.push(Move::step(from as u8, to as u8, die));
                }
                _ => {}
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_per_color() {
        let board = Board::empty();
        assert_eq!(
            bar_entries(&board, Player::White, &[2]),
            vec![Move::enter(22, 2)]
        );
        assert_eq!(
            bar_entries(&board, Player::Black, &[2]),
            vec![Move::enter(1, 2)]
        );
    }

    #[test]
    fn closed_entry_points_yield_nothing() {
        let board = Board::empty()
            .with_checkers(21, Player::Black, 2)
            .with_checkers(19, Player::Black, 3);
        assert!(bar_entries(&board, Player::White, &[3, 5]).is_empty());
    }

    #[test]
    fn entering_on_a_blot_is_allowed() {
        let board = Board::empty().with_checkers(21, Player::Black, 1);
        assert_eq!(
            bar_entries(&board, Player::White, &[3]),
            vec![Move::enter(21, 3)]
        );
    }

    #[test]
    fn blocked_points_are_skipped() {
        let board = Board::empty()
            .with_checkers(12, Player::White, 1)
            .with_checkers(9, Player::Black, 2)
            .with_checkers(8, Player::Black, 1);
        let moves = standard_moves(&board, Player::White, &[3, 4]);
        assert_eq!(moves, vec![Move::step(12, 8, 4)]);
    }

    #[test]
    fn moves_past_the_edge_are_not_standard_moves() {
        let board = Board::empty().with_checkers(22, Player::Black, 1);
        assert_eq!(
            standard_moves(&board, Player::Black, &[1, 6]),
            vec![Move::step(22, 23, 1)]
        );
    }
}
