//! Core domain types for backgammon.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut, RangeInclusive};

/// Number of points on the board.
pub const POINT_COUNT: usize = 24;

/// Checkers each player owns for the whole game.
pub const CHECKERS_PER_PLAYER: u8 = 15;

/// Player in the game.
///
/// White moves from point 23 toward point 0 and bears off below 0.
/// Black moves from point 0 toward point 23 and bears off above 23.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Player {
    /// White checkers.
    White,
    /// Black checkers.
    Black,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Points making up this player's home board.
    pub fn home_range(self) -> RangeInclusive<usize> {
        match self {
            Player::White => 0..=5,
            Player::Black => 18..=23,
        }
    }

    /// Returns true if `point` lies in this player's home board.
    pub fn is_home(self, point: usize) -> bool {
        self.home_range().contains(&point)
    }

    /// Point a checker enters on from the bar with the given die.
    ///
    /// `die` must be a face value in 1..=6.
    pub fn entry_point(self, die: u8) -> usize {
        match self {
            Player::White => POINT_COUNT - usize::from(die),
            Player::Black => usize::from(die) - 1,
        }
    }

    /// Destination of a checker on `from` moved by `die`, if it stays on the board.
    pub fn advance(self, from: usize, die: u8) -> Option<usize> {
        let die = usize::from(die);
        match self {
            Player::White => from.checked_sub(die),
            Player::Black => Some(from + die).filter(|to| *to < POINT_COUNT),
        }
    }

    /// Distance from `point` to bearing off, 1-indexed.
    pub fn bear_off_position(self, point: usize) -> u8 {
        let position = match self {
            Player::White => point + 1,
            Player::Black => POINT_COUNT - point,
        };
        position as u8
    }
}

/// A value kept separately for each player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerPlayer<T> {
    /// White's value.
    pub white: T,
    /// Black's value.
    pub black: T,
}

impl<T> PerPlayer<T> {
    /// Creates a pair from both players' values.
    pub fn new(white: T, black: T) -> Self {
        Self { white, black }
    }
}

impl<T> Index<Player> for PerPlayer<T> {
    type Output = T;

    fn index(&self, player: Player) -> &T {
        match player {
            Player::White => &self.white,
            Player::Black => &self.black,
        }
    }
}

impl<T> IndexMut<Player> for PerPlayer<T> {
    fn index_mut(&mut self, player: Player) -> &mut T {
        match player {
            Player::White => &mut self.white,
            Player::Black => &mut self.black,
        }
    }
}
