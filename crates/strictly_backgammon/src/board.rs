//! Board model: 24 points, the bar and the borne-off tray.

use super::action::{Destination, Move, Origin};
use super::types::{CHECKERS_PER_PLAYER, POINT_COUNT, PerPlayer, Player};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// A stack of checkers on one point.
///
/// A point only ever holds one color; an empty point has no owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    owner: Option<Player>,
    count: u8,
}

impl Point {
    /// An empty point.
    pub const EMPTY: Point = Point {
        owner: None,
        count: 0,
    };

    /// Creates a point holding `count` checkers of `player`.
    pub fn stack(player: Player, count: u8) -> Self {
        if count == 0 {
            Self::EMPTY
        } else {
            Self {
                owner: Some(player),
                count,
            }
        }
    }

    /// Color of the checkers on this point.
    pub fn owner(&self) -> Option<Player> {
        self.owner
    }

    /// Number of checkers on this point.
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Returns true if no checker is on this point.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the topmost checker belongs to `player`.
    pub fn is_owned_by(&self, player: Player) -> bool {
        self.owner == Some(player)
    }

    /// Returns true if exactly one checker of `player` sits here.
    pub fn is_blot_of(&self, player: Player) -> bool {
        self.owner == Some(player) && self.count == 1
    }

    /// Occupancy rule: `player` may land here if the point is empty, holds
    /// their own checkers, or holds a single opposing checker.
    pub fn is_open_for(&self, player: Player) -> bool {
        match self.owner {
            None => true,
            Some(owner) if owner == player => true,
            Some(_) => self.count == 1,
        }
    }

    fn push(&mut self, player: Player) {
        debug_assert!(self.owner.is_none() || self.owner == Some(player));
        self.owner = Some(player);
        self.count += 1;
    }

    fn pop(&mut self) -> Option<Player> {
        let owner = self.owner?;
        self.count -= 1;
        if self.count == 0 {
            self.owner = None;
        }
        Some(owner)
    }
}

/// Backgammon board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    points: [Point; POINT_COUNT],
    bar: PerPlayer<u8>,
    off: PerPlayer<u8>,
}

impl Board {
    /// Creates a board with no checkers at all.
    ///
    /// Use the `with_*` builders to lay out a position.
    pub fn empty() -> Self {
        Self {
            points: [Point::EMPTY; POINT_COUNT],
            bar: PerPlayer::default(),
            off: PerPlayer::default(),
        }
    }

    /// Creates the standard starting position.
    pub fn standard() -> Self {
        Self::empty()
            .with_checkers(23, Player::White, 2)
            .with_checkers(12, Player::White, 5)
            .with_checkers(7, Player::White, 3)
            .with_checkers(5, Player::White, 5)
            .with_checkers(0, Player::Black, 2)
            .with_checkers(11, Player::Black, 5)
            .with_checkers(16, Player::Black, 3)
            .with_checkers(18, Player::Black, 5)
    }

    /// Replaces the contents of `point` with `count` checkers of `player`.
    pub fn with_checkers(mut self, point: usize, player: Player, count: u8) -> Self {
        self.points[point] = Point::stack(player, count);
        self
    }

    /// Sets the number of `player`'s checkers on the bar.
    pub fn with_bar(mut self, player: Player, count: u8) -> Self {
        self.bar[player] = count;
        self
    }

    /// Sets the number of `player`'s checkers already borne off.
    pub fn with_off(mut self, player: Player, count: u8) -> Self {
        self.off[player] = count;
        self
    }

    /// Returns the point at `index` (0-23).
    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// Returns all points.
    pub fn points(&self) -> &[Point; POINT_COUNT] {
        &self.points
    }

    /// Checkers of `player` waiting on the bar.
    pub fn bar(&self, player: Player) -> u8 {
        self.bar[player]
    }

    /// Checkers of `player` borne off.
    pub fn off(&self, player: Player) -> u8 {
        self.off[player]
    }

    /// Checkers of `player` on the 24 points.
    pub fn on_board(&self, player: Player) -> u8 {
        self.points
            .iter()
            .filter(|p| p.is_owned_by(player))
            .map(Point::count)
            .sum()
    }

    /// All checkers of `player`, wherever they are. Always 15 in a real game.
    pub fn checker_total(&self, player: Player) -> u8 {
        self.on_board(player) + self.bar[player] + self.off[player]
    }

    /// Returns true if every checker of `player` still in play sits in their home board.
    pub fn all_home(&self, player: Player) -> bool {
        self.bar[player] == 0
            && self
                .points
                .iter()
                .enumerate()
                .all(|(i, p)| !p.is_owned_by(player) || player.is_home(i))
    }

    /// Returns true if `player` has a checker further from bearing off than `position`.
    pub fn has_checker_beyond(&self, player: Player, position: u8) -> bool {
        self.bar[player] > 0
            || self
                .points
                .iter()
                .enumerate()
                .any(|(i, p)| p.is_owned_by(player) && player.bear_off_position(i) > position)
    }

    /// Total pips `player` needs to bear everything off. Bar checkers count 25.
    pub fn pip_count(&self, player: Player) -> u32 {
        let on_points: u32 = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_owned_by(player))
            .map(|(i, p)| u32::from(player.bear_off_position(i)) * u32::from(p.count))
            .sum();
        on_points + 25 * u32::from(self.bar[player])
    }

    /// Returns true once `player` has borne off every checker.
    pub fn has_borne_off_all(&self, player: Player) -> bool {
        self.off[player] == CHECKERS_PER_PLAYER
    }

    /// Returns the board that results from `player` playing `mv`.
    ///
    /// `mv` is trusted to be legal on this board.
    pub fn after_move(&self, player: Player, mv: &Move) -> Board {
        let mut next = self.clone();
        if let Destination::Point(to) = mv.to {
            next.capture(usize::from(to), player);
        }
        next.relocate(player, mv);
        next
    }

    /// First half of a hit: sends a lone opposing checker on `point` to the bar.
    ///
    /// Returns the captured color, or `None` if there was no blot to take.
    pub(crate) fn capture(&mut self, point: usize, mover: Player) -> Option<Player> {
        let victim = mover.opponent();
        if !self.points[point].is_blot_of(victim) {
            return None;
        }
        self.points[point].pop();
        self.bar[victim] += 1;
        Some(victim)
    }

    /// Moves one checker of `player` from `mv.from` to `mv.to`.
    pub(crate) fn relocate(&mut self, player: Player, mv: &Move) {
        match mv.from {
            Origin::Bar => self.bar[player] -= 1,
            Origin::Point(p) => {
                let lifted = self.points[usize::from(p)].pop();
                debug_assert_eq!(lifted, Some(player));
            }
        }
        match mv.to {
            Destination::Point(p) => self.points[usize::from(p)].push(player),
            Destination::Off => self.off[player] += 1,
        }
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let cell = |i: usize| match self.points[i].owner {
            None => " .".to_string(),
            Some(Player::White) => format!("{:>2}", format!("{}W", self.points[i].count)),
            Some(Player::Black) => format!("{:>2}", format!("{}B", self.points[i].count)),
        };
        let top: Vec<String> = (12..24).map(|i| format!("{:>4}", cell(i))).collect();
        let bottom: Vec<String> = (0..12).rev().map(|i| format!("{:>4}", cell(i))).collect();
        let mut out = String::new();
        out.push_str(&top.join(""));
        out.push('\n');
        out.push_str(&bottom.join(""));
        for player in Player::iter() {
            out.push_str(&format!(
                "\n{}: bar {} off {} pips {}",
                player,
                self.bar[player],
                self.off[player],
                self.pip_count(player)
            ));
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
