//! Dice values, authoritative rolls and the per-turn dice pool.
//!
//! Nothing in this crate generates random numbers. A [`DiceSet`] is built
//! from values supplied by the randomness authority and validated here.

use super::types::Player;
use serde::{Deserialize, Serialize};

/// Faces of a single die.
pub const DIE_FACES: std::ops::RangeInclusive<u8> = 1..=6;

/// What kind of roll the state machine is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "lowercase")]
pub enum RollKind {
    /// One die for `player` to decide who starts.
    Opening(Player),
    /// Two dice for `player`'s turn.
    Turn(Player),
}

impl RollKind {
    /// Player the roll belongs to.
    pub fn player(&self) -> Player {
        match self {
            RollKind::Opening(p) | RollKind::Turn(p) => *p,
        }
    }

    /// Number of dice the authority must return.
    pub fn dice_count(&self) -> usize {
        match self {
            RollKind::Opening(_) => 1,
            RollKind::Turn(_) => 2,
        }
    }
}

/// Error raised for malformed dice.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DiceError {
    /// A value outside 1..=6.
    #[display("Die value {} is outside 1..=6", _0)]
    OutOfRange(u8),

    /// Wrong number of dice for the roll kind.
    #[display("Expected {} dice, got {}", expected, actual)]
    WrongCount {
        /// Dice required by the roll kind.
        expected: usize,
        /// Dice supplied.
        actual: usize,
    },

    /// The die is not available in the pool.
    #[display("Die {} is not in the pool", _0)]
    NotInPool(u8),
}

impl std::error::Error for DiceError {}

/// Dice exactly as the authority rolled them.
///
/// Deserializing goes through the same validation as [`DiceSet::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDiceSet")]
pub struct DiceSet {
    kind: RollKind,
    values: Vec<u8>,
}

#[derive(Deserialize)]
struct UncheckedDiceSet {
    kind: RollKind,
    values: Vec<u8>,
}

impl TryFrom<UncheckedDiceSet> for DiceSet {
    type Error = DiceError;

    fn try_from(raw: UncheckedDiceSet) -> Result<Self, Self::Error> {
        DiceSet::new(raw.kind, raw.values)
    }
}

impl DiceSet {
    /// Validates authority-supplied values for a roll of `kind`.
    pub fn new(kind: RollKind, values: Vec<u8>) -> Result<Self, DiceError> {
        if values.len() != kind.dice_count() {
            return Err(DiceError::WrongCount {
                expected: kind.dice_count(),
                actual: values.len(),
            });
        }
        if let Some(bad) = values.iter().find(|v| !DIE_FACES.contains(*v)) {
            return Err(DiceError::OutOfRange(*bad));
        }
        Ok(Self { kind, values })
    }

    /// Roll kind this set answers.
    pub fn kind(&self) -> RollKind {
        self.kind
    }

    /// Values in the order the authority reported them.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Returns true for a two-dice roll showing the same face twice.
    pub fn is_double(&self) -> bool {
        matches!(self.values.as_slice(), [a, b] if a == b)
    }

    /// Usable dice for a turn: doubles are played four times.
    pub fn expand(&self) -> DicePool {
        if self.is_double() {
            DicePool::from_values(vec![self.values[0]; 4])
        } else {
            DicePool::from_values(self.values.clone())
        }
    }
}

/// Dice still available to the moving player this turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DicePool {
    dice: Vec<u8>,
}

impl DicePool {
    /// An empty pool.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_values(dice: Vec<u8>) -> Self {
        Self { dice }
    }

    /// Remaining dice.
    pub fn as_slice(&self) -> &[u8] {
        &self.dice
    }

    /// Returns true once every die is spent.
    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Number of dice left.
    pub fn len(&self) -> usize {
        self.dice.len()
    }

    /// Returns true if `die` can still be played.
    pub fn contains(&self, die: u8) -> bool {
        self.dice.contains(&die)
    }

    /// Removes one instance of `die`.
    pub fn consume(&mut self, die: u8) -> Result<(), DiceError> {
        let index = self
            .dice
            .iter()
            .position(|d| *d == die)
            .ok_or(DiceError::NotInPool(die))?;
        self.dice.remove(index);
        Ok(())
    }

    /// Returns a die to the pool (undo).
    pub(crate) fn restore(&mut self, die: u8) {
        self.dice.push(die);
    }

    pub(crate) fn clear(&mut self) {
        self.dice.clear();
    }
}
