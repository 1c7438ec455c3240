//! First-class invariants for backgammon.
//!
//! Invariants are logical properties of a [`GameState`] that hold after
//! every completed transition. They run as postconditions in debug builds
//! and can be tested independently.

use crate::state::GameState;

// ─────────────────────────────────────────────────────────────
//  Invariant Trait
// ─────────────────────────────────────────────────────────────

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Invariant Sets
// ─────────────────────────────────────────────────────────────

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn check<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

fn collect(violations: Vec<InvariantViolation>) -> Result<(), Vec<InvariantViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        collect(violations)
    }
}

impl<S, I1, I2, I3, I4> InvariantSet<S> for (I1, I2, I3, I4)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
    I4: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        check::<S, I3>(state, &mut violations);
        check::<S, I4>(state, &mut violations);
        collect(violations)
    }
}

// ─────────────────────────────────────────────────────────────
//  Backgammon Invariants
// ─────────────────────────────────────────────────────────────

pub mod bar_priority;
pub mod checker_conservation;
pub mod dice_consistency;
pub mod point_ownership;

pub use bar_priority::BarPriorityInvariant;
pub use checker_conservation::CheckerConservationInvariant;
pub use dice_consistency::DiceConsistencyInvariant;
pub use point_ownership::PointOwnershipInvariant;

/// All backgammon invariants as a composable set.
pub type BackgammonInvariants = (
    CheckerConservationInvariant,
    PointOwnershipInvariant,
    BarPriorityInvariant,
    DiceConsistencyInvariant,
);

/// Board-only invariants, valid even mid-hit.
pub type BoardInvariants = (CheckerConservationInvariant, PointOwnershipInvariant);
