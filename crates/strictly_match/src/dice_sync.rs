//! Authoritative dice.
//!
//! Dice enter a match only through [`DiceSync::request_roll`]. One request
//! may be in flight at a time; a second is refused as a no-op rather than
//! queued. The local animation is fed the authoritative values and whatever
//! it reports back is ignored. Showing the dice is left to the caller, which
//! knows whether the roll is still current.

use crate::collaborators::{DiceAnimator, RandomnessAuthority, RollContext};
use crate::error::MatchError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strictly_backgammon::DiceSet;
use tracing::{debug, instrument, warn};

/// Per-match roll lock plus the collaborators a roll touches.
#[derive(Clone)]
pub struct DiceSync {
    authority: Arc<dyn RandomnessAuthority>,
    animator: Arc<dyn DiceAnimator>,
    in_flight: Arc<AtomicBool>,
}

/// Holds the roll lock; releases it on drop, including on error paths.
struct RollLease {
    in_flight: Arc<AtomicBool>,
}

impl Drop for RollLease {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

impl DiceSync {
    /// Creates a roll protocol over the given collaborators.
    pub fn new(
        authority: Arc<dyn RandomnessAuthority>,
        animator: Arc<dyn DiceAnimator>,
    ) -> Self {
        Self {
            authority,
            animator,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true while a roll request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_lease(&self) -> Option<RollLease> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RollLease {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    /// Fetches authoritative dice for `context`.
    ///
    /// Returns `Ok(None)` if another request is already in flight. On a
    /// transport failure no dice are substituted and the lock is released
    /// so the same roll can be retried.
    #[instrument(skip(self), fields(match_id = %context.match_id(), turn_id = context.turn_id()))]
    pub async fn request_roll(&self, context: &RollContext) -> Result<Option<DiceSet>, MatchError> {
        let Some(_lease) = self.try_lease() else {
            debug!("Roll already in flight, ignoring request");
            return Ok(None);
        };

        debug!(kind = ?context.kind(), "Requesting authoritative roll");
        let response = self.authority.request_roll(context).await.inspect_err(|e| {
            warn!(error = %e, "Randomness authority unavailable");
        })?;
        let dice = DiceSet::new(*context.kind(), response.dice)?;

        let shown = self.animator.animate(dice.values()).await;
        if shown.as_slice() != dice.values() {
            warn!(
                authoritative = ?dice.values(),
                animated = ?shown,
                "Animation disagreed with authority, forcing authoritative dice"
            );
        }
        Ok(Some(dice))
    }
}
