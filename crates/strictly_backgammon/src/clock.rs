//! Chess-clock reconciliation.
//!
//! The authority's clock is the truth. Remaining time is correct as of
//! `last_action_at`, and the authority has already subtracted whatever
//! elapsed since then when it hands out a snapshot. Local state therefore
//! absorbs snapshots through one entry point that replaces, never adjusts.
//! Local ticking is cosmetic and a local zero only triggers a question to
//! the authority.

use super::phases::Phase;
use super::types::Player;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Length of one cosmetic tick in milliseconds.
pub const TICK_MS: u64 = 1_000;

/// Both countdowns plus the hand-off marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    /// White's remaining time in milliseconds.
    pub white_remaining_ms: u64,
    /// Black's remaining time in milliseconds.
    pub black_remaining_ms: u64,
    /// Player who most recently completed a turn-ending action.
    pub last_action_by: Option<Player>,
    /// When that action completed.
    pub last_action_at: Option<DateTime<Utc>>,
}

impl ClockState {
    /// Both players start with `initial`; nobody is on the clock yet.
    pub fn new(initial: Duration) -> Self {
        let ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
        Self {
            white_remaining_ms: ms,
            black_remaining_ms: ms,
            last_action_by: None,
            last_action_at: None,
        }
    }

    /// Remaining milliseconds for `color`.
    pub fn remaining_ms(&self, color: Player) -> u64 {
        match color {
            Player::White => self.white_remaining_ms,
            Player::Black => self.black_remaining_ms,
        }
    }

    /// The player whose clock is running: the one who did not act last.
    pub fn on_clock(&self) -> Option<Player> {
        self.last_action_by.map(Player::opponent)
    }

    fn remaining_mut(&mut self, color: Player) -> &mut u64 {
        match color {
            Player::White => &mut self.white_remaining_ms,
            Player::Black => &mut self.black_remaining_ms,
        }
    }
}

/// What a local zero means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCheck {
    /// Time remains locally.
    Running,
    /// The local counter reached zero; ask the authority before acting.
    ConfirmWithAuthority,
}

/// The authority's answer to a local zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutVerdict {
    /// The authority agrees: the player has flagged.
    Confirmed,
    /// The authority still shows time left; the local counter was corrected.
    Rejected {
        /// Remaining time according to the authority.
        remaining_ms: u64,
    },
}

/// Local view of the match clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReconciler {
    state: ClockState,
    frozen_for: Option<Player>,
    awaiting_snapshot: bool,
}

impl ClockReconciler {
    /// Creates a clock with `initial` time per player.
    pub fn new(initial: Duration) -> Self {
        Self {
            state: ClockState::new(initial),
            frozen_for: None,
            awaiting_snapshot: false,
        }
    }

    /// Current clock state.
    pub fn state(&self) -> &ClockState {
        &self.state
    }

    /// Remaining milliseconds for `color`.
    pub fn remaining_ms(&self, color: Player) -> u64 {
        self.state.remaining_ms(color)
    }

    /// The player whose clock is running.
    pub fn on_clock(&self) -> Option<Player> {
        self.state.on_clock()
    }

    /// Returns true while ticks are ignored until a snapshot arrives.
    pub fn is_suspended(&self) -> bool {
        self.awaiting_snapshot
    }

    /// Replaces local state with the authority's snapshot.
    ///
    /// The snapshot is already adjusted for elapsed time; nothing is
    /// subtracted here. Applying the same snapshot twice is a no-op.
    #[instrument(skip(self))]
    pub fn apply_authoritative_snapshot(&mut self, snapshot: ClockState) {
        if self.state != snapshot {
            debug!(
                white_ms = snapshot.white_remaining_ms,
                black_ms = snapshot.black_remaining_ms,
                "Clock replaced from snapshot"
            );
        }
        self.state = snapshot;
        self.awaiting_snapshot = false;
    }

    /// Stops local ticking until the next snapshot.
    ///
    /// Call when the process stops observing the clock (backgrounded,
    /// disconnected); local time is unreliable until the authority answers.
    #[instrument(skip(self))]
    pub fn suspend(&mut self) {
        self.awaiting_snapshot = true;
    }

    /// Records a turn-ending action: `actor`'s clock stops and the
    /// opponent's starts.
    #[instrument(skip(self))]
    pub fn on_action_completed(&mut self, actor: Player, at: DateTime<Utc>) {
        self.state.last_action_by = Some(actor);
        self.state.last_action_at = Some(at);
        debug!(on_clock = %actor.opponent(), "Clock handed off");
    }

    /// Sets or clears the automated actor that is currently thinking.
    ///
    /// While one is set, no clock is charged.
    #[instrument(skip(self))]
    pub fn on_freeze_condition(&mut self, active_computed_player: Option<Player>) {
        self.frozen_for = active_computed_player;
    }

    /// Cosmetic one-second decrement of the player on the clock.
    ///
    /// Returns the player charged, if any.
    pub fn tick(&mut self, phase: Phase) -> Option<Player> {
        if self.awaiting_snapshot || self.frozen_for.is_some() {
            return None;
        }
        if matches!(phase, Phase::Opening | Phase::Finished) {
            return None;
        }
        let color = self.state.on_clock()?;
        let remaining = self.state.remaining_mut(color);
        *remaining = remaining.saturating_sub(TICK_MS);
        debug!(%color, remaining_ms = *remaining, "Clock tick");
        Some(color)
    }

    /// Checks whether `color`'s local counter has reached zero.
    pub fn check_timeout(&self, color: Player) -> TimeoutCheck {
        if self.state.remaining_ms(color) == 0 {
            TimeoutCheck::ConfirmWithAuthority
        } else {
            TimeoutCheck::Running
        }
    }

    /// Settles a local zero against the authority's snapshot.
    ///
    /// The snapshot is applied either way.
    #[instrument(skip(self, snapshot))]
    pub fn confirm_timeout(&mut self, color: Player, snapshot: ClockState) -> TimeoutVerdict {
        self.apply_authoritative_snapshot(snapshot);
        match snapshot.remaining_ms(color) {
            0 => {
                info!(%color, "Timeout confirmed by authority");
                TimeoutVerdict::Confirmed
            }
            remaining_ms => {
                warn!(%color, remaining_ms, "Local clock ran ahead of authority");
                TimeoutVerdict::Rejected { remaining_ms }
            }
        }
    }
}
