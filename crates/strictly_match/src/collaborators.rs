//! Contracts with the outside world.
//!
//! The randomness authority and the clock authority are the source of
//! truth for dice and time. The move service picks moves for automated
//! players. The recorder persists what happened. None of them ever mutates
//! a game directly.

use crate::delay::Delay;
use crate::error::CollaboratorError;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strictly_backgammon::{Board, ClockState, HistoryEntry, Move, Player, RollKind};

/// Identifies the roll a request answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, derive_new::new, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollContext {
    /// Match the roll belongs to.
    match_id: String,
    /// Turn the request was issued against.
    turn_id: u64,
    /// Opening die or turn roll, and for whom.
    kind: RollKind,
}

/// The authority's dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResponse {
    /// Raw values, one per die rolled.
    pub dice: Vec<u8>,
}

/// Position handed to the move service.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_new::new, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    /// Match being played.
    match_id: String,
    /// Turn the moves are for.
    turn_id: u64,
    /// Player to move.
    player: Player,
    /// Current board.
    board: Board,
    /// Unused dice.
    dice: Vec<u8>,
}

/// Moves chosen by the move service, in playing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveResponse {
    /// Moves to apply.
    pub moves: Vec<Move>,
}

/// Persisted record of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, derive_new::new, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Player who moved.
    player: Player,
    /// The move.
    played: Move,
    /// Whether it sent a blot to the bar.
    hit: bool,
}

impl From<&HistoryEntry> for MoveRecord {
    fn from(entry: &HistoryEntry) -> Self {
        Self::new(*entry.player(), *entry.played(), *entry.hit())
    }
}

/// Persisted record of a turn hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, derive_new::new, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEndRecord {
    /// Player whose turn ended.
    player: Player,
    /// When it ended.
    at: DateTime<Utc>,
}

/// Source of truth for dice.
#[async_trait::async_trait]
pub trait RandomnessAuthority: Send + Sync {
    /// Rolls the dice `context` asks for.
    async fn request_roll(&self, context: &RollContext) -> Result<RollResponse, CollaboratorError>;
}

/// Picks moves for automated players.
#[async_trait::async_trait]
pub trait MoveService: Send + Sync {
    /// Returns the moves to play for the position in `request`.
    async fn request_ai_move(
        &self,
        request: &AiMoveRequest,
    ) -> Result<AiMoveResponse, CollaboratorError>;
}

/// Source of truth for time.
#[async_trait::async_trait]
pub trait ClockAuthority: Send + Sync {
    /// Returns the clock as of now, already adjusted for elapsed time.
    async fn authoritative_clock(&self, match_id: &str) -> Result<ClockState, CollaboratorError>;
}

/// Persistence sink. Writes are fire-and-forget from the game's view.
#[async_trait::async_trait]
pub trait GameRecorder: Send + Sync {
    /// Persists one move.
    async fn record_move(&self, match_id: &str, record: &MoveRecord) -> Result<(), CollaboratorError>;

    /// Persists a turn hand-off.
    async fn record_turn_end(
        &self,
        match_id: &str,
        record: &TurnEndRecord,
    ) -> Result<(), CollaboratorError>;
}

/// One-way display sink. Nothing it does feeds back into the game.
pub trait RenderSink: Send + Sync {
    /// Shows dice values.
    fn display_dice(&self, values: &[u8]);

    /// Shows the board.
    fn display_board(&self, board: &Board);
}

/// Local dice animation.
///
/// The animation is seeded with the authoritative values but may settle
/// on something else; what it reports is only used to detect desync.
#[async_trait::async_trait]
pub trait DiceAnimator: Send + Sync {
    /// Animates a roll and returns the faces it settled on.
    async fn animate(&self, values: &[u8]) -> Vec<u8>;
}

/// Everything a match controller talks to.
#[derive(Clone, derive_new::new, Setters)]
#[setters(prefix = "with_")]
pub struct Collaborators {
    /// Dice authority.
    pub authority: Arc<dyn RandomnessAuthority>,
    /// Automated move selection.
    pub move_service: Arc<dyn MoveService>,
    /// Clock authority.
    pub clock: Arc<dyn ClockAuthority>,
    /// Persistence.
    pub recorder: Arc<dyn GameRecorder>,
    /// Display sink.
    pub render: Arc<dyn RenderSink>,
    /// Dice animation.
    pub animator: Arc<dyn DiceAnimator>,
    /// Scheduler for settle, grace and backoff delays.
    pub delay: Arc<dyn Delay>,
}
