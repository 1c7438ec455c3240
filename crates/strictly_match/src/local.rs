//! In-process collaborators for self-play and tests.

use crate::collaborators::{
    AiMoveRequest, AiMoveResponse, ClockAuthority, Collaborators, DiceAnimator, GameRecorder,
    MoveRecord, MoveService, RandomnessAuthority, RenderSink, RollContext, RollResponse,
    TurnEndRecord,
};
use crate::config::MatchConfig;
use crate::delay::TokioDelay;
use crate::error::CollaboratorError;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strictly_backgammon::{Board, ClockState, DIE_FACES, Move, Player, legal_moves};
use tracing::{debug, info, instrument};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated game server: seeded dice, server-side clock accounting and an
/// in-memory move log.
#[derive(Debug)]
pub struct LocalAuthority {
    rng: Mutex<StdRng>,
    clock: Mutex<ClockState>,
    moves: Mutex<Vec<MoveRecord>>,
}

impl LocalAuthority {
    /// Creates an authority. A seed makes the dice reproducible.
    #[instrument]
    pub fn new(seed: Option<u64>, initial_clock: Duration) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(?seed, "Local authority ready");
        Self {
            rng: Mutex::new(rng),
            clock: Mutex::new(ClockState::new(initial_clock)),
            moves: Mutex::new(Vec::new()),
        }
    }

    /// Moves recorded so far.
    pub fn moves(&self) -> Vec<MoveRecord> {
        lock(&self.moves).clone()
    }

    /// The clock as of `now`, charging the player on the clock for the
    /// time since the last hand-off.
    pub fn clock_at(&self, now: DateTime<Utc>) -> ClockState {
        let mut clock = *lock(&self.clock);
        if let (Some(color), Some(since)) = (clock.on_clock(), clock.last_action_at) {
            charge(&mut clock, color, now - since);
        }
        clock
    }
}

fn charge(clock: &mut ClockState, color: Player, elapsed: chrono::TimeDelta) {
    let elapsed_ms = u64::try_from(elapsed.num_milliseconds()).unwrap_or(0);
    let remaining = match color {
        Player::White => &mut clock.white_remaining_ms,
        Player::Black => &mut clock.black_remaining_ms,
    };
    *remaining = remaining.saturating_sub(elapsed_ms);
}

#[async_trait::async_trait]
impl RandomnessAuthority for LocalAuthority {
    async fn request_roll(&self, context: &RollContext) -> Result<RollResponse, CollaboratorError> {
        let mut rng = lock(&self.rng);
        let dice = (0..context.kind().dice_count())
            .map(|_| rng.gen_range(DIE_FACES))
            .collect::<Vec<_>>();
        debug!(?dice, "Local roll");
        Ok(RollResponse { dice })
    }
}

#[async_trait::async_trait]
impl ClockAuthority for LocalAuthority {
    async fn authoritative_clock(&self, _match_id: &str) -> Result<ClockState, CollaboratorError> {
        Ok(self.clock_at(Utc::now()))
    }
}

#[async_trait::async_trait]
impl GameRecorder for LocalAuthority {
    async fn record_move(&self, _match_id: &str, record: &MoveRecord) -> Result<(), CollaboratorError> {
        lock(&self.moves).push(*record);
        Ok(())
    }

    async fn record_turn_end(
        &self,
        _match_id: &str,
        record: &TurnEndRecord,
    ) -> Result<(), CollaboratorError> {
        let mut clock = lock(&self.clock);
        let player = *record.player();
        let at = *record.at();
        if let (Some(color), Some(since)) = (clock.on_clock(), clock.last_action_at) {
            if color == player {
                charge(&mut clock, color, at - since);
            }
        }
        clock.last_action_by = Some(player);
        clock.last_action_at = Some(at);
        Ok(())
    }
}

/// Plays the first legal move for every die, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLegalMove;

impl FirstLegalMove {
    /// Picks a full turn's moves for `player`.
    pub fn choose(board: &Board, player: Player, dice: &[u8]) -> Vec<Move> {
        let mut board = board.clone();
        let mut dice = dice.to_vec();
        let mut chosen = Vec::new();
        while let Some(mv) = legal_moves(&board, player, &dice).first().copied() {
            board = board.after_move(player, &mv);
            if let Some(index) = dice.iter().position(|d| *d == mv.die) {
                dice.remove(index);
            }
            chosen.push(mv);
        }
        chosen
    }
}

#[async_trait::async_trait]
impl MoveService for FirstLegalMove {
    async fn request_ai_move(
        &self,
        request: &AiMoveRequest,
    ) -> Result<AiMoveResponse, CollaboratorError> {
        let moves = Self::choose(request.board(), *request.player(), request.dice());
        Ok(AiMoveResponse { moves })
    }
}

/// Writes dice and boards to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

impl RenderSink for LogRenderer {
    fn display_dice(&self, values: &[u8]) {
        info!(?values, "Dice");
    }

    fn display_board(&self, board: &Board) {
        debug!("\n{}", board.display());
    }
}

/// Tumbling dice that settle on random faces.
///
/// Stands in for a physics animation that cannot be forced; its faces are
/// discarded in favor of the authority's.
#[derive(Debug)]
pub struct TumblingAnimator {
    rng: Mutex<StdRng>,
}

impl TumblingAnimator {
    /// Creates an animator. A seed makes the tumbling reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait::async_trait]
impl DiceAnimator for TumblingAnimator {
    async fn animate(&self, values: &[u8]) -> Vec<u8> {
        let mut rng = lock(&self.rng);
        values.iter().map(|_| rng.gen_range(DIE_FACES)).collect()
    }
}

impl Collaborators {
    /// Everything in-process: a [`LocalAuthority`] for dice, clock and
    /// persistence, [`FirstLegalMove`] for automated players.
    pub fn local(seed: Option<u64>, config: &MatchConfig) -> Self {
        let authority = Arc::new(LocalAuthority::new(seed, config.initial_clock()));
        Self::new(
            authority.clone(),
            Arc::new(FirstLegalMove),
            authority.clone(),
            authority,
            Arc::new(LogRenderer),
            Arc::new(TumblingAnimator::new(seed)),
            Arc::new(TokioDelay),
        )
    }
}
