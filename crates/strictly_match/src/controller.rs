//! Per-match controller.
//!
//! A [`MatchController`] owns one game and one clock. It is the single
//! writer for both: callers clone the handle, but every mutation goes
//! through a short critical section that is never held across an await.
//! The roll lock and the automated-player switches live here too, so a
//! fresh controller per test starts from a clean slate.

use crate::collaborators::{AiMoveRequest, Collaborators, MoveRecord, RollContext, TurnEndRecord};
use crate::config::MatchConfig;
use crate::dice_sync::DiceSync;
use crate::error::MatchError;
use crate::events::MatchEvent;
use crate::recorder::Persistence;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strictly_backgammon::{
    ClockReconciler, ClockState, GameState, Move, MoveOutcome, Origin, Outcome, PerPlayer, Phase,
    Player, RollOutcome, TICK_MS, TimeoutCheck, TimeoutVerdict, TransitionError,
    TurnStateMachine,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Rounds of move-service requests per automated turn.
const MAX_SERVICE_ROUNDS: usize = 4;

/// What a roll request led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollProgress {
    /// The dice reached the game.
    Resolved(RollOutcome),
    /// Another roll was already in flight; nothing happened.
    Duplicate,
    /// The game moved on while the dice were in flight; they were dropped.
    Stale,
}

struct MatchState {
    machine: TurnStateMachine,
    clock: ClockReconciler,
    automated: PerPlayer<bool>,
}

/// Cloneable handle to one match.
#[derive(Clone)]
pub struct MatchController {
    match_id: String,
    config: MatchConfig,
    state: Arc<Mutex<MatchState>>,
    collaborators: Collaborators,
    dice: DiceSync,
    persistence: Persistence,
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl MatchController {
    /// Creates a controller for a new game from the standard position.
    ///
    /// Returns the receiving end of the match's event stream.
    pub fn new(
        match_id: impl Into<String>,
        config: MatchConfig,
        collaborators: Collaborators,
    ) -> (Self, mpsc::UnboundedReceiver<MatchEvent>) {
        Self::with_machine(match_id, config, collaborators, TurnStateMachine::new())
    }

    /// Creates a controller around an existing game.
    #[instrument(skip_all)]
    pub fn with_machine(
        match_id: impl Into<String>,
        config: MatchConfig,
        collaborators: Collaborators,
        machine: TurnStateMachine,
    ) -> (Self, mpsc::UnboundedReceiver<MatchEvent>) {
        let match_id = match_id.into();
        info!(%match_id, "Creating match controller");
        let (events, rx) = mpsc::unbounded_channel();
        let dice = DiceSync::new(
            Arc::clone(&collaborators.authority),
            Arc::clone(&collaborators.animator),
        );
        let persistence = Persistence::new(
            Arc::clone(&collaborators.recorder),
            Arc::clone(&collaborators.delay),
            &config,
        );
        let state = MatchState {
            machine,
            clock: ClockReconciler::new(config.initial_clock()),
            automated: PerPlayer::default(),
        };
        let controller = Self {
            match_id,
            config,
            state: Arc::new(Mutex::new(state)),
            collaborators,
            dice,
            persistence,
            events,
        };
        (controller, rx)
    }

    fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MatchEvent) {
        if self.events.send(event).is_err() {
            debug!("No event listener attached");
        }
    }

    /// Match identifier.
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// Snapshot of the game state.
    pub fn game(&self) -> GameState {
        self.lock().machine.state().clone()
    }

    /// Snapshot of the local clock.
    pub fn clock(&self) -> ClockState {
        *self.lock().clock.state()
    }

    /// The game's result, once it is over.
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().machine.state().outcome().copied()
    }

    /// Returns true while a roll request is outstanding.
    pub fn roll_pending(&self) -> bool {
        self.dice.is_pending()
    }

    /// Hands `player`'s decisions to the move service, or takes them back.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn set_automated(&self, player: Player, automated: bool) {
        self.lock().automated[player] = automated;
        info!(%player, automated, "Player control changed");
    }

    /// Rolls for whoever the game is waiting on.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn roll(&self) -> Result<RollProgress, MatchError> {
        let context = {
            let state = self.lock();
            let game = state.machine.state();
            let kind = state
                .machine
                .expected_roll()
                .ok_or(TransitionError::WrongPhase {
                    transition: "roll",
                    phase: game.phase(),
                })?;
            RollContext::new(self.match_id.clone(), game.turn_id(), kind)
        };

        let Some(dice) = self.dice.request_roll(&context).await? else {
            return Ok(RollProgress::Duplicate);
        };
        let values = dice.values().to_vec();

        let (outcome, board, at) = {
            let mut state = self.lock();
            let current = state.machine.state().turn_id();
            if current != *context.turn_id()
                || state.machine.expected_roll() != Some(*context.kind())
            {
                warn!(
                    issued = context.turn_id(),
                    current, "Discarding stale roll response"
                );
                return Ok(RollProgress::Stale);
            }
            let outcome = state.machine.roll_resolved(dice)?;
            let at = Utc::now();
            match outcome {
                RollOutcome::OpeningDecided { first } => {
                    state.clock.on_action_completed(first.opponent(), at)
                }
                RollOutcome::AutoPassed { player, .. } => {
                    state.clock.on_action_completed(player, at)
                }
                _ => {}
            }
            (outcome, state.machine.state().board().clone(), at)
        };

        self.collaborators.render.display_dice(&values);
        self.emit(MatchEvent::DiceShown {
            kind: *context.kind(),
            values,
        });
        self.collaborators.render.display_board(&board);
        match outcome {
            RollOutcome::OpeningDecided { first } => {
                self.report_hand_off(first.opponent(), at).await;
            }
            RollOutcome::AutoPassed { player, next } => {
                self.after_hand_off(player, next, at, true).await;
            }
            _ => {}
        }
        Ok(RollProgress::Resolved(outcome))
    }

    /// Selects the checker to move.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn select_origin(&self, origin: Origin) -> Result<Vec<Move>, MatchError> {
        Ok(self.lock().machine.select_origin(origin)?)
    }

    /// Plays a move. A hit settles for the configured delay before the
    /// hitter lands.
    ///
    /// If the player is left holding dice they cannot use, the turn ends on
    /// its own after the blocked grace delay.
    #[instrument(skip(self, mv), fields(match_id = %self.match_id, mv = %mv))]
    pub async fn apply_move(&self, mv: Move) -> Result<MoveOutcome, MatchError> {
        let first = self.lock().machine.move_applied(mv)?;

        let outcome = match first {
            MoveOutcome::HitPending(pending) => {
                self.emit(MatchEvent::HitPending {
                    player: pending.player(),
                    mv,
                });
                self.collaborators
                    .delay
                    .sleep(self.config.hit_settle())
                    .await;
                let resolved = self.lock().machine.resolve_hit();
                resolved?
            }
            other => other,
        };

        let (record, board, blocked_turn) = {
            let state = self.lock();
            let game = state.machine.state();
            let record = game.history().last().map(MoveRecord::from);
            let blocked_turn = state.machine.is_blocked().then(|| game.turn_id());
            (record, game.board().clone(), blocked_turn)
        };

        self.collaborators.render.display_board(&board);
        if let Some(record) = record {
            self.persistence.record_move(&self.match_id, record);
            self.emit(MatchEvent::MoveApplied { record });
        }
        if let MoveOutcome::Won(result) = outcome {
            info!(%result, "Game finished");
            self.emit(MatchEvent::GameFinished { outcome: result });
        }
        if let Some(turn_id) = blocked_turn {
            self.spawn_liveness_guard(turn_id);
        }
        Ok(outcome)
    }

    /// Takes back the last move of this turn.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn undo(&self) -> Result<Move, MatchError> {
        let (undone, board) = {
            let mut state = self.lock();
            let undone = state.machine.undo()?;
            (undone, state.machine.state().board().clone())
        };
        self.collaborators.render.display_board(&board);
        Ok(undone)
    }

    /// Ends the current player's turn.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn end_turn(&self) -> Result<Player, MatchError> {
        let (player, next, at) = {
            let mut state = self.lock();
            let player = state.machine.state().current_player();
            let next = state.machine.end_turn()?;
            let at = Utc::now();
            state.clock.on_action_completed(player, at);
            (player, next, at)
        };
        self.after_hand_off(player, next, at, false).await;
        Ok(next)
    }

    /// Ends turn `turn_id` if the player is still blocked.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn end_turn_if_blocked(&self, turn_id: u64) -> Option<Player> {
        let (player, next, at) = {
            let mut state = self.lock();
            let player = state.machine.state().current_player();
            let next = state.machine.end_turn_if_blocked(turn_id)?;
            let at = Utc::now();
            state.clock.on_action_completed(player, at);
            (player, next, at)
        };
        self.after_hand_off(player, next, at, false).await;
        Some(next)
    }

    fn spawn_liveness_guard(&self, turn_id: u64) {
        debug!(turn_id, "Player blocked, scheduling end of turn");
        let controller = self.clone();
        tokio::spawn(async move {
            let grace = controller.config.blocked_grace();
            controller.collaborators.delay.sleep(grace).await;
            controller.end_turn_if_blocked(turn_id).await;
        });
    }

    async fn after_hand_off(&self, player: Player, next: Player, at: DateTime<Utc>, auto_passed: bool) {
        info!(%player, %next, auto_passed, "Turn handed off");
        self.emit(MatchEvent::TurnEnded {
            player,
            next,
            auto_passed,
        });
        self.report_hand_off(player, at).await;
    }

    /// Tells the authority that `player`'s clock stopped at `at`, then pulls
    /// its clock.
    ///
    /// The pull only happens once the authority has the hand-off. Until
    /// then the local hand-off stands.
    async fn report_hand_off(&self, player: Player, at: DateTime<Utc>) {
        let record = TurnEndRecord::new(player, at);
        if !self.persistence.record_turn_end(&self.match_id, record).await {
            warn!(%player, "Hand-off not yet recorded, keeping local clock");
            return;
        }
        if let Err(err) = self.sync_clock().await {
            warn!(error = %err, "Clock pull after hand-off failed");
        }
    }

    /// Waits until every persistence write issued so far has landed or
    /// been given up on.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    /// Replaces the local clock with the authority's.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn sync_clock(&self) -> Result<ClockState, MatchError> {
        let snapshot = self
            .collaborators
            .clock
            .authoritative_clock(&self.match_id)
            .await?;
        self.lock().clock.apply_authoritative_snapshot(snapshot);
        self.emit(MatchEvent::ClockUpdated { clock: snapshot });
        Ok(snapshot)
    }

    /// Call when the match becomes visible again after a reload,
    /// backgrounding or reconnect.
    ///
    /// Local ticking stays off until the authority's clock has been applied.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn resume(&self) -> Result<ClockState, MatchError> {
        self.lock().clock.suspend();
        info!("Resuming match, pulling authoritative clock");
        self.sync_clock().await
    }

    /// One cosmetic clock tick. If the player on the clock reaches zero,
    /// the authority is asked before a timeout is declared.
    pub async fn tick(&self) -> Result<Option<Outcome>, MatchError> {
        let flagged = {
            let mut state = self.lock();
            let phase = state.machine.state().phase();
            state
                .clock
                .tick(phase)
                .filter(|color| state.clock.check_timeout(*color) == TimeoutCheck::ConfirmWithAuthority)
        };
        let Some(color) = flagged else {
            return Ok(None);
        };

        info!(%color, "Local clock reached zero, asking authority");
        let snapshot = self
            .collaborators
            .clock
            .authoritative_clock(&self.match_id)
            .await?;

        let outcome = {
            let mut state = self.lock();
            match state.clock.confirm_timeout(color, snapshot) {
                TimeoutVerdict::Confirmed => Some(state.machine.declare_timeout(color)?),
                TimeoutVerdict::Rejected { .. } => None,
            }
        };
        self.emit(MatchEvent::ClockUpdated { clock: snapshot });
        if let Some(outcome) = outcome {
            info!(%outcome, "Game finished on time");
            self.emit(MatchEvent::GameFinished { outcome });
        }
        Ok(outcome)
    }

    /// Ticks the clock once a second until the game is over.
    pub fn spawn_clock(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
            loop {
                interval.tick().await;
                if controller.outcome().is_some() {
                    break;
                }
                match controller.tick().await {
                    Ok(Some(_)) => break,
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "Clock tick failed"),
                }
            }
        })
    }

    /// Plays one turn for the automated player the game is waiting on.
    ///
    /// During the opening this is a single opening die. No clock is charged
    /// while the automated player thinks.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn play_automated_turn(&self) -> Result<(), MatchError> {
        let player = {
            let mut state = self.lock();
            let player = state
                .machine
                .expected_roll()
                .map(|kind| kind.player())
                .unwrap_or_else(|| state.machine.state().current_player());
            if !state.automated[player] {
                return Err(MatchError::NotAutomated(player));
            }
            state.clock.on_freeze_condition(Some(player));
            player
        };
        self.emit(MatchEvent::Thinking { player });

        let result = self.drive_automated(player).await;
        self.lock().clock.on_freeze_condition(None);
        result
    }

    async fn drive_automated(&self, player: Player) -> Result<(), MatchError> {
        let phase = self.lock().machine.state().phase();
        if matches!(phase, Phase::Opening | Phase::Waiting) {
            let progress = self.roll().await?;
            if !matches!(progress, RollProgress::Resolved(RollOutcome::Moving { .. })) {
                return Ok(());
            }
        }

        for _ in 0..MAX_SERVICE_ROUNDS {
            let request = {
                let state = self.lock();
                let game = state.machine.state();
                if game.phase() != Phase::Moving || state.machine.can_end_turn() {
                    break;
                }
                AiMoveRequest::new(
                    self.match_id.clone(),
                    game.turn_id(),
                    player,
                    game.board().clone(),
                    game.dice().as_slice().to_vec(),
                )
            };
            let response = self
                .collaborators
                .move_service
                .request_ai_move(&request)
                .await?;
            if response.moves.is_empty() {
                return Err(MatchError::NoPlayableMove);
            }
            for mv in response.moves {
                if let MoveOutcome::Won(_) = self.apply_move(mv).await? {
                    return Ok(());
                }
                let done = self.lock().machine.can_end_turn();
                if done {
                    break;
                }
            }
        }

        let can_end = {
            let state = self.lock();
            state.machine.state().phase() == Phase::Moving && state.machine.can_end_turn()
        };
        if can_end {
            self.end_turn().await?;
        }
        Ok(())
    }

    /// Plays automated turns until the game ends or `max_turns` run out.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn play_out(&self, max_turns: u32) -> Result<Option<Outcome>, MatchError> {
        for _ in 0..max_turns {
            if let Some(outcome) = self.outcome() {
                return Ok(Some(outcome));
            }
            self.play_automated_turn().await?;
        }
        Ok(self.outcome())
    }

    /// Starts a rematch: fresh board, fresh clock, new turn id.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.machine.reset();
            state.clock = ClockReconciler::new(self.config.initial_clock());
        }
        info!("Match reset");
        self.emit(MatchEvent::Reset);
    }
}
