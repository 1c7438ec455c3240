//! Tests for the match controller against fake collaborators.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strictly_backgammon::{
    Board, ClockState, Move, MoveOutcome, Outcome, Phase, Player, RollOutcome, TurnStateMachine,
    WinReason,
};
use strictly_match::{
    ClockAuthority, CollaboratorError, Collaborators, DiceAnimator, FirstLegalMove,
    GameRecorder, LocalAuthority, MatchConfig, MatchController, MatchError, MatchEvent,
    MoveRecord, Persistence, RandomnessAuthority, RenderSink, RollContext, RollProgress,
    RollResponse, TokioDelay, TurnEndRecord,
};
use tokio::sync::{Notify, mpsc};

/// Hands out scripted dice; optionally waits for a go-ahead first.
#[derive(Default)]
struct ScriptedAuthority {
    rolls: Mutex<VecDeque<Option<Vec<u8>>>>,
    gate: Option<Arc<Notify>>,
    requests: AtomicU32,
}

impl ScriptedAuthority {
    fn new(rolls: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            rolls: Mutex::new(rolls.into()),
            ..Default::default()
        }
    }

    fn gated(rolls: Vec<Option<Vec<u8>>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(rolls)
        }
    }
}

#[async_trait::async_trait]
impl RandomnessAuthority for ScriptedAuthority {
    async fn request_roll(&self, _context: &RollContext) -> Result<RollResponse, CollaboratorError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.rolls.lock().unwrap().pop_front().flatten();
        match next {
            Some(dice) => Ok(RollResponse { dice }),
            None => Err(CollaboratorError::new("authority unreachable")),
        }
    }
}

/// An animation that always lands on double sixes.
struct LyingAnimator;

#[async_trait::async_trait]
impl DiceAnimator for LyingAnimator {
    async fn animate(&self, values: &[u8]) -> Vec<u8> {
        vec![6; values.len()]
    }
}

#[derive(Default)]
struct RecordingRenderer {
    dice: Mutex<Vec<Vec<u8>>>,
}

impl RenderSink for RecordingRenderer {
    fn display_dice(&self, values: &[u8]) {
        self.dice.lock().unwrap().push(values.to_vec());
    }

    fn display_board(&self, _board: &Board) {}
}

struct FakeClock {
    snapshot: Mutex<ClockState>,
    unreachable: AtomicBool,
}

impl FakeClock {
    fn new(snapshot: ClockState) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            unreachable: AtomicBool::new(false),
        }
    }

    fn set(&self, snapshot: ClockState) {
        *self.snapshot.lock().unwrap() = snapshot;
    }
}

#[async_trait::async_trait]
impl ClockAuthority for FakeClock {
    async fn authoritative_clock(&self, _match_id: &str) -> Result<ClockState, CollaboratorError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("clock unreachable"));
        }
        Ok(*self.snapshot.lock().unwrap())
    }
}

/// Fails a set number of times before accepting writes.
#[derive(Default)]
struct FlakyRecorder {
    failures_left: AtomicU32,
    attempts: AtomicU32,
    moves: Mutex<Vec<MoveRecord>>,
}

impl FlakyRecorder {
    fn failing(times: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            ..Default::default()
        }
    }

    fn write(&self) -> Result<(), CollaboratorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(CollaboratorError::new("database down"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GameRecorder for FlakyRecorder {
    async fn record_move(&self, _match_id: &str, record: &MoveRecord) -> Result<(), CollaboratorError> {
        self.write()?;
        self.moves.lock().unwrap().push(*record);
        Ok(())
    }

    async fn record_turn_end(
        &self,
        _match_id: &str,
        _record: &TurnEndRecord,
    ) -> Result<(), CollaboratorError> {
        self.write()
    }
}

fn idle_clock() -> ClockState {
    ClockState::new(Duration::from_secs(600))
}

fn collaborators(
    authority: Arc<ScriptedAuthority>,
    renderer: Arc<RecordingRenderer>,
    clock: Arc<FakeClock>,
) -> Collaborators {
    Collaborators::new(
        authority,
        Arc::new(FirstLegalMove),
        clock,
        Arc::new(FlakyRecorder::default()),
        renderer,
        Arc::new(LyingAnimator),
        Arc::new(TokioDelay),
    )
}

fn controller_at(
    board: Board,
    authority: ScriptedAuthority,
) -> (
    MatchController,
    mpsc::UnboundedReceiver<MatchEvent>,
    Arc<RecordingRenderer>,
) {
    let renderer = Arc::new(RecordingRenderer::default());
    let collaborators = collaborators(
        Arc::new(authority),
        renderer.clone(),
        Arc::new(FakeClock::new(idle_clock())),
    );
    let machine = TurnStateMachine::starting_at(board, Player::White);
    let (controller, events) =
        MatchController::with_machine("test", MatchConfig::default(), collaborators, machine);
    (controller, events, renderer)
}

fn drain(events: &mut mpsc::UnboundedReceiver<MatchEvent>) -> Vec<MatchEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

async fn wait_for_pending(controller: &MatchController) {
    for _ in 0..100 {
        if controller.roll_pending() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("roll never went out");
}

fn hit_board() -> Board {
    Board::empty()
        .with_checkers(10, Player::White, 1)
        .with_checkers(0, Player::White, 14)
        .with_checkers(4, Player::Black, 1)
        .with_checkers(23, Player::Black, 14)
}

#[tokio::test]
async fn test_dice_come_from_the_authority() {
    let (controller, mut events, renderer) =
        controller_at(Board::standard(), ScriptedAuthority::new(vec![Some(vec![5, 2])]));

    let progress = controller.roll().await.unwrap();
    assert!(matches!(
        progress,
        RollProgress::Resolved(RollOutcome::Moving { .. })
    ));
    assert_eq!(controller.game().dice().as_slice(), &[5, 2]);
    assert_eq!(*renderer.dice.lock().unwrap(), vec![vec![5, 2]]);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        MatchEvent::DiceShown { values, .. } if values == &vec![5, 2]
    )));
}

#[tokio::test]
async fn test_second_roll_while_pending_is_a_no_op() {
    let gate = Arc::new(Notify::new());
    let authority = ScriptedAuthority::gated(vec![Some(vec![3, 1])], gate.clone());
    let (controller, _events, _) = controller_at(Board::standard(), authority);

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.roll().await }
    });
    wait_for_pending(&controller).await;

    assert_eq!(controller.roll().await.unwrap(), RollProgress::Duplicate);

    gate.notify_one();
    let progress = first.await.unwrap().unwrap();
    assert!(matches!(progress, RollProgress::Resolved(_)));
    assert!(!controller.roll_pending());
    assert_eq!(controller.game().dice().as_slice(), &[3, 1]);
}

#[tokio::test]
async fn test_failed_roll_releases_the_lock() {
    let authority = ScriptedAuthority::new(vec![None, Some(vec![4, 1])]);
    let (controller, _events, _) = controller_at(Board::standard(), authority);

    let err = controller.roll().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!controller.roll_pending());
    assert!(controller.game().dice().is_empty());

    controller.roll().await.unwrap();
    assert_eq!(controller.game().dice().as_slice(), &[4, 1]);
}

#[tokio::test]
async fn test_invalid_authority_dice_are_rejected() {
    let authority = ScriptedAuthority::new(vec![Some(vec![7, 1])]);
    let (controller, _events, _) = controller_at(Board::standard(), authority);
    assert!(matches!(
        controller.roll().await,
        Err(MatchError::Dice(_))
    ));
    assert_eq!(controller.game().phase(), Phase::Waiting);
}

#[tokio::test]
async fn test_stale_roll_is_discarded() {
    let gate = Arc::new(Notify::new());
    let authority = ScriptedAuthority::gated(vec![Some(vec![6, 5])], gate.clone());
    let (controller, _events, renderer) = controller_at(Board::standard(), authority);

    let pending = tokio::spawn({
        let controller = controller.clone();
        async move { controller.roll().await }
    });
    wait_for_pending(&controller).await;

    controller.reset();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), RollProgress::Stale);
    let game = controller.game();
    assert_eq!(game.phase(), Phase::Opening);
    assert!(game.dice().is_empty());
    assert!(renderer.dice.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hit_settles_before_landing() {
    let (controller, mut events, _) =
        controller_at(hit_board(), ScriptedAuthority::new(vec![Some(vec![6, 1])]));
    controller.roll().await.unwrap();

    let start = tokio::time::Instant::now();
    let outcome = controller.apply_move(Move::step(10, 4, 6)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(250));
    assert!(matches!(outcome, MoveOutcome::Landed(_)));

    let game = controller.game();
    assert_eq!(game.board().bar(Player::Black), 1);
    assert!(game.board().point(4).is_owned_by(Player::White));
    assert!(game.board().point(10).is_empty());

    let seen = drain(&mut events);
    let hit_at = seen
        .iter()
        .position(|e| matches!(e, MatchEvent::HitPending { .. }))
        .unwrap();
    let landed_at = seen
        .iter()
        .position(|e| matches!(e, MatchEvent::MoveApplied { record } if *record.hit()))
        .unwrap();
    assert!(hit_at < landed_at);
}

#[tokio::test]
async fn test_illegal_move_never_reaches_the_board() {
    let (controller, _events, _) =
        controller_at(Board::standard(), ScriptedAuthority::new(vec![Some(vec![6, 5])]));
    controller.roll().await.unwrap();
    let before = controller.game();
    assert!(matches!(
        controller.apply_move(Move::step(23, 20, 3)).await,
        Err(MatchError::Move(_))
    ));
    assert_eq!(controller.game(), before);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_player_loses_turn_after_grace() {
    // After playing the 1, white's 6 has nowhere to go.
    let board = Board::empty()
        .with_checkers(8, Player::White, 1)
        .with_checkers(0, Player::White, 14)
        .with_checkers(1, Player::Black, 2)
        .with_checkers(2, Player::Black, 2)
        .with_checkers(23, Player::Black, 11);
    let (controller, mut events, _) =
        controller_at(board, ScriptedAuthority::new(vec![Some(vec![6, 1])]));
    controller.roll().await.unwrap();
    controller.apply_move(Move::step(8, 7, 1)).await.unwrap();

    let game = controller.game();
    assert_eq!(game.phase(), Phase::Moving);
    assert_eq!(game.current_player(), Player::White);

    tokio::time::sleep(MatchConfig::default().blocked_grace() + Duration::from_millis(50)).await;

    let game = controller.game();
    assert_eq!(game.phase(), Phase::Waiting);
    assert_eq!(game.current_player(), Player::Black);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        MatchEvent::TurnEnded {
            player: Player::White,
            auto_passed: false,
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_closed_board_passes_on_roll() {
    let board = Board::empty()
        .with_bar(Player::White, 1)
        .with_checkers(0, Player::White, 14)
        .with_checkers(18, Player::Black, 3)
        .with_checkers(19, Player::Black, 2)
        .with_checkers(20, Player::Black, 2)
        .with_checkers(21, Player::Black, 2)
        .with_checkers(22, Player::Black, 3)
        .with_checkers(23, Player::Black, 3);
    let (controller, _events, _) =
        controller_at(board, ScriptedAuthority::new(vec![Some(vec![4, 2])]));
    let progress = controller.roll().await.unwrap();
    assert_eq!(
        progress,
        RollProgress::Resolved(RollOutcome::AutoPassed {
            player: Player::White,
            next: Player::Black
        })
    );
    assert_eq!(controller.game().current_player(), Player::Black);
}

#[tokio::test]
async fn test_clock_timeout_needs_confirmation() {
    let snapshot = ClockState {
        white_remaining_ms: 1_000,
        black_remaining_ms: 60_000,
        last_action_by: Some(Player::Black),
        last_action_at: Some(Utc::now()),
    };
    let clock = Arc::new(FakeClock::new(snapshot));
    let collaborators = collaborators(
        Arc::new(ScriptedAuthority::default()),
        Arc::new(RecordingRenderer::default()),
        clock.clone(),
    );
    let machine = TurnStateMachine::starting_at(Board::standard(), Player::White);
    let (controller, _events) =
        MatchController::with_machine("test", MatchConfig::default(), collaborators, machine);
    controller.sync_clock().await.unwrap();

    // Local zero, but the authority still shows a second left.
    assert_eq!(controller.tick().await.unwrap(), None);
    assert_eq!(controller.clock().white_remaining_ms, 1_000);
    assert_eq!(controller.game().phase(), Phase::Waiting);

    clock.set(ClockState {
        white_remaining_ms: 0,
        ..snapshot
    });
    let outcome = controller.tick().await.unwrap();
    assert_eq!(outcome, Some(Outcome::new(Player::Black, WinReason::Timeout)));
    assert_eq!(controller.game().phase(), Phase::Finished);
    assert_eq!(controller.tick().await.unwrap(), None);
}

#[tokio::test]
async fn test_resume_waits_for_the_authority() {
    let snapshot = ClockState {
        white_remaining_ms: 30_000,
        black_remaining_ms: 30_000,
        last_action_by: Some(Player::Black),
        last_action_at: Some(Utc::now()),
    };
    let clock = Arc::new(FakeClock::new(snapshot));
    let collaborators = collaborators(
        Arc::new(ScriptedAuthority::default()),
        Arc::new(RecordingRenderer::default()),
        clock.clone(),
    );
    let machine = TurnStateMachine::starting_at(Board::standard(), Player::White);
    let (controller, _events) =
        MatchController::with_machine("test", MatchConfig::default(), collaborators, machine);
    controller.sync_clock().await.unwrap();

    clock.unreachable.store(true, Ordering::SeqCst);
    assert!(controller.resume().await.is_err());
    controller.tick().await.unwrap();
    assert_eq!(controller.clock().white_remaining_ms, 30_000);

    clock.unreachable.store(false, Ordering::SeqCst);
    controller.resume().await.unwrap();
    controller.tick().await.unwrap();
    assert_eq!(controller.clock().white_remaining_ms, 29_000);
}

#[tokio::test]
async fn test_automated_turn_requires_automation() {
    let (controller, _events, _) =
        controller_at(Board::standard(), ScriptedAuthority::new(vec![Some(vec![3, 1])]));
    assert!(matches!(
        controller.play_automated_turn().await,
        Err(MatchError::NotAutomated(Player::White))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_automated_turn_plays_and_hands_off() {
    let (controller, _events, _) =
        controller_at(Board::standard(), ScriptedAuthority::new(vec![Some(vec![3, 1])]));
    controller.set_automated(Player::White, true);
    controller.play_automated_turn().await.unwrap();

    let game = controller.game();
    assert_eq!(game.current_player(), Player::Black);
    assert_eq!(game.phase(), Phase::Waiting);
    assert_ne!(game.board(), &Board::standard());
}

#[tokio::test(start_paused = true)]
async fn test_self_play_reaches_a_result() {
    let config = MatchConfig::default();
    let authority = Arc::new(LocalAuthority::new(Some(42), config.initial_clock()));
    let collaborators = Collaborators::local(Some(42), &config)
        .with_authority(authority.clone())
        .with_clock(authority.clone())
        .with_recorder(authority.clone());
    let (controller, _events) = MatchController::new("self-play", config, collaborators);
    controller.set_automated(Player::White, true);
    controller.set_automated(Player::Black, true);

    let outcome = controller.play_out(5_000).await.unwrap().unwrap();
    assert_eq!(outcome.reason, WinReason::BoreOff);
    assert_eq!(controller.game().board().off(outcome.winner), 15);

    controller.flush().await;
    assert!(!authority.moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_persistence_retries_then_succeeds() {
    let recorder = Arc::new(FlakyRecorder::failing(2));
    let persistence = Persistence::new(recorder.clone(), Arc::new(TokioDelay), &MatchConfig::default());
    let record = MoveRecord::new(Player::White, Move::step(7, 4, 3), false);

    persistence.record_move("test", record);
    persistence.flush().await;
    assert_eq!(recorder.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*recorder.moves.lock().unwrap(), vec![record]);
}

#[tokio::test(start_paused = true)]
async fn test_retried_write_keeps_its_place() {
    let recorder = Arc::new(FlakyRecorder::failing(1));
    let persistence = Persistence::new(recorder.clone(), Arc::new(TokioDelay), &MatchConfig::default());
    let first = MoveRecord::new(Player::White, Move::step(7, 4, 3), false);
    let second = MoveRecord::new(Player::White, Move::step(5, 4, 1), false);

    persistence.record_move("test", first);
    persistence.record_move("test", second);
    persistence.flush().await;

    assert_eq!(recorder.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*recorder.moves.lock().unwrap(), vec![first, second]);
}

#[tokio::test(start_paused = true)]
async fn test_persistence_gives_up_without_blocking_play() {
    let recorder = Arc::new(FlakyRecorder::failing(u32::MAX));
    let config = MatchConfig::default();
    let persistence = Persistence::new(recorder.clone(), Arc::new(TokioDelay), &config);
    let record = TurnEndRecord::new(Player::Black, Utc::now());

    // Only the first attempt is waited on; retries run behind it.
    let start = tokio::time::Instant::now();
    assert!(!persistence.record_turn_end("test", record).await);
    assert!(start.elapsed() < config.persist_backoff());

    persistence.flush().await;
    assert_eq!(recorder.attempts.load(Ordering::SeqCst), 3);
}

fn local_controller(machine: TurnStateMachine) -> MatchController {
    let config = MatchConfig::default();
    let collaborators = Collaborators::local(Some(7), &config);
    let (controller, _events) = MatchController::with_machine("clock", config, collaborators, machine);
    controller.set_automated(Player::White, true);
    controller.set_automated(Player::Black, true);
    controller
}

#[tokio::test(start_paused = true)]
async fn test_hand_off_starts_the_opponents_clock() {
    let controller =
        local_controller(TurnStateMachine::starting_at(Board::standard(), Player::White));

    controller.play_automated_turn().await.unwrap();
    assert_eq!(controller.game().current_player(), Player::Black);
    let clock = controller.clock();
    assert_eq!(clock.last_action_by, Some(Player::White));
    assert_eq!(clock.on_clock(), Some(Player::Black));

    controller.tick().await.unwrap();
    assert_eq!(
        controller.clock().black_remaining_ms,
        clock.black_remaining_ms - 1_000
    );
    assert_eq!(controller.clock().white_remaining_ms, clock.white_remaining_ms);

    controller.play_automated_turn().await.unwrap();
    assert_eq!(controller.clock().on_clock(), Some(Player::White));
}

#[tokio::test(start_paused = true)]
async fn test_opening_winner_goes_on_the_clock() {
    let controller = local_controller(TurnStateMachine::new());

    for _ in 0..50 {
        if controller.game().phase() != Phase::Opening {
            break;
        }
        controller.play_automated_turn().await.unwrap();
    }

    let game = controller.game();
    assert_eq!(game.phase(), Phase::Waiting);
    assert_eq!(controller.clock().on_clock(), Some(game.current_player()));
}

#[tokio::test]
async fn test_automated_thinking_charges_nobody() {
    let snapshot = ClockState {
        white_remaining_ms: 60_000,
        black_remaining_ms: 60_000,
        last_action_by: Some(Player::Black),
        last_action_at: Some(Utc::now()),
    };
    let gate = Arc::new(Notify::new());
    let collaborators = collaborators(
        Arc::new(ScriptedAuthority::gated(vec![Some(vec![3, 1])], gate.clone())),
        Arc::new(RecordingRenderer::default()),
        Arc::new(FakeClock::new(snapshot)),
    );
    let machine = TurnStateMachine::starting_at(Board::standard(), Player::White);
    let (controller, _events) =
        MatchController::with_machine("test", MatchConfig::default(), collaborators, machine);
    controller.sync_clock().await.unwrap();

    controller.tick().await.unwrap();
    assert_eq!(controller.clock().white_remaining_ms, 59_000);

    controller.set_automated(Player::White, true);
    let turn = tokio::spawn({
        let controller = controller.clone();
        async move { controller.play_automated_turn().await }
    });
    wait_for_pending(&controller).await;

    for _ in 0..3 {
        controller.tick().await.unwrap();
    }
    assert_eq!(controller.clock().white_remaining_ms, 59_000);
    assert_eq!(controller.clock().black_remaining_ms, 60_000);

    gate.notify_one();
    turn.await.unwrap().unwrap();
    assert_eq!(controller.game().current_player(), Player::Black);
}
