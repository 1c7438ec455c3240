//! Fire-and-forget persistence with out-of-band retries.
//!
//! Writes are queued to one worker task per match and land in the order
//! they were issued. The worker retries the head write before moving on.
//! A failing recorder never rolls back the game; exhausted retries are
//! logged and dropped.

use crate::collaborators::{GameRecorder, MoveRecord, TurnEndRecord};
use crate::config::MatchConfig;
use crate::delay::Delay;
use crate::error::CollaboratorError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Clone)]
enum Write {
    Move(MoveRecord),
    TurnEnd(TurnEndRecord),
}

enum Job {
    Write {
        match_id: String,
        write: Write,
        first_attempt: Option<oneshot::Sender<bool>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Ordered, retrying front end for a [`GameRecorder`].
#[derive(Clone)]
pub struct Persistence {
    queue: mpsc::UnboundedSender<Job>,
}

struct Worker {
    recorder: Arc<dyn GameRecorder>,
    delay: Arc<dyn Delay>,
    attempts: u32,
    backoff: Duration,
}

impl Persistence {
    /// Starts the write worker using the retry settings in `config`.
    ///
    /// Must be called from within a tokio runtime. The worker stops once
    /// every handle has been dropped and the queue is drained.
    pub fn new(recorder: Arc<dyn GameRecorder>, delay: Arc<dyn Delay>, config: &MatchConfig) -> Self {
        let (queue, jobs) = mpsc::unbounded_channel();
        let worker = Worker {
            recorder,
            delay,
            attempts: (*config.persist_retries()).max(1),
            backoff: config.persist_backoff(),
        };
        tokio::spawn(worker.run(jobs));
        Self { queue }
    }

    /// Queues a move write.
    pub fn record_move(&self, match_id: &str, record: MoveRecord) {
        self.enqueue(Job::Write {
            match_id: match_id.to_string(),
            write: Write::Move(record),
            first_attempt: None,
        });
    }

    /// Queues a turn hand-off and waits for its first attempt.
    ///
    /// Returns true if the recorder accepted it on that attempt. Earlier
    /// writes are attempted first; retries of this one continue in the
    /// background.
    pub async fn record_turn_end(&self, match_id: &str, record: TurnEndRecord) -> bool {
        let (ack, attempted) = oneshot::channel();
        self.enqueue(Job::Write {
            match_id: match_id.to_string(),
            write: Write::TurnEnd(record),
            first_attempt: Some(ack),
        });
        attempted.await.unwrap_or(false)
    }

    /// Waits until every write queued so far has landed or been abandoned.
    pub async fn flush(&self) {
        let (done, flushed) = oneshot::channel();
        self.enqueue(Job::Flush(done));
        if flushed.await.is_err() {
            warn!("Persistence worker stopped before flushing");
        }
    }

    fn enqueue(&self, job: Job) {
        if self.queue.send(job).is_err() {
            error!("Persistence worker stopped, dropping write");
        }
    }
}

impl Worker {
    async fn run(self, mut jobs: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = jobs.recv().await {
            match job {
                Job::Write {
                    match_id,
                    write,
                    first_attempt,
                } => {
                    self.write_with_retries(&match_id, &write, first_attempt)
                        .await;
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Persistence worker finished");
    }

    #[instrument(skip(self, write, first_attempt))]
    async fn write_with_retries(
        &self,
        match_id: &str,
        write: &Write,
        mut first_attempt: Option<oneshot::Sender<bool>>,
    ) -> bool {
        for attempt in 1..=self.attempts {
            let result = self.attempt(match_id, write).await;
            if let Some(ack) = first_attempt.take() {
                let _ = ack.send(result.is_ok());
            }
            match result {
                Ok(()) => {
                    debug!(attempt, ?write, "Persisted");
                    return true;
                }
                Err(err) if attempt < self.attempts => {
                    warn!(attempt, error = %err, "Persistence write failed, retrying");
                    self.delay.sleep(self.backoff * attempt).await;
                }
                Err(err) => {
                    error!(attempts = attempt, error = %err, ?write, "Persistence write abandoned");
                }
            }
        }
        false
    }

    async fn attempt(&self, match_id: &str, write: &Write) -> Result<(), CollaboratorError> {
        match write {
            Write::Move(record) => self.recorder.record_move(match_id, record).await,
            Write::TurnEnd(record) => self.recorder.record_turn_end(match_id, record).await,
        }
    }
}
