//! REST client for a remote game server.
//!
//! One client implements every server-side contract:
//!
//! - `POST {base}/api/matches/{id}/roll` with a [`RollContext`]
//! - `POST {base}/api/matches/{id}/ai-move` with an [`AiMoveRequest`]
//! - `GET  {base}/api/matches/{id}/clock`
//! - `POST {base}/api/matches/{id}/moves` with a [`MoveRecord`]
//! - `POST {base}/api/matches/{id}/turn-end` with a [`TurnEndRecord`]

use crate::collaborators::{
    AiMoveRequest, AiMoveResponse, ClockAuthority, Collaborators, GameRecorder, MoveRecord,
    MoveService, RandomnessAuthority, RollContext, RollResponse, TurnEndRecord,
};
use crate::delay::TokioDelay;
use crate::error::CollaboratorError;
use crate::local::{LogRenderer, TumblingAnimator};
use std::sync::Arc;
use strictly_backgammon::ClockState;
use tracing::{debug, info, instrument};

/// HTTP client for the game server.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestClient {
    /// Creates a client for the server at `base_url`.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        info!("Using remote authority");
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, match_id: &str, path: &str) -> String {
        format!("{}/api/matches/{}/{}", self.base_url, match_id, path)
    }
}

#[async_trait::async_trait]
impl RandomnessAuthority for RestClient {
    #[instrument(skip(self))]
    async fn request_roll(&self, context: &RollContext) -> Result<RollResponse, CollaboratorError> {
        let response: RollResponse = self
            .client
            .post(self.url(context.match_id(), "roll"))
            .json(context)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(dice = ?response.dice, "Authority rolled");
        Ok(response)
    }
}

#[async_trait::async_trait]
impl MoveService for RestClient {
    #[instrument(skip(self, request), fields(turn_id = request.turn_id()))]
    async fn request_ai_move(
        &self,
        request: &AiMoveRequest,
    ) -> Result<AiMoveResponse, CollaboratorError> {
        let response: AiMoveResponse = self
            .client
            .post(self.url(request.match_id(), "ai-move"))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(moves = response.moves.len(), "Move service answered");
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ClockAuthority for RestClient {
    #[instrument(skip(self))]
    async fn authoritative_clock(&self, match_id: &str) -> Result<ClockState, CollaboratorError> {
        let clock = self
            .client
            .get(self.url(match_id, "clock"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(clock)
    }
}

#[async_trait::async_trait]
impl GameRecorder for RestClient {
    #[instrument(skip(self, record))]
    async fn record_move(&self, match_id: &str, record: &MoveRecord) -> Result<(), CollaboratorError> {
        self.client
            .post(self.url(match_id, "moves"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self, record))]
    async fn record_turn_end(
        &self,
        match_id: &str,
        record: &TurnEndRecord,
    ) -> Result<(), CollaboratorError> {
        self.client
            .post(self.url(match_id, "turn-end"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Collaborators {
    /// Server-side contracts over REST; rendering and animation stay local.
    pub fn rest(client: RestClient) -> Self {
        let client = Arc::new(client);
        Self::new(
            client.clone(),
            client.clone(),
            client.clone(),
            client,
            Arc::new(LogRenderer),
            Arc::new(TumblingAnimator::new(None)),
            Arc::new(TokioDelay),
        )
    }
}
