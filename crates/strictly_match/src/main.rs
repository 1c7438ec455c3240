//! Strictly Backgammon - match runner
//!
//! Plays automated matches against a local or remote authority.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AuthorityKind, Cli, Command};
use std::path::PathBuf;
use strictly_backgammon::Player;
use strictly_match::{Collaborators, MatchConfig, MatchController, MatchEvent, RestClient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            seed,
            authority,
            match_id,
            max_turns,
        } => run_play(config, seed, authority, match_id, max_turns).await,
        Command::Config { config } => {
            let config = load_config(config)?;
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<MatchConfig> {
    let config = match path {
        Some(path) => MatchConfig::from_file(&path)
            .with_context(|| format!("Loading {}", path.display()))?,
        None => MatchConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Run a self-play match
async fn run_play(
    config: Option<PathBuf>,
    seed: Option<u64>,
    authority: AuthorityKind,
    match_id: String,
    max_turns: u32,
) -> Result<()> {
    let config = load_config(config)?;

    let collaborators = match authority {
        AuthorityKind::Local => Collaborators::local(seed, &config),
        AuthorityKind::Rest => {
            let url = config
                .authority_url()
                .clone()
                .context("REST authority needs authority_url or STRICTLY_BACKGAMMON_AUTHORITY_URL")?;
            Collaborators::rest(RestClient::new(url))
        }
    };

    info!(%match_id, ?authority, ?seed, "Starting match");
    let (controller, events) = MatchController::new(match_id, config, collaborators);
    controller.set_automated(Player::White, true);
    controller.set_automated(Player::Black, true);

    let logger = tokio::spawn(log_events(events));
    let clock = controller.spawn_clock();

    let outcome = controller.play_out(max_turns).await?;
    clock.abort();
    controller.flush().await;
    drop(controller);
    if logger.await.is_err() {
        warn!("Event logger stopped abnormally");
    }

    match outcome {
        Some(outcome) => info!(%outcome, "Match over"),
        None => warn!(max_turns, "Match unfinished"),
    }
    Ok(())
}

async fn log_events(mut events: mpsc::UnboundedReceiver<MatchEvent>) {
    while let Some(event) = events.recv().await {
        match serde_json::to_string(&event) {
            Ok(json) => debug!(event = %json, "Match event"),
            Err(err) => warn!(error = %err, "Unserializable match event"),
        }
        if let MatchEvent::TurnEnded { player, next, auto_passed } = event {
            info!(%player, %next, auto_passed, "Turn over");
        }
    }
}
