//! Strictly Match - one backgammon match against the outside world
//!
//! The rules live in `strictly_backgammon`; this crate connects a game to
//! the collaborators that own the truth about dice and time, and to the
//! ones that merely watch.
//!
//! # Architecture
//!
//! - **Controller**: [`MatchController`] is the single writer for one
//!   game and one clock
//! - **Dice**: [`DiceSync`] fetches authoritative dice behind a per-match
//!   roll lock
//! - **Persistence**: [`Persistence`] writes moves and hand-offs in order
//!   on a background worker, retrying out-of-band
//! - **Collaborators**: async traits for the authority, clock, move
//!   service and recorder, with in-process ([`LocalAuthority`]) and REST
//!   ([`RestClient`]) implementations
//!
//! # Example
//!
//! ```no_run
//! use strictly_match::{Collaborators, MatchConfig, MatchController};
//! use strictly_backgammon::Player;
//!
//! # async fn example() -> Result<(), strictly_match::MatchError> {
//! let config = MatchConfig::default();
//! let collaborators = Collaborators::local(Some(7), &config);
//! let (controller, _events) = MatchController::new("demo", config, collaborators);
//! controller.set_automated(Player::White, true);
//! controller.set_automated(Player::Black, true);
//! let outcome = controller.play_out(1_000).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod collaborators;
mod config;
mod controller;
mod delay;
mod dice_sync;
mod error;
mod events;
mod local;
mod recorder;
mod rest;

// Crate-level exports - Configuration
pub use config::{AUTHORITY_URL_ENV, ConfigError, MatchConfig};

// Crate-level exports - Errors
pub use error::{CollaboratorError, MatchError};

// Crate-level exports - Collaborator contracts
pub use collaborators::{
    AiMoveRequest, AiMoveResponse, ClockAuthority, Collaborators, DiceAnimator, GameRecorder,
    MoveRecord, MoveService, RandomnessAuthority, RenderSink, RollContext, RollResponse,
    TurnEndRecord,
};
pub use delay::{Delay, TokioDelay};

// Crate-level exports - Match control
pub use controller::{MatchController, RollProgress};
pub use dice_sync::DiceSync;
pub use events::MatchEvent;
pub use recorder::Persistence;

// Crate-level exports - Collaborator implementations
pub use local::{FirstLegalMove, LocalAuthority, LogRenderer, TumblingAnimator};
pub use rest::RestClient;
