//! Command-line interface for strictly_backgammon.

use clap::{Parser, Subcommand, ValueEnum};

/// Strictly Backgammon - authoritative-dice backgammon matches
#[derive(Parser, Debug)]
#[command(name = "strictly_backgammon")]
#[command(about = "Backgammon match runner with authoritative dice and clock", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Where dice, clock and persistence come from
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityKind {
    /// In-process seeded authority
    Local,
    /// Remote game server over REST
    Rest,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a match between two automated players
    Play {
        /// Path to match config (TOML)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Seed for local dice
        #[arg(long)]
        seed: Option<u64>,

        /// Dice, clock and persistence source
        #[arg(long, value_enum, default_value_t = AuthorityKind::Local)]
        authority: AuthorityKind,

        /// Match identifier
        #[arg(long, default_value = "local-match")]
        match_id: String,

        /// Give up after this many turns
        #[arg(long, default_value = "2000")]
        max_turns: u32,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to match config (TOML)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}
