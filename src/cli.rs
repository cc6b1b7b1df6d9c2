use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::PlayerId;

#[derive(Parser)]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Tournament database file
    #[arg(short, long, value_name = "FILE", default_value = "tournament.db")]
    pub database: PathBuf,

    /// Write output to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new player
    Register { name: String },
    /// Record a match result by player ids
    Report { winner: PlayerId, loser: PlayerId },
    /// Show the standings, best record first
    Standings {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Pair the next round
    Pair {
        /// Keep win groups together and never repeat a match
        #[arg(long)]
        avoid_rematches: bool,
        /// Emit JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Show the number of registered players
    Count,
    /// Delete all matches, then all players
    Reset {
        /// Only clear the recorded matches, keep players
        #[arg(long)]
        matches_only: bool,
    },
}
