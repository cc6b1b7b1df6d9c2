//! Error types shared by the storage layer and the pairing engine.

use thiserror::Error;

use crate::data::PlayerId;

/// Everything that can go wrong while running a tournament.
#[derive(Debug, Error)]
pub enum TournamentError {
    /// A player name was empty, or contained only whitespace.
    #[error("player name must not be empty")]
    EmptyName,

    /// A match was reported with the same player as winner and loser.
    #[error("player {0} cannot play against themselves")]
    SelfMatch(PlayerId),

    /// A referenced player id is not registered.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// Players cannot be deleted while match records still reference them.
    #[error("{0} match record(s) still reference players, delete matches first")]
    PlayersStillReferenced(i64),

    /// An odd number of players needs a bye, but every player has had one.
    #[error("every registered player has already had a bye")]
    NoByeCandidate,

    /// Some players have unreported results from the previous round.
    #[error("previous round incomplete: players have played between {played_min} and {played_max} matches")]
    IncompleteRound { played_min: i64, played_max: i64 },

    /// A single player leads the standings outright.
    #[error("{0} leads the standings outright, the tournament is decided")]
    AlreadyDecided(String),

    /// Every possible pairing of the current field repeats an earlier match.
    #[error("no pairing without a rematch exists for the current standings")]
    NoRematchFreePairing,

    /// The underlying database reported an error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for tournament operations.
pub type Result<T> = std::result::Result<T, TournamentError>;
