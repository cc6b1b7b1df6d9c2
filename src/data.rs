use std::fmt;

use serde::{Deserialize, Serialize};

/// Row id assigned by the database. Ids are never reused, even after a
/// full reset.
pub type PlayerId = i64;

/// A registered player.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Whether the player has already sat out a round.
    pub had_bye: bool,
}

/// One row of the standings: a player with their derived record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Standing {
    pub id: PlayerId,
    pub name: String,
    pub wins: i64,
    pub matches: i64,
}

/// Two players scheduled to meet, strongest listed first.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pairing {
    pub player1_id: PlayerId,
    pub player1_name: String,
    pub player2_id: PlayerId,
    pub player2_name: String,
}

impl Pairing {
    pub fn new(player1: &Standing, player2: &Standing) -> Self {
        Self {
            player1_id: player1.id,
            player1_name: player1.name.clone(),
            player2_id: player2.id,
            player2_name: player2.name.clone(),
        }
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (#{}) vs {} (#{})",
            self.player1_name, self.player1_id, self.player2_name, self.player2_id
        )
    }
}

/// The schedule for one round: the pairings plus the player sitting out,
/// if the field is odd.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Round {
    pub pairings: Vec<Pairing>,
    pub bye: Option<Standing>,
}
