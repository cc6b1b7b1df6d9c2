//! A Swiss-system tournament tracker backed by SQLite.
//!
//! Players and their match results live in two tables; wins and match
//! counts are derived, never stored. On top of the storage sit the
//! standings and the round pairer, which matches players of equal or
//! near-equal record and hands out byes when the field is odd.
//!
//! - [`db`] opens the database and holds every storage operation.
//! - [`pairing`] builds the next round from the current standings.
//! - [`data`] has the row and round types.
//! - [`errors`] has the error type everything returns.
//!
//! ```
//! use swisspair::{db, pairing};
//!
//! # fn main() -> swisspair::Result<()> {
//! let mut conn = db::open_in_memory()?;
//! let alice = db::register_player(&conn, "Alice")?;
//! let bob = db::register_player(&conn, "Bob")?;
//! db::report_match(&mut conn, alice, bob)?;
//!
//! let standings = db::standings(&conn)?;
//! assert_eq!(standings[0].name, "Alice");
//!
//! let round = pairing::pair_next_round(&mut conn)?;
//! assert_eq!(round.pairings.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod data;
pub mod db;
pub mod errors;
pub mod logging;
pub mod pairing;

pub use data::{Pairing, Player, PlayerId, Round, Standing};
pub use errors::{Result, TournamentError};
