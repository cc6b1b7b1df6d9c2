//! SQLite storage for players and match results.
//!
//! Wins and match counts are never stored, they are derived from the
//! matches table by [`standings`]. All multi-statement operations run
//! inside a transaction.

use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::data::{Player, PlayerId, Standing};
use crate::errors::{Result, TournamentError};

/// Opens the tournament database at `path`, creating it if needed.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure(&mut conn)?;
    Ok(conn)
}

/// Opens a fresh in-memory tournament database.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    configure(&mut conn)?;
    Ok(conn)
}

fn configure(conn: &mut Connection) -> Result<()> {
    // The pragma is a no-op inside a transaction, so it runs before the
    // schema statements.
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    create_schema(conn)?;
    Ok(())
}

/// Creates the players and matches tables if they do not exist.
pub fn create_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS players (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT    NOT NULL,
            had_bye INTEGER NOT NULL
                            DEFAULT 0
        );",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS matches (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            winner_pid INTEGER REFERENCES players (id)
                               NOT NULL,
            loser_pid  INTEGER REFERENCES players (id)
                               NOT NULL,
            CHECK (winner_pid <> loser_pid)
        );",
        [],
    )?;

    tx.commit()?;
    Ok(())
}

/// Registers a new player and returns the id the database assigned.
///
/// Names are stored as given and need not be unique, but they must
/// contain at least one non-whitespace character.
pub fn register_player(conn: &Connection, name: &str) -> Result<PlayerId> {
    if name.trim().is_empty() {
        return Err(TournamentError::EmptyName);
    }

    conn.execute("INSERT INTO players (name) VALUES (?1);", params![name])?;
    let id = conn.last_insert_rowid();
    debug!("registered player {id} {name:?}");

    Ok(id)
}

/// Looks up a single player by id.
pub fn get_player(conn: &Connection, id: PlayerId) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            "SELECT id, name, had_bye FROM players WHERE id = ?1;",
            params![id],
            |row| {
                Ok(Player {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    had_bye: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(player)
}

/// Records a finished match between two distinct, registered players.
pub fn report_match(conn: &mut Connection, winner: PlayerId, loser: PlayerId) -> Result<()> {
    if winner == loser {
        return Err(TournamentError::SelfMatch(winner));
    }

    let tx = conn.transaction()?;
    for id in [winner, loser] {
        if get_player(&tx, id)?.is_none() {
            return Err(TournamentError::PlayerNotFound(id));
        }
    }

    tx.execute(
        "INSERT INTO matches (winner_pid, loser_pid) VALUES (?1, ?2);",
        params![winner, loser],
    )?;
    tx.commit()?;
    debug!("recorded match: {winner} beat {loser}");

    Ok(())
}

/// Whether the two players have already met, in either orientation.
pub fn have_played(conn: &Connection, a: PlayerId, b: PlayerId) -> Result<bool> {
    let met = conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM matches
            WHERE (winner_pid = ?1 AND loser_pid = ?2)
               OR (winner_pid = ?2 AND loser_pid = ?1)
        );",
        params![a, b],
        |row| row.get(0),
    )?;

    Ok(met)
}

/// Number of registered players.
pub fn count_players(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM players;", [], |row| row.get(0))?;
    Ok(count)
}

/// Deletes every match record. Players and their bye flags are untouched.
pub fn delete_all_matches(conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM matches;", [])?;
    debug!("deleted {deleted} match record(s)");
    Ok(())
}

/// Deletes every player record.
///
/// Matches reference players, so this fails with
/// [`TournamentError::PlayersStillReferenced`] while any match records
/// remain. Call [`delete_all_matches`] first.
pub fn delete_all_players(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    let referencing: i64 = tx.query_row("SELECT COUNT(*) FROM matches;", [], |row| row.get(0))?;
    if referencing > 0 {
        return Err(TournamentError::PlayersStillReferenced(referencing));
    }

    let deleted = tx.execute("DELETE FROM players;", [])?;
    tx.commit()?;
    debug!("deleted {deleted} player(s)");

    Ok(())
}

/// Returns one standings row per player, ranked best first.
///
/// Order is wins descending, then matches played ascending, then id, so
/// equal records always come back in the same order and pairing built on
/// top of the standings is reproducible.
pub fn standings(conn: &Connection) -> Result<Vec<Standing>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name,
                (SELECT COUNT(*) FROM matches m
                 WHERE m.winner_pid = p.id) AS wins,
                (SELECT COUNT(*) FROM matches m
                 WHERE m.winner_pid = p.id OR m.loser_pid = p.id) AS matches
         FROM players p
         ORDER BY wins DESC, matches ASC, p.id ASC;",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Standing {
            id: row.get(0)?,
            name: row.get(1)?,
            wins: row.get(2)?,
            matches: row.get(3)?,
        })
    })?;

    let mut standings = Vec::new();
    for row in rows {
        standings.push(row?);
    }

    Ok(standings)
}
