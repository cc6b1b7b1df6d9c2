//! Swiss pairing for the next round.
//!
//! Two modes are available. [`pair_next_round`] walks the standings and
//! pairs neighbours, so rank 1 meets rank 2, rank 3 meets rank 4, and so
//! on. [`pair_next_round_avoiding_rematches`] additionally groups players
//! by win count and refuses any pairing that would repeat an earlier
//! match, pulling players from the group below when a group cannot be
//! paired cleanly.
//!
//! Both modes read the standings and write the bye flag inside a single
//! transaction, and both are deterministic: the same database state
//! always produces the same round.

use std::collections::HashSet;

use log::{debug, info};
use rusqlite::{params, Connection};

use crate::data::{Pairing, PlayerId, Round, Standing};
use crate::db;
use crate::errors::{Result, TournamentError};

/// Pairs adjacent players in the standings.
///
/// With an odd field the lowest-ranked player who has not yet had a bye
/// sits out, and the remaining players slide up. An empty field yields an
/// empty round.
pub fn pair_next_round(conn: &mut Connection) -> Result<Round> {
    let tx = conn.transaction()?;

    let mut standings = db::standings(&tx)?;
    let bye = assign_bye_if_odd(&tx, &mut standings)?;
    let pairings = slide_pairs(&standings);

    tx.commit()?;
    info!("paired next round: {} matches", pairings.len());

    Ok(Round { pairings, bye })
}

/// Pairs the next round within win groups, never repeating a match.
///
/// The previous round must be fully reported and the tournament still
/// undecided. Odd-sized win groups borrow the strongest player of the
/// group below, and a group whose every matching repeats an earlier
/// match swallows the next two players down. When even that fails at the
/// bottom of the field, there is no legal round left and
/// [`TournamentError::NoRematchFreePairing`] is returned.
pub fn pair_next_round_avoiding_rematches(conn: &mut Connection) -> Result<Round> {
    let tx = conn.transaction()?;

    let mut standings = db::standings(&tx)?;
    if standings.is_empty() {
        return Ok(Round::default());
    }

    check_round_complete(&tx, &standings)?;
    check_not_decided(&standings)?;

    let bye = assign_bye_if_odd(&tx, &mut standings)?;
    let played = played_pairs(&tx)?;
    let mut groups = win_groups(&standings);
    balance_groups(&mut groups);
    let pairings = pair_groups(groups, &played)?;

    tx.commit()?;
    info!("paired next round without rematches: {} matches", pairings.len());

    Ok(Round { pairings, bye })
}

fn slide_pairs(standings: &[Standing]) -> Vec<Pairing> {
    standings
        .chunks_exact(2)
        .map(|pair| Pairing::new(&pair[0], &pair[1]))
        .collect()
}

/// Sits out the lowest-ranked player still owed a bye.
///
/// Removes the chosen player from `standings`, marks the bye on their
/// row, and returns their standing. `None` when the field is even and
/// nobody sits out.
fn assign_bye_if_odd(conn: &Connection, standings: &mut Vec<Standing>) -> Result<Option<Standing>> {
    if standings.len() % 2 == 0 {
        return Ok(None);
    }

    let eligible = bye_eligible(conn)?;
    let position = standings
        .iter()
        .rposition(|standing| eligible.contains(&standing.id))
        .ok_or(TournamentError::NoByeCandidate)?;
    let player = standings.remove(position);

    conn.execute(
        "UPDATE players SET had_bye = 1 WHERE id = ?1;",
        params![player.id],
    )?;
    debug!("bye for player {} {:?}", player.id, player.name);

    Ok(Some(player))
}

/// Ids of the players who have not had a bye yet.
fn bye_eligible(conn: &Connection) -> Result<HashSet<PlayerId>> {
    let mut stmt = conn.prepare("SELECT id FROM players WHERE had_bye = 0;")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut eligible = HashSet::new();
    for id in rows {
        eligible.insert(id?);
    }

    Ok(eligible)
}

/// Every player must have finished the previous round: match counts all
/// equal, except that a player who took a bye sits one match behind the
/// rest of the field.
fn check_round_complete(conn: &Connection, standings: &[Standing]) -> Result<()> {
    let never_sat_out = bye_eligible(conn)?;
    let played_max = standings.iter().map(|s| s.matches).max().unwrap_or(0);
    let played_min = standings.iter().map(|s| s.matches).min().unwrap_or(0);

    let complete = standings.iter().all(|s| {
        s.matches == played_max
            || (s.matches == played_max - 1 && !never_sat_out.contains(&s.id))
    });
    if !complete {
        return Err(TournamentError::IncompleteRound {
            played_min,
            played_max,
        });
    }

    Ok(())
}

/// Refuses to pair another round once a single player leads outright.
fn check_not_decided(standings: &[Standing]) -> Result<()> {
    if standings.len() < 2 {
        return Ok(());
    }

    let top_wins = standings[0].wins;
    let leaders = standings.iter().filter(|s| s.wins == top_wins).count();
    if leaders == 1 {
        return Err(TournamentError::AlreadyDecided(standings[0].name.clone()));
    }

    Ok(())
}

/// Normalized (low id, high id) pairs that have already met.
fn played_pairs(conn: &Connection) -> Result<HashSet<(PlayerId, PlayerId)>> {
    let mut stmt = conn.prepare("SELECT winner_pid, loser_pid FROM matches;")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut played = HashSet::new();
    for row in rows {
        let (winner, loser): (PlayerId, PlayerId) = row?;
        played.insert(pair_key(winner, loser));
    }

    Ok(played)
}

fn pair_key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Buckets the ranked standings into groups of equal win count, strongest
/// group first.
fn win_groups(standings: &[Standing]) -> Vec<Vec<Standing>> {
    let mut groups: Vec<Vec<Standing>> = Vec::new();
    for standing in standings {
        match groups.last_mut() {
            Some(group) if group[0].wins == standing.wins => group.push(standing.clone()),
            _ => groups.push(vec![standing.clone()]),
        }
    }

    groups
}

/// Makes every group even-sized by pulling the strongest player of the
/// group below up. The field total is even once byes are handled, so an
/// odd group always has a successor to pull from.
fn balance_groups(groups: &mut Vec<Vec<Standing>>) {
    let mut index = 0;
    while index < groups.len() {
        if groups[index].len() % 2 != 0 {
            let pulled = groups[index + 1].remove(0);
            groups[index].push(pulled);
            if groups[index + 1].is_empty() {
                groups.remove(index + 1);
            }
        }
        index += 1;
    }
}

/// Pairs each win group without rematches, merging downward when a group
/// has no clean matching.
fn pair_groups(
    mut groups: Vec<Vec<Standing>>,
    played: &HashSet<(PlayerId, PlayerId)>,
) -> Result<Vec<Pairing>> {
    let mut pairings = Vec::new();
    let mut index = 0;

    while index < groups.len() {
        if let Some(matched) = rematch_free_pairs(&groups[index], played) {
            pairings.extend(matched);
            index += 1;
            continue;
        }

        if index + 1 >= groups.len() {
            return Err(TournamentError::NoRematchFreePairing);
        }

        // Swallow the next two players down and try the group again.
        // Groups stay even-sized, so the one below always has two to give.
        let pulled: Vec<Standing> = groups[index + 1].drain(..2).collect();
        groups[index].extend(pulled);
        if groups[index + 1].is_empty() {
            groups.remove(index + 1);
        }
    }

    Ok(pairings)
}

/// First rematch-free perfect matching of `group`, trying the strongest
/// unpaired player against each player below in rank order.
fn rematch_free_pairs(
    group: &[Standing],
    played: &HashSet<(PlayerId, PlayerId)>,
) -> Option<Vec<Pairing>> {
    let mut pool: Vec<&Standing> = group.iter().collect();
    let mut pairings = Vec::with_capacity(group.len() / 2);

    if solve(&mut pool, played, &mut pairings) {
        Some(pairings)
    } else {
        None
    }
}

fn solve(
    pool: &mut Vec<&Standing>,
    played: &HashSet<(PlayerId, PlayerId)>,
    pairings: &mut Vec<Pairing>,
) -> bool {
    if pool.is_empty() {
        return true;
    }

    let first = pool.remove(0);
    for offset in 0..pool.len() {
        if played.contains(&pair_key(first.id, pool[offset].id)) {
            continue;
        }

        let partner = pool.remove(offset);
        pairings.push(Pairing::new(first, partner));
        if solve(pool, played, pairings) {
            return true;
        }
        pairings.pop();
        pool.insert(offset, partner);
    }
    pool.insert(0, first);

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(names: &[&str]) -> (Connection, Vec<PlayerId>) {
        let conn = db::open_in_memory().unwrap();
        let ids = names
            .iter()
            .map(|name| db::register_player(&conn, name).unwrap())
            .collect();
        (conn, ids)
    }

    fn ids_of(pairings: &[Pairing]) -> Vec<(PlayerId, PlayerId)> {
        pairings
            .iter()
            .map(|p| (p.player1_id, p.player2_id))
            .collect()
    }

    #[test]
    fn empty_field_pairs_nothing() {
        let (mut conn, _) = fixture(&[]);

        let round = pair_next_round(&mut conn).unwrap();
        assert!(round.pairings.is_empty());
        assert!(round.bye.is_none());

        let round = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert!(round.pairings.is_empty());
        assert!(round.bye.is_none());
    }

    #[test]
    fn single_player_gets_the_bye() {
        let (mut conn, ids) = fixture(&["Alice"]);

        let round = pair_next_round(&mut conn).unwrap();
        assert!(round.pairings.is_empty());
        assert_eq!(round.bye.unwrap().id, ids[0]);
        assert!(db::get_player(&conn, ids[0]).unwrap().unwrap().had_bye);
    }

    #[test]
    fn nobody_gets_a_second_bye() {
        let (mut conn, _) = fixture(&["Alice"]);

        pair_next_round(&mut conn).unwrap();
        assert!(matches!(
            pair_next_round(&mut conn),
            Err(TournamentError::NoByeCandidate)
        ));
    }

    #[test]
    fn first_round_pairs_neighbours() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave"]);

        let round = pair_next_round(&mut conn).unwrap();
        assert_eq!(
            ids_of(&round.pairings),
            vec![(ids[0], ids[1]), (ids[2], ids[3])]
        );
        assert!(round.bye.is_none());

        // Pairing is read-only for an even field, so a second call gives
        // the identical round.
        let again = pair_next_round(&mut conn).unwrap();
        assert_eq!(again.pairings, round.pairings);

        // The rematch-avoiding mode agrees on a fresh field.
        let strict = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(strict.pairings, round.pairings);
    }

    #[test]
    fn winners_meet_winners_after_one_round() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave"]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();
        db::report_match(&mut conn, ids[2], ids[3]).unwrap();

        let round = pair_next_round(&mut conn).unwrap();
        assert_eq!(
            ids_of(&round.pairings),
            vec![(ids[0], ids[2]), (ids[1], ids[3])]
        );

        let strict = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(strict.pairings, round.pairings);
    }

    #[test]
    fn five_players_lowest_ranked_sits_out() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave", "Eve"]);

        let round = pair_next_round(&mut conn).unwrap();
        assert_eq!(
            ids_of(&round.pairings),
            vec![(ids[0], ids[1]), (ids[2], ids[3])]
        );

        let bye = round.bye.unwrap();
        assert_eq!(bye.id, ids[4]);
        assert!(db::get_player(&conn, ids[4]).unwrap().unwrap().had_bye);
        assert!(round.pairings.iter().all(|p| {
            p.player1_id != bye.id && p.player2_id != bye.id
        }));
    }

    #[test]
    fn bye_skips_players_who_already_sat_out() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol"]);

        // Round one: Carol sits out, Alice beats Bob.
        let round = pair_next_round(&mut conn).unwrap();
        assert_eq!(round.bye.unwrap().id, ids[2]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();

        // Round two: Carol ranks above Bob (fewer matches played), and
        // the bye falls to Bob, the lowest-ranked player without one.
        let round = pair_next_round(&mut conn).unwrap();
        assert_eq!(round.bye.unwrap().id, ids[1]);
        assert_eq!(ids_of(&round.pairings), vec![(ids[0], ids[2])]);
    }

    #[test]
    fn no_bye_candidate_left() {
        let (mut conn, _) = fixture(&["Alice", "Bob", "Carol"]);
        conn.execute("UPDATE players SET had_bye = 1;", []).unwrap();

        assert!(matches!(
            pair_next_round(&mut conn),
            Err(TournamentError::NoByeCandidate)
        ));
    }

    #[test]
    fn strict_mode_rejects_an_incomplete_round() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol"]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();

        assert!(matches!(
            pair_next_round_avoiding_rematches(&mut conn),
            Err(TournamentError::IncompleteRound {
                played_min: 0,
                played_max: 1,
            })
        ));
    }

    #[test]
    fn strict_mode_lets_bye_players_lag_one_match() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave", "Eve"]);

        let round = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(round.bye.unwrap().id, ids[4]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();
        db::report_match(&mut conn, ids[2], ids[3]).unwrap();

        // Eve has played nothing, but her bye accounts for the gap.
        let round = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(
            ids_of(&round.pairings),
            vec![(ids[0], ids[2]), (ids[4], ids[1])]
        );
        assert_eq!(round.bye.unwrap().id, ids[3]);
    }

    #[test]
    fn strict_mode_crosses_groups_to_avoid_rematches() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave", "Eve", "Frank"]);

        // Round one: neighbours.
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();
        db::report_match(&mut conn, ids[2], ids[3]).unwrap();
        db::report_match(&mut conn, ids[4], ids[5]).unwrap();

        // Round two: the winners' group is odd and borrows Bob.
        let round = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(
            ids_of(&round.pairings),
            vec![(ids[0], ids[2]), (ids[4], ids[1]), (ids[3], ids[5])]
        );
        db::report_match(&mut conn, ids[0], ids[2]).unwrap();
        db::report_match(&mut conn, ids[4], ids[1]).unwrap();
        db::report_match(&mut conn, ids[3], ids[5]).unwrap();

        // Round three: Carol and Dave have met, so their group swallows
        // the players below and pairs across.
        let strict = pair_next_round_avoiding_rematches(&mut conn).unwrap();
        assert_eq!(
            ids_of(&strict.pairings),
            vec![(ids[0], ids[4]), (ids[2], ids[5]), (ids[3], ids[1])]
        );

        // The plain slide would have repeated Carol vs Dave here.
        let slide = pair_next_round(&mut conn).unwrap();
        assert_eq!(
            ids_of(&slide.pairings),
            vec![(ids[0], ids[4]), (ids[2], ids[3]), (ids[1], ids[5])]
        );
    }

    #[test]
    fn strict_mode_reports_a_decided_tournament() {
        let (mut conn, ids) = fixture(&["Alice", "Bob", "Carol", "Dave"]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();
        db::report_match(&mut conn, ids[2], ids[3]).unwrap();
        db::report_match(&mut conn, ids[0], ids[2]).unwrap();
        db::report_match(&mut conn, ids[1], ids[3]).unwrap();

        assert!(matches!(
            pair_next_round_avoiding_rematches(&mut conn),
            Err(TournamentError::AlreadyDecided(name)) if name == "Alice"
        ));
    }

    #[test]
    fn strict_mode_gives_up_when_only_rematches_remain() {
        let (mut conn, ids) = fixture(&["Alice", "Bob"]);
        db::report_match(&mut conn, ids[0], ids[1]).unwrap();
        db::report_match(&mut conn, ids[1], ids[0]).unwrap();

        assert!(matches!(
            pair_next_round_avoiding_rematches(&mut conn),
            Err(TournamentError::NoRematchFreePairing)
        ));
    }

    #[test]
    fn balance_pulls_the_strongest_player_up() {
        let standings: Vec<Standing> = [(1, 2), (2, 1), (3, 1), (4, 0)]
            .iter()
            .map(|&(id, wins)| Standing {
                id,
                name: format!("p{id}"),
                wins,
                matches: 2,
            })
            .collect();

        let mut groups = win_groups(&standings);
        assert_eq!(groups.len(), 3);

        balance_groups(&mut groups);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2]);
        // The two-win leader is joined by the strongest one-win player.
        assert_eq!(groups[0][1].id, 2);
    }
}
