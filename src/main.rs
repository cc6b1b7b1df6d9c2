use std::{
    fs::File,
    io::{self, Write},
};

use anyhow::Context;
use clap::Parser;
use swisspair::{
    cli::{Cli, Commands},
    data::{Round, Standing},
    db, logging, pairing,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logger();

    let mut conn = db::open(&cli.database)
        .with_context(|| format!("could not open {}", cli.database.display()))?;

    let mut out = match cli.output.as_deref() {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        ) as Box<dyn Write>,
        None => Box::new(io::stdout()) as Box<dyn Write>,
    };

    match cli.command {
        Commands::Register { name } => {
            let id = db::register_player(&conn, &name)?;
            writeln!(out, "registered {name} as player {id}")?;
        }
        Commands::Report { winner, loser } => {
            db::report_match(&mut conn, winner, loser)?;
            writeln!(out, "recorded: player {winner} beat player {loser}")?;
        }
        Commands::Standings { json } => {
            let standings = db::standings(&conn)?;
            if json {
                serde_json::to_writer_pretty(&mut out, &standings)?;
                writeln!(out)?;
            } else {
                out.write_all(standings_table(&standings).as_bytes())?;
            }
        }
        Commands::Pair {
            avoid_rematches,
            json,
        } => {
            let round = if avoid_rematches {
                pairing::pair_next_round_avoiding_rematches(&mut conn)?
            } else {
                pairing::pair_next_round(&mut conn)?
            };

            if json {
                serde_json::to_writer_pretty(&mut out, &round)?;
                writeln!(out)?;
            } else {
                out.write_all(round_listing(&round).as_bytes())?;
            }
        }
        Commands::Count => {
            writeln!(out, "{}", db::count_players(&conn)?)?;
        }
        Commands::Reset { matches_only } => {
            db::delete_all_matches(&conn)?;
            if matches_only {
                writeln!(out, "cleared all matches")?;
            } else {
                db::delete_all_players(&mut conn)?;
                writeln!(out, "cleared all matches and players")?;
            }
        }
    }

    Ok(())
}

fn standings_table(standings: &[Standing]) -> String {
    let mut table = String::from("rank  wins  matches  player\n");

    for (index, standing) in standings.iter().enumerate() {
        table.push_str(&format!(
            "{:>4}  {:>4}  {:>7}  {} (#{})\n",
            index + 1,
            standing.wins,
            standing.matches,
            standing.name,
            standing.id
        ));
    }

    table
}

fn round_listing(round: &Round) -> String {
    let mut listing = String::new();

    for (index, pairing) in round.pairings.iter().enumerate() {
        listing.push_str(&format!("{}: {pairing}\n", index + 1));
    }
    if let Some(bye) = &round.bye {
        listing.push_str(&format!("bye: {} (#{})\n", bye.name, bye.id));
    }
    if listing.is_empty() {
        listing.push_str("nothing to pair\n");
    }

    listing
}
