use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::filter::{GameFilter, ResultFilter};

#[derive(Debug, Default)]
pub struct Cli {
    pub user: Option<String>,
    pub inputs: Vec<PathBuf>,        // JSON files with game records
    pub remote: bool,                // fetch from the public API (cached per day)
    pub out: Option<PathBuf>,        // directory for CSV/JSON tables
    pub thinks: Option<usize>,       // recent games to show move timing for
    pub utc_offset: Option<i32>,     // minutes, overrides config
    pub moves: Option<usize>,        // opening depth for the most-common-moves listing
    pub filter: GameFilter,          // applied before any analysis
    pub verbose: bool,
    pub help: bool,
}

pub fn parse() -> Cli {
    parse_from(std::env::args().skip(1))
}

fn parse_from<I: Iterator<Item = String>>(mut it: I) -> Cli {
    let mut cli = Cli::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--user" | "-u" => {
                if let Some(u) = it.next() { cli.user = Some(u); }
            }
            "--input" | "-i" => {
                if let Some(p) = it.next() { cli.inputs.push(PathBuf::from(p)); }
            }
            "--remote" => cli.remote = true,
            "--out" | "-o" => {
                if let Some(p) = it.next() { cli.out = Some(PathBuf::from(p)); }
            }
            "--thinks" => {
                cli.thinks = it.next().and_then(|n| n.parse().ok());
            }
            "--utc-offset" => {
                cli.utc_offset = it.next().and_then(|n| n.parse().ok());
            }
            "--moves" => {
                cli.moves = it.next().and_then(|n| n.parse().ok());
            }
            "--since" => cli.filter.since = value(&arg, it.next(), parse_date),
            "--until" => cli.filter.until = value(&arg, it.next(), parse_date),
            "--result" => cli.filter.result = value(&arg, it.next(), ResultFilter::parse),
            "--min-rating" => cli.filter.min_rating = value(&arg, it.next(), number),
            "--max-rating" => cli.filter.max_rating = value(&arg, it.next(), number),
            "--min-opp-rating" => cli.filter.min_opponent_rating = value(&arg, it.next(), number),
            "--max-opp-rating" => cli.filter.max_opponent_rating = value(&arg, it.next(), number),
            "--verbose" | "-v" => cli.verbose = true,
            "--help" | "-h" => cli.help = true,
            other if !other.starts_with('-') => cli.inputs.push(PathBuf::from(other)),
            other => eprintln!("ignoring unknown option {}", other),
        }
    }

    cli
}

// A bad filter value is reported and left unset.
fn value<T>(flag: &str, raw: Option<String>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        eprintln!("ignoring invalid value for {}: {}", flag, raw);
    }
    parsed
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn number<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}

pub fn print_help() {
    eprintln!(
r#"chessstats: win/loss patterns and thinking time from chess.com games

Usage:
  From saved JSON:
    chessstats --user NAME [--input games.json ...] [--out DIR] [--thinks N] [--moves N] [-v]

  From the public API (cached once per day):
    chessstats --user NAME --remote [--out DIR] [--thinks N] [--moves N] [-v]

  Any of the filters below narrows the games first.

Options:
  --user, -u NAME        Player to analyse (else CHESS_USERNAME, else config.toml).
  --input, -i FILE       JSON array of games, or a monthly archive ({{"games": [...]}}).
                         Bare arguments are treated as input files too.
  --remote               Download all monthly archives (or reuse today's cache).
  --out, -o DIR          Write monthly.csv, weekday.csv, hourly.csv,
                         weekday_hour.csv, game_of_day.csv, rating_history.csv,
                         openings.csv and chart.json into DIR.
  --thinks N             Show the longest thinks of the N most recent games.
  --moves N              Most common moves for the first N moves, as White and as Black.
  --since YYYY-MM-DD     Only games ended on or after this local date.
  --until YYYY-MM-DD     Only games ended on or before this local date.
  --result R             Only wins, losses (timeouts included) or draws: win|loss|draw.
  --min-rating, --max-rating N
                         Bounds on the player's rating in the game.
  --min-opp-rating, --max-opp-rating N
                         Bounds on the opponent's rating.
  --utc-offset MINUTES   Local time for month/day/hour buckets (default from config).
  -v, --verbose          Progress logs on stderr.
  -h, --help             Show this help.

Notes:
  • Settings (cache dir, request delay, tilt thresholds) live in config.toml.
  • A .env file is read before CHESS_USERNAME is looked up.
"#);
}
