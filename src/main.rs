#[macro_use]
mod verbose;

mod aggregator;
mod cache;
mod cli;
mod config;
mod filter;
mod model;
mod normalize;
mod pgn;
mod profile;
mod remote;
mod report;
mod session;
mod streaks;
mod timing;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use chrono::Utc;

use crate::model::Color;
use crate::report::{Report, ReportRow};
use crate::session::Session;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::parse();
    if args.help {
        cli::print_help();
        return Ok(());
    }
    verbose::init(args.verbose);
    let cfg = config::Config::load();

    // --user > CHESS_USERNAME > config.toml
    let username = args
        .user
        .clone()
        .or_else(|| std::env::var("CHESS_USERNAME").ok())
        .unwrap_or_else(|| cfg.username.clone());
    let session = Session::new(&username, args.utc_offset.unwrap_or(cfg.utc_offset_minutes))?;

    if args.inputs.is_empty() && !args.remote {
        cli::print_help();
        anyhow::bail!("no games to analyse: pass --input FILE or --remote");
    }

    let mut games = Vec::new();
    for path in &args.inputs {
        let loaded = cache::read_games_file(path)?;
        let added = cache::merge_unique(&mut games, loaded);
        vprintln!("input: {} -> {} new games", path.display(), added);
    }
    if args.remote {
        let today = Utc::now().with_timezone(&session.offset()).date_naive();
        let fetched = remote::load_or_fetch(&cfg, session.username(), today).await?;
        let added = cache::merge_unique(&mut games, fetched);
        vprintln!("remote: {} new games", added);
    }

    if !args.filter.is_empty() {
        let before = games.len();
        games = args.filter.apply(&games, &session);
        vprintln!("filter: kept {} of {} games", games.len(), before);
    }

    let report = report::build_report(&games, &session, &cfg);
    print!("{}", report::summary_text(session.username(), &report));

    if let Some(dir) = args.out.as_deref() {
        write_outputs(dir, &report)?;
        eprintln!("Reports written to {}.", dir.display());
    }

    if let Some(n) = args.thinks {
        let parser = timing::RegexClockParser::default();
        let digest = timing::recent_timing(&games, &session, &parser, n, cfg.thinks_per_game);
        println!();
        print!("{}", report::timing_text(session.username(), &digest));
    }

    if let Some(depth) = args.moves {
        for color in [Color::White, Color::Black] {
            let table = profile::common_moves(&games, &session, color, depth, cfg.common_moves_top);
            println!();
            print!("{}", report::common_moves_text(session.username(), color, &table));
        }
    }

    Ok(())
}

fn write_outputs(dir: &Path, report: &Report) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let tables: [(&str, &str, &[ReportRow]); 4] = [
        ("monthly.csv", "month", &report.monthly),
        ("weekday.csv", "weekday", &report.weekday),
        ("hourly.csv", "hour", &report.hourly),
        ("weekday_hour.csv", "weekday_hour", &report.weekday_hour),
    ];
    for (name, key, rows) in tables {
        let mut w = create(&dir.join(name))?;
        report::write_csv(rows, key, &mut w)?;
        w.flush()?;
    }

    let mut w = create(&dir.join("game_of_day.csv"))?;
    report::write_position_csv(&report.by_position, &mut w)?;
    w.flush()?;

    let mut w = create(&dir.join("rating_history.csv"))?;
    report::write_rating_csv(&report.ratings, &mut w)?;
    w.flush()?;

    let mut w = create(&dir.join("openings.csv"))?;
    report::write_openings_csv(&report.openings, &mut w)?;
    w.flush()?;

    let chart = serde_json::to_string_pretty(&report.chart)?;
    std::fs::write(dir.join("chart.json"), chart).context("writing chart.json")?;
    Ok(())
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}
