use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;

use crate::aggregator::{aggregate, daily_volume, games_per_day, overall, AggMap};
use crate::config::Config;
use crate::model::{BucketStats, Color, GameRecord, Granularity, TimeKey};
use crate::profile::{self, MoveFrequency, OpeningCount, RatingPoint, RatingSummary};
use crate::session::Session;
use crate::streaks::{self, PositionStats, StreakStats, TiltEpisode};
use crate::timing::{format_duration, GameTiming};

/// One display/export row.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub stats: BucketStats,
}

pub type Table = Vec<ReportRow>;

/// Rows in key order, labelled for display.
pub fn table(map: &AggMap) -> Table {
    map.iter()
        .map(|(k, s)| ReportRow { label: k.label(), stats: s.clone() })
        .collect()
}

/// Input for an external charting step, one entry per month.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub months: Vec<String>,
    pub wins: Vec<u64>,
    pub losses: Vec<u64>,
    pub timeout_rate: Vec<f64>,
    pub games: Vec<u64>,
}

pub fn chart_series(monthly: &AggMap) -> ChartSeries {
    let mut series = ChartSeries::default();
    for (key, s) in monthly {
        if !matches!(key, TimeKey::Month { .. }) {
            continue;
        }
        series.months.push(key.label());
        series.wins.push(s.wins);
        series.losses.push(s.losses);
        series.timeout_rate.push(s.timeout_rate);
        series.games.push(s.games_played);
    }
    series
}

/// Everything the presentation layer needs for one player.
pub struct Report {
    pub totals: BucketStats,
    pub avg_per_day: f64,
    pub median_per_day: f64,
    pub streaks: StreakStats,
    pub tilts: Vec<TiltEpisode>,
    pub by_position: BTreeMap<u32, PositionStats>,
    pub avg_game_length: f64,
    pub openings: Vec<OpeningCount>,
    pub ratings: Vec<RatingPoint>,
    pub rating: Option<RatingSummary>,
    pub monthly: Table,
    pub weekday: Table,
    pub hourly: Table,
    pub weekday_hour: Table,
    pub chart: ChartSeries,
}

pub fn build_report(games: &[GameRecord], session: &Session, cfg: &Config) -> Report {
    let monthly = aggregate(games, session, Granularity::Month);
    let (avg_per_day, median_per_day) = daily_volume(&games_per_day(games, session));
    let ratings = profile::rating_history(games, session);
    Report {
        totals: overall(games, session),
        avg_per_day,
        median_per_day,
        streaks: streaks::analyze(games, session),
        tilts: streaks::detect_tilt(games, session, cfg.tilt_streak_count, cfg.tilt_time_gap_secs),
        by_position: streaks::by_position_in_day(games, session),
        avg_game_length: profile::average_game_length(games, session),
        openings: profile::favourite_openings(games, session, cfg.top_openings),
        rating: profile::rating_summary(&ratings),
        ratings,
        chart: chart_series(&monthly),
        monthly: table(&monthly),
        weekday: table(&aggregate(games, session, Granularity::Weekday)),
        hourly: table(&aggregate(games, session, Granularity::Hour)),
        weekday_hour: table(&aggregate(games, session, Granularity::WeekdayHour)),
    }
}

/// Fixed labeled lines; percentages with two decimals.
pub fn summary_text(username: &str, r: &Report) -> String {
    let mut out = String::new();
    let t = &r.totals;
    let s = &r.streaks;
    let _ = writeln!(out, "Statistics for {}", username);
    let _ = writeln!(out, "Total games: {}", t.games_played);
    let _ = writeln!(out, "Wins: {}", t.wins);
    let _ = writeln!(out, "Losses: {}", t.losses);
    let _ = writeln!(out, "Timeouts: {}", t.timeouts);
    let _ = writeln!(out, "Win rate: {:.2}%", t.win_rate);
    let _ = writeln!(out, "Loss rate: {:.2}%", t.loss_rate);
    let _ = writeln!(out, "Timeout rate: {:.2}%", t.timeout_rate);
    let _ = writeln!(out, "Average games per day: {:.2}", r.avg_per_day);
    let _ = writeln!(out, "Median games per day: {:.2}", r.median_per_day);
    let _ = writeln!(out, "Average game length: {:.1} moves", r.avg_game_length);
    match r.rating {
        Some(rt) => {
            let _ = writeln!(
                out,
                "Rating: first {}, latest {}, peak {}, lowest {}",
                rt.first, rt.latest, rt.peak, rt.lowest
            );
        }
        None => {
            let _ = writeln!(out, "Rating: no rated games");
        }
    }
    let _ = writeln!(out, "Win after a win in the same hour: {:.2}%", s.win_after_win_pct());
    let _ = writeln!(out, "Loss after a loss in the same hour: {:.2}%", s.loss_after_loss_pct());
    let _ = writeln!(out, "Win after a win-loss sequence in the same hour: {:.2}%", s.win_after_win_loss_pct());
    let _ = writeln!(out, "Win after a loss-win sequence in the same hour: {:.2}%", s.win_after_loss_win_pct());
    let _ = writeln!(out, "Tilt episodes: {}", r.tilts.len());
    for tilt in &r.tilts {
        let _ = writeln!(
            out,
            "- {} to {}: {} losses",
            tilt.start.format("%Y-%m-%d %H:%M"),
            tilt.end.format("%H:%M"),
            tilt.length
        );
    }
    let _ = writeln!(out, "Favourite openings: {}", r.openings.len());
    for o in &r.openings {
        let _ = writeln!(out, "- {}: {} {}", o.name, o.games, if o.games == 1 { "game" } else { "games" });
    }
    out
}

/// CSV with the row label first and rates to one decimal.
pub fn write_csv<W: Write>(rows: &[ReportRow], key_column: &str, mut w: W) -> io::Result<()> {
    writeln!(
        w,
        "{},games_played,wins,losses,timeouts,win_rate_percent,loss_rate_percent,timeout_rate_percent",
        key_column
    )?;
    for row in rows {
        let s = &row.stats;
        writeln!(
            w,
            "{},{},{},{},{},{:.1},{:.1},{:.1}",
            escape_csv(&row.label),
            s.games_played,
            s.wins,
            s.losses,
            s.timeouts,
            s.win_rate,
            s.loss_rate,
            s.timeout_rate
        )?;
    }
    Ok(())
}

/// Win rate of the n-th game of the day, one row per position.
pub fn write_position_csv<W: Write>(by_position: &BTreeMap<u32, PositionStats>, mut w: W) -> io::Result<()> {
    writeln!(w, "game_of_day,games,wins,win_rate_percent")?;
    for (pos, s) in by_position {
        writeln!(w, "{},{},{},{:.1}", pos, s.games, s.wins, s.win_rate)?;
    }
    Ok(())
}

pub fn write_rating_csv<W: Write>(history: &[RatingPoint], mut w: W) -> io::Result<()> {
    writeln!(w, "played_at,rating")?;
    for p in history {
        writeln!(w, "{},{}", p.at.format("%Y-%m-%d %H:%M"), p.rating)?;
    }
    Ok(())
}

pub fn write_openings_csv<W: Write>(openings: &[OpeningCount], mut w: W) -> io::Result<()> {
    writeln!(w, "opening,games")?;
    for o in openings {
        writeln!(w, "{},{}", escape_csv(&o.name), o.games)?;
    }
    Ok(())
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Longest thinks per recent game, as plain text.
pub fn timing_text(username: &str, digest: &[GameTiming]) -> String {
    let mut out = String::new();
    if digest.is_empty() {
        let _ = writeln!(out, "No games with clock data.");
        return out;
    }
    for (i, g) in digest.iter().enumerate() {
        let _ = writeln!(out, "Game {}: {}", i + 1, g.url);
        let _ = writeln!(
            out,
            "Played on {} as {} ({}, {}), result: {}",
            g.ended.format("%Y-%m-%d %H:%M"),
            g.color.label(),
            g.time_control,
            g.opening,
            g.result
        );
        let _ = writeln!(out, "Average time per move: {:.1}s", g.average_seconds);
        let _ = writeln!(out, "{}'s longest thinks:", username);
        for (j, t) in g.longest.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. Move {} {} ({}, {} left)",
                j + 1,
                t.move_index,
                t.move_text,
                format_duration(t.time_spent_seconds),
                format_duration(t.clock_remaining_seconds)
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }
    out
}

/// Most played moves per move number for one colour.
pub fn common_moves_text(username: &str, color: Color, table: &[Vec<MoveFrequency>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Most common moves for {} as {}", username, color.label());
    if table.is_empty() {
        let _ = writeln!(out, "No games with moves.");
        return out;
    }
    for (i, moves) in table.iter().enumerate() {
        let _ = writeln!(out, "Move {}:", i + 1);
        for m in moves {
            let _ = writeln!(
                out,
                "  {}: {:.1}% ({}) last game: {}",
                m.san,
                m.percent,
                m.count,
                m.last_url.as_deref().unwrap_or("-")
            );
        }
    }
    out
}
