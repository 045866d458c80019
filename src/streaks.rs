use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Timelike};

use crate::model::{percent, GameRecord, NormalizedResult};
use crate::normalize::{played, Played};
use crate::session::Session;

/// Same-hour streak and sequence probabilities, in percent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreakStats {
    pub win_streaks: u64,
    pub win_after_win: u64,
    pub loss_streaks: u64,
    pub loss_after_loss: u64,
    pub win_loss: u64,
    pub win_after_win_loss: u64,
    pub loss_win: u64,
    pub win_after_loss_win: u64,
}

impl StreakStats {
    pub fn win_after_win_pct(&self) -> f64 {
        percent(self.win_after_win, self.win_streaks)
    }
    pub fn loss_after_loss_pct(&self) -> f64 {
        percent(self.loss_after_loss, self.loss_streaks)
    }
    pub fn win_after_win_loss_pct(&self) -> f64 {
        percent(self.win_after_win_loss, self.win_loss)
    }
    pub fn win_after_loss_win_pct(&self) -> f64 {
        percent(self.win_after_loss_win, self.loss_win)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TiltEpisode {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub length: u32,
}

/// Games and win percentage for the n-th game of a day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionStats {
    pub games: u64,
    pub wins: u64,
    pub win_rate: f64,
}

/// The player's games with an end time, oldest first.
fn timeline(games: &[GameRecord], session: &Session) -> Vec<Played> {
    let mut out: Vec<Played> = games.iter().filter_map(|g| played(g, session)).collect();
    out.sort_by_key(|p| p.local_end);
    out
}

#[derive(Copy, Clone, PartialEq)]
enum Outcome {
    Win,
    Loss,
}

fn outcome(r: NormalizedResult) -> Option<Outcome> {
    if r == NormalizedResult::Win {
        Some(Outcome::Win)
    } else if r.is_loss() {
        Some(Outcome::Loss)
    } else {
        None
    }
}

/// Transitions between consecutive decisive games ending in the same
/// hour-of-day. Draws and unknown results are skipped and never become
/// the previous game.
pub fn analyze(games: &[GameRecord], session: &Session) -> StreakStats {
    let line = timeline(games, session);
    let mut stats = StreakStats::default();
    let mut prev: Option<(Outcome, u32)> = None;

    for (i, p) in line.iter().enumerate() {
        let Some(cur) = outcome(p.result) else { continue };
        let hour = p.local_end.hour();

        if let Some((prev_outcome, prev_hour)) = prev {
            if prev_hour == hour {
                match (prev_outcome, cur) {
                    (Outcome::Win, Outcome::Win) => {
                        stats.win_streaks += 1;
                        stats.win_after_win += 1;
                    }
                    (Outcome::Win, Outcome::Loss) => {
                        stats.win_streaks += 1;
                        stats.win_loss += 1;
                        if next_is_win(&line, i) {
                            stats.win_after_win_loss += 1;
                        }
                    }
                    (Outcome::Loss, Outcome::Loss) => {
                        stats.loss_streaks += 1;
                        stats.loss_after_loss += 1;
                    }
                    (Outcome::Loss, Outcome::Win) => {
                        stats.loss_streaks += 1;
                        stats.loss_win += 1;
                        if next_is_win(&line, i) {
                            stats.win_after_loss_win += 1;
                        }
                    }
                }
            }
        }
        prev = Some((cur, hour));
    }
    stats
}

// The following game in time order, whatever its hour.
fn next_is_win(line: &[Played], i: usize) -> bool {
    line.get(i + 1).is_some_and(|n| n.result == NormalizedResult::Win)
}

/// Runs of `streak_count` losses where every loss falls within `time_gap_secs`
/// of the run's first loss.
pub fn detect_tilt(
    games: &[GameRecord],
    session: &Session,
    streak_count: u32,
    time_gap_secs: i64,
) -> Vec<TiltEpisode> {
    let mut episodes = Vec::new();
    if streak_count == 0 {
        return episodes;
    }
    let mut run = 0u32;
    let mut run_start: Option<DateTime<FixedOffset>> = None;

    for p in timeline(games, session) {
        if !p.result.is_loss() {
            run = 0;
            continue;
        }
        match run_start {
            Some(start) if run > 0 && (p.local_end - start).num_seconds() <= time_gap_secs => {
                run += 1;
            }
            _ => {
                run = 1;
                run_start = Some(p.local_end);
            }
        }
        if run >= streak_count {
            if let Some(start) = run_start {
                episodes.push(TiltEpisode { start, end: p.local_end, length: run });
            }
            run = 0;
        }
    }
    episodes
}

/// Win rate of the 1st, 2nd, 3rd... game of each local day.
pub fn by_position_in_day(games: &[GameRecord], session: &Session) -> BTreeMap<u32, PositionStats> {
    let mut out: BTreeMap<u32, PositionStats> = BTreeMap::new();
    let mut day = None;
    let mut position = 0u32;

    for p in timeline(games, session) {
        let d = p.local_end.date_naive();
        if day != Some(d) {
            day = Some(d);
            position = 0;
        }
        position += 1;
        let entry = out.entry(position).or_default();
        entry.games += 1;
        if p.result == NormalizedResult::Win {
            entry.wins += 1;
        }
    }
    for s in out.values_mut() {
        s.win_rate = percent(s.wins, s.games);
    }
    out
}
