use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{BucketStats, GameRecord, Granularity, TimeKey};
use crate::normalize::played;
use crate::session::Session;

pub type AggMap = BTreeMap<TimeKey, BucketStats>;

/// Bucket the player's games by `granularity` and finalize the rates.
/// Input order does not matter; output is ordered by key.
pub fn aggregate(games: &[GameRecord], session: &Session, granularity: Granularity) -> AggMap {
    let mut map: AggMap = BTreeMap::new();
    for game in games {
        let Some(p) = played(game, session) else { continue };
        let key = TimeKey::from_local(&p.local_end, granularity);
        map.entry(key).or_default().add_result(p.result);
    }
    for stats in map.values_mut() {
        stats.finalize();
    }
    map
}

/// Totals over every game the player finished.
pub fn overall(games: &[GameRecord], session: &Session) -> BucketStats {
    let mut stats = BucketStats::default();
    for p in games.iter().filter_map(|g| played(g, session)) {
        stats.add_result(p.result);
    }
    stats.finalize();
    stats
}

/// Games per local calendar day, by date.
pub fn games_per_day(games: &[GameRecord], session: &Session) -> BTreeMap<NaiveDate, u64> {
    let mut days = BTreeMap::new();
    for p in games.iter().filter_map(|g| played(g, session)) {
        *days.entry(p.local_end.date_naive()).or_insert(0u64) += 1;
    }
    days
}

/// (average, median) over days with at least one game; zeros when there are none.
pub fn daily_volume(days: &BTreeMap<NaiveDate, u64>) -> (f64, f64) {
    if days.is_empty() {
        return (0.0, 0.0);
    }
    let mut counts: Vec<u64> = days.values().copied().collect();
    counts.sort_unstable();
    let total: u64 = counts.iter().sum();
    let avg = total as f64 / counts.len() as f64;
    let mid = counts.len() / 2;
    let median = if counts.len() % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f64 / 2.0
    } else {
        counts[mid] as f64
    };
    (avg, median)
}
