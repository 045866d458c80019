use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

pub const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// One side of a game as the public API reports it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerSide {
    pub username: String,
    pub result: String,
    pub rating: Option<i64>,
}

/// A game as fetched from the archive API. Unknown fields are dropped.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GameRecord {
    pub url: Option<String>,
    pub end_time: Option<i64>, // unix seconds
    pub white: PlayerSide,
    pub black: PlayerSide,
    pub pgn: Option<String>,
    pub time_control: Option<String>,
    pub time_class: Option<String>,
    pub eco: Option<String>, // opening URL, e.g. ".../openings/Sicilian-Defense"
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NormalizedResult {
    Win,
    Loss,
    Timeout,
    Draw,
    Unknown,
}

impl NormalizedResult {
    /// Timeouts are losses for every tally that counts losses.
    pub fn is_loss(self) -> bool {
        matches!(self, NormalizedResult::Loss | NormalizedResult::Timeout)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Granularity {
    Month,
    Weekday,
    Hour,
    WeekdayHour,
}

/// Bucketing key. The derived ordering is the report ordering:
/// months chronologically, weekdays Monday first, hours 0..23.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TimeKey {
    Month { year: i32, month: u32 },
    Weekday(u8),              // days from Monday
    Hour(u8),
    WeekdayHour { weekday: u8, hour: u8 },
}

impl TimeKey {
    pub fn from_local(dt: &DateTime<FixedOffset>, granularity: Granularity) -> Self {
        let weekday = dt.weekday().num_days_from_monday() as u8;
        let hour = dt.hour() as u8;
        match granularity {
            Granularity::Month => TimeKey::Month { year: dt.year(), month: dt.month() },
            Granularity::Weekday => TimeKey::Weekday(weekday),
            Granularity::Hour => TimeKey::Hour(hour),
            Granularity::WeekdayHour => TimeKey::WeekdayHour { weekday, hour },
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimeKey::Month { year, month } => format!("{:04}-{:02}", year, month),
            TimeKey::Weekday(d) => day_name(*d).to_string(),
            TimeKey::Hour(h) => format!("{:02}:00", h),
            TimeKey::WeekdayHour { weekday, hour } => {
                format!("{} {:02}:00", day_name(*weekday), hour)
            }
        }
    }
}

fn day_name(d: u8) -> &'static str {
    DAY_NAMES.get(d as usize).copied().unwrap_or("Unknown")
}

/// Per-key tallies. Counts are filled by `add_result`, rates by `finalize`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketStats {
    pub games_played: u64,
    pub wins: u64,
    pub losses: u64, // includes timeouts
    pub timeouts: u64,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub timeout_rate: f64,
}

impl BucketStats {
    pub fn add_result(&mut self, result: NormalizedResult) {
        self.games_played += 1;
        match result {
            NormalizedResult::Win => self.wins += 1,
            NormalizedResult::Timeout => {
                self.timeouts += 1;
                self.losses += 1;
            }
            NormalizedResult::Loss => self.losses += 1,
            NormalizedResult::Draw | NormalizedResult::Unknown => {}
        }
    }

    pub fn finalize(&mut self) {
        self.win_rate = percent(self.wins, self.games_played);
        self.loss_rate = percent(self.losses, self.games_played);
        self.timeout_rate = percent(self.timeouts, self.games_played);
    }
}

/// `count / total * 100`, or 0 for an empty total.
pub fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// One reconstructed thinking-time observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoveThink {
    pub move_index: u32, // full-move number
    #[serde(serialize_with = "serialize_color")]
    pub side: Color,
    pub time_spent_seconds: f64,
    pub clock_remaining_seconds: f64,
    pub move_text: String,
}

fn serialize_color<S: serde::Serializer>(c: &Color, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(c.label())
}
