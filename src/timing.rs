use chrono::{DateTime, FixedOffset};

use crate::model::{Color, GameRecord, MoveThink};
use crate::normalize::played;
use crate::pgn::{movetext, opening_name, PlyScanner};
use crate::session::Session;

/// One ply with the clock reading that followed it.
#[derive(Clone, Debug, PartialEq)]
pub struct ClockedPly {
    pub move_number: u32,
    pub side: Color,
    pub san: String,
    pub clock_seconds: f64,
}

/// Turns movetext into clocked plies. An empty result means nothing usable
/// was found; implementations never fail.
pub trait ClockParser {
    fn plies(&self, movetext: &str) -> Vec<ClockedPly>;
}

/// Clocked plies from the PGN ply scanner. Plies without a clock still
/// count for side alternation but are not returned.
#[derive(Default)]
pub struct RegexClockParser {
    scanner: PlyScanner,
}

impl ClockParser for RegexClockParser {
    fn plies(&self, text: &str) -> Vec<ClockedPly> {
        self.scanner
            .scan(text)
            .into_iter()
            .filter_map(|p| {
                Some(ClockedPly { move_number: p.move_number, side: p.side, san: p.san, clock_seconds: p.clock? })
            })
            .collect()
    }
}

/// Thinking time per move for `side`, longest first, at most `top_n` entries.
///
/// Each side's first clock reading is only a baseline. A move whose clock
/// did not go down (increment, added time) is dropped.
pub fn move_thinks<P: ClockParser + ?Sized>(
    parser: &P,
    notation: &str,
    side: Color,
    top_n: Option<usize>,
) -> Vec<MoveThink> {
    let plies = parser.plies(&movetext(notation));
    if plies.is_empty() {
        vprintln!("timing: warning: no clock annotations found, skipping game");
        return Vec::new();
    }

    let mut last_white: Option<f64> = None;
    let mut last_black: Option<f64> = None;
    let mut thinks = Vec::new();

    for ply in plies {
        let last = match ply.side {
            Color::White => &mut last_white,
            Color::Black => &mut last_black,
        };
        if let Some(prev) = last.replace(ply.clock_seconds) {
            let spent = ((prev - ply.clock_seconds) * 10.0).round() / 10.0;
            if ply.side == side && spent > 0.0 {
                thinks.push(MoveThink {
                    move_index: ply.move_number,
                    side: ply.side,
                    time_spent_seconds: spent,
                    clock_remaining_seconds: ply.clock_seconds,
                    move_text: ply.san,
                });
            }
        }
    }

    // stable: equal thinks stay in game order
    thinks.sort_by(|a, b| b.time_spent_seconds.total_cmp(&a.time_spent_seconds));
    if let Some(n) = top_n {
        thinks.truncate(n);
    }
    thinks
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeControl {
    Live { base_secs: u32, increment_secs: u32 },
    Daily { secs_per_move: u32 },
}

impl TimeControl {
    /// `"600"`, `"180+2"` or `"1/86400"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((moves, secs)) = s.split_once('/') {
            let moves: u32 = moves.parse().ok()?;
            let secs: u32 = secs.parse().ok()?;
            if moves == 0 {
                return None;
            }
            return Some(TimeControl::Daily { secs_per_move: secs / moves });
        }
        let (base, inc) = s.split_once('+').unwrap_or((s, "0"));
        Some(TimeControl::Live { base_secs: base.parse().ok()?, increment_secs: inc.parse().ok()? })
    }

    pub fn label(&self) -> String {
        match *self {
            TimeControl::Daily { secs_per_move } => {
                let days = secs_per_move / 86_400;
                if days >= 1 && secs_per_move % 86_400 == 0 {
                    format!("{} {} per move", days, plural(days as u64, "day", "days"))
                } else {
                    format!("{} per move", format_duration(secs_per_move as f64))
                }
            }
            TimeControl::Live { base_secs, increment_secs } => {
                let base = if base_secs % 60 == 0 {
                    format!("{} min", base_secs / 60)
                } else {
                    format!("{} s", base_secs)
                };
                if increment_secs > 0 {
                    format!("{} + {} s", base, increment_secs)
                } else {
                    base
                }
            }
        }
    }
}

fn plural(n: u64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

/// "2 minutes 5 seconds"; seconds are left out once days appear.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} {}", days, plural(days, "day", "days")));
    }
    if hours > 0 {
        parts.push(format!("{} {}", hours, plural(hours, "hour", "hours")));
    }
    if minutes > 0 {
        parts.push(format!("{} {}", minutes, plural(minutes, "minute", "minutes")));
    }
    if secs > 0 && days == 0 {
        parts.push(format!("{} {}", secs, plural(secs, "second", "seconds")));
    }
    if parts.is_empty() {
        "less than 1 second".to_string()
    } else {
        parts.join(" ")
    }
}

/// Timing digest for one recent game.
#[derive(Clone, Debug)]
pub struct GameTiming {
    pub ended: DateTime<FixedOffset>,
    pub url: String,
    pub opening: String,
    pub result: String,
    pub color: Color,
    pub time_control: String,
    pub longest: Vec<MoveThink>,
    pub average_seconds: f64,
}

/// The `num_games` most recent games with clock data, newest first,
/// each with its `per_game` longest thinks.
pub fn recent_timing<P: ClockParser + ?Sized>(
    games: &[GameRecord],
    session: &Session,
    parser: &P,
    num_games: usize,
    per_game: usize,
) -> Vec<GameTiming> {
    let mut recent: Vec<&GameRecord> = games.iter().filter(|g| g.end_time.is_some()).collect();
    recent.sort_by_key(|g| std::cmp::Reverse(g.end_time));

    let mut out = Vec::new();
    for game in recent {
        if out.len() >= num_games {
            break;
        }
        let (Some(p), Some(pgn)) = (played(game, session), game.pgn.as_deref()) else { continue };
        let thinks = move_thinks(parser, pgn, p.color, None);
        if thinks.is_empty() {
            continue;
        }
        let total: f64 = thinks.iter().map(|t| t.time_spent_seconds).sum();
        let side = match p.color {
            Color::White => &game.white,
            Color::Black => &game.black,
        };
        out.push(GameTiming {
            ended: p.local_end,
            url: game.url.clone().unwrap_or_default(),
            opening: opening_name(game.eco.as_deref(), Some(pgn)),
            result: side.result.clone(),
            color: p.color,
            time_control: game
                .time_control
                .as_deref()
                .and_then(TimeControl::parse)
                .map(|tc| tc.label())
                .unwrap_or_else(|| "Unknown".to_string()),
            average_seconds: total / thinks.len() as f64,
            longest: thinks.into_iter().take(per_game).collect(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::game;

    const SAMPLE: &str = "1. e4 {[%clk 0:05:00]} 1... e5 {[%clk 0:05:00]} \
2. Nf3 {[%clk 0:04:50]} 2... Nc6 {[%clk 0:04:48]}";

    fn thinks(text: &str, side: Color) -> Vec<MoveThink> {
        move_thinks(&RegexClockParser::default(), text, side, None)
    }

    #[test]
    fn nf3_took_ten_seconds() {
        let w = thinks(SAMPLE, Color::White);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].move_index, 2);
        assert_eq!(w[0].move_text, "Nf3");
        assert_eq!(w[0].time_spent_seconds, 10.0);
        assert_eq!(w[0].clock_remaining_seconds, 290.0);
        assert_eq!(w[0].side, Color::White);

        let b = thinks(SAMPLE, Color::Black);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].move_text, "Nc6");
        assert_eq!(b[0].time_spent_seconds, 12.0);
    }

    #[test]
    fn sorted_longest_first_and_truncated() {
        let text = "1. d4 {[%clk 0:03:00]} 1... d5 {[%clk 0:03:00]} \
2. c4 {[%clk 0:02:58]} 2... e6 {[%clk 0:02:59]} \
3. Nc3 {[%clk 0:02:30]} 3... Nf6 {[%clk 0:02:50]} \
4. Bg5 {[%clk 0:02:25]} 4... Be7 {[%clk 0:02:49]}";
        let all = thinks(text, Color::White);
        let moves: Vec<_> = all.iter().map(|t| t.move_text.as_str()).collect();
        assert_eq!(moves, ["Nc3", "Bg5", "c4"]);
        let top = move_thinks(&RegexClockParser::default(), text, Color::White, Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].time_spent_seconds, 28.0);
    }

    #[test]
    fn increments_are_dropped() {
        let text = "1. e4 {[%clk 0:03:00]} 1... c5 {[%clk 0:03:00]} \
2. Nf3 {[%clk 0:03:01.5]} 2... d6 {[%clk 0:02:55.3]}";
        assert!(thinks(text, Color::White).is_empty());
        let b = thinks(text, Color::Black);
        assert!((b[0].time_spent_seconds - 4.7).abs() < 1e-9);
    }

    #[test]
    fn full_pgn_and_unnumbered_black_moves() {
        let pgn = "[Event \"Live Chess\"]\n[White \"me\"]\n\n\
1. e4 { [%clk 0:05:00] } e5 { [%clk 0:05:00] } 2. Nf3 { [%clk 0:04:41] } Nc6 { [%clk 0:04:59] } 1-0";
        let plies = RegexClockParser::default().plies(&movetext(pgn));
        assert_eq!(plies.len(), 4);
        assert_eq!(plies[1].side, Color::Black);
        assert_eq!(plies[1].move_number, 1);
        assert_eq!(plies[3].move_number, 2);
        let w = thinks(pgn, Color::White);
        assert_eq!(w[0].time_spent_seconds, 19.0);
    }

    #[test]
    fn black_reply_without_number_after_unclocked_white() {
        let text = "1. e4 e5 {[%clk 0:05:00]} 2. Nf3 Nc6 {[%clk 0:04:51]}";
        let plies = RegexClockParser::default().plies(text);
        assert_eq!(plies.len(), 2);
        assert!(plies.iter().all(|p| p.side == Color::Black));
        assert_eq!((plies[0].move_number, plies[1].move_number), (1, 2));
        let b = thinks(text, Color::Black);
        assert_eq!(b[0].move_text, "Nc6");
        assert_eq!(b[0].time_spent_seconds, 9.0);
        assert!(thinks(text, Color::White).is_empty());
    }

    #[test]
    fn absurd_clock_is_dropped_not_fatal() {
        let text = "1. e4 {[%clk 18446744073709551615:00:00]} 1... e5 {[%clk 0:05:00]} \
2. Nf3 {[%clk 0:04:50]} 2... Nc6 {[%clk 0:04:45]}";
        assert!(thinks(text, Color::White).is_empty());
        assert_eq!(thinks(text, Color::Black)[0].time_spent_seconds, 15.0);
    }

    #[test]
    fn unparseable_text_is_empty() {
        assert!(thinks("", Color::White).is_empty());
        assert!(thinks("1. e4 e5 2. Nf3 Nc6 1-0", Color::White).is_empty());
        assert!(thinks("not a game at all {", Color::Black).is_empty());
    }

    struct Fixed(Vec<ClockedPly>);

    impl ClockParser for Fixed {
        fn plies(&self, _: &str) -> Vec<ClockedPly> {
            self.0.clone()
        }
    }

    #[test]
    fn parser_is_swappable() {
        let ply = |n, side, san: &str, clock| ClockedPly { move_number: n, side, san: san.into(), clock_seconds: clock };
        let parser = Fixed(vec![
            ply(1, Color::White, "e4", 60.0),
            ply(1, Color::Black, "e5", 60.0),
            ply(2, Color::White, "Qh5", 55.0),
        ]);
        let w = move_thinks(&parser, "ignored", Color::White, None);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].time_spent_seconds, 5.0);
    }

    #[test]
    fn time_controls() {
        assert_eq!(TimeControl::parse("600"), Some(TimeControl::Live { base_secs: 600, increment_secs: 0 }));
        assert_eq!(TimeControl::parse("180+2").map(|t| t.label()).as_deref(), Some("3 min + 2 s"));
        assert_eq!(TimeControl::parse("1/86400").map(|t| t.label()).as_deref(), Some("1 day per move"));
        assert_eq!(TimeControl::parse("45").map(|t| t.label()).as_deref(), Some("45 s"));
        assert!(TimeControl::parse("abc").is_none());
        assert!(TimeControl::parse("0/86400").is_none());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.4), "less than 1 second");
        assert_eq!(format_duration(1.0), "1 second");
        assert_eq!(format_duration(125.0), "2 minutes 5 seconds");
        assert_eq!(format_duration(3661.0), "1 hour 1 minute 1 second");
        assert_eq!(format_duration(2.0 * 86_400.0 + 5.0), "2 days");
    }

    #[test]
    fn recent_digest_skips_games_without_clocks() {
        let s = Session::new("me", 0).unwrap();
        let mut old = game(Some(100), ("me", "win"), ("x", "resigned"));
        old.pgn = Some(SAMPLE.to_string());
        let mut newer = game(Some(200), ("x", "win"), ("me", "timeout"));
        newer.pgn = Some(SAMPLE.to_string());
        newer.time_control = Some("180+2".into());
        let mut newest = game(Some(300), ("me", "win"), ("x", "resigned"));
        newest.pgn = Some("1. e4 e5 1-0".into());

        let digest = recent_timing(&[old, newer, newest], &s, &RegexClockParser::default(), 5, 3);
        assert_eq!(digest.len(), 2);
        assert_eq!(digest[0].color, Color::Black);
        assert_eq!(digest[0].result, "timeout");
        assert_eq!(digest[0].time_control, "3 min + 2 s");
        assert_eq!(digest[0].average_seconds, 12.0);
        assert_eq!(digest[1].longest[0].move_text, "Nf3");
        assert_eq!(digest[1].opening, "Unknown Opening");

        let one = recent_timing(&[], &s, &RegexClockParser::default(), 1, 3);
        assert!(one.is_empty());
    }
}
