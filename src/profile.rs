use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::model::{percent, Color, GameRecord};
use crate::normalize::{played, player_color};
use crate::pgn::{movetext, opening, PlyScanner};
use crate::session::Session;

#[derive(Clone, Debug, PartialEq)]
pub struct OpeningCount {
    pub name: String,
    pub games: u64,
}

/// Most played openings, most games first, ties by name.
/// Games without an ECO URL or ECO tag are not counted.
pub fn favourite_openings(games: &[GameRecord], session: &Session, top_n: usize) -> Vec<OpeningCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for game in games {
        if player_color(game, session).is_none() {
            continue;
        }
        if let Some(name) = opening(game.eco.as_deref(), game.pgn.as_deref()) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    let mut list: Vec<OpeningCount> = counts.into_iter().map(|(name, games)| OpeningCount { name, games }).collect();
    list.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.name.cmp(&b.name)));
    list.truncate(top_n);
    list
}

#[derive(Clone, Debug, PartialEq)]
pub struct RatingPoint {
    pub at: DateTime<FixedOffset>,
    pub rating: i64,
}

/// The player's rating after each finished game, oldest first.
pub fn rating_history(games: &[GameRecord], session: &Session) -> Vec<RatingPoint> {
    let mut points: Vec<RatingPoint> = games
        .iter()
        .filter_map(|game| {
            let p = played(game, session)?;
            let side = match p.color {
                Color::White => &game.white,
                Color::Black => &game.black,
            };
            let rating = side.rating.filter(|r| *r > 0)?;
            Some(RatingPoint { at: p.local_end, rating })
        })
        .collect();
    points.sort_by_key(|p| p.at);
    points
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RatingSummary {
    pub first: i64,
    pub latest: i64,
    pub peak: i64,
    pub lowest: i64,
}

pub fn rating_summary(history: &[RatingPoint]) -> Option<RatingSummary> {
    let first = history.first()?.rating;
    let latest = history.last()?.rating;
    let peak = history.iter().map(|p| p.rating).max()?;
    let lowest = history.iter().map(|p| p.rating).min()?;
    Some(RatingSummary { first, latest, peak, lowest })
}

/// Average length in full moves over the player's games with movetext.
pub fn average_game_length(games: &[GameRecord], session: &Session) -> f64 {
    let scanner = PlyScanner::default();
    let mut total = 0u64;
    let mut counted = 0u64;
    for game in games {
        if player_color(game, session).is_none() {
            continue;
        }
        let Some(pgn) = game.pgn.as_deref() else { continue };
        let plies = scanner.scan(&movetext(pgn)).len() as u64;
        if plies == 0 {
            continue;
        }
        total += plies.div_ceil(2);
        counted += 1;
    }
    if counted == 0 {
        0.0
    } else {
        total as f64 / counted as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoveFrequency {
    pub san: String,
    pub count: u64,
    pub percent: f64,
    /// Most recent game that played it.
    pub last_url: Option<String>,
}

/// For the player's first `depth` moves as `color`: the `top_n` most played
/// SAN moves at each move, most frequent first. Entry `i` is move `i + 1`.
pub fn common_moves(
    games: &[GameRecord],
    session: &Session,
    color: Color,
    depth: usize,
    top_n: usize,
) -> Vec<Vec<MoveFrequency>> {
    let scanner = PlyScanner::default();
    let mut ordered: Vec<&GameRecord> = games
        .iter()
        .filter(|g| g.pgn.is_some() && player_color(g, session) == Some(color))
        .collect();
    ordered.sort_by_key(|g| g.end_time);

    let mut by_move: Vec<HashMap<String, (u64, Option<String>)>> = vec![HashMap::new(); depth];
    let mut analysed = 0usize;
    for game in ordered {
        let Some(pgn) = game.pgn.as_deref() else { continue };
        let plies = scanner.scan(&movetext(pgn));
        let mine = plies.into_iter().filter(|p| p.side == color).take(depth);
        let mut any = false;
        for (slot, ply) in by_move.iter_mut().zip(mine) {
            let entry = slot.entry(ply.san).or_insert((0, None));
            entry.0 += 1;
            entry.1 = game.url.clone();
            any = true;
        }
        if any {
            analysed += 1;
        }
    }
    vprintln!("moves: {} games as {}", analysed, color.label());

    by_move
        .into_iter()
        .take_while(|slot| !slot.is_empty())
        .map(|slot| {
            let total: u64 = slot.values().map(|(n, _)| n).sum();
            let mut list: Vec<MoveFrequency> = slot
                .into_iter()
                .map(|(san, (count, last_url))| MoveFrequency { san, count, percent: percent(count, total), last_url })
                .collect();
            list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.san.cmp(&b.san)));
            list.truncate(top_n);
            list
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::game;

    const JAN1: i64 = 1_704_067_200;
    const DAY: i64 = 86_400;

    fn me() -> Session {
        Session::new("me", 0).unwrap()
    }

    fn with_pgn(end: i64, me_white: bool, pgn: &str) -> GameRecord {
        let mut g = if me_white {
            game(Some(end), ("me", "win"), ("x", "resigned"))
        } else {
            game(Some(end), ("x", "win"), ("me", "resigned"))
        };
        g.pgn = Some(pgn.to_string());
        g
    }

    #[test]
    fn openings_ranked_and_capped() {
        let mut games = Vec::new();
        for (i, name) in ["Sicilian-Defense", "Sicilian-Defense", "French-Defense", "Caro-Kann", "Caro-Kann", "Caro-Kann"]
            .iter()
            .enumerate()
        {
            let mut g = game(Some(JAN1 + i as i64), ("me", "win"), ("x", "resigned"));
            g.eco = Some(format!("https://www.chess.com/openings/{}", name));
            games.push(g);
        }
        let mut tagged = game(Some(JAN1 + 10), ("x", "win"), ("me", "resigned"));
        tagged.pgn = Some("[ECO \"B20\"]\n\n1. e4 c5".into());
        games.push(tagged);
        games.push(game(Some(JAN1 + 11), ("me", "win"), ("x", "resigned")));
        let mut stranger = game(Some(JAN1 + 12), ("a", "win"), ("b", "resigned"));
        stranger.eco = Some("https://www.chess.com/openings/Caro-Kann".into());
        games.push(stranger);

        let top = favourite_openings(&games, &me(), 3);
        let got: Vec<_> = top.iter().map(|o| (o.name.as_str(), o.games)).collect();
        assert_eq!(got, [("Caro-Kann", 3), ("Sicilian-Defense", 2), ("B20", 1)]);
        assert!(favourite_openings(&[], &me(), 5).is_empty());
    }

    #[test]
    fn rating_history_oldest_first_for_own_side() {
        let mut a = game(Some(JAN1 + DAY), ("me", "win"), ("x", "resigned"));
        a.white.rating = Some(1520);
        let mut b = game(Some(JAN1), ("x", "win"), ("me", "resigned"));
        b.black.rating = Some(1490);
        b.white.rating = Some(2000);
        let mut unrated = game(Some(JAN1 + 2 * DAY), ("me", "win"), ("x", "resigned"));
        unrated.white.rating = None;
        let no_time = game(None, ("me", "win"), ("x", "resigned"));

        let history = rating_history(&[a, b, unrated, no_time], &me());
        let ratings: Vec<_> = history.iter().map(|p| p.rating).collect();
        assert_eq!(ratings, [1490, 1520]);
        assert_eq!(history[0].at.timestamp(), JAN1);

        let s = rating_summary(&history).unwrap();
        assert_eq!((s.first, s.latest, s.peak, s.lowest), (1490, 1520, 1520, 1490));
        assert!(rating_summary(&[]).is_none());
    }

    #[test]
    fn game_length_in_full_moves() {
        let games = vec![
            with_pgn(JAN1, true, "[Event \"x\"]\n\n1. e4 {[%clk 0:05:00]} 1... e5 {[%clk 0:05:00]} 2. Qh5 1-0"),
            with_pgn(JAN1 + 1, false, "1. d4 d5 2. c4 e6 1/2-1/2"),
            with_pgn(JAN1 + 2, true, "1-0"),
            game(Some(JAN1 + 3), ("me", "win"), ("x", "resigned")),
        ];
        assert_eq!(average_game_length(&games, &me()), 2.0);
        assert_eq!(average_game_length(&[], &me()), 0.0);
    }

    #[test]
    fn common_moves_per_index_and_colour() {
        let games = vec![
            with_pgn(JAN1, true, "1. e4 e5 2. Nf3 Nc6"),
            with_pgn(JAN1 + 1, true, "1. e4 c5 2. Nc3"),
            with_pgn(JAN1 + 2, true, "1. d4 d5"),
            with_pgn(JAN1 + 3, false, "1. e4 c6 2. d4 d5"),
        ];
        let white = common_moves(&games, &me(), Color::White, 5, 2);
        assert_eq!(white.len(), 2);
        assert_eq!(white[0][0].san, "e4");
        assert_eq!(white[0][0].count, 2);
        assert!((white[0][0].percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(white[0][0].last_url.as_deref(), Some("https://www.chess.com/game/live/1704067201"));
        assert_eq!(white[0][1].san, "d4");
        let second: Vec<_> = white[1].iter().map(|m| (m.san.as_str(), m.count)).collect();
        assert_eq!(second, [("Nc3", 1), ("Nf3", 1)]);

        let black = common_moves(&games, &me(), Color::Black, 1, 3);
        assert_eq!(black.len(), 1);
        assert_eq!(black[0][0].san, "c6");
        assert_eq!(black[0][0].percent, 100.0);

        assert!(common_moves(&[], &me(), Color::White, 3, 3).is_empty());
    }
}
