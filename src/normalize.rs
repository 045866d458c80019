use chrono::{DateTime, FixedOffset};

use crate::model::{Color, GameRecord, NormalizedResult};
use crate::session::Session;

/// A record reduced to what the analyzers need.
#[derive(Clone, Debug)]
pub struct Played {
    pub result: NormalizedResult,
    pub color: Color,
    pub local_end: DateTime<FixedOffset>,
}

/// Map an API result string to a normalized result.
pub fn classify(result: &str) -> NormalizedResult {
    match result {
        "win" => NormalizedResult::Win,
        "timeout" => NormalizedResult::Timeout,
        "checkmated" | "resigned" | "lose" | "abandoned" => NormalizedResult::Loss,
        "agreed" | "repetition" | "stalemate" | "insufficient" | "50move"
        | "timevsinsufficient" => NormalizedResult::Draw,
        _ => NormalizedResult::Unknown,
    }
}

/// Which side the session's player had, if any.
pub fn player_color(game: &GameRecord, session: &Session) -> Option<Color> {
    if session.is_player(&game.white.username) {
        Some(Color::White)
    } else if session.is_player(&game.black.username) {
        Some(Color::Black)
    } else {
        None
    }
}

/// Result for the session's player; `Unknown` when they did not play.
pub fn normalize(game: &GameRecord, session: &Session) -> NormalizedResult {
    match player_color(game, session) {
        Some(Color::White) => classify(&game.white.result),
        Some(Color::Black) => classify(&game.black.result),
        None => NormalizedResult::Unknown,
    }
}

/// The (result, color, local end time) triple, or `None` when the record
/// has no usable end time or the player is not in it.
pub fn played(game: &GameRecord, session: &Session) -> Option<Played> {
    let color = player_color(game, session)?;
    let local_end = session.local_time(game.end_time?)?;
    Some(Played { result: normalize(game, session), color, local_end })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::PlayerSide;

    pub(crate) fn game(end_time: Option<i64>, white: (&str, &str), black: (&str, &str)) -> GameRecord {
        GameRecord {
            url: end_time.map(|t| format!("https://www.chess.com/game/live/{}", t)),
            end_time,
            white: PlayerSide { username: white.0.into(), result: white.1.into(), rating: Some(1500) },
            black: PlayerSide { username: black.0.into(), result: black.1.into(), rating: Some(1500) },
            pgn: None,
            time_control: Some("300".into()),
            time_class: Some("blitz".into()),
            eco: None,
        }
    }

    #[test]
    fn result_vocabulary() {
        assert_eq!(classify("win"), NormalizedResult::Win);
        assert_eq!(classify("timeout"), NormalizedResult::Timeout);
        for s in ["checkmated", "resigned", "lose", "abandoned"] {
            assert_eq!(classify(s), NormalizedResult::Loss, "{}", s);
        }
        assert_eq!(classify("stalemate"), NormalizedResult::Draw);
        assert_eq!(classify("kingofthehill"), NormalizedResult::Unknown);
        assert_eq!(classify("WIN"), NormalizedResult::Unknown);
    }

    #[test]
    fn picks_the_players_side() {
        let s = Session::new("me", 0).unwrap();
        let g = game(Some(1), ("Opp", "win"), ("ME", "resigned"));
        assert_eq!(player_color(&g, &s), Some(Color::Black));
        assert_eq!(normalize(&g, &s), NormalizedResult::Loss);
    }

    #[test]
    fn stranger_game_is_unknown() {
        let s = Session::new("me", 0).unwrap();
        let g = game(Some(1), ("a", "win"), ("b", "checkmated"));
        assert_eq!(normalize(&g, &s), NormalizedResult::Unknown);
        assert!(played(&g, &s).is_none());
    }

    #[test]
    fn missing_end_time_is_not_played() {
        let s = Session::new("me", 0).unwrap();
        let g = game(None, ("me", "win"), ("b", "checkmated"));
        assert_eq!(normalize(&g, &s), NormalizedResult::Win);
        assert!(played(&g, &s).is_none());
    }
}
