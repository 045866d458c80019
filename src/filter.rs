use chrono::NaiveDate;

use crate::model::{Color, GameRecord, NormalizedResult};
use crate::normalize::{normalize, played, player_color};
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultFilter {
    Win,
    Loss,
    Draw,
}

impl ResultFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" | "wins" => Some(ResultFilter::Win),
            "loss" | "losses" => Some(ResultFilter::Loss),
            "draw" | "draws" => Some(ResultFilter::Draw),
            _ => None,
        }
    }

    /// Timeouts are losses here too.
    fn matches(self, result: NormalizedResult) -> bool {
        match self {
            ResultFilter::Win => result == NormalizedResult::Win,
            ResultFilter::Loss => result.is_loss(),
            ResultFilter::Draw => result == NormalizedResult::Draw,
        }
    }
}

/// Narrows the game list before analysis. Unset fields do not filter.
/// Dates are local calendar days, both ends inclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameFilter {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub result: Option<ResultFilter>,
    pub min_rating: Option<i64>,
    pub max_rating: Option<i64>,
    pub min_opponent_rating: Option<i64>,
    pub max_opponent_rating: Option<i64>,
}

impl GameFilter {
    pub fn is_empty(&self) -> bool {
        *self == GameFilter::default()
    }

    pub fn matches(&self, game: &GameRecord, session: &Session) -> bool {
        if self.is_empty() {
            return true;
        }

        if self.since.is_some() || self.until.is_some() {
            let Some(day) = played(game, session).map(|p| p.local_end.date_naive()) else {
                return false;
            };
            if self.since.is_some_and(|d| day < d) || self.until.is_some_and(|d| day > d) {
                return false;
            }
        }

        if let Some(wanted) = self.result {
            if !wanted.matches(normalize(game, session)) {
                return false;
            }
        }

        let rating_filtered = self.min_rating.is_some() || self.max_rating.is_some();
        let opponent_filtered = self.min_opponent_rating.is_some() || self.max_opponent_rating.is_some();
        if rating_filtered || opponent_filtered {
            let Some(color) = player_color(game, session) else { return false };
            let (mine, theirs) = match color {
                Color::White => (game.white.rating, game.black.rating),
                Color::Black => (game.black.rating, game.white.rating),
            };
            if rating_filtered && !in_range(mine, self.min_rating, self.max_rating) {
                return false;
            }
            if opponent_filtered && !in_range(theirs, self.min_opponent_rating, self.max_opponent_rating) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, games: &[GameRecord], session: &Session) -> Vec<GameRecord> {
        games.iter().filter(|g| self.matches(g, session)).cloned().collect()
    }
}

// unrated games never pass a rating bound
fn in_range(rating: Option<i64>, min: Option<i64>, max: Option<i64>) -> bool {
    let Some(r) = rating else { return false };
    min.map_or(true, |m| r >= m) && max.map_or(true, |m| r <= m)
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

    fn rated(end: i64, mine: i64, theirs: i64) -> GameRecord {
        let mut g = game(Some(end), ("me", "win"), ("x", "resigned"));
        g.white.rating = Some(mine);
        g.black.rating = Some(theirs);
        g
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let games = vec![game(None, ("a", "win"), ("b", "lose")), game(Some(JAN1), ("me", "win"), ("x", "resigned"))];
        assert!(GameFilter::default().is_empty());
        assert_eq!(GameFilter::default().apply(&games, &me()).len(), 2);
    }

    #[test]
    fn date_range_is_inclusive_local_days() {
        let games = vec![
            game(Some(JAN1 - 1), ("me", "win"), ("x", "resigned")),
            game(Some(JAN1), ("me", "win"), ("x", "resigned")),
            game(Some(JAN1 + DAY + 86_399), ("me", "win"), ("x", "resigned")),
            game(Some(JAN1 + 2 * DAY), ("me", "win"), ("x", "resigned")),
            game(None, ("me", "win"), ("x", "resigned")),
        ];
        let f = GameFilter {
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: NaiveDate::from_ymd_opt(2024, 1, 2),
            ..Default::default()
        };
        let kept: Vec<_> = f.apply(&games, &me()).iter().map(|g| g.end_time).collect();
        assert_eq!(kept, [Some(JAN1), Some(JAN1 + DAY + 86_399)]);

        // 23:30 UTC on Dec 31 is already Jan 1 at UTC+1
        let plus_one = Session::new("me", 60).unwrap();
        let late = game(Some(JAN1 - 1800), ("me", "win"), ("x", "resigned"));
        assert!(f.matches(&late, &plus_one));
        assert!(!f.matches(&late, &me()));
    }

    #[test]
    fn result_filter_groups_timeouts_with_losses() {
        let games = vec![
            game(Some(JAN1), ("me", "win"), ("x", "resigned")),
            game(Some(JAN1 + 1), ("me", "timeout"), ("x", "win")),
            game(Some(JAN1 + 2), ("x", "win"), ("me", "checkmated")),
            game(Some(JAN1 + 3), ("me", "stalemate"), ("x", "stalemate")),
            game(Some(JAN1 + 4), ("a", "win"), ("b", "resigned")),
        ];
        let only = |r| GameFilter { result: Some(r), ..Default::default() }.apply(&games, &me()).len();
        assert_eq!(only(ResultFilter::Win), 1);
        assert_eq!(only(ResultFilter::Loss), 2);
        assert_eq!(only(ResultFilter::Draw), 1);
        assert_eq!(ResultFilter::parse(" Losses "), Some(ResultFilter::Loss));
        assert_eq!(ResultFilter::parse("timeout"), None);
    }

    #[test]
    fn rating_bounds_use_the_right_side() {
        let mut as_black = rated(JAN1 + 2, 1800, 1200);
        std::mem::swap(&mut as_black.white, &mut as_black.black);
        let games = vec![rated(JAN1, 1400, 1600), rated(JAN1 + 1, 1600, 1400), as_black];

        let f = GameFilter { min_rating: Some(1500), ..Default::default() };
        let kept: Vec<_> = f.apply(&games, &me()).iter().map(|g| g.end_time).collect();
        assert_eq!(kept, [Some(JAN1 + 1), Some(JAN1 + 2)]);

        let f = GameFilter { max_opponent_rating: Some(1500), ..Default::default() };
        assert_eq!(f.apply(&games, &me()).len(), 2);

        let mut unrated = rated(JAN1, 1500, 1500);
        unrated.white.rating = None;
        assert!(!GameFilter { max_rating: Some(3000), ..Default::default() }.matches(&unrated, &me()));
    }
}
