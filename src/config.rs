use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub username: String,          // default player when --user and CHESS_USERNAME are absent
    pub api_base: String,          // chess.com public API root
    pub user_agent: String,
    pub cache_dir: String,         // per-(username, date) JSON cache
    pub request_delay_ms: u64,     // spacing between API requests
    pub request_timeout_secs: u64,
    pub utc_offset_minutes: i32,   // local time used for month/day/hour keys
    pub tilt_streak_count: u32,    // consecutive losses that make a tilt episode
    pub tilt_time_gap_secs: i64,   // max span from first loss of a run
    pub thinks_per_game: usize,    // longest thinks shown per game in the digest
    pub top_openings: usize,       // openings listed in the summary
    pub common_moves_top: usize,   // candidate moves shown per move with --moves
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_base: "https://api.chess.com/pub".to_string(),
            user_agent: "chessstats/0.1 (personal statistics)".to_string(),
            cache_dir: "data".to_string(),
            request_delay_ms: 500,
            request_timeout_secs: 10,
            utc_offset_minutes: 0,
            tilt_streak_count: 6,
            tilt_time_gap_secs: 3 * 3600,
            thinks_per_game: 3,
            top_openings: 5,
            common_moves_top: 3,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        match std::fs::read_to_string("config.toml") {
            Ok(s) => Self::from_toml(&s),
            Err(_) => Self::default(),
        }
    }

    fn from_toml(s: &str) -> Self {
        toml::from_str(s).unwrap_or_else(|e| {
            eprintln!("config.toml ignored: {}", e);
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_toml("username = \"Kalel1130\"\ntilt_streak_count = 4\n");
        assert_eq!(cfg.username, "Kalel1130");
        assert_eq!(cfg.tilt_streak_count, 4);
        assert_eq!(cfg.request_delay_ms, 500);
        assert_eq!(cfg.top_openings, 5);
        assert_eq!(cfg.cache_dir, "data");
    }

    #[test]
    fn malformed_file_falls_back_to_default() {
        let cfg = Config::from_toml("username = [");
        assert!(cfg.username.is_empty());
        assert_eq!(cfg.thinks_per_game, 3);
    }
}
