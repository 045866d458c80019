use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use tokio::task;

use crate::cache;
use crate::config::Config;
use crate::model::GameRecord;

/// One monthly archive to download.
#[derive(Debug, PartialEq)]
pub struct ArchiveItem {
    pub month: String, // "YYYY-MM"
    pub url: String,
}

#[derive(Deserialize)]
struct ArchiveList {
    #[serde(default)]
    archives: Vec<String>,
}

/// Archive URLs (`.../games/YYYY/MM`) into oldest-first items.
fn parse_archive_list(json: &str) -> anyhow::Result<Vec<ArchiveItem>> {
    let list: ArchiveList = serde_json::from_str(json).context("parsing archive list")?;
    let re = Regex::new(r"/games/(\d{4})/(\d{2})/?$").unwrap();
    let mut items: Vec<ArchiveItem> = list
        .archives
        .into_iter()
        .filter_map(|url| {
            let url = url.trim().to_string();
            let caps = re.captures(&url)?;
            let month = format!("{}-{}", &caps[1], &caps[2]);
            Some(ArchiveItem { month, url })
        })
        .collect();

    items.sort_by(|a, b| a.month.cmp(&b.month));
    Ok(items)
}

/// Rate-limited blocking client.
struct Api {
    client: reqwest::blocking::Client,
    delay: Duration,
    last: Option<Instant>,
}

impl Api {
    fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self { client, delay: Duration::from_millis(cfg.request_delay_ms), last: None })
    }

    fn get_text(&mut self, url: &str) -> anyhow::Result<String> {
        if let Some(last) = self.last {
            let since = last.elapsed();
            if since < self.delay {
                std::thread::sleep(self.delay - since);
            }
        }
        self.last = Some(Instant::now());
        vprintln!("remote: GET {}", url);
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.text()?)
    }
}

/// Every archived game of `username`, oldest month first. A month that fails
/// to download is reported and skipped.
pub async fn fetch_all(cfg: &Config, username: &str) -> anyhow::Result<Vec<GameRecord>> {
    let cfg = cfg.clone();
    let user = username.to_lowercase();

    task::spawn_blocking(move || -> anyhow::Result<Vec<GameRecord>> {
        let t0 = Instant::now();
        let mut api = Api::new(&cfg)?;
        let list_url = format!("{}/player/{}/games/archives", cfg.api_base.trim_end_matches('/'), user);
        let text = api
            .get_text(&list_url)
            .with_context(|| format!("fetching archive list for {}", user))?;
        let items = parse_archive_list(&text)?;
        vprintln!("remote: months available = {}", items.len());

        let mut games = Vec::new();
        for item in items {
            let month_games = api.get_text(&item.url).and_then(|t| cache::parse_games(&t));
            match month_games {
                Ok(g) => {
                    vprintln!("remote: {} -> {} games", item.month, g.len());
                    cache::merge_unique(&mut games, g);
                }
                Err(e) => eprintln!("remote: skipping {} ({:#})", item.url, e),
            }
        }
        vprintln!("remote: {} games in {:.3}s", games.len(), t0.elapsed().as_secs_f64());
        Ok(games)
    })
    .await?
}

/// Today's cache if present, else a fresh download that is then cached.
pub async fn load_or_fetch(cfg: &Config, username: &str, today: NaiveDate) -> anyhow::Result<Vec<GameRecord>> {
    let dir = Path::new(&cfg.cache_dir);
    if let Some(games) = cache::load(dir, username, today) {
        return Ok(games);
    }
    let games = fetch_all(cfg, username).await?;
    if games.is_empty() {
        eprintln!("remote: no games found for {}", username);
    } else if let Err(e) = cache::store(dir, username, today, &games) {
        eprintln!("cache: failed to store games: {:#}", e);
    }
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_list_oldest_first() {
        let json = r#"{"archives": [
            "https://api.chess.com/pub/player/me/games/2024/02",
            "https://api.chess.com/pub/player/me/games/2023/11",
            "https://api.chess.com/pub/player/me/games/not-a-month"
        ]}"#;
        let items = parse_archive_list(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].month, "2023-11");
        assert_eq!(items[1], ArchiveItem {
            month: "2024-02".into(),
            url: "https://api.chess.com/pub/player/me/games/2024/02".into(),
        });
    }

    #[test]
    fn archive_list_must_be_json() {
        assert!(parse_archive_list("<html>").is_err());
        assert!(parse_archive_list("{}").unwrap().is_empty());
    }
}
