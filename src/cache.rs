use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::GameRecord;

// A saved list, or one monthly archive response.
#[derive(Deserialize)]
#[serde(untagged)]
enum GamesDoc {
    List(Vec<GameRecord>),
    Archive { games: Vec<GameRecord> },
}

/// Games from JSON text: either an array or an object with a `games` array.
pub fn parse_games(text: &str) -> anyhow::Result<Vec<GameRecord>> {
    let doc: GamesDoc = serde_json::from_str(text)
        .context("expected a JSON array of games or an object with a \"games\" array")?;
    Ok(match doc {
        GamesDoc::List(games) => games,
        GamesDoc::Archive { games } => games,
    })
}

pub fn read_games_file(path: &Path) -> anyhow::Result<Vec<GameRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_games(&text).with_context(|| format!("parsing {}", path.display()))
}

/// `{dir}/{username}_{YYYY-MM-DD}.json`
pub fn cache_path(dir: &Path, username: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}_{}.json", username, date.format("%Y-%m-%d")))
}

/// Today's cached games, if any. A corrupt file is deleted.
pub fn load(dir: &Path, username: &str, date: NaiveDate) -> Option<Vec<GameRecord>> {
    let path = cache_path(dir, username, date);
    let text = std::fs::read_to_string(&path).ok()?;
    match parse_games(&text) {
        Ok(games) => {
            vprintln!("cache: loaded {} games from {}", games.len(), path.display());
            Some(games)
        }
        Err(e) => {
            eprintln!("cache: corrupted file {} ({:#}), removing", path.display(), e);
            let _ = std::fs::remove_file(&path);
            None
        }
    }
}

pub fn store(dir: &Path, username: &str, date: NaiveDate, games: &[GameRecord]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = cache_path(dir, username, date);
    let text = serde_json::to_string_pretty(games)?;
    std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    vprintln!("cache: stored {} games in {}", games.len(), path.display());
    Ok(path)
}

/// Append games whose URL is not already present; returns how many were added.
/// Games without a URL are always kept.
pub fn merge_unique(into: &mut Vec<GameRecord>, incoming: Vec<GameRecord>) -> usize {
    let mut seen: HashSet<String> = into.iter().filter_map(|g| g.url.clone()).collect();
    let before = into.len();
    for game in incoming {
        match &game.url {
            Some(url) if !seen.insert(url.clone()) => continue,
            _ => into.push(game),
        }
    }
    into.len() - before
}
