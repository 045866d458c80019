use chrono::{DateTime, FixedOffset};

/// Whose games are being analysed, and in which local time.
#[derive(Clone, Debug)]
pub struct Session {
    username: String,
    offset: FixedOffset,
}

impl Session {
    pub fn new(username: &str, utc_offset_minutes: i32) -> anyhow::Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            anyhow::bail!("no username given (use --user, CHESS_USERNAME or config.toml)");
        }
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {} minutes", utc_offset_minutes))?;
        Ok(Self { username: username.to_string(), offset })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Case-insensitive comparison against a username from a record.
    pub fn is_player(&self, name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(&self.username)
    }

    /// Unix seconds to local time; `None` for out-of-range timestamps.
    pub fn local_time(&self, unix_secs: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(unix_secs, 0).map(|utc| utc.with_timezone(&self.offset))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}
