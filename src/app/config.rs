use crate::game::constants::MIN_BOARD_SIZE;
use anyhow::bail;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub board_width: i32,
    pub board_height: i32,
    pub tick_interval: Duration,
    pub idle_broadcast_interval: Duration,
    pub leaderboard_url: Option<String>,
    pub leaderboard_region: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            board_width: 30,
            board_height: 30,
            tick_interval: Duration::from_millis(16),
            idle_broadcast_interval: Duration::from_millis(1000),
            leaderboard_url: None,
            leaderboard_region: "global".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            board_width: parse_or(&lookup, "BOARD_WIDTH", defaults.board_width),
            board_height: parse_or(&lookup, "BOARD_HEIGHT", defaults.board_height),
            tick_interval: Duration::from_millis(
                parse_or::<u64>(&lookup, "SCHEDULER_TICK_MS", 16).max(1),
            ),
            idle_broadcast_interval: Duration::from_millis(
                parse_or::<u64>(&lookup, "IDLE_BROADCAST_MS", 1000).max(1),
            ),
            leaderboard_url: lookup("LEADERBOARD_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            leaderboard_region: lookup("LEADERBOARD_REGION")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.leaderboard_region),
        };
        config.validate()
    }

    fn validate(self) -> anyhow::Result<Self> {
        if self.board_width < MIN_BOARD_SIZE || self.board_height < MIN_BOARD_SIZE {
            bail!(
                "BOARD_WIDTH and BOARD_HEIGHT must be at least {MIN_BOARD_SIZE}, got {}x{}",
                self.board_width,
                self.board_height
            );
        }
        Ok(self)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}
