//! Scanner configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock NSE scanner. Telegram credentials may also come from the
//! `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` environment variables, which
//! take precedence over the file.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signalscan_core::data::Interval;
use signalscan_core::notify::DEFAULT_CURRENCY;
use thiserror::Error;

pub const DEFAULT_UNIVERSE: [&str; 10] = [
    "RELIANCE.NS",
    "TCS.NS",
    "ICICIBANK.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "HINDUNILVR.NS",
    "LT.NS",
    "AXISBANK.NS",
    "JSWSTEEL.NS",
    "ONGC.NS",
];

pub const TOP_N_RANGE: RangeInclusive<usize> = 3..=15;
pub const REFRESH_SECS_RANGE: RangeInclusive<u64> = 30..=300;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("top_n {0} outside {min}..={max}", min = TOP_N_RANGE.start(), max = TOP_N_RANGE.end())]
    TopNOutOfRange(usize),

    #[error("unsupported interval {0}m (expected 1 or 5)")]
    UnsupportedInterval(u32),

    #[error("refresh_secs {0} outside {min}..={max}", min = REFRESH_SECS_RANGE.start(), max = REFRESH_SECS_RANGE.end())]
    RefreshOutOfRange(u64),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("telegram alerts enabled but bot token or chat id is missing")]
    MissingTelegramCredentials,
}

/// Telegram delivery settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_secs: 5,
        }
    }
}

impl TelegramConfig {
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

// The token grants full control of the bot; keep it out of logs.
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("enabled", &self.enabled)
            .field("bot_token", &if self.bot_token.is_empty() { "" } else { "<redacted>" })
            .field("chat_id", &self.chat_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Symbols considered for mover selection.
    pub universe: Vec<String>,
    pub top_n: usize,
    /// Bar interval for signal scans, in minutes (1 or 5).
    pub interval_minutes: u32,
    /// Mover lookback; the fetch window is twice this.
    pub movers_window_minutes: u32,
    pub signal_window_minutes: u32,
    pub refresh_secs: u64,
    pub currency: String,
    pub fetch_timeout_secs: u64,
    pub telegram: TelegramConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            top_n: 8,
            interval_minutes: 1,
            movers_window_minutes: 30,
            signal_window_minutes: 60,
            refresh_secs: 60,
            currency: DEFAULT_CURRENCY.to_string(),
            fetch_timeout_secs: 10,
            telegram: TelegramConfig::default(),
        }
    }
}

impl ScannerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply Telegram credentials from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(chat) = lookup(ENV_CHAT_ID).filter(|v| !v.trim().is_empty()) {
            self.telegram.chat_id = chat.trim().to_string();
        }
    }

    /// Parse a newline- or comma-separated symbol list, skipping blanks.
    pub fn parse_symbols(text: &str) -> Vec<String> {
        text.split(|c| c == '\n' || c == ',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn interval(&self) -> Result<Interval, ConfigError> {
        Interval::from_minutes(self.interval_minutes)
            .ok_or(ConfigError::UnsupportedInterval(self.interval_minutes))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        if !TOP_N_RANGE.contains(&self.top_n) {
            return Err(ConfigError::TopNOutOfRange(self.top_n));
        }
        self.interval()?;
        if !REFRESH_SECS_RANGE.contains(&self.refresh_secs) {
            return Err(ConfigError::RefreshOutOfRange(self.refresh_secs));
        }
        for (field, value) in [
            ("movers_window_minutes", u64::from(self.movers_window_minutes)),
            ("signal_window_minutes", u64::from(self.signal_window_minutes)),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("telegram.timeout_secs", self.telegram.timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if self.telegram.enabled && !self.telegram.has_credentials() {
            return Err(ConfigError::MissingTelegramCredentials);
        }
        Ok(())
    }
}
