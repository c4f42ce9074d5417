//! Configuration file parser for ~/.config/gator/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as a warning, since they are usually typos.
//! `login`/`register` persist the current user back to the same file.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Collection interval is zero, negative or unparsable
    #[error("Invalid interval '{0}': expected a positive duration such as 30s, 1m or 1h30m")]
    InvalidInterval(String),

    #[error("HOME environment variable not set")]
    NoHome,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. `None` means `<config dir>/gator.db`.
    pub db_path: Option<PathBuf>,

    /// Name of the logged-in user, written by `login` and `register`.
    pub current_user_name: Option<String>,

    /// Per-request timeout for feed fetches, in seconds.
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with every feed request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            current_user_name: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "db_path",
        "current_user_name",
        "fetch_timeout_secs",
        "user_agent",
    ];

    /// Default config directory: `$HOME/.config/gator`.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        Ok(PathBuf::from(home).join(".config").join("gator"))
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            user = ?config.current_user_name,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Write the configuration to `path` atomically (temp file + rename), creating
    /// the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));

        let write = || -> Result<(), std::io::Error> {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            drop(file);
            std::fs::rename(&temp_path, path)
        };

        if let Err(e) = write() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ConfigError::Io(e));
        }
        Ok(())
    }

    /// Record `name` as the current user and persist.
    pub fn set_user(&mut self, name: &str, path: &Path) -> Result<(), ConfigError> {
        self.current_user_name = Some(name.to_string());
        self.save(path)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Database location, defaulting to `gator.db` next to the config file.
    pub fn resolve_db_path(&self, config_path: &Path) -> PathBuf {
        match &self.db_path {
            Some(p) => p.clone(),
            None => config_path
                .parent()
                .map(|dir| dir.join("gator.db"))
                .unwrap_or_else(|| PathBuf::from("gator.db")),
        }
    }
}

// ============================================================================
// Collection Interval
// ============================================================================

/// Strictly positive time between scheduler ticks.
///
/// Parsed from Go-style duration strings: a sequence of `<number><unit>`
/// pairs with units `ms`, `s`, `m`, `h` (e.g. `500ms`, `30s`, `1h30m`,
/// `1.5m`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchInterval(Duration);

impl FetchInterval {
    /// Returns `ConfigError::InvalidInterval` for a zero duration.
    pub fn new(duration: Duration) -> Result<Self, ConfigError> {
        if duration.is_zero() {
            return Err(ConfigError::InvalidInterval(format!("{:?}", duration)));
        }
        Ok(Self(duration))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for FetchInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidInterval(s.to_string());
        let input = s.trim();
        if input.is_empty() || input.starts_with('-') {
            return Err(invalid());
        }

        let mut total_ms: f64 = 0.0;
        let mut rest = input.strip_prefix('+').unwrap_or(input);

        while !rest.is_empty() {
            let num_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            if num_len == 0 {
                return Err(invalid());
            }
            let value: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
            rest = &rest[num_len..];

            let unit_len = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let factor = match &rest[..unit_len] {
                "ms" => 1.0,
                "s" => 1_000.0,
                "m" => 60_000.0,
                "h" => 3_600_000.0,
                _ => return Err(invalid()),
            };
            rest = &rest[unit_len..];
            total_ms += value * factor;
        }

        if !total_ms.is_finite() || total_ms > u64::MAX as f64 {
            return Err(invalid());
        }
        Self::new(Duration::from_millis(total_ms.round() as u64)).map_err(|_| invalid())
    }
}

impl fmt::Display for FetchInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.as_millis();
        if ms % 3_600_000 == 0 {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms % 60_000 == 0 {
            write!(f, "{}m", ms / 60_000)
        } else if ms % 1_000 == 0 {
            write!(f, "{}s", ms / 1_000)
        } else {
            write!(f, "{}ms", ms)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
