//! Relay configuration.
//!
//! Settings come from optional `config/` files and the environment, the same
//! sources every crate of the workspace reads from via [`build_config`].

use crate::dedup::DEFAULT_DEDUP_CAPACITY;
use crate::message::ChatId;
use crate::rewrite::HandleRewriter;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Messages scanned when assembling an album.
pub const ALBUM_SCAN_LIMIT: usize = 10;
/// Messages scanned by the startup probe.
pub const PROBE_SCAN_LIMIT: usize = 5;
/// Wait before scanning for album siblings, in milliseconds.
pub const ALBUM_SETTLE_MS: u64 = 1000;
/// Pause between individual sends after a failed batch, in milliseconds.
pub const INDIVIDUAL_SEND_DELAY_MS: u64 = 500;

/// Invalid relay settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Load(#[from] ConfigError),
    /// A value is out of range or inconsistent
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// The rewrite pattern could not be built
    #[error("Invalid handle pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Builds the layered configuration shared by all crates.
///
/// Sources, later ones overriding earlier ones: `config/default`,
/// `config/{RUN_MODE}`, `config/local`, `APP__*` variables, bare variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Settings of the forwarding relay.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelaySettings {
    /// Chat to monitor
    pub source_chat_id: ChatId,
    /// Chat to forward to
    pub target_chat_id: ChatId,
    /// Username whose mentions are replaced, with or without `@`
    pub handle: String,
    /// Literal replacement for the mention
    pub replacement: String,

    /// History window scanned for album siblings
    #[serde(default = "default_album_scan_limit")]
    pub album_scan_limit: usize,
    /// History window scanned by the startup probe
    #[serde(default = "default_probe_scan_limit")]
    pub probe_scan_limit: usize,
    /// Forward the latest message once at startup
    #[serde(default = "default_true")]
    pub probe_on_startup: bool,
    /// Capacity of the processed-identifier ring
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
    /// Wait before scanning for album siblings
    #[serde(default = "default_album_settle_ms")]
    pub album_settle_ms: u64,
    /// Pause between individual fallback sends
    #[serde(default = "default_individual_send_delay_ms")]
    pub individual_send_delay_ms: u64,
    /// Directory for downloaded media, defaults to a temp subdirectory
    pub download_dir: Option<PathBuf>,
}

const fn default_album_scan_limit() -> usize {
    ALBUM_SCAN_LIMIT
}

const fn default_probe_scan_limit() -> usize {
    PROBE_SCAN_LIMIT
}

const fn default_true() -> bool {
    true
}

const fn default_dedup_capacity() -> usize {
    DEFAULT_DEDUP_CAPACITY
}

const fn default_album_settle_ms() -> u64 {
    ALBUM_SETTLE_MS
}

const fn default_individual_send_delay_ms() -> u64 {
    INDIVIDUAL_SEND_DELAY_MS
}

impl RelaySettings {
    /// Loads and validates settings from files and the environment.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if loading or validation fails.
    pub fn new() -> Result<Self, SettingsError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings with defaults for everything but the required keys.
    #[must_use]
    pub fn with_route(
        source_chat_id: ChatId,
        target_chat_id: ChatId,
        handle: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            source_chat_id,
            target_chat_id,
            handle: handle.into(),
            replacement: replacement.into(),
            album_scan_limit: ALBUM_SCAN_LIMIT,
            probe_scan_limit: PROBE_SCAN_LIMIT,
            probe_on_startup: true,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            album_settle_ms: ALBUM_SETTLE_MS,
            individual_send_delay_ms: INDIVIDUAL_SEND_DELAY_MS,
            download_dir: None,
        }
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.source_chat_id == self.target_chat_id {
            return Err(SettingsError::Invalid {
                key: "target_chat_id",
                reason: "must differ from source_chat_id".to_string(),
            });
        }
        if self.handle.trim().trim_start_matches('@').is_empty() {
            return Err(SettingsError::Invalid {
                key: "handle",
                reason: "must not be empty".to_string(),
            });
        }
        for (key, value) in [
            ("album_scan_limit", self.album_scan_limit),
            ("probe_scan_limit", self.probe_scan_limit),
            ("dedup_capacity", self.dedup_capacity),
        ] {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        // One album marks up to the scan window plus its trigger
        if self.dedup_capacity <= self.album_scan_limit {
            return Err(SettingsError::Invalid {
                key: "dedup_capacity",
                reason: format!("must exceed album_scan_limit ({})", self.album_scan_limit),
            });
        }
        Ok(())
    }

    /// Builds the mention rewriter.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Pattern` if the pattern cannot be compiled.
    pub fn rewriter(&self) -> Result<HandleRewriter, SettingsError> {
        Ok(HandleRewriter::new(&self.handle, self.replacement.clone())?)
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("album-relay"))
    }

    /// Album settle delay.
    #[must_use]
    pub const fn album_settle(&self) -> Duration {
        Duration::from_millis(self.album_settle_ms)
    }

    /// Pause between individual fallback sends.
    #[must_use]
    pub const fn individual_send_delay(&self) -> Duration {
        Duration::from_millis(self.individual_send_delay_ms)
    }
}
