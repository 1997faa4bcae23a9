//! Telegram transport settings.

use album_relay_core::config::{RelaySettings, SettingsError};
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Messages of the source chat kept for album assembly and the startup probe.
pub const HISTORY_CAPACITY: usize = 100;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    pub telegram_token: String,
    /// Size of the recent-history buffer.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

const fn default_history_capacity() -> usize {
    HISTORY_CAPACITY
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        album_relay_core::config::build_config()?.try_deserialize()
    }
}

/// Combined settings used by the Telegram runner.
#[derive(Clone, Debug)]
pub struct BotSettings {
    /// Forwarding settings.
    pub relay: Arc<RelaySettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(relay: RelaySettings, telegram: TelegramSettings) -> Self {
        Self {
            relay: Arc::new(relay),
            telegram: Arc::new(telegram),
        }
    }

    /// Loads both halves from files and the environment.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if loading or validation fails.
    pub fn load() -> Result<Self, SettingsError> {
        let settings = Self::new(RelaySettings::new()?, TelegramSettings::new()?);
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that the history buffer and the dedup set fit each other.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` naming the offending key.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let relay = self.relay.as_ref();
        let history_capacity = self.telegram.history_capacity;
        if history_capacity < relay.album_scan_limit {
            return Err(SettingsError::Invalid {
                key: "history_capacity",
                reason: format!(
                    "must be at least album_scan_limit ({})",
                    relay.album_scan_limit
                ),
            });
        }
        if relay.dedup_capacity < history_capacity {
            return Err(SettingsError::Invalid {
                key: "dedup_capacity",
                reason: format!("must be at least history_capacity ({history_capacity})"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_telegram_settings_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");

        let settings = TelegramSettings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.history_capacity, HISTORY_CAPACITY);

        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }

    fn bundle(dedup_capacity: usize, history_capacity: usize) -> BotSettings {
        let mut relay = RelaySettings::with_route(-100, -200, "cashxcore", "@InfoXCashReal");
        relay.dedup_capacity = dedup_capacity;
        BotSettings::new(
            relay,
            TelegramSettings {
                telegram_token: "123456:TEST".to_string(),
                history_capacity,
            },
        )
    }

    #[test]
    fn test_validate_rejects_dedup_smaller_than_history() {
        assert!(matches!(
            bundle(50, HISTORY_CAPACITY).validate(),
            Err(SettingsError::Invalid {
                key: "dedup_capacity",
                ..
            })
        ));
        assert!(bundle(HISTORY_CAPACITY, HISTORY_CAPACITY).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_history_smaller_than_scan() {
        assert!(matches!(
            bundle(1024, 5).validate(),
            Err(SettingsError::Invalid {
                key: "history_capacity",
                ..
            })
        ));
    }
}
