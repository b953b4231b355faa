//! Notification engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Engine-wide tuning knobs. Everything here has a sensible default so a
/// missing config file is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// OS-imposed ceiling on simultaneously pending requests.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Delivered records older than this are pruned.
    #[serde(default = "default_delivered_max_age_days")]
    pub delivered_max_age_days: u64,
    /// How often the background loop re-polls authorization state.
    #[serde(default = "default_auth_poll_secs")]
    pub auth_poll_secs: u64,
    /// How often delivered history is cleaned up.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// How often scheduling statistics are sampled and logged.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    /// Delay applied when the user asks to be reminded later.
    #[serde(default = "default_snooze_delay_secs")]
    pub snooze_delay_secs: u64,
    /// Day of month for the recurring budget-update reminder.
    #[serde(default = "default_budget_update_day")]
    pub budget_update_day: u32,
}

fn default_max_pending() -> usize { 64 }
fn default_delivered_max_age_days() -> u64 { 7 }
fn default_auth_poll_secs() -> u64 { 300 }
fn default_cleanup_interval_secs() -> u64 { 21_600 }
fn default_stats_interval_secs() -> u64 { 900 }
fn default_snooze_delay_secs() -> u64 { 3600 }
fn default_budget_update_day() -> u32 { 1 }

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            delivered_max_age_days: default_delivered_max_age_days(),
            auth_poll_secs: default_auth_poll_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            stats_interval_secs: default_stats_interval_secs(),
            snooze_delay_secs: default_snooze_delay_secs(),
            budget_update_day: default_budget_update_day(),
        }
    }
}

impl NotifyConfig {
    /// Load config from the default path (~/.centime/notify.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::NotifyError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::NotifyError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::NotifyError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".centime")
            .join("notify.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotifyConfig::default();
        assert_eq!(config.max_pending, 64);
        assert_eq!(config.delivered_max_age_days, 7);
        assert_eq!(config.auth_poll_secs, 300);
        assert_eq!(config.snooze_delay_secs, 3600);
        assert_eq!(config.budget_update_day, 1);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: NotifyConfig = toml::from_str("max_pending = 10").unwrap();
        assert_eq!(config.max_pending, 10);
        assert_eq!(config.delivered_max_age_days, 7);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("centime-test-config");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("notify.toml");

        let mut config = NotifyConfig::default();
        config.max_pending = 32;
        config.budget_update_day = 15;
        config.save_to(&path).unwrap();

        let loaded = NotifyConfig::load_from(&path).unwrap();
        assert_eq!(loaded.max_pending, 32);
        assert_eq!(loaded.budget_update_day, 15);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = NotifyConfig::load_from(Path::new("/nonexistent/notify.toml"));
        assert!(result.is_err());
    }
}
