//! TOML configuration for the timed primitives
//!
//! ```toml
//! [debounce]
//! delay_ms = 500
//!
//! [stopwatch]
//! initial_time_ms = 0
//! immediately = false
//! tick_interval_ms = 1000
//! ```
//!
//! Millisecond fields are signed so that a negative value in a file is
//! reported as a [`HookError`] instead of a parse failure.

use crate::error::{HookError, Result};
use crate::timer::delay_from_millis;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Debounce defaults
    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Stopwatch defaults
    #[serde(default)]
    pub stopwatch: StopwatchConfig,
}

impl HooksConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse hooks config")?;
        config.validate().context("Invalid hooks config")?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize hooks config")
    }

    /// Check every field
    pub fn validate(&self) -> Result<()> {
        self.debounce.delay()?;
        self.stopwatch.initial_time()?;
        self.stopwatch.tick_interval()?;
        Ok(())
    }
}

/// Debounce settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period before firing (default: 500ms)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: i64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl DebounceConfig {
    /// Validated delay
    pub fn delay(&self) -> Result<Duration> {
        delay_from_millis(self.delay_ms)
    }
}

/// Stopwatch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchConfig {
    /// Baseline elapsed time and reset target (default: 0)
    #[serde(default)]
    pub initial_time_ms: i64,

    /// Start running on construction (default: false)
    #[serde(default)]
    pub immediately: bool,

    /// Refresh period for subscribers (default: 1000ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            initial_time_ms: 0,
            immediately: false,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl StopwatchConfig {
    /// Validated baseline in milliseconds
    pub fn initial_time(&self) -> Result<u64> {
        u64::try_from(self.initial_time_ms)
            .map_err(|_| HookError::NegativeInitialTime(self.initial_time_ms))
    }

    /// Validated tick period
    pub fn tick_interval(&self) -> Result<Duration> {
        match self.tick_interval_ms {
            0 => Err(HookError::ZeroTickInterval),
            ms => Ok(Duration::from_millis(ms)),
        }
    }
}

fn default_delay_ms() -> i64 {
    500
}

fn default_tick_interval_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HooksConfig::default();
        assert_eq!(config.debounce.delay().unwrap(), Duration::from_millis(500));
        assert_eq!(config.stopwatch.initial_time().unwrap(), 0);
        assert!(!config.stopwatch.immediately);
        assert_eq!(
            config.stopwatch.tick_interval().unwrap(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = HooksConfig::from_toml_str(
            r#"
            [stopwatch]
            initial_time_ms = 90061000
            immediately = true
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce, DebounceConfig::default());
        assert_eq!(config.stopwatch.initial_time().unwrap(), 90_061_000);
        assert!(config.stopwatch.immediately);
        assert_eq!(config.stopwatch.tick_interval_ms, 1000);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = HooksConfig::from_toml_str("[debounce]\ndelay_ms = -10\n").unwrap_err();
        let hook_err = err.downcast_ref::<HookError>().unwrap();
        assert_eq!(*hook_err, HookError::NegativeDelay(-10));
    }

    #[test]
    fn test_negative_initial_time_rejected() {
        let config = StopwatchConfig {
            initial_time_ms: -1,
            ..StopwatchConfig::default()
        };
        assert_eq!(
            config.initial_time(),
            Err(HookError::NegativeInitialTime(-1))
        );
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = HooksConfig::from_toml_str("[stopwatch]\ntick_interval_ms = 0\n").unwrap_err();
        assert!(err.downcast_ref::<HookError>().is_some());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("hooks.toml");

        let mut config = HooksConfig::default();
        config.debounce.delay_ms = 250;
        config.stopwatch.tick_interval_ms = 100;
        fs::write(&path, config.to_toml_string()?)?;

        let loaded = HooksConfig::load(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = HooksConfig::load(&temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
