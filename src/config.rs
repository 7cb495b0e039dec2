//! Configuration for the feed loop and its tracker.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a progress feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Capacity of the bounded message channel.
    pub channel_capacity: usize,
    /// Milliseconds between timed-bar deadline checks.
    pub tick_interval_ms: u64,
    /// Whether a rejected message (unknown or duplicate bar) stops the feed.
    pub strict: bool,
    /// Whether timed bars are dropped from the tracker once finished.
    pub remove_finished_timed: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            tick_interval_ms: 250,
            strict: false,
            remove_finished_timed: true,
        }
    }
}

impl FeedConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Sets the tick interval in milliseconds.
    #[must_use]
    pub const fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Sets strict handling of rejected messages.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets whether finished timed bars are removed.
    #[must_use]
    pub const fn with_remove_finished_timed(mut self, remove: bool) -> Self {
        self.remove_finished_timed = remove;
        self
    }

    /// Tick interval as a `Duration`, never shorter than one millisecond.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Parses a configuration from TOML. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML for this type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        let capacity = config.channel_capacity;
        Ok(config.with_channel_capacity(capacity))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.tick_interval_ms, 250);
        assert!(!config.strict);
        assert!(config.remove_finished_timed);
    }

    #[test]
    fn builder_pattern() {
        let config = FeedConfig::new()
            .with_channel_capacity(8)
            .with_tick_interval_ms(10)
            .with_strict(true)
            .with_remove_finished_timed(false);

        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert!(config.strict);
        assert!(!config.remove_finished_timed);
    }

    #[test]
    fn zero_capacity_and_interval_are_clamped() {
        let config = FeedConfig::new()
            .with_channel_capacity(0)
            .with_tick_interval_ms(0);
        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = FeedConfig::from_toml_str("strict = true\n").unwrap();
        assert!(config.strict);
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = FeedConfig::from_toml_str("strict = \"yes\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn serializes_to_toml() {
        let config = FeedConfig::new().with_tick_interval_ms(40);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(FeedConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 16\nremove_finished_timed = false").unwrap();
        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.channel_capacity, 16);
        assert!(!config.remove_finished_timed);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeedConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
