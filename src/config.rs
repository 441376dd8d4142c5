use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use tailscope_logs::{DEFAULT_MAX_PENDING_BYTES, ShrinkPolicy};

/// What a tail does when the file gets shorter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkSetting {
    #[default]
    Ignore,
    Reset,
}

impl From<ShrinkSetting> for ShrinkPolicy {
    fn from(setting: ShrinkSetting) -> Self {
        match setting {
            ShrinkSetting::Ignore => ShrinkPolicy::Ignore,
            ShrinkSetting::Reset => ShrinkPolicy::Reset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_ms: u64,
    pub page_size: usize,
    /// Entries kept from a live tail; loaded entries are not bounded
    pub buffer_capacity: usize,
    pub max_pending_bytes: usize,
    pub shrink_policy: ShrinkSetting,
    pub show_components: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            page_size: 25,
            buffer_capacity: 100_000,
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
            shrink_policy: ShrinkSetting::Ignore,
            show_components: true,
        }
    }
}

/// `~/.tailscope/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tailscope")
        .join("config.toml")
}

impl Config {
    /// Load from `path`, or the default location when `None`
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);
        if !path.exists() {
            tracing::debug!("config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        tracing::info!("loading configuration from {}", path.display());
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the console cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be > 0");
        }
        if self.page_size == 0 {
            bail!("page_size must be > 0");
        }
        if self.buffer_capacity == 0 {
            bail!("buffer_capacity must be > 0");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("page_size = 40\nshrink_policy = \"reset\"\n").unwrap();
        assert_eq!(config.page_size, 40);
        assert_eq!(config.shrink_policy, ShrinkSetting::Reset);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.max_pending_bytes, 1024 * 1024);
        assert_eq!(ShrinkPolicy::from(config.shrink_policy), ShrinkPolicy::Reset);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.page_size, 25);
        assert!(config.show_components);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "shrink_policy = \"sometimes\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());

        fs::write(&path, "page_size = 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
