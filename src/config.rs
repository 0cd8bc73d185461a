//! Configuration loading.
//!
//! Configuration is loaded from a TOML file with the following resolution order:
//! 1. explicit path (`--config <path>`)
//! 2. `~/.gridscrape/config.toml` (user)
//! 3. `/etc/gridscrape/config.toml` (system)
//!
//! When none exists, built-in defaults apply. The API key may also come from
//! the `STEAMGRIDDB_API_KEY` environment variable, which wins over the file.
//!
//! ```toml
//! [steamgriddb]
//! api_key = "..."
//! timeout_secs = 30
//!
//! [cache]
//! dir = "/var/cache/gridscrape"
//!
//! [retry]
//! max_retries = 5
//! base_cooldown_secs = 120
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::providers::steamgriddb::DEFAULT_BASE_URL;
use crate::{Result, ScrapeError};

/// Environment variable holding the SteamGridDB API key.
pub const API_KEY_ENV: &str = "STEAMGRIDDB_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub steamgriddb: SteamGridDbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamGridDbConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SteamGridDbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Cache directory (default: the platform cache dir + `gridscrape`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum spacing between provider calls (default: 100).
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

fn default_min_interval_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_cooldown")]
    pub base_cooldown_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_cooldown_secs: default_base_cooldown(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_cooldown() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay(),
        }
    }
}

fn default_retry_delay() -> u64 {
    5
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugConfig {
    /// Write raw provider responses here.
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations, or defaults when no
    /// file exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ScrapeError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScrapeError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ScrapeError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        if config.steamgriddb.api_key.is_some() {
            warn_if_readable_by_others(path);
        }
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(ScrapeError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gridscrape").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/gridscrape/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// [`api_key`](Self::api_key) with an injectable environment lookup.
    pub fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        env(API_KEY_ENV)
            .or_else(|| self.steamgriddb.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Configured cache directory, or `<platform cache dir>/gridscrape`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("gridscrape")
        })
    }
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode & 0o777),
                "config file holds an API key but is readable by group or others"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.steamgriddb.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.steamgriddb.timeout_secs, 30);
        assert_eq!(config.throttle.min_interval_ms, 100);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_cooldown_secs, 120);
        assert_eq!(config.download.retry_delay_secs, 5);
        assert!(config.debug.dump_dir.is_none());
    }

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [steamgriddb]
            api_key = "abc"

            [retry]
            max_retries = 2
        "#,
        )
        .unwrap();
        assert_eq!(config.steamgriddb.api_key.as_deref(), Some("abc"));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_cooldown_secs, 120);
        assert_eq!(config.steamgriddb.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_key_wins_over_file() {
        let config = Config::from_toml_str("[steamgriddb]\napi_key = \"from-file\"").unwrap();
        let key = config.api_key_with(|name| {
            (name == API_KEY_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(key.as_deref(), Some("from-env"));
        assert_eq!(config.api_key_with(|_| None).as_deref(), Some("from-file"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = Config::from_toml_str("[steamgriddb]\napi_key = \"  \"").unwrap();
        assert_eq!(config.api_key_with(|_| None), None);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/gridscrape.toml"))).unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(_)));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = Config::from_toml_str("[retry]\nmax_retries = \"many\"").unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(_)));
    }
}
