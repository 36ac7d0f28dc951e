//! # Configuration Management for TicketLens
//!
//! This crate provides centralized configuration structures for all TicketLens components,
//! including the analysis cache, the batch processor and the signal system.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{BatchConfig, CacheConfig, SignalConfig};
//!
//! let cache_config = CacheConfig::new(3600, "ticketlens".to_string());
//! let batch_config = BatchConfig::new(4).with_item_timeout_ms(30_000);
//! let signal_config = SignalConfig::new(true, 32);
//! assert_eq!(batch_config.concurrency_limit, 4);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [cache]
//! default_ttl_seconds = 3600
//! key_prefix = "ticketlens"
//! sweep_interval_seconds = 60
//!
//! [batch]
//! concurrency_limit = 4
//! item_timeout_ms = 30000
//! batch_timeout_ms = 300000
//!
//! [signal]
//! enabled = true
//! max_callbacks = 32
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from ticketlens.toml (or the file named by TICKETLENS_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./ticketlens.toml";
const CONFIG_PATH_VAR: &str = "TICKETLENS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Path named by `TICKETLENS_CONFIG`; an unset variable means "use the default"
fn configured_path(value: Result<String, env::VarError>) -> Result<Option<String>, ConfigError> {
    match value {
        Ok(path) => Ok(Some(path)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub batch: BatchConfig,
    pub signal: SignalConfig,
}

/// Analysis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Default TTL for cache entries (in seconds)
    pub default_ttl_seconds: u64,
    /// Key prefix for all cache entries
    pub key_prefix: String,
    /// Interval of the background expiration sweep; `None` disables it
    pub sweep_interval_seconds: Option<u64>,
}

/// Batch processor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of gateway calls in flight for one batch
    pub concurrency_limit: usize,
    /// Per-item gateway timeout in milliseconds
    pub item_timeout_ms: Option<u64>,
    /// Overall batch deadline in milliseconds
    pub batch_timeout_ms: Option<u64>,
}

/// Signal system configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub enabled: bool,
    pub max_callbacks: usize,
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine, a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(config_path) = configured_path(env::var(CONFIG_PATH_VAR))? {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Cache validations
        if self.cache.default_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Cache default_ttl_seconds must be greater than 0".to_string(),
            ));
        }
        if self.cache.key_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "Cache key_prefix cannot be empty".to_string(),
            ));
        }
        if self
            .cache
            .key_prefix
            .contains(['*', '?', '[', ']', '\\'])
        {
            return Err(ConfigError::Invalid(format!(
                "Cache key_prefix cannot contain glob metacharacters: {}",
                self.cache.key_prefix
            )));
        }
        if self.cache.sweep_interval_seconds == Some(0) {
            return Err(ConfigError::Invalid(
                "Cache sweep_interval_seconds must be greater than 0".to_string(),
            ));
        }

        // Batch validations
        if self.batch.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "Batch concurrency_limit must be greater than 0".to_string(),
            ));
        }
        if self.batch.item_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "Batch item_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.batch.batch_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "Batch batch_timeout_ms must be greater than 0".to_string(),
            ));
        }

        // Signal validations
        if self.signal.max_callbacks == 0 {
            return Err(ConfigError::Invalid(
                "Signal max_callbacks must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(default_ttl_seconds: u64, key_prefix: String) -> Self {
        Self {
            default_ttl_seconds,
            key_prefix,
            sweep_interval_seconds: None,
        }
    }

    pub fn with_sweep_interval(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = Some(seconds);
        self
    }

    /// Get TTL as Duration
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_seconds.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600, // 1 hour
            key_prefix: "ticketlens".to_string(),
            sweep_interval_seconds: Some(60),
        }
    }
}

impl BatchConfig {
    /// Create a new batch configuration without timeouts
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit,
            item_timeout_ms: None,
            batch_timeout_ms: None,
        }
    }

    pub fn with_item_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.item_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_batch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.batch_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_ms.map(Duration::from_millis)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            item_timeout_ms: Some(30_000),
            batch_timeout_ms: None,
        }
    }
}

impl SignalConfig {
    /// Create a new signal configuration
    pub fn new(enabled: bool, max_callbacks: usize) -> Self {
        Self {
            enabled,
            max_callbacks,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_callbacks: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_toml_document() {
        let config = AppConfig::from_toml_str(
            r#"
            [cache]
            default_ttl_seconds = 120
            key_prefix = "support"
            sweep_interval_seconds = 15

            [batch]
            concurrency_limit = 8
            item_timeout_ms = 2500

            [signal]
            enabled = false
            max_callbacks = 4
            "#,
        )
        .expect("valid config");

        assert_eq!(config.cache.ttl_duration(), Duration::from_secs(120));
        assert_eq!(config.cache.key_prefix, "support");
        assert_eq!(config.cache.sweep_interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.batch.concurrency_limit, 8);
        assert_eq!(config.batch.item_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.batch.batch_timeout(), None);
        assert!(!config.signal.enabled);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_toml_str("[batch]\nconcurrency_limit = 2\n").unwrap();
        assert_eq!(config.batch.concurrency_limit, 2);
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.signal, SignalConfig::default());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = AppConfig::from_toml_str("[batch]\nconcurrency_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("concurrency_limit")));
    }

    #[test]
    fn test_glob_prefix_rejected() {
        let err = AppConfig::from_toml_str("[cache]\nkey_prefix = \"tick*\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = AppConfig::default();
        config.cache.default_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml_str("[cache\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let path = env::temp_dir().join(format!("ticketlens-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[cache]\ndefault_ttl_seconds = 5\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.cache.default_ttl_seconds, 5);
    }

    #[test]
    fn test_config_path_variable() {
        assert_eq!(configured_path(Ok("a.toml".to_string())).unwrap().as_deref(), Some("a.toml"));
        assert_eq!(configured_path(Err(env::VarError::NotPresent)).unwrap(), None);

        let err = configured_path(Err(env::VarError::NotUnicode("bad".into()))).unwrap_err();
        assert!(matches!(err, ConfigError::Env(env::VarError::NotUnicode(_))));
    }
}
