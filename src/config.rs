//! Client configuration.
//!
//! Loaded from YAML files and `GITLAB__*` environment variables, or built in
//! code with the `with_*` setters.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GitlabError, Result};

/// Default GitLab API root.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "gitlab.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "GITLAB_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "GITLAB";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "GITLAB_LOG";
/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// GitLab client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Personal/project access token sent as `Private-Token`.
    pub token: String,
    /// API root, e.g. `https://gitlab.example.com/api/v4`.
    pub base_url: String,
    /// Maximum concurrent lookups in batch operations.
    /// `None` uses the host's available parallelism.
    pub concurrency: Option<usize>,
    /// Per-request timeout in milliseconds. Must be positive.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Create a config with the given token and defaults for everything else.
    pub fn new(token: impl Into<String>) -> Self {
        Self::default().with_token(token)
    }

    /// Load configuration from file and environment.
    ///
    /// Sources, later overriding earlier:
    /// 1. `gitlab.yaml` in the current directory (if present)
    /// 2. File given by `path` (if provided)
    /// 3. File named by `GITLAB_CONFIG` (if set)
    /// 4. `GITLAB__*` environment variables, e.g. `GITLAB__TOKEN`
    pub fn load(path: Option<&str>) -> Result<Self> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        use ::config::{Config, File, FileFormat};

        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Set the access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the batch concurrency limit. 0 is treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Set the per-request timeout, rounded down to whole milliseconds.
    /// Anything shorter than a millisecond is stored as 0 and rejected by
    /// [`ClientConfig::validate`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check the settings a client cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(GitlabError::Config("access token not configured".to_string()));
        }
        if self.base_url.is_empty() {
            return Err(GitlabError::Config("base url not configured".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(GitlabError::Config("timeout must be at least 1ms".to_string()));
        }
        Ok(())
    }

    /// Concurrency limit actually used for batches, always at least 1.
    pub fn effective_concurrency(&self) -> usize {
        match self.concurrency {
            Some(limit) => limit.max(1),
            None => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.token, "");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.concurrency.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("secret")
            .with_base_url("http://gitlab.test.com/api/v4")
            .with_concurrency(3)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.token, "secret");
        assert_eq!(config.base_url, "http://gitlab.test.com/api/v4");
        assert_eq!(config.effective_concurrency(), 3);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_concurrency_becomes_serial() {
        let config = ClientConfig::default().with_concurrency(0);
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_default_concurrency_is_at_least_one() {
        assert!(ClientConfig::default().effective_concurrency() >= 1);
    }

    #[test]
    fn test_from_yaml() {
        let config = ClientConfig::from_yaml(
            "token: abc\nbase_url: http://gitlab.local/api/v4\nconcurrency: 8\n",
        )
        .unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.base_url, "http://gitlab.local/api/v4");
        assert_eq!(config.concurrency, Some(8));
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_from_yaml_rejects_bad_types() {
        let result = ClientConfig::from_yaml("concurrency: lots\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let config = ClientConfig::new("token").with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_millis(500));

        let config = ClientConfig::new("token").with_timeout(Duration::from_millis(1500));
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::new("token").with_timeout(Duration::from_micros(300));
        assert_eq!(config.timeout_ms, 0);
        assert!(matches!(config.validate(), Err(GitlabError::Config(_))));

        let config = ClientConfig::from_yaml("token: abc\ntimeout_ms: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(GitlabError::Config(_))));
    }

    #[test]
    fn test_from_yaml_timeout_in_millis() {
        let config = ClientConfig::from_yaml("token: abc\ntimeout_ms: 250\n").unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }
}
