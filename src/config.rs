//! Client configuration
//!
//! Everything a [`FlagClient`](crate::client::FlagClient) needs from its
//! embedder: where the service lives, how to authenticate, which
//! environment to read and how caching behaves.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::default_cache_path;
use crate::error::FlagError;

/// Default cache time-to-live
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default per-request network timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a flag client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the flag service, without trailing slash
    pub server_url: String,
    /// API credential sent as a bearer token
    pub api_key: String,
    /// Environment whose flags are read
    pub environment: String,
    /// Whether lookups go through the shared snapshot cache
    pub cache_enabled: bool,
    /// Explicit cache file; derived from server and environment when `None`
    pub cache_file: Option<PathBuf>,
    /// How long a snapshot may be served before it is refreshed
    pub cache_ttl: Duration,
    /// Timeout applied to each request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            api_key: String::new(),
            environment: String::new(),
            cache_enabled: false,
            cache_file: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with caching disabled and default timings
    pub fn new(
        server_url: impl Into<String>,
        api_key: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self::default()
            .with_server_url(server_url)
            .with_api_key(api_key)
            .with_environment(environment)
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The explicit cache file, or the path derived from server and environment
    pub fn resolved_cache_path(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| default_cache_path(&self.server_url, &self.environment))
    }

    /// Checks the fields every client needs
    pub fn validate(&self) -> Result<(), FlagError> {
        if self.server_url.trim().is_empty() {
            return Err(FlagError::Config("server URL must not be empty".to_string()));
        }
        reqwest::Url::parse(&self.server_url).map_err(|e| {
            FlagError::Config(format!("Invalid server URL '{}': {}", self.server_url, e))
        })?;
        if self.api_key.is_empty() {
            return Err(FlagError::Config("API key must not be empty".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(FlagError::Config("environment must not be empty".to_string()));
        }
        Ok(())
    }
}
