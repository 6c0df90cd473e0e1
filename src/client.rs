//! Flag client
//!
//! [`FlagClient`] is the per-request decision point: with caching disabled
//! every lookup is a single-flag request to the service, with caching
//! enabled lookups are answered from the shared snapshot in [`CacheStore`].
//!
//! The two modes differ for unknown flags. Uncached lookups surface
//! [`FlagError::FlagNotFound`]; cached lookups resolve them to `None`
//! because the snapshot cannot tell "never existed" from "inactive".

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheStatus, CacheStore};
use crate::config::ClientConfig;
use crate::data::{FlagValue, HttpTransport, Transport};
use crate::error::FlagError;

/// Client for reading feature flags of one environment
///
/// Lookups take `&mut self` because the cached mode swaps its snapshot in
/// place. Sharing one client across threads requires an external lock.
pub struct FlagClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: Option<CacheStore>,
}

impl FlagClient {
    /// Creates a client talking HTTP to `config.server_url`
    pub fn new(config: ClientConfig) -> Result<Self, FlagError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.server_url, &config.api_key, config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client using a caller-supplied transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, FlagError> {
        config.validate()?;
        let cache = config.cache_enabled.then(|| {
            CacheStore::new(
                transport.clone(),
                config.environment.clone(),
                config.resolved_cache_path(),
                config.cache_ttl,
            )
        });
        Ok(Self {
            config,
            transport,
            cache,
        })
    }

    /// Returns a client for another environment on the same server
    ///
    /// Everything else is copied from this client except an explicit cache
    /// file: the new client always derives its own path so two environments
    /// never share one cache file.
    pub fn with_environment(&self, environment: impl Into<String>) -> Result<Self, FlagError> {
        let mut config = self.config.clone().with_environment(environment);
        config.cache_file = None;
        Self::with_transport(config, self.transport.clone())
    }

    /// Returns the value of a flag, or `None` for the absent marker
    pub async fn get_flag(&mut self, name: &str) -> Result<Option<FlagValue>, FlagError> {
        match self.cache.as_mut() {
            Some(cache) => cache.get(name).await,
            None => {
                debug!(flag = name, environment = %self.config.environment, "uncached flag lookup");
                self.transport
                    .fetch_one(&self.config.environment, name)
                    .await
            }
        }
    }

    /// Like [`get_flag`](Self::get_flag) but substitutes `default` for an absent value
    pub async fn get_flag_or(
        &mut self,
        name: &str,
        default: FlagValue,
    ) -> Result<FlagValue, FlagError> {
        Ok(self.get_flag(name).await?.unwrap_or(default))
    }

    /// Returns true only when the flag's value is the boolean `true`
    ///
    /// Any other value, including integers and text, is `false`. Lookup
    /// errors still propagate.
    pub async fn is_enabled(&mut self, name: &str) -> Result<bool, FlagError> {
        Ok(matches!(self.get_flag(name).await?, Some(FlagValue::Bool(true))))
    }

    /// Loads the snapshot eagerly; does nothing when caching is disabled
    pub async fn warm_cache(&mut self) -> Result<(), FlagError> {
        match self.cache.as_mut() {
            Some(cache) => cache.warm().await,
            None => Ok(()),
        }
    }

    /// Discards the snapshot and its backing file; does nothing when caching is disabled
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.invalidate();
        }
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Path of the backing file, `None` when caching is disabled
    pub fn cache_file_path(&self) -> Option<&Path> {
        self.cache.as_ref().map(CacheStore::path)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl
    }

    pub fn cache_status(&self) -> Option<CacheStatus> {
        self.cache.as_ref().map(CacheStore::status)
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for FlagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagClient")
            .field("server_url", &self.config.server_url)
            .field("environment", &self.config.environment)
            .field("cache", &self.cache)
            .finish()
    }
}
