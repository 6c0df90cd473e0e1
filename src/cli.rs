//! Command-line interface parsing for flagcache
//!
//! This module handles parsing of CLI arguments using clap. Every
//! connection and cache setting can also come from a `FLAGCACHE_*`
//! environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::ClientConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A cache file was given while caching is off
    #[error("--cache-file requires --cache")]
    CacheFileWithoutCache,

    /// A duration argument was zero
    #[error("Invalid {0}: must be at least 1 second")]
    ZeroDuration(&'static str),
}

/// flagcache - Read feature flags from a flag service
#[derive(Parser, Debug)]
#[command(name = "flagcache")]
#[command(about = "Read feature flags, optionally through a shared file cache")]
#[command(version)]
pub struct Cli {
    /// Base URL of the flag service
    #[arg(long, env = "FLAGCACHE_SERVER", value_name = "URL")]
    pub server: String,

    /// API key sent as a bearer token
    #[arg(long, env = "FLAGCACHE_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: String,

    /// Environment whose flags are read
    #[arg(short, long, env = "FLAGCACHE_ENVIRONMENT", value_name = "NAME")]
    pub environment: String,

    /// Read flags through the shared snapshot cache
    #[arg(long, env = "FLAGCACHE_CACHE")]
    pub cache: bool,

    /// Cache file to use instead of the derived one in the temp directory
    #[arg(long, env = "FLAGCACHE_CACHE_FILE", value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Cache time-to-live in seconds
    #[arg(long, env = "FLAGCACHE_CACHE_TTL", value_name = "SECS", default_value_t = 300)]
    pub cache_ttl: u64,

    /// Network timeout in seconds
    #[arg(long, env = "FLAGCACHE_TIMEOUT", value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the binary
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the value of one or more flags
    Get {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Print whether a flag is the boolean `true`
    Enabled {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Populate the cache ahead of time
    Warm,
    /// Remove the cached snapshot and its file
    Clear,
    /// Show the effective configuration and cache state
    Info,
}

impl Cli {
    /// Builds the client configuration from parsed arguments
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` with the requested settings
    /// * `Err(CliError)` if the arguments contradict each other
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        if self.cache_file.is_some() && !self.cache {
            return Err(CliError::CacheFileWithoutCache);
        }
        if self.cache_ttl == 0 {
            return Err(CliError::ZeroDuration("cache TTL"));
        }
        if self.timeout == 0 {
            return Err(CliError::ZeroDuration("timeout"));
        }

        let mut config = ClientConfig::new(&self.server, &self.api_key, &self.environment)
            .with_cache(self.cache)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl))
            .with_timeout(Duration::from_secs(self.timeout));
        if let Some(path) = &self.cache_file {
            config = config.with_cache_file(path);
        }
        Ok(config)
    }
}
