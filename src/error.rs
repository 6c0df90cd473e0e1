//! Error taxonomy for flag lookups
//!
//! Every failure a flag lookup can surface maps onto one [`FlagError`]
//! variant. Cache persistence problems are deliberately absent: they are
//! logged and swallowed by the cache layer.

use thiserror::Error;

/// Errors that can occur when resolving a flag
#[derive(Debug, Error)]
pub enum FlagError {
    /// The API credential was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The named flag does not exist (uncached single-flag lookups only)
    #[error("Flag '{flag}' not found in environment '{environment}'")]
    FlagNotFound { flag: String, environment: String },

    /// The environment does not exist on the server
    #[error("Environment '{0}' not found")]
    EnvironmentNotFound(String),

    /// Connection, DNS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Any other failure response, or a response body that could not be decoded
    #[error("Flag service error{}: {message}", status_suffix(.status))]
    Service {
        status: Option<u16>,
        message: String,
    },

    /// The client configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl FlagError {
    /// Returns true for errors caused by an unreachable or slow server
    pub fn is_network(&self) -> bool {
        matches!(self, FlagError::Network(_))
    }

    /// Returns true for either kind of "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FlagError::FlagNotFound { .. } | FlagError::EnvironmentNotFound(_)
        )
    }
}
