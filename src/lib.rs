//! flagcache library
//!
//! Client for a remote feature-flag service with an optional file-backed
//! cache shared between processes. Start with [`FlagClient`] and a
//! [`ClientConfig`].

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod data;
pub mod error;

pub use client::FlagClient;
pub use config::ClientConfig;
pub use data::{FlagSnapshot, FlagValue, HttpTransport, Transport};
pub use error::FlagError;
