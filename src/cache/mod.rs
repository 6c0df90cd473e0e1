//! Cache module for sharing flag snapshots between processes
//!
//! This module provides a file-backed store holding every flag of one
//! environment. The backing file is written atomically and its modification
//! time acts as the TTL clock, so many short-lived processes pointed at the
//! same server and environment amortize to roughly one network fetch per TTL
//! window.

mod key;
mod persist;
mod store;

pub use key::{cache_key, default_cache_path};
pub use persist::{persist, PersistOutcome};
pub use store::{is_fresh, CacheStatus, CacheStore};
