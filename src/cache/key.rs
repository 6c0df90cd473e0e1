//! Default cache file location
//!
//! Clients pointed at the same server and environment derive the same
//! file name, which is what lets independent processes share one cache.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// File name prefix for derived cache files
const FILE_PREFIX: &str = "flagcache_";

/// Number of digest bytes kept in the file name
const KEY_BYTES: usize = 16;

/// Returns the cache key for a (server, environment) pair
pub fn cache_key(server_url: &str, environment: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(server_url.as_bytes());
    hasher.update(b"|");
    hasher.update(environment.as_bytes());
    hex::encode(&hasher.finalize()[..KEY_BYTES])
}

/// Returns `<system temp dir>/flagcache_<key>.json`
pub fn default_cache_path(server_url: &str, environment: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}{}.json",
        FILE_PREFIX,
        cache_key(server_url, environment)
    ))
}
