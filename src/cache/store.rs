//! File-backed flag snapshot cache
//!
//! A `CacheStore` keeps one snapshot of every flag in an environment. The
//! snapshot is loaded lazily, shared with other processes through a backing
//! file whose modification time is the freshness marker, and replaced
//! wholesale once it is older than the TTL.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, instrument, warn};

use super::persist::persist;
use crate::data::{FlagSnapshot, FlagValue, Transport};
use crate::error::FlagError;

/// Returns true while data of the given age may still be served
///
/// Data exactly `ttl` old is already expired, so a zero TTL never serves
/// cached data.
pub fn is_fresh(age: Duration, ttl: Duration) -> bool {
    age < ttl
}

/// Age of a file from its modification time
///
/// An mtime in the future (clock skew between hosts sharing the file) counts
/// as age zero.
fn file_age(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

/// The in-memory snapshot and when this process adopted it
#[derive(Debug)]
struct Resident {
    snapshot: FlagSnapshot,
    loaded_at: Instant,
}

/// Point-in-time description of a cache, for diagnostics
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub path: PathBuf,
    pub ttl: Duration,
    /// Number of flags in the in-memory snapshot, if one is resident
    pub resident_flags: Option<usize>,
    /// Modification time of the backing file, if it exists
    pub file_modified: Option<DateTime<Utc>>,
    /// Whether the backing file would currently be served without a fetch
    pub file_fresh: bool,
}

/// Snapshot cache for one (server, environment) pair
pub struct CacheStore {
    transport: Arc<dyn Transport>,
    environment: String,
    path: PathBuf,
    ttl: Duration,
    resident: Option<Resident>,
}

impl CacheStore {
    pub fn new(
        transport: Arc<dyn Transport>,
        environment: impl Into<String>,
        path: PathBuf,
        ttl: Duration,
    ) -> Self {
        Self {
            transport,
            environment: environment.into(),
            path,
            ttl,
            resident: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the in-memory snapshot without loading anything
    pub fn snapshot(&self) -> Option<&FlagSnapshot> {
        self.resident.as_ref().map(|r| &r.snapshot)
    }

    /// Returns a flag from the current snapshot, loading one first if needed
    ///
    /// A flag missing from the snapshot resolves to `None`, never to an
    /// error. Errors only come from a refresh that had to go to the network.
    pub async fn get(&mut self, name: &str) -> Result<Option<FlagValue>, FlagError> {
        if self.needs_load() {
            self.load().await?;
        }
        Ok(self
            .resident
            .as_ref()
            .and_then(|r| r.snapshot.get(name))
            .cloned())
    }

    /// Runs the load algorithm regardless of what is resident
    pub async fn warm(&mut self) -> Result<(), FlagError> {
        self.load().await
    }

    /// Drops the in-memory snapshot and deletes the backing file
    ///
    /// Deletion failures are ignored: a leftover file is either expired or
    /// overwritten by the next load.
    pub fn invalidate(&mut self) {
        self.resident = None;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "cache file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "could not remove cache file"),
        }
    }

    pub fn status(&self) -> CacheStatus {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        CacheStatus {
            path: self.path.clone(),
            ttl: self.ttl,
            resident_flags: self.snapshot().map(FlagSnapshot::len),
            file_modified: modified.map(DateTime::<Utc>::from),
            file_fresh: modified.is_some_and(|m| is_fresh(file_age(m), self.ttl)),
        }
    }

    /// True when nothing is resident or this process loaded it a TTL ago
    fn needs_load(&self) -> bool {
        match &self.resident {
            None => true,
            Some(r) => !is_fresh(r.loaded_at.elapsed(), self.ttl),
        }
    }

    #[instrument(skip(self), fields(environment = %self.environment, path = %self.path.display()))]
    async fn load(&mut self) -> Result<(), FlagError> {
        if let Some(snapshot) = self.read_fresh_file() {
            debug!(flags = snapshot.len(), "serving flags from cache file");
            self.adopt(snapshot);
            return Ok(());
        }

        let snapshot = self.transport.fetch_all(&self.environment).await?;
        info!(flags = snapshot.len(), "fetched flags from service");
        persist(&self.path, &snapshot);
        self.adopt(snapshot);
        Ok(())
    }

    /// Returns the backing file's snapshot if it exists, is within TTL and parses
    fn read_fresh_file(&self) -> Option<FlagSnapshot> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        let age = file_age(modified);
        if !is_fresh(age, self.ttl) {
            debug!(age_secs = age.as_secs(), "cache file expired");
            return None;
        }

        // Another process may have replaced or removed the file since the stat
        if !self.path.exists() {
            return None;
        }
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "cache file unreadable");
                return None;
            }
        };
        let snapshot = FlagSnapshot::from_json_slice(&bytes);
        if snapshot.is_none() {
            warn!("cache file is not a flag object, ignoring");
        }
        snapshot
    }

    fn adopt(&mut self, snapshot: FlagSnapshot) {
        self.resident = Some(Resident {
            snapshot,
            loaded_at: Instant::now(),
        });
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("environment", &self.environment)
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .field("resident_flags", &self.snapshot().map(FlagSnapshot::len))
            .finish()
    }
}
