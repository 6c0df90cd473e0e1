//! Atomic persistence of flag snapshots
//!
//! The backing file is shared by every process using the same cache path
//! and is never modified in place. A new snapshot is written to a private
//! temp file in the same directory and renamed over the backing file, so a
//! concurrent reader sees either the old or the new content in full.
//!
//! Persistence is best effort. Failures are logged and reported through
//! [`PersistOutcome`]; they never reach a flag lookup.

use filetime::FileTime;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::data::FlagSnapshot;

/// Process-local sequence so two writers in one process never share a temp name
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened to the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// New content was renamed into place
    Replaced,
    /// Content was identical; only the modification time was refreshed
    Touched,
    /// Nothing changed on disk
    Failed,
}

/// Writes `snapshot` to `path` using the write-temp-then-rename protocol
pub fn persist(path: &Path, snapshot: &FlagSnapshot) -> PersistOutcome {
    let bytes = match snapshot.to_json_vec() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to serialize flag snapshot");
            return PersistOutcome::Failed;
        }
    };

    persist_via(path, &temp_path(path), &bytes, touch_now)
}

/// Writes `bytes` through `temp` onto `path`
///
/// `touch` refreshes the mtime of an unchanged backing file. If it fails
/// the temp file is renamed over the backing file instead, which also
/// resets the mtime.
fn persist_via(
    path: &Path,
    temp: &Path,
    bytes: &[u8],
    touch: fn(&Path) -> io::Result<()>,
) -> PersistOutcome {
    if let Err(e) = write_temp(temp, bytes) {
        warn!(path = %temp.display(), error = %e, "failed to write temporary cache file");
        let _ = fs::remove_file(temp);
        return PersistOutcome::Failed;
    }

    if digest_of_file(path).is_some_and(|existing| existing == digest(bytes)) {
        match touch(path) {
            Ok(()) => {
                let _ = fs::remove_file(temp);
                debug!(path = %path.display(), "cache content unchanged, refreshed mtime");
                return PersistOutcome::Touched;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to refresh cache file mtime, replacing it");
            }
        }
    }

    match fs::rename(temp, path) {
        Ok(()) => {
            debug!(path = %path.display(), bytes = bytes.len(), "cache file replaced");
            PersistOutcome::Replaced
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to move cache file into place");
            let _ = fs::remove_file(temp);
            PersistOutcome::Failed
        }
    }
}

fn touch_now(path: &Path) -> io::Result<()> {
    filetime::set_file_mtime(path, FileTime::now())
}

/// Returns `<dir>/.<file name>.<pid>.<seq>.tmp` next to `path`
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flagcache".to_string());
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

fn write_temp(temp: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = temp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

fn digest_of_file(path: &Path) -> Option<[u8; 32]> {
    fs::read(path).ok().map(|bytes| digest(&bytes))
}
