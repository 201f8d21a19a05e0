//! Run-local persistence: the seen-URL dedup store and the process lock.
//!
//! Both live in the data directory. The seen store is a sorted JSON array of
//! URLs rewritten atomically (temp file, then rename) once per run; the lock
//! is an exclusive-create marker file released on drop.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use jobscout_shared::{JobscoutError, Result};

// ---------------------------------------------------------------------------
// SeenStore
// ---------------------------------------------------------------------------

/// In-memory set of already-handled posting URLs, backed by a JSON file.
///
/// Mutations stay in memory until [`SeenStore::persist`] rewrites the file.
/// A crashed run therefore leaves the on-disk set at its pre-run state and
/// the interrupted postings are retried next time.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    urls: HashSet<String>,
}

impl SeenStore {
    /// Load the store from `path`. A missing file is a first run and yields
    /// an empty set; a present-but-corrupt file is a storage error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let urls = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let list: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
                    JobscoutError::Storage(format!(
                        "corrupt seen file {}: {e}",
                        path.display()
                    ))
                })?;
                list.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no seen file yet, starting empty");
                HashSet::new()
            }
            Err(e) => return Err(JobscoutError::io(&path, e)),
        };

        debug!(path = %path.display(), count = urls.len(), "seen store loaded");
        Ok(Self { path, urls })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Record a URL as handled. Returns false if it was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Rewrite the backing file as a sorted JSON array via temp + rename.
    /// Called once at the end of a run, after all artifacts are on disk.
    pub fn persist(&self) -> Result<()> {
        let mut sorted: Vec<&String> = self.urls.iter().collect();
        sorted.sort();

        let json = serde_json::to_string_pretty(&sorted)
            .map_err(|e| JobscoutError::Storage(format!("seen serialization failed: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JobscoutError::io(parent, e))?;
        }

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|e| JobscoutError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| JobscoutError::io(&self.path, e))?;

        info!(path = %self.path.display(), count = self.urls.len(), "seen store persisted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RunLock
// ---------------------------------------------------------------------------

/// Single-instance guard: an exclusive-create marker file in the data dir.
///
/// Contention is not an error condition for the caller; a held lock means
/// another run is active and this one should exit quietly. The marker is
/// removed on drop, so a panic unwinding through the pipeline still releases.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    released: bool,
}

impl RunLock {
    /// Acquire the lock at `path`. Fails with [`JobscoutError::Locked`] when
    /// the marker already exists.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JobscoutError::io(parent, e))?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                use std::io::Write as _;
                // PID helps a human diagnose a stale marker by hand.
                let _ = writeln!(file, "{}", std::process::id());
                debug!(path = %path.display(), "run lock acquired");
                Ok(Self {
                    path,
                    released: false,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(JobscoutError::Locked { path })
            }
            Err(e) => Err(JobscoutError::io(&path, e)),
        }
    }

    /// Remove the marker. Idempotent; also invoked on drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "run lock released"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove lock file"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("js-storage-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_seen_file_loads_empty() {
        let dir = temp_dir();
        let store = SeenStore::load(dir.join("seen.json")).unwrap();
        assert!(store.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn persist_writes_sorted_array_and_reloads() {
        let dir = temp_dir();
        let path = dir.join("seen.json");

        let mut store = SeenStore::load(&path).unwrap();
        store.insert("https://b.test/2");
        store.insert("https://a.test/1");
        store.insert("https://b.test/2"); // duplicate is a no-op
        store.persist().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let list: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(list, vec!["https://a.test/1", "https://b.test/2"]);

        let reloaded = SeenStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://a.test/1"));

        // No leftover temp file after the rename
        assert!(!dir.join("seen.json.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_seen_file_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("seen.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SeenStore::load(&path).unwrap_err();
        assert!(matches!(err, JobscoutError::Storage(_)));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn second_acquire_reports_locked() {
        let dir = temp_dir();
        let path = dir.join("run.lock");

        let _held = RunLock::acquire(&path).unwrap();
        let err = RunLock::acquire(&path).unwrap_err();
        assert!(err.is_locked());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = temp_dir();
        let path = dir.join("run.lock");

        {
            let _held = RunLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());

        // Re-acquire after release works
        let _again = RunLock::acquire(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn explicit_release_is_idempotent() {
        let dir = temp_dir();
        let path = dir.join("run.lock");

        let mut lock = RunLock::acquire(&path).unwrap();
        lock.release();
        lock.release();
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
