//! Deferred deletion of served artifacts.
//!
//! A downloaded PDF or ZIP stays on disk for a grace period (30 s by default)
//! and is then removed by a background tokio task. Each path is scheduled at
//! most once while its deletion is pending, so repeated downloads of the same
//! artifact do not stack timers.
//!
//! Deletion is best-effort: failures are logged, never returned, and nothing
//! runs if the process exits before the delay elapses.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Schedules and tracks deferred artifact deletions.
#[derive(Debug, Clone)]
pub struct ArtifactJanitor {
    delay: Duration,
    pending: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ArtifactJanitor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Delete `path` once the configured delay has elapsed.
    ///
    /// Returns `false` without scheduling anything when a deletion for the
    /// same path is already pending. Must be called from within a tokio
    /// runtime.
    pub fn schedule(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if !self.lock().insert(path.clone()) {
            debug!("Cleanup already scheduled for {}", path.display());
            return false;
        }

        debug!(
            "Scheduling cleanup of {} in {:?}",
            path.display(),
            self.delay
        );
        let janitor = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(janitor.delay).await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Temporary file removed: {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Temporary file already gone: {}", path.display())
                }
                Err(e) => warn!("Could not remove temporary file {}: {}", path.display(), e),
            }
            janitor.lock().remove(&path);
        });
        true
    }

    /// Delete `path` immediately; returns whether a file was removed.
    pub fn remove_now(&self, path: &Path) -> bool {
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Temporary file removed: {}", path.display());
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Could not remove temporary file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Number of deletions scheduled but not yet run.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // The set stays consistent even if a holder panicked.
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ArtifactJanitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
