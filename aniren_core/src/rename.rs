//! Rename executor
//!
//! Renames run on blocking tasks and are never awaited by the worker. A failed
//! rename is reported and logged; it never stops the run.

use crate::error::Error;
use crate::progress::{ProgressProvider, ProgressUpdate, SharedProvider};
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Interval at which `wait_idle` re-checks the in-flight counter
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Target path for renaming `from` to `new_name` in the same directory
pub fn target_path(from: &Path, new_name: &str) -> PathBuf {
    match from.parent() {
        Some(dir) => dir.join(new_name),
        None => PathBuf::from(new_name),
    }
}

/// Rename `from` to `to`, refusing to replace a different existing file
pub fn rename_file(from: &Path, to: &Path) -> Result<(), Error> {
    if from == to {
        return Ok(());
    }
    if to.exists() {
        return Err(Error::rename(
            from,
            to,
            io::Error::new(io::ErrorKind::AlreadyExists, "target already exists"),
        ));
    }

    std::fs::rename(from, to).map_err(|e| Error::rename(from, to, e))
}

/// Fire-and-forget rename submission
#[derive(Clone)]
pub struct RenameExecutor {
    in_flight: Arc<AtomicUsize>,
    progress: SharedProvider,
}

impl RenameExecutor {
    pub fn new(progress: SharedProvider) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            progress,
        }
    }

    /// Rename `from` to `new_name` inside its current directory
    pub fn submit(&self, from: PathBuf, new_name: &str) {
        let to = target_path(&from, new_name);
        self.progress.report(ProgressUpdate::Renaming {
            from: from.clone(),
            to: to.clone(),
        });

        let in_flight = Arc::clone(&self.in_flight);
        let progress = self.progress.clone();
        in_flight.fetch_add(1, Ordering::AcqRel);

        tokio::task::spawn_blocking(move || {
            match rename_file(&from, &to) {
                Ok(()) => debug!("Renamed {} -> {}", from.display(), to.display()),
                Err(e) => {
                    warn!("{e}");
                    let error = match &e {
                        Error::Rename { source, .. } => source.to_string(),
                        other => other.to_string(),
                    };
                    progress.report(ProgressUpdate::RenameFailed { from, to, error });
                }
            }
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Renames submitted but not finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Wait up to `limit` for in-flight renames; returns true if none remain
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while self.in_flight() > 0 {
            if Instant::now() >= deadline {
                warn!("{} renames still running after {limit:?}", self.in_flight());
                return false;
            }
            sleep(IDLE_CHECK_INTERVAL).await;
        }
        true
    }
}
