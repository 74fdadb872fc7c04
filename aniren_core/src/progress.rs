//! Progress reporting abstractions
//!
//! The core library reports user-facing events (requests, waits, renames,
//! the incomplete-jobs list) through this trait so it never writes to the
//! terminal itself. The CLI decides what to show and where.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Core trait for progress reporting
pub trait ProgressProvider: Send + Sync {
    /// Report a progress update
    fn report(&self, update: ProgressUpdate);

    /// Signal that the run is over
    fn complete(&self);
}

/// Unified progress update type
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// A request is about to be sent (credentials already masked)
    Request { command: String },

    /// The dispatcher is sleeping to honour the request delay
    Waiting { delay: Duration },

    /// A response was received
    Response { code: u16, message: String },

    /// The queue has been empty for a while
    Idle { idle_for: Duration },

    /// A rename was handed to the executor
    Renaming { from: PathBuf, to: PathBuf },

    /// A rename failed; the run carries on
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Dry-run result
    DryRun { from: PathBuf, to: PathBuf },

    /// Items left unprocessed when the run stopped
    Incomplete { items: Vec<PathBuf> },

    /// Generic status message
    Status { message: String },
}

/// Null implementation for when no progress is needed
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _update: ProgressUpdate) {}

    fn complete(&self) {}
}

/// Arc-wrapped provider for sharing across async tasks
#[derive(Clone)]
pub struct SharedProvider {
    inner: Arc<dyn ProgressProvider>,
}

impl SharedProvider {
    pub fn new(provider: Arc<dyn ProgressProvider>) -> Self {
        Self { inner: provider }
    }

    pub fn null() -> Self {
        Self::new(Arc::new(NullProvider))
    }
}

impl ProgressProvider for SharedProvider {
    fn report(&self, update: ProgressUpdate) {
        self.inner.report(update);
    }

    fn complete(&self) {
        self.inner.complete();
    }
}
