//! Progress provider implementation for the CLI
//!
//! Bridges the core library's progress reporting with the console renderer.

use aniren_core::progress::{ProgressProvider, ProgressUpdate};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Channel-based progress provider
///
/// The channel is unbounded: dry-run results travel through it and must never
/// be dropped.
pub struct ChannelProvider {
    tx: Mutex<Option<mpsc::UnboundedSender<ProgressUpdate>>>,
}

impl ChannelProvider {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl ProgressProvider for ChannelProvider {
    fn report(&self, update: ProgressUpdate) {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(update);
        }
    }

    fn complete(&self) {
        // Drop our sender so the renderer can exit its loop
        let mut guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

/// Create a progress provider and the receiver its renderer consumes
pub fn create_progress_infrastructure() -> (
    Arc<dyn ProgressProvider>,
    mpsc::UnboundedReceiver<ProgressUpdate>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let provider = Arc::new(ChannelProvider::new(tx)) as Arc<dyn ProgressProvider>;
    (provider, rx)
}
