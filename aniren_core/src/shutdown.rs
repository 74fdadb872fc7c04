//! Shutdown coordination between the producer, the worker and the CLI
//!
//! Two one-shot signals: `InputDone` (the producer reached end of input) and
//! `Abort` (stop as soon as possible). Both are plain atomics polled by the
//! tasks; neither is ever cleared.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot flag
#[derive(Debug, Default)]
pub struct Signal {
    set: AtomicBool,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag; returns true if this call made the transition
    pub fn set(&self) -> bool {
        !self.set.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct Signals {
    input_done: Signal,
    abort: Signal,
}

/// Shared handle to the run's shutdown signals
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<Signals>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the end of input
    pub fn finish_input(&self) -> bool {
        self.inner.input_done.set()
    }

    pub fn input_finished(&self) -> bool {
        self.inner.input_done.is_set()
    }

    /// Request that every task stops
    pub fn abort(&self) -> bool {
        self.inner.abort.set()
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.abort.is_set()
    }
}
