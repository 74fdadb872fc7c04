//! Progress provider that records every update

use aniren_core::{ProgressProvider, ProgressUpdate};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct RecordingProvider {
    updates: Mutex<Vec<ProgressUpdate>>,
    completed: Mutex<bool>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// `(from, to)` pairs of every dry-run report
    pub fn dry_runs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                ProgressUpdate::DryRun { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Items of the incomplete-jobs report, if one was made
    pub fn incomplete(&self) -> Option<Vec<PathBuf>> {
        self.updates().into_iter().find_map(|u| match u {
            ProgressUpdate::Incomplete { items } => Some(items),
            _ => None,
        })
    }

    /// Every redacted request text
    pub fn requests(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                ProgressUpdate::Request { command } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        *self.completed.lock().unwrap()
    }
}

impl ProgressProvider for RecordingProvider {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    fn complete(&self) {
        *self.completed.lock().unwrap() = true;
    }
}
