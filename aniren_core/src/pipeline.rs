//! End-to-end rename pipeline
//!
//! Wires the pieces together for one run: connect, authenticate, start the
//! producer, run the worker, report what was left and close the session.

use crate::config::RenamerConfig;
use crate::error::{Error, Result};
use crate::mask::FieldMask;
use crate::progress::{ProgressProvider, ProgressUpdate, SharedProvider};
use crate::protocol::Dispatcher;
use crate::queue::{produce, work_queue};
use crate::rename::RenameExecutor;
use crate::shutdown::Shutdown;
use crate::worker::{LookupWorker, WorkerState};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio::time::timeout;

pub use crate::worker::PlannedRename;

/// How long a completed run waits for renames still in flight
const RENAME_GRACE: Duration = Duration::from_secs(10);

/// How long an aborted run waits for the producer to report why it stopped
const PRODUCER_GRACE: Duration = Duration::from_millis(100);

/// Per-run options
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Compute and report names without renaming anything
    pub dry_run: bool,
}

/// Outcome of a run
#[derive(Debug)]
pub struct RunSummary {
    pub state: WorkerState,
    pub processed: usize,
    pub planned: Vec<PlannedRename>,
    /// Items still queued when the run stopped
    pub incomplete: Vec<PathBuf>,
    /// The error that aborted the run: a protocol failure or a broken input
    pub failure: Option<Error>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.state == WorkerState::Completed
    }
}

/// One configured rename run
pub struct RenamePipeline {
    config: RenamerConfig,
    options: PipelineOptions,
    mask: FieldMask,
    progress: SharedProvider,
    shutdown: Shutdown,
}

impl RenamePipeline {
    pub fn new(
        config: RenamerConfig,
        options: PipelineOptions,
        progress: SharedProvider,
        shutdown: Shutdown,
    ) -> Self {
        let mask = FieldMask::from_templates(&config.templates);
        debug!(
            "Field masks fmask={} amask={} fields={:?}",
            mask.fmask(),
            mask.amask(),
            mask.fields()
        );

        Self {
            config,
            options,
            mask,
            progress,
            shutdown,
        }
    }

    pub fn mask(&self) -> &FieldMask {
        &self.mask
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run until the input is exhausted or the run aborts
    ///
    /// Returns `Err` only when the session could not be established; failures
    /// after that are described by the summary.
    pub async fn run<R>(&self, reader: R) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let mut dispatcher = match Dispatcher::connect(
            &self.config.network,
            self.shutdown.clone(),
            self.progress.clone(),
        )
        .await
        {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                self.progress.complete();
                return Err(Error::Protocol(e));
            }
        };

        if let Err(e) = dispatcher.authenticate(&self.config.credentials).await {
            dispatcher.close().await;
            self.progress.complete();
            return Err(Error::Protocol(e));
        }

        self.progress.report(ProgressUpdate::Status {
            message: format!("Logged in, requesting {}", self.mask.fields().join(", ")),
        });

        let (sender, receiver) = work_queue();
        let shutdown = self.shutdown.clone();
        let mut producer = tokio::spawn(async move {
            let result = produce(reader, sender, shutdown.clone()).await;
            match &result {
                Ok(count) => debug!("Producer finished, {count} items"),
                Err(e) => {
                    warn!("Reading input failed: {e}");
                    shutdown.abort();
                }
            }
            result
        });

        let executor = RenameExecutor::new(self.progress.clone());
        let mut worker = LookupWorker::new(
            receiver,
            self.mask.clone(),
            self.config.templates.clone(),
            &self.config.network,
            self.options.dry_run,
            executor.clone(),
            self.shutdown.clone(),
            self.progress.clone(),
        );
        let report = worker.run(&mut dispatcher).await;

        let incomplete: Vec<PathBuf> = worker
            .drain_queue()
            .into_iter()
            .map(|item| item.path)
            .collect();
        if !incomplete.is_empty() {
            warn!("{} items were not processed", incomplete.len());
            self.progress.report(ProgressUpdate::Incomplete {
                items: incomplete.clone(),
            });
        }

        dispatcher.close().await;

        let mut failure = report.failure.map(Error::Protocol);
        if report.state == WorkerState::Completed {
            if let Err(e) = producer.await {
                warn!("Producer task failed: {e}");
            }
            executor.wait_idle(RENAME_GRACE).await;
        } else {
            match timeout(PRODUCER_GRACE, &mut producer).await {
                Ok(Ok(Err(e))) if failure.is_none() => failure = Some(Error::Io(e)),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Producer task failed: {e}"),
                // a pending read on the input must not keep the run alive
                Err(_) => producer.abort(),
            }
        }

        info!(
            "Run finished: {:?}, {} processed, {} incomplete",
            report.state,
            report.processed,
            incomplete.len()
        );
        self.progress.complete();

        Ok(RunSummary {
            state: report.state,
            processed: report.processed,
            planned: report.planned,
            incomplete,
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, NetworkConfig, TemplateSet};

    #[test]
    fn test_mask_computed_from_templates() {
        let config = RenamerConfig::new(
            Credentials::new("me", "secret").unwrap(),
            TemplateSet::new("%epno").with_category("Movie", "%romanji_name"),
            NetworkConfig::default(),
        )
        .unwrap();

        let pipeline = RenamePipeline::new(
            config,
            PipelineOptions::default(),
            SharedProvider::null(),
            Shutdown::new(),
        );
        assert_eq!(
            pipeline.mask().fields(),
            &["fid", "anime_type", "romanji_name", "epno"]
        );
        assert!(!pipeline.shutdown().is_aborted());
    }

    #[test]
    fn test_summary_success() {
        let summary = RunSummary {
            state: WorkerState::Completed,
            processed: 0,
            planned: Vec::new(),
            incomplete: Vec::new(),
            failure: None,
        };
        assert!(summary.is_success());
    }
}
