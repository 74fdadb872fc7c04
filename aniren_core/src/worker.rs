//! Lookup worker
//!
//! The single consumer of the work queue. For each item it asks AniDB for the
//! configured fields, renders the new name and either records it (dry run) or
//! hands it to the rename executor. While the queue is empty it keeps the
//! session alive.

use crate::config::{NetworkConfig, TemplateSet};
use crate::mask::FieldMask;
use crate::progress::{ProgressProvider, ProgressUpdate, SharedProvider};
use crate::protocol::{Dispatcher, ProtocolError};
use crate::queue::{WorkItem, WorkReceiver};
use crate::rename::{RenameExecutor, target_path};
use crate::render::render;
use crate::shutdown::Shutdown;
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Consuming items, input still open
    Running,
    /// Input finished, emptying the queue
    Draining,
    /// Input finished and the queue is empty
    Completed,
    /// Stopped on abort
    Aborted,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

/// A computed rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a worker run
#[derive(Debug)]
pub struct WorkerReport {
    pub state: WorkerState,
    /// Items looked up and renamed (or planned)
    pub processed: usize,
    /// Every computed rename, in processing order
    pub planned: Vec<PlannedRename>,
    /// The error that aborted the run, if it came from the dispatcher
    pub failure: Option<ProtocolError>,
}

/// Consumer of the work queue
pub struct LookupWorker {
    queue: WorkReceiver,
    mask: FieldMask,
    templates: TemplateSet,
    poll_interval: Duration,
    idle_indicator: Duration,
    keepalive: Duration,
    dry_run: bool,
    executor: RenameExecutor,
    shutdown: Shutdown,
    progress: SharedProvider,
    state: WorkerState,
}

impl LookupWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: WorkReceiver,
        mask: FieldMask,
        templates: TemplateSet,
        network: &NetworkConfig,
        dry_run: bool,
        executor: RenameExecutor,
        shutdown: Shutdown,
        progress: SharedProvider,
    ) -> Self {
        Self {
            queue,
            mask,
            templates,
            poll_interval: network.poll_interval(),
            idle_indicator: network.idle_indicator(),
            keepalive: network.keepalive(),
            dry_run,
            executor,
            shutdown,
            progress,
            state: WorkerState::Running,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Take the items the worker never reached
    pub fn drain_queue(&mut self) -> Vec<WorkItem> {
        self.queue.drain()
    }

    /// Consume the queue until completion or abort
    pub async fn run(&mut self, dispatcher: &mut Dispatcher) -> WorkerReport {
        let mut processed = 0;
        let mut planned = Vec::new();
        let mut failure = None;

        while !self.state.is_terminal() {
            if self.shutdown.is_aborted() {
                self.state = WorkerState::Aborted;
                break;
            }
            if self.state == WorkerState::Running && self.shutdown.input_finished() {
                debug!("Input finished, draining queue");
                self.state = WorkerState::Draining;
            }

            match self.queue.pop(self.poll_interval).await {
                Some(item) => match self.process(dispatcher, item).await {
                    Ok(plan) => {
                        processed += 1;
                        planned.push(plan);
                    }
                    Err(e) => {
                        failure = Some(e);
                        self.state = WorkerState::Aborted;
                    }
                },
                // Draining was entered before this pop, so nothing can still arrive
                None if self.state == WorkerState::Draining => {
                    self.state = WorkerState::Completed;
                }
                None if self.shutdown.input_finished() => {}
                None => {
                    if let Err(e) = self.idle(dispatcher).await {
                        failure = Some(e);
                        self.state = WorkerState::Aborted;
                    }
                }
            }
        }

        info!("Worker finished: {:?}, {processed} processed", self.state);
        WorkerReport {
            state: self.state,
            processed,
            planned,
            failure,
        }
    }

    async fn process(
        &self,
        dispatcher: &mut Dispatcher,
        item: WorkItem,
    ) -> Result<PlannedRename, ProtocolError> {
        let record = dispatcher.lookup_file(&item, &self.mask).await?;
        let template = self.templates.select(record.category());
        let new_name = render(template, &record);
        let to = target_path(&item.path, &new_name);

        if self.dry_run {
            self.progress.report(ProgressUpdate::DryRun {
                from: item.path.clone(),
                to: to.clone(),
            });
        } else {
            self.executor.submit(item.path.clone(), &new_name);
        }

        Ok(PlannedRename {
            from: item.path,
            to,
        })
    }

    async fn idle(&self, dispatcher: &mut Dispatcher) -> Result<(), ProtocolError> {
        let idle_for = dispatcher.idle_for();

        if idle_for >= self.idle_indicator {
            self.progress.report(ProgressUpdate::Idle { idle_for });
        }
        if idle_for > self.keepalive {
            debug!("Idle for {idle_for:?}, sending keep-alive");
            dispatcher.ping().await?;
        }
        Ok(())
    }
}
