//! aniren Core Library
//!
//! This is the core library for the aniren batch renamer, providing the AniDB
//! UDP protocol client, field-mask encoding, the lookup work queue and worker,
//! filename rendering and the rename executor.

pub mod config;
pub mod error;
pub mod mask;
pub mod pipeline;
pub mod progress;
pub mod protocol;
pub mod queue;
pub mod rename;
pub mod render;
pub mod security;
pub mod shutdown;
pub mod worker;

// Re-export main types
pub use config::{Credentials, NetworkConfig, RenamerConfig, TemplateSet};
pub use error::{Error, Result};
pub use mask::FieldMask;
pub use pipeline::{PipelineOptions, PlannedRename, RenamePipeline, RunSummary};
pub use progress::{NullProvider, ProgressProvider, ProgressUpdate, SharedProvider};
pub use protocol::{Dispatcher, ProtocolError, ProtocolResponse};
pub use queue::{WorkItem, WorkReceiver, WorkSender, parse_link, work_queue};
pub use rename::RenameExecutor;
pub use render::{FileRecord, render};
pub use shutdown::{Shutdown, Signal};
pub use worker::{LookupWorker, WorkerReport, WorkerState};
