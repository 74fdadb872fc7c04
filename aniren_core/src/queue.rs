//! Work queue and input producer
//!
//! The producer turns `ed2k://` links read from the input into `WorkItem`s and
//! pushes them onto an unbounded FIFO that the lookup worker pops from.

use crate::shutdown::Shutdown;
use log::{debug, trace};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::timeout;

static ED2K_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ed2k://\|file\|(.*)\|(\d+)\|([A-Ga-g0-9]{32})\|$").expect("valid ed2k pattern")
});

/// One file to look up and rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    pub size: u64,
    pub ed2k: String,
}

/// Parse one input line into a work item
///
/// Lines that are not ed2k file links are discarded.
pub fn parse_link(line: &str) -> Option<WorkItem> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = ED2K_LINK.captures(line)?;

    Some(WorkItem {
        path: PathBuf::from(&caps[1]),
        size: caps[2].parse().ok()?,
        ed2k: caps[3].to_string(),
    })
}

/// Producer side of the work queue
#[derive(Debug, Clone)]
pub struct WorkSender {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl WorkSender {
    /// Enqueue an item; returns false once the receiver is gone
    pub fn push(&self, item: WorkItem) -> bool {
        self.tx.send(item).is_ok()
    }
}

/// Consumer side of the work queue
#[derive(Debug)]
pub struct WorkReceiver {
    rx: mpsc::UnboundedReceiver<WorkItem>,
}

impl WorkReceiver {
    /// Wait at most `wait` for the next item
    ///
    /// Returns `None` on timeout. A closed, empty queue still waits the full
    /// interval so the caller's poll loop keeps its pace.
    pub async fn pop(&mut self, wait: Duration) -> Option<WorkItem> {
        match timeout(wait, self.rx.recv()).await {
            Ok(Some(item)) => Some(item),
            Ok(None) => {
                tokio::time::sleep(wait).await;
                None
            }
            Err(_) => None,
        }
    }

    /// Take every item still queued
    pub fn drain(&mut self) -> Vec<WorkItem> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }
}

/// Create a connected sender/receiver pair
pub fn work_queue() -> (WorkSender, WorkReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WorkSender { tx }, WorkReceiver { rx })
}

/// Read links from `reader` until end of input or abort
///
/// Sets `InputDone` when the input is exhausted and returns the number of
/// items enqueued. Lines that are not valid UTF-8 are discarded like any other
/// malformed line; only read failures are errors.
pub async fn produce<R>(mut reader: R, sender: WorkSender, shutdown: Shutdown) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut produced = 0;

    loop {
        if shutdown.is_aborted() {
            debug!("Producer stopping on abort after {produced} items");
            return Ok(produced);
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            trace!("Ignoring non UTF-8 input line {:?}", String::from_utf8_lossy(&buf));
            continue;
        };

        match parse_link(line) {
            Some(item) => {
                trace!("Queued {}", item.path.display());
                if !sender.push(item) {
                    break;
                }
                produced += 1;
            }
            None => trace!("Ignoring input line {line:?}"),
        }
    }

    shutdown.finish_input();
    debug!("End of input, {produced} items queued");
    Ok(produced)
}
