//! Progress rendering for the CLI
//!
//! Turns `ProgressUpdate` messages into console output. Diagnostics go to
//! stderr; dry-run results go to stdout so they can be piped.

use aniren_core::progress::ProgressUpdate;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use log::warn;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Output stream of a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One rendered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stdout,
            text: text.into(),
        }
    }

    fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stderr,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Suppress protocol chatter and status messages
    pub quiet: bool,
    /// Draw the idle indicator as a spinner instead of dots
    pub spinner: bool,
}

/// Render progress updates from a channel until every sender is gone
pub async fn render_progress(mut rx: mpsc::UnboundedReceiver<ProgressUpdate>, options: RenderOptions) {
    let mut renderer = ConsoleRenderer::new(options);

    while let Some(update) = rx.recv().await {
        renderer.handle_update(update);
    }

    renderer.finish();
}

/// Wait for the render task; returns false if it panicked or was cancelled
pub async fn finish_rendering(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress renderer failed: {e}");
            false
        }
    }
}

/// Console renderer state
pub struct ConsoleRenderer {
    options: RenderOptions,
    idle_spinner: Option<ProgressBar>,
    /// Idle dots were printed without a trailing newline
    dots_pending: bool,
}

impl ConsoleRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            idle_spinner: None,
            dots_pending: false,
        }
    }

    /// Format an update, or `None` when nothing should be printed
    ///
    /// Idle updates are drawn by `handle_update` and never format to a line.
    pub fn format(&self, update: &ProgressUpdate) -> Option<Line> {
        let quiet = self.options.quiet;
        match update {
            ProgressUpdate::Request { command } if !quiet => {
                Some(Line::stderr(format!("{} {}", ">".cyan(), command)))
            }
            ProgressUpdate::Waiting { delay } if !quiet => Some(Line::stderr(
                format!("Waiting {:.1}s before next request", delay.as_secs_f64())
                    .dimmed()
                    .to_string(),
            )),
            ProgressUpdate::Response { code, message } if !quiet => {
                let first = message.lines().next().unwrap_or_default();
                Some(Line::stderr(format!("{} {code} {first}", "<".cyan())))
            }
            ProgressUpdate::Renaming { from, to } if !quiet => Some(Line::stderr(format!(
                "{} {} => {}",
                "Renaming".bold(),
                from.display(),
                file_name(to)
            ))),
            ProgressUpdate::Status { message } if !quiet => Some(Line::stderr(message.clone())),
            ProgressUpdate::RenameFailed { from, to, error } => Some(Line::stderr(
                format!(
                    "! Failed to rename {} => {}: {error}",
                    from.display(),
                    file_name(to)
                )
                .red()
                .to_string(),
            )),
            ProgressUpdate::DryRun { from, to } => Some(Line::stdout(format!(
                "{} => {}",
                from.display(),
                to.display()
            ))),
            ProgressUpdate::Incomplete { items } if !items.is_empty() => {
                let mut text = "Incomplete jobs:".yellow().bold().to_string();
                for item in items {
                    text.push_str("\n  ");
                    text.push_str(&item.display().to_string());
                }
                Some(Line::stderr(text))
            }
            _ => None,
        }
    }

    /// Handle a progress update
    pub fn handle_update(&mut self, update: ProgressUpdate) {
        if let ProgressUpdate::Idle { idle_for } = update {
            if !self.options.quiet {
                self.show_idle(idle_for);
            }
            return;
        }

        if let Some(line) = self.format(&update) {
            self.clear_idle();
            match line.stream {
                Stream::Stdout => {
                    let mut out = std::io::stdout().lock();
                    let _ = writeln!(out, "{}", line.text);
                    let _ = out.flush();
                }
                Stream::Stderr => eprintln!("{}", line.text),
            }
        }
    }

    fn show_idle(&mut self, idle_for: Duration) {
        if !self.options.spinner {
            eprint!(".");
            let _ = std::io::stderr().flush();
            self.dots_pending = true;
            return;
        }

        let spinner = self.idle_spinner.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
            {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        spinner.set_message(format!(
            "Waiting for input ({}s idle)",
            idle_for.as_secs()
        ));
    }

    fn clear_idle(&mut self) {
        if let Some(spinner) = self.idle_spinner.take() {
            spinner.finish_and_clear();
        }
        if self.dots_pending {
            eprintln!();
            self.dots_pending = false;
        }
    }

    /// Clean up any remaining indicators
    pub fn finish(&mut self) {
        self.clear_idle();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn renderer(quiet: bool) -> ConsoleRenderer {
        colored::control::set_override(false);
        ConsoleRenderer::new(RenderOptions {
            quiet,
            spinner: false,
        })
    }

    fn chatter() -> Vec<ProgressUpdate> {
        vec![
            ProgressUpdate::Request {
                command: "PING nat=1".to_string(),
            },
            ProgressUpdate::Waiting {
                delay: Duration::from_millis(1500),
            },
            ProgressUpdate::Response {
                code: 300,
                message: "PONG".to_string(),
            },
            ProgressUpdate::Renaming {
                from: PathBuf::from("/m/a.mkv"),
                to: PathBuf::from("/m/b.mkv"),
            },
            ProgressUpdate::Status {
                message: "hello".to_string(),
            },
        ]
    }

    #[test]
    fn test_dry_run_goes_to_stdout() {
        let line = renderer(true)
            .format(&ProgressUpdate::DryRun {
                from: PathBuf::from("/m/a.mkv"),
                to: PathBuf::from("/m/01 - Kino.mkv"),
            })
            .unwrap();
        assert_eq!(line, Line::stdout("/m/a.mkv => /m/01 - Kino.mkv"));
    }

    #[test]
    fn test_chatter_shown_unless_quiet() {
        let loud = renderer(false);
        let quiet = renderer(true);
        for update in chatter() {
            let line = loud.format(&update).unwrap();
            assert_eq!(line.stream, Stream::Stderr);
            assert!(quiet.format(&update).is_none(), "{update:?} shown in quiet mode");
        }
    }

    #[test]
    fn test_formatting_details() {
        let r = renderer(false);
        let waiting = r
            .format(&ProgressUpdate::Waiting {
                delay: Duration::from_millis(1500),
            })
            .unwrap();
        assert!(waiting.text.contains("1.5s"));

        let response = r
            .format(&ProgressUpdate::Response {
                code: 220,
                message: "FILE\n1|mkv".to_string(),
            })
            .unwrap();
        assert!(response.text.ends_with("220 FILE"));

        let renaming = r
            .format(&ProgressUpdate::Renaming {
                from: PathBuf::from("/m/a.mkv"),
                to: PathBuf::from("/m/b.mkv"),
            })
            .unwrap();
        assert!(renaming.text.ends_with("/m/a.mkv => b.mkv"));
    }

    #[test]
    fn test_errors_and_incomplete_always_shown() {
        let r = renderer(true);
        let failed = r
            .format(&ProgressUpdate::RenameFailed {
                from: PathBuf::from("/m/a.mkv"),
                to: PathBuf::from("/m/b.mkv"),
                error: "exists".to_string(),
            })
            .unwrap();
        assert_eq!(failed.stream, Stream::Stderr);
        assert!(failed.text.contains("exists"));

        let incomplete = r
            .format(&ProgressUpdate::Incomplete {
                items: vec![PathBuf::from("/m/c.mkv"), PathBuf::from("/m/d.mkv")],
            })
            .unwrap();
        assert_eq!(incomplete.text, "Incomplete jobs:\n  /m/c.mkv\n  /m/d.mkv");

        assert!(r.format(&ProgressUpdate::Incomplete { items: vec![] }).is_none());
    }

    #[test]
    fn test_idle_never_formats() {
        let update = ProgressUpdate::Idle {
            idle_for: Duration::from_secs(4),
        };
        assert!(renderer(false).format(&update).is_none());
    }

    #[tokio::test]
    async fn test_finish_rendering_reports_failed_task() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(render_progress(rx, RenderOptions::default()));
        drop(tx);
        assert!(finish_rendering(handle).await);

        let panicked: JoinHandle<()> = tokio::spawn(async { panic!("renderer crashed") });
        assert!(!finish_rendering(panicked).await);
    }

    #[tokio::test]
    async fn test_render_progress_ends_when_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ProgressUpdate::Idle {
            idle_for: Duration::from_secs(3),
        })
        .unwrap();
        drop(tx);

        render_progress(
            rx,
            RenderOptions {
                quiet: true,
                spinner: false,
            },
        )
        .await;
    }
}
