//! Progress reporting for the CLI
//!
//! The core reports through a channel-backed provider; a separate task
//! renders the updates to the console.

pub mod provider;
pub mod renderer;

pub use provider::{ChannelProvider, create_progress_infrastructure};
pub use renderer::{
    ConsoleRenderer, Line, RenderOptions, Stream, finish_rendering, render_progress,
};
