//! Mock implementations for testing

mod progress;
mod server;

pub use progress::RecordingProvider;
pub use server::{MockAniDBServer, MockServerBuilder, ReceivedRequest};
