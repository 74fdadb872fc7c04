//! Test utilities for aniren
//!
//! This crate provides a scripted AniDB UDP server, a progress recorder and
//! builders for ed2k input and media fixtures.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{MediaFixture, ed2k_link, fake_hash, file_reply};
pub use mocks::{MockAniDBServer, MockServerBuilder, ReceivedRequest, RecordingProvider};
