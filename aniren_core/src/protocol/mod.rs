//! AniDB UDP Protocol Implementation
//!
//! This module implements the subset of the AniDB UDP API the renamer needs:
//! - `transport`: the session channel, one UDP socket talking to one server
//! - `messages`: AUTH / FILE / PING / LOGOUT commands and response decoding
//! - `client`: the rate-limited dispatcher that owns the session

pub mod client;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export main types
pub use client::{Dispatcher, redact_credentials};
pub use error::{ProtocolError, ResponseCode, Result};
pub use messages::{Command, ProtocolResponse};
pub use transport::SessionChannel;

/// Protocol version supported by this implementation
pub const PROTOCOL_VERSION: &str = "3";

/// Maximum UDP packet size (considering PPPoE)
pub const MAX_PACKET_SIZE: usize = 1400;

/// Default AniDB server address
pub const DEFAULT_SERVER: &str = "api.anidb.net";

/// Default AniDB UDP port
pub const DEFAULT_PORT: u16 = 9000;

/// Fixed local UDP port the client binds to
pub const DEFAULT_LOCAL_PORT: u16 = 1444;

/// Minimum delay between two rate-limited requests, in seconds
pub const REQUEST_DELAY_SECS: u64 = 4;

/// Idle time after which a PING keeps the session alive, in seconds
pub const KEEPALIVE_SECS: u64 = 300;
