//! Protocol-specific error types
//!
//! This module defines error types for the AniDB UDP protocol implementation.
//! The renamer never retries: every protocol error ends the session.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol-specific error types
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No response within the configured timeout
    #[error("No response from AniDB after {0:?}")]
    Timeout(Duration),

    /// Invalid packet format
    #[error("Invalid packet format: {message}")]
    InvalidPacket { message: String },

    /// Decoding error
    #[error("Decoding error: {message}")]
    Decoding { message: String },

    /// Packet too large
    #[error("Packet size {size} exceeds maximum {max_size}")]
    PacketTooLarge { size: usize, max_size: usize },

    /// A session command was issued before AUTH succeeded
    #[error("Not authenticated with AniDB")]
    NotAuthenticated,

    /// AniDB answered with a status outside the continuation set
    #[error("AniDB server error: {code} - {message}")]
    ServerError { code: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },
}

impl ProtocolError {
    /// Create an invalid packet error
    pub fn invalid_packet(message: impl Into<String>) -> Self {
        Self::InvalidPacket {
            message: message.into(),
        }
    }

    /// Create a decoding error
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Create a packet too large error
    pub fn packet_too_large(size: usize, max_size: usize) -> Self {
        Self::PacketTooLarge { size, max_size }
    }

    /// Create a server error
    pub fn server_error(code: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
        }
    }

    /// Create an authentication failed error
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    /// Every protocol error is terminal for the run
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Status code reported by the server, if the error came from one
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Response code returned by AniDB server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    /// Status codes that let the pipeline carry on
    pub const CONTINUABLE: [u16; 5] = [200, 201, 203, 220, 300];

    /// Check if the response code allows the caller to proceed
    pub fn is_continuable(&self) -> bool {
        Self::CONTINUABLE.contains(&self.0)
    }

    /// Get a human-readable description of the response code
    pub fn description(&self) -> &'static str {
        match self.0 {
            // Session codes
            200 => "LOGIN ACCEPTED",
            201 => "LOGIN ACCEPTED - NEW VERSION AVAILABLE",
            203 => "LOGGED OUT",

            // Data codes
            220 => "FILE",
            300 => "PONG",
            320 => "NO SUCH FILE",

            // Client errors
            403 => "NOT LOGGED IN",

            // Server errors
            500 => "LOGIN FAILED",
            501 => "LOGIN FIRST",
            502 => "ACCESS DENIED",
            503 => "CLIENT VERSION OUTDATED",
            504 => "CLIENT BANNED",
            505 => "ILLEGAL INPUT OR ACCESS DENIED",
            506 => "INVALID SESSION",
            555 => "BANNED",
            598 => "UNKNOWN COMMAND",
            600 => "INTERNAL SERVER ERROR",
            601 => "ANIDB OUT OF SERVICE",
            602 => "SERVER BUSY",
            604 => "TIMEOUT - DELAY AND RESUBMIT",

            _ => "UNKNOWN RESPONSE CODE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ProtocolError::invalid_packet("bad format");
        assert!(matches!(err, ProtocolError::InvalidPacket { .. }));
        assert!(err.to_string().contains("bad format"));
    }

    #[test]
    fn test_all_errors_fatal() {
        let errors = vec![
            ProtocolError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout")),
            ProtocolError::Timeout(Duration::from_secs(30)),
            ProtocolError::server_error(602, "SERVER BUSY"),
            ProtocolError::authentication_failed("no session key"),
            ProtocolError::NotAuthenticated,
        ];

        for err in errors {
            assert!(err.is_fatal(), "{err:?} should be fatal");
        }
    }

    #[test]
    fn test_server_code() {
        assert_eq!(
            ProtocolError::server_error(320, "NO SUCH FILE").server_code(),
            Some(320)
        );
        assert_eq!(ProtocolError::NotAuthenticated.server_code(), None);
    }

    #[test]
    fn test_continuation_set() {
        for code in [200, 201, 203, 220, 300] {
            assert!(ResponseCode(code).is_continuable(), "{code} should continue");
        }
        for code in [320, 403, 500, 501, 505, 506, 555, 598, 600, 602] {
            assert!(!ResponseCode(code).is_continuable(), "{code} should be fatal");
        }
    }

    #[test]
    fn test_response_code_description() {
        assert_eq!(ResponseCode(203).description(), "LOGGED OUT");
        assert_eq!(ResponseCode(555).description(), "BANNED");
        assert_eq!(ResponseCode(999).description(), "UNKNOWN RESPONSE CODE");
    }

    #[test]
    fn test_error_conversions() {
        let io_err = std::io::Error::other("network error");
        let proto_err: ProtocolError = io_err.into();
        assert!(matches!(proto_err, ProtocolError::Io(_)));
    }
}
