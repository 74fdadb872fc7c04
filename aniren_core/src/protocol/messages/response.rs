//! Response decoding
//!
//! Every AniDB reply is one datagram: a numeric status code, a space, and the
//! message. Routing by command is not needed here; callers know what they sent.

use crate::protocol::error::{ProtocolError, ResponseCode, Result};
use crate::protocol::messages::parse_response_header;

/// One decoded AniDB reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolResponse {
    /// Status code
    pub code: u16,
    /// Message with the trailing newline removed
    pub message: String,
}

impl ProtocolResponse {
    /// Create a response from its parts
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Decode a raw datagram
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        if datagram.is_empty() {
            return Err(ProtocolError::invalid_packet("Empty response"));
        }

        let text = String::from_utf8_lossy(datagram);
        let text = text.strip_suffix('\n').unwrap_or(&text);
        let (code, message) = parse_response_header(text)?;

        Ok(Self { code, message })
    }

    /// Status code wrapper
    pub fn response_code(&self) -> ResponseCode {
        ResponseCode(self.code)
    }

    /// Whether the pipeline may carry on after this response
    pub fn is_continuable(&self) -> bool {
        self.response_code().is_continuable()
    }

    /// Convert to a protocol error if this response is not continuable
    ///
    /// A bare status code is described with the documented status text.
    pub fn to_error(&self) -> Option<ProtocolError> {
        if self.is_continuable() {
            return None;
        }

        let message = if self.message.trim().is_empty() {
            self.response_code().description().to_string()
        } else {
            self.message.clone()
        };
        Some(ProtocolError::server_error(self.code, message))
    }
}
