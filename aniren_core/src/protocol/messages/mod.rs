//! Type-safe message definitions for the AniDB protocol
//!
//! This module provides strongly-typed representations of the commands the
//! renamer sends and the responses it decodes.

pub mod auth;
pub mod command;
pub mod file;
pub mod response;

pub use auth::{AuthCommand, LogoutCommand, PingCommand, is_session_token};
pub use command::Command;
pub use file::{FileCommand, FileRecord};
pub use response::ProtocolResponse;

use crate::protocol::error::{ProtocolError, Result};
use std::fmt;

/// Parameter separator used in AniDB protocol
pub const PARAM_SEPARATOR: char = '|';

/// Newline encoding for multiline values
pub const ENCODED_NEWLINE: &str = "<br />";

/// Quote encoding
pub const ENCODED_QUOTE: &str = "`";

/// Base trait for all AniDB commands
pub trait AniDBCommand: fmt::Debug + Send + Sync {
    /// Get the command name
    fn name(&self) -> &str;

    /// Get command parameters in wire order
    fn parameters(&self) -> Vec<(&'static str, String)>;

    /// Encode the command for transmission
    fn encode(&self) -> String {
        let params = self
            .parameters()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", encode_value(&value)))
            .collect::<Vec<_>>();

        // Space between command and first param, then & between params
        if params.is_empty() {
            self.name().to_string()
        } else {
            format!("{} {}", self.name(), params.join("&"))
        }
    }

    /// Whether the command is exempt from the inter-request delay
    fn skips_rate_limit(&self) -> bool {
        false
    }
}

/// Encode a value for AniDB protocol transmission
///
/// AniDB expects html form encoding for `&` and `<br />` for newlines; every
/// other character is sent as-is (UTF-8 at packet level).
pub fn encode_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 10);

    for ch in value.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '\n' => result.push_str(ENCODED_NEWLINE),
            '\r' => continue,
            _ => result.push(ch),
        }
    }

    result
}

/// Decode a value from AniDB protocol format
///
/// Reverses `encode_value` and maps the backtick AniDB uses for quotes back
/// to an apostrophe.
pub fn decode_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(ch) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("&amp;") {
            result.push('&');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(ENCODED_NEWLINE) {
            result.push('\n');
            rest = tail;
        } else {
            result.push(if ch == '`' { '\'' } else { ch });
            rest = &rest[ch.len_utf8()..];
        }
    }

    result
}

/// Parse a raw response line into code and message
///
/// AniDB responses look like `{code} {message}`; for AUTH the message starts
/// with the session key.
pub fn parse_response_header(line: &str) -> Result<(u16, String)> {
    let mut parts = line.splitn(2, ' ');
    let raw_code = parts.next().unwrap_or_default();

    let code = raw_code.parse::<u16>().map_err(|_| {
        ProtocolError::invalid_packet(format!("Invalid response code: {raw_code:?}"))
    })?;

    let message = parts.next().unwrap_or_default().to_string();

    Ok((code, message))
}

/// Parse response fields from a data line
pub fn parse_response_fields(line: &str) -> Vec<String> {
    line.split(PARAM_SEPARATOR).map(decode_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value("simple"), "simple");
        assert_eq!(encode_value("with&ampersand"), "with&amp;ampersand");
        assert_eq!(
            encode_value("line1\nline2"),
            format!("line1{ENCODED_NEWLINE}line2")
        );
        assert_eq!(encode_value("user@example.com"), "user@example.com");
        assert_eq!(encode_value("P@ssw0rd!#2024"), "P@ssw0rd!#2024");
        assert_eq!(encode_value("crlf\r\n"), format!("crlf{ENCODED_NEWLINE}"));
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value("simple"), "simple");
        assert_eq!(
            decode_value(format!("line1{ENCODED_NEWLINE}line2").as_str()),
            "line1\nline2"
        );
        assert_eq!(
            decode_value(format!("quote{ENCODED_QUOTE}here").as_str()),
            "quote'here"
        );
        assert_eq!(decode_value("&amp;"), "&");
        assert_eq!(decode_value("test&amp;user"), "test&user");
        assert_eq!(decode_value("/path/to/file"), "/path/to/file");
        assert_eq!(decode_value("Kōkaku Kidōtai"), "Kōkaku Kidōtai");
    }

    #[test]
    fn test_parse_response_header() {
        let (code, msg) = parse_response_header("200 LOGIN ACCEPTED").unwrap();
        assert_eq!(code, 200);
        assert_eq!(msg, "LOGIN ACCEPTED");

        let (code, msg) = parse_response_header("500").unwrap();
        assert_eq!(code, 500);
        assert_eq!(msg, "");

        assert!(parse_response_header("").is_err());
        assert!(parse_response_header("ABC INVALID").is_err());
    }

    #[test]
    fn test_parse_response_fields() {
        let fields = parse_response_fields("field1|field2|field3");
        assert_eq!(fields, vec!["field1", "field2", "field3"]);

        let fields = parse_response_fields("");
        assert_eq!(fields, vec![""]);

        let fields = parse_response_fields("it`s|a&amp;b");
        assert_eq!(fields, vec!["it's", "a&b"]);
    }
}
