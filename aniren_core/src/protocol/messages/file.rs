//! File-related messages
//!
//! This module contains the FILE command and the positional decoding of its
//! response into a `FileRecord`.

use crate::mask::FieldMask;
use crate::protocol::messages::{AniDBCommand, parse_response_fields};
use std::collections::BTreeMap;

/// Field that selects the per-category template
pub const CATEGORY_FIELD: &str = "anime_type";

/// FILE command for querying file information by size and ED2K hash
#[derive(Debug, Clone)]
pub struct FileCommand {
    /// File size in bytes
    pub size: u64,
    /// ED2K hash
    pub ed2k: String,
    /// File field mask (hex)
    pub fmask: Option<String>,
    /// Anime field mask (hex)
    pub amask: Option<String>,
    /// Session tag
    pub session: Option<String>,
}

impl FileCommand {
    /// Create a FILE command by size and ED2K hash
    pub fn by_hash(size: u64, ed2k: impl Into<String>) -> Self {
        Self {
            size,
            ed2k: ed2k.into(),
            fmask: None,
            amask: None,
            session: None,
        }
    }

    /// Add file field mask
    pub fn with_fmask(mut self, fmask: &str) -> Self {
        self.fmask = Some(fmask.to_string());
        self
    }

    /// Add anime field mask
    pub fn with_amask(mut self, amask: &str) -> Self {
        self.amask = Some(amask.to_string());
        self
    }

    /// Request exactly the fields of `mask`
    pub fn with_masks(self, mask: &FieldMask) -> Self {
        self.with_fmask(mask.fmask()).with_amask(mask.amask())
    }

    /// Attach the session tag
    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }
}

impl AniDBCommand for FileCommand {
    fn name(&self) -> &str {
        "FILE"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("size", self.size.to_string()), ("ed2k", self.ed2k.clone())];

        if let Some(fmask) = &self.fmask {
            params.push(("fmask", fmask.clone()));
        }
        if let Some(amask) = &self.amask {
            params.push(("amask", amask.clone()));
        }
        if let Some(session) = &self.session {
            params.push(("s", session.clone()));
        }

        params
    }
}

/// Decoded FILE response: field name to value
///
/// AniDB returns values positionally, so decoding needs the exact field order
/// the request masks were built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    fields: BTreeMap<String, String>,
}

impl FileRecord {
    /// Decode a FILE response message against `field_order`
    ///
    /// The message is `FILE` followed by a newline and the pipe-separated
    /// values, the first of which is always the file id. Surplus values or
    /// surplus names are dropped.
    pub fn decode(message: &str, field_order: &[&str]) -> Self {
        let payload = message
            .strip_prefix("FILE")
            .map(|rest| rest.trim_start_matches(['\n', ' ']))
            .unwrap_or(message);

        let fields = field_order
            .iter()
            .zip(parse_response_fields(payload))
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Self { fields }
    }

    /// Build a record from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a decoded field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The category discriminator (`anime_type`), if it was returned
    pub fn category(&self) -> Option<&str> {
        self.get(CATEGORY_FIELD)
    }

    /// The AniDB file id
    pub fn fid(&self) -> Option<&str> {
        self.get("fid")
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of decoded fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing was decoded
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_command_encode() {
        let cmd = FileCommand::by_hash(12345, "0123456789ABCDEF0123456789ABCDEF")
            .with_fmask("0000000800")
            .with_amask("10008000")
            .with_session("abc12");

        assert_eq!(cmd.name(), "FILE");
        assert!(!cmd.skips_rate_limit());
        assert_eq!(
            cmd.encode(),
            "FILE size=12345&ed2k=0123456789ABCDEF0123456789ABCDEF&fmask=0000000800&amask=10008000&s=abc12"
        );
    }

    #[test]
    fn test_file_command_without_masks() {
        let cmd = FileCommand::by_hash(1, "abc");
        assert_eq!(cmd.encode(), "FILE size=1&ed2k=abc");
    }

    #[test]
    fn test_decode_positional() {
        let record = FileRecord::decode(
            "FILE\n312498|ABCD1234|TV|01",
            &["fid", "crc32", "anime_type", "epno"],
        );

        assert_eq!(record.fid(), Some("312498"));
        assert_eq!(record.get("crc32"), Some("ABCD1234"));
        assert_eq!(record.category(), Some("TV"));
        assert_eq!(record.get("epno"), Some("01"));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_decode_unescapes_values() {
        let record = FileRecord::decode("FILE\n1|Kino`s Journey", &["fid", "english_name"]);
        assert_eq!(record.get("english_name"), Some("Kino's Journey"));
    }

    #[test]
    fn test_decode_short_response() {
        let record = FileRecord::decode("FILE\n1|TV", &["fid", "anime_type", "epno"]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("epno"), None);
    }

    #[test]
    fn test_decode_without_header_line() {
        let record = FileRecord::decode("7|Movie", &["fid", "anime_type"]);
        assert_eq!(record.fid(), Some("7"));
        assert_eq!(record.category(), Some("Movie"));
    }

    #[test]
    fn test_from_pairs() {
        let record = FileRecord::from_pairs([("epno", "01"), ("crc32", "ABCD1234")]);
        assert_eq!(record.get("epno"), Some("01"));
        assert_eq!(record.category(), None);
        assert!(!record.is_empty());
    }
}
