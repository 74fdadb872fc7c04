//! Field-mask encoding for FILE requests
//!
//! AniDB selects the fields of a FILE reply with two bit masks, `fmask` for
//! file fields and `amask` for anime fields. Bit *i* (counted from the most
//! significant bit) is set when position *i* of the reference vector is
//! requested, and the reply lists values in that same bit order after `fid`.

use crate::config::TemplateSet;
use crate::protocol::ProtocolError;
use crate::protocol::messages::file::CATEGORY_FIELD;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// File fields by fmask bit position; empty names are unused bits
pub static FILE_FIELDS: [&str; 40] = [
    "",
    "aid",
    "eid",
    "gid",
    "lid",
    "list_other_episodes",
    "",
    "state",
    "size",
    "ed2k",
    "md5",
    "sha1",
    "crc32",
    "",
    "",
    "",
    "quality",
    "src",
    "audio",
    "audio_bitrate_list",
    "video",
    "video_bitrate",
    "res",
    "file_type",
    "dub",
    "sub",
    "length",
    "description",
    "aired_date",
    "",
    "",
    "anidb_file_name",
    "mylist_state",
    "mylist_filestate",
    "mylist_viewed",
    "mylist_viewdate",
    "mylist_storage",
    "mylist_source",
    "mylist_other",
    "",
];

/// Anime fields by amask bit position; empty names are unused bits
pub static ANIME_FIELDS: [&str; 32] = [
    "anime_total_episodes",
    "highest_episode_number",
    "year",
    "anime_type",
    "related_aid_list",
    "related_aid_type",
    "category_list",
    "",
    "romanji_name",
    "kanji_name",
    "english_name",
    "other_name",
    "short_name_list",
    "synonym_list",
    "",
    "",
    "epno",
    "ep_name",
    "ep_romanji_name",
    "ep_kanji_name",
    "episode_rating",
    "episode_vote_count",
    "",
    "",
    "group_name",
    "group_short_name",
    "",
    "",
    "",
    "",
    "",
    "date_aid_record_updated",
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([0-9A-Za-z_]+)").expect("valid placeholder pattern"));

/// Placeholder names used in a template, in order of appearance
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The two request masks plus the order in which the reply lists fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMask {
    fmask: String,
    amask: String,
    fields: Vec<&'static str>,
}

impl FieldMask {
    /// Masks covering every placeholder of every template, plus `anime_type`
    pub fn from_templates(templates: &TemplateSet) -> Self {
        let mut requested: BTreeSet<&str> = templates.iter().flat_map(placeholders).collect();
        requested.insert(CATEGORY_FIELD);
        Self::from_fields(&requested)
    }

    /// Masks for an explicit set of field names; unknown names are ignored
    pub fn from_fields<S: AsRef<str>>(requested: &BTreeSet<S>) -> Self {
        let wanted = |name: &str| !name.is_empty() && requested.iter().any(|r| r.as_ref() == name);

        let fbits: Vec<bool> = FILE_FIELDS.iter().map(|name| wanted(name)).collect();
        let abits: Vec<bool> = ANIME_FIELDS.iter().map(|name| wanted(name)).collect();

        Self {
            fmask: to_hex(&fbits),
            amask: to_hex(&abits),
            fields: decode_order(&fbits, &abits),
        }
    }

    /// Rebuild a mask from its two hex strings
    pub fn from_hex(fmask: &str, amask: &str) -> Result<Self, ProtocolError> {
        let fbits = from_hex(fmask, FILE_FIELDS.len())?;
        let abits = from_hex(amask, ANIME_FIELDS.len())?;

        Ok(Self {
            fmask: fmask.to_ascii_uppercase(),
            amask: amask.to_ascii_uppercase(),
            fields: decode_order(&fbits, &abits),
        })
    }

    /// Field names in reply order, `fid` first
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn fmask(&self) -> &str {
        &self.fmask
    }

    pub fn amask(&self) -> &str {
        &self.amask
    }
}

fn decode_order(fbits: &[bool], abits: &[bool]) -> Vec<&'static str> {
    let file = FILE_FIELDS.iter().zip(fbits).filter(|(name, bit)| **bit && !name.is_empty());
    let anime = ANIME_FIELDS.iter().zip(abits).filter(|(name, bit)| **bit && !name.is_empty());

    std::iter::once("fid")
        .chain(file.chain(anime).map(|(name, _)| *name))
        .collect()
}

/// Upper-case hex, most significant bit first, padded to whole nibbles
fn to_hex(bits: &[bool]) -> String {
    bits.chunks(4)
        .map(|nibble| {
            let value = nibble
                .iter()
                .chain(std::iter::repeat(&false))
                .take(4)
                .fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit));
            char::from_digit(value, 16)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect()
}

fn from_hex(hex: &str, width: usize) -> Result<Vec<bool>, ProtocolError> {
    let digits = width.div_ceil(4);
    if hex.len() != digits {
        return Err(ProtocolError::decoding(format!(
            "mask {hex:?} must have {digits} hex digits"
        )));
    }

    let mut bits = Vec::with_capacity(digits * 4);
    for ch in hex.chars() {
        let value = ch
            .to_digit(16)
            .ok_or_else(|| ProtocolError::decoding(format!("invalid hex digit {ch:?} in mask")))?;
        bits.extend((0..4).rev().map(|shift| value >> shift & 1 == 1));
    }
    bits.truncate(width);
    Ok(bits)
}
