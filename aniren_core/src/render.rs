//! Filename rendering
//!
//! Templates reference lookup fields as `%name`. Substitution is a single
//! left-to-right pass, so values containing `%` are never expanded again.

pub use crate::protocol::messages::FileRecord;

/// Characters removed from rendered names
const STRIPPED: &[char] = &[':', '*', '?', '"', '\'', '<', '>', '|', '/', '\\'];

/// Render `template` against `record` and sanitize the result
///
/// At each `%` the longest field name present in the record is substituted.
/// Placeholders naming absent fields stay as literal text.
pub fn render(template: &str, record: &FileRecord) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let longest = record
            .iter()
            .filter(|(name, _)| !name.is_empty() && after.starts_with(name))
            .max_by_key(|(name, _)| name.len());

        match longest {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len()..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    sanitize(&out)
}

/// Remove characters that are invalid or awkward in filenames
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !STRIPPED.contains(c) && !c.is_control())
        .collect()
}
