//! Line-oriented flat properties format.
//!
//! `key=value` (or `key: value`) entries, `#`/`!` comment lines, blank lines.
//! Escapes and line continuations are not interpreted; values are kept
//! byte-for-byte after the separator and leading whitespace.

use indexmap::IndexMap;

/// One classified line of a properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyLine<'a> {
    Blank,
    Comment,
    Entry {
        key: &'a str,
        value: &'a str,
        /// Byte offset of `value` within the raw line.
        value_offset: usize,
    },
    /// Non-comment text with no separator or an empty key.
    Malformed,
}

/// Classify a single raw line (without its trailing newline).
pub fn parse_line(line: &str) -> PropertyLine<'_> {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return PropertyLine::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return PropertyLine::Comment;
    }

    let Some(sep) = line.find(['=', ':']) else {
        return PropertyLine::Malformed;
    };
    let key = line[..sep].trim();
    if key.is_empty() {
        return PropertyLine::Malformed;
    }

    let after = &line[sep + 1..];
    let leading = after.len() - after.trim_start().len();
    let value_offset = sep + 1 + leading;
    let value = line[value_offset..].trim_end_matches(['\r', '\n']);
    PropertyLine::Entry {
        key,
        value,
        value_offset,
    }
}

/// Parse a whole document into its entries, in file order. Later duplicates win.
pub fn parse(text: &str) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();
    for line in text.lines() {
        if let PropertyLine::Entry { key, value, .. } = parse_line(line) {
            entries.insert(key.to_string(), value.to_string());
        }
    }
    entries
}
