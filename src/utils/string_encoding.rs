// src/utils/string_encoding.rs
use crate::error::{Result, SegError};

/// Undo NRRD key/value escaping (`\n` and `\\`)
pub fn unescape_key_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

pub fn escape_key_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

pub fn decode_header_line(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| SegError::MalformedHeader("header line is not valid UTF-8".to_string()))
}
