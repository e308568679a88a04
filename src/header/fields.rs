// src/header/fields.rs
use crate::error::{Result, SegError};
use crate::utils::unescape_key_value;

/// Standard NRRD field names this crate interprets
pub mod names {
    pub const TYPE: &str = "type";
    pub const DIMENSION: &str = "dimension";
    pub const SPACE: &str = "space";
    pub const SPACE_DIMENSION: &str = "space dimension";
    pub const SIZES: &str = "sizes";
    pub const SPACE_DIRECTIONS: &str = "space directions";
    pub const KINDS: &str = "kinds";
    pub const ENCODING: &str = "encoding";
    pub const ENDIAN: &str = "endian";
    pub const SPACE_ORIGIN: &str = "space origin";
    pub const DATA_FILE: &str = "data file";
    pub const LINE_SKIP: &str = "line skip";
    pub const BYTE_SKIP: &str = "byte skip";
}

/// One classified line of the textual header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    Comment,
    /// `<field>: <value>`
    Field { name: String, value: String },
    /// `<key>:=<value>`
    KeyValue { key: String, value: String },
    /// The empty line separating the header from attached data
    End,
}

impl HeaderLine {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(HeaderLine::End);
        }
        if line.starts_with('#') {
            return Ok(HeaderLine::Comment);
        }

        let key_value_at = line.find(":=");
        let field_at = line.find(": ");
        match (key_value_at, field_at) {
            (Some(kv), field) if field.map_or(true, |f| kv < f) => Ok(HeaderLine::KeyValue {
                key: unescape_key_value(&line[..kv]),
                value: unescape_key_value(&line[kv + 2..]),
            }),
            (_, Some(f)) => Ok(HeaderLine::Field {
                name: line[..f].trim().to_ascii_lowercase(),
                value: line[f + 2..].trim().to_string(),
            }),
            _ => Err(SegError::MalformedHeader(format!("unrecognized header line: {line:?}"))),
        }
    }
}

/// Check the `NRRD000X` magic line and return the version string
pub fn check_magic(line: &str) -> Result<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.strip_prefix("NRRD") {
        Some(version) if version.len() == 4 && version.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(line.to_string())
        }
        _ => Err(SegError::MalformedHeader(format!("missing NRRD magic, found {line:?}"))),
    }
}

/// Parse a `(x,y,z)` vector
pub fn parse_vector(s: &str) -> Result<Vec<f64>> {
    let inner = s
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| SegError::MalformedHeader(format!("expected (x,y,z) vector, found {s:?}")))?;

    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| SegError::MalformedHeader(format!("non-numeric vector component in {s:?}")))
        })
        .collect()
}

pub fn format_vector(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|c| c.to_string()).collect();
    format!("({})", parts.join(","))
}

/// Split a `space directions` value into its per-axis entries (`none` or a vector)
pub fn parse_direction_list(s: &str) -> Result<Vec<Option<Vec<f64>>>> {
    let mut entries = Vec::new();
    let mut rest = s.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("none") {
            entries.push(None);
            rest = after.trim_start();
        } else if rest.starts_with('(') {
            let close = rest
                .find(')')
                .ok_or_else(|| SegError::MalformedHeader(format!("unterminated vector in {s:?}")))?;
            entries.push(Some(parse_vector(&rest[..=close])?));
            rest = rest[close + 1..].trim_start();
        } else {
            return Err(SegError::MalformedHeader(format!("invalid space directions: {s:?}")));
        }
    }
    Ok(entries)
}

pub fn parse_usize_list(field: &str, s: &str) -> Result<Vec<usize>> {
    s.split_whitespace()
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| SegError::MalformedHeader(format!("non-integer {field}: {s:?}")))
        })
        .collect()
}
