//! Date/time scalars.
//!
//! YAML plain scalars shaped like timestamps are kept apart from strings so
//! consumers can tell them apart. The source text is retained and is what
//! gets serialized, so a value survives YAML -> JSON -> YAML without any
//! change in precision or offset spelling.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// The typed interpretation of a timestamp literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampValue {
    /// `2024-01-31`
    Date(NaiveDate),
    /// `2024-01-31T10:00:00` (no offset)
    Local(NaiveDateTime),
    /// `2024-01-31T10:00:00.5+02:00` / `...Z`
    Zoned(DateTime<FixedOffset>),
}

/// A date or date-time scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    value: TimestampValue,
}

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl Timestamp {
    /// Parses a timestamp literal, returning `None` when the text is not one.
    ///
    /// Surrounding whitespace is not accepted.
    pub fn parse(text: &str) -> Option<Self> {
        if !looks_like_timestamp(text) || text.trim() != text {
            return None;
        }

        let value = if text.len() == 10 {
            TimestampValue::Date(NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?)
        } else if let Some(zoned) = parse_zoned(text) {
            TimestampValue::Zoned(zoned)
        } else {
            let local = LOCAL_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())?;
            TimestampValue::Local(local)
        };

        Some(Timestamp {
            raw: text.to_string(),
            value,
        })
    }

    /// The source text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The typed value.
    pub fn value(&self) -> TimestampValue {
        self.value
    }
}

fn looks_like_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[7] == b'-'
}

fn parse_zoned(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    // YAML also allows a space separator and a space before the offset.
    let normalized = text.replacen(' ', "T", 1).replace(' ', "");
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .or_else(|| DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%#z").ok())
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
