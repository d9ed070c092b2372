use chrono::{DateTime, NaiveDateTime};

use crate::{Error, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalize a stored timestamp to the naive representation used for all
/// boundary comparisons.
///
/// Accepts RFC3339 (offset-aware values are reduced to their UTC reading)
/// or a naive `YYYY-MM-DD HH:MM:SS[.fff]` form. Anything else is a
/// `Timezone` error — mixed aware/naive values must never be compared by
/// silent coercion.
pub fn parse_ts(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Ok(aware.naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive);
        }
    }
    Err(Error::Timezone(format!(
        "timestamp '{raw}' is neither RFC3339 nor naive"
    )))
}

/// Canonical text form for persisting a naive timestamp.
pub fn format_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
