//! `HH:MM:SS.mmm` timestamps.
//!
//! Formatting truncates to whole milliseconds and clamps negatives to zero.
//! The hour field is not wrapped at 24.

use thiserror::Error;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Relative distance, in ulps, within which a scaled value is treated as an
/// exact millisecond (`1.001 * 1000.0 == 1000.9999…`).
const REPRESENTATION_ULPS: f64 = 8.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid timestamp {0:?}")]
pub struct InvalidTimestamp(pub String);

/// Whole milliseconds in `seconds`, truncated. Negative and NaN inputs map to zero.
#[must_use]
pub fn to_millis(seconds: f64) -> u64 {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    let scaled = seconds * 1000.0;
    let nearest = scaled.round();
    if (scaled - nearest).abs() <= scaled * REPRESENTATION_ULPS * f64::EPSILON {
        nearest as u64
    } else {
        scaled.floor() as u64
    }
}

#[must_use]
pub fn from_millis(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

/// Formats seconds as `HH:MM:SS.mmm`.
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let total = to_millis(seconds);
    let hours = total / MS_PER_HOUR;
    let minutes = (total % MS_PER_HOUR) / MS_PER_MINUTE;
    let secs = (total % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = total % MS_PER_SECOND;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Parses `HH:MM:SS.mmm`, `MM:SS.mmm` or `SS.mmm` into seconds.
pub fn parse_timestamp(text: &str) -> Result<f64, InvalidTimestamp> {
    let invalid = || InvalidTimestamp(text.to_string());

    let (clock, millis) = text.trim().rsplit_once('.').ok_or_else(invalid)?;
    if millis.len() != 3 {
        return Err(invalid());
    }
    let millis = parse_digits(millis).ok_or_else(invalid)?;

    let fields: Vec<&str> = clock.split(':').collect();
    if fields.is_empty() || fields.len() > 3 {
        return Err(invalid());
    }

    let mut total = millis;
    let scales = [MS_PER_SECOND, MS_PER_MINUTE, MS_PER_HOUR];
    for (field, scale) in fields.iter().rev().zip(scales) {
        let value = parse_digits(field).ok_or_else(invalid)?;
        total = value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(total))
            .ok_or_else(invalid)?;
    }

    Ok(from_millis(total))
}

fn parse_digits(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
