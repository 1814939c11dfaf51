//! Clock and timestamp decoding for training logs
//!
//! Two shapes appear in logs:
//! - relative runtime clocks, `HH:MM:SS` (hours may exceed 24)
//! - absolute start stamps, `YYYY-MM-DD HH:MM:SS.ffffff`
//!
//! Ranges are not enforced; values are trusted as emitted by the trainer.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Format of the absolute start stamp (microsecond precision).
pub const ABSOLUTE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Parse a `HH:MM:SS` runtime clock into a duration.
///
/// # Errors
///
/// Returns [`Error::MalformedTime`] if the input does not have exactly three
/// colon-separated components, a component is not a decimal number, or the
/// total overflows.
///
/// # Examples
///
/// ```rust
/// use evaltrack::timecodec::parse_clock;
///
/// let runtime = parse_clock("01:02:03").unwrap();
/// assert_eq!(runtime.num_seconds(), 3723);
/// ```
pub fn parse_clock(s: &str) -> Result<TimeDelta> {
    let malformed = |reason: &str| Error::MalformedTime {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = s.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed("expected HH:MM:SS"));
    };

    let mut total: i64 = 0;
    for (component, scale) in [(h, 3600_i64), (m, 60), (sec, 1)] {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("component is not numeric"));
        }
        let value: i64 = component
            .parse()
            .map_err(|_| malformed("component out of range"))?;
        total = value
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| malformed("clock overflows"))?;
    }

    TimeDelta::try_seconds(total).ok_or_else(|| malformed("clock overflows"))
}

/// Parse a `YYYY-MM-DD HH:MM:SS.ffffff` stamp; the stamp is taken as UTC.
///
/// # Errors
///
/// Returns [`Error::MalformedTime`] if the input does not match
/// [`ABSOLUTE_FORMAT`].
pub fn parse_absolute(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, ABSOLUTE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::MalformedTime {
            input: s.to_string(),
            reason: e.to_string(),
        })
}

/// Fractional epoch seconds of a timestamp.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn epoch_seconds(stamp: DateTime<Utc>) -> f64 {
    stamp.timestamp() as f64 + f64::from(stamp.timestamp_subsec_micros()) / 1e6
}

/// Fractional seconds of a duration.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_seconds(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
