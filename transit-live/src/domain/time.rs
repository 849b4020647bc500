//! Timestamp handling for the timetable wire format.
//!
//! Timetable procedures exchange times as `yyyyMMdd HH:mm:ss` strings in
//! the agency's local time. The strings carry no zone, so they are kept as
//! `NaiveDateTime` throughout the crate.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// `strftime` pattern for the wire format.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// Error returned when parsing an invalid timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parse a timestamp in `yyyyMMdd HH:mm:ss` format.
///
/// # Examples
///
/// ```
/// use transit_live::domain::parse_timestamp;
///
/// let t = parse_timestamp("20170105 14:30:00").unwrap();
/// assert_eq!(t.to_string(), "2017-01-05 14:30:00");
///
/// assert!(parse_timestamp("2017-01-05 14:30:00").is_err());
/// assert!(parse_timestamp("20170105 25:00:00").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeError> {
    let bytes = s.as_bytes();

    // Exactly 17 characters: yyyyMMdd HH:mm:ss
    if bytes.len() != 17 {
        return Err(TimeError::new(s, "expected yyyyMMdd HH:mm:ss"));
    }
    if bytes[8] != b' ' || bytes[11] != b':' || bytes[14] != b':' {
        return Err(TimeError::new(s, "misplaced separator"));
    }

    let year = parse_digits(&bytes[0..4]).ok_or_else(|| TimeError::new(s, "invalid year"))?;
    let month = parse_digits(&bytes[4..6]).ok_or_else(|| TimeError::new(s, "invalid month"))?;
    let day = parse_digits(&bytes[6..8]).ok_or_else(|| TimeError::new(s, "invalid day"))?;
    let hour = parse_digits(&bytes[9..11]).ok_or_else(|| TimeError::new(s, "invalid hour"))?;
    let minute =
        parse_digits(&bytes[12..14]).ok_or_else(|| TimeError::new(s, "invalid minute"))?;
    let second =
        parse_digits(&bytes[15..17]).ok_or_else(|| TimeError::new(s, "invalid second"))?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| TimeError::new(s, "date out of range"))?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| TimeError::new(s, "time out of range"))?;

    Ok(date.and_time(time))
}

/// Format a timestamp in `yyyyMMdd HH:mm:ss` format.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a run of ASCII digits into a u32.
fn parse_digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        let d = (b as char).to_digit(10)?;
        Some(acc * 10 + d)
    })
}
