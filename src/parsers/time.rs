//! This module contains a parser for timestamps (Connected Since, Last Ref)

use chrono::NaiveDateTime;
use super::ValueError;


/// Formats in which the daemon may print absolute dates, by order of likelihood
///
/// The first one is what ctime() produces, and what the daemon uses by default.
/// Spaces in chrono formats match any amount of whitespace, so the padding of
/// single-digit days ("Jun  4") is handled as well.
///
const TIMESTAMP_FORMATS: [&str; 2] = [
    "%a %b %d %H:%M:%S %Y",
    "%Y-%m-%d %H:%M:%S",
];


/// Parse an absolute date and time, as found in the status dump
///
/// The dump does not say in which time zone it was written (in practice, the
/// local time zone of the server), so the result stays a naive date and time.
///
pub fn parse_time(input: &str) -> Result<NaiveDateTime, ValueError> {
    TIMESTAMP_FORMATS.iter()
                     .find_map(|format| {
                         NaiveDateTime::parse_from_str(input, format).ok()
                     })
                     .ok_or_else(|| ValueError::Timestamp(input.to_owned()))
}
