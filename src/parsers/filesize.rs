//! This module contains a parser for byte counts (Bytes Received, Bytes Sent)

use bytesize::ByteSize;
use regex::Regex;
use super::ValueError;


lazy_static! {
    /// Decimal integer, possibly with its digits grouped by three using one of
    /// the usual locale-specific separators (space, no-break space, underscore,
    /// dot or apostrophe). Commas cannot appear, as they separate fields.
    static ref BYTE_COUNT: Regex =
        Regex::new(r"^[0-9]+(?:[ \u{a0}_.'][0-9]{3})*$")
              .expect("The byte count regex should be valid");
}


/// Parse a byte count, as found in the status dump
pub fn parse_filesize(input: &str) -> Result<ByteSize, ValueError> {
    let invalid = || ValueError::ByteCount(input.to_owned());

    // Check the overall shape of the number first...
    if !BYTE_COUNT.is_match(input) {
        return Err(invalid());
    }

    // ...then get rid of the separators, and make sure the result fits
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>()
          .map(ByteSize::b)
          .map_err(|_| invalid())
}
