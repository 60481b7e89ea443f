//! This module contains the error type reported by the status parser
//!
//! A status dump can be wrong in two different ways: its structure may be off
//! (missing section header, truncated section...), or one of its fields may
//! hold a value which the field parsers do not understand. Callers usually do
//! not care about the difference, so both are reported as a ParseError.

use thiserror::Error;


/// Syntax error found while parsing a status dump
///
/// Most errors carry a single message. The exception is a section being cut
/// short by the end of the input, where both the failed row readout and the
/// reason why the section cannot end there are reported, in that order.
///
/// Messages may quote pieces of the input, so control characters are escaped
/// on construction and the error can always be displayed as-is.
///
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{}", .messages.join("; "))]
pub struct ParseError {
    /// Human-readable descriptions of what went wrong, in order
    messages: Vec<String>,
}
//
impl ParseError {
    /// Build an error out of a single message
    pub(crate) fn new<S: AsRef<str>>(message: S) -> Self {
        Self {
            messages: vec![sanitize(message.as_ref())],
        }
    }

    /// Build an error pointing at a specific line of the input
    pub(crate) fn at_line<S: AsRef<str>>(line_number: usize, message: S) -> Self {
        Self::new(format!("line {}: {}", line_number, message.as_ref()))
    }

    /// Append the messages of another error after ours
    pub(crate) fn combine(mut self, other: ParseError) -> Self {
        self.messages.extend(other.messages);
        self
    }

    /// Messages describing this error, in order
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}


/// Escape control characters, keeping everything else untouched
fn sanitize(message: &str) -> String {
    let mut sanitized = String::with_capacity(message.len());
    for c in message.chars() {
        if c.is_control() {
            sanitized.extend(c.escape_default());
        } else {
            sanitized.push(c);
        }
    }
    sanitized
}
