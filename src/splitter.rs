//! A mechanism for walking through the lines of a status dump
//!
//! Status dumps are line-oriented: every line is either a section header, a
//! data row, or some metadata which we are not interested in. Blank lines carry
//! no information, and stray whitespace around lines should not matter.
//!
//! The tricky part is that sections are not terminated by any explicit marker.
//! The parser only knows that a section is over once it has read a line which
//! does not look like one of its rows, and that line must then be handed over
//! to whoever parses the next section. So on top of plain line iteration, we
//! provide the ability to put back exactly one line.

use crate::error::ParseError;
use std::str::Lines;


/// Forward-only cursor over the non-blank lines of a status dump
///
/// Lines come out trimmed, along with blank lines being skipped. After a line
/// has been returned, unread() may be called once to get it back on the next
/// call to next(). Multi-line pushback is not supported.
///
pub(crate) struct LineCursor<'a> {
    /// Iterator over the raw lines of the input
    raw_lines: Lines<'a>,

    /// Number of raw lines consumed so far, blank ones included
    raw_line_count: usize,

    /// Small state machine tracking our input location (start of the input,
    /// after a line, with a line put back, at the end of the input)
    status: CursorStatus<'a>,
}
//
impl<'a> LineCursor<'a> {
    /// Create a cursor over some textual input
    pub fn new(input: &'a str) -> Self {
        Self {
            raw_lines: input.lines(),
            raw_line_count: 0,
            status: CursorStatus::AtInputStart,
        }
    }

    /// Put the last returned line back, so that next() returns it again
    ///
    /// This fails if there is no such line, that is if nothing has been read
    /// yet or if the input is exhausted, or if a line was already put back.
    ///
    pub fn unread(&mut self) -> Result<(), ParseError> {
        match self.status {
            CursorStatus::AfterLine(line) => {
                self.status = CursorStatus::LinePending(line);
                Ok(())
            },

            CursorStatus::LinePending(line) => Err(ParseError::at_line(
                line.number,
                "cannot roll back more than one line"
            )),

            CursorStatus::AtInputStart =>
                Err(ParseError::new("cannot roll back before the first line")),

            CursorStatus::AtInputEnd =>
                Err(ParseError::new("cannot roll back past the end of input")),
        }
    }

    /// Tell which input line was returned last (1-based), if any
    ///
    /// Blank lines are accounted for, so that the number matches what a
    /// text editor would display.
    ///
    pub fn line_number(&self) -> Option<usize> {
        match self.status {
            CursorStatus::AfterLine(line)
                | CursorStatus::LinePending(line) => Some(line.number),
            CursorStatus::AtInputStart | CursorStatus::AtInputEnd => None,
        }
    }

    /// Tell whether the input was exhausted by a previous call to next()
    pub fn at_input_end(&self) -> bool {
        self.status == CursorStatus::AtInputEnd
    }

    /// Return the line which was returned last, if it is also the last
    /// non-blank line of the input
    pub fn final_line(&self) -> Option<&'a str> {
        match self.status {
            CursorStatus::AfterLine(line) => {
                let rest_is_blank = self.raw_lines.clone()
                                                  .all(|raw| raw.trim().is_empty());
                if rest_is_blank { Some(line.text) } else { None }
            },
            _ => None,
        }
    }
}
//
impl<'a> Iterator for LineCursor<'a> {
    /// We're outputting trimmed lines
    type Item = &'a str;

    /// Return the pending line if there is one, otherwise the next non-blank
    /// line of the input
    fn next(&mut self) -> Option<Self::Item> {
        match self.status {
            // A line was put back, hand it out again
            CursorStatus::LinePending(line) => {
                self.status = CursorStatus::AfterLine(line);
                return Some(line.text);
            },

            // Once exhausted, the cursor stays exhausted
            CursorStatus::AtInputEnd => return None,

            CursorStatus::AtInputStart | CursorStatus::AfterLine(_) => {},
        }

        // Skip blank lines until something interesting comes up
        for raw_line in &mut self.raw_lines {
            self.raw_line_count += 1;
            let text = raw_line.trim();
            if !text.is_empty() {
                self.status = CursorStatus::AfterLine(
                    NumberedLine { number: self.raw_line_count, text }
                );
                return Some(text);
            }
        }

        // No more lines
        self.status = CursorStatus::AtInputEnd;
        None
    }
}
///
/// State machine used by LineCursor to keep track of rollbacks
#[derive(Clone, Copy, Debug, PartialEq)]
enum CursorStatus<'a> {
    /// Nothing was read yet
    AtInputStart,

    /// A line was returned, and may be put back
    AfterLine(NumberedLine<'a>),

    /// A line was put back, and will be returned by the next call to next()
    LinePending(NumberedLine<'a>),

    /// The input is exhausted
    AtInputEnd,
}
///
/// Trimmed line of input, along with its position
#[derive(Clone, Copy, Debug, PartialEq)]
struct NumberedLine<'a> {
    /// 1-based line number
    number: usize,

    /// Contents of the line, without surrounding whitespace
    text: &'a str,
}
