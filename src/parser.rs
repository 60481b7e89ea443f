//! This module contains the parser for status dumps
//!
//! A status dump is a line-oriented, comma-separated text file. It contains a
//! number of sections, two of which we are interested in: the list of
//! connected clients (CLIENT_LIST) and the routing table (ROUTING_TABLE). Each
//! of them starts with a header line listing its column labels...
//!
//! `HEADER,CLIENT_LIST,Common Name,Real Address,...`
//!
//! ...followed by data rows, which carry the section label as a leading tag
//! and then one field per column:
//!
//! `CLIENT_LIST,alice,10.10.10.10:49502,...`
//!
//! Sections do not have an end marker. A section is over as soon as a line
//! comes up which does not have the shape of one of its rows, and that line is
//! then put back so that it can be examined as a potential header.

use crate::error::ParseError;
use crate::models::{Client, Routing, Status};
use crate::schema::{ColumnPlan, Record};
use crate::splitter::LineCursor;
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, trace};


/// Separator between the fields of a line
const LIST_SEPARATOR: char = ',';

/// Leading tag of section headers
const HEADER_TAG: &str = "HEADER";

/// Marker which the daemon writes at the end of the dump
const TERMINATOR: &str = "END";

/// A header must declare at least this many labels after HEADER and the
/// section label
const MIN_DATA_LABELS: usize = 2;


/// Options of the status parser
///
/// The default configuration is lenient: it does not require the dump to end
/// with the END marker, since tools which rewrite or truncate status dumps
/// tend to drop it. The routing table may then be the last thing in the dump.
///
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ParserConfig {
    /// Whether the dump must be terminated by an END line
    require_terminator: bool,
}
//
impl ParserConfig {
    /// Lenient default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Require (or not) the END marker after the routing table
    ///
    /// When required, anything between the routing table and the marker is
    /// skipped, but nothing may come after the marker.
    ///
    pub fn require_terminator(mut self, required: bool) -> Self {
        self.require_terminator = required;
        self
    }

    /// Tell whether the END marker is required
    pub fn requires_terminator(&self) -> bool {
        self.require_terminator
    }
}


/// Parser for the status dump of an OpenVPN server
///
/// This parser walks through its input exactly once, so each instance can
/// only parse a single dump: parse() consumes it.
///
pub struct LogParser<'a> {
    /// Cursor into the lines of the dump
    lines: LineCursor<'a>,

    /// Parser options
    config: ParserConfig,
}
//
impl<'a> LogParser<'a> {
    /// Create a parser for some dump contents, with the default configuration
    pub fn new(content: &'a str) -> Self {
        Self::with_config(content, ParserConfig::default())
    }

    /// Create a parser for some dump contents, with a custom configuration
    pub fn with_config(content: &'a str, config: ParserConfig) -> Self {
        Self {
            lines: LineCursor::new(content),
            config,
        }
    }

    /// Parse the dump
    ///
    /// Any structural problem, or any field which cannot be parsed, aborts the
    /// whole operation: no partial status is ever returned.
    ///
    pub fn parse(mut self) -> Result<Status, ParseError> {
        // Sections always come in this order
        let client_list = self.parse_section::<Client>()?;
        let routing_table = self.parse_section::<Routing>()?;

        // Check the end of the dump, if asked to
        if self.config.require_terminator {
            self.expect_terminator()?;
        }

        Ok(Status::new(client_list, routing_table))
    }

    /// Parse one section into a table of records, keyed by record key
    fn parse_section<R: Record>(&mut self)
        -> Result<IndexMap<String, R>, ParseError>
    {
        // Locate the section and figure out its columns
        let schema = R::schema();
        let labels = self.expect_header(schema.section)?;
        let plan = schema.plan(&labels);
        debug!(section = schema.section,
               width = plan.width(),
               mapped = plan.mapped_columns(),
               "found section header");

        // Decode rows until the section is over
        let mut records = IndexMap::new();
        while let Some(record) = self.parse_record(&plan)? {
            let key = record.key().to_owned();
            if records.insert(key, record).is_some() {
                debug!(section = schema.section,
                       "duplicate entry, keeping the last one");
            }
        }
        debug!(section = schema.section, records = records.len(),
               "end of section");
        Ok(records)
    }

    /// Parse the next row of a section, or return None if the section is over
    fn parse_record<R: Record>(&mut self, plan: &ColumnPlan<R>)
        -> Result<Option<R>, ParseError>
    {
        // Anything which is not a row of this section ends the section, and
        // is put back for whoever comes next. The input may also end right
        // after a row, which ends the section as well.
        let fields = match self.expect_list(plan.width()) {
            Ok(fields) => fields,
            Err(_) if self.lines.at_input_end() => return Ok(None),
            Err(list_error) => {
                // A row of this section which was cut short by the end of the
                // input means that the dump itself was truncated
                let section = R::schema().section;
                if let Some(line) = self.lines.final_line() {
                    if line.split(LIST_SEPARATOR).next() == Some(section) {
                        return Err(list_error.combine(ParseError::new(
                            format!("input ends in the middle of '{}'", section)
                        )));
                    }
                }
                return match self.lines.unread() {
                    Ok(()) => Ok(None),
                    Err(rollback_error) =>
                        Err(list_error.combine(rollback_error)),
                };
            },
        };

        // Fill a record using the row's fields
        trace!(?fields, "decoding row");
        plan.decode(&fields)
            .map(Some)
            .map_err(|(label, error)| self.error_here(
                format!("expected valid format for '{}': {}", label, error)
            ))
    }

    /// Skip lines until the header of a certain section, and return its labels
    ///
    /// The labels start with the section label itself, which lines up with the
    /// leading tag of the section's rows.
    ///
    fn expect_header(&mut self, section: &str)
        -> Result<Vec<&'a str>, ParseError>
    {
        while let Some(line) = self.lines.next() {
            // Headers start with HEADER, then the section label...
            let mut fields = line.split(LIST_SEPARATOR);
            if fields.next() != Some(HEADER_TAG) {
                continue;
            }
            let labels = fields.collect_vec();
            if labels.first() != Some(&section) {
                continue;
            }

            // ...and then the labels of the data columns
            if labels.len() < 1 + MIN_DATA_LABELS {
                return Err(self.error_here(
                    format!("expected list of labels but got '{}'", line)
                ));
            }
            return Ok(labels);
        }
        Err(ParseError::new(
            format!("expected '{}' header but got end of input", section)
        ))
    }

    /// Read a line which should be a data row with a certain number of fields
    fn expect_list(&mut self, width: usize)
        -> Result<Vec<&'a str>, ParseError>
    {
        let line = self.lines.next().ok_or_else(|| {
            ParseError::new("expected list but got end of input")
        })?;
        let fields = line.split(LIST_SEPARATOR).collect_vec();

        // Headers are never rows, whatever their number of fields
        if fields[0] == HEADER_TAG {
            return Err(self.error_here(
                format!("expected list but got header '{}'", line)
            ));
        }

        if fields.len() != width {
            return Err(self.error_here(
                format!("expected list of {} fields but got '{}'", width, line)
            ));
        }
        Ok(fields)
    }

    /// Skip lines until the END marker, and check that nothing follows it
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        loop {
            match self.lines.next() {
                Some(TERMINATOR) => break,
                Some(line) => trace!(line, "skipping trailing line"),
                None => return Err(ParseError::new(format!(
                    "expected '{}' but got end of input", TERMINATOR
                ))),
            }
        }
        match self.lines.next() {
            None => Ok(()),
            Some(line) => Err(self.error_here(format!(
                "expected end of input after '{}' but got '{}'",
                TERMINATOR, line
            ))),
        }
    }

    /// Build an error about the line which was read last
    fn error_here(&self, message: String) -> ParseError {
        match self.lines.line_number() {
            Some(line_number) => ParseError::at_line(line_number, message),
            None => ParseError::new(message),
        }
    }
}


/// Unit tests
#[cfg(test)]
mod tests {
    use bytesize::ByteSize;
    use chrono::{NaiveDate, NaiveDateTime};
    use crate::parsers::PeerAddress;
    use std::net::{IpAddr, Ipv4Addr};
    use super::{LogParser, ParserConfig};

    /// Status dump of a server with two clients, as written by OpenVPN 2.4
    pub(crate) const SAMPLE_STATUS: &str = "\
TITLE,OpenVPN 2.4.4 x86_64-pc-linux-gnu [SSL (OpenSSL)] [LZO] [LZ4] [EPOLL]
TIME,Thu Jun 18 08:12:15 2015,1434615135
HEADER,CLIENT_LIST,Common Name,Real Address,Virtual Address,Virtual IPv6 Address,Bytes Received,Bytes Sent,Connected Since,Connected Since (time_t),Username,Client ID,Peer ID
CLIENT_LIST,foo@example.com,10.10.10.10:49502,192.168.255.118,,334948,1973012,Thu Jun 18 04:23:03 2015,1434601383,UNDEF,0,0
CLIENT_LIST,bar@example.com,10.10.10.10:64169,192.168.255.134,,1817262,28358690,Thu Jun 18 04:08:39 2015,1434600519,UNDEF,1,1
HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address,Last Ref,Last Ref (time_t)
ROUTING_TABLE,192.168.255.118,foo@example.com,10.10.10.10:49502,Thu Jun 18 08:12:09 2015,1434615129
ROUTING_TABLE,192.168.255.134,bar@example.com,10.10.10.10:64169,Thu Jun 18 08:11:55 2015,1434615115
GLOBAL_STATS,Max bcast/mcast queue length,0
END
";

    /// Minimal dump with a single client called alice
    const ALICE_STATUS: &str = "\
HEADER,CLIENT_LIST,Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
CLIENT_LIST,alice,10.10.10.10:49502,334948,1973012,Thu Jun 18 04:23:03 2015
HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address,Last Ref
ROUTING_TABLE,192.168.255.118,alice,10.10.10.10:49502,Thu Jun 18 08:12:09 2015
END
";

    /// Build a date on June 18th, 2015, which is when our sample dumps are from
    fn june_18th(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 6, 18)
                  .and_then(|date| date.and_hms_opt(hour, min, sec))
                  .expect("Sample dates should be valid")
    }

    /// Build an IPv4 peer address
    fn peer(a: u8, b: u8, c: u8, d: u8, port: u16) -> PeerAddress {
        PeerAddress {
            host: IpAddr::V4(Ipv4Addr::new(a, b, c, d)),
            port: Some(port),
        }
    }

    /// Check that a minimal dump is parsed correctly
    #[test]
    fn parse_minimal_status() {
        let status = LogParser::new(ALICE_STATUS).parse()
                                                 .expect("Should parse");

        // One client...
        assert_eq!(status.clients().len(), 1);
        let alice = status.client("alice").expect("alice should be there");
        assert_eq!(alice.common_name, "alice");
        assert_eq!(alice.real_address, Some(peer(10, 10, 10, 10, 49502)));
        assert_eq!(alice.bytes_received, ByteSize::b(334_948));
        assert_eq!(alice.bytes_sent, ByteSize::b(1_973_012));
        assert_eq!(alice.connected_since, Some(june_18th(4, 23, 3)));
        assert_eq!(alice.client_id, None);

        // ...and one route
        assert_eq!(status.routes().len(), 1);
        let route = status.route("alice").expect("alice should be routed");
        assert_eq!(route.virtual_address,
                   Some(IpAddr::V4(Ipv4Addr::new(192, 168, 255, 118))));
        assert_eq!(route.common_name, "alice");
        assert_eq!(route.real_address, Some(peer(10, 10, 10, 10, 49502)));
        assert_eq!(route.last_ref, Some(june_18th(8, 12, 9)));
    }

    /// Check that the routing table may be the last thing in the dump
    #[test]
    fn parse_unterminated_status() {
        let unterminated = ALICE_STATUS.replace("END\n", "");
        let status = LogParser::new(&unterminated).parse()
                                                  .expect("Should parse");
        assert_eq!(status, LogParser::new(ALICE_STATUS).parse()
                                                       .expect("Should parse"));
        assert_eq!(status.clients().keys().collect::<Vec<_>>(), ["alice"]);
        assert_eq!(status.routes().keys().collect::<Vec<_>>(), ["alice"]);

        // Same with an empty routing table, or without a trailing newline
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Sent
CLIENT_LIST,alice,1
HEADER,ROUTING_TABLE,Common Name,Virtual Address").parse()
                                                 .expect("Should parse");
        assert_eq!(status.clients().len(), 1);
        assert!(status.routes().is_empty());
    }

    /// Check that a full dump from a real server is parsed correctly
    #[test]
    fn parse_full_status() {
        let status = LogParser::new(SAMPLE_STATUS).parse()
                                                  .expect("Should parse");

        // Clients come out in file order, with their client IDs
        let names: Vec<_> = status.clients().keys().cloned().collect();
        assert_eq!(names, vec!["foo@example.com", "bar@example.com"]);
        let bar = &status.clients()["bar@example.com"];
        assert_eq!(bar.client_id, Some(String::from("1")));
        assert_eq!(bar.real_address, Some(peer(10, 10, 10, 10, 64169)));
        assert_eq!(bar.bytes_received, ByteSize::b(1_817_262));
        assert_eq!(bar.bytes_sent, ByteSize::b(28_358_690));
        assert_eq!(bar.connected_since, Some(june_18th(4, 8, 39)));

        // Routes as well
        let names: Vec<_> = status.routes().keys().cloned().collect();
        assert_eq!(names, vec!["foo@example.com", "bar@example.com"]);
        let bar_route = &status.routes()["bar@example.com"];
        assert_eq!(bar_route.virtual_address,
                   Some(IpAddr::V4(Ipv4Addr::new(192, 168, 255, 134))));
        assert_eq!(bar_route.last_ref, Some(june_18th(8, 11, 55)));
    }

    /// Check that empty sections are fine
    #[test]
    fn parse_empty_sections() {
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Real Address,Bytes Received
HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address
GLOBAL_STATS,Max bcast/mcast queue length,0
END").parse().expect("Should parse");
        assert!(status.clients().is_empty());
        assert!(status.routes().is_empty());
    }

    /// Check that unknown labels are ignored and missing ones left alone
    #[test]
    fn partial_columns() {
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Favourite Color,Common Name,Bytes Sent
CLIENT_LIST,blue,alice,1024
HEADER,ROUTING_TABLE,Common Name,Pet Name
ROUTING_TABLE,alice,rex
END").parse().expect("Should parse");

        let alice = status.client("alice").expect("alice should be there");
        assert_eq!(alice.bytes_sent, ByteSize::kib(1));
        assert_eq!(alice.bytes_received, ByteSize::b(0));
        assert_eq!(alice.real_address, None);
        assert_eq!(alice.connected_since, None);
        assert_eq!(alice.client_id, None);

        let route = status.route("alice").expect("alice should be routed");
        assert_eq!(route.virtual_address, None);
        assert_eq!(route.real_address, None);
        assert_eq!(route.last_ref, None);
    }

    /// Check that a line of another width ends a section and is put back
    #[test]
    fn section_boundary() {
        // The routing header has as many fields as a client row, but headers
        // are never rows. A line of another width ends the routing table.
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Sent,Bytes Received,Real Address,Connected Since
CLIENT_LIST,alice,1,2,10.0.0.1:1194,Thu Jun 18 04:23:03 2015
HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address,Last Ref
ROUTING_TABLE,10.8.0.6,alice,10.0.0.1:1194,Thu Jun 18 04:23:03 2015
this,line,ends,the,routing,table,for,sure
END").parse().expect("Should parse");
        assert_eq!(status.clients().len(), 1);
        assert_eq!(status.routes().len(), 1);

        // The line which ends a section may itself be the next header
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Sent
CLIENT_LIST,alice,1
CLIENT_LIST,bob,2
HEADER,ROUTING_TABLE,Common Name,Virtual Address
ROUTING_TABLE,alice,10.8.0.6
END").parse().expect("Should parse");
        assert_eq!(status.clients().len(), 2);
        assert_eq!(status.routes().len(), 1);
    }

    /// Check that later rows overwrite earlier ones with the same key
    #[test]
    fn overwrite_duplicates() {
        let status = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received,Bytes Sent
CLIENT_LIST,alice,1,2
CLIENT_LIST,bob,3,4
CLIENT_LIST,alice,5,6
HEADER,ROUTING_TABLE,Common Name,Virtual Address
END").parse().expect("Should parse");

        assert_eq!(status.clients().len(), 2);
        let alice = status.client("alice").expect("alice should be there");
        assert_eq!(alice.bytes_received, ByteSize::b(5));
        assert_eq!(alice.bytes_sent, ByteSize::b(6));

        // The entry keeps the position of its first appearance
        let names: Vec<_> = status.clients().keys().cloned().collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    /// Check that headers with too few labels are rejected
    #[test]
    fn reject_short_header() {
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name
CLIENT_LIST,alice
HEADER,ROUTING_TABLE,Virtual Address,Common Name
END").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["line 1: expected list of labels but got \
                     'HEADER,CLIENT_LIST,Common Name'"]);
    }

    /// Check that field parser errors are reported
    #[test]
    fn reject_invalid_field() {
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received
CLIENT_LIST,alice,abc
HEADER,ROUTING_TABLE,Virtual Address,Common Name
END").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["line 2: expected valid format for 'Bytes Received': \
                     'abc' is not a valid byte count"]);
    }

    /// Check that error messages cannot carry control characters
    #[test]
    fn sanitize_field_errors() {
        let error = LogParser::new(
            "HEADER,CLIENT_LIST,Common Name,Connected Since\n\
             CLIENT_LIST,alice,\u{1b}[31m\n\
             END"
        ).parse().expect_err("Should be rejected");
        let message = error.to_string();
        assert!(!message.chars().any(char::is_control));
        assert!(message.contains("\\u{1b}[31m"));
    }

    /// Check that a missing routing table is reported
    #[test]
    fn reject_missing_section() {
        // Client section at the end of the input
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
CLIENT_LIST,alice,10.10.10.10:49502,334948,1973012,Thu Jun 18 04:23:03 2015
").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["expected 'ROUTING_TABLE' header but got end of input"]);

        // Client section followed by other sections
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received,Bytes Sent
CLIENT_LIST,alice,42,43
GLOBAL_STATS,Max bcast/mcast queue length,0
END").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["expected 'ROUTING_TABLE' header but got end of input"]);

        // Header labels must match exactly
        let error = LogParser::new("\
HEADER,CLIENT_LISTS,Common Name,Bytes Received
CLIENT_LISTS,alice,42
END").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["expected 'CLIENT_LIST' header but got end of input"]);

        // Empty input
        let error = LogParser::new("").parse()
                                      .expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["expected 'CLIENT_LIST' header but got end of input"]);
    }

    /// Check that the input may not end in the middle of a row
    #[test]
    fn reject_truncated_section() {
        // Truncated client list
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received
CLIENT_LIST,alice,42
CLIENT_LIST,bo
").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["line 3: expected list of 3 fields but got 'CLIENT_LIST,bo'",
                    "input ends in the middle of 'CLIENT_LIST'"]);

        // Truncated routing table
        let error = LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received
HEADER,ROUTING_TABLE,Virtual Address,Common Name
ROUTING_TABLE,10.8.0.6,alice
ROUTING_TABLE,10.8.0.7").parse().expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["line 4: expected list of 3 fields but got \
                     'ROUTING_TABLE,10.8.0.7'",
                    "input ends in the middle of 'ROUTING_TABLE'"]);

        // Complete sections may end with the input, and a final line from
        // another section is not a truncated row
        assert!(LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received
HEADER,ROUTING_TABLE,Virtual Address,Common Name
ROUTING_TABLE,10.8.0.6,alice").parse().is_ok());
        assert!(LogParser::new("\
HEADER,CLIENT_LIST,Common Name,Bytes Received
HEADER,ROUTING_TABLE,Virtual Address,Common Name
ROUTING_TABLE,10.8.0.6,alice
GLOBAL_STATS,Max bcast/mcast queue length").parse().is_ok());
    }

    /// Check the handling of the END marker
    #[test]
    fn terminator_strictness() {
        let strict = ParserConfig::new().require_terminator(true);
        assert!(strict.requires_terminator());
        assert!(!ParserConfig::default().requires_terminator());

        // Real dumps end with the marker, which is fine in both modes
        assert!(LogParser::new(SAMPLE_STATUS).parse().is_ok());
        assert!(LogParser::with_config(SAMPLE_STATUS, strict).parse().is_ok());

        // A dump without the marker is only accepted in lenient mode
        let unterminated = SAMPLE_STATUS.replace("END\n", "");
        assert!(LogParser::new(&unterminated).parse().is_ok());
        let error = LogParser::with_config(&unterminated, strict)
                              .parse()
                              .expect_err("Should be rejected");
        assert_eq!(error.messages(), ["expected 'END' but got end of input"]);

        // Same when the routing table is the last thing in the dump
        let bare = ALICE_STATUS.replace("END\n", "");
        assert!(LogParser::new(&bare).parse().is_ok());
        let error = LogParser::with_config(&bare, strict)
                              .parse()
                              .expect_err("Should be rejected");
        assert_eq!(error.messages(), ["expected 'END' but got end of input"]);

        // Nothing may follow the marker in strict mode
        let trailing = format!("{}\nGARBAGE,1,2\n", SAMPLE_STATUS);
        assert!(LogParser::new(&trailing).parse().is_ok());
        let error = LogParser::with_config(&trailing, strict)
                              .parse()
                              .expect_err("Should be rejected");
        assert_eq!(error.messages(),
                   ["line 12: expected end of input after 'END' but got \
                     'GARBAGE,1,2'"]);
    }
}
