//! Parser for the status dumps of OpenVPN servers
//!
//! An OpenVPN server can periodically write its state to a status file, which
//! lists the connected clients and the routes towards them. This crate turns
//! the contents of such a file (in the comma-separated layout of
//! `status-version 2`) into a Status snapshot:
//!
//! ```
//! let dump = "\
//! HEADER,CLIENT_LIST,Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
//! CLIENT_LIST,alice,10.10.10.10:49502,334948,1973012,Thu Jun 18 04:23:03 2015
//! HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address,Last Ref
//! ROUTING_TABLE,192.168.255.118,alice,10.10.10.10:49502,Thu Jun 18 08:12:09 2015
//! ";
//! let status = openvpn_status::parse(dump).expect("Failed to parse status");
//! assert_eq!(status.clients()["alice"].bytes_received.as_u64(), 334948);
//! assert!(status.route("alice").is_some());
//! ```
//!
//! Reading the file is left to the caller. The parsers of individual fields
//! are also exposed, in the parsers module.

#[macro_use]
extern crate lazy_static;

#[macro_use]
mod schema;

mod error;
mod models;
mod parser;
pub mod parsers;
mod splitter;

pub use crate::error::ParseError;
pub use crate::models::{Client, Routing, Status};
pub use crate::parser::{LogParser, ParserConfig};
pub use crate::parsers::{PeerAddress, ValueError};


/// Parse a status dump with the default parser configuration
pub fn parse(content: &str) -> Result<Status, ParseError> {
    LogParser::new(content).parse()
}
