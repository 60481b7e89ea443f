//! This module contains parsers for the individual fields of a status dump.
//!
//! Each parser turns the raw text of one field into a typed value, and reports
//! a ValueError if the text does not have the expected format. They do not know
//! anything about the surrounding dump, and can thus be used on their own.
//!
//! Each submodule corresponds to one kind of field.

mod filesize;
mod peer;
mod time;
mod vaddr;

pub use self::filesize::parse_filesize;
pub use self::peer::{parse_peer, PeerAddress};
pub use self::time::parse_time;
pub use self::vaddr::parse_vaddr;

use thiserror::Error;


/// A field of the status dump did not hold what it was supposed to
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValueError {
    /// Dates are expected in the daemon's ctime-like format, or in ISO 8601
    #[error("'{0}' is not a valid timestamp")]
    Timestamp(String),

    /// Byte counts are decimal integers, possibly with digit grouping
    #[error("'{0}' is not a valid byte count")]
    ByteCount(String),

    /// Peer addresses are an IP address with an optional port
    #[error("'{0}' is not a valid peer address")]
    PeerAddress(String),

    /// Virtual addresses are an IP address with an optional prefix length
    #[error("'{0}' is not a valid virtual address")]
    VirtualAddress(String),
}
