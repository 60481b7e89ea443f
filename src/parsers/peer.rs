//! This module contains a parser for peer addresses (Real Address)

use regex::Regex;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use super::ValueError;


lazy_static! {
    /// IPv6 peers may be written with their address in brackets, which is the
    /// only way to attach a port to them without ambiguity
    static ref BRACKETED_PEER: Regex =
        Regex::new(r"^\[(?P<host>[^\]]+)\](?::(?P<port>[0-9]+))?$")
              .expect("The bracketed peer regex should be valid");
}


/// Remote end of a VPN connection
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PeerAddress {
    /// IP address of the peer
    pub host: IpAddr,

    /// Port number of the peer, when the dump mentions it
    pub port: Option<u16>,
}
//
impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.host, self.port) {
            (host, None) => write!(f, "{}", host),
            (IpAddr::V4(host), Some(port)) => write!(f, "{}:{}", host, port),
            (IpAddr::V6(host), Some(port)) => write!(f, "[{}]:{}", host, port),
        }
    }
}
//
impl FromStr for PeerAddress {
    type Err = ValueError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_peer(input)
    }
}


/// Parse a peer address of the form "host:port", "[host]:port" or "host"
///
/// The daemon prints IPv6 peers without brackets, so "2001:db8::1:1194" is
/// read as host 2001:db8::1 and port 1194 whenever that split is valid, and as
/// a bare IPv6 address otherwise.
///
pub fn parse_peer(input: &str) -> Result<PeerAddress, ValueError> {
    let invalid = || ValueError::PeerAddress(input.to_owned());

    // Bracketed IPv6 address, with or without a port
    if let Some(captures) = BRACKETED_PEER.captures(input) {
        let host = captures["host"].parse().map_err(|_| invalid())?;
        let port = match captures.name("port") {
            Some(port) => Some(port.as_str().parse().map_err(|_| invalid())?),
            None => None,
        };
        return Ok(PeerAddress { host, port });
    }

    // Host followed by a port, splitting at the last colon
    if let Some((host, port)) = input.rsplit_once(':') {
        if let (Ok(host), Ok(port)) = (host.parse(), port.parse()) {
            return Ok(PeerAddress { host, port: Some(port) });
        }
    }

    // Bare host
    input.parse()
         .map(|host| PeerAddress { host, port: None })
         .map_err(|_| invalid())
}
