//! This module contains the data model of a parsed status dump

use bytesize::ByteSize;
use chrono::NaiveDateTime;
use crate::parsers::{parse_filesize, parse_peer, parse_time, parse_vaddr,
                     PeerAddress};
use crate::schema::{Record, Schema};
use indexmap::IndexMap;
use std::net::IpAddr;


lazy_static! {
    /// Columns of the CLIENT_LIST section
    static ref CLIENT_SCHEMA: Schema<Client> = Schema {
        section: "CLIENT_LIST",
        columns: vec![
            column!(Client, "Client ID" => client_id),
            column!(Client, "Common Name" => common_name),
            column!(Client, "Real Address" => real_address via parse_peer),
            column!(Client, "Bytes Received" => bytes_received
                                                via parse_filesize),
            column!(Client, "Bytes Sent" => bytes_sent via parse_filesize),
            column!(Client, "Connected Since" => connected_since
                                                 via parse_time),
        ],
    };

    /// Columns of the ROUTING_TABLE section
    static ref ROUTING_SCHEMA: Schema<Routing> = Schema {
        section: "ROUTING_TABLE",
        columns: vec![
            column!(Routing, "Virtual Address" => virtual_address
                                                  via parse_vaddr),
            column!(Routing, "Common Name" => common_name),
            column!(Routing, "Real Address" => real_address via parse_peer),
            column!(Routing, "Last Ref" => last_ref via parse_time),
        ],
    };
}


/// Snapshot of the server state, as described by a status dump
///
/// Both tables are keyed by common name and keep the order in which the
/// entries first appeared in the dump. If a common name appears more than
/// once in a section, the last row wins.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Status {
    /// Connected clients
    client_list: IndexMap<String, Client>,

    /// Routes towards connected clients
    routing_table: IndexMap<String, Routing>,
}
//
impl Status {
    /// Assemble a status out of its parsed tables
    pub(crate) fn new(client_list: IndexMap<String, Client>,
                      routing_table: IndexMap<String, Routing>) -> Self {
        Self {
            client_list,
            routing_table,
        }
    }

    /// Connected clients, keyed by common name
    pub fn clients(&self) -> &IndexMap<String, Client> {
        &self.client_list
    }

    /// Routing entries, keyed by common name
    pub fn routes(&self) -> &IndexMap<String, Routing> {
        &self.routing_table
    }

    /// Look up a client by common name
    pub fn client(&self, common_name: &str) -> Option<&Client> {
        self.client_list.get(common_name)
    }

    /// Look up a routing entry by common name
    pub fn route(&self, common_name: &str) -> Option<&Routing> {
        self.routing_table.get(common_name)
    }
}


/// Client connected to the server (one row of CLIENT_LIST)
///
/// Fields whose column is missing from the dump's header keep their default
/// value: None, an empty string, or zero bytes.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Client {
    /// Identifier allocated by the daemon (not printed by older versions)
    pub client_id: Option<String>,

    /// Common name of the client's certificate
    pub common_name: String,

    /// Address from which the client connected
    pub real_address: Option<PeerAddress>,

    /// Traffic received from the client
    pub bytes_received: ByteSize,

    /// Traffic sent to the client
    pub bytes_sent: ByteSize,

    /// Date at which the client connected, in the server's local time
    pub connected_since: Option<NaiveDateTime>,
}
//
impl Default for Client {
    fn default() -> Self {
        Self {
            client_id: None,
            common_name: String::new(),
            real_address: None,
            bytes_received: ByteSize::b(0),
            bytes_sent: ByteSize::b(0),
            connected_since: None,
        }
    }
}
//
impl Record for Client {
    fn schema() -> &'static Schema<Self> {
        &CLIENT_SCHEMA
    }

    fn key(&self) -> &str {
        &self.common_name
    }
}


/// Route towards a client (one row of ROUTING_TABLE)
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Routing {
    /// Address inside of the VPN, without its prefix length
    pub virtual_address: Option<IpAddr>,

    /// Common name of the client's certificate
    pub common_name: String,

    /// Address from which the client connected
    pub real_address: Option<PeerAddress>,

    /// Last time the route was used, in the server's local time
    pub last_ref: Option<NaiveDateTime>,
}
//
impl Record for Routing {
    fn schema() -> &'static Schema<Self> {
        &ROUTING_SCHEMA
    }

    fn key(&self) -> &str {
        &self.common_name
    }
}
