//! This module contains a parser for virtual addresses (Virtual Address)

use std::net::IpAddr;
use super::ValueError;


/// Parse the virtual address of a route
///
/// Routes to whole subnets come with a CIDR-style prefix length, as in
/// "10.0.0.0/24". Only the address is kept.
///
pub fn parse_vaddr(input: &str) -> Result<IpAddr, ValueError> {
    let invalid = || ValueError::VirtualAddress(input.to_owned());

    // Separate the prefix length, if any, and check that it is a number
    let mut parts = input.splitn(2, '/');
    let address = parts.next().unwrap_or_default();
    if let Some(prefix_len) = parts.next() {
        if prefix_len.is_empty()
           || !prefix_len.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    }

    // Parse the address itself
    address.parse().map_err(|_| invalid())
}
