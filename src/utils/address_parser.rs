//! CIDR range expansion
//!
//! A range expands to every address in the block, network and broadcast
//! addresses included, in ascending order.

use crate::{Result, ScanError};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A parsed IPv4 CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    network: Ipv4Network,
}

impl AddressRange {
    /// Parse `a.b.c.d/len`. The prefix is mandatory; host bits are masked off.
    pub fn parse(range: &str) -> Result<Self> {
        let range = range.trim();

        let (addr, prefix) = range
            .split_once('/')
            .ok_or_else(|| ScanError::invalid_range(range, "missing prefix length"))?;

        let addr = Ipv4Addr::from_str(addr)
            .map_err(|e| ScanError::invalid_range(range, e))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| ScanError::invalid_range(range, "invalid prefix length"))?;

        let network = Ipv4Network::new(addr, prefix)
            .map_err(|e| ScanError::invalid_range(range, e))?;

        Ok(Self { network })
    }

    /// First address of the block (the masked network address)
    pub fn first(&self) -> Ipv4Addr {
        self.network.network()
    }

    /// Last address of the block (the broadcast address)
    pub fn last(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Number of addresses in the block, `2^(32 - prefix)`
    pub fn len(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix()))
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the block in address order.
    ///
    /// Walks a `u32` inclusive range, so a /0 stops at 255.255.255.255 instead
    /// of wrapping back to 0.0.0.0.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> {
        (u32::from(self.first())..=u32::from(self.last())).map(Ipv4Addr::from)
    }
}

impl FromStr for AddressRange {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Expand every range and concatenate the results in argument order.
///
/// No deduplication happens across overlapping ranges. The first malformed
/// range aborts the whole expansion.
pub fn expand_ranges<S: AsRef<str>>(ranges: &[S]) -> Result<Vec<Ipv4Addr>> {
    let parsed = ranges
        .iter()
        .map(|r| AddressRange::parse(r.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let total: u64 = parsed.iter().map(AddressRange::len).sum();
    let mut addresses = Vec::with_capacity(usize::try_from(total).unwrap_or(0));

    for range in &parsed {
        log::debug!(
            "CIDR {}/{} expanded to {} addresses",
            range.first(),
            range.prefix(),
            range.len()
        );
        addresses.extend(range.addresses());
    }

    Ok(addresses)
}
