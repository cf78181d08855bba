use std::net::Ipv4Addr;

use super::af::{Ipv4Prefix, NetPrefix};
use super::prefix_record::PrefixRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoMeta {
    Empty,
}

impl std::fmt::Display for NoMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoMeta")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrefixAs(pub u32);

impl std::fmt::Display for PrefixAs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

/// Returns `count` distinct IPv4 /24 prefixes, starting at 1.0.0.0/24 and
/// counting up through the third octet. Each record carries its index as
/// the origin AS, so that lookups can be checked against the input.
///
/// Panics if `count` exceeds the number of /24s in the IPv4 space.
pub fn ipv4_slash24s(count: usize) -> Vec<PrefixRecord<PrefixAs>> {
    assert!(count <= (1 << 24) - (1 << 16));
    (0..count as u32)
        .map(|i| {
            let net = (1 << 24) + (i << 8);
            // Lengths are always valid here.
            #[allow(clippy::unwrap_used)]
            let prefix = Ipv4Prefix::new(Ipv4Addr::from(net), 24).unwrap();
            PrefixRecord::new(NetPrefix::V4(prefix), PrefixAs(i))
        })
        .collect()
}
