use std::fmt;

use super::af::NetPrefix;

//------------ PrefixRecord --------------------------------------------------

/// A prefix with the route data it was loaded with.
///
/// Records are created once by the input layer and then only borrowed: the
/// storage backends hold `&PrefixRecord<M>` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixRecord<M> {
    pub prefix: NetPrefix,
    pub meta: M,
}

impl<M> PrefixRecord<M> {
    pub fn new(prefix: NetPrefix, meta: M) -> Self {
        Self { prefix, meta }
    }

    pub fn prefix(&self) -> &NetPrefix {
        &self.prefix
    }

    pub fn meta(&self) -> &M {
        &self.meta
    }
}

impl<M: fmt::Display> fmt::Display for PrefixRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.meta)
    }
}

//------------ RouteMeta -----------------------------------------------------

/// The route data that comes with a prefix in a RIB dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteMeta {
    /// The raw path attributes of the first RIB entry for the prefix in an
    /// MRT TABLE_DUMPv2 file, together with the index of the peer it was
    /// learned from.
    PathAttributes { peer_index: u16, bytes: Vec<u8> },
    /// The origin AS of the prefix, as found in CSV dumps.
    OriginAs(u32),
}

impl fmt::Display for RouteMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMeta::PathAttributes { peer_index, bytes } => {
                write!(f, "peer #{} ({} bytes)", peer_index, bytes.len())
            }
            RouteMeta::OriginAs(asn) => write!(f, "AS{}", asn),
        }
    }
}
