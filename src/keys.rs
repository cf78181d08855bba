//! Key encoders: turn a prefix into the native key of a storage backend.
//!
//! Every encoder is a pure function of the prefix. An encoder that can't
//! represent a prefix returns `None`, so that an unsupported prefix never
//! shares a key with a supported one, nor with another unsupported one.

use std::fmt;

use zerocopy::{Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::types::af::{IPv4, IPv6};
use crate::types::{Family, NetPrefix, PrefixVariant};

//------------ KeyEncoder (trait) --------------------------------------------

pub trait KeyEncoder {
    type Key;

    /// Returns the key for `prefix`, or `None` if this encoding does not
    /// support the prefix.
    fn encode(prefix: &NetPrefix) -> Option<Self::Key>;
}

//------------ ByteKey -------------------------------------------------------

/// The address of an IPv4 prefix followed by its length, 5 bytes.
#[derive(
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Copy,
    Clone,
    IntoBytes,
    KnownLayout,
    Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct V4Key {
    net: IPv4,
    len: u8,
}

/// The address of an IPv6 prefix followed by its length, 17 bytes.
#[derive(
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Copy,
    Clone,
    IntoBytes,
    KnownLayout,
    Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct V6Key {
    net: IPv6,
    len: u8,
}

/// A fixed width byte key, compared by value.
///
/// The two widths never compare equal, so keys of different families can't
/// alias each other.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone)]
pub enum ByteKey {
    V4(V4Key),
    V6(V6Key),
}

impl ByteKey {
    pub fn family(&self) -> Family {
        match self {
            ByteKey::V4(_) => Family::Ipv4,
            ByteKey::V6(_) => Family::Ipv6,
        }
    }
}

impl AsRef<[u8]> for ByteKey {
    fn as_ref(&self) -> &[u8] {
        match self {
            ByteKey::V4(k) => k.as_bytes(),
            ByteKey::V6(k) => k.as_bytes(),
        }
    }
}

impl fmt::Display for ByteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.as_ref().iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

pub struct ByteKeyEncoder;

impl KeyEncoder for ByteKeyEncoder {
    type Key = ByteKey;

    fn encode(prefix: &NetPrefix) -> Option<ByteKey> {
        Some(match prefix {
            NetPrefix::V4(p) => ByteKey::V4(V4Key {
                net: p.net(),
                len: p.len(),
            }),
            NetPrefix::V6(p) => ByteKey::V6(V6Key {
                net: p.net(),
                len: p.len(),
            }),
        })
    }
}

//------------ IntKey --------------------------------------------------------

/// Packs an IPv4 prefix into a u64: the length in bits 32..40 and the
/// address in bits 0..32. IPv6 prefixes don't fit and are unsupported.
pub struct IntKeyEncoder;

impl KeyEncoder for IntKeyEncoder {
    type Key = u64;

    fn encode(prefix: &NetPrefix) -> Option<u64> {
        match prefix {
            NetPrefix::V4(p) => {
                Some((p.len() as u64) << 32 | u32::from(p.net()) as u64)
            }
            NetPrefix::V6(_) => None,
        }
    }
}

//------------ BitKey --------------------------------------------------------

/// A prefix spelled out bit by bit: a family tag (`4` or `6`) followed by
/// one ASCII `0` or `1` per significant bit of the address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitKey(Vec<u8>);

impl BitKey {
    fn from_variant<P: PrefixVariant>(prefix: &P) -> Self {
        let mut key = Vec::with_capacity(prefix.len() as usize + 1);
        key.push(match P::FAMILY {
            Family::Ipv4 => b'4',
            Family::Ipv6 => b'6',
        });
        key.extend((0..prefix.len()).map(|i| match prefix.bit(i) {
            true => b'1',
            false => b'0',
        }));
        BitKey(key)
    }
}

impl AsRef<[u8]> for BitKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for BitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

pub struct BitKeyEncoder;

impl KeyEncoder for BitKeyEncoder {
    type Key = BitKey;

    fn encode(prefix: &NetPrefix) -> Option<BitKey> {
        Some(match prefix {
            NetPrefix::V4(p) => BitKey::from_variant(p),
            NetPrefix::V6(p) => BitKey::from_variant(p),
        })
    }
}
