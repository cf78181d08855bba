use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use inetnum::addr::Prefix;
use serde_derive::Serialize;
use zerocopy::{NetworkEndian, U128, U32};

use super::errors::PrefixError;

/// Exactly fitting IPv4 bytes (4 octets).
pub type IPv4 = U32<NetworkEndian>;

/// Exactly fitting IPv6 bytes (16 octets).
pub type IPv6 = U128<NetworkEndian>;

//------------ Family --------------------------------------------------------

/// The address family of a prefix.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    /// The number of bits in an address of this family.
    pub const fn bits(self) -> u8 {
        match self {
            Family::Ipv4 => 32,
            Family::Ipv6 => 128,
        }
    }

    /// The number of octets in an address of this family.
    pub const fn octets(self) -> usize {
        self.bits() as usize / 8
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Ipv4 => write!(f, "IPv4"),
            Family::Ipv6 => write!(f, "IPv6"),
        }
    }
}

//------------ PrefixVariant (trait) -----------------------------------------
//
/// The capabilities every family-specific prefix type offers.
///
/// Key encoders are written against this trait, so that they treat IPv4 and
/// IPv6 prefixes the same way, and only the family tag and the width of the
/// address differ.
pub trait PrefixVariant: Copy + fmt::Debug + fmt::Display {
    const FAMILY: Family;

    type Octets: AsRef<[u8]>;

    /// The address in network byte order.
    fn octets(&self) -> Self::Octets;

    /// The number of significant leading bits.
    fn len(&self) -> u8;

    /// Returns the bit at `index`, counted from the most significant bit of
    /// the address. Bits beyond the address width read as zero.
    fn bit(&self, index: u8) -> bool {
        let octets = self.octets();
        octets
            .as_ref()
            .get(index as usize / 8)
            .is_some_and(|o| o & (0x80 >> (index % 8)) != 0)
    }
}

//------------ Ipv4Prefix ----------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Prefix {
    net: IPv4,
    len: u8,
}

impl Ipv4Prefix {
    pub fn new(addr: Ipv4Addr, len: u8) -> Result<Self, PrefixError> {
        if len > Family::Ipv4.bits() {
            return Err(PrefixError::LengthInvalid {
                family: Family::Ipv4,
                len,
            });
        }
        Ok(Self::truncated(u32::from(addr), len))
    }

    // Clears the host bits, so that equal prefixes compare equal.
    fn truncated(net: u32, len: u8) -> Self {
        let mask = u32::MAX.checked_shl(32 - len as u32).unwrap_or(0);
        Self {
            net: IPv4::from(net & mask),
            len,
        }
    }

    pub fn net(&self) -> IPv4 {
        self.net
    }

    pub fn addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.net))
    }
}

impl PrefixVariant for Ipv4Prefix {
    const FAMILY: Family = Family::Ipv4;

    type Octets = [u8; 4];

    fn octets(&self) -> [u8; 4] {
        self.net.to_bytes()
    }

    fn len(&self) -> u8 {
        self.len
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len)
    }
}

//------------ Ipv6Prefix ----------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv6Prefix {
    net: IPv6,
    len: u8,
}

impl Ipv6Prefix {
    pub fn new(addr: Ipv6Addr, len: u8) -> Result<Self, PrefixError> {
        if len > Family::Ipv6.bits() {
            return Err(PrefixError::LengthInvalid {
                family: Family::Ipv6,
                len,
            });
        }
        Ok(Self::truncated(u128::from(addr), len))
    }

    fn truncated(net: u128, len: u8) -> Self {
        let mask = u128::MAX.checked_shl(128 - len as u32).unwrap_or(0);
        Self {
            net: IPv6::from(net & mask),
            len,
        }
    }

    pub fn net(&self) -> IPv6 {
        self.net
    }

    pub fn addr(&self) -> Ipv6Addr {
        Ipv6Addr::from(u128::from(self.net))
    }
}

impl PrefixVariant for Ipv6Prefix {
    const FAMILY: Family = Family::Ipv6;

    type Octets = [u8; 16];

    fn octets(&self) -> [u8; 16] {
        self.net.to_bytes()
    }

    fn len(&self) -> u8 {
        self.len
    }
}

impl fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len)
    }
}

//------------ NetPrefix -----------------------------------------------------

/// An IPv4 or IPv6 prefix.
///
/// Host bits beyond the length are always zero, so two prefixes are equal
/// exactly when they cover the same address range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetPrefix {
    V4(Ipv4Prefix),
    V6(Ipv6Prefix),
}

impl NetPrefix {
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, PrefixError> {
        match addr {
            IpAddr::V4(addr) => Ipv4Prefix::new(addr, len).map(Self::V4),
            IpAddr::V6(addr) => Ipv6Prefix::new(addr, len).map(Self::V6),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            NetPrefix::V4(_) => Family::Ipv4,
            NetPrefix::V6(_) => Family::Ipv6,
        }
    }

    pub fn len(&self) -> u8 {
        match self {
            NetPrefix::V4(p) => p.len(),
            NetPrefix::V6(p) => p.len(),
        }
    }

    pub fn addr(&self) -> IpAddr {
        match self {
            NetPrefix::V4(p) => IpAddr::V4(p.addr()),
            NetPrefix::V6(p) => IpAddr::V6(p.addr()),
        }
    }
}

impl From<Prefix> for NetPrefix {
    // An inetnum Prefix never carries a length beyond its family width.
    fn from(prefix: Prefix) -> Self {
        match prefix.addr() {
            IpAddr::V4(addr) => NetPrefix::V4(Ipv4Prefix::truncated(
                u32::from(addr),
                prefix.len(),
            )),
            IpAddr::V6(addr) => NetPrefix::V6(Ipv6Prefix::truncated(
                u128::from(addr),
                prefix.len(),
            )),
        }
    }
}

impl From<Ipv4Prefix> for NetPrefix {
    fn from(prefix: Ipv4Prefix) -> Self {
        NetPrefix::V4(prefix)
    }
}

impl From<Ipv6Prefix> for NetPrefix {
    fn from(prefix: Ipv6Prefix) -> Self {
        NetPrefix::V6(prefix)
    }
}

impl FromStr for NetPrefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| PrefixError::Parse(s.to_string()))?;
        let addr = IpAddr::from_str(addr.trim())
            .map_err(|_| PrefixError::Parse(s.to_string()))?;
        let len = u8::from_str(len.trim())
            .map_err(|_| PrefixError::Parse(s.to_string()))?;
        NetPrefix::new(addr, len)
    }
}

impl fmt::Display for NetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetPrefix::V4(p) => fmt::Display::fmt(p, f),
            NetPrefix::V6(p) => fmt::Display::fmt(p, f),
        }
    }
}
