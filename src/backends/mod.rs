//! Storage backends under test.
//!
//! Every backend implements [StorageBackend] over its own key type. The
//! benchmark driver talks to them through the object safe [PrefixStore]
//! trait instead, which [EncodedStore] implements for any pairing of a
//! [KeyEncoder] with a backend that takes the encoder's keys.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use log::trace;
use serde_derive::Serialize;

use crate::keys::{
    BitKey, BitKeyEncoder, ByteKey, ByteKeyEncoder, IntKeyEncoder,
    KeyEncoder,
};
use crate::types::NetPrefix;

pub mod critbit;
pub mod hash_map;
pub mod immutable_radix;
pub mod radix;

pub use critbit::CritBitTrie;
pub use hash_map::{ByteKeyMap, IntKeyMap};
pub use immutable_radix::ImmutableRadixTrie;
pub use radix::RadixTrie;

/// A fresh traversal over all `(key, value)` pairs of a backend.
pub type Walk<'a, K, V> = Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a>;

//------------ StorageBackend (trait) ----------------------------------------

pub trait StorageBackend<V> {
    type Key;

    /// Associates `value` with `key`. Returns the value that was stored for
    /// `key` before, if any.
    fn insert(&mut self, key: Self::Key, value: V) -> Option<V>;

    /// Removes the association for `key` and returns its value.
    fn remove(&mut self, key: &Self::Key) -> Option<V>;

    fn get(&self, key: &Self::Key) -> Option<&V>;

    /// Visits every association exactly once. Ordered backends yield the
    /// pairs in lexicographic order of the key bytes.
    fn walk(&self) -> Walk<'_, Self::Key, V>;

    fn len(&self) -> usize;

    /// Returns whether `key` was present.
    fn delete(&mut self, key: &Self::Key) -> bool {
        self.remove(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//------------ BackendKind ---------------------------------------------------

/// The backends the benchmark knows about, in reporting order.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    ByteKeyMap,
    IntKeyMap,
    MutableRadix,
    ImmutableRadix,
    CritBit,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::ByteKeyMap,
        BackendKind::IntKeyMap,
        BackendKind::MutableRadix,
        BackendKind::ImmutableRadix,
        BackendKind::CritBit,
    ];

    /// The name used in reports and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::ByteKeyMap => "string key map",
            BackendKind::IntKeyMap => "int key map",
            BackendKind::MutableRadix => "mutable radix",
            BackendKind::ImmutableRadix => "immutable radix",
            BackendKind::CritBit => "critbit",
        }
    }

    /// Creates an empty store of this kind.
    pub fn build<'a, V: Clone + 'a>(&self) -> Box<dyn PrefixStore<V> + 'a> {
        match self {
            BackendKind::ByteKeyMap => Box::new(EncodedStore::<
                ByteKeyEncoder,
                ByteKeyMap<V>,
                V,
            >::new(*self)),
            BackendKind::IntKeyMap => Box::new(EncodedStore::<
                IntKeyEncoder,
                IntKeyMap<V>,
                V,
            >::new(*self)),
            BackendKind::MutableRadix => Box::new(EncodedStore::<
                BitKeyEncoder,
                RadixTrie<BitKey, V>,
                V,
            >::new(*self)),
            BackendKind::ImmutableRadix => Box::new(EncodedStore::<
                ByteKeyEncoder,
                ImmutableRadixTrie<ByteKey, V>,
                V,
            >::new(*self)),
            BackendKind::CritBit => Box::new(EncodedStore::<
                ByteKeyEncoder,
                CritBitTrie<ByteKey, V>,
                V,
            >::new(*self)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown backend '{}'", self.0)
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    /// Accepts the report name, with `-` or `_` in place of spaces, and a
    /// few short forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "string key map" | "byte key map" | "bytes" => {
                Ok(BackendKind::ByteKeyMap)
            }
            "int key map" | "int" => Ok(BackendKind::IntKeyMap),
            "mutable radix" | "radix" => Ok(BackendKind::MutableRadix),
            "immutable radix" | "iradix" => Ok(BackendKind::ImmutableRadix),
            "critbit" | "crit bit" => Ok(BackendKind::CritBit),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

//------------ PrefixStore (trait) -------------------------------------------

/// A storage backend addressed by prefix, as the benchmark driver uses it.
pub trait PrefixStore<V> {
    fn kind(&self) -> BackendKind;

    /// Stores `value` for `prefix`. Returns `false` if the backend's key
    /// encoding does not support the prefix; nothing is stored then.
    fn insert(&mut self, prefix: &NetPrefix, value: V) -> bool;

    fn delete(&mut self, prefix: &NetPrefix) -> bool;

    fn lookup(&self, prefix: &NetPrefix) -> Option<&V>;

    /// Walks all entries, calling `visit` for every value. Returns the
    /// number of entries visited.
    fn walk(&self, visit: &mut dyn FnMut(&V)) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the backend's key encoding can represent `prefix`.
    fn supports(&self, prefix: &NetPrefix) -> bool;
}

//------------ EncodedStore --------------------------------------------------

pub struct EncodedStore<E, B, V> {
    kind: BackendKind,
    backend: B,
    _encoder: PhantomData<(E, V)>,
}

impl<E, B: Default, V> EncodedStore<E, B, V> {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            backend: B::default(),
            _encoder: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<E, B, V> PrefixStore<V> for EncodedStore<E, B, V>
where
    E: KeyEncoder,
    B: StorageBackend<V, Key = E::Key>,
{
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn insert(&mut self, prefix: &NetPrefix, value: V) -> bool {
        match E::encode(prefix) {
            Some(key) => {
                self.backend.insert(key, value);
                true
            }
            None => {
                trace!("{}: unsupported prefix {}", self.kind, prefix);
                false
            }
        }
    }

    fn delete(&mut self, prefix: &NetPrefix) -> bool {
        match E::encode(prefix) {
            Some(key) => self.backend.delete(&key),
            None => false,
        }
    }

    fn lookup(&self, prefix: &NetPrefix) -> Option<&V> {
        E::encode(prefix).and_then(|key| self.backend.get(&key))
    }

    fn walk(&self, visit: &mut dyn FnMut(&V)) -> usize {
        let mut count = 0;
        for (_, v) in self.backend.walk() {
            visit(v);
            count += 1;
        }
        count
    }

    fn len(&self) -> usize {
        self.backend.len()
    }

    fn supports(&self, prefix: &NetPrefix) -> bool {
        E::encode(prefix).is_some()
    }
}
