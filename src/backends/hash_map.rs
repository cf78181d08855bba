//! The two hash based baselines. Neither keeps any order.

use std::collections::HashMap;

use super::{StorageBackend, Walk};
use crate::keys::ByteKey;

//------------ ByteKeyMap ----------------------------------------------------

/// A hash map keyed by the fixed width byte encoding of a prefix.
#[derive(Debug)]
pub struct ByteKeyMap<V> {
    map: HashMap<ByteKey, V>,
}

impl<V> Default for ByteKeyMap<V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<V> StorageBackend<V> for ByteKeyMap<V> {
    type Key = ByteKey;

    fn insert(&mut self, key: ByteKey, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn remove(&mut self, key: &ByteKey) -> Option<V> {
        self.map.remove(key)
    }

    fn get(&self, key: &ByteKey) -> Option<&V> {
        self.map.get(key)
    }

    fn walk(&self) -> Walk<'_, ByteKey, V> {
        Box::new(self.map.iter())
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

//------------ IntKeyMap -----------------------------------------------------

/// A hash map keyed by the packed u64 encoding of an IPv4 prefix.
#[derive(Debug)]
pub struct IntKeyMap<V> {
    map: HashMap<u64, V>,
}

impl<V> Default for IntKeyMap<V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<V> StorageBackend<V> for IntKeyMap<V> {
    type Key = u64;

    fn insert(&mut self, key: u64, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn remove(&mut self, key: &u64) -> Option<V> {
        self.map.remove(key)
    }

    fn get(&self, key: &u64) -> Option<&V> {
        self.map.get(key)
    }

    fn walk(&self) -> Walk<'_, u64, V> {
        Box::new(self.map.iter())
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
