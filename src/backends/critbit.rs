//! A crit-bit tree: a binary PATRICIA trie over byte strings.
//!
//! Every branch stores the position of the first bit in which the keys of
//! its two subtrees differ, so there are no single-child branches and a tree
//! with `n` keys has exactly `n - 1` branches.
//!
//! Keys may be prefixes of each other. Byte `i` of a key is read as the
//! 9-bit symbol `key[i] + 1`, and every position past the end of the key as
//! `0`. The end of a key therefore sorts below any byte and walking the tree
//! left to right yields the keys in lexicographic order.
//!
//! Branches and leaves live in two vectors and refer to each other by
//! index, freed slots are reused.

use super::{StorageBackend, Walk};

//------------ NodeRef -------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NodeRef {
    Branch(u32),
    Leaf(u32),
}

#[derive(Copy, Clone, Debug)]
struct Branch {
    // The byte position of the critical bit.
    byte: u32,
    // The critical bit itself, as a single bit mask over a 9-bit symbol.
    bit: u16,
    child: [NodeRef; 2],
}

impl Branch {
    fn child(&self, dir: usize) -> NodeRef {
        match dir {
            0 => self.child[0],
            _ => self.child[1],
        }
    }

    fn set_child(&mut self, dir: usize, node: NodeRef) {
        match dir {
            0 => self.child[0] = node,
            _ => self.child[1] = node,
        }
    }
}

fn symbol(key: &[u8], pos: usize) -> u16 {
    key.get(pos).map_or(0, |b| *b as u16 + 1)
}

fn direction(key: &[u8], byte: u32, bit: u16) -> usize {
    (symbol(key, byte as usize) & bit != 0) as usize
}

// The position and mask of the first bit in which `a` and `b` differ, or
// `None` if they are equal.
fn critical_bit(a: &[u8], b: &[u8]) -> Option<(u32, u16)> {
    (0..=a.len().max(b.len())).find_map(|pos| {
        let diff = symbol(a, pos) ^ symbol(b, pos);
        (diff != 0).then(|| (pos as u32, 0x8000 >> diff.leading_zeros()))
    })
}

//------------ CritBitTrie ---------------------------------------------------

#[derive(Debug)]
pub struct CritBitTrie<K, V> {
    root: Option<NodeRef>,
    branches: Vec<Branch>,
    leaves: Vec<Option<(K, V)>>,
    free_branches: Vec<u32>,
    free_leaves: Vec<u32>,
    len: usize,
}

impl<K, V> Default for CritBitTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CritBitTrie<K, V> {
    pub fn new() -> Self {
        Self {
            root: None,
            branches: Vec::new(),
            leaves: Vec::new(),
            free_branches: Vec::new(),
            free_leaves: Vec::new(),
            len: 0,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            trie: self,
            stack: self.root.into_iter().collect(),
        }
    }

    fn branch(&self, idx: u32) -> Option<&Branch> {
        self.branches.get(idx as usize)
    }

    fn branch_mut(&mut self, idx: u32) -> Option<&mut Branch> {
        self.branches.get_mut(idx as usize)
    }

    fn leaf_mut(&mut self, idx: u32) -> Option<&mut (K, V)> {
        self.leaves.get_mut(idx as usize).and_then(Option::as_mut)
    }

    // Points the edge `parent` at `node`, or makes `node` the root.
    fn relink(&mut self, parent: Option<(u32, usize)>, node: NodeRef) {
        let Some((idx, dir)) = parent else {
            self.root = Some(node);
            return;
        };
        if let Some(b) = self.branch_mut(idx) {
            b.set_child(dir, node);
        }
    }

    fn leaf(&self, idx: u32) -> Option<&(K, V)> {
        self.leaves.get(idx as usize).and_then(Option::as_ref)
    }

    fn alloc_leaf(&mut self, key: K, value: V) -> NodeRef {
        match self.free_leaves.pop() {
            Some(idx) => {
                if let Some(slot) = self.leaves.get_mut(idx as usize) {
                    *slot = Some((key, value));
                    return NodeRef::Leaf(idx);
                }
                self.leaves.push(Some((key, value)));
                NodeRef::Leaf(self.leaves.len() as u32 - 1)
            }
            None => {
                self.leaves.push(Some((key, value)));
                NodeRef::Leaf(self.leaves.len() as u32 - 1)
            }
        }
    }

    fn alloc_branch(&mut self, branch: Branch) -> NodeRef {
        match self.free_branches.pop() {
            Some(idx) => {
                if let Some(slot) = self.branch_mut(idx) {
                    *slot = branch;
                    return NodeRef::Branch(idx);
                }
                self.branches.push(branch);
                NodeRef::Branch(self.branches.len() as u32 - 1)
            }
            None => {
                self.branches.push(branch);
                NodeRef::Branch(self.branches.len() as u32 - 1)
            }
        }
    }

    /// The number of branches in use.
    pub fn branch_count(&self) -> usize {
        self.branches.len() - self.free_branches.len()
    }
}

impl<K: AsRef<[u8]>, V> CritBitTrie<K, V> {
    // Follows the directions `key` gives down to a leaf. That leaf is the
    // only one that can hold `key`, and otherwise shares the longest
    // critical prefix with it.
    fn best_leaf(&self, key: &[u8]) -> Option<u32> {
        let mut node = self.root?;
        loop {
            match node {
                NodeRef::Branch(idx) => {
                    let b = self.branch(idx)?;
                    node = b.child(direction(key, b.byte, b.bit));
                }
                NodeRef::Leaf(idx) => return Some(idx),
            }
        }
    }
}

impl<K: AsRef<[u8]>, V> StorageBackend<V> for CritBitTrie<K, V> {
    type Key = K;

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(best) = self.best_leaf(key.as_ref()) else {
            self.root = Some(self.alloc_leaf(key, value));
            self.len += 1;
            return None;
        };

        let crit = match self.leaf(best) {
            Some((k, _)) => critical_bit(k.as_ref(), key.as_ref()),
            None => None,
        };
        let Some((byte, bit)) = crit else {
            return self
                .leaf_mut(best)
                .map(|(_, v)| std::mem::replace(v, value));
        };
        let dir = direction(key.as_ref(), byte, bit);

        // Find the edge to cut: the first one that leads to a branch on a
        // later bit than the new one.
        let mut parent: Option<(u32, usize)> = None;
        let mut node = self.root;
        while let Some(NodeRef::Branch(idx)) = node {
            let Some(b) = self.branch(idx) else {
                return None;
            };
            if b.byte > byte || (b.byte == byte && b.bit < bit) {
                break;
            }
            let d = direction(key.as_ref(), b.byte, b.bit);
            parent = Some((idx, d));
            node = Some(b.child(d));
        }
        let Some(displaced) = node else {
            return None;
        };

        let leaf = self.alloc_leaf(key, value);
        let mut new = Branch {
            byte,
            bit,
            child: [displaced, displaced],
        };
        new.set_child(dir, leaf);
        let branch = self.alloc_branch(new);
        self.relink(parent, branch);
        self.len += 1;
        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let key = key.as_ref();
        let mut grandparent: Option<(u32, usize)> = None;
        let mut parent: Option<(u32, usize)> = None;
        let mut node = self.root?;
        while let NodeRef::Branch(idx) = node {
            let b = self.branch(idx)?;
            let d = direction(key, b.byte, b.bit);
            grandparent = parent;
            parent = Some((idx, d));
            node = b.child(d);
        }
        let NodeRef::Leaf(leaf) = node else {
            return None;
        };
        if self.leaf(leaf).map(|(k, _)| k.as_ref()) != Some(key) {
            return None;
        }

        let (_, value) = self.leaves.get_mut(leaf as usize)?.take()?;
        self.free_leaves.push(leaf);
        match parent {
            None => self.root = None,
            Some((idx, d)) => {
                if let Some(sibling) = self.branch(idx).map(|b| b.child(1 - d)) {
                    self.free_branches.push(idx);
                    self.relink(grandparent, sibling);
                }
            }
        }
        self.len -= 1;
        Some(value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        let key = key.as_ref();
        let (k, v) = self.leaf(self.best_leaf(key)?)?;
        (k.as_ref() == key).then_some(v)
    }

    fn walk(&self) -> Walk<'_, K, V> {
        Box::new(self.iter())
    }

    fn len(&self) -> usize {
        self.len
    }
}

//------------ Iter ----------------------------------------------------------

pub struct Iter<'a, K, V> {
    trie: &'a CritBitTrie<K, V>,
    stack: Vec<NodeRef>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                NodeRef::Branch(idx) => {
                    if let Some(&Branch { child: [left, right], .. }) =
                        self.trie.branch(idx)
                    {
                        self.stack.push(right);
                        self.stack.push(left);
                    }
                }
                NodeRef::Leaf(idx) => {
                    if let Some((k, v)) = self.trie.leaf(idx) {
                        return Some((k, v));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn keys(t: &CritBitTrie<Vec<u8>, usize>) -> Vec<Vec<u8>> {
        t.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn critical_bit_of_prefix_keys() {
        assert_eq!(critical_bit(b"ab", b"ab"), None);
        // 'a' + 1 = 0x62, 'c' + 1 = 0x64: bit 2 is the first to differ
        assert_eq!(critical_bit(b"xa", b"xc"), Some((1, 0x04)));
        // End of key (0) against 0x00 + 1.
        assert_eq!(critical_bit(b"ab", b"ab\0"), Some((2, 0x01)));
        assert_eq!(critical_bit(b"", b"\xff"), Some((0, 0x100)));
    }

    #[test]
    fn keys_that_are_prefixes_of_each_other() {
        let mut t = CritBitTrie::new();
        let ks: [&[u8]; 6] = [b"ab\0", b"ab", b"a", b"", b"b", b"ab\0\0"];
        for (i, k) in ks.iter().enumerate() {
            assert_eq!(t.insert(k.to_vec(), i), None);
        }
        assert_eq!(t.len(), 6);
        assert_eq!(t.branch_count(), 5);
        for (i, k) in ks.iter().enumerate() {
            assert_eq!(t.get(&k.to_vec()), Some(&i));
        }
        let mut sorted: Vec<Vec<u8>> = ks.iter().map(|k| k.to_vec()).collect();
        sorted.sort();
        assert_eq!(keys(&t), sorted);
    }

    #[test]
    fn overwrite_and_remove() {
        let mut t = CritBitTrie::new();
        assert_eq!(t.insert(b"10".to_vec(), 1), None);
        assert_eq!(t.insert(b"10".to_vec(), 2), Some(1));
        assert_eq!(t.insert(b"11".to_vec(), 3), None);
        assert_eq!(t.insert(b"2".to_vec(), 4), None);
        assert_eq!(t.len(), 3);

        assert_eq!(t.remove(&b"1".to_vec()), None);
        assert_eq!(t.remove(&b"11".to_vec()), Some(3));
        assert_eq!(t.get(&b"11".to_vec()), None);
        assert_eq!(t.get(&b"10".to_vec()), Some(&2));
        assert_eq!(t.branch_count(), 1);

        // Freed slots get reused.
        assert_eq!(t.insert(b"12".to_vec(), 5), None);
        assert_eq!(t.leaves.len(), 3);
        assert_eq!(t.branches.len(), 2);

        for k in [b"10".to_vec(), b"12".to_vec(), b"2".to_vec()] {
            assert!(t.delete(&k));
        }
        assert!(t.is_empty());
        assert_eq!(t.root, None);
        assert_eq!(t.branch_count(), 0);
    }

    #[test]
    fn walk_matches_sorted_input() {
        let mut t = CritBitTrie::new();
        let mut ks: Vec<Vec<u8>> = (0..500u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> (i % 7)).to_be_bytes())
            .map(|b| b[..(b[3] % 4) as usize + 1].to_vec())
            .collect();
        for (i, k) in ks.iter().enumerate() {
            t.insert(k.clone(), i);
        }
        ks.sort();
        ks.dedup();
        assert_eq!(t.len(), ks.len());
        assert_eq!(t.branch_count(), ks.len() - 1);
        assert_eq!(keys(&t), ks);
    }
}
