//! A persistent radix tree.
//!
//! Nodes are shared through `Arc`. An insert or remove copies only the nodes
//! on the path from the root to the changed node and returns a new tree;
//! every tree obtained earlier stays valid and keeps answering lookups with
//! the contents it had.
//!
//! The shape is the same as that of the mutable [RadixTrie]: compressed
//! edges, and no node besides the root without a value and with fewer than
//! two children.
//!
//! [RadixTrie]: super::RadixTrie

use std::sync::Arc;

use super::{StorageBackend, Walk};

//------------ Node ----------------------------------------------------------

#[derive(Debug)]
struct Node<K, V> {
    prefix: Vec<u8>,
    leaf: Option<Arc<(K, V)>>,
    edges: Vec<Edge<K, V>>,
}

#[derive(Debug)]
struct Edge<K, V> {
    label: u8,
    node: Arc<Node<K, V>>,
}

// Cloning a node is shallow: the leaf and the children are shared.
impl<K, V> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            leaf: self.leaf.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl<K, V> Clone for Edge<K, V> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            node: Arc::clone(&self.node),
        }
    }
}

impl<K, V> Node<K, V> {
    fn new(prefix: Vec<u8>, leaf: Option<Arc<(K, V)>>) -> Self {
        Self {
            prefix,
            leaf,
            edges: Vec::new(),
        }
    }

    fn edge(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by_key(&label, |e| e.label)
    }

    fn add_edge(&mut self, node: Node<K, V>) {
        if let Some(&label) = node.prefix.first() {
            if let Err(pos) = self.edge(label) {
                self.edges.insert(
                    pos,
                    Edge {
                        label,
                        node: Arc::new(node),
                    },
                );
            }
        }
    }

    // The child whose prefix starts with `label`, and its edge index.
    fn child(&self, label: u8) -> Option<(usize, &Node<K, V>)> {
        let idx = self.edge(label).ok()?;
        self.edges.get(idx).map(|e| (idx, &*e.node))
    }

    fn replace_child(&mut self, idx: usize, node: Node<K, V>) {
        if let Some(edge) = self.edges.get_mut(idx) {
            edge.node = Arc::new(node);
        }
    }

    fn merge_child(&mut self) {
        if let Some(edge) = self.edges.pop() {
            self.prefix.extend_from_slice(&edge.node.prefix);
            self.leaf = edge.node.leaf.clone();
            self.edges = edge.node.edges.clone();
        }
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

//------------ ImmutableRadixTrie --------------------------------------------

#[derive(Debug)]
pub struct ImmutableRadixTrie<K, V> {
    root: Arc<Node<K, V>>,
    len: usize,
}

// A clone is a snapshot: it shares the whole tree.
impl<K, V> Clone for ImmutableRadixTrie<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            len: self.len,
        }
    }
}

impl<K, V> Default for ImmutableRadixTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ImmutableRadixTrie<K, V> {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Node::new(Vec::new(), None)),
            len: 0,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: vec![&*self.root],
        }
    }

    /// Returns whether both trees are the very same version.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<K: AsRef<[u8]>, V> ImmutableRadixTrie<K, V> {
    /// Returns a new tree with `value` stored for `key`, and the value
    /// `key` had in this tree, if any. This tree is left as it is.
    pub fn inserted(&self, key: K, value: V) -> (Self, Option<&V>) {
        let search = key.as_ref().to_vec();
        let (root, old) =
            Self::insert_at(&self.root, &search, Arc::new((key, value)));
        let len = if old.is_some() { self.len } else { self.len + 1 };
        let old = old.and_then(|_| self.get_bytes(&search));
        (
            Self {
                root: Arc::new(root),
                len,
            },
            old,
        )
    }

    /// Returns a new tree without `key`, and the value `key` had in this
    /// tree. If `key` isn't present the new tree is this tree.
    pub fn removed(&self, key: &K) -> (Self, Option<&V>) {
        match Self::remove_at(&self.root, key.as_ref(), true) {
            Some((root, _)) => (
                Self {
                    root: Arc::new(root.unwrap_or_else(|| {
                        Node::new(Vec::new(), None)
                    })),
                    len: self.len - 1,
                },
                self.get_bytes(key.as_ref()),
            ),
            None => (self.clone(), None),
        }
    }

    fn get_bytes(&self, key: &[u8]) -> Option<&V> {
        let mut node: &Node<K, V> = &self.root;
        let mut search = key;
        while let Some(&label) = search.first() {
            node = node.child(label)?.1;
            search = search.strip_prefix(node.prefix.as_slice())?;
        }
        node.leaf.as_deref().map(|(_, v)| v)
    }

    fn insert_at(
        node: &Node<K, V>,
        search: &[u8],
        leaf: Arc<(K, V)>,
    ) -> (Node<K, V>, Option<Arc<(K, V)>>) {
        let mut new = node.clone();
        let Some(&label) = search.first() else {
            let old = new.leaf.replace(leaf);
            return (new, old);
        };

        let Some((idx, child)) = node.child(label) else {
            new.add_edge(Node::new(search.to_vec(), Some(leaf)));
            return (new, None);
        };

        let common = common_prefix_len(search, &child.prefix);
        let (head, rest) = search.split_at(common);
        if common == child.prefix.len() {
            let (child, old) = Self::insert_at(child, rest, leaf);
            new.replace_child(idx, child);
            return (new, old);
        }

        // Split the edge. The old child gets a shorter label, its subtree
        // stays shared.
        let mut moved = Node::clone(child);
        moved.prefix.drain(..common);
        let mut split = Node::new(head.to_vec(), None);
        split.add_edge(moved);
        if rest.is_empty() {
            split.leaf = Some(leaf);
        } else {
            split.add_edge(Node::new(rest.to_vec(), Some(leaf)));
        }
        new.replace_child(idx, split);
        (new, None)
    }

    // Returns `None` if the key is absent. Otherwise returns the copy that
    // replaces `node` (`None` if the node goes away entirely) and the
    // removed leaf.
    #[allow(clippy::type_complexity)]
    fn remove_at(
        node: &Node<K, V>,
        search: &[u8],
        is_root: bool,
    ) -> Option<(Option<Node<K, V>>, Arc<(K, V)>)> {
        let Some(&label) = search.first() else {
            let leaf = node.leaf.clone()?;
            let mut new = node.clone();
            new.leaf = None;
            return Some((Self::tidy(new, is_root), leaf));
        };

        let (idx, child) = node.child(label)?;
        let rest = search.strip_prefix(child.prefix.as_slice())?;
        let (replacement, leaf) = Self::remove_at(child, rest, false)?;

        let mut new = node.clone();
        match replacement {
            Some(child) => new.replace_child(idx, child),
            None => {
                new.edges.remove(idx);
            }
        }
        Some((Self::tidy(new, is_root), leaf))
    }

    fn tidy(mut node: Node<K, V>, is_root: bool) -> Option<Node<K, V>> {
        if is_root || node.leaf.is_some() {
            return Some(node);
        }
        match node.edges.len() {
            0 => None,
            1 => {
                node.merge_child();
                Some(node)
            }
            _ => Some(node),
        }
    }
}

impl<K: AsRef<[u8]>, V: Clone> StorageBackend<V> for ImmutableRadixTrie<K, V> {
    type Key = K;

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (next, old) = self.inserted(key, value);
        let old = old.cloned();
        *self = next;
        old
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (next, old) = self.removed(key);
        let old = old.cloned();
        *self = next;
        old
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.get_bytes(key.as_ref())
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
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.stack
                .extend(node.edges.iter().rev().map(|e| &*e.node));
            if let Some(leaf) = node.leaf.as_deref() {
                return Some((&leaf.0, &leaf.1));
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn keys<V>(t: &ImmutableRadixTrie<&'static str, V>) -> Vec<&'static str> {
        t.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn old_versions_stay_intact() {
        let t0 = ImmutableRadixTrie::new();
        let (t1, _) = t0.inserted("foo", 1);
        let (t2, _) = t1.inserted("foobar", 2);
        let (t3, old) = t2.inserted("foo", 3);
        assert_eq!(old, Some(&1));

        assert!(t0.is_empty());
        assert_eq!(t1.get(&"foo"), Some(&1));
        assert_eq!(t1.get(&"foobar"), None);
        assert_eq!(t2.get(&"foo"), Some(&1));
        assert_eq!(t3.get(&"foo"), Some(&3));
        assert_eq!(t3.len(), 2);

        let (t4, removed) = t3.removed(&"foobar");
        assert_eq!(removed, Some(&2));
        assert_eq!(t4.get(&"foobar"), None);
        assert_eq!(t3.get(&"foobar"), Some(&2));
        assert_eq!(t2.len(), 2);
        assert_eq!(t4.len(), 1);
    }

    #[test]
    fn remove_absent_returns_same_version() {
        let (t, _) = ImmutableRadixTrie::new().inserted("abc", 1);
        let (t2, removed) = t.removed(&"abd");
        assert_eq!(removed, None);
        assert!(t.ptr_eq(&t2));
    }

    #[test]
    fn untouched_subtrees_are_shared() {
        let mut t = ImmutableRadixTrie::new();
        for k in ["apple", "apricot", "banana", "blueberry"] {
            t.insert(k, k.len());
        }
        let (next, _) = t.inserted("avocado", 7);

        let b_old = &t.root.edges[t.root.edge(b'b').unwrap_or(0)].node;
        let b_new = &next.root.edges[next.root.edge(b'b').unwrap_or(0)].node;
        assert!(Arc::ptr_eq(b_old, b_new));
        assert!(!t.ptr_eq(&next));
    }

    #[test]
    fn walk_in_order_after_removals() {
        let mut t = ImmutableRadixTrie::new();
        for (i, k) in ["team", "test", "toast", "te", "t"].into_iter().enumerate()
        {
            t.insert(k, i);
        }
        assert_eq!(keys(&t), vec!["t", "te", "team", "test", "toast"]);
        assert!(t.delete(&"te"));
        assert!(t.delete(&"team"));
        assert!(!t.delete(&"team"));
        assert_eq!(keys(&t), vec!["t", "test", "toast"]);
        assert_eq!(t.len(), 3);
        for k in ["t", "test", "toast"] {
            assert!(t.delete(&k));
        }
        assert!(t.is_empty());
        assert!(t.root.edges.is_empty());
    }
}
