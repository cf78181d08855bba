//! A mutable radix tree with compressed edges.
//!
//! Every node holds the label of the edge that leads to it. A node that is
//! not the root either carries a value or has at least two children; when a
//! removal leaves a node with a single child and no value, the two are
//! merged.

use super::{StorageBackend, Walk};

//------------ Node ----------------------------------------------------------

#[derive(Debug)]
struct Node<K, V> {
    prefix: Vec<u8>,
    leaf: Option<(K, V)>,
    // Sorted by the first byte of the child's prefix.
    edges: Vec<Edge<K, V>>,
}

#[derive(Debug)]
struct Edge<K, V> {
    label: u8,
    node: Box<Node<K, V>>,
}

impl<K, V> Node<K, V> {
    fn new(prefix: Vec<u8>, leaf: Option<(K, V)>) -> Self {
        Self {
            prefix,
            leaf,
            edges: Vec::new(),
        }
    }

    fn edge(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by_key(&label, |e| e.label)
    }

    // `node` must have a non-empty prefix that no other child starts with.
    fn add_edge(&mut self, node: Box<Node<K, V>>) {
        if let Some(&label) = node.prefix.first() {
            if let Err(pos) = self.edge(label) {
                self.edges.insert(pos, Edge { label, node });
            }
        }
    }

    // Pulls the only child up into this node.
    fn merge_child(&mut self) {
        if let Some(edge) = self.edges.pop() {
            let child = *edge.node;
            self.prefix.extend_from_slice(&child.prefix);
            self.leaf = child.leaf;
            self.edges = child.edges;
        }
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

//------------ RadixTrie -----------------------------------------------------

#[derive(Debug)]
pub struct RadixTrie<K, V> {
    root: Node<K, V>,
    len: usize,
}

impl<K, V> Default for RadixTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RadixTrie<K, V> {
    pub fn new() -> Self {
        Self {
            root: Node::new(Vec::new(), None),
            len: 0,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: vec![&self.root],
        }
    }
}

impl<K: AsRef<[u8]>, V> RadixTrie<K, V> {
    fn insert_at(
        node: &mut Node<K, V>,
        search: &[u8],
        key: K,
        value: V,
    ) -> Option<V> {
        let Some(&label) = search.first() else {
            return match node.leaf.as_mut() {
                Some((_, v)) => Some(std::mem::replace(v, value)),
                None => {
                    node.leaf = Some((key, value));
                    None
                }
            };
        };

        let idx = match node.edge(label) {
            Ok(idx) => idx,
            Err(pos) => {
                let leaf = Node::new(search.to_vec(), Some((key, value)));
                node.edges.insert(
                    pos,
                    Edge {
                        label,
                        node: Box::new(leaf),
                    },
                );
                return None;
            }
        };

        let child = &mut node.edges.get_mut(idx)?.node;
        let common = common_prefix_len(search, &child.prefix);
        let (head, rest) = search.split_at(common);
        if common == child.prefix.len() {
            return Self::insert_at(child, rest, key, value);
        }

        // The key leaves the edge half way: split it.
        let split = Box::new(Node::new(head.to_vec(), None));
        let mut old = std::mem::replace(child, split);
        old.prefix.drain(..common);

        let split = child;
        split.add_edge(old);
        if rest.is_empty() {
            split.leaf = Some((key, value));
        } else {
            split.add_edge(Box::new(Node::new(
                rest.to_vec(),
                Some((key, value)),
            )));
        }
        None
    }

    fn remove_at(node: &mut Node<K, V>, search: &[u8]) -> Option<V> {
        let Some(&label) = search.first() else {
            return node.leaf.take().map(|(_, v)| v);
        };

        let idx = node.edge(label).ok()?;
        let child = &mut node.edges.get_mut(idx)?.node;
        let rest = search.strip_prefix(child.prefix.as_slice())?;
        let removed = Self::remove_at(child, rest)?;

        if child.leaf.is_none() {
            match child.edges.len() {
                0 => {
                    node.edges.remove(idx);
                }
                1 => child.merge_child(),
                _ => {}
            }
        }
        Some(removed)
    }
}

impl<K: AsRef<[u8]>, V> StorageBackend<V> for RadixTrie<K, V> {
    type Key = K;

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        // The key is moved into the leaf, so search on a copy of its bytes.
        let search = key.as_ref().to_vec();
        let old = Self::insert_at(&mut self.root, &search, key, value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let old = Self::remove_at(&mut self.root, key.as_ref());
        if old.is_some() {
            self.len -= 1;
        }
        old
    }

    fn get(&self, key: &K) -> Option<&V> {
        let mut node = &self.root;
        let mut search = key.as_ref();
        while let Some(&label) = search.first() {
            let idx = node.edge(label).ok()?;
            node = &*node.edges.get(idx)?.node;
            search = search.strip_prefix(node.prefix.as_slice())?;
        }
        node.leaf.as_ref().map(|(_, v)| v)
    }

    fn walk(&self) -> Walk<'_, K, V> {
        Box::new(self.iter())
    }

    fn len(&self) -> usize {
        self.len
    }
}

//------------ Iter ----------------------------------------------------------

/// Depth first, values before children, children in label order: this
/// yields the keys in lexicographic order.
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.stack
                .extend(node.edges.iter().rev().map(|e| &*e.node));
            if let Some((k, v)) = &node.leaf {
                return Some((k, v));
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
impl<K, V> RadixTrie<K, V> {
    // Checks the shape invariants and returns the number of nodes.
    fn check(&self) -> usize {
        fn visit<K, V>(node: &Node<K, V>, is_root: bool) -> usize {
            if !is_root {
                assert!(!node.prefix.is_empty());
                assert!(node.leaf.is_some() || node.edges.len() >= 2);
            }
            assert!(node.edges.windows(2).all(|w| w[0].label < w[1].label));
            1 + node
                .edges
                .iter()
                .map(|e| {
                    assert_eq!(Some(&e.label), e.node.prefix.first());
                    visit(&e.node, false)
                })
                .sum::<usize>()
        }
        visit(&self.root, true)
    }
}
