//! The tree data model: nested mappings, sequences and tuples over opaque leaves

use std::fmt;

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::key::Key;

/// Container kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Keyed mapping
    Mapping,
    /// Ordered sequence
    Sequence,
    /// Fixed-arity tuple
    Tuple,
    /// Opaque leaf value
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Tuple => "tuple",
            NodeKind::Leaf => "leaf",
        };
        f.write_str(name)
    }
}

/// A schema-free tree whose terminal values are leaves of type `L`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tree<L> {
    /// Insertion-ordered mapping from key to subtree
    Mapping(Mapping<L>),

    /// Ordered sequence of subtrees
    Sequence(Vec<Tree<L>>),

    /// Fixed-arity tuple of subtrees
    Tuple(Vec<Tree<L>>),

    /// Terminal value
    Leaf(L),
}

assert_impl_all!(Tree<ndarray::ArrayD<f64>>: Send, Sync, Clone);

impl<L> Tree<L> {
    /// Wrap a leaf value
    pub fn leaf(value: L) -> Self {
        Tree::Leaf(value)
    }

    /// Build a mapping node from key/subtree pairs
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Tree<L>)>,
    {
        Tree::Mapping(entries.into_iter().collect())
    }

    /// Build a sequence node
    pub fn sequence(items: impl IntoIterator<Item = Tree<L>>) -> Self {
        Tree::Sequence(items.into_iter().collect())
    }

    /// Build a tuple node
    pub fn tuple(items: impl IntoIterator<Item = Tree<L>>) -> Self {
        Tree::Tuple(items.into_iter().collect())
    }

    /// Classify this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Tree::Mapping(_) => NodeKind::Mapping,
            Tree::Sequence(_) => NodeKind::Sequence,
            Tree::Tuple(_) => NodeKind::Tuple,
            Tree::Leaf(_) => NodeKind::Leaf,
        }
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// The leaf value, if this node is a leaf
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// The mapping, if this node is a mapping
    pub fn as_mapping(&self) -> Option<&Mapping<L>> {
        match self {
            Tree::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Number of direct children (zero for a leaf)
    pub fn len(&self) -> usize {
        match self {
            Tree::Mapping(mapping) => mapping.len(),
            Tree::Sequence(items) | Tree::Tuple(items) => items.len(),
            Tree::Leaf(_) => 0,
        }
    }

    /// Whether this node has no children
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all leaves in depth-first insertion order
    pub fn leaves(&self) -> Leaves<'_, L> {
        Leaves { stack: vec![self] }
    }
}

/// Depth-first iterator over the leaves of a tree
pub struct Leaves<'a, L> {
    stack: Vec<&'a Tree<L>>,
}

impl<'a, L> Iterator for Leaves<'a, L> {
    type Item = &'a L;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Tree::Leaf(value) => return Some(value),
                Tree::Mapping(mapping) => self.stack.extend(mapping.values().rev()),
                Tree::Sequence(items) | Tree::Tuple(items) => self.stack.extend(items.iter().rev()),
            }
        }
        None
    }
}

/// Insertion-ordered map from [`Key`] to subtree
///
/// Keys are unique: inserting an existing key replaces its value in place,
/// and deserialized entries go through the same rule. Lookups scan the
/// entries linearly, so `insert` and `get` are O(n) and building a mapping is
/// O(n²); mappings here hold a handful of particles or decays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MappingEntries<L>")]
pub struct Mapping<L> {
    entries: Vec<(Key, Tree<L>)>,
}

// wire form of a mapping; may carry duplicate keys until folded by `insert`
#[derive(Deserialize)]
struct MappingEntries<L> {
    entries: Vec<(Key, Tree<L>)>,
}

impl<L> From<MappingEntries<L>> for Mapping<L> {
    fn from(wire: MappingEntries<L>) -> Self {
        wire.entries.into_iter().collect()
    }
}

impl<L> Mapping<L> {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty mapping with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a mapping from entries whose keys are already known to be unique
    pub(crate) fn from_unique(entries: Vec<(Key, Tree<L>)>) -> Self {
        Self { entries }
    }

    /// Insert an entry, returning the previous value for the key
    pub fn insert(&mut self, key: impl Into<Key>, value: Tree<L>) -> Option<Tree<L>> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up a key by exact equality
    pub fn get(&self, key: &Key) -> Option<&Tree<L>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Look up a key by exact equality, mutably
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Tree<L>> {
        self.position(key).map(move |i| &mut self.entries[i].1)
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &Key) -> bool {
        self.position(key).is_some()
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Tree<L>> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Key, &Tree<L>)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L> Default for Mapping<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, K: Into<Key>> FromIterator<(K, Tree<L>)> for Mapping<L> {
    fn from_iter<I: IntoIterator<Item = (K, Tree<L>)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl<L> IntoIterator for Mapping<L> {
    type Item = (Key, Tree<L>);
    type IntoIter = std::vec::IntoIter<(Key, Tree<L>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
