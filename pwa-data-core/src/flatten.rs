//! Collapsing a tree into a single level of composite keys

use crate::error::{Error, Result};
use crate::key::{Key, Path};
use crate::tree::Tree;

/// Single-level, insertion-ordered view of the leaves of a tree
///
/// Lookups and inserts scan the entries linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatData<'a, L> {
    entries: Vec<(Key, &'a L)>,
}

impl<'a, L> FlatData<'a, L> {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    // a repeated key overwrites the earlier value but keeps its position
    fn insert(&mut self, key: Key, value: &'a L) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a flattened key
    pub fn get(&self, key: &Key) -> Option<&'a L> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &'a L)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no leaves were found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the leaves into a one-level mapping tree
    pub fn to_tree(&self) -> Tree<L>
    where
        L: Clone,
    {
        Tree::mapping(self.entries.iter().map(|(k, v)| (k.clone(), Tree::leaf((*v).clone()))))
    }
}

impl<'a, L> IntoIterator for FlatData<'a, L> {
    type Item = (Key, &'a L);
    type IntoIter = std::vec::IntoIter<(Key, &'a L)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Default key formatter, joining parent and child as `parent/child`
pub fn join_keys(parent: &Key, child: &Key) -> Key {
    Key::Name(format!("{parent}/{child}"))
}

/// Flatten with the default `parent/child` key formatter
pub fn flatten_dict_data<L>(tree: &Tree<L>) -> Result<FlatData<'_, L>> {
    flatten_dict_data_with(tree, join_keys)
}

/// Flatten, naming nested leaves with `fmt(parent, child)` at every level
///
/// `fmt` joins keys at every nesting depth, so a leaf three levels down is
/// named `fmt(fmt(a, b), c)`. Inner levels never fall back to `parent/child`
/// when a custom formatter is given. A leaf directly under a container keeps
/// its own key. Empty containers contribute nothing.
pub fn flatten_dict_data_with<'a, L, F>(tree: &'a Tree<L>, fmt: F) -> Result<FlatData<'a, L>>
where
    F: Fn(&Key, &Key) -> Key,
{
    if tree.is_leaf() {
        return Err(Error::StructureMismatch {
            path: Path::root(),
            reason: "a bare leaf cannot be flattened".into(),
        });
    }
    let mut out = FlatData::new();
    flatten_container(tree, &fmt, &mut out);
    Ok(out)
}

fn flatten_container<'a, L, F>(node: &'a Tree<L>, fmt: &F, out: &mut FlatData<'a, L>)
where
    F: Fn(&Key, &Key) -> Key,
{
    let children: Vec<(Key, &'a Tree<L>)> = match node {
        Tree::Mapping(mapping) => mapping.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Tree::Sequence(items) | Tree::Tuple(items) => items.iter().enumerate().map(|(i, v)| (Key::from(i), v)).collect(),
        Tree::Leaf(_) => return,
    };

    for (key, child) in children {
        match child {
            Tree::Leaf(value) => out.insert(key, value),
            _ => {
                let mut inner = FlatData::new();
                flatten_container(child, fmt, &mut inner);
                for (sub_key, value) in inner {
                    out.insert(fmt(&key, &sub_key), value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ParticleKey;

    #[test]
    fn test_flatten_default_format() {
        let tree = Tree::mapping([("A", Tree::mapping([("p", Tree::leaf(1)), ("m", Tree::leaf(2))]))]);
        let flat = flatten_dict_data(&tree).unwrap();

        let keys: Vec<String> = flat.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["A/p", "A/m"]);
        assert_eq!(flat.get(&Key::from("A/p")), Some(&1));
        assert_eq!(flat.get(&Key::from("A/m")), Some(&2));
    }

    #[test]
    fn test_flatten_keeps_leaf_keys_and_indices() {
        let tree = Tree::mapping([
            ("weight", Tree::leaf(0)),
            ("decay", Tree::sequence([Tree::tuple([Tree::leaf(1), Tree::leaf(2)])])),
            ("empty", Tree::sequence([])),
        ]);
        let flat = flatten_dict_data(&tree).unwrap();
        let keys: Vec<String> = flat.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["weight", "decay/0/0", "decay/0/1"]);
        assert_eq!(flat.get(&Key::from("weight")), Some(&0));
    }

    #[test]
    fn test_flatten_top_level_typed_key_untouched() {
        let tree = Tree::mapping([(ParticleKey::new("B"), Tree::leaf(5))]);
        let flat = flatten_dict_data(&tree).unwrap();
        assert_eq!(flat.get(&ParticleKey::new("B").into()), Some(&5));
    }

    #[test]
    fn test_flatten_custom_format_applies_at_every_level() {
        let tree = Tree::mapping([("a", Tree::mapping([("b", Tree::mapping([("c", Tree::leaf(1))]))]))]);
        let flat = flatten_dict_data_with(&tree, |p, c| Key::Name(format!("{p}.{c}"))).unwrap();
        assert_eq!(flat.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>(), vec!["a.b.c"]);
    }

    #[test]
    fn test_flatten_collision_overwrites_in_place() {
        let tree = Tree::mapping([
            ("a/b", Tree::leaf(1)),
            ("x", Tree::leaf(2)),
            ("a", Tree::mapping([("b", Tree::leaf(3))])),
        ]);
        let flat = flatten_dict_data(&tree).unwrap();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.iter().next(), Some((&Key::from("a/b"), &3)));
    }

    #[test]
    fn test_flatten_bare_leaf() {
        assert!(matches!(flatten_dict_data(&Tree::leaf(1)), Err(Error::StructureMismatch { .. })));
    }

    #[test]
    fn test_flatten_to_tree() {
        let tree = Tree::mapping([("A", Tree::mapping([("p", Tree::leaf(1))]))]);
        let flat = flatten_dict_data(&tree).unwrap().to_tree();
        assert_eq!(flat, Tree::mapping([("A/p", Tree::leaf(1))]));
    }
}
