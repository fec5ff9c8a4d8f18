//! Structure-preserving maps over the leaves of a tree

use crate::error::{Error, LeafError, Result};
use crate::key::{Key, Path};
use crate::leaf::ArrayLeaf;
use crate::tree::{Mapping, Tree};

/// Apply `f` to every leaf, rebuilding a tree of identical structure
///
/// `f` is called exactly once per leaf, in depth-first insertion order.
/// Extra arguments are passed by capturing them in the closure.
pub fn data_map<L, U, F>(tree: &Tree<L>, mut f: F) -> Tree<U>
where
    F: FnMut(&L) -> U,
{
    map_node(tree, &mut f)
}

fn map_node<L, U, F>(node: &Tree<L>, f: &mut F) -> Tree<U>
where
    F: FnMut(&L) -> U,
{
    match node {
        Tree::Mapping(mapping) => Tree::Mapping(Mapping::from_unique(
            mapping.iter().map(|(k, v)| (k.clone(), map_node(v, f))).collect(),
        )),
        Tree::Sequence(items) => Tree::Sequence(items.iter().map(|v| map_node(v, f)).collect()),
        Tree::Tuple(items) => Tree::Tuple(items.iter().map(|v| map_node(v, f)).collect()),
        Tree::Leaf(value) => Tree::Leaf(f(value)),
    }
}

/// Apply a fallible `f` to every leaf
///
/// Stops at the first failing leaf and reports it as [`Error::Leaf`] with the
/// leaf's path.
pub fn try_data_map<L, U, F>(tree: &Tree<L>, mut f: F) -> Result<Tree<U>>
where
    F: FnMut(&L) -> std::result::Result<U, LeafError>,
{
    try_map_node(tree, &Path::root(), &mut f)
}

fn try_map_node<L, U, F>(node: &Tree<L>, path: &Path, f: &mut F) -> Result<Tree<U>>
where
    F: FnMut(&L) -> std::result::Result<U, LeafError>,
{
    match node {
        Tree::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, value) in mapping.iter() {
                entries.push((key.clone(), try_map_node(value, &path.child(key.clone()), f)?));
            }
            Ok(Tree::Mapping(Mapping::from_unique(entries)))
        }
        Tree::Sequence(items) => Ok(Tree::Sequence(try_map_items(items, path, f)?)),
        Tree::Tuple(items) => Ok(Tree::Tuple(try_map_items(items, path, f)?)),
        Tree::Leaf(value) => f(value).map(Tree::Leaf).map_err(|e| Error::leaf(path, e)),
    }
}

fn try_map_items<L, U, F>(items: &[Tree<L>], path: &Path, f: &mut F) -> Result<Vec<Tree<U>>>
where
    F: FnMut(&L) -> std::result::Result<U, LeafError>,
{
    items
        .iter()
        .enumerate()
        .map(|(i, v)| try_map_node(v, &path.child(Key::from(i)), f))
        .collect()
}

/// Keep the rows selected by `mask` in every leaf
pub fn data_mask<L: ArrayLeaf>(tree: &Tree<L>, mask: &[bool]) -> Result<Tree<L>> {
    try_data_map(tree, |leaf| leaf.boolean_mask(mask))
}

impl<L> Tree<L> {
    /// Method form of [`data_map`]
    pub fn map<U>(&self, f: impl FnMut(&L) -> U) -> Tree<U> {
        data_map(self, f)
    }

    /// Method form of [`try_data_map`]
    pub fn try_map<U>(&self, f: impl FnMut(&L) -> std::result::Result<U, LeafError>) -> Result<Tree<U>> {
        try_data_map(self, f)
    }
}
