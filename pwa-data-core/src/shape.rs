//! Shape queries over the leaves of a tree

use crate::error::{Error, Result};
use crate::key::{Key, Path};
use crate::leaf::{resolve_axis, ArrayLeaf};
use crate::tree::Tree;

/// Extent along `axis` of the first leaf in depth-first order
///
/// Only the first leaf is inspected; use [`data_shape_all`] to check that
/// every leaf agrees.
pub fn data_shape<L: ArrayLeaf>(tree: &Tree<L>, axis: isize) -> Result<usize> {
    let (path, leaf) = first_leaf(tree, Path::root()).ok_or(Error::EmptyTree)?;
    let shape = leaf.shape();
    let resolved = resolve_axis(axis, shape.len()).map_err(|_| Error::IndexOutOfRange {
        path,
        index: axis as i64,
        len: shape.len(),
    })?;
    Ok(shape[resolved])
}

/// Full shape of every leaf, in depth-first order
pub fn data_shape_all<L: ArrayLeaf>(tree: &Tree<L>) -> Vec<Vec<usize>> {
    tree.leaves().map(ArrayLeaf::shape).collect()
}

fn first_leaf<L>(node: &Tree<L>, path: Path) -> Option<(Path, &L)> {
    match node {
        Tree::Leaf(value) => Some((path, value)),
        Tree::Mapping(mapping) => mapping
            .iter()
            .find_map(|(k, v)| first_leaf(v, path.child(k.clone()))),
        Tree::Sequence(items) | Tree::Tuple(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| first_leaf(v, path.child(Key::from(i)))),
    }
}
