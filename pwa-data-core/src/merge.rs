//! Leaf-wise merging of several trees of the same structure

use tracing::debug;

use crate::error::{Error, Result};
use crate::key::{Key, Path};
use crate::leaf::ArrayLeaf;
use crate::tree::{Mapping, NodeKind, Tree};

/// Merge trees by concatenating corresponding leaves along `axis`
///
/// Mapping nodes keep only the keys present in every input, in the order of
/// the first input. Sequences and tuples must agree in length. A negative
/// `axis` counts from the last dimension of each leaf.
pub fn data_merge<'a, L, I>(trees: I, axis: isize) -> Result<Tree<L>>
where
    L: ArrayLeaf + 'a,
    I: IntoIterator<Item = &'a Tree<L>>,
{
    let trees: Vec<&Tree<L>> = trees.into_iter().collect();
    if trees.is_empty() {
        return Err(Error::Configuration("data_merge requires at least one tree".into()));
    }
    merge_nodes(&trees, axis, &Path::root())
}

fn merge_nodes<L: ArrayLeaf>(nodes: &[&Tree<L>], axis: isize, path: &Path) -> Result<Tree<L>> {
    let kind = nodes[0].kind();
    if let Some(other) = nodes.iter().find(|n| n.kind() != kind) {
        return Err(Error::kind_mismatch(path, kind, other.kind()));
    }

    match kind {
        NodeKind::Mapping => {
            let mappings: Vec<&Mapping<L>> = nodes.iter().filter_map(|n| n.as_mapping()).collect();
            merge_mappings(&mappings, axis, path).map(Tree::Mapping)
        }
        NodeKind::Sequence => merge_items(nodes, axis, path).map(Tree::Sequence),
        NodeKind::Tuple => merge_items(nodes, axis, path).map(Tree::Tuple),
        NodeKind::Leaf => {
            let leaves: Vec<&L> = nodes.iter().filter_map(|n| n.as_leaf()).collect();
            L::concat(&leaves, axis)
                .map(Tree::Leaf)
                .map_err(|e| Error::leaf(path, e))
        }
    }
}

fn merge_mappings<L: ArrayLeaf>(mappings: &[&Mapping<L>], axis: isize, path: &Path) -> Result<Mapping<L>> {
    let Some((first, rest)) = mappings.split_first() else {
        return Ok(Mapping::new());
    };
    let mut entries = Vec::with_capacity(first.len());

    for (key, value) in first.iter() {
        let mut children = Vec::with_capacity(mappings.len());
        children.push(value);
        for other in rest {
            match other.get(key) {
                Some(child) => children.push(child),
                None => break,
            }
        }
        if children.len() < mappings.len() {
            debug!(%path, %key, "dropping key missing from some merged trees");
            continue;
        }
        entries.push((key.clone(), merge_nodes(&children, axis, &path.child(key.clone()))?));
    }

    Ok(Mapping::from_unique(entries))
}

fn merge_items<L: ArrayLeaf>(nodes: &[&Tree<L>], axis: isize, path: &Path) -> Result<Vec<Tree<L>>> {
    let len = nodes[0].len();
    if let Some(other) = nodes.iter().find(|n| n.len() != len) {
        return Err(Error::StructureMismatch {
            path: path.clone(),
            reason: format!("{} length {} differs from {}", nodes[0].kind(), other.len(), len),
        });
    }

    (0..len)
        .map(|i| {
            let children: Vec<&Tree<L>> = nodes
                .iter()
                .filter_map(|n| match n {
                    Tree::Sequence(items) | Tree::Tuple(items) => items.get(i),
                    _ => None,
                })
                .collect();
            merge_nodes(&children, axis, &path.child(Key::from(i)))
        })
        .collect()
}
