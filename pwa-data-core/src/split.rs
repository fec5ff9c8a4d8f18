//! Synchronized splitting of every leaf of a tree into batches
//!
//! A [`TreeGenerator`] walks the tree once, turning every leaf into a stream
//! (for [`data_split`], a stream of batch slices) and every container into a
//! zip over its children's streams. Each item it yields is a tree of the same
//! structure holding the N-th element of every leaf stream.

use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, LeafError, Result};
use crate::key::{Key, Path};
use crate::leaf::{resolve_axis, ArrayLeaf};
use crate::tree::{Mapping, Tree};

/// Axis along which leaves are split
///
/// Written as the integer `0` or `-1` in serialized options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "isize", into = "isize")]
pub enum SplitAxis {
    /// The leading (batch) axis
    #[default]
    Front,

    /// The last axis of each leaf
    Back,
}

impl TryFrom<isize> for SplitAxis {
    type Error = Error;

    fn try_from(axis: isize) -> Result<Self> {
        match axis {
            0 => Ok(SplitAxis::Front),
            -1 => Ok(SplitAxis::Back),
            _ => Err(Error::Configuration(format!("unsupported split axis: {axis}"))),
        }
    }
}

impl From<SplitAxis> for isize {
    fn from(axis: SplitAxis) -> Self {
        match axis {
            SplitAxis::Front => 0,
            SplitAxis::Back => -1,
        }
    }
}

/// What a container does when its children's streams end at different steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZipPolicy {
    /// Stop as soon as any child stream is exhausted
    #[default]
    Shortest,

    /// Fail with [`Error::BatchMisaligned`] unless all children end together
    Strict,
}

/// Options for [`data_split_with`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Maximum number of entries per batch
    pub batch_size: usize,

    /// Axis to split along
    #[serde(default)]
    pub axis: SplitAxis,

    /// Handling of leaves with different batch extents
    #[serde(default)]
    pub policy: ZipPolicy,
}

impl SplitOptions {
    /// Options splitting the front axis into batches of `batch_size`
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            axis: SplitAxis::Front,
            policy: ZipPolicy::Shortest,
        }
    }

    /// Set the split axis
    pub fn with_axis(mut self, axis: SplitAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Set the zip policy
    pub fn with_policy(mut self, policy: ZipPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Successive slices of one leaf along an axis; the last slice may be shorter
pub struct LeafSlices<'a, L> {
    leaf: &'a L,
    batch_size: usize,
    state: SliceState,
}

enum SliceState {
    Ready { axis: usize, extent: usize, start: usize },
    Failed(Option<LeafError>),
}

impl<'a, L: ArrayLeaf> LeafSlices<'a, L> {
    /// Slice `leaf` into batches of `batch_size` along `axis`
    pub fn new(leaf: &'a L, batch_size: NonZeroUsize, axis: SplitAxis) -> Self {
        let shape = leaf.shape();
        let resolved = resolve_axis(isize::from(axis), shape.len());
        let state = match resolved {
            Ok(axis) => SliceState::Ready {
                axis,
                extent: shape[axis],
                start: 0,
            },
            Err(e) => SliceState::Failed(Some(e)),
        };
        Self {
            leaf,
            batch_size: batch_size.get(),
            state,
        }
    }
}

impl<'a, L: ArrayLeaf> Iterator for LeafSlices<'a, L> {
    type Item = std::result::Result<L, LeafError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            SliceState::Ready { axis, extent, start } => {
                if *start >= *extent {
                    return None;
                }
                let end = (*start + self.batch_size).min(*extent);
                let slice = self.leaf.slice_range(*axis, *start..end);
                *start = end;
                Some(slice)
            }
            SliceState::Failed(error) => error.take().map(Err),
        }
    }
}

type LeafStream<'a, T> = Box<dyn Iterator<Item = std::result::Result<T, LeafError>> + 'a>;

enum Layout {
    Mapping(Vec<Key>),
    Sequence,
    Tuple,
}

impl Layout {
    fn assemble<T>(&self, items: Vec<Tree<T>>) -> Tree<T> {
        match self {
            Layout::Mapping(keys) => Tree::Mapping(Mapping::from_unique(keys.iter().cloned().zip(items).collect())),
            Layout::Sequence => Tree::Sequence(items),
            Layout::Tuple => Tree::Tuple(items),
        }
    }
}

enum Cursor<'a, T> {
    Node {
        path: Path,
        layout: Layout,
        children: Vec<Cursor<'a, T>>,
    },
    Leaf {
        path: Path,
        stream: LeafStream<'a, T>,
    },
}

impl<'a, T> Cursor<'a, T> {
    fn build<L, F, I>(node: &'a Tree<L>, path: Path, f: &mut F) -> Self
    where
        F: FnMut(&'a L) -> I,
        I: IntoIterator<Item = std::result::Result<T, LeafError>>,
        I::IntoIter: 'a,
    {
        let (layout, children) = match node {
            Tree::Leaf(value) => {
                return Cursor::Leaf {
                    path,
                    stream: Box::new(f(value).into_iter()),
                }
            }
            Tree::Mapping(mapping) => {
                let children: Vec<Self> = mapping
                    .iter()
                    .map(|(k, v)| Cursor::build(v, path.child(k.clone()), f))
                    .collect();
                (Layout::Mapping(mapping.keys().cloned().collect()), children)
            }
            Tree::Sequence(items) => (Layout::Sequence, Self::build_items(items, &path, f)),
            Tree::Tuple(items) => (Layout::Tuple, Self::build_items(items, &path, f)),
        };
        Cursor::Node {
            path,
            layout,
            children,
        }
    }

    fn build_items<L, F, I>(items: &'a [Tree<L>], path: &Path, f: &mut F) -> Vec<Self>
    where
        F: FnMut(&'a L) -> I,
        I: IntoIterator<Item = std::result::Result<T, LeafError>>,
        I::IntoIter: 'a,
    {
        items
            .iter()
            .enumerate()
            .map(|(i, v)| Cursor::build(v, path.child(Key::from(i)), f))
            .collect()
    }

    fn step(&mut self, policy: ZipPolicy) -> Result<Option<Tree<T>>> {
        match self {
            Cursor::Leaf { path, stream } => match stream.next() {
                Some(Ok(value)) => Ok(Some(Tree::Leaf(value))),
                Some(Err(e)) => Err(Error::leaf(path, e)),
                None => Ok(None),
            },
            Cursor::Node {
                path,
                layout,
                children,
            } => {
                // a zip over nothing yields nothing
                if children.is_empty() {
                    return Ok(None);
                }
                let mut items = Vec::with_capacity(children.len());
                let mut exhausted = 0;
                for child in children.iter_mut() {
                    match child.step(policy)? {
                        Some(item) => items.push(item),
                        None if policy == ZipPolicy::Shortest => return Ok(None),
                        None => exhausted += 1,
                    }
                }
                if exhausted == children.len() {
                    return Ok(None);
                }
                if exhausted > 0 {
                    return Err(Error::BatchMisaligned { path: path.clone() });
                }
                Ok(Some(layout.assemble(items)))
            }
        }
    }
}

/// Lazy, single-pass sequence of trees assembled step by step from per-leaf streams
///
/// Nothing is computed until the generator is iterated. After an error or
/// exhaustion it keeps returning `None`.
pub struct TreeGenerator<'a, T> {
    root: Cursor<'a, T>,
    policy: ZipPolicy,
    produced: usize,
    done: bool,
}

impl<'a, T> TreeGenerator<'a, T> {
    /// Replace the zip policy
    pub fn with_policy(mut self, policy: ZipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The zip policy in effect
    pub fn policy(&self) -> ZipPolicy {
        self.policy
    }
}

impl<'a, T> Iterator for TreeGenerator<'a, T> {
    type Item = Result<Tree<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.root.step(self.policy) {
            Ok(Some(tree)) => {
                self.produced += 1;
                Some(Ok(tree))
            }
            Ok(None) => {
                trace!(batches = self.produced, "tree generator exhausted");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, T> FusedIterator for TreeGenerator<'a, T> {}

/// Turn every leaf into a stream with `f` and zip the streams through the tree
pub fn data_generator<'a, L, T, F, I>(tree: &'a Tree<L>, mut f: F) -> TreeGenerator<'a, T>
where
    F: FnMut(&'a L) -> I,
    I: IntoIterator<Item = std::result::Result<T, LeafError>>,
    I::IntoIter: 'a,
{
    TreeGenerator {
        root: Cursor::build(tree, Path::root(), &mut f),
        policy: ZipPolicy::default(),
        produced: 0,
        done: false,
    }
}

/// Split every leaf into batches of `batch_size` along `axis` (`0` or `-1`)
pub fn data_split<L: ArrayLeaf>(tree: &Tree<L>, batch_size: usize, axis: isize) -> Result<TreeGenerator<'_, L>> {
    let options = SplitOptions::new(batch_size).with_axis(SplitAxis::try_from(axis)?);
    data_split_with(tree, &options)
}

/// Split every leaf as described by `options`
pub fn data_split_with<'a, L: ArrayLeaf>(tree: &'a Tree<L>, options: &SplitOptions) -> Result<TreeGenerator<'a, L>> {
    let batch_size = NonZeroUsize::new(options.batch_size)
        .ok_or_else(|| Error::Configuration("batch size must be positive".into()))?;
    let axis = options.axis;
    Ok(data_generator(tree, move |leaf| LeafSlices::new(leaf, batch_size, axis)).with_policy(options.policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::data_index;
    use crate::path;
    use crate::shape::data_shape_all;
    use crate::tree::NodeKind;
    use ndarray::{Array, ArrayD, IxDyn};
    use std::cell::Cell;

    fn rows(n: usize, width: usize) -> Tree<ArrayD<f64>> {
        Tree::leaf(Array::from_shape_fn((n, width), |(i, j)| (i * width + j) as f64).into_dyn())
    }

    fn events(n: usize) -> Tree<ArrayD<f64>> {
        Tree::mapping([
            ("particle", Tree::mapping([("A", rows(n, 4)), ("B", rows(n, 4))])),
            ("decay", Tree::sequence([Tree::tuple([rows(n, 3), rows(n, 1)])])),
        ])
    }

    #[test]
    fn test_split_batch_sizes() {
        let tree = events(5);
        let batches: Vec<_> = data_split(&tree, 2, 0).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 3);

        let extents: Vec<usize> = batches.iter().map(|b| data_shape_all(b)[0][0]).collect();
        assert_eq!(extents, vec![2, 2, 1]);
        for batch in &batches {
            assert_eq!(batch.len(), 2);
            let decay = data_index(batch, path!["decay", 0]).unwrap();
            assert_eq!(decay.kind(), NodeKind::Tuple);
            assert_eq!(decay.len(), 2);
        }
    }

    #[test]
    fn test_split_back_axis() {
        let tree = Tree::mapping([("x", rows(2, 5))]);
        let shapes: Vec<Vec<usize>> = data_split(&tree, 2, -1)
            .unwrap()
            .map(|b| data_shape_all(&b.unwrap())[0].clone())
            .collect();
        assert_eq!(shapes, vec![vec![2, 2], vec![2, 2], vec![2, 1]]);
    }

    #[test]
    fn test_split_rejects_unsupported_axis() {
        let tree = events(3);
        assert!(matches!(data_split(&tree, 2, 1), Err(Error::Configuration(_))));
        assert!(matches!(data_split(&tree, 0, 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_shortest_policy_truncates() {
        let tree = Tree::mapping([("long", rows(6, 1)), ("short", rows(3, 1))]);
        let count = data_split(&tree, 2, 0).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_strict_policy_rejects_misaligned() {
        let tree = Tree::mapping([("long", rows(6, 1)), ("short", rows(3, 1))]);
        let options = SplitOptions::new(2).with_policy(ZipPolicy::Strict);
        let split = data_split_with(&tree, &options).unwrap();
        assert_eq!(split.policy(), ZipPolicy::Strict);
        let results: Vec<_> = split.collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[1].is_ok());
        match &results[2] {
            Err(Error::BatchMisaligned { path }) => assert_eq!(path, &Path::root()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_strict_policy_accepts_aligned() {
        let tree = events(4);
        let options = SplitOptions::new(3).with_policy(ZipPolicy::Strict);
        let batches: Vec<_> = data_split_with(&tree, &options).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_zero_extent_leaf_yields_nothing() {
        let empty = ArrayD::<f64>::zeros(IxDyn(&[0, 4]));
        let batch_size = NonZeroUsize::new(3).unwrap();
        assert_eq!(LeafSlices::new(&empty, batch_size, SplitAxis::Front).count(), 0);

        let tree = Tree::mapping([("p", Tree::leaf(empty))]);
        let split = data_split(&tree, 3, 0).unwrap();
        assert_eq!(split.policy(), ZipPolicy::Shortest);
        assert_eq!(split.count(), 0);

        // the other axis still has extent 4
        assert_eq!(data_split(&tree, 3, -1).unwrap().count(), 2);
    }

    #[test]
    fn test_empty_container_yields_nothing() {
        let tree = Tree::mapping([("x", rows(4, 1)), ("empty", Tree::sequence([]))]);
        assert_eq!(data_split(&tree, 1, 0).unwrap().count(), 0);
    }

    #[test]
    fn test_leaf_error_stops_generator() {
        let scalar = Tree::mapping([("s", Tree::leaf(ArrayD::from_elem(IxDyn(&[]), 1.0)))]);
        let mut split = data_split(&scalar, 1, 0).unwrap();
        match split.next() {
            Some(Err(Error::Leaf { path, source: LeafError::AxisOutOfRange { .. } })) => {
                assert_eq!(path, path!["s"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(split.next().is_none());
    }

    #[test]
    fn test_generator_is_lazy() {
        let pulls = Cell::new(0);
        let counter = &pulls;
        let tree = Tree::sequence([Tree::leaf(3usize), Tree::leaf(3usize)]);
        let mut stream = data_generator(&tree, |&n| {
            (0..n).map(move |i| {
                counter.set(counter.get() + 1);
                Ok::<_, LeafError>(i)
            })
        });
        assert_eq!(pulls.get(), 0);

        assert_eq!(stream.next().unwrap().unwrap(), Tree::sequence([Tree::leaf(0), Tree::leaf(0)]));
        assert_eq!(pulls.get(), 2);
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn test_split_options_from_json() {
        let options: SplitOptions = serde_json::from_str(r#"{"batch_size": 64, "axis": -1, "policy": "strict"}"#).unwrap();
        assert_eq!(options, SplitOptions::new(64).with_axis(SplitAxis::Back).with_policy(ZipPolicy::Strict));

        let defaults: SplitOptions = serde_json::from_str(r#"{"batch_size": 8}"#).unwrap();
        assert_eq!(defaults.axis, SplitAxis::Front);
        assert_eq!(defaults.policy, ZipPolicy::Shortest);

        assert!(serde_json::from_str::<SplitOptions>(r#"{"batch_size": 8, "axis": 2}"#).is_err());
    }
}
