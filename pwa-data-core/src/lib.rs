//! Structural tree algebra for nested particle-kinematics data
//!
//! Data is held in a [`Tree`]: arbitrary nestings of keyed mappings, ordered
//! sequences and fixed tuples whose leaves are arrays with a leading batch
//! axis. The functions in this crate transform whole trees without callers
//! writing structural recursion: mapping a function over every leaf, splitting
//! all leaves into synchronized batches, merging same-shaped trees, masking,
//! flattening and path-based lookup.
//!
//! Leaf-level array work is delegated to the array backend through
//! [`ArrayLeaf`], implemented for ndarray's dynamic-rank arrays.

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod flatten;
pub mod index;
pub mod key;
pub mod leaf;
pub mod map;
pub mod merge;
pub mod shape;
pub mod split;
pub mod tree;

// Re-export key types for convenience
pub use convert::{data_to_backend, data_to_host, HostTransfer};
pub use error::{Error, LeafError, Result};
pub use flatten::{flatten_dict_data, flatten_dict_data_with, join_keys, FlatData};
pub use index::data_index;
pub use key::{DecayKey, Key, ParticleKey, Path};
pub use leaf::{ArrayLeaf, Element};
pub use map::{data_map, data_mask, try_data_map};
pub use merge::data_merge;
pub use shape::{data_shape, data_shape_all};
pub use split::{data_generator, data_split, data_split_with, LeafSlices, SplitAxis, SplitOptions, TreeGenerator, ZipPolicy};
pub use tree::{Mapping, NodeKind, Tree};
