//! Error types for tree operations

use thiserror::Error;

use crate::key::{Key, Path};
use crate::tree::NodeKind;

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tree operations
#[derive(Error, Debug)]
pub enum Error {
    /// Containers at a shared path disagree in kind or length
    #[error("Structure mismatch at {path}: {reason}")]
    StructureMismatch {
        /// Location of the offending node
        path: Path,
        /// What disagreed
        reason: String,
    },

    /// A key could not be resolved, neither exactly nor by its string form
    #[error("Key '{key}' not found at {path}")]
    KeyNotFound {
        /// Location of the mapping that was searched
        path: Path,
        /// The key that was requested
        key: Key,
    },

    /// Positional index outside a sequence or tuple
    #[error("Index {index} out of range for length {len} at {path}")]
    IndexOutOfRange {
        /// Location of the indexed node
        path: Path,
        /// Requested index
        index: i64,
        /// Length of the indexed node
        len: usize,
    },

    /// Unsupported option value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The delegated array operation failed
    #[error("Leaf operation failed at {path}: {source}")]
    Leaf {
        /// Location of the failing leaf
        path: Path,
        /// Error reported by the array backend
        #[source]
        source: LeafError,
    },

    /// Children of a container produced different numbers of batches
    #[error("Batch streams misaligned at {path}")]
    BatchMisaligned {
        /// Location of the container whose children disagree
        path: Path,
    },

    /// The tree holds no leaves
    #[error("Tree contains no leaves")]
    EmptyTree,
}

impl Error {
    pub(crate) fn kind_mismatch(path: &Path, expected: NodeKind, found: NodeKind) -> Self {
        Error::StructureMismatch {
            path: path.clone(),
            reason: format!("expected {expected}, found {found}"),
        }
    }

    pub(crate) fn leaf(path: &Path, source: LeafError) -> Self {
        Error::Leaf {
            path: path.clone(),
            source,
        }
    }
}

/// Error reported by an array backend for a single leaf
#[derive(Error, Debug)]
pub enum LeafError {
    /// Incompatible shapes
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Axis outside the array's rank
    #[error("Axis {axis} out of range for {ndim}-dimensional array")]
    AxisOutOfRange {
        /// Requested axis
        axis: isize,
        /// Rank of the array
        ndim: usize,
    },

    /// Boolean mask length differs from the batch extent
    #[error("Mask length {found} does not match batch extent {expected}")]
    MaskLength {
        /// Batch extent of the leaf
        expected: usize,
        /// Length of the mask
        found: usize,
    },

    /// Concatenation over no arrays
    #[error("Cannot concatenate zero arrays")]
    EmptyConcat,
}
