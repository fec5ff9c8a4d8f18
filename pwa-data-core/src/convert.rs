//! Moving leaves between host arrays and the shared compute representation

use ndarray::{ArcArray, ArrayD, IxDyn};

use crate::map::data_map;
use crate::tree::Tree;

/// Leaves that can be materialized as host arrays and rebuilt from them
pub trait HostTransfer: Sized {
    /// Host-side array type
    type Host;

    /// Materialize this leaf as a host array
    fn to_host(&self) -> Self::Host;

    /// Build a leaf of this backend from a host array
    fn from_host(host: &Self::Host) -> Self;
}

impl<A: Clone> HostTransfer for ArrayD<A> {
    type Host = ArrayD<A>;

    fn to_host(&self) -> Self::Host {
        self.clone()
    }

    fn from_host(host: &Self::Host) -> Self {
        host.clone()
    }
}

impl<A: Clone> HostTransfer for ArcArray<A, IxDyn> {
    type Host = ArrayD<A>;

    fn to_host(&self) -> Self::Host {
        self.to_owned()
    }

    fn from_host(host: &Self::Host) -> Self {
        host.to_shared()
    }
}

/// Materialize every leaf as a host array
pub fn data_to_host<L: HostTransfer>(tree: &Tree<L>) -> Tree<L::Host> {
    data_map(tree, L::to_host)
}

/// Rebuild every leaf in backend `L` from host arrays
pub fn data_to_backend<L: HostTransfer>(tree: &Tree<L::Host>) -> Tree<L> {
    data_map(tree, L::from_host)
}
