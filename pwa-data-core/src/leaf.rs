//! Leaf-level array operations delegated to the array backend

use std::ops::Range;

use bytemuck::Pod;
use ndarray::{concatenate, ArcArray, Array, ArrayD, ArrayViewD, Axis, ErrorKind, IxDyn, ShapeError, Slice};

use crate::error::LeafError;

/// Trait for plain numeric element types stored in leaves
pub trait Element: Pod + Send + Sync + 'static {}

impl<T: Pod + Send + Sync + 'static> Element for T {}

/// Array operations the tree engine dispatches to at every leaf
///
/// Axis 0 of a leaf is its batch axis.
pub trait ArrayLeaf: Sized {
    /// Size of every dimension
    fn shape(&self) -> Vec<usize>;

    /// Elements `range` along `axis`
    fn slice_range(&self, axis: usize, range: Range<usize>) -> Result<Self, LeafError>;

    /// Concatenate `parts` along `axis`; negative axes count from the back
    fn concat(parts: &[&Self], axis: isize) -> Result<Self, LeafError>;

    /// Keep the entries along the batch axis where `mask` is true
    fn boolean_mask(&self, mask: &[bool]) -> Result<Self, LeafError>;

    /// Number of dimensions
    fn ndim(&self) -> usize {
        self.shape().len()
    }
}

/// Resolve a possibly negative axis against a rank
pub fn resolve_axis(axis: isize, ndim: usize) -> Result<usize, LeafError> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(LeafError::AxisOutOfRange { axis, ndim });
    }
    Ok(resolved as usize)
}

fn slice_view<A: Clone>(view: ArrayViewD<'_, A>, axis: usize, range: Range<usize>) -> Result<ArrayD<A>, LeafError> {
    if axis >= view.ndim() {
        return Err(LeafError::AxisOutOfRange {
            axis: axis as isize,
            ndim: view.ndim(),
        });
    }
    if range.start > range.end || range.end > view.len_of(Axis(axis)) {
        return Err(ShapeError::from_kind(ErrorKind::OutOfBounds).into());
    }
    Ok(view.slice_axis(Axis(axis), Slice::from(range)).to_owned())
}

fn concat_views<A: Clone>(views: &[ArrayViewD<'_, A>], axis: isize) -> Result<ArrayD<A>, LeafError> {
    let first = views.first().ok_or(LeafError::EmptyConcat)?;
    let axis = resolve_axis(axis, first.ndim())?;
    Ok(concatenate(Axis(axis), views)?)
}

fn mask_view<A: Clone>(view: ArrayViewD<'_, A>, mask: &[bool]) -> Result<ArrayD<A>, LeafError> {
    if view.ndim() == 0 {
        return Err(LeafError::AxisOutOfRange { axis: 0, ndim: 0 });
    }
    let extent = view.len_of(Axis(0));
    if mask.len() != extent {
        return Err(LeafError::MaskLength {
            expected: extent,
            found: mask.len(),
        });
    }
    let indices: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect();
    Ok(view.select(Axis(0), &indices))
}

impl<A: Clone> ArrayLeaf for ArrayD<A> {
    fn shape(&self) -> Vec<usize> {
        ArrayD::shape(self).to_vec()
    }

    fn slice_range(&self, axis: usize, range: Range<usize>) -> Result<Self, LeafError> {
        slice_view(self.view(), axis, range)
    }

    fn concat(parts: &[&Self], axis: isize) -> Result<Self, LeafError> {
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        concat_views(&views, axis)
    }

    fn boolean_mask(&self, mask: &[bool]) -> Result<Self, LeafError> {
        mask_view(self.view(), mask)
    }
}

/// Shared, reference-counted arrays; slicing and masking produce new shared arrays
impl<A: Clone> ArrayLeaf for ArcArray<A, IxDyn> {
    fn shape(&self) -> Vec<usize> {
        ArcArray::shape(self).to_vec()
    }

    fn slice_range(&self, axis: usize, range: Range<usize>) -> Result<Self, LeafError> {
        slice_view(self.view(), axis, range).map(Array::into_shared)
    }

    fn concat(parts: &[&Self], axis: isize) -> Result<Self, LeafError> {
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        concat_views(&views, axis).map(Array::into_shared)
    }

    fn boolean_mask(&self, mask: &[bool]) -> Result<Self, LeafError> {
        mask_view(self.view(), mask).map(Array::into_shared)
    }
}
