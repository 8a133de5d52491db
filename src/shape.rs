//! Shape descriptors for row-major dense inputs
//!
//! Kernel inputs are always contiguous and row-major, so a shape is just
//! the ordered per-axis extents; strides are derived, in elements, as the
//! product of the trailing extents.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most arrays have 4 or fewer dimensions, so we stack-allocate up to 4
const STACK_DIMS: usize = 4;

/// Maximum supported rank
pub const MAX_RANK: usize = 8;

/// Shape type: extents of an array
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive indices along each axis
/// Always row-major here, so strides are unsigned and decreasing
pub type Strides = SmallVec<[usize; STACK_DIMS]>;

/// A validated row-major shape descriptor
///
/// Address of the element at indices `[i0, i1, ..., i(R-1)]`:
///   `i0 * strides[0] + i1 * strides[1] + ... + i(R-1)`
///
/// Rank is bounded `1..=8`. Zero extents are allowed (they describe an
/// empty array, which is a valid degenerate input, not an error).
#[derive(Clone, PartialEq, Eq)]
pub struct ShapeDescriptor {
    dims: Shape,
    strides: Strides,
}

impl ShapeDescriptor {
    /// Create a descriptor from per-axis extents
    ///
    /// # Errors
    /// Returns [`Error::InvalidRank`] when the rank is outside `1..=8`.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(Error::InvalidRank { rank: dims.len() });
        }
        let dims: Shape = dims.iter().copied().collect();
        let strides = row_major_strides(&dims);
        Ok(Self { dims, strides })
    }

    /// Get the extents
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get the row-major strides (in elements)
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of axes (rank)
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Recompose a flat index from per-axis coordinates
    ///
    /// The inverse of coordinate decomposition; used by verification code
    /// and tests. Returns None when the coordinate tuple is out of range.
    pub fn flat_index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.rank() {
            return None;
        }
        let mut flat = 0usize;
        for ((&c, &d), &s) in coords.iter().zip(self.dims.iter()).zip(self.strides.iter()) {
            if c >= d {
                return None;
            }
            flat += c * s;
        }
        Some(flat)
    }
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShapeDescriptor {{ dims: {:?}, strides: {:?} }}",
            self.dims.as_slice(),
            self.strides.as_slice()
        )
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims.as_slice())
    }
}

/// Compute row-major strides for a shape (product of trailing extents)
pub fn row_major_strides(dims: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::with_capacity(dims.len());
    let mut stride = 1usize;
    for &dim in dims.iter().rev() {
        strides.push(stride);
        stride *= dim;
    }
    strides.reverse();
    strides
}
