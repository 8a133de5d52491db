//! Kernel configuration: validated plans built outside the hot loop
//!
//! A plan captures everything the parallel phases need (shape, strides,
//! division constants, lane ranges, and the strategy variant) and is the
//! single place caller contract violations are rejected. Once a plan
//! exists, every code path inside the lanes is total.

mod magic;
mod partition;

pub use magic::MagicDivisor;
pub use partition::partition_lanes;

use crate::error::{Error, Result};
use crate::shape::ShapeDescriptor;
use smallvec::SmallVec;
use std::ops::Range;

/// Largest supported element count (flat indices must fit 31 bits)
pub const MAX_ELEMS: usize = 1 << 31;

/// Above this element count a single lane stops being worthwhile
pub(crate) const FULL_LOAD_MAX_ELEMS: usize = 1 << 12;

/// Largest per-lane span whose bitmask is kept resident between phases
/// (2^20 elements = 128 KiB of mask words per lane)
pub(crate) const SMALL_MASK_MAX_ELEMS: usize = 1 << 20;

/// Sub-chunk granularity for the rescanning big-mask variant
pub(crate) const CHUNK_ELEMS: usize = 1 << 16;

/// Memory arrangement of the emitted coordinate table
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CoordLayout {
    /// All axis-0 coordinates first, then all axis-1 coordinates, ...
    /// Output dimensions are `(rank, count)`.
    #[default]
    AxisMajor,
    /// All coordinates of element 0 first, then element 1, ...
    /// Output dimensions are `(count, rank)`.
    IndexMajor,
}

/// Algorithm variant, selected per invocation from statically known sizes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Zero elements: no lane does any work, only the shape record is
    /// produced
    Empty,
    /// Input small enough that distributing it is not worthwhile; one
    /// lane owns the whole range
    FullLoad,
    /// Each lane's whole bitmask stays resident from the counting phase
    /// into the compaction phase
    SmallMask,
    /// Lane spans too large to retain masks: the counting phase spills
    /// per-chunk counts and the compaction phase rescans chunk by chunk
    BigMask,
}

/// Options for the dtype-erased non-zero entry point
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NonZeroOptions {
    /// Coordinate table arrangement
    pub layout: CoordLayout,
    /// Output integer width
    pub index_dtype: crate::dtype::IndexDType,
}

/// A validated non-zero extraction plan
///
/// Building a plan performs all precondition checks of the operation
/// (rank bounds, element-count bound, lane count); division constants are
/// derived from the validated strides, so they are consistent with the
/// shape by construction. The same plan can be reused across any number
/// of executions over arrays of the same shape.
#[derive(Clone, Debug)]
pub struct NonZeroPlan {
    shape: ShapeDescriptor,
    layout: CoordLayout,
    strategy: Strategy,
    lane_ranges: Vec<Range<usize>>,
    divisors: SmallVec<[MagicDivisor; 4]>,
}

impl NonZeroPlan {
    /// Build a plan for the given shape, lane count, and output layout.
    ///
    /// # Errors
    /// - [`Error::InvalidRank`] when the rank is outside `1..=8`
    /// - [`Error::InvalidArgument`] when `lanes == 0` or the element
    ///   count exceeds [`MAX_ELEMS`]
    pub fn new(dims: &[usize], lanes: usize, layout: CoordLayout) -> Result<Self> {
        if lanes == 0 {
            return Err(Error::invalid_argument("lanes", "lane count must be > 0"));
        }
        let shape = ShapeDescriptor::new(dims)?;
        let n = shape.elem_count();
        if n > MAX_ELEMS {
            return Err(Error::invalid_argument(
                "dims",
                format!("element count {} exceeds the 2^31 limit", n),
            ));
        }

        let strategy = if n == 0 {
            Strategy::Empty
        } else if n <= FULL_LOAD_MAX_ELEMS {
            Strategy::FullLoad
        } else if n.div_ceil(lanes) <= SMALL_MASK_MAX_ELEMS {
            Strategy::SmallMask
        } else {
            Strategy::BigMask
        };

        let active_lanes = match strategy {
            Strategy::Empty | Strategy::FullLoad => 1,
            Strategy::SmallMask | Strategy::BigMask => lanes,
        };

        let lane_ranges = partition_lanes(n, active_lanes);

        // One divisor per axis except the last; an empty input never
        // decomposes, so its (possibly overwide) strides are skipped.
        let divisors = if n == 0 {
            SmallVec::new()
        } else {
            shape.strides()[..shape.rank() - 1]
                .iter()
                .map(|&s| MagicDivisor::new(s as u32))
                .collect()
        };

        Ok(Self {
            shape,
            layout,
            strategy,
            lane_ranges,
            divisors,
        })
    }

    /// The validated shape descriptor
    #[inline]
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// The configured output layout
    #[inline]
    pub fn layout(&self) -> CoordLayout {
        self.layout
    }

    /// The selected algorithm variant
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of lanes that will run (1 for the full-load variant
    /// regardless of the pool size)
    #[inline]
    pub fn active_lanes(&self) -> usize {
        self.lane_ranges.len()
    }

    /// Worst-case coordinate output length (`elem_count * rank`), the
    /// size callers of the into-buffer entry point must provide
    #[inline]
    pub fn worst_case_output_len(&self) -> usize {
        self.shape.elem_count() * self.shape.rank()
    }

    #[inline]
    pub(crate) fn lane_ranges(&self) -> &[Range<usize>] {
        &self.lane_ranges
    }

    #[inline]
    pub(crate) fn divisors(&self) -> &[MagicDivisor] {
        &self.divisors
    }
}
