//! # lanr
//!
//! **Lane-parallel dense-tensor transform kernels.**
//!
//! lanr implements two transform kernels that run across a small, fixed
//! set of compute lanes over disjoint chunks of a row-major array:
//!
//! - **Non-zero coordinate extraction**: the flat or per-axis coordinates
//!   of every element whose bit pattern is non-zero, compacted into a
//!   contiguous table in ascending flat-index order, plus a shape record
//!   describing the table.
//! - **MX block quantization**: fixed-size blocks along the last axis,
//!   one shared power-of-two scale per block derived from the block's
//!   maximum magnitude, FP8 element output.
//!
//! ## Design
//!
//! - **Two-phase lanes**: extraction counts in one fork-join phase,
//!   exchanges per-lane counts through an offset table at the barrier,
//!   then writes disjoint output slices in a second phase. No locks, no
//!   atomics; the exclusive-prefix offsets make the parallel writes
//!   race-free by construction.
//! - **Constant-free division**: coordinates are recovered from flat
//!   indices with precomputed multiply-shift reciprocals per axis stride;
//!   no hardware divide runs in the hot loop.
//! - **One parametric kernel**: a single implementation generic over
//!   rank (`1..=8`), element type, output width, and coordinate layout,
//!   selected at plan time.
//!
//! ## Quick Start
//!
//! ```rust
//! use lanr::prelude::*;
//!
//! let pool = LanePool::new(4)?;
//! // Shape (2, 3): [[0, 1, 0], [2, 0, 3]]
//! let data = [0i32, 1, 0, 2, 0, 3];
//! let out = pool.nonzero::<i32, i64>(&data, &[2, 3], CoordLayout::AxisMajor)?;
//! assert_eq!(out.record.count(), 3);
//! assert_eq!(out.coords, vec![0, 1, 1, 1, 0, 2]);
//! # Ok::<(), lanr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): concurrent lane execution
//! - `fp8` (default): FP8/E8M0 formats and the MX quantization kernel
//! - `f16`: f16/bf16 input element support

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod lane;
pub mod ops;
pub mod plan;
pub mod shape;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element, IndexDType, IndexElement};
    pub use crate::error::{Error, Result};
    pub use crate::lane::LanePool;
    pub use crate::ops::nonzero::{DynCoords, NonZeroOps, NonZeroOutput, ShapeRecord};
    pub use crate::plan::{CoordLayout, NonZeroOptions, NonZeroPlan, Strategy};
    pub use crate::shape::ShapeDescriptor;

    #[cfg(feature = "fp8")]
    pub use crate::dtype::fp8::{E8M0, FP8E4M3, FP8E5M2};
    #[cfg(feature = "fp8")]
    pub use crate::ops::mx::{MxFormat, MxOps, MxOptions, MxQuantized};
}
