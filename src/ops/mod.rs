//! Kernel operations
//!
//! Operations are exposed as traits implemented by
//! [`LanePool`](crate::lane::LanePool): [`NonZeroOps`] for non-zero
//! coordinate extraction and [`MxOps`] for MX block quantization. The
//! dtype-erased entry points reach the generic typed kernels through the
//! [`dispatch_dtype!`](crate::dispatch_dtype) macro.

mod dispatch;
#[cfg(feature = "fp8")]
pub mod mx;
pub mod nonzero;

#[cfg(feature = "fp8")]
pub use mx::{MxFormat, MxOps, MxOptions, MxQuantized};
pub use nonzero::{DynCoords, NonZeroOps, NonZeroOutput, ShapeRecord};
