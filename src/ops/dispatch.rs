//! DType dispatch for the erased entry points
//!
//! This module provides the `dispatch_dtype!` macro for runtime type
//! dispatch: it takes a `DType` value and executes a code block with `T`
//! bound to the corresponding Rust type, so the byte-slice entry points
//! can reach the generic typed kernels.
//!
//! # Usage
//!
//! ```ignore
//! dispatch_dtype!(dtype, T => {
//!     // T is now a concrete type (f32, u8, i64, ...)
//!     let elems: &[T] = bytemuck::try_cast_slice(bytes)?;
//!     ...
//! }, "nonzero");
//! ```
//!
//! F16/BF16 require the "f16" feature; without it they return a
//! `FeatureRequired` error instead of silently misreading bit patterns.

/// Internal helper macro to dispatch types requiring the "f16" feature.
/// Parameterized by type to avoid duplicating the macro for f16 vs bf16.
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_f16_type {
    ($T:ident, $body:block, $dtype:expr, $error_op:expr, $type:ty) => {{
        #[cfg(feature = "f16")]
        {
            type $T = $type;
            $body
        }
        #[cfg(not(feature = "f16"))]
        {
            return Err($crate::error::Error::FeatureRequired {
                dtype: $dtype,
                feature: "f16",
            });
        }
    }};
}

/// Macro for runtime dtype dispatch to typed operations.
///
/// Matches on a [`crate::dtype::DType`] and executes the body with `T`
/// bound to the concrete element type. Feature-gated types go through a
/// parameterized helper macro.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, half::f16)
            }
            $crate::dtype::DType::BF16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, half::bf16)
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
        }
    };
}
