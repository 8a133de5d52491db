//! Element traits for mapping Rust types to DType / IndexDType

use super::{DType, IndexDType};
use bytemuck::{Pod, Zeroable};

/// Trait for types that can be elements of a kernel input array
///
/// This trait connects Rust's type system to lanr's runtime dtype system.
/// It's implemented for all primitive numeric types of the supported
/// widths (8/16/32/64 bits), plus `half::f16`/`half::bf16` behind the
/// `f16` feature.
///
/// # Bounds
/// - `Copy + Clone + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck), used by the
///   dtype-erased entry points
/// - `PartialOrd` - Comparison for magnitude scans
///
/// # Non-zero semantics
///
/// `is_nonzero` tests the raw bit pattern against all-zero, never IEEE
/// semantic equality. For floats this means `-0.0` (bit pattern
/// `0x8000...`) counts as non-zero and NaN payloads count as non-zero;
/// downstream consumers depend on this bit-pattern contract.
pub trait Element: Copy + Clone + Send + Sync + Pod + Zeroable + PartialOrd + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// True iff the element's bit pattern is not all-zero
    fn is_nonzero(self) -> bool;

    /// Convert to f64 for magnitude computations (MX block scale)
    fn to_f64(self) -> f64;
}

macro_rules! int_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn is_nonzero(self) -> bool {
                self != 0
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

int_element!(i64, DType::I64);
int_element!(i32, DType::I32);
int_element!(i16, DType::I16);
int_element!(i8, DType::I8);
int_element!(u64, DType::U64);
int_element!(u32, DType::U32);
int_element!(u16, DType::U16);
int_element!(u8, DType::U8);

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn is_nonzero(self) -> bool {
        self.to_bits() != 0
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn is_nonzero(self) -> bool {
        self.to_bits() != 0
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

// ============================================================================
// Half-precision floating point types (requires "f16" feature)
// ============================================================================

#[cfg(feature = "f16")]
impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn is_nonzero(self) -> bool {
        self.to_bits() != 0
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self.to_f64()
    }
}

#[cfg(feature = "f16")]
impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn is_nonzero(self) -> bool {
        self.to_bits() != 0
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self.to_f64()
    }
}

/// Trait for the integer types coordinates can be written as
///
/// The decomposer's intermediates are 32-bit; `from_u32` widens them to
/// the output width by zero extension.
pub trait IndexElement: Copy + Clone + Send + Sync + Pod + Zeroable + 'static {
    /// The corresponding IndexDType for this Rust type
    const DTYPE: IndexDType;

    /// Widen a 32-bit coordinate/index to this output width (zero-extend)
    fn from_u32(v: u32) -> Self;

    /// Read back as usize (test and verification helper)
    fn to_usize(self) -> usize;
}

impl IndexElement for i32 {
    const DTYPE: IndexDType = IndexDType::I32;

    #[inline]
    fn from_u32(v: u32) -> Self {
        v as i32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl IndexElement for i64 {
    const DTYPE: IndexDType = IndexDType::I64;

    #[inline]
    fn from_u32(v: u32) -> Self {
        i64::from(v)
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtype() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(<i32 as Element>::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_int_nonzero_is_value_test() {
        assert!(!0u8.is_nonzero());
        assert!(1u8.is_nonzero());
        assert!((-1i16).is_nonzero());
        assert!(!0u64.is_nonzero());
        assert!(u64::MAX.is_nonzero());
    }

    #[test]
    fn test_float_nonzero_is_bit_pattern_test() {
        assert!(!0.0f32.is_nonzero());
        assert!(!0.0f64.is_nonzero());
        // Negative zero has the sign bit set, so by the bit-pattern
        // contract it is non-zero.
        assert!((-0.0f32).is_nonzero());
        assert!((-0.0f64).is_nonzero());
        assert!(f32::NAN.is_nonzero());
        assert!(f64::INFINITY.is_nonzero());
    }

    #[cfg(feature = "f16")]
    #[test]
    fn test_half_nonzero() {
        assert!(!half::f16::from_f32(0.0).is_nonzero());
        assert!(half::f16::from_f32(-0.0).is_nonzero());
        assert!(half::bf16::from_f32(2.0).is_nonzero());
    }

    #[test]
    fn test_index_widening() {
        assert_eq!(i32::from_u32(7), 7);
        assert_eq!(i64::from_u32(u32::MAX), 0xFFFF_FFFFi64);
        assert_eq!(i64::from_u32(3).to_usize(), 3);
    }
}
