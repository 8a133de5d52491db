//! FP8 element formats and the E8M0 block-scale byte
//!
//! The MX quantization kernel emits one of two 8-bit floating point
//! element formats plus one shared power-of-two scale per block:
//!
//! - **FP8E4M3**: 1 sign + 4 exponent + 3 mantissa bits
//!   - Finite range: ~[-448, 448], no infinities, single NaN pattern
//!   - Higher precision, smaller range
//!
//! - **FP8E5M2**: 1 sign + 5 exponent + 2 mantissa bits
//!   - Finite range: ~[-57344, 57344], has infinities
//!   - Lower precision, larger dynamic range
//!
//! - **E8M0**: 8-bit unsigned exponent-only scale, bias 127, value
//!   `2^e` for `e` in `[-127, 127]`; `0xFF` is the NaN scale. This is the
//!   shared block scale of the OCP MX block formats.
//!
//! Conversions are implemented once, generic over the exponent/mantissa
//! split, with round-to-nearest-even and saturation; the two format types
//! are thin wrappers over those const-generic functions.

use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Generic encode/decode over the (exponent, mantissa) split
// ============================================================================

/// Round `v >> shift` to nearest, ties to even.
#[inline]
fn round_rne(v: u32, shift: u32) -> u32 {
    if shift == 0 {
        return v;
    }
    if shift >= 32 {
        return 0;
    }
    let kept = v >> shift;
    let rem = v & ((1u32 << shift) - 1);
    let half = 1u32 << (shift - 1);
    if rem > half || (rem == half && kept & 1 == 1) {
        kept + 1
    } else {
        kept
    }
}

/// Encode an f32 into an 8-bit float with `E` exponent and `M` mantissa
/// bits, saturating.
///
/// Saturation semantics:
/// - overflow goes to infinity when the format has one (`HAS_INF`),
///   otherwise to the largest finite magnitude;
/// - magnitudes below half the smallest subnormal go to ±0;
/// - NaN stays NaN (the format's single NaN pattern, sign preserved).
#[inline]
fn encode<const E: u32, const M: u32, const HAS_INF: bool>(x: f32) -> u8 {
    debug_assert_eq!(1 + E + M, 8);
    let bits = x.to_bits();
    let sign = ((bits >> 31) as u8) << 7;
    let abs = bits & 0x7FFF_FFFF;

    let bias = (1i32 << (E - 1)) - 1;
    let exp_field_max = (1u8 << E) - 1;
    let mant_mask = (1u8 << M) - 1;
    let nan = (exp_field_max << M) | mant_mask;
    // Largest finite encoding: all-ones exponent loses its top mantissa
    // slot to NaN when the format has no infinities.
    let max_finite = if HAS_INF {
        ((exp_field_max - 1) << M) | mant_mask
    } else {
        (exp_field_max << M) | (mant_mask - 1)
    };
    let inf = exp_field_max << M;
    // Largest exponent a finite value may carry
    let emax = i32::from(exp_field_max) - bias - if HAS_INF { 1 } else { 0 };

    if abs > 0x7F80_0000 {
        return sign | nan;
    }
    if abs == 0x7F80_0000 {
        return sign | if HAS_INF { inf } else { max_finite };
    }
    // f32 subnormals are far below every representable fp8 magnitude.
    if abs >> 23 == 0 {
        return sign;
    }

    let e32 = (abs >> 23) as i32 - 127;
    let sig = 0x0080_0000 | (abs & 0x007F_FFFF); // 24-bit significand

    let e_min = 1 - bias; // smallest normal exponent of the target
    if e32 >= e_min {
        let mut mant = round_rne(sig, 23 - M);
        let mut e = e32;
        if mant >> (M + 1) != 0 {
            // Mantissa rounding carried out
            mant >>= 1;
            e += 1;
        }
        let mant = mant as u8 & mant_mask;
        // The all-ones top slot is NaN in formats without infinities
        let overflow = e > emax || (!HAS_INF && e == emax && mant == mant_mask);
        if overflow {
            return sign | if HAS_INF { inf } else { max_finite };
        }
        return sign | (((e + bias) as u8) << M) | mant;
    }

    // Subnormal target: value = mant / 2^M * 2^e_min
    let shift = (23 - M) as i32 + (e_min - e32);
    let mant = round_rne(sig, shift as u32);
    if mant >> M != 0 {
        // Rounded up into the smallest normal
        return sign | (1 << M);
    }
    sign | (mant as u8 & mant_mask)
}

/// Decode an 8-bit float with `E` exponent and `M` mantissa bits to f32.
///
/// Exact for every one of the 256 encodings; never panics.
#[inline]
fn decode<const E: u32, const M: u32, const HAS_INF: bool>(b: u8) -> f32 {
    debug_assert_eq!(1 + E + M, 8);
    let sign = if b >> 7 != 0 { -1.0f32 } else { 1.0f32 };
    let exp_field = (b >> M) & ((1u8 << E) - 1);
    let mant = b & ((1u8 << M) - 1);
    let bias = (1i32 << (E - 1)) - 1;
    let exp_field_max = (1u8 << E) - 1;
    let mant_mask = (1u8 << M) - 1;

    if exp_field == exp_field_max {
        if HAS_INF {
            if mant == 0 {
                return sign * f32::INFINITY;
            }
            return f32::NAN;
        }
        if mant == mant_mask {
            return f32::NAN;
        }
    }

    if exp_field == 0 {
        // Subnormal: 0.mant * 2^(1 - bias)
        let frac = f32::from(mant) / (1u32 << M) as f32;
        return sign * frac * exp2i(1 - bias);
    }

    let frac = 1.0 + f32::from(mant) / (1u32 << M) as f32;
    sign * frac * exp2i(i32::from(exp_field) - bias)
}

/// `2^e` as f32 for exponents in the normal range, built from bits.
#[inline]
fn exp2i(e: i32) -> f32 {
    debug_assert!((-126..=127).contains(&e));
    f32::from_bits(((e + 127) as u32) << 23)
}

// ============================================================================
// Format types
// ============================================================================

/// 8-bit floating point with 4 exponent and 3 mantissa bits.
///
/// Format: 1 sign + 4 exponent + 3 mantissa, bias 7, finite range
/// ~[-448, 448]. No infinities; overflow saturates to ±MAX. The single
/// NaN pattern is exp=1111, mant=111.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FP8E4M3(pub u8);

// Safety: FP8E4M3 is a transparent wrapper around u8, which is Pod
unsafe impl Pod for FP8E4M3 {}
unsafe impl Zeroable for FP8E4M3 {}

impl FP8E4M3 {
    /// Zero value
    pub const ZERO: Self = Self(0x00);
    /// One value (sign=0, exp=0111, mant=000)
    pub const ONE: Self = Self(0x38);
    /// Maximum positive value (448)
    pub const MAX: Self = Self(0x7E);
    /// NaN (exp=1111, mant=111)
    pub const NAN: Self = Self(0x7F);

    /// Largest power-of-two exponent of a finite value (448 = 1.75 * 2^8)
    pub const EMAX: i32 = 8;

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    /// Convert from f32 with saturation (|x| > 448 clamps to ±MAX,
    /// infinities clamp to ±MAX, NaN stays NaN)
    #[inline]
    pub fn from_f32(x: f32) -> Self {
        Self(encode::<4, 3, false>(x))
    }

    /// Convert to f32 (exact)
    #[inline]
    pub fn to_f32(self) -> f32 {
        decode::<4, 3, false>(self.0)
    }

    /// Check if this value is NaN
    #[inline]
    pub fn is_nan(self) -> bool {
        (self.0 & 0x7F) == 0x7F
    }

    /// Check if this value is zero (either sign)
    #[inline]
    pub fn is_zero(self) -> bool {
        (self.0 & 0x7F) == 0
    }
}

impl fmt::Debug for FP8E4M3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP8E4M3({})", self.to_f32())
    }
}

impl fmt::Display for FP8E4M3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl PartialOrd for FP8E4M3 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.to_f32().partial_cmp(&other.to_f32())
    }
}

/// 8-bit floating point with 5 exponent and 2 mantissa bits.
///
/// Format: 1 sign + 5 exponent + 2 mantissa, bias 15, finite range
/// ~[-57344, 57344]. Has infinities; overflow saturates to ±Infinity.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FP8E5M2(pub u8);

// Safety: FP8E5M2 is a transparent wrapper around u8, which is Pod
unsafe impl Pod for FP8E5M2 {}
unsafe impl Zeroable for FP8E5M2 {}

impl FP8E5M2 {
    /// Zero value
    pub const ZERO: Self = Self(0x00);
    /// One value (sign=0, exp=01111, mant=00)
    pub const ONE: Self = Self(0x3C);
    /// Maximum positive finite value (57344)
    pub const MAX: Self = Self(0x7B);
    /// Positive infinity (exp=11111, mant=00)
    pub const INFINITY: Self = Self(0x7C);
    /// NaN (exp=11111, mant!=00)
    pub const NAN: Self = Self(0x7F);

    /// Largest power-of-two exponent of a finite value (57344 = 1.75 * 2^15)
    pub const EMAX: i32 = 15;

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    /// Convert from f32 with saturation (|x| > 57344 goes to ±Infinity,
    /// NaN stays NaN)
    #[inline]
    pub fn from_f32(x: f32) -> Self {
        Self(encode::<5, 2, true>(x))
    }

    /// Convert to f32 (exact)
    #[inline]
    pub fn to_f32(self) -> f32 {
        decode::<5, 2, true>(self.0)
    }

    /// Check if this value is NaN
    #[inline]
    pub fn is_nan(self) -> bool {
        (self.0 >> 2) & 0x1F == 0x1F && self.0 & 0x03 != 0
    }

    /// Check if this value is infinite
    #[inline]
    pub fn is_infinite(self) -> bool {
        (self.0 & 0x7F) == 0x7C
    }

    /// Check if this value is zero (either sign)
    #[inline]
    pub fn is_zero(self) -> bool {
        (self.0 & 0x7F) == 0
    }
}

impl fmt::Debug for FP8E5M2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP8E5M2({})", self.to_f32())
    }
}

impl fmt::Display for FP8E5M2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl PartialOrd for FP8E5M2 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.to_f32().partial_cmp(&other.to_f32())
    }
}

// ============================================================================
// E8M0 block scale
// ============================================================================

/// 8-bit exponent-only block scale: value `2^(bits - 127)`.
///
/// Unsigned, no mantissa. Bits `0x00..=0xFE` encode exponents `-127..=127`;
/// `0xFF` is the NaN scale, emitted when a block's maximum magnitude is
/// Inf or NaN.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct E8M0(pub u8);

// Safety: E8M0 is a transparent wrapper around u8, which is Pod
unsafe impl Pod for E8M0 {}
unsafe impl Zeroable for E8M0 {}

impl E8M0 {
    /// Exponent bias
    pub const BIAS: i32 = 127;
    /// Identity scale (2^0)
    pub const ONE: Self = Self(0x7F);
    /// NaN scale
    pub const NAN: Self = Self(0xFF);

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    /// Scale for exponent `e`, clamped to the representable `[-127, 127]`
    #[inline]
    pub fn from_exponent(e: i32) -> Self {
        Self((e.clamp(-Self::BIAS, Self::BIAS) + Self::BIAS) as u8)
    }

    /// The encoded exponent; None for the NaN scale
    #[inline]
    pub fn exponent(self) -> Option<i32> {
        if self.is_nan() {
            None
        } else {
            Some(i32::from(self.0) - Self::BIAS)
        }
    }

    /// Check if this is the NaN scale
    #[inline]
    pub fn is_nan(self) -> bool {
        self.0 == 0xFF
    }

    /// The scale value as f64 (`2^e`, exact); NaN for the NaN scale
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self.exponent() {
            Some(e) => f64::from_bits(((e + 1023) as u64) << 52),
            None => f64::NAN,
        }
    }
}

impl fmt::Debug for E8M0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exponent() {
            Some(e) => write!(f, "E8M0(2^{})", e),
            None => write!(f, "E8M0(NaN)"),
        }
    }
}

impl fmt::Display for E8M0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ========== FP8E4M3 Tests ==========

    #[test]
    fn test_fp8_e4m3_zero() {
        assert_eq!(FP8E4M3::ZERO.to_f32(), 0.0);
        assert_eq!(FP8E4M3::from_f32(0.0).to_bits(), 0x00);
        assert_eq!(FP8E4M3::from_f32(-0.0).to_bits(), 0x80);
    }

    #[test]
    fn test_fp8_e4m3_exact_values() {
        // Values with <= 3 mantissa bits convert exactly
        for &v in &[1.0f32, -1.0, 0.5, 2.0, 1.75, 448.0, -448.0, 0.015625] {
            assert_eq!(FP8E4M3::from_f32(v).to_f32(), v, "value {}", v);
        }
        assert_eq!(FP8E4M3::from_f32(1.0).to_bits(), 0x38);
        assert_eq!(FP8E4M3::from_f32(448.0).to_bits(), 0x7E);
    }

    #[test]
    fn test_fp8_e4m3_rounding() {
        // 1.0625 is halfway between 1.0 (0x38) and 1.125 (0x39); ties to even
        assert_eq!(FP8E4M3::from_f32(1.0625).to_bits(), 0x38);
        // 1.1875 is halfway between 1.125 and 1.25; 1.25 has even mantissa
        assert_eq!(FP8E4M3::from_f32(1.1875).to_f32(), 1.25);
    }

    #[test]
    fn test_fp8_e4m3_saturation() {
        assert_eq!(FP8E4M3::from_f32(1000.0), FP8E4M3::MAX);
        assert_eq!(FP8E4M3::from_f32(f32::INFINITY), FP8E4M3::MAX);
        assert_eq!(FP8E4M3::from_f32(f32::NEG_INFINITY).to_bits(), 0xFE);
        // 464 is halfway between 448 and 480 and ties down to 448
        assert_eq!(FP8E4M3::from_f32(464.0), FP8E4M3::MAX);
        // 480 lands exactly on the NaN slot and must clamp
        assert_eq!(FP8E4M3::from_f32(480.0), FP8E4M3::MAX);
        assert_eq!(FP8E4M3::from_f32(1e-10).to_bits(), 0x00);
    }

    #[test]
    fn test_fp8_e4m3_subnormals() {
        // Smallest subnormal is 2^-9 = 0.001953125
        let tiny = FP8E4M3::from_f32(0.001953125);
        assert_eq!(tiny.to_bits(), 0x01);
        assert_eq!(tiny.to_f32(), 0.001953125);
        // Half of it rounds to zero (ties to even)
        assert_eq!(FP8E4M3::from_f32(0.0009765625).to_bits(), 0x00);
    }

    #[test]
    fn test_fp8_e4m3_nan() {
        let nan = FP8E4M3::from_f32(f32::NAN);
        assert!(nan.is_nan());
        assert!(nan.to_f32().is_nan());
    }

    #[test]
    fn test_fp8_e4m3_all_bit_patterns_decode() {
        for b in 0u8..=255 {
            let v = FP8E4M3::from_bits(b).to_f32();
            // Round-trip every non-NaN pattern exactly
            if !FP8E4M3::from_bits(b).is_nan() {
                assert_eq!(FP8E4M3::from_f32(v).to_bits(), b, "pattern {:#04x}", b);
            } else {
                assert!(v.is_nan());
            }
        }
    }

    // ========== FP8E5M2 Tests ==========

    #[test]
    fn test_fp8_e5m2_exact_values() {
        for &v in &[1.0f32, -1.0, 0.5, 2.0, 1.75, 57344.0, 0.00006103515625] {
            assert_eq!(FP8E5M2::from_f32(v).to_f32(), v, "value {}", v);
        }
        assert_eq!(FP8E5M2::from_f32(1.0).to_bits(), 0x3C);
    }

    #[test]
    fn test_fp8_e5m2_saturation_to_inf() {
        assert_eq!(FP8E5M2::from_f32(100000.0), FP8E5M2::INFINITY);
        assert_eq!(FP8E5M2::from_f32(f32::INFINITY), FP8E5M2::INFINITY);
        assert!(FP8E5M2::from_f32(f32::NEG_INFINITY).to_f32().is_infinite());
    }

    #[test]
    fn test_fp8_e5m2_nan() {
        let nan = FP8E5M2::from_f32(f32::NAN);
        assert!(nan.is_nan());
        assert!(nan.to_f32().is_nan());
    }

    #[test]
    fn test_fp8_e5m2_all_bit_patterns_decode() {
        for b in 0u8..=255 {
            let fp8 = FP8E5M2::from_bits(b);
            let v = fp8.to_f32();
            if fp8.is_nan() {
                assert!(v.is_nan());
            } else {
                assert_eq!(FP8E5M2::from_f32(v).to_bits(), b, "pattern {:#04x}", b);
            }
        }
    }

    // ========== E8M0 Tests ==========

    #[test]
    fn test_e8m0_identity() {
        assert_eq!(E8M0::ONE.to_f64(), 1.0);
        assert_eq!(E8M0::ONE.exponent(), Some(0));
    }

    #[test]
    fn test_e8m0_range() {
        assert_eq!(E8M0::from_exponent(8).to_f64(), 256.0);
        assert_eq!(E8M0::from_exponent(-8).to_f64(), 1.0 / 256.0);
        assert_eq!(E8M0::from_exponent(127).to_f64(), 2.0f64.powi(127));
        assert_eq!(E8M0::from_exponent(-127).to_f64(), 2.0f64.powi(-127));
        // Clamped beyond the representable range
        assert_eq!(E8M0::from_exponent(300), E8M0::from_exponent(127));
        assert_eq!(E8M0::from_exponent(-300), E8M0::from_exponent(-127));
    }

    #[test]
    fn test_e8m0_nan() {
        assert!(E8M0::NAN.is_nan());
        assert!(E8M0::NAN.to_f64().is_nan());
        assert_eq!(E8M0::NAN.exponent(), None);
        assert!(!E8M0::from_exponent(127).is_nan());
    }

    // ========== Pod Tests ==========

    #[test]
    fn test_fp8_bytemuck() {
        let arr = [FP8E4M3::ZERO, FP8E4M3::ONE];
        let bytes: &[u8] = bytemuck::cast_slice(&arr);
        assert_eq!(bytes, &[0x00, 0x38]);

        let scales = [E8M0::ONE, E8M0::NAN];
        let bytes: &[u8] = bytemuck::cast_slice(&scales);
        assert_eq!(bytes, &[0x7F, 0xFF]);
    }
}
