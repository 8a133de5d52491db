//! MX block quantization: shared-exponent narrow-float encoding
//!
//! Partitions an array into fixed-size blocks along the last axis,
//! derives one power-of-two [`E8M0`] scale per block from the block's
//! maximum magnitude, and emits FP8 elements quantized against that
//! scale. Dequantization multiplies each decoded element by its block's
//! scale.
//!
//! Structurally this is the non-zero kernel's sibling: the same fixed
//! lanes sweep disjoint chunks of the input, but block outputs have
//! statically known positions, so a single fork-join phase suffices with
//! no count exchange and no offset table.

use crate::dtype::Element;
use crate::dtype::fp8::{E8M0, FP8E4M3, FP8E5M2};
use crate::error::{Error, Result};
use crate::lane::LanePool;
use crate::plan::partition_lanes;
use crate::shape::ShapeDescriptor;

/// FP8 element format of the quantized output
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MxFormat {
    /// 4 exponent + 3 mantissa bits, finite range ±448
    #[default]
    E4M3,
    /// 5 exponent + 2 mantissa bits, finite range ±57344
    E5M2,
}

impl MxFormat {
    /// Largest power-of-two exponent of a finite element value; the block
    /// scale is chosen so the block's amax lands at this exponent.
    #[inline]
    pub const fn emax(self) -> i32 {
        match self {
            Self::E4M3 => FP8E4M3::EMAX,
            Self::E5M2 => FP8E5M2::EMAX,
        }
    }

    /// The format's NaN bit pattern
    #[inline]
    pub const fn nan_bits(self) -> u8 {
        match self {
            Self::E4M3 => FP8E4M3::NAN.to_bits(),
            Self::E5M2 => FP8E5M2::NAN.to_bits(),
        }
    }

    /// Encode an f32 into this format's byte, saturating
    #[inline]
    pub fn encode(self, x: f32) -> u8 {
        match self {
            Self::E4M3 => FP8E4M3::from_f32(x).to_bits(),
            Self::E5M2 => FP8E5M2::from_f32(x).to_bits(),
        }
    }

    /// Decode this format's byte to f32
    #[inline]
    pub fn decode(self, b: u8) -> f32 {
        match self {
            Self::E4M3 => FP8E4M3::from_bits(b).to_f32(),
            Self::E5M2 => FP8E5M2::from_bits(b).to_f32(),
        }
    }
}

/// Options for MX quantization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MxOptions {
    /// Quantized element format
    pub format: MxFormat,
    /// Elements per block along the last axis; must divide the last
    /// extent
    pub block_size: usize,
}

impl Default for MxOptions {
    fn default() -> Self {
        Self {
            format: MxFormat::E4M3,
            block_size: 32,
        }
    }
}

/// A quantized array: element bytes in input order plus one scale byte
/// per block
#[derive(Clone, Debug)]
pub struct MxQuantized {
    /// Quantized element bytes, one per input element, in row-major input
    /// order
    pub elements: Vec<u8>,
    /// E8M0 scale bytes, one per block, in block order
    pub scales: Vec<u8>,
    /// Shape of the source array
    pub shape: Vec<usize>,
    /// Elements per block
    pub block_size: usize,
    /// Element format
    pub format: MxFormat,
}

impl MxQuantized {
    /// The scale of block `b`
    #[inline]
    pub fn scale(&self, b: usize) -> E8M0 {
        E8M0::from_bits(self.scales[b])
    }

    /// Shape of the scale table: the source shape with its last extent
    /// divided by the block size
    pub fn scale_dims(&self) -> Vec<usize> {
        let mut dims = self.shape.clone();
        if let Some(last) = dims.last_mut() {
            *last /= self.block_size;
        }
        dims
    }
}

/// MX quantization operations, implemented by [`LanePool`]
pub trait MxOps {
    /// Quantize an array into FP8 elements with one shared E8M0 scale per
    /// `block_size` elements along the last axis.
    ///
    /// Per-block semantics:
    /// - scale is `2^(floor(log2(amax)) - emax)` for a finite non-zero
    ///   amax, clamped to the E8M0 range;
    /// - an all-zero block gets the identity scale and zero elements;
    /// - a block containing Inf or NaN gets the NaN scale and NaN
    ///   elements.
    fn mx_quantize<T: Element>(
        &self,
        input: &[T],
        dims: &[usize],
        opts: &MxOptions,
    ) -> Result<MxQuantized>;

    /// Decode a quantized array back to f32 (element value times block
    /// scale).
    fn mx_dequantize(&self, q: &MxQuantized) -> Result<Vec<f32>>;
}

impl MxOps for LanePool {
    fn mx_quantize<T: Element>(
        &self,
        input: &[T],
        dims: &[usize],
        opts: &MxOptions,
    ) -> Result<MxQuantized> {
        let shape = ShapeDescriptor::new(dims)?;
        let n = shape.elem_count();
        if input.len() != n {
            return Err(Error::shape_mismatch(dims, input.len()));
        }
        if opts.block_size == 0 {
            return Err(Error::invalid_argument(
                "block_size",
                "block size must be > 0",
            ));
        }
        let last = *dims.last().expect("rank >= 1 after validation");
        if last % opts.block_size != 0 {
            return Err(Error::invalid_argument(
                "block_size",
                format!(
                    "last extent {} is not divisible by block size {}",
                    last, opts.block_size
                ),
            ));
        }

        let n_blocks = n / opts.block_size;
        let mut elements = vec![0u8; n];
        let mut scales = vec![0u8; n_blocks];

        let block_size = opts.block_size;
        let format = opts.format;
        let elem_addr = elements.as_mut_ptr() as usize;
        let scale_addr = scales.as_mut_ptr() as usize;

        // Single phase: block positions are static, so lanes need no
        // offset exchange. Each lane owns a contiguous run of blocks.
        let mut ranges = partition_lanes(n_blocks, self.lane_count());
        self.run_phase(&mut ranges, |_lane, range| {
            let elem_out = elem_addr as *mut u8;
            let scale_out = scale_addr as *mut u8;
            for b in range.clone() {
                let src = &input[b * block_size..(b + 1) * block_size];
                let scale = block_scale(src, format.emax());
                // Safety: every block index lands in exactly one lane's
                // range, so the element run [b*block_size, (b+1)*block_size)
                // and the scale slot b are written by one lane only.
                unsafe {
                    scale_out.add(b).write(scale.to_bits());
                    quantize_block(src, scale, format, elem_out.add(b * block_size));
                }
            }
        });

        Ok(MxQuantized {
            elements,
            scales,
            shape: dims.to_vec(),
            block_size,
            format,
        })
    }

    fn mx_dequantize(&self, q: &MxQuantized) -> Result<Vec<f32>> {
        if q.block_size == 0 || q.elements.len() != q.scales.len() * q.block_size {
            return Err(Error::invalid_argument(
                "q",
                "element count does not match scales * block_size",
            ));
        }
        let block_size = q.block_size;
        let format = q.format;
        let mut out = vec![0.0f32; q.elements.len()];
        let out_addr = out.as_mut_ptr() as usize;
        let elements = &q.elements;
        let scales = &q.scales;

        let mut ranges = partition_lanes(scales.len(), self.lane_count());
        self.run_phase(&mut ranges, |_lane, range| {
            let out_ptr = out_addr as *mut f32;
            for b in range.clone() {
                let scale = E8M0::from_bits(scales[b]).to_f64();
                let src = &elements[b * block_size..(b + 1) * block_size];
                for (i, &byte) in src.iter().enumerate() {
                    let v = (f64::from(format.decode(byte)) * scale) as f32;
                    // Safety: disjoint block runs per lane, as in quantize.
                    unsafe { out_ptr.add(b * block_size + i).write(v) };
                }
            }
        });

        Ok(out)
    }
}

/// Derive a block's shared scale from its maximum magnitude.
///
/// Finite non-zero amax: `2^(floor(log2(amax)) - emax)`, clamped. All
/// zero: identity scale. Any non-finite magnitude: the NaN scale.
fn block_scale<T: Element>(src: &[T], emax: i32) -> E8M0 {
    let mut amax = 0.0f64;
    for v in src {
        let a = v.to_f64();
        if !a.is_finite() {
            return E8M0::NAN;
        }
        amax = amax.max(a.abs());
    }
    if amax == 0.0 {
        return E8M0::ONE;
    }
    E8M0::from_exponent(floor_log2(amax) - emax)
}

/// Quantize one block against its scale, writing `src.len()` bytes.
///
/// # Safety
/// `dst` must be valid for writes of `src.len()` bytes.
unsafe fn quantize_block<T: Element>(src: &[T], scale: E8M0, format: MxFormat, dst: *mut u8) {
    if scale.is_nan() {
        for i in 0..src.len() {
            unsafe { dst.add(i).write(format.nan_bits()) };
        }
        return;
    }
    let scale_val = scale.to_f64();
    for (i, v) in src.iter().enumerate() {
        let q = format.encode((v.to_f64() / scale_val) as f32);
        unsafe { dst.add(i).write(q) };
    }
}

/// `floor(log2(x))` for positive finite f64, from the bit pattern.
fn floor_log2(x: f64) -> i32 {
    debug_assert!(x > 0.0 && x.is_finite());
    let bits = x.to_bits();
    let e = ((bits >> 52) & 0x7FF) as i32;
    if e == 0 {
        // Subnormal: value = mant * 2^-1074
        let mant = bits & ((1u64 << 52) - 1);
        (63 - mant.leading_zeros() as i32) - 1074
    } else {
        e - 1023
    }
}
