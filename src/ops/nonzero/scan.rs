//! Element scanner: chunk bitmask construction
//!
//! Tests each element of a contiguous chunk against the all-zero bit
//! pattern and packs the results into `u64` mask words, one bit per
//! element, plus the chunk's non-zero count. Pure function of its chunk;
//! the zero test never special-cases IEEE values (`-0.0` and NaN payloads
//! are non-zero bit patterns).

use crate::dtype::Element;

/// Bits per mask word
pub(crate) const WORD_BITS: usize = 64;

/// Number of mask words needed for `n` elements
#[inline]
pub(crate) fn mask_words(n: usize) -> usize {
    n.div_ceil(WORD_BITS)
}

/// Scan `src`, writing one bit per element into `mask` (1 = non-zero).
///
/// Returns the number of set bits. Words are fully overwritten up to
/// `mask_words(src.len())`; bits past `src.len()` in the last word are
/// left clear, so a chunk ending off a word boundary still reports an
/// exact count and compacts cleanly.
pub(crate) fn scan_chunk<T: Element>(src: &[T], mask: &mut [u64]) -> usize {
    debug_assert!(mask.len() >= mask_words(src.len()));
    let mut count = 0usize;
    for (word, block) in mask.iter_mut().zip(src.chunks(WORD_BITS)) {
        let mut bits = 0u64;
        for (i, v) in block.iter().enumerate() {
            if v.is_nonzero() {
                bits |= 1u64 << i;
            }
        }
        *word = bits;
        count += bits.count_ones() as usize;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_basic() {
        let src = [0i32, 5, 0, 7];
        let mut mask = vec![0u64; mask_words(src.len())];
        let count = scan_chunk(&src, &mut mask);
        assert_eq!(count, 2);
        assert_eq!(mask[0], 0b1010);
    }

    #[test]
    fn test_scan_all_zero() {
        let src = [0u8; 200];
        let mut mask = vec![u64::MAX; mask_words(200)];
        let count = scan_chunk(&src, &mut mask);
        assert_eq!(count, 0);
        assert!(mask.iter().all(|&w| w == 0), "stale bits must be cleared");
    }

    #[test]
    fn test_scan_ragged_word_boundary() {
        // 65 elements: one full word plus a single bit in the next
        let mut src = vec![1u16; 65];
        src[3] = 0;
        let mut mask = vec![0u64; mask_words(65)];
        let count = scan_chunk(&src, &mut mask);
        assert_eq!(count, 64);
        assert_eq!(mask[0], !(1u64 << 3));
        assert_eq!(mask[1], 1);
    }

    #[test]
    fn test_scan_exactly_one_word() {
        let src = vec![1u64; 64];
        let mut mask = vec![0u64; 1];
        assert_eq!(scan_chunk(&src, &mut mask), 64);
        assert_eq!(mask[0], u64::MAX);
    }

    #[test]
    fn test_scan_float_bit_patterns() {
        let src = [0.0f32, -0.0, f32::NAN, 1.0, 0.0];
        let mut mask = vec![0u64; 1];
        let count = scan_chunk(&src, &mut mask);
        // -0.0 and NaN are non-zero bit patterns
        assert_eq!(count, 3);
        assert_eq!(mask[0], 0b01110);
    }
}
