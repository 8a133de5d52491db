//! Coordinate decomposer: flat index to per-axis coordinates
//!
//! Processes axes most-significant first, keeping a running remainder:
//! each axis's coordinate is the remainder divided by that axis's stride
//! (via the precomputed multiply-shift constants), and the last axis's
//! coordinate is the final remainder. Only multiply/shift/subtract run
//! per axis; no hardware divide.

use crate::plan::MagicDivisor;
use crate::shape::MAX_RANK;

/// A borrowed view of the per-axis division constants for one shape.
///
/// `divisors[i]` encodes stride `i` (the product of extents after axis
/// `i`); the last axis has stride 1 and needs no entry. Rank 1 therefore
/// carries no divisors at all and decomposition is the identity.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Decomposer<'a> {
    divisors: &'a [MagicDivisor],
    rank: usize,
}

impl<'a> Decomposer<'a> {
    pub(crate) fn new(divisors: &'a [MagicDivisor], rank: usize) -> Self {
        debug_assert!(rank >= 1 && rank <= MAX_RANK);
        debug_assert_eq!(divisors.len(), rank - 1);
        Self { divisors, rank }
    }

    /// Number of axes produced per flat index
    #[inline]
    pub(crate) fn rank(&self) -> usize {
        self.rank
    }

    /// Write the coordinate tuple of `flat` into `coords[..rank]`.
    ///
    /// Intermediates are 32-bit; widening to a 64-bit output element is
    /// the writer's job.
    #[inline]
    pub(crate) fn decompose(&self, flat: u32, coords: &mut [u32; MAX_RANK]) {
        let mut remainder = flat;
        for (i, d) in self.divisors.iter().enumerate() {
            let (q, r) = d.div_rem(remainder);
            coords[i] = q;
            remainder = r;
        }
        coords[self.rank - 1] = remainder;
    }
}
