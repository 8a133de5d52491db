//! Fixed-lane SPMD execution
//!
//! Kernels run as a small, fixed set of data-independent lanes, each
//! executing the same routine over its own chunk of the input. A phase is
//! one fork-join parallel-for over the lanes; the join is the barrier.
//! Between a kernel's two phases, the per-lane counts published in phase
//! one form the global offset table every lane reads in phase two.

use crate::error::{Error, Result};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// A pool of fixed compute lanes.
///
/// The lane count is decided at construction and never changes; kernels
/// partition work across exactly this many lanes (fewer for inputs too
/// small to distribute). With the `rayon` feature the lanes of a phase
/// run concurrently; without it they run sequentially in ascending lane
/// order with identical results.
#[derive(Clone, Debug)]
pub struct LanePool {
    lanes: usize,
}

impl LanePool {
    /// Create a pool with an explicit lane count.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] when `lanes == 0`.
    pub fn new(lanes: usize) -> Result<Self> {
        if lanes == 0 {
            return Err(Error::invalid_argument("lanes", "lane count must be > 0"));
        }
        Ok(Self { lanes })
    }

    /// Create a pool sized to the machine's available parallelism.
    pub fn with_default_lanes() -> Self {
        let lanes = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self { lanes }
    }

    /// Number of lanes in this pool.
    #[inline]
    pub fn lane_count(&self) -> usize {
        self.lanes
    }

    /// Run one phase: invoke `f` once per slot, each invocation owning
    /// its lane's slot exclusively. Returns only when every lane has
    /// finished; the caller observes the join as a full barrier.
    ///
    /// `slots.len()` is the number of active lanes for this phase and may
    /// be smaller than the pool's lane count (full-load variant).
    #[cfg(feature = "rayon")]
    pub(crate) fn run_phase<S, F>(&self, slots: &mut [S], f: F)
    where
        S: Send,
        F: Fn(usize, &mut S) + Send + Sync,
    {
        if slots.len() == 1 {
            // One active lane: nothing to fork
            f(0, &mut slots[0]);
            return;
        }
        slots
            .par_iter_mut()
            .enumerate()
            .for_each(|(lane, slot)| f(lane, slot));
    }

    /// Sequential phase execution; ascending lane order preserves the
    /// output ordering guarantees exactly.
    #[cfg(not(feature = "rayon"))]
    pub(crate) fn run_phase<S, F>(&self, slots: &mut [S], f: F)
    where
        S: Send,
        F: Fn(usize, &mut S) + Send + Sync,
    {
        for (lane, slot) in slots.iter_mut().enumerate() {
            f(lane, slot);
        }
    }
}

impl Default for LanePool {
    fn default() -> Self {
        Self::with_default_lanes()
    }
}

/// Sum of all published lane counts: the grand total sizing the output.
#[inline]
pub(crate) fn grand_total(counts: &[usize]) -> usize {
    counts.iter().sum()
}

/// Sum of all counts published by lower-numbered lanes: this lane's write
/// offset into the compacted output.
///
/// Every lane computes its own prefix by reading the whole table. The
/// lane count is small and fixed, so the O(lanes²) total cost across
/// lanes stays below any tree-scan's coordination overhead.
#[inline]
pub(crate) fn exclusive_prefix(counts: &[usize], lane: usize) -> usize {
    counts[..lane].iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_construction() {
        assert!(LanePool::new(0).is_err());
        assert_eq!(LanePool::new(4).unwrap().lane_count(), 4);
        assert!(LanePool::with_default_lanes().lane_count() >= 1);
    }

    #[test]
    fn test_run_phase_each_lane_owns_its_slot() {
        let pool = LanePool::new(4).unwrap();
        let mut slots = vec![0usize; 4];
        pool.run_phase(&mut slots, |lane, slot| {
            *slot = lane * 10 + 1;
        });
        assert_eq!(slots, vec![1, 11, 21, 31]);
    }

    #[test]
    fn test_run_phase_fewer_active_lanes() {
        let pool = LanePool::new(8).unwrap();
        let mut slots = vec![0u32; 1];
        pool.run_phase(&mut slots, |lane, slot| {
            assert_eq!(lane, 0);
            *slot = 7;
        });
        assert_eq!(slots[0], 7);
    }

    #[test]
    fn test_offset_table_arithmetic() {
        let counts = [3usize, 0, 5, 2];
        assert_eq!(grand_total(&counts), 10);
        assert_eq!(exclusive_prefix(&counts, 0), 0);
        assert_eq!(exclusive_prefix(&counts, 1), 3);
        assert_eq!(exclusive_prefix(&counts, 2), 3);
        assert_eq!(exclusive_prefix(&counts, 3), 8);
    }
}
