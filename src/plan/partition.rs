//! Lane work partitioning
//!
//! Lanes own contiguous, non-overlapping, ascending ranges of the flat
//! index space. Ascending assignment is load-bearing: together with
//! in-lane ascending compaction it makes the concatenated output globally
//! ascending without any merge step.

use std::ops::Range;

/// Split `0..n` into `lanes` contiguous ascending ranges.
///
/// The remainder is spread one element at a time over the leading lanes,
/// so range lengths differ by at most one. Trailing lanes may receive
/// empty ranges when `n < lanes`; they still participate in both phases
/// (publishing a zero count).
pub fn partition_lanes(n: usize, lanes: usize) -> Vec<Range<usize>> {
    debug_assert!(lanes > 0);
    let base = n / lanes;
    let extra = n % lanes;
    let mut ranges = Vec::with_capacity(lanes);
    let mut start = 0usize;
    for lane in 0..lanes {
        let len = base + usize::from(lane < extra);
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, n);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let r = partition_lanes(12, 4);
        assert_eq!(r, vec![0..3, 3..6, 6..9, 9..12]);
    }

    #[test]
    fn test_remainder_spread_to_leading_lanes() {
        let r = partition_lanes(10, 4);
        assert_eq!(r, vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn test_more_lanes_than_elements() {
        let r = partition_lanes(2, 4);
        assert_eq!(r, vec![0..1, 1..2, 2..2, 2..2]);
    }

    #[test]
    fn test_contiguous_ascending_cover() {
        for n in [0usize, 1, 7, 64, 1000] {
            for lanes in [1usize, 2, 3, 8] {
                let ranges = partition_lanes(n, lanes);
                assert_eq!(ranges.len(), lanes);
                let mut cursor = 0;
                for r in &ranges {
                    assert_eq!(r.start, cursor);
                    cursor = r.end;
                }
                assert_eq!(cursor, n);
            }
        }
    }
}
