//! Common test utilities
#![allow(dead_code)]

use lanr::dtype::{Element, IndexElement};
use lanr::lane::LanePool;
use lanr::ops::nonzero::ShapeRecord;
use lanr::plan::CoordLayout;
use lanr::shape::ShapeDescriptor;

/// Create a pool with a fixed lane count for deterministic strategy
/// selection in tests
pub fn pool(lanes: usize) -> LanePool {
    LanePool::new(lanes).unwrap()
}

/// Reference oracle: flat indices of all non-zero bit patterns, in
/// ascending order, by direct sequential scan
pub fn reference_nonzero_flat<T: Element>(input: &[T]) -> Vec<usize> {
    input
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_nonzero())
        .map(|(i, _)| i)
        .collect()
}

/// Decode a coordinate table into per-element coordinate tuples,
/// regardless of layout
pub fn tuples_from_table<I: IndexElement>(coords: &[I], record: &ShapeRecord) -> Vec<Vec<usize>> {
    let count = record.count();
    let rank = record.rank();
    assert_eq!(coords.len(), count * rank, "table length vs record");
    let mut tuples = vec![vec![0usize; rank]; count];
    match record.layout {
        CoordLayout::AxisMajor => {
            for a in 0..rank {
                for j in 0..count {
                    tuples[j][a] = coords[a * count + j].to_usize();
                }
            }
        }
        CoordLayout::IndexMajor => {
            for j in 0..count {
                for a in 0..rank {
                    tuples[j][a] = coords[j * rank + a].to_usize();
                }
            }
        }
    }
    tuples
}

/// Recompose flat indices from decoded tuples via the shape's strides
pub fn flats_from_tuples(dims: &[usize], tuples: &[Vec<usize>]) -> Vec<usize> {
    let desc = ShapeDescriptor::new(dims).unwrap();
    tuples
        .iter()
        .map(|t| desc.flat_index(t).expect("tuple in range"))
        .collect()
}

/// Assert a non-zero extraction output matches the reference oracle
/// exactly: completeness, ordering, round-trip, and count agreement
pub fn assert_matches_oracle<T: Element, I: IndexElement>(
    input: &[T],
    dims: &[usize],
    coords: &[I],
    record: &ShapeRecord,
) {
    let expected = reference_nonzero_flat(input);
    assert_eq!(record.count(), expected.len(), "count agreement");
    let tuples = tuples_from_table(coords, record);
    let flats = flats_from_tuples(dims, &tuples);
    assert_eq!(flats, expected, "completeness and ordering");
    for &f in &flats {
        assert!(input[f].is_nonzero(), "round-trip reads a non-zero");
    }
}

/// Deterministic sparse test pattern: roughly one element in `period` is
/// non-zero, spread over the whole range with varied values
pub fn sparse_pattern(n: usize, period: usize) -> Vec<u8> {
    let mut v = vec![0u8; n];
    let mut i = 0usize;
    let mut step = 1usize;
    while i < n {
        v[i] = (1 + (i % 251)) as u8;
        step = step % (2 * period) + 1;
        i += (period + step) / 2 + 1;
    }
    v
}
