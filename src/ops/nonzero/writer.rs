//! Output writer: coordinate placement and the shape record
//!
//! Each lane writes its decomposed coordinates into the shared output at
//! its exclusive-prefix offset. Offsets of different lanes never overlap,
//! which is what makes the parallel writes safe without any per-element
//! synchronization; the only remaining single-writer step is the shape
//! record, produced once after the final barrier.

use super::decompose::Decomposer;
use crate::dtype::IndexElement;
use crate::plan::CoordLayout;
use crate::shape::MAX_RANK;

/// The kernel's second output: the layout marker and the two dimensions
/// of the coordinate table.
///
/// Written exactly once per invocation, after every lane has finished
/// writing its slice. A zero `count` (empty or all-zero input) still
/// produces a well-formed record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShapeRecord {
    /// Coordinate table arrangement
    pub layout: CoordLayout,
    /// First output dimension: rank for axis-major, count for index-major
    pub dim_a: usize,
    /// Second output dimension: count for axis-major, rank for index-major
    pub dim_b: usize,
}

impl ShapeRecord {
    pub(crate) fn new(layout: CoordLayout, rank: usize, count: usize) -> Self {
        let (dim_a, dim_b) = match layout {
            CoordLayout::AxisMajor => (rank, count),
            CoordLayout::IndexMajor => (count, rank),
        };
        Self {
            layout,
            dim_a,
            dim_b,
        }
    }

    /// Number of non-zero elements found
    #[inline]
    pub fn count(&self) -> usize {
        match self.layout {
            CoordLayout::AxisMajor => self.dim_b,
            CoordLayout::IndexMajor => self.dim_a,
        }
    }

    /// Rank of the source array
    #[inline]
    pub fn rank(&self) -> usize {
        match self.layout {
            CoordLayout::AxisMajor => self.dim_a,
            CoordLayout::IndexMajor => self.dim_b,
        }
    }

    /// Total number of coordinate elements in the table
    #[inline]
    pub fn table_len(&self) -> usize {
        self.dim_a * self.dim_b
    }
}

/// Decompose a batch of compacted flat indices and write their coordinate
/// tuples starting at element offset `cursor` of a table holding `total`
/// tuples.
///
/// Axis-major places axis `a`'s value for tuple `j` at
/// `a * total + cursor + j`; index-major at `(cursor + j) * rank + a`.
/// 32-bit coordinates are widened to the output element width
/// (zero-extended).
///
/// # Safety
///
/// - `out` must be valid for writes of `rank * total` elements.
/// - `cursor + flat.len() <= total`.
/// - Concurrent callers must write disjoint `[cursor, cursor + flat.len())`
///   cursor ranges; the exclusive-prefix offsets of the count exchange
///   guarantee this for lanes.
pub(crate) unsafe fn write_coords<I: IndexElement>(
    out: *mut I,
    layout: CoordLayout,
    total: usize,
    cursor: usize,
    flat: &[u32],
    dec: &Decomposer<'_>,
) {
    let rank = dec.rank();
    debug_assert!(cursor + flat.len() <= total);
    let mut coords = [0u32; MAX_RANK];
    match layout {
        CoordLayout::AxisMajor => {
            for (j, &f) in flat.iter().enumerate() {
                dec.decompose(f, &mut coords);
                for (a, &c) in coords[..rank].iter().enumerate() {
                    unsafe { out.add(a * total + cursor + j).write(I::from_u32(c)) };
                }
            }
        }
        CoordLayout::IndexMajor => {
            for (j, &f) in flat.iter().enumerate() {
                dec.decompose(f, &mut coords);
                let row = (cursor + j) * rank;
                for (a, &c) in coords[..rank].iter().enumerate() {
                    unsafe { out.add(row + a).write(I::from_u32(c)) };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::MagicDivisor;
    use smallvec::SmallVec;

    fn decomposer_2x3() -> (SmallVec<[MagicDivisor; 4]>, usize) {
        (SmallVec::from_slice(&[MagicDivisor::new(3)]), 2)
    }

    #[test]
    fn test_shape_record_dims() {
        let r = ShapeRecord::new(CoordLayout::AxisMajor, 2, 3);
        assert_eq!((r.dim_a, r.dim_b), (2, 3));
        assert_eq!(r.count(), 3);
        assert_eq!(r.rank(), 2);
        assert_eq!(r.table_len(), 6);

        let r = ShapeRecord::new(CoordLayout::IndexMajor, 2, 3);
        assert_eq!((r.dim_a, r.dim_b), (3, 2));
        assert_eq!(r.count(), 3);
        assert_eq!(r.rank(), 2);
    }

    #[test]
    fn test_shape_record_zero_count() {
        let r = ShapeRecord::new(CoordLayout::AxisMajor, 4, 0);
        assert_eq!(r.count(), 0);
        assert_eq!(r.table_len(), 0);
        assert_eq!(r.rank(), 4);
    }

    #[test]
    fn test_write_axis_major() {
        let (divs, rank) = decomposer_2x3();
        let dec = Decomposer::new(&divs, rank);
        // Flat non-zeros 1, 3, 5 of shape (2, 3)
        let flat = [1u32, 3, 5];
        let mut out = vec![0i64; 6];
        unsafe {
            write_coords(
                out.as_mut_ptr(),
                CoordLayout::AxisMajor,
                3,
                0,
                &flat,
                &dec,
            );
        }
        assert_eq!(out, vec![0, 1, 1, 1, 0, 2]);
    }

    #[test]
    fn test_write_index_major() {
        let (divs, rank) = decomposer_2x3();
        let dec = Decomposer::new(&divs, rank);
        let flat = [1u32, 3, 5];
        let mut out = vec![0i32; 6];
        unsafe {
            write_coords(
                out.as_mut_ptr(),
                CoordLayout::IndexMajor,
                3,
                0,
                &flat,
                &dec,
            );
        }
        assert_eq!(out, vec![0, 1, 1, 0, 1, 2]);
    }

    #[test]
    fn test_write_at_cursor_offset() {
        let (divs, rank) = decomposer_2x3();
        let dec = Decomposer::new(&divs, rank);
        let mut out = vec![-1i32; 6];
        // Second batch of a 3-tuple table: tuple index 2 only
        unsafe {
            write_coords(
                out.as_mut_ptr(),
                CoordLayout::AxisMajor,
                3,
                2,
                &[5u32],
                &dec,
            );
        }
        assert_eq!(out, vec![-1, -1, 1, -1, -1, 2]);
    }

    #[test]
    fn test_write_empty_batch_is_noop() {
        let (divs, rank) = decomposer_2x3();
        let dec = Decomposer::new(&divs, rank);
        let mut out = vec![7i32; 6];
        unsafe {
            write_coords(out.as_mut_ptr(), CoordLayout::AxisMajor, 3, 3, &[], &dec);
        }
        assert_eq!(out, vec![7; 6]);
    }
}
