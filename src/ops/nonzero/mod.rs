//! Non-zero coordinate extraction
//!
//! Given an N-dimensional row-major array, produce the per-axis
//! coordinates (or flat indices, for rank 1) of every element whose bit
//! pattern is non-zero, compacted into a contiguous table in ascending
//! flat-index order, plus a shape record describing the table.
//!
//! The operation runs as two fork-join phases over the fixed lanes:
//!
//! 1. **Count**: each lane scans its contiguous chunk range, building
//!    bitmasks and publishing its non-zero count to the offset table.
//!    The join is the barrier that makes every count visible.
//! 2. **Write**: each lane independently sums the lower lanes' counts to
//!    get its exclusive write offset, then compacts its masks into flat
//!    indices, decomposes them into coordinates, and writes its slice of
//!    the output. Slices are disjoint by construction, so the writes need
//!    no locking; after the join the shape record is produced exactly
//!    once.

mod compact;
mod decompose;
mod scan;
mod writer;

pub use writer::ShapeRecord;

use crate::dtype::{DType, Element, IndexDType, IndexElement};
use crate::error::{Error, Result};
use crate::lane::{LanePool, exclusive_prefix, grand_total};
use crate::plan::{CHUNK_ELEMS, CoordLayout, NonZeroOptions, NonZeroPlan, Strategy};
use compact::compact_mask;
use decompose::Decomposer;
use scan::{WORD_BITS, mask_words, scan_chunk};
use std::ops::Range;

/// Result of an allocating non-zero extraction: the coordinate table and
/// the record describing its dimensions.
#[derive(Clone, Debug)]
pub struct NonZeroOutput<I> {
    /// Coordinate table, laid out per the record's layout marker
    pub coords: Vec<I>,
    /// Layout marker and table dimensions
    pub record: ShapeRecord,
}

/// Coordinate table of the dtype-erased entry point
#[derive(Clone, Debug)]
pub enum DynCoords {
    /// 32-bit coordinates
    I32(Vec<i32>),
    /// 64-bit coordinates
    I64(Vec<i64>),
}

impl DynCoords {
    /// Number of coordinate elements in the table
    pub fn len(&self) -> usize {
        match self {
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
        }
    }

    /// True when the table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Non-zero extraction operations, implemented by [`LanePool`]
pub trait NonZeroOps {
    /// Extract non-zero coordinates, allocating the exactly-sized output.
    ///
    /// Builds a single-use plan for `dims` and this pool's lane count.
    /// For repeated extractions over one shape, build a [`NonZeroPlan`]
    /// once and use [`NonZeroOps::nonzero_with_plan`].
    fn nonzero<T: Element, I: IndexElement>(
        &self,
        input: &[T],
        dims: &[usize],
        layout: CoordLayout,
    ) -> Result<NonZeroOutput<I>>;

    /// Extract non-zero coordinates under a prebuilt plan, allocating the
    /// exactly-sized output.
    fn nonzero_with_plan<T: Element, I: IndexElement>(
        &self,
        plan: &NonZeroPlan,
        input: &[T],
    ) -> Result<NonZeroOutput<I>>;

    /// Extract non-zero coordinates into a caller-provided buffer.
    ///
    /// `out` must hold the documented worst case
    /// ([`NonZeroPlan::worst_case_output_len`], i.e. `elem_count * rank`);
    /// the real extent of the written table is read from the returned
    /// record. Elements past the table are left untouched.
    fn nonzero_into<T: Element, I: IndexElement>(
        &self,
        plan: &NonZeroPlan,
        input: &[T],
        out: &mut [I],
    ) -> Result<ShapeRecord>;

    /// Dtype-erased extraction over a raw byte buffer.
    ///
    /// `data` must be aligned for `dtype` and hold exactly the shape's
    /// element count.
    fn nonzero_bytes(
        &self,
        dtype: DType,
        data: &[u8],
        dims: &[usize],
        opts: &NonZeroOptions,
    ) -> Result<(DynCoords, ShapeRecord)>;
}

impl NonZeroOps for LanePool {
    fn nonzero<T: Element, I: IndexElement>(
        &self,
        input: &[T],
        dims: &[usize],
        layout: CoordLayout,
    ) -> Result<NonZeroOutput<I>> {
        let plan = NonZeroPlan::new(dims, self.lane_count(), layout)?;
        self.nonzero_with_plan(&plan, input)
    }

    fn nonzero_with_plan<T: Element, I: IndexElement>(
        &self,
        plan: &NonZeroPlan,
        input: &[T],
    ) -> Result<NonZeroOutput<I>> {
        validate_input(plan, input)?;
        let rank = plan.shape().rank();

        if plan.strategy() == Strategy::Empty {
            return Ok(NonZeroOutput {
                coords: Vec::new(),
                record: ShapeRecord::new(plan.layout(), rank, 0),
            });
        }

        let mut ctxs = make_lane_ctxs(plan);
        count_phase(self, plan, input, &mut ctxs);

        let counts: Vec<usize> = ctxs.iter().map(|c| c.count).collect();
        let total = grand_total(&counts);

        let mut coords = vec![I::from_u32(0); total * rank];
        write_phase::<T, I>(
            self,
            plan,
            input,
            &mut ctxs,
            &counts,
            total,
            coords.as_mut_ptr() as usize,
        );

        Ok(NonZeroOutput {
            coords,
            record: ShapeRecord::new(plan.layout(), rank, total),
        })
    }

    fn nonzero_into<T: Element, I: IndexElement>(
        &self,
        plan: &NonZeroPlan,
        input: &[T],
        out: &mut [I],
    ) -> Result<ShapeRecord> {
        validate_input(plan, input)?;
        let rank = plan.shape().rank();
        let needed = plan.worst_case_output_len();
        if out.len() < needed {
            return Err(Error::OutputTooSmall {
                needed,
                got: out.len(),
            });
        }

        if plan.strategy() == Strategy::Empty {
            return Ok(ShapeRecord::new(plan.layout(), rank, 0));
        }

        let mut ctxs = make_lane_ctxs(plan);
        count_phase(self, plan, input, &mut ctxs);

        let counts: Vec<usize> = ctxs.iter().map(|c| c.count).collect();
        let total = grand_total(&counts);

        write_phase::<T, I>(
            self,
            plan,
            input,
            &mut ctxs,
            &counts,
            total,
            out.as_mut_ptr() as usize,
        );

        Ok(ShapeRecord::new(plan.layout(), rank, total))
    }

    fn nonzero_bytes(
        &self,
        dtype: DType,
        data: &[u8],
        dims: &[usize],
        opts: &NonZeroOptions,
    ) -> Result<(DynCoords, ShapeRecord)> {
        crate::dispatch_dtype!(dtype, T => {
            let input: &[T] = bytemuck::try_cast_slice(data)
                .map_err(|e| Error::invalid_argument("data", e.to_string()))?;
            let plan = NonZeroPlan::new(dims, self.lane_count(), opts.layout)?;
            match opts.index_dtype {
                IndexDType::I32 => {
                    let out = self.nonzero_with_plan::<T, i32>(&plan, input)?;
                    Ok((DynCoords::I32(out.coords), out.record))
                }
                IndexDType::I64 => {
                    let out = self.nonzero_with_plan::<T, i64>(&plan, input)?;
                    Ok((DynCoords::I64(out.coords), out.record))
                }
            }
        }, "nonzero")
    }
}

fn validate_input<T: Element>(plan: &NonZeroPlan, input: &[T]) -> Result<()> {
    let n = plan.shape().elem_count();
    if input.len() != n {
        return Err(Error::shape_mismatch(plan.shape().dims(), input.len()));
    }
    Ok(())
}

// ============================================================================
// Lane context and phases
// ============================================================================

/// Per-lane transient state, created at kernel entry and reused across
/// sub-chunks of one invocation. Holding it in an explicit struct keeps
/// the lanes independent of everything except the two phase barriers.
struct LaneCtx {
    /// This lane's flat-index range (contiguous, ascending across lanes)
    range: Range<usize>,
    /// Finalized non-zero count, published at the end of phase one
    count: usize,
    /// Bitmask words: the whole lane span for the retained-mask variants,
    /// one sub-chunk's worth for the rescanning variant
    mask: Vec<u64>,
    /// Per-sub-chunk counts spilled during phase one (rescanning variant)
    chunk_counts: Vec<usize>,
    /// Compacted flat indices of the current sub-chunk, reused
    flat: Vec<u32>,
}

fn make_lane_ctxs(plan: &NonZeroPlan) -> Vec<LaneCtx> {
    plan.lane_ranges()
        .iter()
        .map(|range| {
            let span = range.len();
            let mask_len = match plan.strategy() {
                Strategy::BigMask => mask_words(span.min(CHUNK_ELEMS)),
                _ => mask_words(span),
            };
            LaneCtx {
                range: range.clone(),
                count: 0,
                mask: vec![0u64; mask_len],
                chunk_counts: Vec::new(),
                flat: Vec::with_capacity(span.min(CHUNK_ELEMS)),
            }
        })
        .collect()
}

/// Phase one: scan and count. The fork-join return is the barrier after
/// which every lane's count is visible.
fn count_phase<T: Element>(
    pool: &LanePool,
    plan: &NonZeroPlan,
    input: &[T],
    ctxs: &mut [LaneCtx],
) {
    let strategy = plan.strategy();
    pool.run_phase(ctxs, |_lane, ctx| match strategy {
        Strategy::Empty => unreachable!("empty inputs never enter the parallel phases"),
        Strategy::FullLoad | Strategy::SmallMask => {
            ctx.count = scan_chunk(&input[ctx.range.clone()], &mut ctx.mask);
        }
        Strategy::BigMask => {
            ctx.chunk_counts.clear();
            let mut count = 0usize;
            let mut start = ctx.range.start;
            while start < ctx.range.end {
                let end = (start + CHUNK_ELEMS).min(ctx.range.end);
                let words = mask_words(end - start);
                let c = scan_chunk(&input[start..end], &mut ctx.mask[..words]);
                ctx.chunk_counts.push(c);
                count += c;
                start = end;
            }
            ctx.count = count;
        }
    });
}

/// Phase two: compact, decompose, and write. Each lane derives its write
/// offset from the offset table and owns a disjoint slice of the output;
/// the fork-join return is the barrier before the shape record is
/// finalized by the caller.
fn write_phase<T: Element, I: IndexElement>(
    pool: &LanePool,
    plan: &NonZeroPlan,
    input: &[T],
    ctxs: &mut [LaneCtx],
    counts: &[usize],
    total: usize,
    out_addr: usize,
) {
    let strategy = plan.strategy();
    let layout = plan.layout();
    let rank = plan.shape().rank();
    let divisors = plan.divisors();

    pool.run_phase(ctxs, |lane, ctx| {
        let dec = Decomposer::new(divisors, rank);
        let out = out_addr as *mut I;
        let mut cursor = exclusive_prefix(counts, lane);

        match strategy {
            Strategy::Empty => unreachable!("empty inputs never enter the parallel phases"),
            Strategy::FullLoad | Strategy::SmallMask => {
                // Compact the retained mask one sub-chunk of words at a
                // time, reusing the flat-index buffer.
                let words_per_chunk = CHUNK_ELEMS / WORD_BITS;
                for (c, word_chunk) in ctx.mask.chunks(words_per_chunk).enumerate() {
                    let base = (ctx.range.start + c * CHUNK_ELEMS) as u32;
                    ctx.flat.clear();
                    let appended = compact_mask(word_chunk, base, &mut ctx.flat);
                    if appended == 0 {
                        continue;
                    }
                    // Safety: cursor ranges of all lanes are disjoint and
                    // within `total`; the output holds `rank * total`
                    // elements (checked at the entry points).
                    unsafe { writer::write_coords(out, layout, total, cursor, &ctx.flat, &dec) };
                    cursor += appended;
                }
            }
            Strategy::BigMask => {
                // Rescan each sub-chunk; the spilled per-chunk counts
                // drive the write cursor.
                let mut start = ctx.range.start;
                let mut chunk = 0usize;
                while start < ctx.range.end {
                    let end = (start + CHUNK_ELEMS).min(ctx.range.end);
                    let spilled = ctx.chunk_counts[chunk];
                    if spilled == 0 {
                        start = end;
                        chunk += 1;
                        continue;
                    }
                    let words = mask_words(end - start);
                    let rescanned = scan_chunk(&input[start..end], &mut ctx.mask[..words]);
                    debug_assert_eq!(rescanned, spilled);
                    ctx.flat.clear();
                    compact_mask(&ctx.mask[..words], start as u32, &mut ctx.flat);
                    // Safety: as above; the spilled counts reproduce the
                    // same disjoint cursor ranges as phase one.
                    unsafe { writer::write_coords(out, layout, total, cursor, &ctx.flat, &dec) };
                    cursor += spilled;
                    start = end;
                    chunk += 1;
                }
            }
        }

        debug_assert_eq!(cursor, exclusive_prefix(counts, lane) + ctx.count);
    });
}
