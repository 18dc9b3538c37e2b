//! The merged CSR layout: adjacency and per-vertex mutable state interleaved
//! in one contiguous buffer, so a worker touches one cache line per vertex
//! during edge relaxation.
//!
//! Grounded on `merged_csr.{c,h}` (distances shape, 2-word header) and
//! `implementations/merged_csr_parents.cpp` (parents shape, 3-word header).
//! Mutable header cells are `AtomicU32` rather than plain `u32`: concurrent
//! distance/parent writes are a benign race (every racing writer stores the
//! same value), but that's only true under relaxed *atomic* stores, never a
//! plain data race. Immutable cells (degree, neighbor offsets, vertex id)
//! share the same buffer type for layout simplicity and are only ever
//! `load`ed after construction.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::VERT_MAX;
use crate::csr::Csr;
use crate::error::{Error, Result};

/// Which header layout a [`MergedLayout`] was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Header `[degree, distance]`, `H = 2`.
    Distances,
    /// Header `[vertex_id, parent, degree]`, `H = 3`.
    Parents,
}

impl Shape {
    #[inline]
    pub fn header_width(self) -> u32 {
        match self {
            Shape::Distances => 2,
            Shape::Parents => 3,
        }
    }
}

/// Owns the interleaved adjacency+metadata array for one CSR graph. Lives for
/// the engine's lifetime and is reset in place at the end of every BFS run.
pub struct MergedLayout {
    shape: Shape,
    nrows: u32,
    merged: Vec<AtomicU32>,
    row_ptr_merged: Vec<u32>,
}

impl MergedLayout {
    /// Single pass over the CSR, O(N+M). Reserves the merged buffer's
    /// capacity up front with `try_reserve_exact` rather than a plain
    /// allocation: on a graph large enough to exhaust memory, this reports
    /// [`Error::AllocationFailure`] instead of aborting the process, mirroring
    /// the original's `malloc`-returns-`NULL` checks.
    pub fn build(csr: &Csr, shape: Shape) -> Result<Self> {
        let h = shape.header_width();
        let nrows = csr.nrows;

        // Offsets are 32-bit; for very large graphs `nnz + H*nrows` can
        // overflow. Assert the constraint rather than silently wrapping.
        debug_assert!(
            (csr.nnz as u64) + (h as u64) * (nrows as u64) < u32::MAX as u64,
            "merged layout offset would overflow a 32-bit EOff"
        );

        let mut row_ptr_merged = vec![0u32; nrows as usize + 1];
        for v in 0..=nrows {
            row_ptr_merged[v as usize] = csr.row_ptr[v as usize] + h * v;
        }

        let total = csr.nnz + h * nrows;
        let mut merged: Vec<AtomicU32> = Vec::new();
        merged
            .try_reserve_exact(total as usize)
            .map_err(|_| Error::AllocationFailure)?;

        for v in 0..nrows {
            let degree = csr.degree(v);
            match shape {
                Shape::Distances => {
                    merged.push(AtomicU32::new(degree));
                    merged.push(AtomicU32::new(VERT_MAX));
                }
                Shape::Parents => {
                    merged.push(AtomicU32::new(v));
                    merged.push(AtomicU32::new(VERT_MAX));
                    merged.push(AtomicU32::new(degree));
                }
            }
            for &n in csr.neighbors(v) {
                let neighbor_off = row_ptr_merged[n as usize];
                merged.push(AtomicU32::new(neighbor_off));
            }
        }

        Ok(MergedLayout {
            shape,
            nrows,
            merged,
            row_ptr_merged,
        })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    /// Offset of `v`'s header in the merged array.
    #[inline]
    pub fn header_of(&self, v: u32) -> u32 {
        self.row_ptr_merged[v as usize]
    }

    #[inline]
    pub fn degree_at(&self, off: u32) -> u32 {
        let idx = match self.shape {
            Shape::Distances => off,
            Shape::Parents => off + 2,
        };
        self.merged[idx as usize].load(Ordering::Relaxed)
    }

    /// Distances shape only: the current distance, or [`VERT_MAX`] if unset.
    #[inline]
    pub fn distance_at(&self, off: u32) -> u32 {
        debug_assert_eq!(self.shape, Shape::Distances);
        self.merged[off as usize + 1].load(Ordering::Relaxed)
    }

    /// Distances shape only: the visited test-and-set. Returns `true` if this
    /// call won the race and should propagate the vertex into the next
    /// frontier's candidate set; `false` if some worker (possibly this one,
    /// racing itself) had already recorded `level`.
    ///
    /// All racing writers store the same `level` (the current BFS level), so
    /// the relaxed store below is safe even though more than one worker may
    /// perform it: every write racing here is identical, so it never matters
    /// which one "wins".
    #[inline]
    pub fn try_set_distance(&self, off: u32, level: u32) -> bool {
        debug_assert_eq!(self.shape, Shape::Distances);
        let cell = &self.merged[off as usize + 1];
        if cell.load(Ordering::Relaxed) == VERT_MAX {
            cell.store(level, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Parents shape only: the current parent, or [`VERT_MAX`] if unset.
    #[inline]
    pub fn parent_at(&self, off: u32) -> u32 {
        debug_assert_eq!(self.shape, Shape::Parents);
        self.merged[off as usize + 1].load(Ordering::Relaxed)
    }

    /// Parents shape only: visited test-and-set recording `parent_id`.
    #[inline]
    pub fn try_set_parent(&self, off: u32, parent_id: u32) -> bool {
        debug_assert_eq!(self.shape, Shape::Parents);
        let cell = &self.merged[off as usize + 1];
        if cell.load(Ordering::Relaxed) == VERT_MAX {
            cell.store(parent_id, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Parents shape only: the vertex id stored in `off`'s header, needed
    /// because neighbors are stored as offsets rather than ids.
    #[inline]
    pub fn id_at(&self, off: u32) -> u32 {
        debug_assert_eq!(self.shape, Shape::Parents);
        self.merged[off as usize].load(Ordering::Relaxed)
    }

    /// Merged-offsets of `v`'s neighbors (not raw vertex ids), given `v`'s
    /// header offset.
    #[inline]
    pub fn neighbor_offsets(&self, header_off: u32) -> &[AtomicU32] {
        let h = self.shape.header_width();
        let start = header_off + h;
        let end = start + self.degree_at(header_off);
        &self.merged[start as usize..end as usize]
    }

    /// Resets the mutable cells owned by `worker_id`'s stripe
    /// `[worker_id * ceil(N/T), ...)` back to their sentinel, fusing the
    /// reset with finalization's write-out.
    pub fn reset_stripe(&self, worker_id: u32, threads: u32) {
        let (start, end) = vertex_stripe(self.nrows, worker_id, threads);
        for v in start..end {
            let off = self.header_of(v);
            // Distance and parent share the same header slot (index 1).
            self.merged[off as usize + 1].store(VERT_MAX, Ordering::Relaxed);
        }
    }

    /// Resets every mutable cell, used to build a fresh layout or to verify
    /// idempotence of a reset independent of any particular worker count.
    pub fn reset_all(&self) {
        self.reset_stripe(0, 1);
    }
}

/// The half-open vertex range `[worker_id * ceil(N/T), min((worker_id+1) *
/// ceil(N/T), N))` assigned to `worker_id` out of `threads` workers, used by
/// both [`MergedLayout::reset_stripe`] and finalization.
#[inline]
pub fn vertex_stripe(nrows: u32, worker_id: u32, threads: u32) -> (u32, u32) {
    let per_worker = nrows.div_ceil(threads);
    let start = (worker_id * per_worker).min(nrows);
    let end = ((worker_id + 1) * per_worker).min(nrows);
    (start, end)
}
