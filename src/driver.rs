//! The two level-synchronous traversal drivers: a chunk-based top-down walk
//! over a [`MergedLayout`], and a bitmap-based direction-optimizing walk over
//! a plain [`Csr`]. [`crate::engine::Engine`] picks one per graph and reuses
//! its state across every source in a run.
//!
//! Grounded on `bfs.c`'s `thread_main`/`top_down`/`top_down_chunk` for the
//! former, and `implementations/bitmap.cpp`'s `BFS`/`top_down_step`/
//! `bottom_up_step` for the latter.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::chunk::Chunk;
use crate::csr::Csr;
use parking_lot::Mutex;

use crate::direction::{Direction, DirectionPolicy};
use crate::frontier::{FrontierPool, WorkerLocal};
use crate::layout::{vertex_stripe, MergedLayout, Shape};

/// Persistent state for the chunk-based top-down driver: a pair of
/// [`FrontierPool`]s swapped each level, and the barrier counters that
/// replace `bfs.c`'s file-scope `active_threads`/`distance`/
/// `exploration_done` globals.
pub struct TopDownState {
    frontiers: [FrontierPool; 2],
    current: AtomicUsize,
    active_remaining: AtomicUsize,
    level: AtomicU32,
    done: AtomicBool,
    threads: usize,
}

impl TopDownState {
    pub fn new(threads: usize) -> Self {
        TopDownState {
            frontiers: [FrontierPool::new(threads), FrontierPool::new(threads)],
            current: AtomicUsize::new(0),
            active_remaining: AtomicUsize::new(threads),
            level: AtomicU32::new(1),
            done: AtomicBool::new(false),
            threads,
        }
    }

    /// Seeds the run with `source`'s header offset. Called by the
    /// coordinator before waking the workers for this cycle.
    pub fn begin_run(&self, layout: &MergedLayout, source_header_off: u32) {
        self.current.store(0, Ordering::Relaxed);
        self.level.store(1, Ordering::Relaxed);
        self.done.store(false, Ordering::Relaxed);
        self.active_remaining.store(self.threads, Ordering::SeqCst);

        match layout.shape() {
            Shape::Distances => {
                layout.try_set_distance(source_header_off, 0);
            }
            Shape::Parents => {
                let self_id = layout.id_at(source_header_off);
                layout.try_set_parent(source_header_off, self_id);
            }
        }

        // Stash immediately rather than leaving it in a local `scratch`:
        // nothing else holds a reference to that scratch once `begin_run`
        // returns, so an unstashed push here would simply vanish.
        let mut local = WorkerLocal::new(0, self.threads);
        self.frontiers[0].push_vertex(0, &mut local, source_header_off);
        self.frontiers[0].push_chunk(0, local.take_scratch());
        std::sync::atomic::fence(Ordering::SeqCst);
    }

    /// The per-worker routine for one complete BFS run: loops levels until
    /// the frontier empties, then writes this worker's stripe of the result
    /// into `out` and resets `layout`'s stripe back to the sentinel.
    pub fn worker_step(&self, worker_id: usize, layout: &MergedLayout, out: &[AtomicU32]) {
        loop {
            if self.done.load(Ordering::Acquire) {
                break;
            }
            let old_level = self.level.load(Ordering::Relaxed);
            let cur_idx = self.current.load(Ordering::Relaxed);
            let this_pool = &self.frontiers[cur_idx];
            let next_pool = &self.frontiers[1 - cur_idx];

            let mut drain_local = WorkerLocal::new(worker_id, self.threads);
            let mut push_local = WorkerLocal::new(worker_id, self.threads);

            while let Some(mut chunk) = this_pool.take_chunk(worker_id, &mut drain_local) {
                expand_chunk(layout, next_pool, worker_id, &mut push_local, &mut chunk, old_level);
            }

            // Work stealing: keep sweeping donors with more than one chunk
            // stacked until nobody has spare work. Skipping single-chunk
            // donors avoids threads with nothing of their own racing each
            // other over the last chunk of a nearly-finished level.
            loop {
                let mut stole_any = false;
                for donor in 0..self.threads {
                    if donor == worker_id || this_pool.stacked_chunks(donor) <= 1 {
                        continue;
                    }
                    let mut donor_local = WorkerLocal::new(donor, self.threads);
                    if let Some(mut chunk) = this_pool.take_chunk(donor, &mut donor_local) {
                        stole_any = true;
                        expand_chunk(layout, next_pool, worker_id, &mut push_local, &mut chunk, old_level);
                    }
                }
                if !stole_any {
                    break;
                }
            }

            if !push_local.scratch_is_empty() {
                next_pool.push_chunk(worker_id, push_local.take_scratch());
            }

            if self.active_remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                self.current.store(1 - cur_idx, Ordering::Relaxed);
                if next_pool.total_chunks_approx() == 0 {
                    self.done.store(true, Ordering::Relaxed);
                }
                self.active_remaining.store(self.threads, Ordering::SeqCst);
                std::sync::atomic::fence(Ordering::SeqCst);
                self.level.fetch_add(1, Ordering::Relaxed);
            }
            while self.level.load(Ordering::Relaxed) == old_level && !self.done.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }

        let (start, end) = vertex_stripe(layout.nrows(), worker_id as u32, self.threads as u32);
        for v in start..end {
            let off = layout.header_of(v);
            let value = match layout.shape() {
                Shape::Distances => layout.distance_at(off),
                Shape::Parents => layout.parent_at(off),
            };
            out[v as usize].store(value, Ordering::Relaxed);
        }
        layout.reset_stripe(worker_id as u32, self.threads as u32);
    }
}

fn expand_chunk(
    layout: &MergedLayout,
    next_pool: &FrontierPool,
    worker_id: usize,
    push_local: &mut WorkerLocal,
    chunk: &mut Chunk,
    level: u32,
) {
    while let Some(off) = chunk.pop() {
        let parent_id = match layout.shape() {
            Shape::Parents => Some(layout.id_at(off)),
            Shape::Distances => None,
        };
        for neighbor_cell in layout.neighbor_offsets(off) {
            let neighbor_off = neighbor_cell.load(Ordering::Relaxed);
            let won = match layout.shape() {
                Shape::Distances => layout.try_set_distance(neighbor_off, level),
                Shape::Parents => layout.try_set_parent(neighbor_off, parent_id.unwrap()),
            };
            if won && layout.degree_at(neighbor_off) != 1 {
                next_pool.push_vertex(worker_id, push_local, neighbor_off);
            }
        }
    }
}

/// Persistent state for the direction-optimizing driver: three flat
/// membership arrays sized to the graph (`this_frontier`, `next_frontier`,
/// `visited`) and a running distance array, all reused across runs.
///
/// Grounded on `implementations/bitmap.cpp`. Kept as `AtomicBool`/`AtomicU32`
/// rather than a packed bitset: a top-down step may write any neighbor's
/// cell from any worker's thread (the same benign race `layout.rs`
/// documents), and a packed bitset would turn that into a real data race by
/// aliasing unrelated vertices into the same machine word.
pub struct DirectionOptimizingState {
    this_frontier: Vec<AtomicBool>,
    next_frontier: Vec<AtomicBool>,
    visited: Vec<AtomicBool>,
    distances: Vec<AtomicU32>,
    edges_frontier: Vec<AtomicUsize>,
    vertices_frontier: Vec<AtomicUsize>,
    policy_dir: AtomicBool, // false = TopDown, true = BottomUp
    /// The persistent direction heuristic, advanced by whichever worker wins
    /// the level barrier. A `Mutex` rather than a plain field because it is
    /// mutated from whatever thread happens to finish last, not from one
    /// fixed coordinator thread; contention is one lock/unlock per level.
    policy: Mutex<DirectionPolicy>,
    level: AtomicU32,
    barrier_remaining: AtomicUsize,
    done: AtomicBool,
    threads: usize,
}

impl DirectionOptimizingState {
    pub fn new(nrows: usize, nnz: u64, threads: usize) -> Self {
        DirectionOptimizingState {
            this_frontier: (0..nrows).map(|_| AtomicBool::new(false)).collect(),
            next_frontier: (0..nrows).map(|_| AtomicBool::new(false)).collect(),
            visited: (0..nrows).map(|_| AtomicBool::new(false)).collect(),
            distances: (0..nrows).map(|_| AtomicU32::new(crate::config::VERT_MAX)).collect(),
            edges_frontier: (0..threads).map(|_| AtomicUsize::new(0)).collect(),
            vertices_frontier: (0..threads).map(|_| AtomicUsize::new(0)).collect(),
            policy_dir: AtomicBool::new(false),
            policy: Mutex::new(DirectionPolicy::new(nnz)),
            level: AtomicU32::new(1),
            barrier_remaining: AtomicUsize::new(threads),
            done: AtomicBool::new(false),
            threads,
        }
    }

    pub fn begin_run(&self, csr: &Csr, source: u32) {
        for cell in &self.this_frontier {
            cell.store(false, Ordering::Relaxed);
        }
        for cell in &self.next_frontier {
            cell.store(false, Ordering::Relaxed);
        }
        for cell in &self.visited {
            cell.store(false, Ordering::Relaxed);
        }
        for cell in &self.distances {
            cell.store(crate::config::VERT_MAX, Ordering::Relaxed);
        }
        self.this_frontier[source as usize].store(true, Ordering::Relaxed);
        self.visited[source as usize].store(true, Ordering::Relaxed);
        self.distances[source as usize].store(0, Ordering::Relaxed);

        // Seed the direction decision with the source's own (degree, 1)
        // frontier counts before level 1 runs, the same way the original's
        // `BFS` evaluates its switch condition once against the source's
        // degree before ever entering its step loop. A sufficiently
        // high-degree source can therefore start the whole run in bottom-up
        // mode.
        let mut policy = DirectionPolicy::new(csr.nnz as u64);
        let seed_dir = policy.advance(csr.degree(source) as u64, 1, csr.nrows as u64);
        self.policy_dir.store(seed_dir == Direction::BottomUp, Ordering::Relaxed);
        *self.policy.lock() = policy;

        self.level.store(1, Ordering::Relaxed);
        self.done.store(false, Ordering::Relaxed);
        self.barrier_remaining.store(self.threads, Ordering::SeqCst);
        std::sync::atomic::fence(Ordering::SeqCst);
    }

    /// Run once by whichever worker wins the level barrier: folds this
    /// level's frontier counts into the persistent direction policy and
    /// flags completion once the frontier has emptied. Mirrors
    /// `Bitmap::BFS`'s single-threaded `do`/`while` shell wrapped around its
    /// two `#pragma omp parallel for` steps.
    fn coordinator_advance(&self, nrows: u64) {
        let edges: u64 = self.edges_frontier.iter().map(|c| c.swap(0, Ordering::Relaxed) as u64).sum();
        let vertices: u64 = self.vertices_frontier.iter().map(|c| c.swap(0, Ordering::Relaxed) as u64).sum();
        if vertices == 0 {
            self.done.store(true, Ordering::Relaxed);
            return;
        }
        let next_dir = self.policy.lock().advance(edges, vertices, nrows);
        self.policy_dir.store(next_dir == Direction::BottomUp, Ordering::Relaxed);
    }

    pub fn worker_step(&self, worker_id: usize, csr: &Csr) {
        let (start, end) = vertex_stripe(csr.nrows, worker_id as u32, self.threads as u32);
        loop {
            if self.done.load(Ordering::Acquire) {
                break;
            }
            let old_level = self.level.load(Ordering::Relaxed);
            let level = old_level;
            let bottom_up = self.policy_dir.load(Ordering::Relaxed);

            let mut local_edges = 0usize;
            let mut local_vertices = 0usize;

            if bottom_up {
                for v in start..end {
                    if self.visited[v as usize].load(Ordering::Relaxed) {
                        continue;
                    }
                    for &n in csr.neighbors(v) {
                        if self.this_frontier[n as usize].load(Ordering::Relaxed) {
                            self.next_frontier[v as usize].store(true, Ordering::Relaxed);
                            self.visited[v as usize].store(true, Ordering::Relaxed);
                            self.distances[v as usize].store(level, Ordering::Relaxed);
                            local_edges += csr.degree(v) as usize;
                            local_vertices += 1;
                            break;
                        }
                    }
                }
            } else {
                for v in start..end {
                    if !self.this_frontier[v as usize].load(Ordering::Relaxed) {
                        continue;
                    }
                    for &n in csr.neighbors(v) {
                        if !self.visited[n as usize].swap(true, Ordering::Relaxed) {
                            self.next_frontier[n as usize].store(true, Ordering::Relaxed);
                            self.distances[n as usize].store(level, Ordering::Relaxed);
                            local_edges += csr.degree(n) as usize;
                            local_vertices += 1;
                        }
                    }
                }
            }
            self.edges_frontier[worker_id].fetch_add(local_edges, Ordering::Relaxed);
            self.vertices_frontier[worker_id].fetch_add(local_vertices, Ordering::Relaxed);

            for v in start..end {
                self.this_frontier[v as usize].store(false, Ordering::Relaxed);
                if self.next_frontier[v as usize].swap(false, Ordering::Relaxed) {
                    self.this_frontier[v as usize].store(true, Ordering::Relaxed);
                }
            }

            if self.barrier_remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                self.coordinator_advance(csr.nrows as u64);
                self.barrier_remaining.store(self.threads, Ordering::SeqCst);
                std::sync::atomic::fence(Ordering::SeqCst);
                self.level.fetch_add(1, Ordering::Relaxed);
            }
            while self.level.load(Ordering::Relaxed) == old_level && !self.done.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    /// Reads out the finished run's distances. Only valid to call once every
    /// worker has returned from [`DirectionOptimizingState::worker_step`]
    /// (guaranteed by [`crate::pool::WorkerPool::run_cycle`] having
    /// returned), at which point there are no concurrent writers left.
    pub fn snapshot_distances(&self) -> Vec<u32> {
        self.distances.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}
