//! The work-stealing frontier: one chunk stack per worker, transferred and
//! stolen as whole chunks to keep locking off the hot per-vertex path.
//!
//! Grounded on `frontier.{c,h}`. The reference keeps a single "scratch"
//! chunk per thread that is mutated without a lock and only ever touched by
//! its owning thread; here that chunk lives as a plain local in the
//! worker's own stack frame (see [`WorkerLocal`]), the same way
//! `solver/barrier.rs` keeps a thread-local `Barrier` alongside a shared,
//! lock-protected `Critical` — so no `unsafe` is needed to share it across
//! threads, because it is never shared.

use parking_lot::Mutex;

use crate::chunk::Chunk;
use crate::config::CHUNKS_PER_THREAD;

/// Per-worker state that only its owner ever touches: the chunk currently
/// being filled or drained, and a rotating hint of which worker to try
/// stealing from next. Never stored in [`FrontierPool`] itself, so accessing
/// it never needs a lock.
pub struct WorkerLocal {
    scratch: Chunk,
    next_stealable: usize,
}

impl WorkerLocal {
    pub fn new(worker_id: usize, threads: usize) -> Self {
        WorkerLocal {
            scratch: Chunk::new(),
            next_stealable: (worker_id + 1) % threads.max(1),
        }
    }

    #[inline]
    pub fn scratch_is_empty(&self) -> bool {
        self.scratch.is_empty()
    }

    /// Hands the worker's current scratch chunk over to its caller,
    /// replacing it with a fresh empty one. Used at a level boundary to
    /// stash a partially filled scratch chunk into the pool before the
    /// frontier is considered drained.
    pub fn take_scratch(&mut self) -> Chunk {
        std::mem::replace(&mut self.scratch, Chunk::new())
    }
}

struct Stack {
    chunks: Vec<Chunk>,
    top: usize,
}

/// `T` independent chunk stacks, one per worker, each behind its own lock so
/// that pushing/popping on one worker's stack never contends with another's.
pub struct FrontierPool {
    stacks: Vec<Mutex<Stack>>,
}

impl FrontierPool {
    pub fn new(threads: usize) -> Self {
        let stacks = (0..threads.max(1))
            .map(|_| {
                Mutex::new(Stack {
                    chunks: (0..CHUNKS_PER_THREAD).map(|_| Chunk::new()).collect(),
                    top: 0,
                })
            })
            .collect();
        FrontierPool { stacks }
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.stacks.len()
    }

    /// Appends `v` to `worker_id`'s frontier, rotating scratch chunks
    /// through the worker's own stack when the current one fills. Only
    /// `worker_id`'s own thread may call this.
    pub fn push_vertex(&self, worker_id: usize, local: &mut WorkerLocal, v: u32) {
        if local.scratch.is_full() {
            let full = std::mem::replace(&mut local.scratch, Chunk::new());
            self.stash(worker_id, full);
        }
        local.scratch.push(v);
    }

    /// Pops a vertex from `worker_id`'s frontier: its own scratch first,
    /// then a whole chunk adopted from its own stack, then a whole chunk
    /// stolen from another worker's stack following the rotating hint. `None`
    /// once no worker in the pool has any work left.
    pub fn pop_vertex(&self, worker_id: usize, local: &mut WorkerLocal) -> Option<u32> {
        if let Some(v) = local.scratch.pop() {
            return Some(v);
        }
        if let Some(c) = self.take_from(worker_id) {
            local.scratch = c;
            return local.scratch.pop();
        }
        let threads = self.stacks.len();
        for _ in 0..threads.saturating_sub(1) {
            let donor = local.next_stealable;
            local.next_stealable = (local.next_stealable + 1) % threads;
            if donor == worker_id {
                continue;
            }
            if let Some(c) = self.take_from(donor) {
                local.scratch = c;
                return local.scratch.pop();
            }
        }
        None
    }

    /// Whole-chunk withdrawal used by the direction-optimizing variant, which
    /// moves frontiers around in chunk-sized batches rather than
    /// vertex-by-vertex. Drains `worker_id`'s own scratch and stack only; it
    /// never steals, since the bottom-up phase does not pull work across
    /// workers the way top-down does.
    pub fn take_chunk(&self, worker_id: usize, local: &mut WorkerLocal) -> Option<Chunk> {
        if !local.scratch.is_empty() {
            return Some(std::mem::replace(&mut local.scratch, Chunk::new()));
        }
        self.take_from(worker_id)
    }

    /// Whole-chunk donation, the counterpart to [`FrontierPool::take_chunk`].
    pub fn push_chunk(&self, worker_id: usize, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.stash(worker_id, chunk);
    }

    /// Chunks currently stacked (not counting scratch) for `worker_id`, used
    /// by the top-down driver's steal loop to skip donors that have only a
    /// single chunk left (stealing from a nearly-empty donor is rarely worth
    /// the lock round trip).
    pub fn stacked_chunks(&self, worker_id: usize) -> usize {
        self.stacks[worker_id].lock().top
    }

    /// Approximate total chunks still stacked across every worker. Meant to
    /// be called by a single worker at a level boundary, after every worker
    /// has observed an empty frontier (own scratch, own stack, and every
    /// possible steal target exhausted) — at that point no scratch can be
    /// non-empty, so the sum below is exact, not approximate, but the name
    /// is kept to match its one legitimate use: deciding whether the next
    /// level has any frontier left to process at all.
    pub fn total_chunks_approx(&self) -> usize {
        self.stacks.iter().map(|s| s.lock().top).sum()
    }

    fn stash(&self, worker_id: usize, chunk: Chunk) {
        let mut stack = self.stacks[worker_id].lock();
        if stack.top == stack.chunks.len() {
            stack.chunks.push(chunk);
        } else {
            stack.chunks[stack.top] = chunk;
        }
        stack.top += 1;
    }

    fn take_from(&self, worker_id: usize) -> Option<Chunk> {
        let mut stack = self.stacks[worker_id].lock();
        if stack.top == 0 {
            return None;
        }
        stack.top -= 1;
        Some(std::mem::replace(&mut stack.chunks[stack.top], Chunk::new()))
    }
}
