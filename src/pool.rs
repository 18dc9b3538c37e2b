//! A persistent pool of pinned worker threads, woken for one "cycle" at a
//! time by a run-id/condvar handshake and joined only once, at drop.
//!
//! Grounded on `thread_pool.{c,h}`: `run_id`/`stop_threads` there are an
//! `atomic_uint`/`atomic_bool` guarded by `mutex_children`, and
//! `children_done` is guarded by a second, separate `mutex_parent` — kept as
//! two `parking_lot::Mutex`/`Condvar` pairs here for the same reason the
//! original uses two: the coordinator waiting on cycle completion must never
//! contend with a worker merely checking whether a new cycle has started.
//! `pthread_setaffinity_np` pinning becomes [`core_affinity`].
//!
//! This is the coarse-grained handshake only: one cycle corresponds to one
//! full BFS run (one `bfs(source)` call in the reference). The fine-grained
//! per-level barrier inside a single run is a different mechanism, built
//! from plain atomics directly in [`crate::driver`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::Scope;

use parking_lot::{Condvar, Mutex};

struct Children {
    run_id: u64,
    stop: bool,
}

struct Parent {
    done: bool,
}

/// Shared handshake state. Each worker keeps its own `u64` cycle counter
/// (starting one behind the pool's, mirroring `thread_main_wrapper`'s local
/// `run_id = 1`), so `WorkerPool` itself stays `Sync` without needing any
/// per-worker slot.
pub struct WorkerPool {
    children: Mutex<Children>,
    cond_children: Condvar,
    parent: Mutex<Parent>,
    cond_parent: Condvar,
    remaining: AtomicUsize,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        WorkerPool {
            children: Mutex::new(Children {
                run_id: 0,
                stop: false,
            }),
            cond_children: Condvar::new(),
            parent: Mutex::new(Parent { done: false }),
            cond_parent: Condvar::new(),
            remaining: AtomicUsize::new(0),
            threads,
        }
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Called once by each worker's own loop with its private cycle counter,
    /// starting at `1` so the first `start_cycle` (which bumps the shared
    /// counter to `1`) is observed. Returns `false` once the pool has been
    /// told to stop, at which point the worker should exit its loop.
    pub fn wait_for_work(&self, local_run_id: &mut u64) -> bool {
        let mut children = self.children.lock();
        while children.run_id < *local_run_id {
            self.cond_children.wait(&mut children);
        }
        *local_run_id += 1;
        !children.stop
    }

    /// A worker calls this after finishing its share of the cycle's work.
    /// The worker that observes the count reach zero wakes the coordinator.
    pub fn worker_finished(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let mut parent = self.parent.lock();
            parent.done = true;
            self.cond_parent.notify_one();
        }
    }

    /// Coordinator side: start a new cycle and block until every worker has
    /// called [`WorkerPool::worker_finished`].
    pub fn run_cycle(&self) {
        self.remaining.store(self.threads, Ordering::SeqCst);
        let mut parent = self.parent.lock();
        let mut children = self.children.lock();
        children.run_id += 1;
        parent.done = false;
        self.cond_children.notify_all();
        drop(children);
        while !parent.done {
            self.cond_parent.wait(&mut parent);
        }
    }

    /// Signals every worker to exit its loop on the next `wait_for_work` and
    /// blocks until they have all observed it. Workers are expected to have
    /// already returned from whatever routine they were running; this does
    /// not interrupt in-flight work.
    pub fn stop(&self) {
        let mut children = self.children.lock();
        children.run_id += 1;
        children.stop = true;
        self.cond_children.notify_all();
    }
}

/// Pins the calling thread to the `worker_id`-th logical core, best effort:
/// a platform without affinity support (or a sandboxed one) silently leaves
/// scheduling to the OS, matching the reference's `#ifdef __linux__` guard.
pub fn pin_to_core(worker_id: usize) {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(&id) = core_ids.get(worker_id % core_ids.len().max(1)) {
            core_affinity::set_for_current(id);
        }
    }
}

/// Spawns `pool.threads()` scoped workers, each running `routine(worker_id)`
/// in a loop gated by [`WorkerPool::wait_for_work`]/[`WorkerPool::worker_finished`].
/// The coordinator (caller) drives cycles with [`WorkerPool::run_cycle`] and
/// must call [`WorkerPool::stop`] before `scope` would otherwise block
/// waiting for these threads to return.
pub fn spawn_workers<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    pool: &'env WorkerPool,
    routine: F,
) where
    F: Fn(usize) + Send + Sync + 'env,
{
    let routine = &routine;
    for worker_id in 0..pool.threads() {
        scope.spawn(move || {
            pin_to_core(worker_id);
            let mut local_run_id = 1u64;
            while pool.wait_for_work(&mut local_run_id) {
                routine(worker_id);
                pool.worker_finished();
            }
        });
    }
}
