//! Reusable row-partitioned worker pool.
//!
//! A [`WorkerDispatcher`] owns a fixed set of long-lived OS threads. Each
//! call to [`WorkerDispatcher::run_phase`] seeds a [`WorkQueue`] with every
//! row index and wakes the workers. A worker locks the queue, pops the front
//! row, unlocks, and runs the row task without holding the lock, so a phase
//! costs one lock acquisition per row rather than per cell. `run_phase`
//! returns only after every row has been processed exactly once.
//!
//! Both the transition and raster phases go through the same pool, and a
//! phase never overlaps another: `run_phase` takes `&mut self`.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Default number of worker threads.
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Work performed for a single row during a phase.
///
/// Implementations must only write to storage owned by `row`, since rows
/// run concurrently and in any order.
pub trait RowTask: Send + Sync {
    /// Processes one row.
    fn run_row(&self, row: usize);
}

impl<F> RowTask for F
where
    F: Fn(usize) + Send + Sync,
{
    fn run_row(&self, row: usize) {
        self(row);
    }
}

/// Ordered list of row indices not yet claimed in the current phase.
#[derive(Debug, Default)]
pub struct WorkQueue {
    rows: VecDeque<usize>,
}

impl WorkQueue {
    /// Creates a queue holding `0..row_count`.
    #[must_use]
    pub fn for_rows(row_count: usize) -> Self {
        Self {
            rows: (0..row_count).collect(),
        }
    }

    /// Claims the front row.
    pub fn pop(&mut self) -> Option<usize> {
        self.rows.pop_front()
    }

    /// Rows left to claim.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether every row has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// State guarded by the pool's single lock.
#[derive(Default)]
struct PhaseState {
    queue: WorkQueue,
    task: Option<Arc<dyn RowTask>>,
    /// Rows claimed but not yet finished
    in_flight: usize,
    shutdown: bool,
}

impl PhaseState {
    fn is_phase_done(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<PhaseState>,
    work_available: Condvar,
    phase_complete: Condvar,
}

/// A resizable pool of worker threads that processes rows in phases.
pub struct WorkerDispatcher {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    requested: usize,
    phases_run: u64,
}

impl std::fmt::Debug for WorkerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerDispatcher")
            .field("workers", &self.workers.len())
            .field("requested", &self.requested)
            .field("phases_run", &self.phases_run)
            .finish()
    }
}

impl Default for WorkerDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}

impl WorkerDispatcher {
    /// Creates a pool of `worker_count` threads (clamped to at least 1).
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let requested = worker_count.max(1);
        let shared = Arc::new(Shared::default());
        let workers = spawn_workers(&shared, requested);
        info!("Worker dispatcher started with {} threads", workers.len());
        Self {
            shared,
            workers,
            requested,
            phases_run: 0,
        }
    }

    /// Number of worker threads requested.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.requested
    }

    /// Number of worker threads actually running.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.workers.len()
    }

    /// Number of phases completed since creation.
    #[must_use]
    pub const fn phases_run(&self) -> u64 {
        self.phases_run
    }

    /// Tears down the pool and starts `worker_count` fresh threads
    /// (clamped to at least 1). No-op if the count is unchanged.
    pub fn resize(&mut self, worker_count: usize) {
        let requested = worker_count.max(1);
        if requested == self.requested && self.workers.len() == requested {
            return;
        }

        self.shutdown();
        self.shared = Arc::new(Shared::default());
        self.workers = spawn_workers(&self.shared, requested);
        self.requested = requested;
        info!("Worker dispatcher resized to {} threads", self.workers.len());
    }

    /// Runs `task` once for every row in `0..row_count` and blocks until
    /// all rows are done.
    pub fn run_phase(&mut self, row_count: usize, task: Arc<dyn RowTask>) {
        if row_count == 0 {
            return;
        }

        if self.workers.is_empty() {
            // No thread could be spawned; run on the caller instead.
            for row in 0..row_count {
                task.run_row(row);
            }
            self.phases_run += 1;
            return;
        }

        let mut state = self.shared.state.lock();
        state.queue = WorkQueue::for_rows(row_count);
        state.task = Some(task);
        self.shared.work_available.notify_all();

        while !state.is_phase_done() {
            self.shared.phase_complete.wait(&mut state);
        }

        state.task = None;
        state.queue = WorkQueue::default();
        drop(state);

        self.phases_run += 1;
    }

    fn shutdown(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.work_available.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Worker thread exited abnormally");
            }
        }
    }
}

impl Drop for WorkerDispatcher {
    fn drop(&mut self) {
        self.shutdown();
        debug!("Worker dispatcher stopped after {} phases", self.phases_run);
    }
}

fn spawn_workers(shared: &Arc<Shared>, count: usize) -> Vec<JoinHandle<()>> {
    let mut workers = Vec::with_capacity(count);
    for id in 0..count {
        let shared = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name(format!("afterglow-worker-{id}"))
            .spawn(move || worker_loop(&shared, id));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                warn!("Failed to spawn worker {id}: {e}");
                break;
            },
        }
    }
    workers
}

fn worker_loop(shared: &Shared, id: usize) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }

        let claimed = state
            .queue
            .pop()
            .and_then(|row| state.task.clone().map(|task| (row, task)));

        let Some((row, task)) = claimed else {
            shared.work_available.wait(&mut state);
            continue;
        };

        state.in_flight += 1;
        let outcome = MutexGuard::unlocked(&mut state, || {
            panic::catch_unwind(AssertUnwindSafe(|| task.run_row(row)))
        });
        state.in_flight -= 1;

        if outcome.is_err() {
            error!("Worker {id} panicked while processing row {row}");
        }
        if state.is_phase_done() {
            shared.phase_complete.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountRows {
        hits: Vec<AtomicUsize>,
    }

    impl CountRows {
        fn new(rows: usize) -> Arc<Self> {
            Arc::new(Self {
                hits: (0..rows).map(|_| AtomicUsize::new(0)).collect(),
            })
        }
    }

    impl RowTask for CountRows {
        fn run_row(&self, row: usize) {
            self.hits[row].fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_work_queue_order() {
        let mut queue = WorkQueue::for_rows(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_every_row_runs_exactly_once() {
        let mut dispatcher = WorkerDispatcher::new(4);
        let task = CountRows::new(257);
        dispatcher.run_phase(257, task.clone());
        assert!(task.hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        assert_eq!(dispatcher.phases_run(), 1);
    }

    #[test]
    fn test_repeated_phases_reuse_pool() {
        let mut dispatcher = WorkerDispatcher::new(3);
        let task = CountRows::new(50);
        for _ in 0..20 {
            dispatcher.run_phase(50, task.clone());
        }
        assert!(task.hits.iter().all(|h| h.load(Ordering::Relaxed) == 20));
        assert_eq!(dispatcher.live_workers(), 3);
    }

    #[test]
    fn test_zero_workers_clamps_to_one() {
        let mut dispatcher = WorkerDispatcher::new(0);
        assert_eq!(dispatcher.worker_count(), 1);
        let task = CountRows::new(10);
        dispatcher.run_phase(10, task.clone());
        assert!(task.hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_resize_between_phases() {
        let mut dispatcher = WorkerDispatcher::new(2);
        let task = CountRows::new(16);
        dispatcher.run_phase(16, task.clone());
        dispatcher.resize(6);
        assert_eq!(dispatcher.live_workers(), 6);
        dispatcher.run_phase(16, task.clone());
        dispatcher.resize(0);
        assert_eq!(dispatcher.worker_count(), 1);
        dispatcher.run_phase(16, task.clone());
        assert!(task.hits.iter().all(|h| h.load(Ordering::Relaxed) == 3));
    }

    #[test]
    fn test_closure_task_and_empty_phase() {
        let mut dispatcher = WorkerDispatcher::new(2);
        let total = Arc::new(AtomicUsize::new(0));
        let sum = Arc::clone(&total);
        dispatcher.run_phase(
            10,
            Arc::new(move |row: usize| {
                sum.fetch_add(row, Ordering::Relaxed);
            }),
        );
        assert_eq!(total.load(Ordering::Relaxed), 45);

        dispatcher.run_phase(0, Arc::new(|_: usize| panic!("no rows to run")));
        assert_eq!(dispatcher.phases_run(), 1);
    }

    #[test]
    fn test_panicking_row_does_not_hang_phase() {
        let mut dispatcher = WorkerDispatcher::new(2);
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        dispatcher.run_phase(
            8,
            Arc::new(move |row: usize| {
                assert!(row != 3, "bad row");
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        assert_eq!(done.load(Ordering::Relaxed), 7);
        assert_eq!(dispatcher.live_workers(), 2);
    }
}
