//! Rayon thread pool configuration for combination evaluation.
//!
//! Use [WorkerPool::install] to run the recompute job's CPU phase with a
//! fixed number of threads, or rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;
use tracing::warn;

/// Configures how many worker threads are used for parallel batch execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If [workers](WorkerPool::workers) is 0,
    /// uses the global Rayon pool (all cores). Otherwise builds a temporary pool with that many threads;
    /// if that pool cannot be built the closure runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(workers = self.workers, %err, "falling back to the global rayon pool");
                f()
            }
        }
    }

    /// Threads the closure passed to [WorkerPool::install] will see.
    pub fn threads(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }
}
