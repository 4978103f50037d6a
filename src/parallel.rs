//! Fork-join runner for independent coding units.
//!
//! Units (groups, passes, streams) are coded independently. The runner
//! starts a fixed set of workers that claim unit indices from a shared
//! atomic cursor until none are left, then joins them.
//!
//! With the `parallel` feature the workers live on a dedicated rayon pool;
//! without it, or with a single thread configured, units run in order on the
//! caller's thread. The choice is made once in [`ParallelRunner::new`].

use crate::error::Result;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

/// Runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of worker threads. `1` runs everything on the caller thread.
    pub num_threads: usize,
}

impl ParallelConfig {
    /// Use `num_threads` workers (at least one).
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Run on the caller thread only.
    pub fn sequential() -> Self {
        Self::with_threads(1)
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::with_threads(std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }
}

#[derive(Debug)]
enum Strategy {
    Sequential,
    #[cfg(feature = "parallel")]
    Pool {
        pool: rayon::ThreadPool,
        workers: usize,
    },
}

impl Strategy {
    #[cfg(feature = "parallel")]
    fn pooled(num_threads: usize) -> Self {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("ans-stream-{i}"))
            .build()
        {
            Ok(pool) => Self::Pool {
                pool,
                workers: num_threads,
            },
            Err(e) => {
                log::warn!("failed to start {num_threads} workers: {e}");
                Self::Sequential
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn pooled(num_threads: usize) -> Self {
        log::debug!("{num_threads} threads requested, built without `parallel`");
        Self::Sequential
    }
}

/// Dispatches coding units over a fixed set of workers.
#[derive(Debug)]
pub struct ParallelRunner {
    strategy: Strategy,
}

impl ParallelRunner {
    /// Resolve the execution strategy for `config`.
    ///
    /// If the worker pool cannot be created the runner falls back to
    /// sequential execution.
    pub fn new(config: ParallelConfig) -> Self {
        if config.num_threads <= 1 {
            return Self::sequential();
        }
        Self {
            strategy: Strategy::pooled(config.num_threads),
        }
    }

    /// A runner that executes units in order on the caller thread.
    pub fn sequential() -> Self {
        Self {
            strategy: Strategy::Sequential,
        }
    }

    /// Number of workers units are spread over.
    pub fn num_workers(&self) -> usize {
        match &self.strategy {
            Strategy::Sequential => 1,
            #[cfg(feature = "parallel")]
            Strategy::Pool { workers, .. } => *workers,
        }
    }

    /// Whether units may run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.num_workers() > 1
    }

    /// Call `per_unit(unit, thread)` once for every unit in
    /// `0..unit_count`.
    ///
    /// `thread` is the index of the worker running the unit, below
    /// [`num_workers`](Self::num_workers). Once a unit fails no further
    /// units are claimed; units already claimed still finish. The returned
    /// error is the one of the lowest failing unit, wrapped in
    /// [`Error::Unit`](crate::Error::Unit).
    pub fn run<F>(&self, unit_count: usize, per_unit: F) -> Result<()>
    where
        F: Fn(usize, usize) -> Result<()> + Sync,
    {
        if unit_count == 0 {
            return Ok(());
        }
        log::debug!(
            "running {} units on {} workers",
            unit_count,
            self.num_workers().min(unit_count)
        );

        match &self.strategy {
            Strategy::Sequential => {
                for unit in 0..unit_count {
                    log::trace!("unit {unit} on the caller thread");
                    per_unit(unit, 0).map_err(|e| e.in_unit(unit))?;
                }
                Ok(())
            }
            #[cfg(feature = "parallel")]
            Strategy::Pool { pool, workers } => {
                run_pooled(pool, (*workers).min(unit_count), unit_count, &per_unit)
            }
        }
    }

    /// Compute `f(unit)` for every unit in `0..unit_count`, in unit order.
    pub fn map<T, F>(&self, unit_count: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        let slots: Vec<Mutex<Option<T>>> = (0..unit_count).map(|_| Mutex::new(None)).collect();
        // infallible per unit, so the run cannot fail either
        let _ = self.run(unit_count, |unit, _| {
            let value = f(unit);
            *slots[unit].lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
            Ok(())
        });
        slots
            .into_iter()
            .filter_map(|slot| slot.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new(ParallelConfig::default())
    }
}

#[cfg(feature = "parallel")]
fn run_pooled<F>(
    pool: &rayon::ThreadPool,
    workers: usize,
    unit_count: usize,
    per_unit: &F,
) -> Result<()>
where
    F: Fn(usize, usize) -> Result<()> + Sync,
{
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    let cursor = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let (failures, failed_rx) = crossbeam_channel::unbounded();

    pool.scope(|scope| {
        for thread in 0..workers {
            let failures = failures.clone();
            let cursor = &cursor;
            let failed = &failed;
            scope.spawn(move |_| {
                while !failed.load(Ordering::Acquire) {
                    let unit = cursor.fetch_add(1, Ordering::Relaxed);
                    if unit >= unit_count {
                        break;
                    }
                    log::trace!("unit {unit} on worker {thread}");
                    if let Err(e) = per_unit(unit, thread) {
                        failed.store(true, Ordering::Release);
                        // receiver outlives the scope
                        let _ = failures.send(e.in_unit(unit));
                    }
                }
            });
        }
    });
    drop(failures);

    // claims are monotonic, so every unit below a failed one has run
    match failed_rx.try_iter().min_by_key(|e| e.unit()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
