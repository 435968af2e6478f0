//! Bounded worker pool for split jobs
//!
//! A fixed number of rayon threads run the jobs. Admission is limited by a
//! counter of in-flight jobs: a caller first reserves a [`Permit`] and only
//! then commits to submitting. The permit is released when the job finishes
//! or unwinds, or when the caller drops it without submitting.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::error;

use crate::error::{Result, TileError};

#[derive(Debug)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
    capacity: usize,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One reserved job slot
#[derive(Debug)]
pub struct Permit {
    pending: Arc<Pending>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut count = self.pending.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.pending.idle.notify_all();
        }
    }
}

pub struct SplitPool {
    pool: ThreadPool,
    pending: Arc<Pending>,
}

impl SplitPool {
    pub fn new(threads: usize, max_pending: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("tile-split-{}", i))
            .panic_handler(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Split job panicked: {}", message);
            })
            .build()
            .map_err(|e| TileError::Pool(e.to_string()))?;

        Ok(Self {
            pool,
            pending: Arc::new(Pending {
                count: Mutex::new(0),
                idle: Condvar::new(),
                capacity: max_pending.max(1),
            }),
        })
    }

    /// Reserve a slot, or `None` when `max_pending` jobs are already in flight
    pub fn try_reserve(&self) -> Option<Permit> {
        let mut count = self.pending.lock();
        if *count >= self.pending.capacity {
            return None;
        }
        *count += 1;
        Some(Permit {
            pending: Arc::clone(&self.pending),
        })
    }

    /// Run `job` on the pool, holding `permit` until it returns or unwinds
    pub fn spawn<F>(&self, permit: Permit, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(move || {
            let _permit = permit;
            job();
        });
    }

    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    pub fn capacity(&self) -> usize {
        self.pending.capacity
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool so nested rayon work uses its threads
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Block until no job is in flight. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.pending.lock();
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            count = match self.pending.idle.wait_timeout(count, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_capacity_is_enforced() {
        let pool = SplitPool::new(1, 2).unwrap();
        let a = pool.try_reserve().unwrap();
        let _b = pool.try_reserve().unwrap();
        assert!(pool.try_reserve().is_none());
        drop(a);
        assert!(pool.try_reserve().is_some());
    }

    #[test]
    fn test_permit_released_after_job() {
        let pool = SplitPool::new(2, 4).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let permit = pool.try_reserve().unwrap();
            let runs = Arc::clone(&runs);
            pool.spawn(permit, move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(pool.wait_idle(Duration::from_secs(10)));
        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_permit_released_on_panic() {
        let pool = SplitPool::new(1, 1).unwrap();
        let permit = pool.try_reserve().unwrap();
        pool.spawn(permit, || panic!("boom"));
        assert!(pool.wait_idle(Duration::from_secs(10)));

        // pool still runs jobs afterwards
        let (tx, rx) = mpsc::channel();
        let permit = pool.try_reserve().unwrap();
        pool.spawn(permit, move || {
            let _ = tx.send(7);
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), 7);
    }
}
