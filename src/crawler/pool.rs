//! Bounded worker pool
//!
//! Tasks are all spawned up front; a task only does bounded work while it
//! holds a slot from the pool's admission gate. A task may release its slot
//! and acquire it again later, which lets a failed city back off without
//! blocking the others.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// Admission slot; dropping it frees the slot
pub type Slot = OwnedSemaphorePermit;

/// Semaphore admission gate plus the set of running tasks
#[derive(Debug, Clone)]
pub struct WorkerPool {
    gate: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool admitting at most `capacity` tasks at once (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            gate: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.gate.available_permits()
    }

    /// Waits for a free slot
    pub async fn acquire(&self) -> Result<Slot, AcquireError> {
        self.gate.clone().acquire_owned().await
    }

    /// Spawns one task per item and waits for all of them
    ///
    /// Each task receives a handle to this pool to acquire its slots.
    /// Outputs are returned in completion order; tasks that panicked are
    /// logged and left out.
    pub async fn run<I, T, F, Fut>(&self, items: I, task: F) -> Vec<Fut::Output>
    where
        I: IntoIterator<Item = T>,
        F: Fn(WorkerPool, T) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for item in items {
            tasks.spawn(task(self.clone(), item));
        }

        let mut outputs = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(output) => outputs.push(output),
                Err(e) => tracing::error!(error = %e, "Worker task did not finish"),
            }
        }
        outputs
    }
}
