use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Long-lived bound on concurrent write tasks, shared by every job of a
/// coordinator. Callers lease slots for the duration of one batch.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Slots held by one batch. Dropping the lease returns them to the pool.
#[derive(Debug)]
pub struct WorkerLease {
    _permit: OwnedSemaphorePermit,
    size: usize,
}

impl WorkerLease {
    pub fn size(&self) -> usize {
        self.size
    }
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for `min(requested, capacity)` slots, at least one.
    /// Returns `None` only if the pool has been closed.
    pub async fn lease(&self, requested: usize) -> Option<WorkerLease> {
        let size = requested.clamp(1, self.capacity);
        let permit = Arc::clone(&self.semaphore)
            .acquire_many_owned(size as u32)
            .await
            .ok()?;
        debug!(size, available = self.available(), "Leased workers");
        Some(WorkerLease {
            _permit: permit,
            size,
        })
    }

    /// Rejects further leases; outstanding leases stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn lease_is_capped_and_released_on_drop() {
        let pool = WorkerPool::new(4);
        {
            let lease = pool.lease(10).await.unwrap();
            assert_eq!(lease.size(), 4);
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 4);
    }

    #[tokio::test]
    async fn second_lease_waits_for_the_first() {
        let pool = WorkerPool::new(2);
        let first = pool.lease(2).await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(20), pool.lease(1)).await;
        assert!(waiting.is_err());

        drop(first);
        assert_eq!(pool.lease(1).await.unwrap().size(), 1);
    }

    #[tokio::test]
    async fn closed_pool_refuses_leases() {
        let pool = WorkerPool::new(2);
        pool.close();
        assert!(pool.lease(1).await.is_none());
    }
}
