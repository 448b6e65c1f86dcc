//! Bounded worker pool for outbound I/O.
//!
//! A [`WorkerPool`] is a fixed number of permits shared by every request in
//! the process. Work is spawned onto the tokio runtime and waits for a
//! permit before it starts, so a burst of slow hosts cannot grow the number
//! of concurrent outbound connections past the pool size.
//!
//! Pools are built once at startup and handed to the component that uses
//! them. Cloning a pool shares its permits.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// A named, fixed-size set of permits for spawned tasks.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool allowing `size` tasks to run at once (minimum 1).
    pub fn new(name: &'static str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name,
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Pool name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum number of concurrently running tasks.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Spawn `task`; it starts once a permit is free and holds the permit
    /// until it finishes or is aborted.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = permits.acquire_owned().await;
            task.await
        })
    }

    /// Spawn `task` under a deadline measured from now, covering the wait
    /// for a permit as well as the work itself.
    ///
    /// Resolves to `None` if the deadline passes first; the task future is
    /// dropped at that point, which cancels any in-flight I/O.
    pub fn spawn_with_deadline<F>(
        &self,
        deadline: Duration,
        task: F,
    ) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            tokio::time::timeout(deadline, async move {
                let _permit = permits.acquire_owned().await;
                task.await
            })
            .await
            .ok()
        })
    }
}
