//! Fixed-size pool of connection workers.
//!
//! At most `size` submitted tasks run at once; the rest wait in FIFO order
//! for a permit. There is no other admission control.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
        }
    }

    /// Queues `task` to run once a worker slot is free.
    pub fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        });

        self.reap();
    }

    /// Number of tasks queued or running.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Collects finished tasks, logging any that panicked.
    pub fn reap(&mut self) {
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(e) = res {
                if e.is_panic() {
                    tracing::error!("Connection worker panicked");
                }
            }
        }
    }

    /// Waits up to `grace` for queued and running tasks, then aborts the rest.
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn drain(mut self, grace: Duration) -> usize {
        let drained = tokio::time::timeout(grace, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_ok() {
            return 0;
        }

        let remaining = self.tasks.len();
        tracing::warn!(remaining, "Grace period elapsed, aborting connection workers");
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        remaining
    }
}
