//! Bounded worker pool shared by every step a runner executes.

use std::sync::Arc;

use tokio::sync::Semaphore;

/// Default number of steps allowed to run at once.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Fixed-width pool of execution slots.
///
/// Acquired once per runner and closed on [`shutdown`](Self::shutdown) or
/// drop; steps waiting for a slot after that fail instead of hanging.
#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    width: usize,
}

impl WorkerPool {
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Slots not currently held by a running step
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn is_shutdown(&self) -> bool {
        self.permits.is_closed()
    }

    /// Close the pool. Steps already holding a slot run to completion.
    pub fn shutdown(&self) {
        if !self.permits.is_closed() {
            tracing::debug!(width = self.width, "Worker pool shut down");
            self.permits.close();
        }
    }

    pub(crate) fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.permits.close();
    }
}
