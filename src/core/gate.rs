//! Bounded concurrency for per-candidate work.
//!
//! A fixed-capacity semaphore shared by every candidate of a cycle. Waiting
//! for a slot is queued (FIFO) inside the semaphore, never polled, and the
//! wait races the cycle's cancellation token.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Result of running a task through the gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome<T> {
    /// The task ran to completion
    Completed(T),
    /// Cancellation fired before a slot was granted; the task never started
    Cancelled,
}

impl<T> GateOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

/// Counting semaphore limiting in-flight resolve+probe tasks
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Create a gate; capacity is floored at 1
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

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Run `task` once a slot is free.
    ///
    /// Returns [`GateOutcome::Cancelled`] without calling `task` if the token
    /// fires first. The slot is held for exactly the lifetime of the task's
    /// future and released on every exit path, including the caller dropping
    /// this future.
    pub async fn run<F, Fut, T>(&self, token: &CancellationToken, task: F) -> GateOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if token.is_cancelled() {
            return GateOutcome::Cancelled;
        }

        let _permit = tokio::select! {
            biased;
            _ = token.cancelled() => return GateOutcome::Cancelled,
            permit = self.semaphore.acquire() => match permit {
                Ok(permit) => permit,
                // The semaphore is never closed; treat it like shutdown
                Err(_) => return GateOutcome::Cancelled,
            },
        };

        GateOutcome::Completed(task().await)
    }
}
