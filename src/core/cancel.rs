//! One cancellation token per discovery cycle.
//!
//! Starting a cycle always cancels the previous one first, so at most one
//! token is ever current. Generations let late results from a superseded
//! cycle be recognized and dropped.

use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Identity and token of one cycle
#[derive(Debug, Clone)]
pub struct CycleTicket {
    /// Unique id for logs
    pub id: Uuid,
    /// Monotonic counter, compared to detect superseded cycles
    pub generation: u64,
    pub token: CancellationToken,
}

impl CycleTicket {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    generation: u64,
    current: Option<CancellationToken>,
}

/// Owns the current cycle's token
#[derive(Debug, Default)]
pub struct CancellationController {
    state: Mutex<ControllerState>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        // State is always consistent between statements, so poisoning is ignored
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel whatever cycle is current and start a new one
    pub fn begin(&self) -> CycleTicket {
        let mut state = self.lock();

        if let Some(previous) = state.current.take() {
            if !previous.is_cancelled() {
                debug!(generation = state.generation, "Superseding active cycle");
            }
            previous.cancel();
        }

        state.generation += 1;
        let token = CancellationToken::new();
        state.current = Some(token.clone());

        CycleTicket {
            id: Uuid::new_v4(),
            generation: state.generation,
            token,
        }
    }

    /// Cancel the current cycle without starting another
    pub fn cancel(&self) {
        if let Some(token) = self.lock().current.take() {
            token.cancel();
        }
    }

    /// Whether `generation` is still the latest cycle
    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Release the token of a finished cycle, if it is still current
    pub fn finish(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation {
            state.current = None;
        }
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}
