//! Public discovery API: `load_more`, `retry` and observable feed state.
//!
//! A [`Discovery`] owns the accumulated page and at most one running
//! cycle. Cycles run inline in the caller's task; a concurrent `load_more`
//! sees `in_progress` and returns immediately, while `retry` supersedes the
//! running cycle. Results are committed under the state lock only if the
//! cycle's generation is still current, so a superseded cycle never appends.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapters::{ContentSource, MediaInspector, ReferenceResolver};
use crate::config::DiscoveryConfig;
use crate::domain::{Cursor, FeedItem};

use super::assembler::{Assembly, PageAssembler};
use super::cancel::{CancellationController, CycleTicket};
use super::gate::ConcurrencyGate;
use super::probe::MetadataProbe;

/// Observable state handed to the display layer
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedSnapshot {
    /// Accepted items, newest first
    pub items: Vec<FeedItem>,
    pub in_progress: bool,
    /// User-facing message from the last failed cycle
    pub last_error: Option<String>,
    /// No more records to scan until the next retry
    pub exhausted: bool,
}

/// How a `load_more` / `retry` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// A cycle was already running, or the source is exhausted
    Skipped,
    Completed { appended: usize, exhausted: bool },
    /// The content source failed; nothing from this cycle was kept
    Failed(String),
    /// Cancelled or superseded before finishing
    Cancelled,
}

#[derive(Debug, Default)]
struct FeedState {
    items: Vec<FeedItem>,
    seen: HashSet<String>,
    cursor: Option<Cursor>,
    in_progress: bool,
    last_error: Option<String>,
    exhausted: bool,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            in_progress: self.in_progress,
            last_error: self.last_error.clone(),
            exhausted: self.exhausted,
        }
    }

    /// Append items not already on the page; returns how many were added
    fn append(&mut self, items: Vec<FeedItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.id.clone()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

/// One run of the assembler, bound to a single ticket
#[derive(Debug, Clone)]
pub struct DiscoveryCycle {
    pub ticket: CycleTicket,
    /// Cursor the cycle starts from
    pub cursor: Option<Cursor>,
    /// Accepted items wanted from this cycle
    pub target: usize,
}

/// Incremental video discovery over one content source
pub struct Discovery {
    assembler: PageAssembler,
    controller: CancellationController,
    state: Mutex<FeedState>,
    updates: watch::Sender<FeedSnapshot>,
    page_size: usize,
}

impl Discovery {
    /// Wire up the pipeline from its collaborators
    pub fn new(
        source: Arc<dyn ContentSource>,
        resolver: Arc<dyn ReferenceResolver>,
        inspector: Arc<dyn MediaInspector>,
        config: &DiscoveryConfig,
    ) -> Self {
        let probe = MetadataProbe::new(inspector, config.probe_settings());
        let gate = ConcurrencyGate::new(config.concurrency);
        let assembler = PageAssembler::new(source, resolver, probe, gate, config.batch_size);
        Self::with_assembler(assembler, config.page_size)
    }

    pub fn with_assembler(assembler: PageAssembler, page_size: usize) -> Self {
        let (updates, _) = watch::channel(FeedSnapshot::default());
        Self {
            assembler,
            controller: CancellationController::new(),
            state: Mutex::new(FeedState::default()),
            updates,
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &FeedState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Current observable state
    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }

    /// Receive a fresh snapshot after every state transition
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    /// Slots currently held in the concurrency gate
    pub fn probes_in_flight(&self) -> usize {
        self.assembler.gate().in_flight()
    }

    /// Begin or continue discovery from where the page ends.
    ///
    /// No-op while a cycle is running or once the source is exhausted.
    pub async fn load_more(&self) -> CycleReport {
        let cycle = {
            let mut state = self.lock();
            if state.in_progress || state.exhausted {
                return CycleReport::Skipped;
            }
            let ticket = self.controller.begin();
            state.in_progress = true;
            state.last_error = None;
            self.publish(&state);

            DiscoveryCycle {
                ticket,
                cursor: state.cursor,
                target: self.page_size,
            }
        };

        self.run_cycle(cycle).await
    }

    /// Cancel any running cycle, clear everything and start from the newest record
    pub async fn retry(&self) -> CycleReport {
        let cycle = {
            let mut state = self.lock();
            let ticket = self.controller.begin();
            *state = FeedState {
                in_progress: true,
                ..Default::default()
            };
            self.publish(&state);

            DiscoveryCycle {
                ticket,
                cursor: None,
                target: self.page_size,
            }
        };

        info!(cycle_id = %cycle.ticket.id, "Retrying discovery from the start");
        self.run_cycle(cycle).await
    }

    /// Cancel the running cycle, keeping the page as it is
    pub fn cancel(&self) {
        self.controller.cancel();
    }

    async fn run_cycle(&self, cycle: DiscoveryCycle) -> CycleReport {
        let ticket = &cycle.ticket;
        info!(
            cycle_id = %ticket.id,
            generation = ticket.generation,
            cursor = ?cycle.cursor.map(|c| c.to_string()),
            target = cycle.target,
            "Discovery cycle started"
        );

        let result = self
            .assembler
            .assemble(cycle.cursor, cycle.target, ticket)
            .await;

        let mut state = self.lock();
        if !self.controller.is_current(ticket.generation) {
            // A newer cycle owns the state now
            info!(cycle_id = %ticket.id, "Superseded cycle discarded");
            return CycleReport::Cancelled;
        }
        self.controller.finish(ticket.generation);
        state.in_progress = false;

        let report = match result {
            Ok(Assembly::Page(page)) => {
                let appended = state.append(page.items);
                state.cursor = page.cursor;
                state.exhausted = page.exhausted;
                info!(
                    cycle_id = %ticket.id,
                    appended,
                    total = state.items.len(),
                    exhausted = page.exhausted,
                    batches = page.batches_fetched,
                    "Discovery cycle finished"
                );
                CycleReport::Completed {
                    appended,
                    exhausted: page.exhausted,
                }
            }
            Ok(Assembly::Cancelled) => {
                info!(cycle_id = %ticket.id, "Discovery cycle cancelled");
                CycleReport::Cancelled
            }
            Err(e) => {
                warn!(cycle_id = %ticket.id, error = %e, "Content source failed");
                let message = format!("Couldn't load videos: {}", e);
                state.last_error = Some(message.clone());
                CycleReport::Failed(message)
            }
        };

        self.publish(&state);
        report
    }
}
