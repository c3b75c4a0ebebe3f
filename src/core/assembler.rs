//! Batch-by-batch page assembly.
//!
//! Repeated fork-join: fetch a batch, classify it, fan every candidate out
//! through the shared gate, wait for the whole batch, then append the
//! accepted items in source order. Only a source failure aborts a cycle;
//! per-candidate failures just drop that candidate.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{ContentSource, ReferenceResolver, SourceError};
use crate::domain::{ContentRecord, Cursor, FeedItem, VideoCandidate};

use super::cancel::CycleTicket;
use super::classifier::classify_batch;
use super::gate::{ConcurrencyGate, GateOutcome};
use super::probe::{MetadataProbe, ProbeOutcome};

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateVerdict {
    Accepted(FeedItem),
    /// Resolver failure or probe rejection
    Dropped,
    Cancelled,
}

/// A finished (not cancelled) assembly
#[derive(Debug, Clone, Default)]
pub struct AssembledPage {
    /// Accepted items, newest first, at most the requested target
    pub items: Vec<FeedItem>,
    /// Where the next page starts
    pub cursor: Option<Cursor>,
    /// The source has no more records
    pub exhausted: bool,
    pub batches_fetched: usize,
    pub candidates_probed: usize,
    /// Accepted in the last batch but cut off by the target
    pub overflow_discarded: usize,
}

/// Outcome of [`PageAssembler::assemble`] when the source didn't fail
#[derive(Debug, Clone)]
pub enum Assembly {
    Page(AssembledPage),
    Cancelled,
}

/// Drives a content source into a bounded page of feed items
pub struct PageAssembler {
    source: Arc<dyn ContentSource>,
    resolver: Arc<dyn ReferenceResolver>,
    probe: MetadataProbe,
    gate: ConcurrencyGate,
    batch_size: usize,
}

impl PageAssembler {
    pub fn new(
        source: Arc<dyn ContentSource>,
        resolver: Arc<dyn ReferenceResolver>,
        probe: MetadataProbe,
        gate: ConcurrencyGate,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            resolver,
            probe,
            gate,
            batch_size: batch_size.max(1),
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Collect up to `target` accepted items starting after `cursor`
    #[instrument(skip(self, cursor, ticket), fields(cycle_id = %ticket.id, source = %self.source.name()))]
    pub async fn assemble(
        &self,
        cursor: Option<Cursor>,
        target: usize,
        ticket: &CycleTicket,
    ) -> Result<Assembly, SourceError> {
        let token = &ticket.token;
        let mut page = AssembledPage {
            cursor,
            ..Default::default()
        };

        while page.items.len() < target && !page.exhausted {
            if token.is_cancelled() {
                return Ok(Assembly::Cancelled);
            }

            let batch = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(Assembly::Cancelled),
                batch = self.source.fetch_batch(page.cursor, self.batch_size) => batch?,
            };
            page.batches_fetched += 1;

            if batch.is_empty() {
                page.exhausted = true;
                break;
            }

            let (candidates, report) = classify_batch(&batch.records);
            page.candidates_probed += candidates.len();

            // Join barrier: every candidate of the batch settles before any is appended.
            // join_all keeps results in candidate (= source) order.
            let verdicts = join_all(
                candidates
                    .into_iter()
                    .map(|candidate| self.evaluate(candidate, ticket)),
            )
            .await;

            if token.is_cancelled() {
                return Ok(Assembly::Cancelled);
            }

            let mut accepted = 0usize;
            for verdict in verdicts {
                if let CandidateVerdict::Accepted(item) = verdict {
                    accepted += 1;
                    if page.items.len() < target {
                        page.items.push(item);
                    } else {
                        page.overflow_discarded += 1;
                    }
                }
            }

            if batch.next_cursor.is_none() || batch.len() < self.batch_size {
                page.exhausted = true;
            }
            page.cursor = batch
                .next_cursor
                .or_else(|| batch.records.last().map(ContentRecord::cursor));

            info!(
                batch = page.batches_fetched,
                records = batch.len(),
                candidates = report.candidates,
                mixed_media = report.mixed_media,
                accepted,
                total = page.items.len(),
                target,
                "Batch settled"
            );
        }

        Ok(Assembly::Page(page))
    }

    /// Resolve and probe one candidate inside a gate slot
    async fn evaluate(&self, candidate: VideoCandidate, ticket: &CycleTicket) -> CandidateVerdict {
        let token = &ticket.token;

        let outcome = self
            .gate
            .run(token, move || async move {
                let resolved = tokio::select! {
                    biased;
                    _ = token.cancelled() => return CandidateVerdict::Cancelled,
                    resolved = self.resolver.resolve(&candidate.media_ref) => resolved,
                };
                let url = match resolved {
                    Ok(url) => url,
                    Err(e) => {
                        warn!(content_id = %candidate.content_id, error = %e, "Dropping unresolvable candidate");
                        return CandidateVerdict::Dropped;
                    }
                };

                match self.probe.probe(&url, token).await {
                    ProbeOutcome::Accepted(result) => {
                        CandidateVerdict::Accepted(FeedItem::accept(candidate, result))
                    }
                    ProbeOutcome::Rejected(reason) => {
                        debug!(content_id = %candidate.content_id, %reason, "Candidate rejected");
                        CandidateVerdict::Dropped
                    }
                    ProbeOutcome::Cancelled => CandidateVerdict::Cancelled,
                }
            })
            .await;

        match outcome {
            GateOutcome::Completed(verdict) => verdict,
            GateOutcome::Cancelled => CandidateVerdict::Cancelled,
        }
    }
}
