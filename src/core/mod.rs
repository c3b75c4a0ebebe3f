//! Core discovery logic.
//!
//! This module contains:
//! - Classifier: Video-only filtering of content records
//! - Gate: Bounded concurrency for probes
//! - Probe: Duration filtering and preview capture
//! - Cancel: Per-cycle cancellation
//! - Assembler: Batch-by-batch page assembly
//! - Discovery: Public `load_more` / `retry` API

pub mod assembler;
pub mod cancel;
pub mod classifier;
pub mod discovery;
pub mod gate;
pub mod probe;

// Re-export commonly used types
pub use assembler::{AssembledPage, Assembly, CandidateVerdict, PageAssembler};
pub use cancel::{CancellationController, CycleTicket};
pub use classifier::{classify, classify_batch, ClassificationReport, Disqualification};
pub use discovery::{CycleReport, Discovery, DiscoveryCycle, FeedSnapshot};
pub use gate::{ConcurrencyGate, GateOutcome};
pub use probe::{DurationRange, MetadataProbe, ProbeOutcome, ProbeSettings, Rejection};
