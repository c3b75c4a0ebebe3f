//! Adapter interfaces for external systems.
//!
//! The discovery pipeline never talks to the content store, object storage or
//! media tooling directly. It goes through these traits so each collaborator
//! can be swapped (and faked in tests).

pub mod backend;
pub mod ffmpeg;
pub mod jsonl;
pub mod storage;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContentRecord, Cursor};

pub use backend::BackendContentSource;
pub use ffmpeg::FfmpegInspector;
pub use jsonl::JsonlContentSource;
pub use storage::StorageUrlResolver;

/// One page of raw records from a [`ContentSource`]
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Records strictly older than the requested cursor, newest first
    pub records: Vec<ContentRecord>,

    /// Where to continue from, `None` once the store is exhausted
    pub next_cursor: Option<Cursor>,
}

impl Batch {
    /// Build a batch, deriving the continuation cursor.
    ///
    /// A short batch (fewer records than requested) signals exhaustion.
    pub fn from_records(records: Vec<ContentRecord>, limit: usize) -> Self {
        let next_cursor = if records.len() < limit {
            None
        } else {
            records.last().map(ContentRecord::cursor)
        };
        Self {
            records,
            next_cursor,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Errors from fetching a batch. These abort the whole discovery cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid source configuration: {0}")]
    Config(String),
}

/// Errors from turning a raw storage reference into a URL
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Empty media reference")]
    Empty,

    #[error("Cannot resolve '{reference}': {reason}")]
    Invalid { reference: String, reason: String },
}

/// Errors from inspecting media
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Unreadable {tool} output: {reason}")]
    BadOutput { tool: String, reason: String },

    #[error("No frame could be extracted")]
    NoFrame,
}

/// Read-only access to the chronological content store
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch up to `limit` records strictly older than `cursor`.
    ///
    /// Must be idempotent for a given cursor, must never return records at or
    /// after the cursor, and must omit soft-deleted or undated records.
    async fn fetch_batch(&self, cursor: Option<Cursor>, limit: usize)
        -> Result<Batch, SourceError>;
}

/// Turns a raw storage reference into a fetchable URL
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve(&self, raw_ref: &str) -> Result<String, ResolveError>;
}

/// Platform seam for media metadata.
///
/// Implementations do the raw work; timeouts, duration policy and
/// cancellation are layered on top by [`crate::core::MetadataProbe`].
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Playable duration in seconds, `None` if it cannot be measured
    async fn duration(&self, url: &str) -> Result<Option<f64>, ProbeError>;

    /// Capture one JPEG frame at the given offset
    async fn extract_frame(&self, url: &str, at_secs: f64) -> Result<Vec<u8>, ProbeError>;
}
