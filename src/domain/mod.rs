//! Domain types for the discovery pipeline.
//!
//! This module contains the core data structures:
//! - Content: raw records, cursors and media kinds
//! - Candidate: classified records and probe results
//! - FeedItem: accepted, display-ready videos

pub mod candidate;
pub mod content;
pub mod feed_item;

// Re-export commonly used types
pub use candidate::{ProbeResult, Thumbnail, VideoCandidate};
pub use content::{ContentRecord, Cursor, MediaKind};
pub use feed_item::FeedItem;
