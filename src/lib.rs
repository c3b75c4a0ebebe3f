//! clipscout - Incremental short-form video discovery
//!
//! Scans a reverse-chronological content store in fixed-size batches and
//! assembles a page of short, playable videos: records are filtered to
//! video-only posts, resolved to playable URLs, probed for duration under a
//! bounded concurrency gate, and appended in source order.
//!
//! # Architecture
//!
//! - Each `load_more` runs one cycle that fetches batches until the page
//!   target is met or the source runs dry
//! - Every batch is a fork-join: all candidates settle before any is appended
//! - `retry` cancels the running cycle and starts over from the newest record;
//!   results of a superseded cycle are never committed
//!
//! # Modules
//!
//! - `adapters`: Content sources, URL resolution, ffprobe/ffmpeg inspection
//! - `core`: Classifier, gate, probe, assembler and the `Discovery` API
//! - `domain`: Data structures (ContentRecord, VideoCandidate, FeedItem)
//! - `config`: YAML configuration with env overrides
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Discover two pages of short videos
//! clipscout discover --pages 2
//!
//! # Offline classification of an export
//! clipscout classify posts.jsonl
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use config::DiscoveryConfig;
pub use crate::core::{CycleReport, Discovery, FeedSnapshot};
pub use domain::{ContentRecord, Cursor, FeedItem, MediaKind, VideoCandidate};
