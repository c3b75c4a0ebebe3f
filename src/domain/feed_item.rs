//! The final, ready-to-display unit of the video feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::{ProbeResult, Thumbnail, VideoCandidate};

/// An accepted short-form video.
///
/// Only created after a probe passed the duration filter. Immutable afterwards
/// and owned by the page it was appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Identifier of the source record
    pub id: String,

    /// Resolved, playable video URL
    pub video_url: String,

    /// Captured preview frame, or the video URL as fallback
    pub thumbnail: Thumbnail,

    pub author: String,

    pub caption: String,

    pub view_count: u64,

    /// Creation time of the source record
    pub timestamp: DateTime<Utc>,

    /// Measured duration in seconds
    pub duration_secs: f64,

    /// Always set for items produced by discovery
    pub is_short: bool,
}

impl FeedItem {
    /// Combine a candidate with the probe that accepted it
    pub fn accept(candidate: VideoCandidate, probe: ProbeResult) -> Self {
        Self {
            id: candidate.content_id,
            video_url: probe.url,
            thumbnail: probe.thumbnail,
            author: candidate.author,
            caption: candidate.caption,
            view_count: candidate.view_count,
            timestamp: candidate.created_at,
            duration_secs: probe.duration_secs,
            is_short: true,
        }
    }
}
