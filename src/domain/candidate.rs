//! Intermediate types between classification and acceptance.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentRecord;

/// A record that passed structural classification but has not been probed yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCandidate {
    /// Identifier of the source record
    pub content_id: String,

    /// Raw storage reference of the video
    pub media_ref: String,

    pub caption: String,

    pub author: String,

    /// Ordering key of the source record
    pub created_at: DateTime<Utc>,

    pub view_count: u64,
}

impl VideoCandidate {
    /// Build a candidate from a record and the video reference picked out of it
    pub fn from_record(record: &ContentRecord, media_ref: &str) -> Self {
        Self {
            content_id: record.id.clone(),
            media_ref: media_ref.to_string(),
            caption: record.caption.clone(),
            author: record.author.clone(),
            created_at: record.created_at,
            view_count: record.view_count,
        }
    }
}

/// Preview image shown before playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Thumbnail {
    /// A frame captured from the video, as a `data:` URL
    Frame { data_url: String },

    /// Frame capture failed; the display layer falls back to the video itself
    Fallback { url: String },
}

impl Thumbnail {
    /// Wrap JPEG bytes into an inline data URL
    pub fn from_jpeg(bytes: &[u8]) -> Self {
        Self::Frame {
            data_url: format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)),
        }
    }

    pub fn fallback(url: impl Into<String>) -> Self {
        Self::Fallback { url: url.into() }
    }

    /// URL the display layer should load
    pub fn url(&self) -> &str {
        match self {
            Self::Frame { data_url } => data_url,
            Self::Fallback { url } => url,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame { .. })
    }
}

/// Successful outcome of probing one resolved URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Playable URL the probe measured
    pub url: String,

    /// Measured duration in seconds, already inside the accepted range
    pub duration_secs: f64,

    pub thumbnail: Thumbnail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_candidate_from_record() {
        let record = ContentRecord {
            id: "p1".to_string(),
            author: "ana".to_string(),
            caption: "sunset".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            media: vec!["a/clip.mp4".to_string()],
            view_count: 42,
        };

        let candidate = VideoCandidate::from_record(&record, "a/clip.mp4");
        assert_eq!(candidate.content_id, "p1");
        assert_eq!(candidate.media_ref, "a/clip.mp4");
        assert_eq!(candidate.caption, "sunset");
        assert_eq!(candidate.view_count, 42);
        assert_eq!(candidate.created_at, record.created_at);
    }

    #[test]
    fn test_thumbnail_from_jpeg() {
        let thumb = Thumbnail::from_jpeg(&[0xff, 0xd8, 0xff]);
        assert!(thumb.is_frame());
        assert_eq!(thumb.url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_thumbnail_fallback_serialization() {
        let thumb = Thumbnail::fallback("https://cdn.example.com/clip.mp4");
        let json = serde_json::to_string(&thumb).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"fallback","url":"https://cdn.example.com/clip.mp4"}"#
        );
        assert!(!thumb.is_frame());
    }
}
