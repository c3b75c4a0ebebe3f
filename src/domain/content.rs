//! Raw content records as they come out of the backing store.
//!
//! Records are immutable once fetched. The store is ordered newest-first by
//! `created_at`, and that ordering key doubles as the pagination cursor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chronological position to resume batch-fetching from.
///
/// Cursors strictly decrease across successive batches: a batch only ever
/// contains records older than the cursor it was requested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// True if a record with this ordering key belongs strictly after the cursor
    /// in fetch order (i.e. it is older).
    pub fn admits(&self, key: DateTime<Utc>) -> bool {
        key < self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A raw unit from the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Store identifier
    pub id: String,

    /// Display label of the author
    pub author: String,

    /// Free-text caption
    #[serde(default)]
    pub caption: String,

    /// Ordering key (creation time)
    pub created_at: DateTime<Utc>,

    /// Unordered media references attached to the record
    #[serde(default)]
    pub media: Vec<String>,

    /// View counter, when the store tracks one
    #[serde(default)]
    pub view_count: u64,
}

impl ContentRecord {
    /// The cursor that resumes fetching right after this record
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at)
    }
}

/// Kind of media a reference points at, judged from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
    /// Anything the extension table doesn't recognize
    Other,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "mkv", "avi", "3gp", "ogv"];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "avif", "bmp", "svg",
];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "ogg", "oga", "flac", "opus"];

impl MediaKind {
    /// Classify a storage reference or URL by its file extension.
    ///
    /// Query strings and fragments are ignored, and matching is
    /// case-insensitive.
    pub fn of_reference(reference: &str) -> Self {
        let path = reference
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();

        let ext = match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return Self::Other,
        };

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Audio
        } else {
            Self::Other
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}
