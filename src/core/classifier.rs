//! Video-only classification of raw records.
//!
//! A record qualifies when it carries at least one video reference and no
//! reference of any other kind. Mixed-media posts are always rejected; a
//! reference whose kind can't be recognized counts as non-video.

use serde::Serialize;

use crate::domain::{ContentRecord, MediaKind, VideoCandidate};

/// Why a record was not turned into a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disqualification {
    /// No media at all
    NoMedia,
    /// Only non-video media
    NoVideo,
    /// Video next to images, audio or unknown files
    MixedMedia,
}

/// Classify one record
pub fn classify(record: &ContentRecord) -> Result<VideoCandidate, Disqualification> {
    if record.media.is_empty() {
        return Err(Disqualification::NoMedia);
    }

    let mut first_video: Option<&str> = None;
    let mut has_other = false;

    for reference in &record.media {
        if MediaKind::of_reference(reference).is_video() {
            first_video.get_or_insert(reference.as_str());
        } else {
            has_other = true;
        }
    }

    match (first_video, has_other) {
        (Some(video), false) => Ok(VideoCandidate::from_record(record, video)),
        (Some(_), true) => Err(Disqualification::MixedMedia),
        (None, _) => Err(Disqualification::NoVideo),
    }
}

/// Counts from classifying a set of records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationReport {
    pub candidates: usize,
    pub no_media: usize,
    pub no_video: usize,
    pub mixed_media: usize,
}

impl ClassificationReport {
    pub fn total(&self) -> usize {
        self.candidates + self.no_media + self.no_video + self.mixed_media
    }
}

/// Filter a batch down to its candidates, keeping the batch order
pub fn classify_batch(records: &[ContentRecord]) -> (Vec<VideoCandidate>, ClassificationReport) {
    let mut report = ClassificationReport::default();
    let mut out = Vec::new();

    for record in records {
        match classify(record) {
            Ok(candidate) => {
                report.candidates += 1;
                out.push(candidate);
            }
            Err(Disqualification::NoMedia) => report.no_media += 1,
            Err(Disqualification::NoVideo) => report.no_video += 1,
            Err(Disqualification::MixedMedia) => report.mixed_media += 1,
        }
    }

    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, media: &[&str]) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            author: "ana".to_string(),
            caption: format!("caption {id}"),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            media: media.iter().map(|m| m.to_string()).collect(),
            view_count: 0,
        }
    }

    #[test]
    fn test_single_video_is_candidate() {
        let candidate = classify(&record("p1", &["v/p1.mp4"])).unwrap();
        assert_eq!(candidate.content_id, "p1");
        assert_eq!(candidate.media_ref, "v/p1.mp4");
        assert_eq!(candidate.caption, "caption p1");
    }

    #[test]
    fn test_multiple_videos_pick_first() {
        let candidate = classify(&record("p1", &["v/a.webm", "v/b.mp4"])).unwrap();
        assert_eq!(candidate.media_ref, "v/a.webm");
    }

    #[test]
    fn test_mixed_media_is_rejected() {
        assert_eq!(
            classify(&record("p1", &["v/a.mp4", "i/b.jpg"])),
            Err(Disqualification::MixedMedia)
        );
        assert_eq!(
            classify(&record("p1", &["v/a.mp4", "blob"])),
            Err(Disqualification::MixedMedia)
        );
    }

    #[test]
    fn test_non_video_and_empty_are_rejected() {
        assert_eq!(
            classify(&record("p1", &["i/a.png", "i/b.jpg"])),
            Err(Disqualification::NoVideo)
        );
        assert_eq!(classify(&record("p1", &[])), Err(Disqualification::NoMedia));
    }

    #[test]
    fn test_candidates_keep_order_and_count() {
        let records = vec![
            record("a", &["v/a.mp4"]),
            record("b", &["i/b.jpg"]),
            record("c", &["v/c.mov"]),
            record("d", &["v/d.mp4", "i/d.png"]),
            record("e", &[]),
        ];

        let (candidates, report) = classify_batch(&records);
        let ids: Vec<&str> = candidates.iter().map(|c| c.content_id.as_str()).collect();

        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(
            report,
            ClassificationReport {
                candidates: 2,
                no_media: 1,
                no_video: 1,
                mixed_media: 1,
            }
        );
        assert_eq!(report.total(), 5);
    }
}
