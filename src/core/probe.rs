//! Duration probing and preview capture for one resolved URL.
//!
//! Duration is the only acceptance criterion. Frame capture runs only for
//! in-range videos and is best-effort: any failure falls back to the video
//! URL as the display thumbnail.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapters::MediaInspector;
use crate::domain::{ProbeResult, Thumbnail};

/// Inclusive bounds on accepted playable duration, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for DurationRange {
    fn default() -> Self {
        Self {
            min_secs: 5.0,
            max_secs: 120.0,
        }
    }
}

impl DurationRange {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.min_secs && secs <= self.max_secs
    }
}

/// Tunables for [`MetadataProbe`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSettings {
    /// Hard limit on each inspection call
    pub timeout: Duration,
    pub range: DurationRange,
    /// Preferred capture offset; clamped to half the duration
    pub frame_offset_secs: f64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(12),
            range: DurationRange::default(),
            frame_offset_secs: 1.0,
        }
    }
}

/// Why a probed candidate was filtered out
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// No usable duration could be read
    Unmeasurable,
    /// Measured, but outside the accepted range
    OutOfRange(f64),
    /// The duration lookup hit the timeout
    TimedOut,
    /// The inspector itself failed
    Failed(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Unmeasurable => write!(f, "duration unmeasurable"),
            Rejection::OutOfRange(secs) => write!(f, "duration {:.2}s out of range", secs),
            Rejection::TimedOut => write!(f, "probe timed out"),
            Rejection::Failed(reason) => write!(f, "probe failed: {}", reason),
        }
    }
}

/// Outcome of one probe. Rejections are filtering results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Accepted(ProbeResult),
    Rejected(Rejection),
    Cancelled,
}

/// Measures duration and captures a preview, under timeout and cancellation
#[derive(Clone)]
pub struct MetadataProbe {
    inspector: Arc<dyn MediaInspector>,
    settings: ProbeSettings,
}

impl MetadataProbe {
    pub fn new(inspector: Arc<dyn MediaInspector>, settings: ProbeSettings) -> Self {
        Self {
            inspector,
            settings,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe one resolved URL
    pub async fn probe(&self, url: &str, token: &CancellationToken) -> ProbeOutcome {
        let measured = tokio::select! {
            biased;
            _ = token.cancelled() => return ProbeOutcome::Cancelled,
            result = timeout(self.settings.timeout, self.inspector.duration(url)) => result,
        };

        let duration = match measured {
            Err(_) => return ProbeOutcome::Rejected(Rejection::TimedOut),
            Ok(Err(e)) => return ProbeOutcome::Rejected(Rejection::Failed(e.to_string())),
            Ok(Ok(Some(secs))) if secs.is_finite() && secs > 0.0 => secs,
            Ok(Ok(_)) => return ProbeOutcome::Rejected(Rejection::Unmeasurable),
        };

        if !self.settings.range.contains(duration) {
            return ProbeOutcome::Rejected(Rejection::OutOfRange(duration));
        }

        let at = self.settings.frame_offset_secs.min(duration / 2.0);
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => return ProbeOutcome::Cancelled,
            result = timeout(self.settings.timeout, self.inspector.extract_frame(url, at)) => result,
        };

        let thumbnail = match frame {
            Ok(Ok(bytes)) => Thumbnail::from_jpeg(&bytes),
            Ok(Err(e)) => {
                debug!(%url, error = %e, "Frame capture failed, using video URL");
                Thumbnail::fallback(url)
            }
            Err(_) => {
                debug!(%url, "Frame capture timed out, using video URL");
                Thumbnail::fallback(url)
            }
        };

        ProbeOutcome::Accepted(ProbeResult {
            url: url.to_string(),
            duration_secs: duration,
            thumbnail,
        })
    }
}
