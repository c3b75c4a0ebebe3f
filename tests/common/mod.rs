//! Shared fakes for integration tests.
//!
//! - `ScriptedSource`: in-memory store that logs every fetch and can fail on demand
//! - `CdnResolver`: prefixes references with a fixed CDN root
//! - `FakeInspector`: per-URL durations and delays, tracking peak in-flight
//!   probes and completion order
//! - `row`: a stored post as the REST backend serializes it

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use clipscout::adapters::{
    Batch, ContentSource, MediaInspector, ProbeError, ReferenceResolver, ResolveError, SourceError,
};
use clipscout::config::DiscoveryConfig;
use clipscout::{ContentRecord, Cursor, Discovery};

pub const CDN: &str = "https://cdn.test/media";

/// Creation time of the `i`-th newest record
pub fn ts(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - chrono::Duration::minutes(i as i64)
}

pub fn post_id(i: usize) -> String {
    format!("post-{:03}", i)
}

pub fn record(i: usize, media: Vec<String>) -> ContentRecord {
    ContentRecord {
        id: post_id(i),
        author: format!("author-{}", i % 7),
        caption: format!("caption {}", i),
        created_at: ts(i),
        media,
        view_count: i as u64 * 10,
    }
}

pub fn video_ref(i: usize) -> String {
    format!("videos/{}.mp4", post_id(i))
}

/// URL the resolver produces for `video_ref(i)`
pub fn video_url(i: usize) -> String {
    format!("{}/{}", CDN, video_ref(i))
}

pub fn video_record(i: usize) -> ContentRecord {
    record(i, vec![video_ref(i)])
}

pub fn image_record(i: usize) -> ContentRecord {
    record(i, vec![format!("images/{}.jpg", post_id(i))])
}

pub fn ids(items: &[clipscout::FeedItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// In-memory content source with a fetch log
#[derive(Default)]
pub struct ScriptedSource {
    records: Mutex<Vec<ContentRecord>>,
    calls: Mutex<Vec<Option<Cursor>>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl ScriptedSource {
    pub fn new(mut records: Vec<ContentRecord>) -> Arc<Self> {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn replace(&self, mut records: Vec<ContentRecord>) {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Cursors passed to every fetch so far
    pub fn calls(&self) -> Vec<Option<Cursor>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_batch(
        &self,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Batch, SourceError> {
        self.calls.lock().unwrap().push(cursor);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Status {
                status: 503,
                body: "store unavailable".to_string(),
            });
        }

        let records: Vec<ContentRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| cursor.map_or(true, |c| c.admits(r.created_at)))
            .take(limit)
            .cloned()
            .collect();

        Ok(Batch::from_records(records, limit))
    }
}

/// Resolves every reference under `CDN`; references starting with `broken/` fail
pub struct CdnResolver;

#[async_trait]
impl ReferenceResolver for CdnResolver {
    async fn resolve(&self, raw_ref: &str) -> Result<String, ResolveError> {
        if raw_ref.starts_with("broken/") {
            return Err(ResolveError::Invalid {
                reference: raw_ref.to_string(),
                reason: "object missing".to_string(),
            });
        }
        Ok(format!("{}/{}", CDN, raw_ref))
    }
}

/// Inspector answering from a URL -> duration table
#[derive(Default)]
pub struct FakeInspector {
    durations: Mutex<HashMap<String, Option<f64>>>,
    /// Used for URLs missing from the table
    default_duration: Mutex<Option<f64>>,
    delay: Mutex<Duration>,
    /// Overrides `delay` for single URLs
    delays: Mutex<HashMap<String, Duration>>,
    /// URLs whose duration lookup never returns
    hanging: Mutex<Vec<String>>,
    frames_fail: AtomicBool,
    current: AtomicUsize,
    peak: AtomicUsize,
    probed: Mutex<Vec<String>>,
    /// URLs in the order their duration lookup finished
    finished: Mutex<Vec<String>>,
}

/// Counts a probe as in flight until dropped
struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeInspector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every unknown URL measures `secs`
    pub fn with_default(secs: f64) -> Arc<Self> {
        let inspector = Self::default();
        *inspector.default_duration.lock().unwrap() = Some(secs);
        Arc::new(inspector)
    }

    pub fn set(&self, url: impl Into<String>, secs: Option<f64>) {
        self.durations.lock().unwrap().insert(url.into(), secs);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_delay_for(&self, url: impl Into<String>, delay: Duration) {
        self.delays.lock().unwrap().insert(url.into(), delay);
    }

    pub fn hang_on(&self, url: impl Into<String>) {
        self.hanging.lock().unwrap().push(url.into());
    }

    pub fn fail_frames(&self) {
        self.frames_fail.store(true, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn duration(&self, url: &str) -> Result<Option<f64>, ProbeError> {
        let _in_flight = InFlight::enter(&self.current, &self.peak);
        self.probed.lock().unwrap().push(url.to_string());

        let hangs = self.hanging.lock().unwrap().iter().any(|u| u == url);
        if hangs {
            std::future::pending::<()>().await;
        }

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(*self.delay.lock().unwrap());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.finished.lock().unwrap().push(url.to_string());
        let known = self.durations.lock().unwrap().get(url).copied();
        Ok(known.unwrap_or(*self.default_duration.lock().unwrap()))
    }

    async fn extract_frame(&self, _url: &str, _at_secs: f64) -> Result<Vec<u8>, ProbeError> {
        if self.frames_fail.load(Ordering::SeqCst) {
            return Err(ProbeError::NoFrame);
        }
        Ok(vec![0xff, 0xd8, 0xff, 0xe0])
    }
}

pub fn small_config(page_size: usize, batch_size: usize, concurrency: usize) -> DiscoveryConfig {
    DiscoveryConfig {
        page_size,
        batch_size,
        concurrency,
        ..Default::default()
    }
}

pub fn discovery(
    source: &Arc<ScriptedSource>,
    inspector: &Arc<FakeInspector>,
    config: &DiscoveryConfig,
) -> Discovery {
    Discovery::new(
        source.clone(),
        Arc::new(CdnResolver),
        inspector.clone(),
        config,
    )
}

/// One stored row as the REST backend returns it
pub fn row(i: usize, deleted: bool) -> serde_json::Value {
    serde_json::json!({
        "id": post_id(i),
        "author": format!("author-{}", i % 7),
        "caption": format!("caption {}", i),
        "created_at": ts(i).to_rfc3339(),
        "deleted_at": if deleted { Some(ts(0).to_rfc3339()) } else { None },
        "media": [video_ref(i)],
        "view_count": i * 10,
    })
}

