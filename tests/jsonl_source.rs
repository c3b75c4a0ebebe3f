//! JSONL Source Integration Tests
//!
//! Discovery over a file export resolved through public storage URLs.

mod common;

use std::io::Write;
use std::sync::Arc;

use clipscout::adapters::{JsonlContentSource, StorageUrlResolver};
use clipscout::{CycleReport, Discovery};
use common::*;
use tempfile::NamedTempFile;

const PUBLIC_BASE: &str = "https://db.example.co/storage/v1/object/public";

fn export(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_discovers_live_video_posts_from_export() {
    let file = export(&[
        r#"{"id":"old","author":"ana","created_at":"2024-05-01T10:00:00Z","media":["u1/old.mp4"],"view_count":3}"#,
        r#"{"id":"new","author":"bo","caption":"hi","created_at":"2024-05-03T10:00:00Z","media":["u2/new.webm"]}"#,
        r#"{"id":"deleted","created_at":"2024-05-02T12:00:00Z","deleted_at":"2024-05-02T13:00:00Z","media":["u3/gone.mp4"]}"#,
        r#"{"id":"undated","media":["u4/undated.mp4"]}"#,
        "",
        r#"{"id":"photo","created_at":"2024-05-02T10:00:00Z","media":["u5/pic.png"]}"#,
        r#"{"id":"external","created_at":"2024-05-02T09:00:00Z","media":["https://cdn.example.net/ext.mov"]}"#,
    ]);

    let inspector = FakeInspector::with_default(42.0);
    let discovery = Discovery::new(
        Arc::new(JsonlContentSource::new(file.path())),
        Arc::new(StorageUrlResolver::new(PUBLIC_BASE, "media").unwrap()),
        inspector.clone(),
        &small_config(24, 50, 4),
    );

    let report = discovery.load_more().await;
    assert_eq!(
        report,
        CycleReport::Completed {
            appended: 3,
            exhausted: true
        }
    );

    let snapshot = discovery.snapshot();
    assert_eq!(ids(&snapshot.items), vec!["new", "external", "old"]);
    assert_eq!(
        snapshot.items[0].video_url,
        format!("{}/media/u2/new.webm", PUBLIC_BASE)
    );
    assert_eq!(snapshot.items[1].video_url, "https://cdn.example.net/ext.mov");
    assert_eq!(snapshot.items[2].view_count, 3);
    assert_eq!(snapshot.items[0].caption, "hi");
}

#[tokio::test]
async fn test_malformed_line_fails_cycle_with_message() {
    let file = export(&[
        r#"{"id":"a","created_at":"2024-05-01T10:00:00Z","media":["a.mp4"]}"#,
        "{not json",
    ]);

    let discovery = Discovery::new(
        Arc::new(JsonlContentSource::new(file.path())),
        Arc::new(StorageUrlResolver::new(PUBLIC_BASE, "media").unwrap()),
        FakeInspector::with_default(42.0),
        &small_config(24, 50, 4),
    );

    let report = discovery.load_more().await;
    assert!(matches!(report, CycleReport::Failed(_)), "{:?}", report);

    let snapshot = discovery.snapshot();
    assert!(snapshot.items.is_empty());
    assert!(snapshot
        .last_error
        .unwrap()
        .contains("Malformed record at line 2"));
}

#[tokio::test]
async fn test_missing_export_is_source_error() {
    let discovery = Discovery::new(
        Arc::new(JsonlContentSource::new("/nonexistent/clipscout/posts.jsonl")),
        Arc::new(CdnResolver),
        FakeInspector::with_default(42.0),
        &small_config(24, 50, 4),
    );

    assert!(matches!(
        discovery.load_more().await,
        CycleReport::Failed(_)
    ));
    assert!(!discovery.snapshot().in_progress);
}
