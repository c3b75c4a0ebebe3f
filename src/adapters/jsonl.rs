//! File-backed content source.
//!
//! Reads a newline-delimited JSON export of the content table. Every call
//! replays the file, so the source always reflects rows appended since the
//! last fetch, and the same cursor always yields the same batch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{Batch, ContentSource, SourceError};
use crate::domain::{ContentRecord, Cursor};

/// One row of the content table, before store-side filtering
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StoredRecord {
    id: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    caption: String,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    media: Vec<String>,
    #[serde(default)]
    view_count: u64,
}

impl StoredRecord {
    pub(crate) fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Soft-deleted and undated rows never leave the store
    pub(crate) fn into_live(self) -> Option<ContentRecord> {
        if self.deleted_at.is_some() {
            return None;
        }
        let created_at = self.created_at?;
        Some(ContentRecord {
            id: self.id,
            author: self.author,
            caption: self.caption,
            created_at,
            media: self.media,
            view_count: self.view_count,
        })
    }
}

/// Content source over a JSONL file
pub struct JsonlContentSource {
    path: PathBuf,
    label: String,
}

impl JsonlContentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jsonl".to_string());
        Self { path, label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every live record, newest first
    pub async fn load_all(&self) -> Result<Vec<ContentRecord>, SourceError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut records = Vec::new();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let stored: StoredRecord = serde_json::from_str(&line)
                .map_err(|source| SourceError::Malformed {
                    line: line_no,
                    source,
                })?;
            if let Some(record) = stored.into_live() {
                records.push(record);
            }
        }

        // Stable sort keeps export order among identical timestamps
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl ContentSource for JsonlContentSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch_batch(
        &self,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Batch, SourceError> {
        let records: Vec<ContentRecord> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| cursor.map_or(true, |c| c.admits(r.created_at)))
            .take(limit)
            .collect();

        debug!(
            source = %self.label,
            cursor = ?cursor.map(|c| c.to_string()),
            returned = records.len(),
            "Fetched batch"
        );

        Ok(Batch::from_records(records, limit))
    }
}
