//! Content source over the managed backend's REST interface.
//!
//! Queries a PostgREST-style table endpoint: soft-deleted and undated rows are
//! filtered server-side, ordering is by `created_at` descending, and the
//! cursor becomes a strict `lt.` filter on the same column.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::jsonl::StoredRecord;
use super::{Batch, ContentSource, SourceError};
use crate::domain::Cursor;

/// Columns requested for every row
const SELECT_COLUMNS: &str = "id,author,caption,created_at,deleted_at,media,view_count";

/// HTTP content source
pub struct BackendContentSource {
    /// Backend root, e.g. `https://project.example.co`
    base_url: String,
    /// Table (or view) holding the posts
    table: String,
    /// Anonymous / service key, if the backend requires one
    api_key: Option<String>,
    client: reqwest::Client,
}

impl BackendContentSource {
    pub fn new(base_url: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Table endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Query string for one batch request
    pub fn query_params(cursor: Option<Cursor>, limit: usize) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), SELECT_COLUMNS.to_string()),
            ("deleted_at".to_string(), "is.null".to_string()),
            ("created_at".to_string(), "not.is.null".to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("created_at".to_string(), format!("lt.{}", cursor)));
        }
        params.push(("order".to_string(), "created_at.desc".to_string()));
        params.push(("limit".to_string(), limit.to_string()));
        params
    }
}

#[async_trait]
impl ContentSource for BackendContentSource {
    fn name(&self) -> &str {
        &self.table
    }

    /// Fetch up to `limit` records, topping the batch up past rows the
    /// client-side filter drops so a short batch always means the table ran out.
    async fn fetch_batch(
        &self,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Batch, SourceError> {
        if limit == 0 {
            return Ok(Batch::from_records(Vec::new(), limit));
        }
        let mut records = Vec::with_capacity(limit);
        let mut raw_cursor = cursor;

        loop {
            let wanted = limit - records.len();
            let rows = self.fetch_rows(raw_cursor, wanted).await?;
            let returned = rows.len();
            let last_key = rows.iter().filter_map(StoredRecord::created_at).last();

            // The server already filters; this guards against views that do not
            let before = records.len();
            records.extend(
                rows.into_iter()
                    .filter_map(StoredRecord::into_live)
                    .filter(|r| raw_cursor.map_or(true, |c| c.admits(r.created_at))),
            );
            debug!(
                table = %self.table,
                returned,
                kept = records.len() - before,
                "Fetched rows"
            );

            if returned < wanted {
                return Ok(Batch {
                    records,
                    next_cursor: None,
                });
            }

            let advanced = match last_key.map(Cursor::new) {
                Some(next) if raw_cursor.map_or(true, |c| c.admits(next.timestamp())) => next,
                _ => {
                    return Err(SourceError::Config(format!(
                        "table '{}' returned a full page without advancing created_at",
                        self.table
                    )))
                }
            };

            if records.len() >= limit {
                return Ok(Batch {
                    records,
                    next_cursor: Some(advanced),
                });
            }
            raw_cursor = Some(advanced);
        }
    }
}

impl BackendContentSource {
    /// One raw page of rows strictly older than `cursor`
    async fn fetch_rows(
        &self,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, SourceError> {
        let mut request = self
            .client
            .get(self.endpoint())
            .query(&Self::query_params(cursor, limit));

        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), table = %self.table, "Content query rejected");
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
