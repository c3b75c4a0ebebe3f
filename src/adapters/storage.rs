//! Resolves raw storage references to public object URLs.

use async_trait::async_trait;
use url::Url;

use super::{ReferenceResolver, ResolveError};

/// Maps `bucket`-relative object paths onto the storage public endpoint.
///
/// References that are already absolute `http(s)` URLs pass through untouched.
pub struct StorageUrlResolver {
    /// `{public_base}/{bucket}/`, always with a trailing slash
    root: Url,
}

impl StorageUrlResolver {
    /// Create a resolver for `{public_base}/{bucket}/<path>`
    pub fn new(public_base: &str, bucket: &str) -> Result<Self, ResolveError> {
        let raw = format!(
            "{}/{}/",
            public_base.trim_end_matches('/'),
            bucket.trim_matches('/')
        );
        let root = Url::parse(&raw).map_err(|e| ResolveError::Invalid {
            reference: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &str {
        self.root.as_str()
    }

    fn resolve_sync(&self, raw_ref: &str) -> Result<String, ResolveError> {
        let reference = raw_ref.trim();
        if reference.is_empty() {
            return Err(ResolveError::Empty);
        }

        if let Ok(url) = Url::parse(reference) {
            return match url.scheme() {
                "http" | "https" => Ok(url.into()),
                other => Err(ResolveError::Invalid {
                    reference: reference.to_string(),
                    reason: format!("unsupported scheme '{}'", other),
                }),
            };
        }

        let joined = self
            .root
            .join(reference.trim_start_matches('/'))
            .map_err(|e| ResolveError::Invalid {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;

        // Dot segments (plain or percent-encoded) may climb out of the bucket
        if !joined.as_str().starts_with(self.root.as_str()) {
            return Err(ResolveError::Invalid {
                reference: reference.to_string(),
                reason: "path escapes the bucket".to_string(),
            });
        }
        Ok(joined.into())
    }
}

#[async_trait]
impl ReferenceResolver for StorageUrlResolver {
    async fn resolve(&self, raw_ref: &str) -> Result<String, ResolveError> {
        self.resolve_sync(raw_ref)
    }
}
