//! Configuration for clipscout.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CLIPSCOUT_PAGE_SIZE, CLIPSCOUT_CONCURRENCY)
//! 2. Config file ($CLIPSCOUT_CONFIG or .clipscout/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Uses $CLIPSCOUT_CONFIG when set
//! - Otherwise searches current directory and parents for .clipscout/config.yaml
//! - Falls back to the user config dir (~/.config/clipscout/config.yaml on Linux)
//! - Relative paths in the config file are resolved against the project root
//!   (the parent of `.clipscout/`)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{
    BackendContentSource, ContentSource, FfmpegInspector, JsonlContentSource, StorageUrlResolver,
};
use crate::core::{DurationRange, ProbeSettings};

/// Env var pointing at an explicit config file
pub const CONFIG_ENV: &str = "CLIPSCOUT_CONFIG";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

fn default_version() -> String {
    "1".to_string()
}

/// Tunables of the discovery pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Records requested per source fetch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Accepted items per `load_more`
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Max concurrent resolve+probe tasks
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: f64,
    #[serde(default = "default_frame_offset_secs")]
    pub frame_offset_secs: f64,
}

fn default_batch_size() -> usize {
    50
}

fn default_page_size() -> usize {
    24
}

fn default_concurrency() -> usize {
    6
}

fn default_probe_timeout_secs() -> u64 {
    12
}

fn default_min_duration_secs() -> f64 {
    5.0
}

fn default_max_duration_secs() -> f64 {
    120.0
}

fn default_frame_offset_secs() -> f64 {
    1.0
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            probe_timeout_secs: default_probe_timeout_secs(),
            min_duration_secs: default_min_duration_secs(),
            max_duration_secs: default_max_duration_secs(),
            frame_offset_secs: default_frame_offset_secs(),
        }
    }
}

impl DiscoveryConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("discovery.batch_size must be at least 1");
        }
        if self.page_size == 0 {
            bail!("discovery.page_size must be at least 1");
        }
        if self.concurrency == 0 {
            bail!("discovery.concurrency must be at least 1");
        }
        if self.probe_timeout_secs == 0 {
            bail!("discovery.probe_timeout_secs must be at least 1");
        }
        if self.min_duration_secs.is_nan()
            || self.min_duration_secs < 0.0
            || !self.max_duration_secs.is_finite()
        {
            bail!(
                "discovery duration range [{}, {}] is not valid",
                self.min_duration_secs,
                self.max_duration_secs
            );
        }
        if self.min_duration_secs > self.max_duration_secs {
            bail!(
                "discovery.min_duration_secs ({}) exceeds max_duration_secs ({})",
                self.min_duration_secs,
                self.max_duration_secs
            );
        }
        if self.frame_offset_secs.is_nan() || self.frame_offset_secs < 0.0 {
            bail!("discovery.frame_offset_secs must not be negative");
        }
        Ok(())
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_secs(self.probe_timeout_secs),
            range: DurationRange::new(self.min_duration_secs, self.max_duration_secs),
            frame_offset_secs: self.frame_offset_secs,
        }
    }

    /// Apply CLIPSCOUT_* overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CLIPSCOUT_PAGE_SIZE") {
            self.page_size = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid CLIPSCOUT_PAGE_SIZE: {}", value))?;
        }
        if let Some(value) = lookup("CLIPSCOUT_CONCURRENCY") {
            self.concurrency = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid CLIPSCOUT_CONCURRENCY: {}", value))?;
        }
        Ok(())
    }
}

/// Where content records come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Local JSON-lines export (relative to the project root)
    Jsonl { path: PathBuf },
    /// PostgREST-style HTTP backend
    Backend {
        base_url: String,
        #[serde(default = "default_table")]
        table: String,
        /// Env var holding the API key, if the backend needs one
        #[serde(default)]
        api_key_env: Option<String>,
    },
}

fn default_table() -> String {
    "posts".to_string()
}

/// Public object storage that relative media references live in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub public_base: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "media".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: default_ffprobe(),
            ffmpeg_path: default_ffmpeg(),
        }
    }
}

/// Fully resolved configuration, ready to build the pipeline from
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub discovery: DiscoveryConfig,
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub ffmpeg: FfmpegConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build the configured content source
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        match &self.source {
            SourceConfig::Jsonl { path } => Ok(Arc::new(JsonlContentSource::new(path.clone()))),
            SourceConfig::Backend {
                base_url,
                table,
                api_key_env,
            } => {
                let mut source = BackendContentSource::new(base_url.clone(), table.clone());
                if let Some(var) = api_key_env {
                    let key = std::env::var(var)
                        .with_context(|| format!("API key variable {} is not set", var))?;
                    source = source.with_api_key(key);
                }
                Ok(Arc::new(source))
            }
        }
    }

    pub fn resolver(&self) -> Result<StorageUrlResolver> {
        StorageUrlResolver::new(&self.storage.public_base, &self.storage.bucket)
            .context("Invalid storage configuration")
    }

    pub fn inspector(&self) -> FfmpegInspector {
        FfmpegInspector::new(&self.ffmpeg.ffprobe_path, &self.ffmpeg.ffmpeg_path)
    }
}

/// Find config file: $CLIPSCOUT_CONFIG, a search from the current directory,
/// then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }

    std::env::current_dir()
        .ok()
        .and_then(|current| find_config_file_from(&current))
        .or_else(|| {
            let user_config = dirs::config_dir()?.join("clipscout").join("config.yaml");
            user_config.exists().then_some(user_config)
        })
}

/// Search `start` and its parents for .clipscout/config.yaml
pub fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".clipscout").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl ConfigFile {
    /// Turn the raw file into a runnable configuration.
    ///
    /// `config_path` anchors relative paths; `lookup` reads env overrides.
    pub fn resolve<F>(self, config_path: Option<&Path>, lookup: F) -> Result<ResolvedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut discovery = self.discovery;
        discovery.apply_env_overrides(lookup)?;
        discovery.validate()?;

        // Project root is the parent of .clipscout/
        let base_dir = config_path
            .and_then(|p| p.parent())
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        let source = match self.source {
            Some(SourceConfig::Jsonl { path }) => SourceConfig::Jsonl {
                path: resolve_path(base_dir, &path),
            },
            Some(backend @ SourceConfig::Backend { .. }) => backend,
            None => bail!("No content source configured (add a `source` section)"),
        };

        let storage = match (self.storage, &source) {
            (Some(storage), _) => storage,
            (None, SourceConfig::Backend { base_url, .. }) => StorageConfig {
                public_base: format!(
                    "{}/storage/v1/object/public",
                    base_url.trim_end_matches('/')
                ),
                bucket: default_bucket(),
            },
            (None, SourceConfig::Jsonl { .. }) => {
                bail!("A `storage` section is required for a jsonl source")
            }
        };

        Ok(ResolvedConfig {
            discovery,
            source,
            storage,
            ffmpeg: self.ffmpeg,
            config_file: config_path.map(Path::to_path_buf),
        })
    }
}

/// Load configuration from all sources
pub fn load() -> Result<ResolvedConfig> {
    match find_config_file() {
        Some(path) => load_from(&path),
        None => bail!(
            "No config file found (set {} or create .clipscout/config.yaml)",
            CONFIG_ENV
        ),
    }
}

/// Load an explicit config file, still applying env overrides
pub fn load_from(path: &Path) -> Result<ResolvedConfig> {
    load_config_file(path)?.resolve(Some(path), |name| std::env::var(name).ok())
}
