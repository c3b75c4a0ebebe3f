//! Command-line interface for clipscout.
//!
//! Operator commands for running discovery against the configured source,
//! classifying an export offline, and inspecting the configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::JsonlContentSource;
use crate::config::{self, ResolvedConfig, SourceConfig};
use crate::core::{classify_batch, CycleReport, Discovery};
use crate::domain::FeedItem;

/// clipscout - Short-form video discovery over a content store
#[derive(Parser, Debug)]
#[command(name = "clipscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .clipscout/config.yaml in this or a parent directory)
    #[arg(long, global = true, env = "CLIPSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover short videos from the configured source
    Discover {
        /// Number of pages to load (stops early when the source is exhausted)
        #[arg(short, long, default_value = "1")]
        pages: usize,

        /// Print one JSON object per item instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Classify a JSONL export without probing anything
    Classify {
        /// Path to the export file
        file: PathBuf,
    },

    /// Show the resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Discover { pages, json } => {
                let cfg = resolve_config(self.config)?;
                discover(&cfg, pages, json).await
            }
            Commands::Classify { file } => classify_file(file).await,
            Commands::Config => {
                let cfg = resolve_config(self.config)?;
                show_config(&cfg)
            }
        }
    }
}

fn resolve_config(explicit: Option<PathBuf>) -> Result<ResolvedConfig> {
    match explicit {
        Some(path) => config::load_from(&path),
        None => config::load(),
    }
}

/// Run `load_more` page by page and print what each page added
async fn discover(cfg: &ResolvedConfig, pages: usize, json: bool) -> Result<()> {
    let discovery = Arc::new(Discovery::new(
        cfg.content_source()?,
        Arc::new(cfg.resolver()?),
        Arc::new(cfg.inspector()),
        &cfg.discovery,
    ));

    // Ctrl-C cancels the running cycle instead of killing probes mid-flight,
    // and stays latched so a press between pages still ends the run
    let interrupted = CancellationToken::new();
    let interrupt = {
        let discovery = discovery.clone();
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling discovery");
                interrupted.cancel();
                discovery.cancel();
            }
        })
    };

    if !json {
        print_header();
    }

    let result = run_pages(&discovery, pages, &interrupted, |item| {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            print_row(item);
        }
        Ok(())
    })
    .await;
    interrupt.abort();

    let printed = result?;
    eprintln!("\nTotal: {} videos", printed);
    Ok(())
}

/// Load up to `pages` pages, handing every new item to `emit`.
///
/// Returns the number of items emitted. `interrupted` is checked before each
/// page, so an interrupt that lands between cycles still stops the run.
async fn run_pages<F>(
    discovery: &Discovery,
    pages: usize,
    interrupted: &CancellationToken,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(&FeedItem) -> Result<()>,
{
    let mut printed = 0usize;
    for page in 1..=pages.max(1) {
        if interrupted.is_cancelled() {
            eprintln!("\n[Discovery interrupted before page {}]", page);
            break;
        }

        let report = discovery.load_more().await;
        let snapshot = discovery.snapshot();

        for item in &snapshot.items[printed..] {
            emit(item)?;
        }
        printed = snapshot.items.len();

        match report {
            CycleReport::Completed {
                exhausted: true, ..
            }
            | CycleReport::Skipped => {
                eprintln!("\n[No more videos after page {}]", page);
                break;
            }
            CycleReport::Completed { .. } => {}
            CycleReport::Cancelled => {
                eprintln!("\n[Discovery cancelled on page {}]", page);
                break;
            }
            CycleReport::Failed(message) => bail!("{}", message),
        }
    }

    Ok(printed)
}

fn print_header() {
    println!(
        "{:<24} {:>8} {:>9} {:<20} {:<40}",
        "ID", "SECONDS", "VIEWS", "AUTHOR", "CAPTION"
    );
    println!("{}", "-".repeat(105));
}

fn print_row(item: &FeedItem) {
    println!(
        "{:<24} {:>8.1} {:>9} {:<20} {:<40}",
        truncate(&item.id, 24),
        item.duration_secs,
        item.view_count,
        truncate(&item.author, 20),
        truncate(&item.caption.replace('\n', " "), 40)
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Offline classification report for an export file
async fn classify_file(file: PathBuf) -> Result<()> {
    let source = JsonlContentSource::new(&file);
    let records = source
        .load_all()
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let (candidates, report) = classify_batch(&records);

    println!("Records:      {}", report.total());
    println!("Candidates:   {}", report.candidates);
    println!("No media:     {}", report.no_media);
    println!("No video:     {}", report.no_video);
    println!("Mixed media:  {}", report.mixed_media);

    if !candidates.is_empty() {
        println!();
        println!("{:<24} {:<25} {:<50}", "ID", "CREATED", "MEDIA");
        println!("{}", "-".repeat(100));
        for candidate in &candidates {
            println!(
                "{:<24} {:<25} {:<50}",
                truncate(&candidate.content_id, 24),
                candidate.created_at.to_rfc3339(),
                truncate(&candidate.media_ref, 50)
            );
        }
    }

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    let d = &cfg.discovery;

    println!("clipscout configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    println!("Source:");
    match &cfg.source {
        SourceConfig::Jsonl { path } => println!("  JSONL file:  {}", path.display()),
        SourceConfig::Backend {
            base_url,
            table,
            api_key_env,
        } => {
            println!("  Backend:     {}", base_url);
            println!("  Table:       {}", table);
            println!(
                "  API key env: {}",
                api_key_env.as_deref().unwrap_or("(none)")
            );
        }
    }
    println!();
    println!("Storage:");
    println!("  Public base: {}", cfg.storage.public_base);
    println!("  Bucket:      {}", cfg.storage.bucket);
    println!();
    println!("Discovery:");
    println!("  Batch size:     {}", d.batch_size);
    println!("  Page size:      {}", d.page_size);
    println!("  Concurrency:    {}", d.concurrency);
    println!("  Probe timeout:  {}s", d.probe_timeout_secs);
    println!(
        "  Duration range: {}s - {}s",
        d.min_duration_secs, d.max_duration_secs
    );
    println!("  Frame offset:   {}s", d.frame_offset_secs);
    println!();
    println!("Tools:");
    println!("  ffprobe: {}", cfg.ffmpeg.ffprobe_path);
    println!("  ffmpeg:  {}", cfg.ffmpeg.ffmpeg_path);

    Ok(())
}
