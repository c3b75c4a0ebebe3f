//! Media inspection via the `ffprobe` / `ffmpeg` binaries.
//!
//! Both tools read the resolved URL directly, so nothing is downloaded up
//! front. Children are spawned with `kill_on_drop`, so a probe that times out
//! or gets cancelled (its future dropped) doesn't leave processes behind.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{MediaInspector, ProbeError};

/// ffprobe `-of json` output, trimmed to what we read
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    /// ffprobe reports the duration as a decimal string, or "N/A"
    #[serde(default)]
    duration: Option<String>,
}

/// Inspector backed by ffmpeg subprocesses
pub struct FfmpegInspector {
    ffprobe_path: String,
    ffmpeg_path: String,
}

impl Default for FfmpegInspector {
    fn default() -> Self {
        Self::new("ffprobe", "ffmpeg")
    }
}

impl FfmpegInspector {
    pub fn new(ffprobe_path: impl Into<String>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Parse the JSON ffprobe prints for `-show_entries format=duration`
    pub fn parse_duration(stdout: &[u8]) -> Result<Option<f64>, ProbeError> {
        let parsed: FfprobeOutput =
            serde_json::from_slice(stdout).map_err(|e| ProbeError::BadOutput {
                tool: "ffprobe".to_string(),
                reason: e.to_string(),
            })?;

        Ok(parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0))
    }

    async fn run(&self, tool: &str, args: &[String]) -> Result<Vec<u8>, ProbeError> {
        let output = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProbeError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::ToolFailed {
                tool: tool.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaInspector for FfmpegInspector {
    async fn duration(&self, url: &str) -> Result<Option<f64>, ProbeError> {
        let args = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
            url,
        ]
        .map(String::from);

        let stdout = self.run(&self.ffprobe_path, &args).await?;
        Self::parse_duration(&stdout)
    }

    async fn extract_frame(&self, url: &str, at_secs: f64) -> Result<Vec<u8>, ProbeError> {
        let args = [
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", at_secs.max(0.0)),
            "-i".to_string(),
            url.to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "mjpeg".to_string(),
            "-".to_string(),
        ];

        let frame = self.run(&self.ffmpeg_path, &args).await?;
        if frame.is_empty() {
            return Err(ProbeError::NoFrame);
        }
        Ok(frame)
    }
}
