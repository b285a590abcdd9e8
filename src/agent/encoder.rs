// SYNOID Remix Encoder - Image Sequence to Container
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::error::{RemixError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};

/// One encode request: a directory of numbered PNGs and where to put the result
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub frames_dir: PathBuf,
    /// printf-style file pattern inside `frames_dir`
    pub pattern: String,
    pub frame_count: usize,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// File the encoder must write
    pub output: PathBuf,
    /// Muxer to use, independent of `output`'s extension
    pub container: Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Mov,
    Mkv,
    Avi,
    Webm,
}

impl Container {
    /// Pick the muxer from the final output name (mp4 when unknown)
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("mov") => Self::Mov,
            Some("mkv") => Self::Mkv,
            Some("avi") => Self::Avi,
            Some("webm") => Self::Webm,
            _ => Self::Mp4,
        }
    }

    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "matroska",
            Self::Avi => "avi",
            Self::Webm => "webm",
        }
    }

    pub fn codec(&self) -> &'static str {
        match self {
            Self::Webm => "libvpx-vp9",
            _ => "libx264",
        }
    }
}

pub trait VideoEncoder: Send + Sync {
    fn encode(&self, job: &EncodeJob) -> Result<()>;
}

pub struct FfmpegEncoder {
    ffmpeg_bin: String,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    /// Argument list for `job`, without the binary
    pub fn build_args(&self, job: &EncodeJob) -> Vec<String> {
        let fps = format!("{}", job.fps);
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            "-framerate".to_string(),
            fps.clone(),
            "-i".to_string(),
            job.frames_dir.join(&job.pattern).to_string_lossy().to_string(),
            "-frames:v".to_string(),
            job.frame_count.to_string(),
            "-c:v".to_string(),
            job.container.codec().to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            fps,
            "-f".to_string(),
            job.container.muxer().to_string(),
            job.output.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, job: &EncodeJob) -> Result<()> {
        info!(
            "[ENCODE] {} frames {}x{} @ {}fps -> {:?}",
            job.frame_count, job.width, job.height, job.fps, job.output
        );
        let output = Command::new(&self.ffmpeg_bin)
            .args(self.build_args(job))
            .output()
            .map_err(|e| RemixError::Encode(format!("ffmpeg could not start: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("[ENCODE] ❌ FFmpeg encode failed: {}", stderr.trim());
            Err(RemixError::Encode(stderr.trim().to_string()))
        }
    }
}
