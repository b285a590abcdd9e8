// SYNOID Remix Frame Sources - Video to Frame Store
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Two ways of filling a frame store: decode a container with FFmpeg, or
// ingest a directory that already holds an image sequence. The caller picks
// one before starting a run.

use crate::config::ExtractionConfig;
use crate::engine::store::FrameStore;
use crate::error::{RemixError, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// What a source reported after filling the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    /// Rate at which the extracted frames are spaced
    pub fps: f64,
    pub frame_count: usize,
}

pub trait FrameSource: Send + Sync {
    /// Write the frames of `source` into `store_dir` as numbered images
    fn populate(&self, source: &Path, store_dir: &Path) -> Result<SourceInfo>;

    fn name(&self) -> &'static str;
}

/// Parse an FFprobe rate such as `30000/1001` or `25`
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn count_images(dir: &Path) -> Result<usize> {
    Ok(FrameStore::open(dir, 1.0)?.len())
}

/// Decodes the source container with the `ffmpeg` binary
pub struct FfmpegFrameSource {
    config: ExtractionConfig,
}

impl FfmpegFrameSource {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Average frame rate of the first video stream
    pub fn probe_fps(&self, source: &Path) -> Result<f64> {
        let output = Command::new(&self.config.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=avg_frame_rate",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(source)
            .output()
            .map_err(|e| RemixError::Extraction(format!("ffprobe could not start: {}", e)))?;

        if !output.status.success() {
            return Err(RemixError::Extraction(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .find_map(parse_frame_rate)
            .ok_or_else(|| RemixError::Extraction(format!("no frame rate reported for {:?}", source)))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn populate(&self, source: &Path, store_dir: &Path) -> Result<SourceInfo> {
        if !source.is_file() {
            return Err(RemixError::Extraction(format!("source video {:?} not found", source)));
        }
        fs::create_dir_all(store_dir)?;

        let fps = match self.config.sample_fps {
            Some(rate) => rate,
            None => self.probe_fps(source)?,
        };
        info!("[EXTRACT] Decoding {:?} @ {:.3}fps", source, fps);

        let mut cmd = Command::new(&self.config.ffmpeg_bin);
        cmd.args(["-y", "-v", "error", "-nostdin", "-i"]).arg(source);
        if let Some(rate) = self.config.sample_fps {
            cmd.arg("-vf").arg(format!("fps={}", rate));
        } else {
            cmd.args(["-vsync", "0"]);
        }
        cmd.arg(store_dir.join("frame_%06d.png"));

        let output = cmd
            .output()
            .map_err(|e| RemixError::Extraction(format!("ffmpeg could not start: {}", e)))?;
        if !output.status.success() {
            return Err(RemixError::Extraction(format!(
                "ffmpeg frame extraction failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame_count = count_images(store_dir)?;
        info!("[EXTRACT] {} frames written to {:?}", frame_count, store_dir);
        Ok(SourceInfo { fps, frame_count })
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Treats the source as a directory of pre-extracted images
pub struct ImageSequenceSource {
    fps: f64,
}

impl ImageSequenceSource {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl FrameSource for ImageSequenceSource {
    fn populate(&self, source: &Path, store_dir: &Path) -> Result<SourceInfo> {
        if !source.is_dir() {
            return Err(RemixError::Extraction(format!(
                "image sequence {:?} is not a directory",
                source
            )));
        }
        fs::create_dir_all(store_dir)?;

        let sequence = FrameStore::open(source, self.fps)?;
        for frame in sequence.frames() {
            let ext = frame
                .path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "png".to_string());
            let target = store_dir.join(format!("frame_{:06}.{}", frame.id.index + 1, ext));
            fs::copy(&frame.path, &target)?;
        }

        if sequence.is_empty() {
            warn!("[EXTRACT] Image sequence {:?} holds no frames", source);
        } else {
            info!("[EXTRACT] Copied {} frames from {:?}", sequence.len(), source);
        }
        Ok(SourceInfo {
            fps: self.fps,
            frame_count: sequence.len(),
        })
    }

    fn name(&self) -> &'static str {
        "image-sequence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("30/1\n"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("N/A"), None);
    }

    #[test]
    fn test_image_sequence_copies_in_order() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("shot_2.png"), b"b").unwrap();
        fs::write(src.path().join("shot_1.png"), b"a").unwrap();
        fs::write(src.path().join("readme.md"), b"-").unwrap();

        let info = ImageSequenceSource::new(5.0).populate(src.path(), dst.path()).unwrap();
        assert_eq!(info.frame_count, 2);
        assert_eq!(info.fps, 5.0);
        assert_eq!(fs::read(dst.path().join("frame_000001.png")).unwrap(), b"a");
        assert_eq!(fs::read(dst.path().join("frame_000002.png")).unwrap(), b"b");
    }

    #[test]
    fn test_missing_sources_rejected() {
        let dst = tempfile::tempdir().unwrap();
        let missing = Path::new("/nonexistent/input");
        assert!(matches!(
            ImageSequenceSource::new(5.0).populate(missing, dst.path()),
            Err(RemixError::Extraction(_))
        ));
        let ffmpeg = FfmpegFrameSource::new(ExtractionConfig::default());
        assert!(matches!(
            ffmpeg.populate(missing, dst.path()),
            Err(RemixError::Extraction(_))
        ));
    }
}
