// SYNOID Remix Regenerator - Frame Path to Video
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Decodes the selected frames in path order, applies the intent's transition
// at every segment boundary, stages the result as numbered PNGs and hands
// them to a `VideoEncoder`. The encoder writes a `.partial` sibling which is
// only renamed over the requested output once it succeeded.

use super::encoder::{Container, EncodeJob, VideoEncoder};
use crate::config::RegenConfig;
use crate::engine::intent::{Intent, Transition};
use crate::engine::store::FrameStore;
use crate::engine::traversal::FramePath;
use crate::engine::CancelToken;
use crate::error::{RemixError, Result};
use image::{imageops::FilterType, RgbImage};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const STAGE_PATTERN: &str = "frame_%06d.png";

/// Metadata of a written remix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputVideo {
    pub path: PathBuf,
    pub frame_count: usize,
    pub fps: f64,
    pub duration_s: f64,
    pub width: u32,
    pub height: u32,
    /// Segment boundaries a transition was rendered at
    pub transitions: usize,
}

/// Path positions `i` where entry `i` does not directly follow entry `i - 1` in the source
pub fn segment_boundaries(path: &FramePath) -> Vec<usize> {
    path.ids()
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].index != pair[0].index + 1)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Mix `to` over `from`; `t = 1.0` yields `to`
pub fn blend(from: &RgbImage, to: &RgbImage, t: f32) -> RgbImage {
    let mut out = to.clone();
    for (o, (a, b)) in out.pixels_mut().zip(from.pixels().zip(to.pixels())) {
        for c in 0..3 {
            let v = a.0[c] as f32 * (1.0 - t) + b.0[c] as f32 * t;
            o.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

pub fn dim(img: &mut RgbImage, level: f32) {
    for p in img.pixels_mut() {
        for c in p.0.iter_mut() {
            *c = (*c as f32 * level).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// yuv420p needs even dimensions
fn even_dims(width: u32, height: u32) -> (u32, u32) {
    ((width & !1).max(2), (height & !1).max(2))
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "remix".to_string());
    output.with_file_name(format!("{}.partial", name))
}

pub struct Regenerator {
    config: RegenConfig,
    default_fps: f64,
    encoder: Arc<dyn VideoEncoder>,
}

impl Regenerator {
    pub fn new(config: RegenConfig, default_fps: f64, encoder: Arc<dyn VideoEncoder>) -> Self {
        Self {
            config,
            default_fps,
            encoder,
        }
    }

    pub fn regenerate(
        &self,
        store: &FrameStore,
        path: &FramePath,
        output: &Path,
        intent: &Intent,
        source_fps: Option<f64>,
        cancel: &CancelToken,
    ) -> Result<OutputVideo> {
        if path.is_empty() {
            return Err(RemixError::InsufficientFrames);
        }
        let fps = intent.resolve_fps(source_fps, self.default_fps);

        let staging = tempfile::Builder::new().prefix("synoid_remix_").tempdir()?;
        let (width, height, transitions) =
            self.stage_frames(store, path, intent.transition, staging.path(), cancel)?;
        cancel.check()?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path(output);
        let job = EncodeJob {
            frames_dir: staging.path().to_path_buf(),
            pattern: STAGE_PATTERN.to_string(),
            frame_count: path.len(),
            fps,
            width,
            height,
            output: partial.clone(),
            container: Container::from_path(output),
        };

        let encoded = self.encoder.encode(&job).and_then(|_| {
            if partial.is_file() {
                fs::rename(&partial, output).map_err(RemixError::from)
            } else {
                Err(RemixError::Encode(format!("encoder produced no file at {:?}", partial)))
            }
        });
        if let Err(e) = encoded {
            if partial.exists() {
                if let Err(rm) = fs::remove_file(&partial) {
                    warn!("[REGEN] Could not remove {:?}: {}", partial, rm);
                }
            }
            return Err(match e {
                RemixError::Encode(_) => e,
                other => RemixError::Encode(other.to_string()),
            });
        }

        let video = OutputVideo {
            path: output.to_path_buf(),
            frame_count: path.len(),
            fps,
            duration_s: path.len() as f64 / fps,
            width,
            height,
            transitions,
        };
        info!(
            "[REGEN] ✅ {:?}: {} frames, {:.3}s @ {}fps, {} transitions",
            video.path, video.frame_count, video.duration_s, video.fps, video.transitions
        );
        Ok(video)
    }

    /// Writes one PNG per path entry; returns (width, height, transitions applied)
    fn stage_frames(
        &self,
        store: &FrameStore,
        path: &FramePath,
        transition: Transition,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<(u32, u32, usize)> {
        let boundaries: HashSet<usize> = segment_boundaries(path).into_iter().collect();
        let mut dims: Option<(u32, u32)> = None;
        let mut previous: Option<RgbImage> = None;

        for (pos, id) in path.ids().iter().enumerate() {
            cancel.check()?;
            let frame = store.get(id.index).ok_or_else(|| RemixError::FrameDecode {
                path: store.root().to_path_buf(),
                reason: format!("frame {} is not in the store", id.index),
            })?;
            let decoded = frame.decode()?;
            let (w, h) = *dims.get_or_insert_with(|| even_dims(decoded.width(), decoded.height()));
            let current = if decoded.width() == w && decoded.height() == h {
                decoded.to_rgb8()
            } else {
                decoded.resize_exact(w, h, FilterType::Triangle).to_rgb8()
            };

            let mut rendered = match (transition, previous.as_ref()) {
                (Transition::Dissolve, Some(prev)) if boundaries.contains(&pos) => {
                    blend(prev, &current, self.config.dissolve_mix)
                }
                _ => current.clone(),
            };
            if transition == Transition::Fade
                && (boundaries.contains(&pos) || boundaries.contains(&(pos + 1)))
            {
                dim(&mut rendered, self.config.fade_level);
            }

            let target = dir.join(format!("frame_{:06}.png", pos));
            rendered.save(&target).map_err(|e| RemixError::Encode(format!("staging {:?}: {}", target, e)))?;
            debug!("[REGEN] Staged frame {} as {:?}", id.index, target);
            previous = Some(current);
        }

        let (width, height) = dims.unwrap_or((0, 0));
        let transitions = match transition {
            Transition::Cut => 0,
            _ => boundaries.len(),
        };
        Ok((width, height, transitions))
    }
}
