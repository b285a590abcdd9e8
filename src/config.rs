// SYNOID Remix Engine Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Tunable constants for graph construction, traversal and regeneration.
// Loaded from `synoid_remix.json` when present, defaults otherwise.

use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "synoid_remix.json";

/// Edge weight constants and look-ahead window for the frame graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// α: weight of visual similarity
    pub similarity_weight: f64,
    /// β: weight of the temporal adjacency bonus
    pub adjacency_weight: f64,
    /// γ: weight of the motion-continuity penalty
    pub motion_weight: f64,
    /// K: how many later frames each frame links to
    pub lookahead: usize,
    /// Worker threads for feature extraction (0 = one per CPU core)
    pub worker_threads: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 1.0,
            adjacency_weight: 0.5,
            motion_weight: 0.5,
            lookahead: 8,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Score tolerance under which two candidate edges count as tied
    pub tie_epsilon: f64,
    /// Output fps used when neither the intent nor the source provides one
    pub default_fps: f64,
    pub slow_window: f64,
    pub medium_window: f64,
    pub fast_window: f64,
    /// Score bias per skipped frame (scaled by the window); negative favours adjacent steps
    pub slow_jump_bias: f64,
    pub fast_jump_bias: f64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            tie_epsilon: 1e-6,
            default_fps: 24.0,
            slow_window: 0.25,
            medium_window: 0.5,
            fast_window: 1.0,
            slow_jump_bias: -0.2,
            fast_jump_bias: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// Blend factor of the incoming frame at a dissolve boundary
    pub dissolve_mix: f32,
    /// Brightness multiplier applied on both sides of a fade boundary
    pub fade_level: f32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            dissolve_mix: 0.5,
            fade_level: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Resample the source to this rate while extracting (None = every frame)
    pub sample_fps: Option<f64>,
    /// Frame rate assigned to image sequences that carry no timing
    pub sequence_fps: f64,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_fps: None,
            sequence_fps: 24.0,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub traversal: TraversalConfig,
    pub regen: RegenConfig,
    pub extraction: ExtractionConfig,
}

impl EngineConfig {
    /// Load `synoid_remix.json` from the working directory, falling back to defaults
    pub fn load() -> Self {
        Self::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load `path`, falling back to defaults when it is missing or rejected
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("[CONFIG] Using default engine config");
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(config) => {
                info!("[CONFIG] Loaded engine config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("[CONFIG] Ignoring {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.graph;
        if g.lookahead == 0 {
            return Err(RemixError::InvalidConfig("graph.lookahead must be at least 1".into()));
        }
        for (name, v) in [
            ("graph.similarity_weight", g.similarity_weight),
            ("graph.adjacency_weight", g.adjacency_weight),
            ("graph.motion_weight", g.motion_weight),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(RemixError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }

        let t = &self.traversal;
        if !(t.default_fps.is_finite() && t.default_fps > 0.0) {
            return Err(RemixError::InvalidConfig("traversal.default_fps must be positive".into()));
        }
        if !(t.tie_epsilon.is_finite() && t.tie_epsilon >= 0.0) {
            return Err(RemixError::InvalidConfig("traversal.tie_epsilon must be non-negative".into()));
        }
        for (name, v) in [
            ("traversal.slow_window", t.slow_window),
            ("traversal.medium_window", t.medium_window),
            ("traversal.fast_window", t.fast_window),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(RemixError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        if !t.slow_jump_bias.is_finite() || !t.fast_jump_bias.is_finite() {
            return Err(RemixError::InvalidConfig("traversal jump biases must be finite".into()));
        }

        let r = &self.regen;
        if !(0.0..=1.0).contains(&r.dissolve_mix) || !(0.0..=1.0).contains(&r.fade_level) {
            return Err(RemixError::InvalidConfig(
                "regen.dissolve_mix and regen.fade_level must lie in [0, 1]".into(),
            ));
        }

        let e = &self.extraction;
        if !(e.sequence_fps.is_finite() && e.sequence_fps > 0.0) {
            return Err(RemixError::InvalidConfig("extraction.sequence_fps must be positive".into()));
        }
        if let Some(fps) = e.sample_fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(RemixError::InvalidConfig("extraction.sample_fps must be positive".into()));
            }
        }
        Ok(())
    }
}
