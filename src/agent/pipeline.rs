// SYNOID Remix Pipeline - Source → Graph → Path → Video
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Runs one remix end to end in a strict sequence. The first failing stage
// aborts the run and is reported together with its cause.

use super::encoder::VideoEncoder;
use super::extraction::FrameSource;
use super::regenerator::{OutputVideo, Regenerator};
use crate::config::EngineConfig;
use crate::engine::graph;
use crate::engine::intent::Intent;
use crate::engine::store::FrameStore;
use crate::engine::traversal::{self, FramePath};
use crate::engine::CancelToken;
use crate::error::RemixError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intent,
    Source,
    Build,
    Traverse,
    Regenerate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Intent => "intent",
            Self::Source => "source",
            Self::Build => "build",
            Self::Traverse => "traverse",
            Self::Regenerate => "regenerate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: RemixError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: RemixError) -> Self {
        Self { stage, source }
    }
}

fn at(stage: Stage) -> impl FnOnce(RemixError) -> PipelineError {
    move |source| PipelineError::new(stage, source)
}

/// Run a CPU-bound stage off the async executor
async fn blocking<T, F>(stage: Stage, f: F) -> Result<T, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::new(stage, RemixError::Worker(e.to_string())))?
        .map_err(at(stage))
}

/// Everything a successful run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub frame_path: FramePath,
    pub video: OutputVideo,
    /// Frames left out of the graph because they could not be decoded
    pub excluded_frames: usize,
}

pub struct RemixPipeline {
    source: Arc<dyn FrameSource>,
    encoder: Arc<dyn VideoEncoder>,
    config: EngineConfig,
}

impl RemixPipeline {
    pub fn new(source: Arc<dyn FrameSource>, encoder: Arc<dyn VideoEncoder>, config: EngineConfig) -> Self {
        Self {
            source,
            encoder,
            config,
        }
    }

    fn report_progress(&self, msg: &str) {
        info!("[PIPELINE] {}", msg);
    }

    /// Remix `source` into `output` under `intent`.
    ///
    /// The store is cleared and refilled first; holding `&mut FrameStore`
    /// keeps any other run from touching it meanwhile.
    pub async fn run(
        &self,
        store: &mut FrameStore,
        source: &Path,
        intent: &Intent,
        output: &Path,
        cancel: &CancelToken,
    ) -> Result<RunOutcome, PipelineError> {
        let result = self.run_stages(store, source, intent, output, cancel).await;
        if let Err(e) = &result {
            error!("[PIPELINE] ❌ {}", e);
        }
        result
    }

    async fn run_stages(
        &self,
        store: &mut FrameStore,
        source: &Path,
        intent: &Intent,
        output: &Path,
        cancel: &CancelToken,
    ) -> Result<RunOutcome, PipelineError> {
        intent.validate().map_err(at(Stage::Intent))?;
        let intent = intent.clone();

        // Source
        cancel.check().map_err(at(Stage::Source))?;
        self.report_progress(&format!("Extracting frames with {} from {:?}", self.source.name(), source));
        if store.is_root(source) {
            return Err(PipelineError::new(
                Stage::Source,
                RemixError::Extraction(format!("source {:?} is the frame store directory", source)),
            ));
        }
        store.clear().map_err(at(Stage::Source))?;
        let info = {
            let frame_source = self.source.clone();
            let source = source.to_path_buf();
            let dir = store.root().to_path_buf();
            blocking(Stage::Source, move || frame_source.populate(&source, &dir)).await?
        };
        store.refresh(info.fps).map_err(at(Stage::Source))?;
        if store.len() != info.frame_count {
            warn!(
                "[PIPELINE] {} reported {} frames but the store holds {}",
                self.source.name(),
                info.frame_count,
                store.len()
            );
        }
        let snapshot = Arc::new(store.clone());
        let source_fps = Some(snapshot.source_fps());

        // Build
        cancel.check().map_err(at(Stage::Build))?;
        self.report_progress(&format!("Building frame graph over {} frames", snapshot.len()));
        let frame_graph = {
            let snapshot = snapshot.clone();
            let config = self.config.graph.clone();
            let cancel = cancel.clone();
            blocking(Stage::Build, move || graph::build(&snapshot, &config, &cancel)).await?
        };
        let excluded_frames = frame_graph.warnings.len();

        // Traverse
        cancel.check().map_err(at(Stage::Traverse))?;
        self.report_progress("Selecting frame path");
        let frame_path = traversal::traverse(
            &frame_graph,
            &intent,
            &self.config.traversal,
            self.config.graph.lookahead,
            source_fps,
        )
        .map_err(at(Stage::Traverse))?;
        if frame_path.is_empty() {
            return Err(PipelineError::new(Stage::Traverse, RemixError::InsufficientFrames));
        }
        drop(frame_graph);

        // Regenerate
        cancel.check().map_err(at(Stage::Regenerate))?;
        self.report_progress(&format!("Rendering {} frames to {:?}", frame_path.len(), output));
        let regenerator = Regenerator::new(
            self.config.regen.clone(),
            self.config.traversal.default_fps,
            self.encoder.clone(),
        );
        let (video, frame_path) = {
            let output = output.to_path_buf();
            let cancel = cancel.clone();
            blocking(Stage::Regenerate, move || {
                let video =
                    regenerator.regenerate(&snapshot, &frame_path, &output, &intent, source_fps, &cancel)?;
                Ok((video, frame_path))
            })
            .await?
        };

        self.report_progress(&format!(
            "✅ Remix complete: {} frames, {:.3}s",
            video.frame_count, video.duration_s
        ));
        Ok(RunOutcome {
            frame_path,
            video,
            excluded_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_and_error_source() {
        let err = PipelineError::new(Stage::Build, RemixError::EmptyInput);
        assert_eq!(err.stage, Stage::Build);
        assert_eq!(err.to_string(), "build stage failed: no frames to build a graph from");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no frames to build a graph from"));
    }
}
