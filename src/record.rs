// SYNOID Remix Run Record
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Caller-owned summary of a finished run. The engine never writes it.

use crate::agent::regenerator::OutputVideo;
use crate::engine::intent::Intent;
use crate::engine::traversal::FramePath;
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct RunRecord<'a> {
    pub intent: &'a Intent,
    pub frame_path_length: usize,
    pub frame_path: &'a FramePath,
    pub output_video: &'a OutputVideo,
}

impl<'a> RunRecord<'a> {
    pub fn new(intent: &'a Intent, frame_path: &'a FramePath, output_video: &'a OutputVideo) -> Self {
        Self {
            intent,
            frame_path_length: frame_path.len(),
            frame_path,
            output_video,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!("[PIPELINE] Run record saved to {:?}", path);
        Ok(())
    }
}
