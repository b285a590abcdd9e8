// SYNOID Remix Health Check
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Verifies that the external tools and the frame store location are usable
// before a run starts.

use crate::config::ExtractionConfig;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{error, info, warn};

/// Health status of a subsystem
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemStatus {
    Healthy,
    Degraded(String),
    Down(String),
}

impl SubsystemStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Run `<bin> -version` and report whether it answered
pub fn check_tool(bin: &str) -> SubsystemStatus {
    match Command::new(bin).arg("-version").output() {
        Ok(out) if out.status.success() => SubsystemStatus::Healthy,
        Ok(out) => SubsystemStatus::Degraded(format!(
            "{} exited with {}",
            bin,
            out.status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".into())
        )),
        Err(e) => SubsystemStatus::Down(format!("{} not runnable: {}", bin, e)),
    }
}

/// Check that frames can be written under `dir`
pub fn check_store_dir(dir: &Path) -> SubsystemStatus {
    if let Err(e) = fs::create_dir_all(dir) {
        return SubsystemStatus::Down(format!("cannot create {:?}: {}", dir, e));
    }
    let probe = dir.join(".synoid_remix_health_check");
    match fs::write(&probe, b"ok") {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            SubsystemStatus::Healthy
        }
        Err(e) => {
            error!("[HEALTH] Store write check failed: {}", e);
            SubsystemStatus::Down(format!("{:?} is not writable: {}", dir, e))
        }
    }
}

/// Status of every external dependency, by name
pub fn check_dependencies(config: &ExtractionConfig) -> Vec<(String, SubsystemStatus)> {
    [config.ffmpeg_bin.as_str(), config.ffprobe_bin.as_str()]
        .into_iter()
        .map(|bin| {
            let status = check_tool(bin);
            match &status {
                SubsystemStatus::Healthy => info!("[HEALTH] ✅ {} available", bin),
                SubsystemStatus::Degraded(why) => warn!("[HEALTH] ⚠️ {}", why),
                SubsystemStatus::Down(why) => warn!("[HEALTH] ❌ {}", why),
            }
            (bin.to_string(), status)
        })
        .collect()
}

/// Names of the dependencies that are not healthy
pub fn missing_dependencies(config: &ExtractionConfig) -> Vec<String> {
    check_dependencies(config)
        .into_iter()
        .filter(|(_, s)| !s.is_healthy())
        .map(|(name, _)| name)
        .collect()
}
