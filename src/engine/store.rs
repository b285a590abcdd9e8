// SYNOID Remix Frame Store
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Owns the directory of extracted frames for one source video. The store is
// read-only while a run is in flight; clearing needs `&mut self`, so callers
// serialize runs per store.

use super::{Frame, FrameId};
use crate::error::{RemixError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Clone)]
pub struct FrameStore {
    root: PathBuf,
    frames: Vec<Frame>,
    by_index: HashMap<u64, usize>,
    source_fps: f64,
}

impl FrameStore {
    /// Create (or reuse) the store directory without scanning it
    pub fn create(root: &Path, source_fps: f64) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            frames: Vec::new(),
            by_index: HashMap::new(),
            source_fps: sanitize_fps(source_fps)?,
        })
    }

    /// Open a directory of already-extracted frames.
    /// Frames are ordered by the number in their file name, then by name.
    pub fn open(root: &Path, source_fps: f64) -> Result<Self> {
        let mut store = Self::create(root, source_fps)?;
        store.rescan()?;
        Ok(store)
    }

    /// Re-read the directory after an extraction, with the rate reported by the source
    pub fn refresh(&mut self, source_fps: f64) -> Result<()> {
        self.source_fps = sanitize_fps(source_fps)?;
        self.rescan()
    }

    fn rescan(&mut self) -> Result<()> {
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_frame_file(p))
            .collect();

        paths.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

        self.frames = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let id = FrameId::new(i as u64, i as f64 / self.source_fps);
                Frame::new(id, path)
            })
            .collect();
        self.by_index = self
            .frames
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.id.index, pos))
            .collect();

        info!(
            "[STORE] {} frames in {:?} @ {:.2}fps",
            self.frames.len(),
            self.root,
            self.source_fps
        );
        Ok(())
    }

    /// Delete the frame images in the store directory. Only valid between runs.
    /// Subdirectories and non-image files are left alone.
    pub fn clear(&mut self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut removed = 0usize;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && is_frame_file(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("[STORE] Cleared {} frames from {:?}", removed, self.root);
        self.frames.clear();
        self.by_index.clear();
        Ok(())
    }

    /// True when `path` names the store directory itself
    pub fn is_root(&self, path: &Path) -> bool {
        match (fs::canonicalize(path), fs::canonicalize(&self.root)) {
            (Ok(a), Ok(b)) => a == b,
            _ => path == self.root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn source_fps(&self) -> f64 {
        self.source_fps
    }

    pub fn get(&self, index: u64) -> Option<&Frame> {
        self.by_index.get(&index).map(|&pos| &self.frames[pos])
    }
}

fn sanitize_fps(fps: f64) -> Result<f64> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(RemixError::InvalidConfig(format!("source fps must be positive, got {}", fps)))
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Trailing number of the file stem (`frame_000012` -> 12), then the full name
fn sort_key(path: &Path) -> (Option<u64>, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let number = digits.parse::<u64>().ok();
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    (number, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_numeric_ordering_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_10.png");
        touch(dir.path(), "frame_2.png");
        touch(dir.path(), "frame_1.png");
        touch(dir.path(), "notes.txt");

        let store = FrameStore::open(dir.path(), 5.0).unwrap();
        assert_eq!(store.len(), 3);
        let names: Vec<_> = store
            .frames()
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["frame_1.png", "frame_2.png", "frame_10.png"]);
        assert_eq!(store.frames()[2].id.index, 2);
        assert!((store.frames()[2].id.timestamp - 0.4).abs() < 1e-9);
        assert!(store.get(1).is_some());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_clear_removes_frames() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_1.png");
        let mut store = FrameStore::open(dir.path(), 24.0).unwrap();
        assert_eq!(store.len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(dir.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_keeps_other_files_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_1.jpg");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("shots")).unwrap();
        touch(&dir.path().join("shots"), "shot_1.png");

        let mut store = FrameStore::open(dir.path(), 24.0).unwrap();
        store.clear().unwrap();

        assert!(!dir.path().join("frame_1.jpg").exists());
        assert!(dir.path().join("notes.txt").is_file());
        assert!(dir.path().join("shots/shot_1.png").is_file());
    }

    #[test]
    fn test_is_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::create(&dir.path().join("frames"), 24.0).unwrap();
        assert!(store.is_root(&dir.path().join("frames")));
        assert!(store.is_root(&dir.path().join("frames/../frames")));
        assert!(!store.is_root(dir.path()));
    }

    #[test]
    fn test_invalid_fps_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameStore::open(dir.path(), 0.0).is_err());
        assert!(FrameStore::open(dir.path(), f64::NAN).is_err());
    }
}
