// SYNOID Remix Engine Module
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Frame graph construction and intent-guided traversal.

pub mod features;
pub mod graph;
pub mod intent;
pub mod store;
pub mod traversal;

use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stable identity of an extracted frame.
/// Two ids are equal when their ordinals are equal; the timestamp is carried along.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameId {
    /// Ordinal of the frame in the source (0-based)
    pub index: u64,
    /// Presentation timestamp in seconds
    pub timestamp: f64,
}

impl FrameId {
    pub fn new(index: u64, timestamp: f64) -> Self {
        Self { index, timestamp }
    }
}

impl PartialEq for FrameId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for FrameId {}

impl Hash for FrameId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

/// A single frame file owned by the frame store.
/// Pixels are only decoded on request.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub path: PathBuf,
}

impl Frame {
    pub fn new(id: FrameId, path: PathBuf) -> Self {
        Self { id, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the image behind this frame
    pub fn decode(&self) -> Result<image::DynamicImage> {
        image::open(&self.path).map_err(|e| RemixError::FrameDecode {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Parent cancellation flag shared by every stage of a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has been set
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(RemixError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_frame_id_identity_is_ordinal() {
        let a = FrameId::new(3, 0.1);
        let b = FrameId::new(3, 0.2);
        assert_eq!(a, b);

        let set: HashSet<FrameId> = [a, b, FrameId::new(4, 0.1)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(RemixError::Cancelled)));
    }

    #[test]
    fn test_decode_missing_file() {
        let frame = Frame::new(FrameId::new(0, 0.0), PathBuf::from("/nonexistent/frame.png"));
        assert!(matches!(frame.decode(), Err(RemixError::FrameDecode { .. })));
    }
}
