// SYNOID Remix Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemixError {
    #[error("no frames to build a graph from")]
    EmptyInput,

    #[error("failed to decode frame {path:?}: {reason}")]
    FrameDecode { path: PathBuf, reason: String },

    #[error("frame path is empty, nothing to encode")]
    InsufficientFrames,

    #[error("frame {0} is already in the path")]
    DuplicateFrame(u64),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("frame extraction failed: {0}")]
    Extraction(String),

    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RemixError>;
