// SYNOID Remix Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;

pub use agent::pipeline::{PipelineError, RemixPipeline, RunOutcome, Stage};
pub use config::EngineConfig;
pub use engine::intent::Intent;
pub use engine::store::FrameStore;
pub use engine::CancelToken;
pub use error::{RemixError, Result};
