// SYNOID Remix Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod encoder;
pub mod extraction;
pub mod health;
pub mod pipeline;
pub mod regenerator;
