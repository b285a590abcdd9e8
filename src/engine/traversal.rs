// SYNOID Remix Traverser - Intent-Guided Frame Selection
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Greedy best-first walk over the frame DAG. Pace widens or narrows the
// window of allowed jumps; ties go to the nearer frame so identical inputs
// always produce identical paths.

use super::graph::FrameGraph;
use super::intent::{Intent, Pace};
use super::FrameId;
use crate::config::TraversalConfig;
use crate::error::{RemixError, Result};
use petgraph::stable_graph::NodeIndex;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use tracing::{debug, info};

/// Ordered, duplicate-free selection of frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePath {
    ids: Vec<FrameId>,
    seen: HashSet<u64>,
}

impl FramePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame; revisiting a frame is rejected
    pub fn push(&mut self, id: FrameId) -> Result<()> {
        if !self.seen.insert(id.index) {
            return Err(RemixError::DuplicateFrame(id.index));
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn ids(&self) -> &[FrameId] {
        &self.ids
    }

    pub fn indices(&self) -> Vec<u64> {
        self.ids.iter().map(|id| id.index).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.seen.contains(&index)
    }

    /// Playback length at `fps`
    pub fn duration_secs(&self, fps: f64) -> f64 {
        self.ids.len() as f64 / fps
    }
}

impl TryFrom<Vec<FrameId>> for FramePath {
    type Error = RemixError;

    fn try_from(ids: Vec<FrameId>) -> Result<Self> {
        let mut path = Self::new();
        for id in ids {
            path.push(id)?;
        }
        Ok(path)
    }
}

impl Serialize for FramePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.ids.iter().map(|id| id.index))
    }
}

pub struct Traverser {
    config: TraversalConfig,
    /// Look-ahead window the graph was built with
    lookahead: usize,
}

impl Traverser {
    pub fn new(config: TraversalConfig, lookahead: usize) -> Self {
        Self {
            config,
            lookahead: lookahead.max(1),
        }
    }

    /// Largest index gap the walk may take at this pace
    pub fn max_jump(&self, pace: Pace) -> u64 {
        let multiplier = match pace {
            Pace::Slow => self.config.slow_window,
            Pace::Medium => self.config.medium_window,
            Pace::Fast => self.config.fast_window,
        };
        ((self.lookahead as f64 * multiplier).round() as u64).max(1)
    }

    fn jump_bias(&self, pace: Pace) -> f64 {
        match pace {
            Pace::Slow => self.config.slow_jump_bias,
            Pace::Medium => 0.0,
            Pace::Fast => self.config.fast_jump_bias,
        }
    }

    /// Number of frames the output should contain
    pub fn target_count(&self, graph: &FrameGraph, intent: &Intent, source_fps: Option<f64>) -> usize {
        let fps = intent.resolve_fps(source_fps, self.config.default_fps);
        let seconds = match intent.target_duration_s {
            Some(d) => d,
            None => {
                let src = source_fps
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .unwrap_or(fps);
                graph.span_secs(src)
            }
        };
        ((seconds * fps).round() as usize).max(1)
    }

    pub fn traverse(&self, graph: &FrameGraph, intent: &Intent, source_fps: Option<f64>) -> Result<FramePath> {
        let mut path = FramePath::new();
        let Some(start) = graph.handle_at(0) else {
            info!("[TRAVERSE] Graph is empty, nothing selected");
            return Ok(path);
        };

        let target = self.target_count(graph, intent, source_fps);
        let max_jump = self.max_jump(intent.pace);
        let bias = self.jump_bias(intent.pace);
        let epsilon = self.config.tie_epsilon;
        info!(
            "[TRAVERSE] Target {} frames, pace {:?} (max jump {})",
            target, intent.pace, max_jump
        );

        let mut current = start;
        path.push(graph.dag[current].id)?;

        while path.len() < target {
            // After taking the next frame, this many more are still needed
            let still_needed = target - path.len() - 1;

            let remaining = graph.nodes_after(current);
            let mut candidates: Vec<(NodeIndex, f64, u64)> = Vec::new();
            for (next, edge) in graph.outgoing(current) {
                // The direct successor stays reachable even across excluded frames
                let is_successor = graph.nodes_after(next) + 1 == remaining;
                if edge.gap > max_jump && !is_successor {
                    continue;
                }
                if path.contains(graph.dag[next].id.index) {
                    continue;
                }
                if graph.nodes_after(next) < still_needed {
                    continue;
                }
                let score = edge.weight + bias * (edge.gap as f64 - 1.0) / self.lookahead as f64;
                candidates.push((next, score, edge.gap));
            }

            let best = pick_candidate(&candidates, epsilon);
            let Some((next, score, gap)) = best else {
                debug!("[TRAVERSE] No feasible forward edge, stopping early");
                break;
            };
            debug!(
                "[TRAVERSE] {} -> {} (gap {}, score {:.4})",
                graph.dag[current].id.index, graph.dag[next].id.index, gap, score
            );
            path.push(graph.dag[next].id)?;
            current = next;
        }

        info!("[TRAVERSE] Selected {} of {} frames", path.len(), graph.node_count());
        Ok(path)
    }
}

/// Nearest candidate among those scoring within `epsilon` of the maximum
fn pick_candidate(candidates: &[(NodeIndex, f64, u64)], epsilon: f64) -> Option<(NodeIndex, f64, u64)> {
    let max_score = candidates
        .iter()
        .map(|&(_, score, _)| score)
        .fold(f64::NEG_INFINITY, f64::max);
    candidates
        .iter()
        .filter(|&&(_, score, _)| score >= max_score - epsilon)
        .min_by_key(|&&(_, _, gap)| gap)
        .copied()
}

/// Select a frame path through `graph` under `intent`
pub fn traverse(
    graph: &FrameGraph,
    intent: &Intent,
    config: &TraversalConfig,
    lookahead: usize,
    source_fps: Option<f64>,
) -> Result<FramePath> {
    Traverser::new(config.clone(), lookahead).traverse(graph, intent, source_fps)
}
