// SYNOID Remix Frame Graph - Forward-Only Frame DAG
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Nodes are the successfully decoded frames of a store, in source order.
// Edges only point forward in time, so the graph is acyclic by construction,
// and every node but the last links to its direct successor.

use super::features::FrameFeatures;
use super::store::FrameStore;
use super::{CancelToken, FrameId};
use crate::config::GraphConfig;
use crate::error::{RemixError, Result};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// A decoded frame and its descriptor
#[derive(Debug, Clone)]
pub struct FrameNode {
    pub id: FrameId,
    pub features: FrameFeatures,
}

/// A candidate "next frame" transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEdge {
    pub weight: f64,
    /// Difference of original frame ordinals (>= 1)
    pub gap: u64,
    pub similarity: f64,
    pub motion_penalty: f64,
}

pub struct FrameGraph {
    pub dag: StableGraph<FrameNode, TransitionEdge, Directed>,
    /// Node handles in source order
    order: Vec<NodeIndex>,
    positions: HashMap<NodeIndex, usize>,
    /// Frames left out because they could not be decoded
    pub warnings: Vec<RemixError>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self {
            dag: StableGraph::new(),
            order: Vec::new(),
            positions: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Append a node; ids must arrive in increasing ordinal order
    pub fn push_node(&mut self, node: FrameNode) -> NodeIndex {
        let idx = self.dag.add_node(node);
        self.positions.insert(idx, self.order.len());
        self.order.push(idx);
        idx
    }

    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex, edge: TransitionEdge) {
        self.dag.add_edge(from, to, edge);
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in source order
    pub fn nodes(&self) -> impl Iterator<Item = &FrameNode> + '_ {
        self.order.iter().filter_map(move |&idx| self.dag.node_weight(idx))
    }

    pub fn node_at(&self, position: usize) -> Option<&FrameNode> {
        self.order.get(position).and_then(|&idx| self.dag.node_weight(idx))
    }

    pub fn handle_at(&self, position: usize) -> Option<NodeIndex> {
        self.order.get(position).copied()
    }

    pub fn first(&self) -> Option<&FrameNode> {
        self.node_at(0)
    }

    pub fn last(&self) -> Option<&FrameNode> {
        self.order.len().checked_sub(1).and_then(|p| self.node_at(p))
    }

    /// Outgoing edges of a node as (target handle, edge)
    pub fn outgoing(&self, from: NodeIndex) -> Vec<(NodeIndex, &TransitionEdge)> {
        self.dag
            .edges_directed(from, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    /// Number of nodes that come after `handle` in source order
    pub fn nodes_after(&self, handle: NodeIndex) -> usize {
        match self.positions.get(&handle) {
            Some(&pos) => self.order.len() - 1 - pos,
            None => 0,
        }
    }

    /// Source time covered by the graph, including the last frame's own interval
    pub fn span_secs(&self, source_fps: f64) -> f64 {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => (b.id.timestamp - a.id.timestamp) + 1.0 / source_fps,
            _ => 0.0,
        }
    }

    pub fn summary(&self) -> GraphSummary {
        let edges = self
            .dag
            .edge_indices()
            .filter_map(|e| {
                let (source, target) = self.dag.edge_endpoints(e)?;
                Some(EdgeSummary {
                    from: self.dag.node_weight(source)?.id.index,
                    to: self.dag.node_weight(target)?.id.index,
                    weight: self.dag.edge_weight(e)?.weight,
                })
            })
            .collect();
        GraphSummary {
            nodes: self.nodes().map(|n| n.id.index).collect(),
            edges,
            excluded: self.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct EdgeSummary {
    pub from: u64,
    pub to: u64,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub nodes: Vec<u64>,
    pub edges: Vec<EdgeSummary>,
    pub excluded: Vec<String>,
}

/// Builds a [`FrameGraph`] from a frame store
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// α·similarity + β·adjacency − γ·motion, never below zero
    pub fn edge_weight(&self, from: &FrameFeatures, to: &FrameFeatures, gap: u64) -> TransitionEdge {
        let similarity = from.similarity(to);
        let adjacency = 1.0 / gap.max(1) as f64;
        let motion_penalty = from.motion_penalty(to);
        let weight = self.config.similarity_weight * similarity
            + self.config.adjacency_weight * adjacency
            - self.config.motion_weight * motion_penalty;
        TransitionEdge {
            weight: weight.max(0.0),
            gap: gap.max(1),
            similarity,
            motion_penalty,
        }
    }

    pub fn build(&self, store: &FrameStore, cancel: &CancelToken) -> Result<FrameGraph> {
        if store.is_empty() {
            return Err(RemixError::EmptyInput);
        }
        if self.config.lookahead == 0 {
            return Err(RemixError::InvalidConfig("graph.lookahead must be at least 1".into()));
        }

        let threads = if self.config.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.config.worker_threads
        };
        info!(
            "[GRAPH] Extracting features for {} frames on {} workers",
            store.len(),
            threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| RemixError::InvalidConfig(format!("worker pool: {}", e)))?;

        // Completion order does not matter; collect() is the barrier before edges
        let extracted: Vec<Option<Result<FrameFeatures>>> = pool.install(|| {
            store
                .frames()
                .par_iter()
                .map(|frame| {
                    if cancel.is_cancelled() {
                        None
                    } else {
                        Some(FrameFeatures::extract(frame))
                    }
                })
                .collect()
        });
        cancel.check()?;

        let mut graph = FrameGraph::new();
        let mut prev: Option<FrameFeatures> = None;

        for (frame, result) in store.frames().iter().zip(extracted) {
            match result {
                Some(Ok(mut features)) => {
                    if let Some(p) = &prev {
                        features.motion = features.grid_distance(p) as f32;
                    }
                    prev = Some(features.clone());
                    graph.push_node(FrameNode {
                        id: frame.id,
                        features,
                    });
                }
                Some(Err(e)) => {
                    warn!("[GRAPH] Skipping frame {}: {}", frame.id.index, e);
                    graph.warnings.push(e);
                }
                None => return Err(RemixError::Cancelled),
            }
        }

        if graph.is_empty() {
            warn!("[GRAPH] No frame in {:?} could be decoded", store.root());
            return Err(RemixError::EmptyInput);
        }

        let n = graph.node_count();
        for p in 0..n {
            cancel.check()?;
            let end = (p + self.config.lookahead).min(n - 1);
            for q in (p + 1)..=end {
                let (Some(from), Some(to)) = (graph.handle_at(p), graph.handle_at(q)) else {
                    continue;
                };
                let edge = {
                    let a = &graph.dag[from];
                    let b = &graph.dag[to];
                    self.edge_weight(&a.features, &b.features, b.id.index - a.id.index)
                };
                graph.connect(from, to, edge);
            }
        }

        info!(
            "[GRAPH] Built graph: {} nodes, {} edges, {} frames excluded",
            graph.node_count(),
            graph.edge_count(),
            graph.warnings.len()
        );
        Ok(graph)
    }
}

/// Build a frame graph with the given constants
pub fn build(store: &FrameStore, config: &GraphConfig, cancel: &CancelToken) -> Result<FrameGraph> {
    GraphBuilder::new(config.clone()).build(store, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::features::GRID_LEN;

    fn features(level: u8, motion: f32) -> FrameFeatures {
        let mut f = FrameFeatures::from_luma_grid(&[level; GRID_LEN]);
        f.motion = motion;
        f
    }

    #[test]
    fn test_edge_weight_prefers_near_and_similar() {
        let builder = GraphBuilder::new(GraphConfig::default());
        let a = features(100, 0.0);
        let b = features(100, 0.0);
        let c = features(250, 0.0);

        let near = builder.edge_weight(&a, &b, 1);
        let far = builder.edge_weight(&a, &b, 4);
        let different = builder.edge_weight(&a, &c, 1);
        assert!(near.weight > far.weight);
        assert!(near.weight > different.weight);
    }

    #[test]
    fn test_edge_weight_non_negative() {
        let config = GraphConfig {
            similarity_weight: 0.0,
            adjacency_weight: 0.0,
            motion_weight: 10.0,
            ..GraphConfig::default()
        };
        let builder = GraphBuilder::new(config);
        let edge = builder.edge_weight(&features(0, 0.0), &features(0, 1.0), 1);
        assert_eq!(edge.weight, 0.0);
    }

    #[test]
    fn test_manual_graph_accessors() {
        let mut graph = FrameGraph::new();
        let a = graph.push_node(FrameNode { id: FrameId::new(0, 0.0), features: features(0, 0.0) });
        let b = graph.push_node(FrameNode { id: FrameId::new(1, 0.5), features: features(0, 0.0) });
        let builder = GraphBuilder::new(GraphConfig::default());
        graph.connect(a, b, builder.edge_weight(&features(0, 0.0), &features(0, 0.0), 1));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.nodes_after(a), 1);
        assert_eq!(graph.nodes_after(b), 0);
        assert_eq!(graph.outgoing(a).len(), 1);
        assert!((graph.span_secs(2.0) - 1.0).abs() < 1e-9);

        let summary = graph.summary();
        assert_eq!(summary.nodes, vec![0, 1]);
        assert_eq!(summary.edges.len(), 1);
    }
}
