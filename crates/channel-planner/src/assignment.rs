//! Frequency assignment on top of a graph colorer

use crate::coloring::{is_proper, ColoringConfig, DsaturColorer, NodeColorer};
use crate::{PlannerError, Result};
use coverage_graph::NeighborGraph;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Verified channel plan for one graph.
///
/// `channels[i] == pool[colors[i]]`, and no two adjacent nodes share a color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAssignment {
    colors: Vec<usize>,
    channels: Vec<f64>,
    pool: Vec<f64>,
    colors_used: BTreeSet<usize>,
    pool_used: Vec<f64>,
}

impl ChannelAssignment {
    fn new(colors: Vec<usize>, pool: &[f64]) -> Self {
        let channels = colors.iter().map(|&c| pool[c]).collect();
        let colors_used: BTreeSet<usize> = colors.iter().copied().collect();
        let pool_used = colors_used.iter().map(|&c| pool[c]).collect();
        Self {
            colors,
            channels,
            pool: pool.to_vec(),
            colors_used,
            pool_used,
        }
    }

    pub fn colors(&self) -> &[usize] {
        &self.colors
    }

    pub fn channels(&self) -> &[f64] {
        &self.channels
    }

    pub fn color(&self, satellite: usize) -> Option<usize> {
        self.colors.get(satellite).copied()
    }

    pub fn channel(&self, satellite: usize) -> Option<f64> {
        self.channels.get(satellite).copied()
    }

    pub fn pool(&self) -> &[f64] {
        &self.pool
    }

    pub fn colors_used(&self) -> &BTreeSet<usize> {
        &self.colors_used
    }

    /// Frequencies actually assigned, in pool order.
    pub fn pool_used(&self) -> &[f64] {
        &self.pool_used
    }

    pub fn satellite_count(&self) -> usize {
        self.colors.len()
    }
}

/// Non-empty, finite, pairwise distinct.
pub fn validate_pool(pool: &[f64]) -> Result<()> {
    if pool.is_empty() {
        return Err(PlannerError::InvalidPool("pool is empty".to_string()));
    }
    if let Some(bad) = pool.iter().find(|f| !f.is_finite()) {
        return Err(PlannerError::InvalidPool(format!("non-finite frequency {}", bad)));
    }
    let mut sorted = pool.to_vec();
    sorted.sort_by(f64::total_cmp);
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(PlannerError::InvalidPool(format!(
            "duplicate frequency {}",
            pair[0]
        )));
    }
    Ok(())
}

/// Maps a graph coloring onto an ordered frequency pool.
#[derive(Debug, Clone, Default)]
pub struct ChannelAssigner<C = DsaturColorer> {
    colorer: C,
}

impl ChannelAssigner<DsaturColorer> {
    pub fn new(config: ColoringConfig) -> Self {
        Self {
            colorer: DsaturColorer::new(config),
        }
    }
}

impl<C: NodeColorer> ChannelAssigner<C> {
    pub fn with_colorer(colorer: C) -> Self {
        Self { colorer }
    }

    pub fn colorer(&self) -> &C {
        &self.colorer
    }

    /// Assign `pool[color]` to every node, with `k = pool.len()` colors.
    pub fn assign(&self, graph: &NeighborGraph, pool: &[f64]) -> Result<ChannelAssignment> {
        validate_pool(pool)?;
        let k = pool.len();
        let infeasible = || PlannerError::InfeasibleAssignment {
            pool_size: k,
            satellites: graph.node_count(),
        };

        let colors = self.colorer.color(graph, k).ok_or_else(infeasible)?;
        if !is_proper(&graph.adjacency_lists(), &colors, k) {
            warn!("Colorer returned an improper {}-coloring, rejecting it", k);
            return Err(infeasible());
        }

        let assignment = ChannelAssignment::new(colors, pool);
        info!(
            "Assigned {} satellites to {} of {} channels",
            assignment.satellite_count(),
            assignment.colors_used().len(),
            k
        );
        Ok(assignment)
    }

    /// Smallest pool size in `0..=max_k` the colorer succeeds with.
    pub fn minimum_pool_size(&self, graph: &NeighborGraph, max_k: usize) -> Option<usize> {
        let adj = graph.adjacency_lists();
        (0..=max_k).find(|&k| {
            self.colorer
                .color(graph, k)
                .is_some_and(|colors| is_proper(&adj, &colors, k))
        })
    }
}
