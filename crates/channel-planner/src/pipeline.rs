//! Per-epoch planning pipeline
//!
//! trajectory slice -> shadow points -> Voronoi partition -> neighbor graph
//! -> channel assignment. Each epoch is planned from its own positions only,
//! and its result is either complete or an error.

use crate::assignment::{ChannelAssigner, ChannelAssignment};
use crate::coloring::{ColoringConfig, DsaturColorer, NodeColorer};
use crate::{PlannerError, Result};
use coverage_graph::{project_to_sphere, NeighborGraph, VoronoiOptions, VoronoiPartition};
use nalgebra::Vector3;
use orbital_mechanics::transforms::{to_geocentric, GeocentricPosition};
use orbital_mechanics::{BodyConstants, Constellation, SatelliteSlot, Trajectory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Body the shadows are projected onto
    pub constants: BodyConstants,
    pub coloring: ColoringConfig,
    /// Accept diametrically opposite satellites in the partition
    pub allow_antipodal: bool,
}

/// Coverage cells, adjacency and channels at one epoch.
#[derive(Debug, Clone)]
pub struct EpochPlan {
    pub epoch_index: usize,
    /// Offset from the reference epoch [s]
    pub epoch: f64,
    pub partition: VoronoiPartition,
    pub graph: NeighborGraph,
    pub assignment: ChannelAssignment,
}

pub struct ChannelPlanner<C = DsaturColorer> {
    config: PlannerConfig,
    assigner: ChannelAssigner<C>,
}

impl ChannelPlanner<DsaturColorer> {
    pub fn new(config: PlannerConfig) -> Self {
        let assigner = ChannelAssigner::new(config.coloring);
        Self { config, assigner }
    }
}

impl<C: NodeColorer> ChannelPlanner<C> {
    pub fn with_colorer(config: PlannerConfig, colorer: C) -> Self {
        Self {
            config,
            assigner: ChannelAssigner::with_colorer(colorer),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn assigner(&self) -> &ChannelAssigner<C> {
        &self.assigner
    }

    /// Voronoi partition and neighbor graph of the shadows at one epoch.
    pub fn coverage_at(
        &self,
        trajectory: &Trajectory,
        epoch_index: usize,
    ) -> Result<(VoronoiPartition, NeighborGraph)> {
        let positions = trajectory
            .at_epoch(epoch_index)
            .ok_or(PlannerError::EpochOutOfRange {
                index: epoch_index,
                count: trajectory.epoch_count(),
            })?;

        let radius = self.config.constants.radius_m;
        let center = Vector3::zeros();
        let shadows = project_to_sphere(positions, radius, center)?;

        let options = VoronoiOptions {
            allow_antipodal: self.config.allow_antipodal,
            ..Default::default()
        };
        let partition = VoronoiPartition::compute_with(&shadows, radius, center, options)?;
        let graph = NeighborGraph::from_partition(&partition)?;

        debug!(
            "Epoch {}: {} cells, {} adjacencies, max degree {}",
            epoch_index,
            partition.len(),
            graph.edge_count(),
            graph.max_degree()
        );
        Ok((partition, graph))
    }

    pub fn plan_epoch(
        &self,
        trajectory: &Trajectory,
        epoch_index: usize,
        pool: &[f64],
    ) -> Result<EpochPlan> {
        let (partition, graph) = self.coverage_at(trajectory, epoch_index)?;
        let assignment = self.assigner.assign(&graph, pool)?;

        info!(
            "Planned epoch {} (t={}s): {} channels in use",
            epoch_index,
            trajectory.epochs()[epoch_index],
            assignment.colors_used().len()
        );

        Ok(EpochPlan {
            epoch_index,
            epoch: trajectory.epochs()[epoch_index],
            partition,
            graph,
            assignment,
        })
    }

    /// Plan each requested epoch independently; one failing epoch does not
    /// affect the others.
    pub fn plan_epochs(
        &self,
        trajectory: &Trajectory,
        epoch_indices: &[usize],
        pool: &[f64],
    ) -> Vec<Result<EpochPlan>> {
        epoch_indices
            .iter()
            .map(|&e| {
                let plan = self.plan_epoch(trajectory, e, pool);
                if let Err(err) = &plan {
                    warn!("Epoch {} not planned: {}", e, err);
                }
                plan
            })
            .collect()
    }

    /// Smallest channel count that works at one epoch, searching up to `max_k`.
    pub fn minimum_pool_size_at(
        &self,
        trajectory: &Trajectory,
        epoch_index: usize,
        max_k: usize,
    ) -> Result<Option<usize>> {
        let (_, graph) = self.coverage_at(trajectory, epoch_index)?;
        Ok(self.assigner.minimum_pool_size(&graph, max_k))
    }
}

/// Plan report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub constellation: String,
    pub shell_count: usize,
    pub satellite_count: usize,
    pub epoch_count: usize,
    pub pool: Vec<f64>,
    pub seed: u64,
    pub constants: BodyConstants,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub epoch_index: usize,
    pub epoch_s: f64,
    pub cell_count: usize,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub max_degree: usize,
    pub channels_used: usize,
    pub colors: Vec<usize>,
    pub channels: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_pool_size: Option<usize>,
}

impl EpochReport {
    pub fn from_plan(plan: &EpochPlan) -> Self {
        Self {
            epoch_index: plan.epoch_index,
            epoch_s: plan.epoch,
            cell_count: plan.partition.len(),
            vertex_count: plan.partition.vertices().len(),
            edge_count: plan.graph.edge_count(),
            max_degree: plan.graph.max_degree(),
            channels_used: plan.assignment.colors_used().len(),
            colors: plan.assignment.colors().to_vec(),
            channels: plan.assignment.channels().to_vec(),
            minimum_pool_size: None,
        }
    }
}

/// Position history of one satellite.
#[derive(Debug, Clone, Serialize)]
pub struct SatelliteTrack {
    pub satellite: usize,
    pub slot: SatelliteSlot,
    pub epochs_s: Vec<f64>,
    pub positions_m: Vec<[f64; 3]>,
    pub geocentric: Vec<GeocentricPosition>,
}

impl SatelliteTrack {
    pub fn new(
        constellation: &Constellation,
        trajectory: &Trajectory,
        satellite: usize,
    ) -> Option<Self> {
        let slot = constellation.locate(satellite)?;
        let positions: Vec<Vector3<f64>> = trajectory.track(satellite).collect();
        Some(Self {
            satellite,
            slot,
            epochs_s: trajectory.epochs().to_vec(),
            positions_m: positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
            geocentric: positions.iter().map(to_geocentric).collect(),
        })
    }
}

/// Full output of one planning run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub metadata: ReportMetadata,
    pub epochs: Vec<EpochReport>,
    /// Epochs that could not be planned, with the reason
    pub failures: Vec<EpochFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<SatelliteTrack>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochFailure {
    pub epoch_index: usize,
    pub error: String,
    pub recoverable: bool,
}

impl EpochFailure {
    pub fn new(epoch_index: usize, error: &PlannerError) -> Self {
        Self {
            epoch_index,
            error: error.to_string(),
            recoverable: error.is_recoverable(),
        }
    }
}
