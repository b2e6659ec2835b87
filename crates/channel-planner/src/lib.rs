//! Channel Planner
//!
//! Assigns frequency channels to a Walker constellation so that satellites
//! with adjacent ground-coverage cells never share a channel.
//!
//! # Pipeline
//!
//! ```text
//! catalog -> shells -> elements -> J2 trajectory -> shadows -> Voronoi -> neighbors -> channels
//! ```
//!
//! Coloring is per epoch. Each epoch's plan is computed from that epoch's
//! positions only; channels are not carried across epochs.

use coverage_graph::GeometryError;
use orbital_mechanics::OrbitalError;
use thiserror::Error;

pub mod assignment;
pub mod catalog;
pub mod coloring;
pub mod pipeline;
pub mod tabu;

pub use assignment::{ChannelAssigner, ChannelAssignment};
pub use catalog::{Catalog, CatalogEntry};
pub use coloring::{ColoringConfig, DsaturColorer, NodeColorer};
pub use pipeline::{ChannelPlanner, EpochPlan, PlannerConfig};

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Orbital error: {0}")]
    Orbital(#[from] OrbitalError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Constellation not found: {0}")]
    NotFound(String),
    #[error("No proper assignment of {satellites} satellites with {pool_size} channels")]
    InfeasibleAssignment { pool_size: usize, satellites: usize },
    #[error("Invalid frequency pool: {0}")]
    InvalidPool(String),
    #[error("Epoch index {index} out of range ({count} epochs)")]
    EpochOutOfRange { index: usize, count: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    /// A larger frequency pool may fix the failure; nothing else is retryable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlannerError::InfeasibleAssignment { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
