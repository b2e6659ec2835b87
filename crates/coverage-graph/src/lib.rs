//! Coverage Graph - satellite coverage cells and their adjacency
//!
//! Turns a snapshot of satellite positions into the graph that channel
//! planning colors:
//!
//! - Ground projection of satellites onto the body sphere
//! - Spherical Voronoi partition of the projected points (coverage cells)
//! - Cell adjacency graph (cells sharing a Voronoi edge)
//! - Export to visualization formats (GeoJSON, Cytoscape)

use thiserror::Error;

pub mod export;
pub mod hull;
pub mod neighbors;
pub mod projection;
pub mod voronoi;

pub use neighbors::NeighborGraph;
pub use projection::project_to_sphere;
pub use voronoi::{VoronoiOptions, VoronoiPartition};

/// Geometry and graph construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid sphere: {0}")]
    InvalidSphere(String),
    #[error("At least 4 sites are required, got {0}")]
    TooFewSites(usize),
    #[error("Site {site} is not on the sphere (distance from center {distance})")]
    NotOnSphere { site: usize, distance: f64 },
    #[error("Sites {0} and {1} coincide")]
    CoincidentSites(usize, usize),
    #[error("Sites {0} and {1} are antipodal")]
    AntipodalSites(usize, usize),
    #[error("All sites lie on a single great circle")]
    SingleGreatCircle,
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),
    #[error("Site {0} is not a vertex of the Delaunay triangulation")]
    SiteNotOnHull(usize),
    #[error("Position {0} coincides with the sphere center")]
    ZeroLengthPosition(usize),
    #[error("Regions {first} and {second} share {shared} vertices, expected 0 or 2")]
    InconsistentAdjacency {
        first: usize,
        second: usize,
        shared: usize,
    },
    #[error("Invalid edge ({0}, {1})")]
    InvalidEdge(usize, usize),
}

pub type Result<T> = std::result::Result<T, GeometryError>;
