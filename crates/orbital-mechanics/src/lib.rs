//! Orbital Mechanics Library
//!
//! Walker shell element generation, secular J2 propagation of circular
//! orbits, and geocentric coordinate transforms for constellation planning.

use thiserror::Error;

pub mod constants;
pub mod constellation;
pub mod propagation;
pub mod walker;

pub use constants::BodyConstants;
pub use constellation::{Constellation, SatelliteSlot};
pub use propagation::{propagate_j2, EpochSequence, SecularRates, Trajectory};
pub use walker::{OrbitalElement, WalkerShell};

/// Input validation failures. Nothing is computed once one of these is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid Walker shell: {0}")]
    InvalidShell(String),
    #[error("Invalid epoch sequence: {0}")]
    InvalidEpochs(String),
    #[error("Invalid body constants: {0}")]
    InvalidConstants(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

pub mod transforms {
    use nalgebra::Vector3;
    use serde::{Deserialize, Serialize};

    /// Spherical-body position: latitude/longitude in degrees plus radius.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct GeocentricPosition {
        pub latitude: f64,
        pub longitude: f64,
        pub radius_m: f64,
    }

    /// Inertial position to geocentric latitude/longitude (no Earth rotation).
    pub fn to_geocentric(position: &Vector3<f64>) -> GeocentricPosition {
        let r_xy = (position.x * position.x + position.y * position.y).sqrt();
        GeocentricPosition {
            latitude: position.z.atan2(r_xy).to_degrees(),
            longitude: position.y.atan2(position.x).to_degrees(),
            radius_m: position.norm(),
        }
    }

}
