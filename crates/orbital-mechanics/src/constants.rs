//! Reference body constants
//!
//! Physical constants are passed around as an explicit [`BodyConstants`]
//! value. Nothing in this crate reads them from process-wide state.

use crate::{OrbitalError, Result};
use serde::{Deserialize, Serialize};

/// Equatorial radius of the Earth [m]
pub const EARTH_RADIUS_M: f64 = 6_378_135.0;

/// Gravitational parameter of the Earth [m^3/s^2]
pub const EARTH_GM: f64 = 3.986004415e14;

/// Second zonal harmonic of the geopotential (dimensionless)
pub const EARTH_J2: f64 = 1.082626e-3;

/// Shape and gravity constants of the body the constellation orbits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyConstants {
    /// Reference (equatorial) radius [m]
    pub radius_m: f64,
    /// Gravitational parameter [m^3/s^2]
    pub gm: f64,
    /// J2 zonal coefficient
    pub j2: f64,
}

impl BodyConstants {
    pub const fn earth() -> Self {
        Self {
            radius_m: EARTH_RADIUS_M,
            gm: EARTH_GM,
            j2: EARTH_J2,
        }
    }

    /// Build a validated constant set.
    pub fn new(radius_m: f64, gm: f64, j2: f64) -> Result<Self> {
        let constants = Self { radius_m, gm, j2 };
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(OrbitalError::InvalidConstants(format!(
                "body radius must be positive and finite, got {}",
                self.radius_m
            )));
        }
        if !(self.gm.is_finite() && self.gm > 0.0) {
            return Err(OrbitalError::InvalidConstants(format!(
                "gravitational parameter must be positive and finite, got {}",
                self.gm
            )));
        }
        if !self.j2.is_finite() {
            return Err(OrbitalError::InvalidConstants(format!(
                "J2 must be finite, got {}",
                self.j2
            )));
        }
        Ok(())
    }
}

impl Default for BodyConstants {
    fn default() -> Self {
        Self::earth()
    }
}
