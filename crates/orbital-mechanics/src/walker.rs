//! Walker shell definitions and initial element generation

use crate::constants::BodyConstants;
use crate::{OrbitalError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// One Walker-pattern sub-constellation.
///
/// Angles are in radians and the altitude is in metres. Catalog formats that
/// store degrees and kilometres go through [`WalkerShell::from_catalog_units`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkerShell {
    /// Orbit inclination [rad]
    pub inclination: f64,
    /// Satellites in each orbital plane
    pub sats_per_plane: u32,
    /// Number of orbital planes
    pub plane_count: u32,
    /// Phase shift factor `f` between satellites of adjacent planes
    pub phase_factor: i32,
    /// Altitude above the reference radius [m]
    pub altitude_m: f64,
    /// Span over which plane RAANs are distributed [rad]
    pub raan_span: f64,
    /// RAAN of the first plane [rad]
    pub raan_start: f64,
}

/// Classical elements of a circular orbit.
///
/// Eccentricity and argument of perigee are always zero, so the argument of
/// latitude stands in for true anomaly plus argument of perigee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElement {
    /// Semi-major axis [m]
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Right ascension of the ascending node [rad]
    pub raan: f64,
    /// Inclination [rad]
    pub inclination: f64,
    /// Argument of latitude [rad]
    pub arg_of_latitude: f64,
}

impl OrbitalElement {
    pub fn circular(semi_major_axis: f64, raan: f64, inclination: f64, arg_of_latitude: f64) -> Self {
        Self {
            semi_major_axis,
            eccentricity: 0.0,
            raan,
            inclination,
            arg_of_latitude,
        }
    }

    /// Keplerian orbital period [s]
    pub fn period(&self, constants: &BodyConstants) -> f64 {
        TAU * (self.semi_major_axis.powi(3) / constants.gm).sqrt()
    }
}

impl WalkerShell {
    /// Build a shell from catalog units: degrees for angles, km for altitude.
    pub fn from_catalog_units(
        inclination_deg: f64,
        sats_per_plane: u32,
        plane_count: u32,
        phase_factor: i32,
        altitude_km: f64,
        raan_span_deg: f64,
        raan_start_deg: f64,
    ) -> Self {
        Self {
            inclination: inclination_deg.to_radians(),
            sats_per_plane,
            plane_count,
            phase_factor,
            altitude_m: altitude_km * 1000.0,
            raan_span: raan_span_deg.to_radians(),
            raan_start: raan_start_deg.to_radians(),
        }
    }

    pub fn satellite_count(&self) -> usize {
        self.sats_per_plane as usize * self.plane_count as usize
    }

    /// Reject malformed shells before any element is generated.
    pub fn validate(&self) -> Result<()> {
        if self.sats_per_plane == 0 || self.plane_count == 0 {
            return Err(OrbitalError::InvalidShell(format!(
                "satellite count must be positive, got {} per plane x {} planes",
                self.sats_per_plane, self.plane_count
            )));
        }
        let angles = [
            ("inclination", self.inclination),
            ("raan_span", self.raan_span),
            ("raan_start", self.raan_start),
        ];
        for (name, value) in angles {
            if !value.is_finite() {
                return Err(OrbitalError::InvalidShell(format!("{} is not finite", name)));
            }
        }
        if !self.altitude_m.is_finite() {
            return Err(OrbitalError::InvalidShell("altitude is not finite".to_string()));
        }
        Ok(())
    }

    /// RAAN of every plane: `plane_count` steps of a linear span from
    /// `raan_start` to `raan_start + raan_span`, closing point dropped,
    /// wrapped into `[0, 2π)`.
    pub fn plane_raans(&self) -> Vec<f64> {
        let planes = self.plane_count as usize;
        let step = self.raan_span / planes as f64;
        (0..planes)
            .map(|p| (self.raan_start + step * p as f64).rem_euclid(TAU))
            .collect()
    }

    /// Initial elements for every satellite of the shell, plane by plane.
    pub fn initial_elements(&self, constants: &BodyConstants) -> Result<Vec<OrbitalElement>> {
        self.validate()?;

        let semi_major_axis = constants.radius_m + self.altitude_m;
        if semi_major_axis <= 0.0 {
            return Err(OrbitalError::InvalidShell(format!(
                "altitude {} m puts the orbit inside the body",
                self.altitude_m
            )));
        }

        let sat_count = self.satellite_count() as f64;
        let per_plane = self.sats_per_plane as f64;
        let mut elements = Vec::with_capacity(self.satellite_count());

        for (plane, raan) in self.plane_raans().into_iter().enumerate() {
            for slot in 0..self.sats_per_plane {
                // Walker phasing: adjacent planes are staggered by f/T of a revolution
                let arg_of_latitude = TAU
                    * (slot as f64 / per_plane
                        + self.phase_factor as f64 * plane as f64 / sat_count);
                elements.push(OrbitalElement::circular(
                    semi_major_axis,
                    raan,
                    self.inclination,
                    arg_of_latitude,
                ));
            }
        }

        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn starlink_like() -> WalkerShell {
        WalkerShell::from_catalog_units(53.0, 22, 72, 39, 550.0, 360.0, 0.0)
    }

    #[test]
    fn test_satellite_count() {
        assert_eq!(starlink_like().satellite_count(), 1584);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut shell = starlink_like();
        shell.sats_per_plane = 0;
        assert!(matches!(shell.validate(), Err(OrbitalError::InvalidShell(_))));
        assert!(shell.initial_elements(&BodyConstants::earth()).is_err());

        let mut shell = starlink_like();
        shell.plane_count = 0;
        assert!(shell.validate().is_err());
    }

    #[test]
    fn test_plane_raans_drop_closing_point() {
        let shell = WalkerShell::from_catalog_units(53.0, 1, 4, 0, 550.0, 360.0, 0.0);
        let raans = shell.plane_raans();
        assert_eq!(raans.len(), 4);
        for (raan, expected) in raans.iter().zip([0.0, PI / 2.0, PI, 1.5 * PI]) {
            assert!((raan - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_plane_raans_wrap() {
        let shell = WalkerShell::from_catalog_units(53.0, 1, 2, 0, 550.0, 180.0, 270.0);
        let raans = shell.plane_raans();
        assert!((raans[0] - 1.5 * PI).abs() < 1e-12);
        // 270 + 90 wraps to 0
        assert!(raans[1].abs() < 1e-12 || (raans[1] - TAU).abs() < 1e-12);
    }

    #[test]
    fn test_semi_major_axis_is_radius_plus_altitude() {
        let constants = BodyConstants::earth();
        let shell = starlink_like();
        let elements = shell.initial_elements(&constants).unwrap();
        assert_eq!(elements.len(), shell.satellite_count());
        for el in &elements {
            assert_eq!(el.semi_major_axis, constants.radius_m + 550_000.0);
            assert_eq!(el.eccentricity, 0.0);
            assert_eq!(el.inclination, 53.0_f64.to_radians());
        }
    }

    #[test]
    fn test_walker_phasing() {
        let shell = WalkerShell::from_catalog_units(60.0, 3, 2, 1, 1000.0, 360.0, 0.0);
        let elements = shell.initial_elements(&BodyConstants::earth()).unwrap();
        // Plane 0: 0, 1/3, 2/3 of a revolution
        assert!((elements[1].arg_of_latitude - TAU / 3.0).abs() < 1e-12);
        // Plane 1 first slot is shifted by f/T = 1/6 of a revolution
        assert!((elements[3].arg_of_latitude - TAU / 6.0).abs() < 1e-12);
        assert!((elements[3].raan - PI).abs() < 1e-12);
    }

    #[test]
    fn test_leo_period() {
        let el = OrbitalElement::circular(6_378_135.0 + 400_000.0, 0.0, 0.0, 0.0);
        let period = el.period(&BodyConstants::earth());
        // ISS-like ~92 min
        assert!(period > 5400.0 && period < 5700.0, "got {:.0} s", period);
    }
}
