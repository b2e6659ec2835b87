//! Secular J2 propagation of circular orbits
//!
//! First-order secular model only: RAAN precession and the draconic rate of
//! the argument of latitude. No short/long-period terms, drag or maneuvers.

use crate::constants::BodyConstants;
use crate::walker::OrbitalElement;
use crate::{OrbitalError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered time offsets [s] from the reference epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct EpochSequence(Vec<f64>);

impl TryFrom<Vec<f64>> for EpochSequence {
    type Error = OrbitalError;

    fn try_from(offsets: Vec<f64>) -> Result<Self> {
        Self::new(offsets)
    }
}

impl EpochSequence {
    pub fn new(offsets: Vec<f64>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(OrbitalError::InvalidEpochs("epoch sequence is empty".to_string()));
        }
        if let Some(idx) = offsets.iter().position(|t| !t.is_finite()) {
            return Err(OrbitalError::InvalidEpochs(format!(
                "epoch {} is not finite ({})",
                idx, offsets[idx]
            )));
        }
        Ok(Self(offsets))
    }

    /// `count` epochs spaced `step` seconds apart, starting at zero.
    pub fn uniform(count: usize, step: f64) -> Result<Self> {
        Self::new((0..count).map(|i| i as f64 * step).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Secular drift rates of one satellite [rad/s].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecularRates {
    pub raan_rate: f64,
    pub latitude_rate: f64,
}

impl SecularRates {
    pub fn for_element(element: &OrbitalElement, constants: &BodyConstants) -> Self {
        let a = element.semi_major_axis;
        let cos_i = element.inclination.cos();
        let r = constants.radius_m;

        let raan_rate =
            -1.5 * constants.j2 * constants.gm.sqrt() * r * r / a.powf(3.5) * cos_i;

        let latitude_rate = (constants.gm / a.powi(3)).sqrt()
            * (1.0 - 1.5 * constants.j2 * (r / a).powi(2))
            * (1.0 - 4.0 * cos_i * cos_i);

        Self {
            raan_rate,
            latitude_rate,
        }
    }
}

/// Inertial position of a circular orbit at time offset `t`.
pub fn position_at(element: &OrbitalElement, rates: &SecularRates, t: f64) -> Vector3<f64> {
    let a = element.semi_major_axis;
    let u = element.arg_of_latitude + t * rates.latitude_rate;
    let raan = element.raan + t * rates.raan_rate;

    let (sin_u, cos_u) = u.sin_cos();
    let (sin_raan, cos_raan) = raan.sin_cos();
    let (sin_i, cos_i) = element.inclination.sin_cos();

    Vector3::new(
        a * (cos_u * cos_raan - sin_u * cos_i * sin_raan),
        a * (cos_u * sin_raan + sin_u * cos_i * cos_raan),
        a * sin_u * sin_i,
    )
}

/// Positions of every satellite at every epoch.
///
/// Logically shaped `(satellite, axis, epoch)`; stored epoch-major so each
/// epoch's positions form one contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    epochs: Vec<f64>,
    satellite_count: usize,
    positions: Vec<Vector3<f64>>,
}

impl Trajectory {
    pub fn satellite_count(&self) -> usize {
        self.satellite_count
    }

    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }

    pub fn epochs(&self) -> &[f64] {
        &self.epochs
    }

    /// `(satellites, 3, epochs)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.satellite_count, 3, self.epochs.len())
    }

    /// All satellite positions at one epoch, in satellite order.
    pub fn at_epoch(&self, epoch: usize) -> Option<&[Vector3<f64>]> {
        if epoch >= self.epochs.len() {
            return None;
        }
        let start = epoch * self.satellite_count;
        Some(&self.positions[start..start + self.satellite_count])
    }

    pub fn position(&self, satellite: usize, epoch: usize) -> Option<Vector3<f64>> {
        if satellite >= self.satellite_count {
            return None;
        }
        self.at_epoch(epoch).map(|slice| slice[satellite])
    }

    /// Positions of one satellite across all epochs.
    pub fn track(&self, satellite: usize) -> impl Iterator<Item = Vector3<f64>> + '_ {
        let n = self.satellite_count;
        let valid = satellite < n;
        (0..self.epochs.len())
            .filter(move |_| valid)
            .map(move |e| self.positions[e * n + satellite])
    }
}

/// Propagate circular elements to inertial positions with secular J2 drift.
pub fn propagate_j2(
    elements: &[OrbitalElement],
    epochs: &EpochSequence,
    constants: &BodyConstants,
) -> Result<Trajectory> {
    constants.validate()?;

    let rates: Vec<SecularRates> = elements
        .iter()
        .map(|el| SecularRates::for_element(el, constants))
        .collect();

    let mut positions = Vec::with_capacity(elements.len() * epochs.len());
    for &t in epochs.as_slice() {
        positions.extend(
            elements
                .iter()
                .zip(&rates)
                .map(|(el, rate)| position_at(el, rate, t)),
        );
    }

    debug!(
        "Propagated {} satellites over {} epochs",
        elements.len(),
        epochs.len()
    );

    Ok(Trajectory {
        epochs: epochs.as_slice().to_vec(),
        satellite_count: elements.len(),
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::WalkerShell;
    use std::f64::consts::PI;

    #[test]
    fn test_epoch_validation() {
        assert!(EpochSequence::new(vec![]).is_err());
        assert!(EpochSequence::new(vec![0.0, f64::INFINITY]).is_err());
        // Duplicates are allowed
        assert_eq!(EpochSequence::new(vec![0.0, 0.0, 10.0]).unwrap().len(), 3);
        assert_eq!(EpochSequence::uniform(3, 60.0).unwrap().as_slice(), &[0.0, 60.0, 120.0]);
    }

    #[test]
    fn test_equatorial_position_at_epoch_zero() {
        let el = OrbitalElement::circular(7_000_000.0, 0.0, 0.0, 0.0);
        let rates = SecularRates::for_element(&el, &BodyConstants::earth());
        let p = position_at(&el, &rates, 0.0);
        assert!((p - Vector3::new(7_000_000.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_polar_orbit_has_no_raan_drift() {
        let el = OrbitalElement::circular(7_000_000.0, 0.0, PI / 2.0, 0.0);
        let rates = SecularRates::for_element(&el, &BodyConstants::earth());
        assert!(rates.raan_rate.abs() < 1e-18);
    }

    #[test]
    fn test_prograde_orbit_regresses() {
        // Prograde orbits precess westward
        let el = OrbitalElement::circular(6_928_135.0, 0.0, 53.0_f64.to_radians(), 0.0);
        let rates = SecularRates::for_element(&el, &BodyConstants::earth());
        assert!(rates.raan_rate < 0.0);
        // ~ -4.5 deg/day at 550 km, 53 deg
        let deg_per_day = rates.raan_rate.to_degrees() * 86_400.0;
        assert!(deg_per_day < -4.0 && deg_per_day > -5.0, "got {}", deg_per_day);
    }

    #[test]
    fn test_zero_j2_latitude_rate() {
        let constants = BodyConstants::new(6_378_135.0, 3.986004415e14, 0.0).unwrap();
        let el = OrbitalElement::circular(7_000_000.0, 0.0, 0.0, 0.0);
        let rates = SecularRates::for_element(&el, &constants);
        let mean_motion = (constants.gm / 7_000_000.0_f64.powi(3)).sqrt();
        assert_eq!(rates.raan_rate, 0.0);
        // (1 - 4 cos^2 0) = -3 for equatorial orbits
        assert!((rates.latitude_rate + 3.0 * mean_motion).abs() < 1e-15);
    }

    #[test]
    fn test_trajectory_layout() {
        let constants = BodyConstants::earth();
        let shell = WalkerShell::from_catalog_units(53.0, 3, 2, 1, 550.0, 360.0, 0.0);
        let elements = shell.initial_elements(&constants).unwrap();
        let epochs = EpochSequence::uniform(4, 30.0).unwrap();
        let traj = propagate_j2(&elements, &epochs, &constants).unwrap();

        assert_eq!(traj.shape(), (6, 3, 4));
        assert_eq!(traj.at_epoch(2).unwrap().len(), 6);
        assert!(traj.at_epoch(4).is_none());
        assert!(traj.position(6, 0).is_none());

        let track: Vec<_> = traj.track(5).collect();
        assert_eq!(track.len(), 4);
        assert_eq!(track[3], traj.position(5, 3).unwrap());
        assert_eq!(traj.track(99).count(), 0);
    }

    #[test]
    fn test_orbit_radius_preserved() {
        let constants = BodyConstants::earth();
        let shell = WalkerShell::from_catalog_units(97.6, 4, 3, 2, 560.0, 180.0, 10.0);
        let elements = shell.initial_elements(&constants).unwrap();
        let epochs = EpochSequence::uniform(50, 137.0).unwrap();
        let traj = propagate_j2(&elements, &epochs, &constants).unwrap();

        for e in 0..traj.epoch_count() {
            for (s, p) in traj.at_epoch(e).unwrap().iter().enumerate() {
                let a = elements[s].semi_major_axis;
                assert!((p.norm() - a).abs() / a < 1e-12);
            }
        }
    }
}
