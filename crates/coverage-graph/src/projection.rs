//! Ground projection of satellite positions

use crate::{GeometryError, Result};
use nalgebra::Vector3;

/// Radial projection of each position onto the sphere: the satellite's
/// shadow point `center + (p - center) * radius / |p - center|`.
///
/// Order is preserved, so shadow `i` belongs to satellite `i`.
pub fn project_to_sphere(
    positions: &[Vector3<f64>],
    radius: f64,
    center: Vector3<f64>,
) -> Result<Vec<Vector3<f64>>> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(GeometryError::InvalidSphere(format!("radius {}", radius)));
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let offset = p - center;
            let norm = offset.norm();
            if !norm.is_finite() || norm <= radius * 1e-9 {
                return Err(GeometryError::ZeroLengthPosition(i));
            }
            Ok(center + offset * (radius / norm))
        })
        .collect()
}
