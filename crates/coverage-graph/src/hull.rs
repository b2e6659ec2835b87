//! Incremental 3D convex hull
//!
//! Built for point sets on a sphere, where every input point is a hull
//! vertex. Faces are triangles with counter-clockwise vertex order seen from
//! outside, so `(b - a) x (c - a)` is the outward normal.

use crate::{GeometryError, Result};
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::debug;

/// Orientation tolerance for unit-scale coordinates
pub const PLANE_EPS: f64 = 1e-10;

#[derive(Debug, Clone)]
struct Face {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
    alive: bool,
}

impl Face {
    fn new(points: &[Vector3<f64>], vertices: [usize; 3]) -> Result<Self> {
        let [a, b, c] = vertices;
        let normal = (points[b] - points[a])
            .cross(&(points[c] - points[a]))
            .try_normalize(f64::MIN_POSITIVE)
            .ok_or_else(|| {
                GeometryError::Degenerate(format!("hull face {:?} has zero area", vertices))
            })?;
        Ok(Self {
            vertices,
            normal,
            offset: normal.dot(&points[a]),
            alive: true,
        })
    }

    fn distance(&self, p: &Vector3<f64>) -> f64 {
        self.normal.dot(p) - self.offset
    }

    fn flipped(mut self) -> Self {
        self.vertices.swap(1, 2);
        self.normal = -self.normal;
        self.offset = -self.offset;
        self
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Closed triangulated hull surface.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    /// Counter-clockwise (outward) triangles
    pub faces: Vec<[usize; 3]>,
    /// Unit outward normal of each face
    pub normals: Vec<Vector3<f64>>,
}

/// Convex hull of `points`; fails unless the set spans three dimensions and
/// every point ends up as a hull vertex.
pub fn convex_hull(points: &[Vector3<f64>]) -> Result<ConvexHull> {
    let n = points.len();
    if n < 4 {
        return Err(GeometryError::TooFewSites(n));
    }

    let seed = initial_simplex(points)?;
    let centroid = seed.iter().map(|&i| points[i]).sum::<Vector3<f64>>() / 4.0;

    let mut faces: Vec<Face> = Vec::with_capacity(2 * n);
    let mut edge_face: HashMap<(usize, usize), usize> = HashMap::with_capacity(6 * n);

    let [i0, i1, i2, i3] = seed;
    for tri in [[i0, i1, i2], [i0, i1, i3], [i0, i2, i3], [i1, i2, i3]] {
        let mut face = Face::new(points, tri)?;
        if face.distance(&centroid) > 0.0 {
            face = face.flipped();
        }
        let idx = faces.len();
        for edge in face.edges() {
            edge_face.insert(edge, idx);
        }
        faces.push(face);
    }

    for p in (0..n).filter(|p| !seed.contains(p)) {
        let point = points[p];
        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.distance(&point) > PLANE_EPS)
            .map(|(i, _)| i)
            .collect();

        if visible.is_empty() {
            return Err(GeometryError::Degenerate(format!(
                "site {} is not strictly outside the hull of the others",
                p
            )));
        }

        let mut horizon = Vec::new();
        for &f in &visible {
            for (u, v) in faces[f].edges() {
                let twin = edge_face.get(&(v, u)).copied().ok_or_else(|| {
                    GeometryError::Degenerate(format!("hull edge ({}, {}) has no twin", u, v))
                })?;
                if !visible.contains(&twin) {
                    horizon.push((u, v));
                }
            }
        }

        for &f in &visible {
            faces[f].alive = false;
            for edge in faces[f].edges() {
                edge_face.remove(&edge);
            }
        }

        for (u, v) in horizon {
            let face = Face::new(points, [u, v, p])?;
            let idx = faces.len();
            for edge in face.edges() {
                edge_face.insert(edge, idx);
            }
            faces.push(face);
        }
    }

    let (tris, normals): (Vec<[usize; 3]>, Vec<Vector3<f64>>) = faces
        .into_iter()
        .filter(|f| f.alive)
        .map(|f| (f.vertices, f.normal))
        .unzip();

    // Closed triangulation of n vertices on a sphere: F = 2n - 4
    if tris.len() != 2 * n - 4 {
        return Err(GeometryError::Degenerate(format!(
            "hull has {} faces, expected {} for {} vertices",
            tris.len(),
            2 * n - 4,
            n
        )));
    }

    debug!("Convex hull: {} vertices, {} faces", n, tris.len());

    Ok(ConvexHull {
        faces: tris,
        normals,
    })
}

/// Four affinely independent points to start the incremental build.
fn initial_simplex(points: &[Vector3<f64>]) -> Result<[usize; 4]> {
    let p0 = 0;

    let p1 = argmax(points, |p| (p - points[p0]).norm());
    let axis = points[p1] - points[p0];
    if axis.norm() <= PLANE_EPS {
        return Err(GeometryError::CoincidentSites(p0, p1));
    }

    let p2 = argmax(points, |p| (p - points[p0]).cross(&axis).norm());
    let normal = axis.cross(&(points[p2] - points[p0]));
    if normal.norm() <= PLANE_EPS * axis.norm() {
        return Err(GeometryError::Degenerate("all sites are collinear".to_string()));
    }
    let normal = normal.normalize();

    let p3 = argmax(points, |p| (p - points[p0]).dot(&normal).abs());
    if (points[p3] - points[p0]).dot(&normal).abs() <= PLANE_EPS {
        return Err(GeometryError::Degenerate(
            "all sites are coplanar, the hull has no volume".to_string(),
        ));
    }

    Ok([p0, p1, p2, p3])
}

fn argmax(points: &[Vector3<f64>], score: impl Fn(&Vector3<f64>) -> f64) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, p) in points.iter().enumerate() {
        let s = score(p);
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octahedron() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
        ]
    }

    #[test]
    fn test_tetrahedron() {
        let points = vec![
            Vector3::new(1.0, 1.0, 1.0).normalize(),
            Vector3::new(1.0, -1.0, -1.0).normalize(),
            Vector3::new(-1.0, 1.0, -1.0).normalize(),
            Vector3::new(-1.0, -1.0, 1.0).normalize(),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.faces.len(), 4);
        for (face, normal) in hull.faces.iter().zip(&hull.normals) {
            // Outward: the fourth vertex lies behind every face
            let other = (0..4).find(|i| !face.contains(i)).unwrap();
            assert!(normal.dot(&(points[other] - points[face[0]])) < 0.0);
        }
    }

    #[test]
    fn test_octahedron_is_closed() {
        let points = octahedron();
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.faces.len(), 8);

        let mut edges = HashMap::new();
        for face in &hull.faces {
            for (u, v) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                *edges.entry((u, v)).or_insert(0) += 1;
            }
        }
        for (&(u, v), &count) in &edges {
            assert_eq!(count, 1);
            assert_eq!(edges.get(&(v, u)), Some(&1), "edge ({}, {}) has no twin", u, v);
        }
    }

    #[test]
    fn test_coplanar_points_rejected() {
        let points: Vec<_> = (0..6)
            .map(|k| {
                let t = k as f64 * std::f64::consts::TAU / 6.0;
                Vector3::new(t.cos(), t.sin(), 0.0)
            })
            .collect();
        assert!(matches!(convex_hull(&points), Err(GeometryError::Degenerate(_))));
    }

    #[test]
    fn test_too_few_points() {
        let points = octahedron()[..3].to_vec();
        assert!(matches!(convex_hull(&points), Err(GeometryError::TooFewSites(3))));
    }
}
