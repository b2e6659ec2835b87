//! Spherical Voronoi partition of satellite shadow points
//!
//! The Voronoi diagram on a sphere is dual to the spherical Delaunay
//! triangulation, which is the 3D convex hull of the sites. Each hull face
//! yields one Voronoi vertex: the face circumcenter pushed out to the sphere,
//! i.e. the outward face normal scaled to the radius. A site's region is the
//! ring of vertices of the faces around it.

use crate::hull::convex_hull;
use crate::{GeometryError, Result};
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::debug;

/// Relative tolerance (fraction of the radius) for site placement checks
pub const SITE_TOLERANCE: f64 = 1e-9;

/// Precondition knobs for [`VoronoiPartition::compute_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiOptions {
    /// Accept pairs of diametrically opposite sites
    pub allow_antipodal: bool,
    /// Relative tolerance for on-sphere, coincidence and antipode tests
    pub tolerance: f64,
}

impl Default for VoronoiOptions {
    fn default() -> Self {
        Self {
            allow_antipodal: false,
            tolerance: SITE_TOLERANCE,
        }
    }
}

/// Coverage cells of a set of sites on a sphere.
///
/// `regions[i]` lists indices into `vertices` in polygon order
/// (counter-clockwise seen from outside the sphere). Vertex `v` is the dual of
/// `triangles[v]`, so it belongs to exactly three regions.
#[derive(Debug, Clone)]
pub struct VoronoiPartition {
    radius: f64,
    center: Vector3<f64>,
    sites: Vec<Vector3<f64>>,
    vertices: Vec<Vector3<f64>>,
    regions: Vec<Vec<usize>>,
    triangles: Vec<[usize; 3]>,
}

impl VoronoiPartition {
    pub fn compute(sites: &[Vector3<f64>], radius: f64, center: Vector3<f64>) -> Result<Self> {
        Self::compute_with(sites, radius, center, VoronoiOptions::default())
    }

    pub fn compute_with(
        sites: &[Vector3<f64>],
        radius: f64,
        center: Vector3<f64>,
        options: VoronoiOptions,
    ) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) || !center.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::InvalidSphere(format!(
                "radius {} centered at {:?}",
                radius,
                center.as_slice()
            )));
        }
        if sites.len() < 4 {
            return Err(GeometryError::TooFewSites(sites.len()));
        }

        let directions = unit_directions(sites, radius, &center, options.tolerance)?;
        check_distinct(&directions, options)?;
        check_not_great_circle(&directions, options.tolerance)?;

        let hull = convex_hull(&directions)?;

        let vertices: Vec<Vector3<f64>> = hull
            .normals
            .iter()
            .map(|n| center + n * radius)
            .collect();
        let regions = order_regions(sites.len(), &hull.faces)?;

        debug!(
            "Spherical Voronoi: {} sites, {} vertices",
            sites.len(),
            vertices.len()
        );

        Ok(Self {
            radius,
            center,
            sites: sites.to_vec(),
            vertices,
            regions,
            triangles: hull.faces,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    pub fn sites(&self) -> &[Vector3<f64>] {
        &self.sites
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn regions(&self) -> &[Vec<usize>] {
        &self.regions
    }

    pub fn region(&self, site: usize) -> Option<&[usize]> {
        self.regions.get(site).map(Vec::as_slice)
    }

    /// Dual spherical Delaunay triangles, one per Voronoi vertex.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Vertex coordinates of one region, in polygon order.
    pub fn region_polygon(&self, site: usize) -> Option<Vec<Vector3<f64>>> {
        self.region(site)
            .map(|region| region.iter().map(|&v| self.vertices[v]).collect())
    }

    /// Surface area of every region; they add up to 4πR².
    pub fn region_areas(&self) -> Vec<f64> {
        let r2 = self.radius * self.radius;
        self.regions
            .iter()
            .enumerate()
            .map(|(site, region)| {
                let s = (self.sites[site] - self.center) / self.radius;
                let excess: f64 = (0..region.len())
                    .map(|k| {
                        let a = (self.vertices[region[k]] - self.center) / self.radius;
                        let b = (self.vertices[region[(k + 1) % region.len()]] - self.center)
                            / self.radius;
                        spherical_excess(&s, &a, &b)
                    })
                    .sum();
                excess * r2
            })
            .collect()
    }
}

/// Spherical excess of a unit-sphere triangle (Van Oosterom & Strackee).
fn spherical_excess(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let triple = a.dot(&b.cross(c)).abs();
    let denom = 1.0 + a.dot(b) + b.dot(c) + c.dot(a);
    2.0 * triple.atan2(denom)
}

fn unit_directions(
    sites: &[Vector3<f64>],
    radius: f64,
    center: &Vector3<f64>,
    tolerance: f64,
) -> Result<Vec<Vector3<f64>>> {
    sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let offset = site - center;
            let distance = offset.norm();
            if !distance.is_finite() || (distance - radius).abs() > tolerance * radius {
                return Err(GeometryError::NotOnSphere { site: i, distance });
            }
            Ok(offset / distance)
        })
        .collect()
}

/// Reject coincident (and, unless allowed, antipodal) site pairs.
///
/// Sweeps the sites sorted by x so only pairs whose x-coordinates are close
/// get a full distance test.
fn check_distinct(directions: &[Vector3<f64>], options: VoronoiOptions) -> Result<()> {
    let tol = options.tolerance;
    let mut order: Vec<usize> = (0..directions.len()).collect();
    order.sort_by(|&a, &b| directions[a].x.total_cmp(&directions[b].x));
    let xs: Vec<f64> = order.iter().map(|&i| directions[i].x).collect();

    let pair = |a: usize, b: usize| (a.min(b), a.max(b));

    for a in 0..order.len() {
        for b in (a + 1)..order.len() {
            if xs[b] - xs[a] >= tol {
                break;
            }
            let (i, j) = (order[a], order[b]);
            if (directions[i] - directions[j]).norm() < tol {
                let (i, j) = pair(i, j);
                return Err(GeometryError::CoincidentSites(i, j));
            }
        }
    }

    if options.allow_antipodal {
        return Ok(());
    }

    for a in 0..order.len() {
        let target = -xs[a];
        let start = xs.partition_point(|&x| x < target - tol);
        for b in start..order.len() {
            if xs[b] > target + tol {
                break;
            }
            let (i, j) = (order[a], order[b]);
            if i != j && (directions[i] + directions[j]).norm() < tol {
                let (i, j) = pair(i, j);
                return Err(GeometryError::AntipodalSites(i, j));
            }
        }
    }

    Ok(())
}

fn check_not_great_circle(directions: &[Vector3<f64>], tolerance: f64) -> Result<()> {
    let first = directions[0];
    let Some(normal) = directions[1..]
        .iter()
        .find_map(|d| first.cross(d).try_normalize(tolerance))
    else {
        return Err(GeometryError::SingleGreatCircle);
    };
    if directions.iter().all(|d| normal.dot(d).abs() <= tolerance) {
        return Err(GeometryError::SingleGreatCircle);
    }
    Ok(())
}

/// Walk the fan of triangles around every site.
///
/// For a counter-clockwise face `(a, b, c)`, the next face around `a` is the
/// one holding the directed edge `a -> c`.
fn order_regions(site_count: usize, triangles: &[[usize; 3]]) -> Result<Vec<Vec<usize>>> {
    let mut edge_face: HashMap<(usize, usize), usize> = HashMap::with_capacity(3 * triangles.len());
    let mut first_face: Vec<Option<usize>> = vec![None; site_count];

    for (f, &[a, b, c]) in triangles.iter().enumerate() {
        edge_face.insert((a, b), f);
        edge_face.insert((b, c), f);
        edge_face.insert((c, a), f);
        for v in [a, b, c] {
            first_face[v].get_or_insert(f);
        }
    }

    let mut regions = Vec::with_capacity(site_count);
    for (site, start) in first_face.into_iter().enumerate() {
        let start = start.ok_or(GeometryError::SiteNotOnHull(site))?;
        let mut region = Vec::new();
        let mut face = start;
        loop {
            region.push(face);
            if region.len() > triangles.len() {
                return Err(GeometryError::Degenerate(format!(
                    "face fan around site {} does not close",
                    site
                )));
            }
            let tri = triangles[face];
            let pos = tri.iter().position(|&v| v == site).ok_or_else(|| {
                GeometryError::Degenerate(format!("face {} does not touch site {}", face, site))
            })?;
            let prev = tri[(pos + 2) % 3];
            face = *edge_face.get(&(site, prev)).ok_or_else(|| {
                GeometryError::Degenerate(format!("open hull edge ({}, {})", site, prev))
            })?;
            if face == start {
                break;
            }
        }
        regions.push(region);
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const R: f64 = 6_378_135.0;

    fn fibonacci_sphere(n: usize, radius: f64) -> Vec<Vector3<f64>> {
        let golden = PI * (3.0 - 5.0_f64.sqrt());
        (0..n)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f64;
                Vector3::new(r * theta.cos(), y, r * theta.sin()) * radius
            })
            .collect()
    }

    fn tetrahedron(radius: f64) -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(1.0, 1.0, 1.0).normalize() * radius,
            Vector3::new(1.0, -1.0, -1.0).normalize() * radius,
            Vector3::new(-1.0, 1.0, -1.0).normalize() * radius,
            Vector3::new(-1.0, -1.0, 1.0).normalize() * radius,
        ]
    }

    #[test]
    fn test_tetrahedron_partition() {
        let sites = tetrahedron(R);
        let vor = VoronoiPartition::compute(&sites, R, Vector3::zeros()).unwrap();
        assert_eq!(vor.len(), 4);
        assert_eq!(vor.vertices().len(), 4);
        for region in vor.regions() {
            assert_eq!(region.len(), 3);
        }
        // Voronoi vertices of a regular tetrahedron are the antipodes of the sites
        for site in &sites {
            assert!(vor.vertices().iter().any(|v| (v + site).norm() < 1e-3));
        }
    }

    #[test]
    fn test_vertices_equidistant_from_generating_sites() {
        let sites = fibonacci_sphere(200, R);
        let vor = VoronoiPartition::compute(&sites, R, Vector3::zeros()).unwrap();
        for (v, tri) in vor.vertices().iter().zip(vor.triangles()) {
            assert!((v.norm() - R).abs() < 1e-6 * R);
            let d: Vec<f64> = tri.iter().map(|&s| (v - sites[s]).norm()).collect();
            assert!((d[0] - d[1]).abs() < 1e-6 * R && (d[1] - d[2]).abs() < 1e-6 * R);
            // No other site is closer than the generating ones
            let nearest = sites.iter().map(|s| (v - s).norm()).fold(f64::INFINITY, f64::min);
            assert!(nearest >= d[0] - 1e-6 * R);
        }
    }

    #[test]
    fn test_region_areas_cover_sphere() {
        let sites = fibonacci_sphere(150, R);
        let vor = VoronoiPartition::compute(&sites, R, Vector3::zeros()).unwrap();
        let total: f64 = vor.region_areas().iter().sum();
        let sphere = 4.0 * PI * R * R;
        assert!((total - sphere).abs() / sphere < 1e-9, "total {} vs {}", total, sphere);
    }

    #[test]
    fn test_regions_are_ordered_polygons() {
        let sites = fibonacci_sphere(64, 1.0);
        let vor = VoronoiPartition::compute(&sites, 1.0, Vector3::zeros()).unwrap();
        for (site, region) in vor.regions().iter().enumerate() {
            let s = sites[site];
            // Consecutive vertices turn the same way around the site
            for k in 0..region.len() {
                let a = vor.vertices()[region[k]];
                let b = vor.vertices()[region[(k + 1) % region.len()]];
                assert!(s.dot(&a.cross(&b)) > 0.0, "region {} is not counter-clockwise", site);
            }
        }
    }

    #[test]
    fn test_off_center_sphere() {
        let center = Vector3::new(10.0, -4.0, 2.5);
        let sites: Vec<_> = fibonacci_sphere(30, 3.0).into_iter().map(|p| p + center).collect();
        let vor = VoronoiPartition::compute(&sites, 3.0, center).unwrap();
        for v in vor.vertices() {
            assert!(((v - center).norm() - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_too_few_sites() {
        let sites = tetrahedron(R)[..3].to_vec();
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::TooFewSites(3))
        ));
    }

    #[test]
    fn test_rejects_coincident_sites() {
        let mut sites = fibonacci_sphere(20, R);
        sites[13] = sites[4];
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::CoincidentSites(4, 13))
        ));
    }

    #[test]
    fn test_antipodal_policy() {
        let mut sites = fibonacci_sphere(20, R);
        sites[7] = -sites[2];
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::AntipodalSites(2, 7))
        ));

        let options = VoronoiOptions {
            allow_antipodal: true,
            ..Default::default()
        };
        let vor = VoronoiPartition::compute_with(&sites, R, Vector3::zeros(), options).unwrap();
        assert_eq!(vor.regions().len(), 20);
    }

    #[test]
    fn test_rejects_single_great_circle() {
        let sites: Vec<_> = (0..8)
            .map(|k| {
                let t = 0.3 + k as f64 * PI / 4.5;
                Vector3::new(t.cos(), 0.0, t.sin()) * R
            })
            .collect();
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::SingleGreatCircle)
        ));
    }

    #[test]
    fn test_rejects_small_circle() {
        // All on one latitude: coplanar but not through the center
        let sites: Vec<_> = (0..8)
            .map(|k| {
                let t = k as f64 * PI / 4.0 + 0.1;
                Vector3::new(0.6 * t.cos(), 0.6 * t.sin(), 0.8) * R
            })
            .collect();
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::Degenerate(_))
        ));
    }

    #[test]
    fn test_rejects_point_off_sphere() {
        let mut sites = fibonacci_sphere(10, R);
        sites[3] *= 1.01;
        assert!(matches!(
            VoronoiPartition::compute(&sites, R, Vector3::zeros()),
            Err(GeometryError::NotOnSphere { site: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_radius() {
        let sites = tetrahedron(1.0);
        assert!(matches!(
            VoronoiPartition::compute(&sites, 0.0, Vector3::zeros()),
            Err(GeometryError::InvalidSphere(_))
        ));
    }
}
