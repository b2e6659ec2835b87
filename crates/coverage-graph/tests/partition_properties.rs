//! Property tests for the Voronoi partition and neighbor graph

use coverage_graph::{project_to_sphere, NeighborGraph, VoronoiPartition};
use nalgebra::Vector3;
use proptest::prelude::*;

const R: f64 = 6_378_135.0;

/// Random directions kept apart so every generated set is well conditioned.
fn sites_strategy() -> impl Strategy<Value = Vec<Vector3<f64>>> {
    prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0), 6..60).prop_filter_map(
        "degenerate site set",
        |raw| {
            let dirs: Vec<Vector3<f64>> = raw
                .into_iter()
                .filter_map(|(x, y, z)| Vector3::new(x, y, z).try_normalize(1e-3))
                .collect();
            for (i, a) in dirs.iter().enumerate() {
                for b in &dirs[i + 1..] {
                    if (a - b).norm() < 1e-3 || (a + b).norm() < 1e-3 {
                        return None;
                    }
                }
            }
            (dirs.len() >= 4).then_some(dirs)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_site_has_a_region(dirs in sites_strategy()) {
        let orbit: Vec<_> = dirs.iter().map(|d| d * (R + 550_000.0)).collect();
        let shadows = project_to_sphere(&orbit, R, Vector3::zeros()).unwrap();
        let vor = VoronoiPartition::compute(&shadows, R, Vector3::zeros());
        prop_assume!(vor.is_ok());
        let vor = vor.unwrap();

        prop_assert_eq!(vor.regions().len(), shadows.len());
        prop_assert_eq!(vor.vertices().len(), 2 * shadows.len() - 4);
        for region in vor.regions() {
            prop_assert!(region.len() >= 3);
        }
        let total: f64 = vor.region_areas().iter().sum();
        let sphere = 4.0 * std::f64::consts::PI * R * R;
        prop_assert!((total - sphere).abs() / sphere < 1e-8);
    }

    #[test]
    fn prop_neighbor_graph_symmetric_and_planar(dirs in sites_strategy()) {
        let shadows: Vec<_> = dirs.iter().map(|d| d * R).collect();
        let vor = VoronoiPartition::compute(&shadows, R, Vector3::zeros());
        prop_assume!(vor.is_ok());
        let vor = vor.unwrap();

        let graph = NeighborGraph::from_partition(&vor).unwrap();
        let n = shadows.len();
        prop_assert_eq!(graph.edge_count(), 3 * n - 6);
        prop_assert_eq!(graph.edges(), NeighborGraph::from_partition_pairwise(&vor).unwrap().edges());
        for u in 0..n {
            prop_assert!(!graph.has_edge(u, u));
            for v in graph.neighbors(u) {
                prop_assert!(graph.neighbors(v).contains(&u));
            }
        }
    }

    #[test]
    fn prop_shadows_lie_on_sphere_along_position(
        raw in prop::collection::vec(
            ((-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0), 6_500_000.0f64..45_000_000.0),
            1..40,
        ),
        center in (-1.0e5f64..1.0e5, -1.0e5f64..1.0e5, -1.0e5f64..1.0e5),
    ) {
        let center = Vector3::new(center.0, center.1, center.2);
        let positions: Vec<_> = raw
            .iter()
            .filter_map(|&((x, y, z), r)| Vector3::new(x, y, z).try_normalize(1e-3).map(|d| center + d * r))
            .collect();
        let shadows = project_to_sphere(&positions, R, center).unwrap();

        prop_assert_eq!(shadows.len(), positions.len());
        for (p, s) in positions.iter().zip(&shadows) {
            prop_assert!(((s - center).norm() - R).abs() <= 1e-9 * R);
            let along = (p - center).normalize().dot(&(s - center).normalize());
            prop_assert!((along - 1.0).abs() < 1e-12);
        }
    }
}
