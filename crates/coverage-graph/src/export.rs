//! Graph export formats for visualization
//!
//! Supports:
//! - GeoJSON coverage cells (one Polygon per satellite)
//! - Cytoscape.js neighbor graph

use crate::neighbors::NeighborGraph;
use crate::voronoi::VoronoiPartition;
use nalgebra::Vector3;
use orbital_mechanics::transforms::to_geocentric;
use serde::{Deserialize, Serialize};

const PALETTE: [&str; 8] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#06b6d4", "#3b82f6", "#8b5cf6", "#ec4899",
];

/// Channel index to color
pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Cytoscape.js element format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CytoscapeElement {
    pub data: CytoscapeData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<CytoscapePosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CytoscapeData {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CytoscapePosition {
    pub x: f64,
    pub y: f64,
}

fn node_id(site: usize) -> String {
    format!("SAT-{}", site)
}

/// Longitude/latitude of a point relative to the sphere center.
fn lon_lat(point: &Vector3<f64>, center: &Vector3<f64>) -> (f64, f64) {
    let geo = to_geocentric(&(point - center));
    (geo.longitude, geo.latitude)
}

/// Export the neighbor graph to Cytoscape.js format.
///
/// Nodes sit at their shadow point on a plate carree layout; `colors`, when
/// given, carries one channel index per node.
pub fn to_cytoscape(
    graph: &NeighborGraph,
    partition: &VoronoiPartition,
    colors: Option<&[usize]>,
) -> Vec<CytoscapeElement> {
    let center = partition.center();
    let mut elements = Vec::with_capacity(graph.node_count() + graph.edge_count());

    for (site, point) in partition.sites().iter().enumerate() {
        let (lon, lat) = lon_lat(point, &center);
        let channel = colors.and_then(|c| c.get(site).copied());
        elements.push(CytoscapeElement {
            data: CytoscapeData {
                id: node_id(site),
                label: Some(format!("Satellite {}", site)),
                source: None,
                target: None,
                color: channel.map(|c| color_for(c).to_string()),
                channel,
                degree: Some(graph.degree(site)),
            },
            position: Some(CytoscapePosition {
                x: (lon + 180.0) * 3.0,
                y: (90.0 - lat) * 3.0,
            }),
            classes: Some("satellite".to_string()),
        });
    }

    for (u, v) in graph.edges() {
        elements.push(CytoscapeElement {
            data: CytoscapeData {
                id: format!("{}-{}", node_id(u), node_id(v)),
                label: None,
                source: Some(node_id(u)),
                target: Some(node_id(v)),
                color: None,
                channel: None,
                degree: None,
            },
            position: None,
            classes: Some("neighbor".to_string()),
        });
    }

    elements
}

pub fn to_cytoscape_json(
    graph: &NeighborGraph,
    partition: &VoronoiPartition,
    colors: Option<&[usize]>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_cytoscape(graph, partition, colors))
}

/// Export coverage cells to a GeoJSON FeatureCollection.
///
/// Rings are closed and use the vertex order of the region. Cells crossing
/// the antimeridian are not split.
pub fn to_geojson(
    partition: &VoronoiPartition,
    colors: Option<&[usize]>,
    channels: Option<&[f64]>,
) -> serde_json::Value {
    let center = partition.center();
    let areas = partition.region_areas();

    let features: Vec<serde_json::Value> = partition
        .regions()
        .iter()
        .enumerate()
        .map(|(site, region)| {
            let mut ring: Vec<[f64; 2]> = region
                .iter()
                .map(|&v| {
                    let (lon, lat) = lon_lat(&partition.vertices()[v], &center);
                    [lon, lat]
                })
                .collect();
            if let Some(&first) = ring.first() {
                ring.push(first);
            }
            let (lon, lat) = lon_lat(&partition.sites()[site], &center);
            let color = colors.and_then(|c| c.get(site).copied());

            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                },
                "properties": {
                    "satellite": site,
                    "shadow": [lon, lat],
                    "area_km2": areas[site] / 1.0e6,
                    "color_index": color,
                    "fill": color.map(color_for),
                    "channel": channels.and_then(|c| c.get(site).copied())
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features
    })
}
