//! Cell adjacency graph
//!
//! Two coverage cells are neighbors when they share a Voronoi edge, i.e.
//! exactly two Voronoi vertices at distinct positions. Node `i` of the graph
//! is satellite `i`.

use crate::voronoi::VoronoiPartition;
use crate::{GeometryError, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Shared borders shorter than this fraction of the radius are point contacts.
pub const MIN_BORDER_LENGTH: f64 = 1e-9;

/// Undirected simple graph over cell indices.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    graph: UnGraph<usize, ()>,
}

impl NeighborGraph {
    /// Graph with `node_count` nodes and the given undirected edges.
    ///
    /// Duplicate edges (in either direction) collapse into one; self-loops and
    /// out-of-range endpoints are rejected.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(node_count, edges.len());
        for i in 0..node_count {
            graph.add_node(i);
        }

        let mut unique = BTreeSet::new();
        for &(u, v) in edges {
            if u == v || u >= node_count || v >= node_count {
                return Err(GeometryError::InvalidEdge(u, v));
            }
            unique.insert((u.min(v), u.max(v)));
        }
        for (u, v) in unique {
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }

        Ok(Self { graph })
    }

    /// Adjacency of a Voronoi partition through an inverted vertex index.
    ///
    /// Each Voronoi vertex lists the regions touching it; every pair of those
    /// regions gets one shared-vertex count. Pairs with exactly two shared
    /// vertices are neighbors, any other nonzero count means the partition is
    /// inconsistent.
    ///
    /// Four or more cocircular sites give coplanar hull faces whose Voronoi
    /// vertices coincide. Cells meeting only at such a point share a
    /// zero-length border and are not neighbors.
    pub fn from_partition(partition: &VoronoiPartition) -> Result<Self> {
        let mut touching: Vec<Vec<usize>> = vec![Vec::new(); partition.vertices().len()];
        for (region, vertices) in partition.regions().iter().enumerate() {
            for &v in vertices {
                touching[v].push(region);
            }
        }

        let mut shared: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (vertex, regions) in touching.iter().enumerate() {
            for (k, &a) in regions.iter().enumerate() {
                for &b in &regions[k + 1..] {
                    shared.entry((a.min(b), a.max(b))).or_default().push(vertex);
                }
            }
        }

        let mut edges = Vec::with_capacity(shared.len());
        for (&(first, second), vertices) in &shared {
            let &[p, q] = vertices.as_slice() else {
                return Err(GeometryError::InconsistentAdjacency {
                    first,
                    second,
                    shared: vertices.len(),
                });
            };
            if has_border(partition, p, q) {
                edges.push((first, second));
            }
        }

        let graph = Self::from_edges(partition.len(), &edges)?;
        debug!(
            "Neighbor graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Same graph as [`NeighborGraph::from_partition`], built by comparing
    /// every pair of regions. Quadratic; kept as a reference builder.
    pub fn from_partition_pairwise(partition: &VoronoiPartition) -> Result<Self> {
        let sets: Vec<BTreeSet<usize>> = partition
            .regions()
            .iter()
            .map(|r| r.iter().copied().collect())
            .collect();

        let mut edges = Vec::new();
        for first in 0..sets.len() {
            for second in (first + 1)..sets.len() {
                let common: Vec<usize> =
                    sets[first].intersection(&sets[second]).copied().collect();
                match common.as_slice() {
                    [] => {}
                    &[p, q] => {
                        if has_border(partition, p, q) {
                            edges.push((first, second));
                        }
                    }
                    shared => {
                        return Err(GeometryError::InconsistentAdjacency {
                            first,
                            second,
                            shared: shared.len(),
                        })
                    }
                }
            }
        }

        Self::from_edges(partition.len(), &edges)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        u < self.node_count()
            && v < self.node_count()
            && self.graph.contains_edge(NodeIndex::new(u), NodeIndex::new(v))
    }

    /// Sorted neighbors of `node` (empty when out of range).
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        if node >= self.node_count() {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(node))
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn degree(&self, node: usize) -> usize {
        if node >= self.node_count() {
            return 0;
        }
        self.graph.neighbors(NodeIndex::new(node)).count()
    }

    pub fn max_degree(&self) -> usize {
        (0..self.node_count()).map(|n| self.degree(n)).max().unwrap_or(0)
    }

    /// All edges as `(u, v)` with `u < v`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn adjacency_lists(&self) -> Vec<Vec<usize>> {
        (0..self.node_count()).map(|n| self.neighbors(n)).collect()
    }

    pub fn inner(&self) -> &UnGraph<usize, ()> {
        &self.graph
    }
}

/// Voronoi vertices `p` and `q` bound a border of nonzero length.
fn has_border(partition: &VoronoiPartition, p: usize, q: usize) -> bool {
    let vertices = partition.vertices();
    (vertices[p] - vertices[q]).norm() > MIN_BORDER_LENGTH * partition.radius()
}
