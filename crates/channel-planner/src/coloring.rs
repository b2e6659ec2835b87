//! Bounded graph coloring
//!
//! The default colorer escalates through three stages:
//!
//! 1. Greedy DSATUR (accepted when it fits in `k` colors)
//! 2. Exact DSATUR backtracking under a step budget
//! 3. Seeded TabuCol local search when the budget runs out
//!
//! Stage 2 finishing without a coloring is a proof that `k` colors are not
//! enough, so stage 3 only runs when the exact search was cut short.

use crate::tabu::tabucol;
use coverage_graph::NeighborGraph;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Produces a proper coloring with colors in `0..k`, or `None`.
pub trait NodeColorer {
    fn color(&self, graph: &NeighborGraph, k: usize) -> Option<Vec<usize>>;
}

/// Search limits for [`DsaturColorer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoringConfig {
    /// Seed for the local search stage
    pub seed: u64,
    /// Color trials allowed in the exact search
    pub exact_step_limit: usize,
    /// TabuCol iterations
    pub tabu_iterations: usize,
}

impl Default for ColoringConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            exact_step_limit: 200_000,
            tabu_iterations: 50_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DsaturColorer {
    pub config: ColoringConfig,
}

impl DsaturColorer {
    pub fn new(config: ColoringConfig) -> Self {
        Self { config }
    }
}

impl NodeColorer for DsaturColorer {
    fn color(&self, graph: &NeighborGraph, k: usize) -> Option<Vec<usize>> {
        let adj = graph.adjacency_lists();
        if adj.is_empty() {
            return Some(Vec::new());
        }
        if k == 0 {
            return None;
        }

        let greedy = greedy_dsatur(&adj);
        let used = color_count(&greedy);
        if used <= k {
            debug!("Greedy DSATUR colored {} nodes with {} colors", adj.len(), used);
            return Some(greedy);
        }

        match exact_dsatur(&adj, k, self.config.exact_step_limit) {
            ExactOutcome::Found(colors) => {
                debug!("Exact DSATUR found a {}-coloring", k);
                Some(colors)
            }
            ExactOutcome::Infeasible => {
                debug!("Exact DSATUR proved {} colors insufficient", k);
                None
            }
            ExactOutcome::BudgetExhausted => {
                warn!(
                    "Exact search exhausted {} steps at k={}, falling back to tabu search",
                    self.config.exact_step_limit, k
                );
                let mut rng = ChaChaRng::seed_from_u64(self.config.seed);
                tabucol(&adj, k, self.config.tabu_iterations, &greedy, &mut rng)
            }
        }
    }
}

/// Number of distinct colors in a coloring that uses `0..m` contiguously.
pub fn color_count(colors: &[usize]) -> usize {
    colors.iter().max().map_or(0, |&m| m + 1)
}

/// True when every color is below `k` and no edge joins equal colors.
pub fn is_proper(adj: &[Vec<usize>], colors: &[usize], k: usize) -> bool {
    colors.len() == adj.len()
        && colors.iter().all(|&c| c < k)
        && adj
            .iter()
            .enumerate()
            .all(|(u, ns)| ns.iter().all(|&v| colors[u] != colors[v]))
}

/// Most saturated uncolored node; ties go to the higher degree, then the
/// lower index.
fn pick_node(adj: &[Vec<usize>], colored: &[bool], saturation: &[usize]) -> Option<usize> {
    (0..adj.len())
        .filter(|&v| !colored[v])
        .max_by(|&a, &b| {
            saturation[a]
                .cmp(&saturation[b])
                .then(adj[a].len().cmp(&adj[b].len()))
                .then(b.cmp(&a))
        })
}

pub fn greedy_dsatur(adj: &[Vec<usize>]) -> Vec<usize> {
    let n = adj.len();
    let mut colors = vec![0usize; n];
    let mut colored = vec![false; n];
    let mut seen: Vec<Vec<bool>> = vec![Vec::new(); n];
    let mut saturation = vec![0usize; n];

    while let Some(v) = pick_node(adj, &colored, &saturation) {
        let c = (0..).find(|&c| !seen[v].get(c).copied().unwrap_or(false)).unwrap_or(0);
        colors[v] = c;
        colored[v] = true;
        for &u in &adj[v] {
            if seen[u].len() <= c {
                seen[u].resize(c + 1, false);
            }
            if !seen[u][c] {
                seen[u][c] = true;
                saturation[u] += 1;
            }
        }
    }

    colors
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExactOutcome {
    Found(Vec<usize>),
    Infeasible,
    BudgetExhausted,
}

enum Search {
    Found,
    Infeasible,
    Exhausted,
}

struct ExactSearch<'a> {
    adj: &'a [Vec<usize>],
    k: usize,
    colors: Vec<usize>,
    colored: Vec<bool>,
    /// counts[v][c]: colored neighbors of v holding color c
    counts: Vec<Vec<u32>>,
    saturation: Vec<usize>,
    steps: usize,
    limit: usize,
}

impl ExactSearch<'_> {
    fn assign(&mut self, v: usize, c: usize) {
        let adj = self.adj;
        self.colors[v] = c;
        self.colored[v] = true;
        for &u in &adj[v] {
            if self.counts[u][c] == 0 {
                self.saturation[u] += 1;
            }
            self.counts[u][c] += 1;
        }
    }

    fn unassign(&mut self, v: usize, c: usize) {
        let adj = self.adj;
        self.colored[v] = false;
        for &u in &adj[v] {
            self.counts[u][c] -= 1;
            if self.counts[u][c] == 0 {
                self.saturation[u] -= 1;
            }
        }
    }

    fn search(&mut self, remaining: usize, used: usize) -> Search {
        if remaining == 0 {
            return Search::Found;
        }
        let Some(v) = pick_node(self.adj, &self.colored, &self.saturation) else {
            return Search::Found;
        };

        // Colors above `used` are interchangeable, so only one new color is tried
        for c in 0..(used + 1).min(self.k) {
            if self.counts[v][c] > 0 {
                continue;
            }
            self.steps += 1;
            if self.steps > self.limit {
                return Search::Exhausted;
            }
            self.assign(v, c);
            match self.search(remaining - 1, used.max(c + 1)) {
                Search::Found => return Search::Found,
                Search::Exhausted => return Search::Exhausted,
                Search::Infeasible => self.unassign(v, c),
            }
        }
        Search::Infeasible
    }
}

/// Backtracking DSATUR limited to `step_limit` color trials.
pub fn exact_dsatur(adj: &[Vec<usize>], k: usize, step_limit: usize) -> ExactOutcome {
    let n = adj.len();
    if n == 0 {
        return ExactOutcome::Found(Vec::new());
    }
    if k == 0 {
        return ExactOutcome::Infeasible;
    }

    let mut search = ExactSearch {
        adj,
        k,
        colors: vec![0; n],
        colored: vec![false; n],
        counts: vec![vec![0; k]; n],
        saturation: vec![0; n],
        steps: 0,
        limit: step_limit,
    };

    match search.search(n, 0) {
        Search::Found => ExactOutcome::Found(search.colors),
        Search::Infeasible => ExactOutcome::Infeasible,
        Search::Exhausted => ExactOutcome::BudgetExhausted,
    }
}
