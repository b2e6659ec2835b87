//! TabuCol local search for k-coloring
//!
//! Moves recolor one conflicting node at a time. Undoing a move is tabu for
//! `0.6 * conflicts + rand(0..10)` iterations unless it beats the best
//! conflict count seen so far.

use rand::Rng;
use tracing::debug;

/// Searches for a conflict-free coloring with `k` colors starting from
/// `initial`. Colors of `initial` outside `0..k` are redrawn at random.
pub fn tabucol<R: Rng>(
    adj: &[Vec<usize>],
    k: usize,
    iterations: usize,
    initial: &[usize],
    rng: &mut R,
) -> Option<Vec<usize>> {
    let n = adj.len();
    if k == 0 || initial.len() != n {
        return None;
    }

    let mut colors: Vec<usize> = initial
        .iter()
        .map(|&c| if c < k { c } else { rng.gen_range(0..k) })
        .collect();

    // gamma[v][c]: neighbors of v holding color c
    let mut gamma = vec![vec![0i64; k]; n];
    for (v, ns) in adj.iter().enumerate() {
        for &u in ns {
            gamma[v][colors[u]] += 1;
        }
    }
    let mut conflicts: i64 = (0..n).map(|v| gamma[v][colors[v]]).sum::<i64>() / 2;
    let mut best_conflicts = conflicts;
    let mut tabu = vec![vec![0usize; k]; n];

    for iter in 0..iterations {
        if conflicts == 0 {
            debug!("TabuCol found a {}-coloring after {} iterations", k, iter);
            return Some(colors);
        }

        let mut best_move = None;
        let mut best_delta = i64::MAX;
        let mut ties = 0u32;

        for v in (0..n).filter(|&v| gamma[v][colors[v]] > 0) {
            let current = gamma[v][colors[v]];
            for c in (0..k).filter(|&c| c != colors[v]) {
                let delta = gamma[v][c] - current;
                let aspiration = conflicts + delta < best_conflicts;
                if tabu[v][c] > iter && !aspiration {
                    continue;
                }
                if delta < best_delta {
                    best_delta = delta;
                    best_move = Some((v, c));
                    ties = 1;
                } else if delta == best_delta {
                    ties += 1;
                    if rng.gen_range(0..ties) == 0 {
                        best_move = Some((v, c));
                    }
                }
            }
        }

        let Some((v, c)) = best_move else {
            continue;
        };

        let old = colors[v];
        colors[v] = c;
        for &u in &adj[v] {
            gamma[u][old] -= 1;
            gamma[u][c] += 1;
        }
        conflicts += best_delta;
        best_conflicts = best_conflicts.min(conflicts);

        let tenure = (0.6 * conflicts as f64) as usize + rng.gen_range(0..10);
        tabu[v][old] = iter + tenure + 1;
    }

    if conflicts == 0 {
        Some(colors)
    } else {
        debug!(
            "TabuCol stopped with {} conflicts after {} iterations",
            conflicts, iterations
        );
        None
    }
}
