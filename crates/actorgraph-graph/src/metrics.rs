// ABOUTME: Pure topology metrics over node/edge lists: PageRank, k-core, entropy, Gini, brokerage
// ABOUTME: Degenerate inputs return sentinel values instead of panicking or erroring

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub const PAGERANK_DAMPING: f64 = 0.85;
pub const PAGERANK_ITERATIONS: usize = 25;

/// Weighted PageRank over a directed edge list. Ranks start uniform at
/// `1/n`; each iteration every node receives `(1 - d)/n` plus the damped
/// share of its incoming neighbors' rank, proportional to edge weight over
/// the source's total out-weight (denominator 1 when that is zero).
pub fn weighted_pagerank(
    nodes: &[&str],
    edges: &[(&str, &str, f64)],
    damping: f64,
    iterations: usize,
) -> FxHashMap<String, f64> {
    let n = nodes.len();
    let mut scores = FxHashMap::default();
    if n == 0 {
        return scores;
    }

    let index: FxHashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut out_weight = vec![0.0f64; n];
    let mut incoming: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (from, to, weight) in edges {
        let (fi, ti) = match (index.get(from), index.get(to)) {
            (Some(&f), Some(&t)) => (f, t),
            _ => continue,
        };
        if !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        out_weight[fi] += weight;
        incoming[ti].push((fi, *weight));
    }

    let mut rank = vec![1.0 / n as f64; n];
    let base = (1.0 - damping) / n as f64;
    for _ in 0..iterations {
        let mut next = vec![base; n];
        for (ti, sources) in incoming.iter().enumerate() {
            let mut acc = 0.0;
            for &(fi, weight) in sources {
                let denom = if out_weight[fi] > 0.0 {
                    out_weight[fi]
                } else {
                    1.0
                };
                acc += rank[fi] * weight / denom;
            }
            next[ti] += damping * acc;
        }
        rank = next;
    }

    for (i, id) in nodes.iter().enumerate() {
        scores.insert((*id).to_string(), rank[i]);
    }
    scores
}

/// Iterative peeling k-core decomposition of an undirected graph.
/// Starting at candidate k = 1, nodes whose remaining degree falls below k
/// are stripped with core number k - 1 (cascading within the same k); k
/// increases only when nothing can be peeled. Anything left when k passes
/// the maximum possible degree gets the maximum observed core.
pub fn k_core_decomposition(
    nodes: &[&str],
    edges: &[(&str, &str)],
) -> FxHashMap<String, usize> {
    let n = nodes.len();
    let mut cores = FxHashMap::default();
    if n == 0 {
        return cores;
    }

    let index: FxHashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut neighbors: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); n];
    for (a, b) in edges {
        let (ai, bi) = match (index.get(a), index.get(b)) {
            (Some(&a), Some(&b)) => (a, b),
            _ => continue,
        };
        if ai == bi {
            continue;
        }
        neighbors[ai].insert(bi);
        neighbors[bi].insert(ai);
    }

    let mut degree: Vec<usize> = neighbors.iter().map(|set| set.len()).collect();
    let mut remaining: FxHashSet<usize> = (0..n).collect();
    let mut core = vec![0usize; n];
    let mut max_core = 0usize;
    let mut k = 1usize;
    while !remaining.is_empty() && k <= n {
        let peel: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| degree[i] < k)
            .collect();
        if peel.is_empty() {
            k += 1;
            continue;
        }
        for i in peel {
            if !remaining.remove(&i) {
                continue;
            }
            core[i] = k - 1;
            max_core = max_core.max(k - 1);
            for &nb in &neighbors[i] {
                if remaining.contains(&nb) && degree[nb] > 0 {
                    degree[nb] -= 1;
                }
            }
        }
    }
    for &i in &remaining {
        core[i] = max_core;
    }

    for (i, id) in nodes.iter().enumerate() {
        cores.insert((*id).to_string(), core[i]);
    }
    cores
}

/// Shannon entropy of a distribution, normalized by `ln(n)` to [0, 1].
/// Returns 0 for degenerate input: fewer than two elements or a
/// non-positive sum.
pub fn shannon_entropy(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f64 = values
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .sum();
    if total <= 0.0 {
        return 0.0;
    }
    let h: f64 = values
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .map(|v| {
            let p = v / total;
            -p * p.ln()
        })
        .sum();
    let norm = (values.len() as f64).ln();
    if norm <= 0.0 {
        0.0
    } else {
        (h / norm).clamp(0.0, 1.0)
    }
}

/// Gini coefficient via the sorted cumulative formulation, clamped to
/// [0, 1]. Returns 0 for degenerate input (fewer than two elements or a
/// non-positive sum); non-finite and negative entries count as 0.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { *v } else { 0.0 })
        .collect();
    let n = sorted.len();
    let total: f64 = sorted.iter().sum();
    if n < 2 || total <= 0.0 {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut ranked = 0.0;
    for (i, value) in sorted.iter().enumerate() {
        ranked += (i as f64 + 1.0) * value;
    }
    let n = n as f64;
    let gini = (2.0 * ranked) / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
struct PathNode {
    id: usize,
    distance: f64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.distance.partial_cmp(&other.distance) == Some(Ordering::Equal)
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reverse ordering for min-heap
        other.distance.partial_cmp(&self.distance)
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Betweenness-style brokerage over weighted shortest paths. Edge cost is
/// the inverse weight, so stronger edges are preferred; non-positive
/// weights are skipped. Scores are normalized by the maximum to [0, 1].
/// Shares the node/edge contract of [`weighted_pagerank`].
pub fn brokerage_scores(
    nodes: &[&str],
    edges: &[(&str, &str, f64)],
) -> FxHashMap<String, f64> {
    const EPS: f64 = 1e-12;

    let n = nodes.len();
    let mut scores = FxHashMap::default();
    if n == 0 {
        return scores;
    }

    let index: FxHashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (from, to, weight) in edges {
        let (fi, ti) = match (index.get(from), index.get(to)) {
            (Some(&f), Some(&t)) => (f, t),
            _ => continue,
        };
        if fi == ti || !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        adjacency[fi].push((ti, 1.0 / weight));
    }

    let mut centrality = vec![0.0f64; n];
    for s in 0..n {
        let mut dist = vec![f64::INFINITY; n];
        let mut sigma = vec![0.0f64; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut settled = vec![false; n];
        let mut order: Vec<usize> = Vec::new();
        let mut heap = BinaryHeap::new();

        dist[s] = 0.0;
        sigma[s] = 1.0;
        heap.push(PathNode {
            id: s,
            distance: 0.0,
        });

        while let Some(PathNode { id: v, distance }) = heap.pop() {
            if settled[v] || distance > dist[v] + EPS {
                continue;
            }
            settled[v] = true;
            order.push(v);
            for &(w, cost) in &adjacency[v] {
                let candidate = dist[v] + cost;
                if candidate + EPS < dist[w] {
                    dist[w] = candidate;
                    sigma[w] = sigma[v];
                    preds[w].clear();
                    preds[w].push(v);
                    heap.push(PathNode {
                        id: w,
                        distance: candidate,
                    });
                } else if (candidate - dist[w]).abs() <= EPS && !settled[w] {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        for &w in order.iter().rev() {
            for &v in &preds[w] {
                if sigma[w] > 0.0 {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    let max = centrality.iter().copied().fold(0.0f64, f64::max);
    for (i, id) in nodes.iter().enumerate() {
        let value = if max > 0.0 { centrality[i] / max } else { 0.0 };
        scores.insert((*id).to_string(), value);
    }
    scores
}
