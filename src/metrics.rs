//! Point-in-time measurements over a [`Graph`].
//!
//! Every function here is pure and works on a snapshot. Nothing is updated incrementally: after
//! a mutation the caller measures again. The path based metrics do a BFS from every node and
//! cost O(n·(n+m)) per call.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    graph::{Graph, NodeId},
    paths::compute_path_totals,
};

/// Slack on a bin's lower edge for keys whose logarithm lands a hair below it.
const BIN_TOLERANCE: f64 = 1e-9;

/// Returns a mapping of nodes to their degree.
///
/// # Examples
///
/// ```
/// use fragility::{graph::Graph, metrics};
///
/// let graph = Graph::from_edges([(1, 2), (1, 3)]).unwrap();
/// let degrees = metrics::degree_sequence(&graph);
///
/// assert_eq!(degrees[&1], 2);
/// assert_eq!(degrees[&3], 1);
/// ```
pub fn degree_sequence(graph: &Graph) -> BTreeMap<NodeId, usize> {
    graph.degrees().collect()
}

/// Returns the mean degree, `2m / n`, or 0.0 for an empty graph.
pub fn average_degree(graph: &Graph) -> f64 {
    if graph.is_empty() {
        return 0.0;
    }

    2.0 * graph.edge_count() as f64 / graph.node_count() as f64
}

/// Returns how many nodes have each degree.
pub fn degree_histogram(graph: &Graph) -> BTreeMap<usize, usize> {
    graph.degrees().map(|(_, degree)| degree).counts().into_iter().collect()
}

/// Returns the diameter and average shortest path length of the graph.
///
/// The diameter is the longest finite shortest path. The average sums the distances of every
/// ordered pair of distinct reachable nodes and divides by `n(n-1)`, so unreachable pairs pull
/// the average down rather than being excluded from the denominator. With one node or no
/// reachable pair the average is 0.0.
///
/// # Examples
///
/// ```
/// use fragility::{graph::Graph, metrics};
///
/// let graph = Graph::from_edges([(1, 2), (2, 3)]).unwrap();
/// let (diameter, average) = metrics::diameter_and_average_path_length(&graph, 2);
///
/// assert_eq!(diameter, 2);
/// assert_eq!(average, 8.0 / 6.0);
/// ```
pub fn diameter_and_average_path_length(graph: &Graph, num_threads: usize) -> (usize, f64) {
    let n = graph.node_count();
    let totals = compute_path_totals(graph.dense_index(), num_threads);

    if n <= 1 || totals.reachable_pairs == 0 {
        return (totals.longest, 0.0);
    }

    let ordered_pairs = (n * (n - 1)) as f64;
    (totals.longest, totals.total_length as f64 / ordered_pairs)
}

/// Returns how many unordered pairs of nodes sit at each finite distance.
pub fn distance_distribution(graph: &Graph, num_threads: usize) -> BTreeMap<usize, u64> {
    let totals = compute_path_totals(graph.dense_index(), num_threads);

    totals
        .histogram
        .into_iter()
        .enumerate()
        .skip(1)
        .filter(|(_, count)| *count > 0)
        // Each unordered pair was reached once from either end.
        .map(|(distance, count)| (distance, count / 2))
        .collect()
}

/// Returns the share of nodes that belong to the largest connected component.
///
/// The value is in `[0, 1]` and equals 1.0 exactly when the graph is connected. An empty
/// graph yields 0.0.
///
/// # Examples
///
/// ```
/// use fragility::{graph::Graph, metrics};
///
/// let graph = Graph::from_edges([(1, 2), (2, 3), (4, 5)]).unwrap();
///
/// assert_eq!(metrics::giant_component_fraction(&graph), 0.6);
/// ```
pub fn giant_component_fraction(graph: &Graph) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }

    let largest = graph
        .connected_components()
        .first()
        .map_or(0, |component| component.len());

    largest as f64 / n as f64
}

/// Returns the edge count of the largest component's induced subgraph divided by the node
/// count of the whole graph.
///
/// This is an edges-per-node figure rather than a fraction and can exceed 1.0 on dense
/// graphs. It's kept alongside [`giant_component_fraction`] so historic reports stay
/// comparable. An empty graph yields 0.0.
pub fn giant_component_edge_ratio(graph: &Graph) -> f64 {
    let n = graph.node_count();
    let Some(giant) = graph.giant_component() else {
        return 0.0;
    };

    giant.edge_count() as f64 / n as f64
}

/// Returns the node share of every connected component, largest first.
pub fn component_fractions(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count() as f64;

    graph
        .connected_components()
        .iter()
        .map(|component| component.len() as f64 / n)
        .collect()
}

/// Returns the local clustering coefficient of every node: the share of neighbour pairs that
/// are themselves connected. Nodes with fewer than two neighbours get 0.0.
///
/// # Examples
///
/// ```
/// use fragility::{graph::Graph, metrics};
///
/// let graph = Graph::from_edges([(1, 2), (2, 3), (3, 1), (3, 4)]).unwrap();
/// let clustering = metrics::clustering_coefficients(&graph);
///
/// assert_eq!(clustering[&1], 1.0);
/// assert_eq!(clustering[&3], 1.0 / 3.0);
/// assert_eq!(clustering[&4], 0.0);
/// ```
pub fn clustering_coefficients(graph: &Graph) -> BTreeMap<NodeId, f64> {
    graph
        .nodes()
        .map(|node| (node, local_clustering(graph, node)))
        .collect()
}

/// Returns the mean local clustering coefficient, or 0.0 for an empty graph.
pub fn average_clustering(graph: &Graph) -> f64 {
    if graph.is_empty() {
        return 0.0;
    }

    let coefficients = clustering_coefficients(graph);
    coefficients.values().sum::<f64>() / coefficients.len() as f64
}

/// Groups a heavy-tailed histogram into logarithmically spaced bins and returns the
/// `(mean key, mean value)` of every non-empty bin.
///
/// Bin edges run from the smallest positive key to the larger of the largest key and the
/// largest value, like the log-log degree plots this feeds. Keys of zero are ignored.
pub fn log_binning(histogram: &BTreeMap<usize, usize>, bin_count: usize) -> Vec<(f64, f64)> {
    let positive: Vec<(f64, f64)> = histogram
        .iter()
        .filter(|(key, _)| **key > 0)
        .map(|(key, value)| (*key as f64, *value as f64))
        .collect();

    if positive.is_empty() || bin_count < 2 {
        return Vec::new();
    }

    let min_exponent = positive
        .iter()
        .map(|(key, _)| key.log10())
        .fold(f64::INFINITY, f64::min);
    let max_exponent = positive
        .iter()
        .flat_map(|(key, value)| [key.log10(), value.max(1.0).log10()])
        .fold(f64::NEG_INFINITY, f64::max);

    // Assigned by exponent: `10^min_exponent` may round above the smallest key.
    let step = (max_exponent - min_exponent) / (bin_count - 1) as f64;
    let last = bin_count - 2;

    // Per bin: (sum of weighted keys, sum of values, number of keys).
    let mut bins = vec![(0.0, 0.0, 0usize); bin_count - 1];
    for (key, value) in positive {
        let bin = if step > 0.0 {
            let offset = (key.log10() - min_exponent) / step + BIN_TOLERANCE;
            (offset.floor().max(0.0) as usize).min(last)
        } else {
            0
        };

        bins[bin].0 += key;
        bins[bin].1 += value;
        bins[bin].2 += 1;
    }

    bins.into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(keys, values, count)| (keys / count as f64, values / count as f64))
        .collect()
}

//
// Helpers
//

fn local_clustering(graph: &Graph, node: NodeId) -> f64 {
    let Ok(neighbours) = graph.neighbors(node) else {
        return 0.0;
    };

    let k = neighbours.len();
    if k < 2 {
        return 0.0;
    }

    let closed = neighbours
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| graph.neighbors(**a).map_or(false, |adjacent| adjacent.contains(*b)))
        .count();

    let possible = k * (k - 1) / 2;
    closed as f64 / possible as f64
}
