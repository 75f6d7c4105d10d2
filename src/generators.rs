//! Random graph models used as synthetic inputs.
//!
//! Nodes are numbered `0..n`. Both models are driven entirely by the caller's rng, so a seeded
//! rng reproduces the same graph.

use std::collections::BTreeSet;

use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::{
    edge::Edge,
    error::SimulationError,
    graph::{Graph, NodeId},
};

/// Builds a Barabási–Albert preferential attachment graph on nodes `0..n`.
///
/// Nodes `0..m` start out unconnected and become the targets of node `m`. Every later node
/// attaches `m` edges to distinct existing nodes, each picked with probability proportional to
/// its current degree. The result has exactly `n` nodes and `m * (n - m)` edges.
///
/// # Errors
///
/// Returns [`SimulationError::InvalidParameter`] unless `1 <= m < n`.
///
/// # Examples
///
/// ```
/// use rand::{rngs::SmallRng, SeedableRng};
/// use fragility::generators;
///
/// let graph = generators::barabasi_albert(100, 2, &mut SmallRng::seed_from_u64(1)).unwrap();
///
/// assert_eq!(graph.node_count(), 100);
/// assert_eq!(graph.edge_count(), 196);
/// ```
pub fn barabasi_albert<R: Rng + ?Sized>(
    n: usize,
    m: usize,
    rng: &mut R,
) -> Result<Graph, SimulationError> {
    if m < 1 || m >= n {
        return Err(SimulationError::invalid(
            "m",
            format!("must satisfy 1 <= m < n, got m = {m}, n = {n}"),
        ));
    }

    let mut graph = Graph::new();
    let mut targets: BTreeSet<NodeId> = (0..m as NodeId).collect();
    // Every node appears once per incident edge, so a uniform pick from this list is a
    // degree-proportional pick.
    let mut repeated: Vec<NodeId> = Vec::with_capacity(2 * m * (n - m));

    for source in m as NodeId..n as NodeId {
        for target in &targets {
            graph.insert(Edge::new(source, *target));
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat(source).take(m));

        targets = random_subset(&repeated, m, rng);
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "generated preferential attachment graph"
    );

    Ok(graph)
}

/// Default link probability of the extended model, as fitted to the membership graph.
pub const EXTENDED_LINK_PROBABILITY: f64 = 0.837;
/// Default rewiring probability of the extended model.
pub const EXTENDED_REWIRE_PROBABILITY: f64 = 0.002;

/// Builds a graph with the extended Barabási–Albert model of Albert and Barabási (2000).
///
/// Starting from `m` isolated nodes, every round draws one of three moves:
///
/// - with probability `p`, `m` new links between existing nodes, each from a uniformly chosen
///   node that isn't linked to everything yet to a degree-proportional target;
/// - with probability `q`, `m` links are rewired: a uniformly chosen node drops one of its
///   edges and reattaches it to a degree-proportional target;
/// - otherwise a new node arrives with `m` degree-proportional links.
///
/// Link moves are skipped while the graph is too close to complete to take `m` more edges,
/// and rewiring while it has fewer than `m` edges or is complete. The result always has `n`
/// nodes and at least `m * (n - m)` edges; with `p = q = 0` it is the plain model.
///
/// # Errors
///
/// Returns [`SimulationError::InvalidParameter`] unless `1 <= m < n`, `p` and `q` are in
/// `[0, 1)` and `p + q < 1`.
///
/// # Examples
///
/// ```
/// use rand::{rngs::SmallRng, SeedableRng};
/// use fragility::generators;
///
/// let mut rng = SmallRng::seed_from_u64(4);
/// let graph = generators::extended_barabasi_albert(200, 1, 0.5, 0.1, &mut rng).unwrap();
///
/// assert_eq!(graph.node_count(), 200);
/// assert!(graph.edge_count() >= 199);
/// ```
pub fn extended_barabasi_albert<R: Rng + ?Sized>(
    n: usize,
    m: usize,
    p: f64,
    q: f64,
    rng: &mut R,
) -> Result<Graph, SimulationError> {
    if m < 1 || m >= n {
        return Err(SimulationError::invalid(
            "m",
            format!("must satisfy 1 <= m < n, got m = {m}, n = {n}"),
        ));
    }
    if !(0.0..1.0).contains(&p) {
        return Err(SimulationError::invalid("p", format!("must be in [0, 1), got {p}")));
    }
    if !(0.0..1.0).contains(&q) {
        return Err(SimulationError::invalid("q", format!("must be in [0, 1), got {q}")));
    }
    if p + q >= 1.0 {
        return Err(SimulationError::invalid(
            "q",
            format!("p + q must be below 1, got {}", p + q),
        ));
    }

    let mut graph = Graph::new();
    for node in 0..m as NodeId {
        graph.insert_node(node);
    }
    // Degree-proportional pool, as in `barabasi_albert`, plus one extra entry per node so
    // isolated nodes stay reachable.
    let mut pool: Vec<NodeId> = (0..m as NodeId).collect();
    let (mut links, mut rewires) = (0usize, 0usize);

    let mut next = m as NodeId;
    while graph.node_count() < n {
        let nodes = graph.node_count();
        let full_degree = nodes - 1;
        let complete = nodes * full_degree / 2;
        let edges = graph.edge_count();
        let draw: f64 = rng.gen();

        if draw < p && edges + m <= complete {
            add_links(&mut graph, &mut pool, m, full_degree, rng);
            links += 1;
        } else if (p..p + q).contains(&draw) && m <= edges && edges < complete {
            rewire_links(&mut graph, &mut pool, m, full_degree, rng)?;
            rewires += 1;
        } else {
            let targets = random_subset(&pool, m, rng);
            for target in &targets {
                graph.insert(Edge::new(next, *target));
            }
            pool.extend(targets);
            pool.extend(std::iter::repeat(next).take(m + 1));
            next += 1;
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        links,
        rewires,
        "generated extended preferential attachment graph"
    );

    Ok(graph)
}

//
// Helpers
//

/// Adds up to `count` edges between existing nodes.
fn add_links<R: Rng + ?Sized>(
    graph: &mut Graph,
    pool: &mut Vec<NodeId>,
    count: usize,
    full_degree: usize,
    rng: &mut R,
) {
    let mut sources: Vec<NodeId> = graph
        .degrees()
        .filter(|(_, degree)| *degree < full_degree)
        .map(|(node, _)| node)
        .collect();

    for _ in 0..count {
        let Some(&source) = sources.choose(rng) else {
            return;
        };
        let targets: Vec<NodeId> = pool
            .iter()
            .copied()
            .filter(|node| *node != source && !graph.contains_edge(&Edge::new(source, *node)))
            .collect();
        let Some(&target) = targets.choose(rng) else {
            return;
        };

        graph.insert(Edge::new(source, target));
        pool.push(source);
        pool.push(target);
        sources.retain(|node| graph.degree(*node).map_or(false, |degree| degree < full_degree));
    }
}

/// Moves up to `count` edges to new, degree-proportional endpoints.
fn rewire_links<R: Rng + ?Sized>(
    graph: &mut Graph,
    pool: &mut Vec<NodeId>,
    count: usize,
    full_degree: usize,
    rng: &mut R,
) -> Result<(), SimulationError> {
    let mut candidates: Vec<NodeId> = graph
        .nodes()
        .filter(|node| is_rewirable(graph, *node, full_degree))
        .collect();

    for _ in 0..count {
        let Some(&node) = candidates.choose(rng) else {
            return Ok(());
        };
        let neighbours: Vec<NodeId> = graph.neighbors(node)?.iter().copied().collect();
        let Some(&dropped) = neighbours.choose(rng) else {
            return Ok(());
        };
        let targets: Vec<NodeId> = pool
            .iter()
            .copied()
            .filter(|target| *target != node && !neighbours.contains(target))
            .collect();
        let Some(&target) = targets.choose(rng) else {
            return Ok(());
        };

        graph.remove_edge(&Edge::new(node, dropped));
        graph.insert(Edge::new(node, target));
        if let Some(position) = pool.iter().position(|entry| *entry == dropped) {
            pool.remove(position);
        }
        pool.push(target);

        candidates.retain(|candidate| is_rewirable(graph, *candidate, full_degree));
        if is_rewirable(graph, target, full_degree) && !candidates.contains(&target) {
            candidates.push(target);
        }
    }

    Ok(())
}

/// A node with at least one edge that isn't yet linked to every other node.
fn is_rewirable(graph: &Graph, node: NodeId, full_degree: usize) -> bool {
    graph
        .degree(node)
        .map_or(false, |degree| degree > 0 && degree < full_degree)
}

/// Draws from `pool` until `count` distinct values have been seen.
fn random_subset<R: Rng + ?Sized>(pool: &[NodeId], count: usize, rng: &mut R) -> BTreeSet<NodeId> {
    let mut subset = BTreeSet::new();
    while subset.len() < count {
        match pool.choose(rng) {
            Some(node) => {
                subset.insert(*node);
            }
            None => break,
        }
    }
    subset
}
