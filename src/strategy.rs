//! Node selection policies for the robustness simulator.
//!
//! A strategy only picks the next node to remove; the simulator does the removal. Policies keep
//! no state between calls apart from their random source.

use rand::{seq::IteratorRandom, Rng};

use crate::{
    betweenness::compute_betweenness,
    error::GraphError,
    graph::{default_num_threads, Graph, NodeId},
};

/// Picks the next node to remove from a graph.
pub trait Strategy {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Selects a node of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyGraph`] when there is nothing left to select.
    fn select(&mut self, graph: &Graph) -> Result<NodeId, GraphError>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn select(&mut self, graph: &Graph) -> Result<NodeId, GraphError> {
        (**self).select(graph)
    }
}

/// Random failure: every node is equally likely to go.
///
/// The random source is injected so runs can be reproduced from a seed.
#[derive(Clone, Debug)]
pub struct RandomFailure<R> {
    rng: R,
}

impl<R: Rng> RandomFailure<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Strategy for RandomFailure<R> {
    fn name(&self) -> &'static str {
        "failure"
    }

    fn select(&mut self, graph: &Graph) -> Result<NodeId, GraphError> {
        graph.nodes().choose(&mut self.rng).ok_or(GraphError::EmptyGraph)
    }
}

/// Targeted attack on the hub: the node with the highest current degree, smallest id first on
/// ties.
///
/// # Examples
///
/// ```
/// use fragility::{graph::Graph, strategy::{DegreeAttack, Strategy}};
///
/// let graph = Graph::from_edges([(1, 2), (3, 2), (3, 4), (3, 5)]).unwrap();
///
/// assert_eq!(DegreeAttack.select(&graph), Ok(3));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DegreeAttack;

impl Strategy for DegreeAttack {
    fn name(&self) -> &'static str {
        "degree-attack"
    }

    fn select(&mut self, graph: &Graph) -> Result<NodeId, GraphError> {
        let mut best: Option<(NodeId, usize)> = None;

        // Nodes come in ascending order, so keeping the first strict maximum breaks ties
        // towards the smallest id.
        for (node, degree) in graph.degrees() {
            if best.map_or(true, |(_, max)| degree > max) {
                best = Some((node, degree));
            }
        }

        best.map(|(node, _)| node).ok_or(GraphError::EmptyGraph)
    }
}

/// Targeted attack on brokers: the node with the highest betweenness centrality, smallest id
/// first on ties.
///
/// Each selection recomputes betweenness for the whole graph, O(n·m) per call.
#[derive(Clone, Copy, Debug)]
pub struct BetweennessAttack {
    num_threads: usize,
}

impl BetweennessAttack {
    pub fn new(num_threads: usize) -> Self {
        Self { num_threads }
    }
}

impl Default for BetweennessAttack {
    fn default() -> Self {
        Self::new(default_num_threads())
    }
}

/// Scores closer than this are treated as equal, so accumulated rounding can't reorder ties.
const TIE_TOLERANCE: f64 = 1e-9;

impl Strategy for BetweennessAttack {
    fn name(&self) -> &'static str {
        "betweenness-attack"
    }

    fn select(&mut self, graph: &Graph) -> Result<NodeId, GraphError> {
        let index = graph.dense_index();
        let nodes = index.nodes.clone();
        let scores = compute_betweenness(index, self.num_threads, false);

        let mut best: Option<(NodeId, f64)> = None;
        for (node, score) in nodes.into_iter().zip(scores) {
            if best.map_or(true, |(_, max)| score > max + TIE_TOLERANCE) {
                best = Some((node, score));
            }
        }

        best.map(|(node, _)| node).ok_or(GraphError::EmptyGraph)
    }
}
