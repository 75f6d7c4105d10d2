//! A module for working with graphs.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    num::NonZeroUsize,
    ops::Bound,
    thread,
};

use crate::{edge::Edge, error::GraphError};

/// Identifier of a node. Ids are unique but need not be contiguous.
pub type NodeId = u64;

/// Position of a node in the dense index handed to the worker threads.
pub type GraphIndex = u32;

pub(crate) const MIN_NUM_THREADS: usize = 1;
pub(crate) const MAX_NUM_THREADS: usize = 128;

/// Returns the number of worker threads to use when the caller has no preference.
pub fn default_num_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(MIN_NUM_THREADS)
        .clamp(MIN_NUM_THREADS, MAX_NUM_THREADS)
}

/// An undirected graph stored as an adjacency map.
///
/// Both levels of the map are ordered, so every traversal (components, BFS, strategy
/// selection) visits nodes in ascending id order and results are reproducible between runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    /// Every node mapped to its neighbours. Symmetric: `v ∈ adjacency[u]` iff `u ∈ adjacency[v]`.
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Number of undirected edges, kept in step with `adjacency`.
    edge_count: usize,
}

/// A compact, index-based view of a graph for the path computations.
///
/// `nodes` is sorted, so the position of a node in it is its [`GraphIndex`].
#[derive(Clone, Debug, Default)]
pub struct DenseIndex {
    pub nodes: Vec<NodeId>,
    pub neighbours: Vec<Vec<GraphIndex>>,
}

impl DenseIndex {
    /// Returns the position of a node in the index, if present.
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Graph {
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::graph::Graph;
    ///
    /// let graph = Graph::new();
    /// assert!(graph.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from an edge list.
    ///
    /// Duplicate edges (in either orientation) collapse into one. Self-loops carry no meaning
    /// for the metrics computed here: the node is kept, the loop is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyEdgeList`] if no edges are supplied.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::graph::Graph;
    ///
    /// let graph = Graph::from_edges([(1, 2), (2, 3), (3, 1), (2, 1)]).unwrap();
    ///
    /// assert_eq!(graph.node_count(), 3);
    /// assert_eq!(graph.edge_count(), 3);
    /// ```
    pub fn from_edges<I, E>(edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Edge>,
    {
        let mut graph = Self::new();
        let mut seen = 0usize;

        for edge in edges {
            graph.insert(edge.into());
            seen += 1;
        }

        if seen == 0 {
            return Err(GraphError::EmptyEdgeList);
        }

        Ok(graph)
    }

    /// Inserts an edge and returns whether it was new.
    ///
    /// Both endpoints are added as nodes if they are not already present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        let (a, b) = edge.endpoints();

        if edge.is_loop() {
            self.insert_node(a);
            return false;
        }

        let is_inserted = self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);

        if is_inserted {
            self.edge_count += 1;
        }

        is_inserted
    }

    /// Inserts an isolated node and returns whether it was new.
    pub fn insert_node(&mut self, node: NodeId) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }

        self.adjacency.insert(node, BTreeSet::new());
        true
    }

    /// Removes a node together with every incident edge and returns its former neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node is not in the graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::graph::Graph;
    ///
    /// let mut graph = Graph::from_edges([(1, 2), (1, 3)]).unwrap();
    /// graph.remove_node(1).unwrap();
    ///
    /// assert_eq!(graph.node_count(), 2);
    /// assert_eq!(graph.edge_count(), 0);
    /// assert!(graph.remove_node(1).is_err());
    /// ```
    pub fn remove_node(&mut self, node: NodeId) -> Result<BTreeSet<NodeId>, GraphError> {
        let neighbours = self
            .adjacency
            .remove(&node)
            .ok_or(GraphError::UnknownNode(node))?;

        for neighbour in &neighbours {
            if let Some(adjacent) = self.adjacency.get_mut(neighbour) {
                adjacent.remove(&node);
            }
        }
        self.edge_count -= neighbours.len();

        Ok(neighbours)
    }

    /// Removes an edge and returns whether it was present. Endpoints stay in the graph.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let (a, b) = edge.endpoints();

        let is_removed = self
            .adjacency
            .get_mut(&a)
            .map_or(false, |adjacent| adjacent.remove(&b));

        if is_removed {
            if let Some(adjacent) = self.adjacency.get_mut(&b) {
                adjacent.remove(&a);
            }
            self.edge_count -= 1;
        }

        is_removed
    }

    /// Checks if the graph contains a node.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    /// Checks if the graph contains an edge.
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        let (a, b) = edge.endpoints();

        self.adjacency
            .get(&a)
            .map_or(false, |adjacent| adjacent.contains(&b))
    }

    /// Returns the neighbours of a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node is not in the graph.
    pub fn neighbors(&self, node: NodeId) -> Result<&BTreeSet<NodeId>, GraphError> {
        self.adjacency
            .get(&node)
            .ok_or(GraphError::UnknownNode(node))
    }

    /// Returns the degree of a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node is not in the graph.
    pub fn degree(&self, node: NodeId) -> Result<usize, GraphError> {
        self.neighbors(node).map(BTreeSet::len)
    }

    /// Iterates over `(node, degree)` pairs in ascending node order.
    pub fn degrees(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.adjacency
            .iter()
            .map(|(node, adjacent)| (*node, adjacent.len()))
    }

    /// Iterates over the nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Iterates over every edge exactly once, smaller endpoint first.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(node, adjacent)| {
            adjacent
                .range(above(*node))
                .map(move |neighbour| Edge::new(*node, *neighbour))
        })
    }

    /// Returns the node count of the graph.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Computes the density of the graph, the ratio of edges with respect to the maximum possible
    /// edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::graph::Graph;
    ///
    /// let mut graph = Graph::from_edges([(1, 2)]).unwrap();
    /// assert_eq!(graph.density(), 1.0);
    ///
    /// graph = Graph::from_edges([(1, 2), (1, 3)]).unwrap();
    /// assert_eq!(graph.density(), 2.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let nc = self.node_count() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible edges given a node count.
        let pec = nc * (nc - 1.0) / 2.0;
        ec / pec
    }

    /// Returns the subgraph induced by the given nodes. Ids that aren't in the graph are
    /// ignored; selected nodes without selected neighbours are kept as isolated nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::{edge::Edge, graph::Graph};
    ///
    /// let graph = Graph::from_edges([(1, 2), (2, 3), (3, 4)]).unwrap();
    /// let sub = graph.subgraph([2, 3, 4]);
    ///
    /// assert_eq!(sub.node_count(), 3);
    /// assert!(sub.contains_edge(&Edge::new(3, 4)));
    /// assert!(!sub.contains_node(1));
    /// ```
    pub fn subgraph<I>(&self, nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let selected: BTreeSet<NodeId> = nodes
            .into_iter()
            .filter(|node| self.contains_node(*node))
            .collect();

        let mut sub = Self::new();
        for (node, adjacent) in self
            .adjacency
            .iter()
            .filter(|(node, _)| selected.contains(node))
        {
            sub.insert_node(*node);

            for neighbour in adjacent.range(above(*node)) {
                if selected.contains(neighbour) {
                    sub.insert(Edge::new(*node, *neighbour));
                }
            }
        }

        sub
    }

    /// Returns the connected components, largest first.
    ///
    /// Components are discovered by BFS starting from nodes in ascending order; components of
    /// equal size keep their discovery order.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::graph::Graph;
    ///
    /// let graph = Graph::from_edges([(5, 6), (1, 2), (2, 3)]).unwrap();
    /// let components = graph.connected_components();
    ///
    /// assert_eq!(components.len(), 2);
    /// assert_eq!(components[0].len(), 3);
    /// assert!(components[1].contains(&5));
    /// ```
    pub fn connected_components(&self) -> Vec<BTreeSet<NodeId>> {
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.nodes() {
            if visited.contains(&start) {
                continue;
            }

            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            visited.insert(start);

            while let Some(current) = queue.pop_front() {
                component.insert(current);

                for neighbour in self.adjacency.get(&current).into_iter().flatten() {
                    if visited.insert(*neighbour) {
                        queue.push_back(*neighbour);
                    }
                }
            }

            components.push(component);
        }

        // `sort_by` is stable, so equally sized components stay in discovery order.
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components
    }

    /// Returns the induced subgraph of the largest connected component, or `None` for an
    /// empty graph.
    pub fn giant_component(&self) -> Option<Self> {
        self.connected_components()
            .into_iter()
            .next()
            .map(|component| self.subgraph(component))
    }

    /// Constructs the dense index of this graph, used by the multi-threaded path computations.
    ///
    /// Nodes are numbered by ascending id.
    pub fn dense_index(&self) -> DenseIndex {
        let nodes: Vec<NodeId> = self.nodes().collect();
        let positions: BTreeMap<NodeId, GraphIndex> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (*node, i as GraphIndex))
            .collect();

        let neighbours = self
            .adjacency
            .values()
            .map(|adjacent| {
                adjacent
                    .iter()
                    .filter_map(|neighbour| positions.get(neighbour).copied())
                    .collect()
            })
            .collect();

        DenseIndex { nodes, neighbours }
    }
}

//
// Helpers
//

/// Range bounds selecting the ids strictly greater than `node`, used to visit each undirected
/// edge from its smaller endpoint only.
fn above(node: NodeId) -> (Bound<NodeId>, Bound<NodeId>) {
    (Bound::Excluded(node), Bound::Unbounded)
}
