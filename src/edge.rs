//! A module for working with edges.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use crate::graph::NodeId;

/// A pair of node ids representing an undirected edge. The `source`-`target` naming only
/// reflects the order the ids were read in; `(a, b)` and `(b, a)` are the same edge.
#[derive(Clone, Copy, Debug, Eq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
}

impl Edge {
    /// Creates a new edge from two node ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::edge::Edge;
    ///
    /// let edge = Edge::new(1, 2);
    /// assert_eq!(edge, Edge::new(2, 1));
    /// ```
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    /// Returns the first node of the edge, as read.
    pub const fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the second node of the edge, as read.
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the endpoints with the smaller id first.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::edge::Edge;
    ///
    /// assert_eq!(Edge::new(5, 3).endpoints(), (3, 5));
    /// ```
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }

    /// Returns whether the edge touches the given node.
    pub const fn contains(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Returns whether both endpoints are the same node.
    pub const fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

//
// Trait implementations
//

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.endpoints() == other.endpoints()
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashing the ordered endpoints keeps (a, b) and (b, a) in the same bucket.
        self.endpoints().hash(state);
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.endpoints().cmp(&other.endpoints())
    }
}

impl From<(NodeId, NodeId)> for Edge {
    fn from((source, target): (NodeId, NodeId)) -> Self {
        Self::new(source, target)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{hash_map::DefaultHasher, BTreeSet};

    use super::*;

    #[test]
    fn new() {
        assert_eq!(
            Edge::new(1, 2),
            Edge {
                source: 1,
                target: 2
            }
        )
    }

    #[test]
    fn contains() {
        let edge = Edge::new(1, 2);

        assert!(edge.contains(1));
        assert!(edge.contains(2));
        assert!(!edge.contains(3));
    }

    #[test]
    fn is_loop() {
        assert!(Edge::new(4, 4).is_loop());
        assert!(!Edge::new(4, 5).is_loop());
    }

    //
    // Trait implementations
    //

    #[test]
    fn partial_eq() {
        assert_eq!(Edge::new(1, 2), Edge::new(1, 2));
        assert_eq!(Edge::new(1, 2), Edge::new(2, 1));
        assert_ne!(Edge::new(1, 2), Edge::new(1, 3));
    }

    #[test]
    fn hash() {
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();

        Edge::new(1, 2).hash(&mut h1);
        Edge::new(2, 1).hash(&mut h2);

        // Verify k1 == k2 => hash(k1) == hash(k2).
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn ord_ignores_orientation() {
        let edges: BTreeSet<Edge> = [Edge::new(3, 1), Edge::new(1, 3), Edge::new(2, 1)]
            .into_iter()
            .collect();

        assert_eq!(
            edges.into_iter().map(|e| e.endpoints()).collect::<Vec<_>>(),
            vec![(1, 2), (1, 3)]
        );
    }

    #[test]
    fn display() {
        assert_eq!(Edge::new(7, 2).to_string(), "7 2");
    }
}
