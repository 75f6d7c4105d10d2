//! Error types surfaced by the graph store and the simulators.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::graph::NodeId;

/// An error produced while building or mutating a [`Graph`](crate::graph::Graph).
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// A line of an edge list did not hold two integer node ids.
    #[error("malformed edge on line {line}: `{content}`")]
    MalformedEdge {
        /// One-based line number in the source.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },
    /// No edges were supplied to build a graph from.
    #[error("edge list is empty")]
    EmptyEdgeList,
    /// The node is not part of the graph.
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),
    /// The operation needs at least one node but the graph has none left.
    #[error("graph has no nodes")]
    EmptyGraph,
}

/// An error produced while configuring or running a simulation.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationError {
    /// A graph operation failed mid-simulation.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// More initially infected nodes were requested than the graph holds.
    #[error("cannot infect {requested} nodes in a graph of {available}")]
    InvalidInfectionCount {
        /// Number of nodes asked for.
        requested: usize,
        /// Number of nodes in the graph.
        available: usize,
    },
    /// A simulation parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Human readable constraint that was violated.
        reason: String,
    },
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// An error produced while reading or writing edge lists and histories.
#[derive(Debug, Error)]
pub enum IoError {
    /// The underlying reader or writer failed.
    #[error("i/o failure on `{path}`: {source}")]
    Io {
        /// File being accessed, empty for in-memory streams.
        path: PathBuf,
        /// Operating system error.
        #[source]
        source: io::Error,
    },
    /// The content could not be interpreted as a graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A history dump did not have the expected layout.
    #[error("malformed history on line {line}: {reason}")]
    MalformedHistory {
        /// One-based line number in the dump.
        line: usize,
        /// What was expected.
        reason: String,
    },
}

impl From<io::Error> for IoError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl IoError {
    /// Attaches the path that was being accessed to a bare stream error.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io { source, .. } => Self::Io {
                path: path.into(),
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_messages() {
        assert_eq!(
            GraphError::MalformedEdge {
                line: 3,
                content: "a b".to_owned()
            }
            .to_string(),
            "malformed edge on line 3: `a b`"
        );
        assert_eq!(
            GraphError::UnknownNode(7).to_string(),
            "node 7 is not in the graph"
        );
    }

    #[test]
    fn simulation_error_wraps_graph_error() {
        let err: SimulationError = GraphError::EmptyGraph.into();

        assert_eq!(err, SimulationError::Graph(GraphError::EmptyGraph));
        assert_eq!(err.to_string(), "graph has no nodes");
    }

    #[test]
    fn io_error_with_path() {
        let err = IoError::from(io::Error::new(io::ErrorKind::NotFound, "gone")).with_path("x.txt");

        match err {
            IoError::Io { path, .. } => assert_eq!(path, PathBuf::from("x.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
