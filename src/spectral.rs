//! Matrix representations of a graph and the spectral robustness measure built on them.
//!
//! Rows and columns follow ascending node id, the same order as
//! [`Graph::dense_index`](crate::graph::Graph::dense_index).

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::graph::{Graph, NodeId};

/// Constructs the adjacency matrix for this graph.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use fragility::{graph::Graph, spectral};
///
/// let graph = Graph::from_edges([(1, 2)]).unwrap();
/// assert_eq!(
///     spectral::adjacency_matrix(&graph),
///     dmatrix![0.0, 1.0;
///              1.0, 0.0]
/// );
/// ```
pub fn adjacency_matrix(graph: &Graph) -> DMatrix<f64> {
    let index = graph.dense_index();
    let n = index.len();
    let mut matrix = DMatrix::<f64>::zeros(n, n);

    // The graph is undirected so the matrix is symmetric; each neighbour list already holds
    // both directions.
    for (i, neighbours) in index.neighbours.iter().enumerate() {
        for j in neighbours {
            matrix[(i, *j as usize)] = 1.0;
        }
    }

    matrix
}

/// Constructs the degree matrix for this graph.
pub fn degree_matrix(graph: &Graph) -> DMatrix<f64> {
    let degrees: Vec<f64> = graph.degrees().map(|(_, degree)| degree as f64).collect();

    DMatrix::from_diagonal(&DVector::from_vec(degrees))
}

/// Constructs the laplacian matrix for this graph.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use fragility::{graph::Graph, spectral};
///
/// let graph = Graph::from_edges([(1, 2), (1, 3)]).unwrap();
/// assert_eq!(
///     spectral::laplacian_matrix(&graph),
///     dmatrix![2.0, -1.0, -1.0;
///              -1.0, 1.0, 0.0;
///              -1.0, 0.0, 1.0]
/// );
/// ```
pub fn laplacian_matrix(graph: &Graph) -> DMatrix<f64> {
    degree_matrix(graph) - adjacency_matrix(graph)
}

/// Returns the algebraic connectivity (Fiedler eigenvalue) of the graph and a mapping of the
/// nodes to their Fiedler value (their associated component in the Fiedler eigenvector).
///
/// The algebraic connectivity is zero iff the graph is disconnected and grows with how hard
/// it is to cut, which makes it a companion to the giant component fraction when tracking
/// an attack. Graphs with fewer than two nodes yield `(0.0, {})`.
pub fn fiedler(graph: &Graph) -> (f64, BTreeMap<NodeId, f64>) {
    let laplacian = laplacian_matrix(graph);

    // The second smallest eigenvalue needs at least a 2x2 matrix.
    if laplacian.nrows() < 2 {
        return (0.0, BTreeMap::new());
    }

    let ascending = true;
    let pairs = sorted_eigenvalue_vector_pairs(laplacian, ascending);

    let Some((algebraic_connectivity, fiedler_vector)) = pairs.into_iter().nth(1) else {
        return (0.0, BTreeMap::new());
    };

    let fiedler_values = graph
        .nodes()
        .zip(fiedler_vector.iter())
        .map(|(node, value)| (node, *value))
        .collect();

    (algebraic_connectivity, fiedler_values)
}

/// Returns the algebraic connectivity of the graph, see [`fiedler`].
pub fn algebraic_connectivity(graph: &Graph) -> f64 {
    fiedler(graph).0
}

//
// Helpers
//

/// Computes the eigenvalues and corresponding eigenvectors from the supplied symmetric matrix.
fn sorted_eigenvalue_vector_pairs(
    matrix: DMatrix<f64>,
    ascending: bool,
) -> Vec<(f64, DVector<f64>)> {
    // Early return if the matrix is empty, the rest of the computation requires a matrix with
    // at least a dim of 1x1.
    if matrix.is_empty() {
        return vec![];
    }

    let eigen = SymmetricEigen::new(matrix);

    let mut pairs: Vec<(f64, DVector<f64>)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(value, vector)| (*value, vector.clone_owned()))
        .collect();

    pairs.sort_unstable_by(|(a, _), (b, _)| {
        if ascending {
            a.total_cmp(b)
        } else {
            b.total_cmp(a)
        }
    });

    pairs
}
