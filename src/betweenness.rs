//! Betweenness centrality, the share of shortest paths running through each node.
//!
//! Used by the betweenness attack to find the brokers holding the graph together.

use std::{
    collections::VecDeque,
    panic,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use crate::graph::{DenseIndex, MAX_NUM_THREADS, MIN_NUM_THREADS};

/// Accumulates the dependencies of every node on shortest paths starting at `index`.
///
/// Unweighted single-source pass of Brandes, "A Faster Algorithm for Betweenness Centrality"
/// (2001), algorithm 1.
fn betweenness_for_node(index: usize, indices: &DenseIndex, betweenness_count: &mut [f64]) {
    let num_nodes = indices.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<Option<usize>> = vec![None; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut delta: Vec<f64> = vec![0.0; num_nodes];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut stack: Vec<usize> = Vec::new();

    sigma[index] = 1.0;
    distance[index] = Some(0);
    queue.push_back(index);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        let Some(dv) = distance[v] else {
            continue;
        };

        for &w in &indices.neighbours[v] {
            let w = w as usize;
            if distance[w].is_none() {
                distance[w] = Some(dv + 1);
                queue.push_back(w);
            }
            if distance[w] == Some(dv + 1) {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    // Back-propagate dependencies in order of non-increasing distance from the source.
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != index {
            betweenness_count[w] += delta[w];
        }
    }
}

/// Worker loop: claims source nodes off the shared counter until none are left and returns
/// the partial sums.
fn betweenness_task(acounter: Arc<Mutex<usize>>, aindices: Arc<DenseIndex>) -> Vec<f64> {
    let indices = &aindices;
    let num_nodes = indices.len();

    // Private accumulator, summed by the caller after join.
    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];

    loop {
        let index = {
            let mut counter = acounter.lock().unwrap_or_else(PoisonError::into_inner);
            let index = *counter;
            *counter += 1;
            index
        };
        if index >= num_nodes {
            break;
        }
        betweenness_for_node(index, indices, &mut betweenness_count);
    }
    betweenness_count
}

/// Computes the betweenness centrality of every node of the index, in index order.
///
/// Sources are spread over up to `num_threads` workers sharing the read-only index.
///
/// When `normalize` is set the values are divided by `(n - 1)(n - 2)`, the number of ordered
/// pairs a node can sit between.
pub fn compute_betweenness(indices: DenseIndex, num_threads: usize, normalize: bool) -> Vec<f64> {
    let num_threads = num_threads.clamp(MIN_NUM_THREADS, MAX_NUM_THREADS);
    let num_nodes = indices.len();

    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];
    if num_nodes == 0 {
        return betweenness_count;
    }

    let shared_index = Arc::new(indices);
    let next_source = Arc::new(Mutex::new(0));
    let handles: Vec<_> = (0..num_threads.min(num_nodes))
        .map(|_| {
            let acounter = Arc::clone(&next_source);
            let aindices = Arc::clone(&shared_index);
            thread::spawn(move || betweenness_task(acounter, aindices))
        })
        .collect();

    let divisor: f64 = if normalize && num_nodes > 2 {
        ((num_nodes - 1) * (num_nodes - 2)) as f64
    } else {
        // Each unordered pair is seen from both ends.
        2.0
    };
    for handle in handles {
        let partials = match handle.join() {
            Ok(partials) => partials,
            Err(payload) => panic::resume_unwind(payload),
        };
        for (total, partial) in betweenness_count.iter_mut().zip(partials) {
            *total += partial / divisor;
        }
    }

    betweenness_count
}
