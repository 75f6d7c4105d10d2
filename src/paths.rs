//! A module for performing the multi-threaded all-pairs shortest path sweep.
//!
//! Every node is used as a BFS source exactly once. Sources are handed out to worker threads
//! through a shared counter; each worker owns its accumulator and the caller sums them, so no
//! synchronisation is needed beyond the counter itself.

use std::{
    collections::VecDeque,
    panic,
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Instant,
};

use tracing::{debug, trace};

use crate::graph::{DenseIndex, MAX_NUM_THREADS, MIN_NUM_THREADS};

/// Aggregated shortest path lengths over every ordered pair of distinct, mutually reachable
/// nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathTotals {
    /// Longest finite shortest path found.
    pub longest: usize,
    /// Sum of all shortest path lengths.
    pub total_length: u64,
    /// Number of ordered reachable pairs.
    pub reachable_pairs: u64,
    /// `histogram[d]` is the number of ordered pairs at distance `d` (index 0 unused).
    pub histogram: Vec<u64>,
}

impl PathTotals {
    fn merge(&mut self, other: PathTotals) {
        self.longest = self.longest.max(other.longest);
        self.total_length += other.total_length;
        self.reachable_pairs += other.reachable_pairs;

        if self.histogram.len() < other.histogram.len() {
            self.histogram.resize(other.histogram.len(), 0);
        }
        for (count, extra) in self.histogram.iter_mut().zip(other.histogram) {
            *count += extra;
        }
    }
}

fn bfs_from(
    index: usize,
    indices: &DenseIndex,
    distances: &mut [Option<usize>],
    totals: &mut PathTotals,
) {
    let mut queue: VecDeque<usize> = VecDeque::new();

    distances.iter_mut().for_each(|d| *d = None);
    distances[index] = Some(0);
    queue.push_back(index);

    while let Some(current) = queue.pop_front() {
        let Some(delta) = distances[current] else {
            continue;
        };

        for &next in &indices.neighbours[current] {
            let next = next as usize;
            if distances[next].is_some() {
                continue;
            }

            let length = delta + 1;
            distances[next] = Some(length);
            queue.push_back(next);

            totals.longest = totals.longest.max(length);
            totals.total_length += length as u64;
            totals.reachable_pairs += 1;
            if totals.histogram.len() <= length {
                totals.histogram.resize(length + 1, 0);
            }
            totals.histogram[length] += 1;
        }
    }
}

/// The thread task: grabs the next unprocessed source until none are left, then returns the
/// totals it accumulated.
fn paths_task(acounter: Arc<Mutex<usize>>, aindices: Arc<DenseIndex>) -> PathTotals {
    let indices = &aindices;
    let num_nodes = indices.len();

    let mut totals = PathTotals::default();
    let mut distances = vec![None; num_nodes];

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

        if index % 1000 == 0 {
            trace!(source = index, of = num_nodes, "path sweep progress");
        }
        bfs_from(index, indices, &mut distances, &mut totals);
    }

    totals
}

/// Runs a BFS from every node of the index across `num_threads` workers (clamped to a sane
/// range) and returns the summed totals.
pub fn compute_path_totals(indices: DenseIndex, num_threads: usize) -> PathTotals {
    let start = Instant::now();
    let num_threads = num_threads.clamp(MIN_NUM_THREADS, MAX_NUM_THREADS);
    let num_nodes = indices.len();

    if num_nodes == 0 {
        return PathTotals::default();
    }

    let mut handles = Vec::with_capacity(num_threads);
    let wrapped_indices = Arc::new(indices);
    let wrapped_counter = Arc::new(Mutex::new(0));

    for _ in 0..num_threads.min(num_nodes) {
        let acounter = Arc::clone(&wrapped_counter);
        let aindices = Arc::clone(&wrapped_indices);
        let handle = thread::spawn(move || paths_task(acounter, aindices));
        handles.push(handle);
    }

    let mut totals = PathTotals::default();
    for h in handles {
        match h.join() {
            Ok(partial) => totals.merge(partial),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    debug!(
        nodes = num_nodes,
        threads = num_threads,
        elapsed = ?start.elapsed(),
        "path sweep done"
    );

    totals
}
