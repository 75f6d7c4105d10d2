//! Robustness under node removal.
//!
//! A run removes nodes one at a time from its own copy of the graph, as chosen by a
//! [`Strategy`], and every `measure_every` removals records the diameter, the average path
//! length and the giant component fraction. Random failure is stochastic, so it is usually
//! repeated over several independent copies of the same initial graph; the histories are kept
//! apart and [`aggregate`] folds them for reporting.

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{
    error::{GraphError, SimulationError},
    graph::{default_num_threads, Graph, NodeId},
    metrics,
    strategy::Strategy,
};

/// Parameters of a robustness run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RobustnessConfig {
    nodes_to_remove: usize,
    measure_every: usize,
    num_threads: usize,
}

impl RobustnessConfig {
    /// Creates a configuration removing `nodes_to_remove` nodes and measuring on every
    /// removal whose zero-based index is a multiple of `measure_every`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidParameter`] if `measure_every` is zero.
    pub fn new(nodes_to_remove: usize, measure_every: usize) -> Result<Self, SimulationError> {
        if measure_every == 0 {
            return Err(SimulationError::invalid(
                "measure_every",
                "must be at least 1",
            ));
        }

        Ok(Self {
            nodes_to_remove,
            measure_every,
            num_threads: default_num_threads(),
        })
    }

    /// Sets the number of threads used for the path metrics.
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn nodes_to_remove(&self) -> usize {
        self.nodes_to_remove
    }

    pub fn measure_every(&self) -> usize {
        self.measure_every
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

/// The measurements taken after one removal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobustnessSample {
    /// Zero-based index of the removal this sample follows.
    pub iteration: usize,
    pub diameter: usize,
    pub average_path_length: f64,
    pub giant_component_fraction: f64,
}

impl RobustnessSample {
    /// Measures the graph as it stands.
    pub fn measure(graph: &Graph, iteration: usize, num_threads: usize) -> Self {
        let (diameter, average_path_length) =
            metrics::diameter_and_average_path_length(graph, num_threads);

        Self {
            iteration,
            diameter,
            average_path_length,
            giant_component_fraction: metrics::giant_component_fraction(graph),
        }
    }
}

/// The ordered samples of one run.
pub type RobustnessHistory = Vec<RobustnessSample>;

/// Lifecycle of a [`RobustnessRun`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing removed yet.
    Ready,
    /// Removals in progress.
    Running,
    /// The removal budget is spent.
    Done,
}

/// A run stopped before spending its removal budget.
///
/// The samples recorded up to the failure are handed back untouched.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("robustness run {run} aborted after {removed} removals: {source}")]
pub struct RunAborted {
    /// Zero-based index of the failed run.
    pub run: usize,
    /// Removals completed before the failure.
    pub removed: usize,
    /// Samples recorded by the failed run.
    pub history: RobustnessHistory,
    /// Histories of the runs that completed before it.
    pub completed: Vec<RobustnessHistory>,
    #[source]
    pub source: GraphError,
}

/// A single robustness run over a private copy of the graph.
#[derive(Clone, Debug)]
pub struct RobustnessRun {
    graph: Graph,
    config: RobustnessConfig,
    removed: usize,
    phase: RunPhase,
    history: RobustnessHistory,
}

impl RobustnessRun {
    /// Prepares a run over a copy of `graph`; the caller's graph is never touched.
    pub fn new(graph: &Graph, config: RobustnessConfig) -> Self {
        Self {
            graph: graph.clone(),
            config,
            removed: 0,
            phase: if config.nodes_to_remove == 0 {
                RunPhase::Done
            } else {
                RunPhase::Ready
            },
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The run's copy of the graph in its current state.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn history(&self) -> &[RobustnessSample] {
        &self.history
    }

    /// Number of nodes removed so far.
    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Removes one node chosen by `strategy` and measures if this removal is due.
    ///
    /// Returns the removed node, or `None` once the run is done.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyGraph`] if the graph ran out of nodes before the budget
    /// did. The history recorded so far is kept.
    pub fn step<S: Strategy + ?Sized>(
        &mut self,
        strategy: &mut S,
    ) -> Result<Option<NodeId>, GraphError> {
        if self.phase == RunPhase::Done {
            return Ok(None);
        }
        self.phase = RunPhase::Running;

        let iteration = self.removed;
        let node = strategy.select(&self.graph)?;
        self.graph.remove_node(node)?;
        self.removed += 1;

        if iteration % self.config.measure_every == 0 {
            let sample = RobustnessSample::measure(&self.graph, iteration, self.config.num_threads);
            debug!(
                iteration,
                node,
                diameter = sample.diameter,
                average_path_length = sample.average_path_length,
                giant_component_fraction = sample.giant_component_fraction,
                "measured"
            );
            self.history.push(sample);
        }

        if self.removed == self.config.nodes_to_remove {
            self.phase = RunPhase::Done;
        }

        Ok(Some(node))
    }

    /// Consumes the run and returns its samples.
    pub fn into_history(self) -> RobustnessHistory {
        self.history
    }
}

/// Drives robustness runs with a fixed configuration.
#[derive(Clone, Copy, Debug)]
pub struct RobustnessSimulator {
    config: RobustnessConfig,
}

impl RobustnessSimulator {
    pub fn new(config: RobustnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RobustnessConfig {
        &self.config
    }

    /// Runs the full removal budget against a copy of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`RunAborted`] with the partial history if the graph is exhausted first.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::{
    ///     graph::Graph,
    ///     robustness::{RobustnessConfig, RobustnessSimulator},
    ///     strategy::DegreeAttack,
    /// };
    ///
    /// let star = Graph::from_edges((1..=4).map(|leaf| (0, leaf))).unwrap();
    /// let simulator = RobustnessSimulator::new(RobustnessConfig::new(1, 1).unwrap());
    ///
    /// let history = simulator.run(&star, &mut DegreeAttack).unwrap();
    ///
    /// assert_eq!(history[0].giant_component_fraction, 0.25);
    /// assert_eq!(star.node_count(), 5);
    /// ```
    pub fn run<S: Strategy + ?Sized>(
        &self,
        graph: &Graph,
        strategy: &mut S,
    ) -> Result<RobustnessHistory, RunAborted> {
        self.run_indexed(0, graph, strategy)
            .map_err(|(history, removed, source)| RunAborted {
                run: 0,
                removed,
                history,
                completed: Vec::new(),
                source,
            })
    }

    /// Repeats the run `runs` times, each over a fresh copy of the same initial graph with a
    /// strategy built by `make_strategy(run_index)`. One history per run, in run order.
    ///
    /// # Errors
    ///
    /// Returns [`RunAborted`] for the first run that exhausts its graph, carrying the
    /// histories of the runs completed before it.
    pub fn run_repeated<S, F>(
        &self,
        graph: &Graph,
        runs: usize,
        mut make_strategy: F,
    ) -> Result<Vec<RobustnessHistory>, RunAborted>
    where
        S: Strategy,
        F: FnMut(usize) -> S,
    {
        let mut completed = Vec::with_capacity(runs);

        for run in 0..runs {
            let mut strategy = make_strategy(run);
            match self.run_indexed(run, graph, &mut strategy) {
                Ok(history) => completed.push(history),
                Err((history, removed, source)) => {
                    return Err(RunAborted {
                        run,
                        removed,
                        history,
                        completed,
                        source,
                    })
                }
            }
        }

        Ok(completed)
    }

    #[instrument(
        name = "robustness",
        skip_all,
        fields(run = run, strategy = strategy.name(), nodes = graph.node_count())
    )]
    fn run_indexed<S: Strategy + ?Sized>(
        &self,
        run: usize,
        graph: &Graph,
        strategy: &mut S,
    ) -> Result<RobustnessHistory, (RobustnessHistory, usize, GraphError)> {
        info!(
            nodes_to_remove = self.config.nodes_to_remove,
            measure_every = self.config.measure_every,
            "starting robustness run"
        );

        let mut current = RobustnessRun::new(graph, self.config);
        while current.phase() != RunPhase::Done {
            if let Err(source) = current.step(strategy) {
                let removed = current.removed();
                return Err((current.into_history(), removed, source));
            }
        }

        info!(samples = current.history().len(), "robustness run done");
        Ok(current.into_history())
    }
}

/// Mean and population standard deviation of one measure across runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: f64,
}

impl Spread {
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Samples at the same position of several runs, folded together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateSample {
    pub iteration: usize,
    pub diameter: Spread,
    pub average_path_length: Spread,
    pub giant_component_fraction: Spread,
}

/// Folds repeated runs position by position. Only positions present in every history are
/// reported.
///
/// # Examples
///
/// ```
/// use fragility::robustness::{aggregate, RobustnessSample};
///
/// let sample = |diameter| RobustnessSample {
///     iteration: 0,
///     diameter,
///     average_path_length: 1.0,
///     giant_component_fraction: 0.5,
/// };
///
/// let folded = aggregate(&[vec![sample(2)], vec![sample(4)]]);
///
/// assert_eq!(folded[0].diameter.mean, 3.0);
/// assert_eq!(folded[0].diameter.std_dev, 1.0);
/// assert_eq!(folded[0].giant_component_fraction.std_dev, 0.0);
/// ```
pub fn aggregate(histories: &[RobustnessHistory]) -> Vec<AggregateSample> {
    let len = histories.iter().map(Vec::len).min().unwrap_or(0);

    (0..len)
        .map(|position| {
            let column: Vec<&RobustnessSample> =
                histories.iter().map(|history| &history[position]).collect();
            let pick = |f: fn(&RobustnessSample) -> f64| -> Vec<f64> {
                column.iter().map(|sample| f(sample)).collect()
            };

            AggregateSample {
                iteration: column[0].iteration,
                diameter: Spread::of(&pick(|s| s.diameter as f64)),
                average_path_length: Spread::of(&pick(|s| s.average_path_length)),
                giant_component_fraction: Spread::of(&pick(|s| s.giant_component_fraction)),
            }
        })
        .collect()
}

/// The histories produced by one strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct RobustnessReport {
    pub strategy: String,
    pub histories: Vec<RobustnessHistory>,
}

impl RobustnessReport {
    pub fn new(strategy: impl Into<String>, histories: Vec<RobustnessHistory>) -> Self {
        Self {
            strategy: strategy.into(),
            histories,
        }
    }

    /// See [`aggregate`].
    pub fn aggregate(&self) -> Vec<AggregateSample> {
        aggregate(&self.histories)
    }
}
