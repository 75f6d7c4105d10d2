//! Experiment settings shared by the simulators and the command line front-end.

use std::path::PathBuf;

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    error::SimulationError,
    graph::default_num_threads,
    io::{DegreeBands, EdgeListFormat},
    robustness::RobustnessConfig,
    sir::SirParams,
};

/// Share of the graph removed when no explicit removal budget is given.
pub const DEFAULT_REMOVAL_FRACTION: f64 = 0.9;
pub const DEFAULT_MEASURE_EVERY: usize = 50;
pub const DEFAULT_RUNS: usize = 5;
pub const DEFAULT_INITIAL_INFECTED: usize = 10;
pub const DEFAULT_BETA: f64 = 0.05;
pub const DEFAULT_ALPHA: f64 = 0.03;

/// How the input file is laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// One `source target` pair per line.
    EdgeList(EdgeListFormat),
    /// `user<separator>repo` membership lines, optionally cut down to degree bands.
    Bipartite {
        separator: char,
        reduce: Option<DegreeBands>,
    },
}

impl Default for InputFormat {
    fn default() -> Self {
        Self::EdgeList(EdgeListFormat::default())
    }
}

/// Everything an experiment needs, passed explicitly to the code that runs it.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Edge list to load.
    pub input: PathBuf,
    pub input_format: InputFormat,
    /// Where results are written, stdout when `None`.
    pub output: Option<PathBuf>,
    /// Seed for every random decision, fresh entropy when `None`.
    pub seed: Option<u64>,
    /// Removal budget; [`DEFAULT_REMOVAL_FRACTION`] of the nodes when `None`.
    pub nodes_to_remove: Option<usize>,
    pub measure_every: usize,
    /// Independent repetitions of stochastic experiments.
    pub runs: usize,
    pub initial_infected: usize,
    pub beta: f64,
    pub alpha: f64,
    pub max_steps: Option<usize>,
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            input_format: InputFormat::default(),
            output: None,
            seed: None,
            nodes_to_remove: None,
            measure_every: DEFAULT_MEASURE_EVERY,
            runs: DEFAULT_RUNS,
            initial_infected: DEFAULT_INITIAL_INFECTED,
            beta: DEFAULT_BETA,
            alpha: DEFAULT_ALPHA,
            max_steps: None,
            threads: default_num_threads(),
        }
    }
}

impl SimulationConfig {
    /// Checks the settings that don't depend on the graph.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidParameter`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.measure_every == 0 {
            return Err(SimulationError::invalid("measure_every", "must be at least 1"));
        }
        if self.runs == 0 {
            return Err(SimulationError::invalid("runs", "must be at least 1"));
        }
        if self.threads == 0 {
            return Err(SimulationError::invalid("threads", "must be at least 1"));
        }
        if let InputFormat::Bipartite {
            reduce: Some(bands),
            ..
        } = &self.input_format
        {
            if bands.users.is_empty() || bands.repos.is_empty() {
                return Err(SimulationError::invalid("reduce", "degree bands must not be empty"));
            }
        }
        self.sir_params().map(|_| ())
    }

    /// The removal budget for a graph of `node_count` nodes.
    pub fn removal_budget(&self, node_count: usize) -> usize {
        self.nodes_to_remove
            .unwrap_or_else(|| (DEFAULT_REMOVAL_FRACTION * node_count as f64) as usize)
    }

    pub fn robustness_config(&self, node_count: usize) -> Result<RobustnessConfig, SimulationError> {
        Ok(RobustnessConfig::new(self.removal_budget(node_count), self.measure_every)?
            .with_threads(self.threads))
    }

    pub fn sir_params(&self) -> Result<SirParams, SimulationError> {
        let params = SirParams::new(self.beta, self.alpha)?;
        Ok(match self.max_steps {
            Some(max_steps) => params.with_max_steps(max_steps),
            None => params,
        })
    }

    /// Random source for one run. Seeded runs get distinct but reproducible streams.
    pub fn rng(&self, run: usize) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(run as u64)),
            None => SmallRng::from_entropy(),
        }
    }
}
