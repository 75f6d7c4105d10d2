//! SIR epidemic spread over a graph.
//!
//! Every node is Susceptible, Infected or Removed. A time step lets every infected node try to
//! infect each susceptible neighbour with probability `beta` and then recover with probability
//! `alpha`. All decisions of a step are taken against the state at the start of the step and
//! committed together, so the order nodes are visited in does not leak into the outcome.

use std::collections::{BTreeMap, BTreeSet};

use rand::{seq::index, Rng};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::SimulationError,
    graph::{Graph, NodeId},
};

/// The epidemic state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    Susceptible,
    Infected,
    Removed,
}

/// Transmission parameters of the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SirParams {
    beta: f64,
    alpha: f64,
    max_steps: Option<usize>,
}

impl SirParams {
    /// Creates the parameters for an infection probability `beta` and a removal probability
    /// `alpha`, with no cap on the number of steps.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidParameter`] if either probability is outside `[0, 1]`.
    pub fn new(beta: f64, alpha: f64) -> Result<Self, SimulationError> {
        Ok(Self {
            beta: probability("beta", beta)?,
            alpha: probability("alpha", alpha)?,
            max_steps: None,
        })
    }

    /// Stops a run after `max_steps` steps even if infected nodes remain.
    ///
    /// With `alpha = 0` nothing ever recovers, so an uncapped run on a graph with an isolated
    /// infected node never ends.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }
}

fn probability(name: &'static str, value: f64) -> Result<f64, SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimulationError::invalid(
            name,
            format!("{value} is not a probability"),
        ))
    }
}

/// Population counts at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SirCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub removed: usize,
}

impl SirCounts {
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.removed
    }
}

/// An epidemic in progress on a borrowed graph.
#[derive(Clone, Debug)]
pub struct Epidemic<'g> {
    graph: &'g Graph,
    params: SirParams,
    states: BTreeMap<NodeId, NodeState>,
    initially_infected: Vec<NodeId>,
    time: usize,
}

impl<'g> Epidemic<'g> {
    /// Marks every node Susceptible, then infects `initial_infected` distinct nodes drawn
    /// uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidInfectionCount`] if more nodes are asked for than
    /// the graph holds.
    pub fn initialize<R: Rng + ?Sized>(
        graph: &'g Graph,
        params: SirParams,
        initial_infected: usize,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let available = graph.node_count();
        if initial_infected > available {
            return Err(SimulationError::InvalidInfectionCount {
                requested: initial_infected,
                available,
            });
        }

        let mut states: BTreeMap<NodeId, NodeState> = graph
            .nodes()
            .map(|node| (node, NodeState::Susceptible))
            .collect();

        let nodes: Vec<NodeId> = graph.nodes().collect();
        let mut initially_infected: Vec<NodeId> = index::sample(rng, available, initial_infected)
            .into_iter()
            .map(|i| nodes[i])
            .collect();
        initially_infected.sort_unstable();

        for node in &initially_infected {
            states.insert(*node, NodeState::Infected);
        }

        debug!(?initially_infected, "seeded infection");

        Ok(Self {
            graph,
            params,
            states,
            initially_infected,
            time: 0,
        })
    }

    /// Returns the state of `node`, `None` if it isn't in the graph.
    pub fn state(&self, node: NodeId) -> Option<NodeState> {
        self.states.get(&node).copied()
    }

    /// Number of steps taken so far.
    pub fn time(&self) -> usize {
        self.time
    }

    pub fn initially_infected(&self) -> &[NodeId] {
        &self.initially_infected
    }

    /// Counts the nodes in each state.
    pub fn counts(&self) -> SirCounts {
        let mut counts = SirCounts::default();
        for state in self.states.values() {
            match state {
                NodeState::Susceptible => counts.susceptible += 1,
                NodeState::Infected => counts.infected += 1,
                NodeState::Removed => counts.removed += 1,
            }
        }
        counts
    }

    /// Advances the epidemic by one time step and returns the counts after it.
    ///
    /// A node infected during this step neither spreads nor recovers until the next one, and an
    /// infected node may both infect and recover in the same step.
    ///
    /// # Errors
    ///
    /// Fails only if the graph and the state map disagree on the node set.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SirCounts, SimulationError> {
        let mut newly_infected = BTreeSet::new();
        let mut newly_removed = Vec::new();

        for (&node, state) in &self.states {
            if *state != NodeState::Infected {
                continue;
            }

            for neighbour in self.graph.neighbors(node)? {
                if self.states.get(neighbour) == Some(&NodeState::Susceptible)
                    && rng.gen_bool(self.params.beta)
                {
                    newly_infected.insert(*neighbour);
                }
            }

            if rng.gen_bool(self.params.alpha) {
                newly_removed.push(node);
            }
        }

        for node in newly_infected {
            self.states.insert(node, NodeState::Infected);
        }
        for node in newly_removed {
            self.states.insert(node, NodeState::Removed);
        }

        self.time += 1;
        Ok(self.counts())
    }

    /// Steps until no node is infected, or until the step cap is reached.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{rngs::SmallRng, SeedableRng};
    /// use fragility::{
    ///     graph::Graph,
    ///     sir::{Epidemic, SirParams},
    /// };
    ///
    /// let graph = Graph::from_edges([(1, 2), (2, 3), (3, 4)]).unwrap();
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let params = SirParams::new(0.5, 0.5).unwrap();
    ///
    /// let run = Epidemic::initialize(&graph, params, 1, &mut rng)
    ///     .unwrap()
    ///     .run(&mut rng)
    ///     .unwrap()
    ///     .into_run();
    ///
    /// let last = run.history.last().unwrap();
    /// assert_eq!(last.infected, 0);
    /// assert_eq!(run.terminal_time, run.history.len());
    /// ```
    #[instrument(
        name = "sir",
        skip_all,
        fields(
            nodes = self.graph.node_count(),
            beta = self.params.beta,
            alpha = self.params.alpha,
        )
    )]
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<SirOutcome, SimulationError> {
        info!(
            initially_infected = self.initially_infected.len(),
            "starting epidemic"
        );

        let mut history = Vec::new();
        let mut infected = self.counts().infected;

        while infected > 0 {
            if self.params.max_steps.is_some_and(|cap| self.time >= cap) {
                warn!(time = self.time, infected, "step cap reached");
                return Ok(SirOutcome::DidNotConverge(self.into_run(history)));
            }

            let counts = self.step(rng)?;
            debug!(
                time = self.time,
                susceptible = counts.susceptible,
                infected = counts.infected,
                removed = counts.removed,
                "step"
            );
            infected = counts.infected;
            history.push(counts);
        }

        info!(terminal_time = self.time, "epidemic died out");
        Ok(SirOutcome::Converged(self.into_run(history)))
    }

    fn into_run(self, history: Vec<SirCounts>) -> SirRun {
        SirRun {
            history,
            terminal_time: self.time,
            initially_infected: self.initially_infected,
        }
    }
}

/// The record of one epidemic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SirRun {
    /// Counts after each step, in step order.
    pub history: Vec<SirCounts>,
    /// Number of steps taken.
    pub terminal_time: usize,
    /// The seed infections, ascending.
    pub initially_infected: Vec<NodeId>,
}

impl SirRun {
    /// Derives the headline figures of the run.
    pub fn summary(&self) -> SirSummary {
        let mut summary = SirSummary {
            peak_infected: self.initially_infected.len(),
            peak_time: 0,
            total_infected: self.initially_infected.len(),
        };

        for (step, counts) in self.history.iter().enumerate() {
            if counts.infected > summary.peak_infected {
                summary.peak_infected = counts.infected;
                summary.peak_time = step + 1;
            }
        }

        if let Some(last) = self.history.last() {
            summary.total_infected = last.infected + last.removed;
        }

        summary
    }
}

/// Headline figures of a [`SirRun`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SirSummary {
    /// Largest number of simultaneously infected nodes.
    pub peak_infected: usize,
    /// Step at which the peak was first reached, 0 for the seed state.
    pub peak_time: usize,
    /// Nodes that were infected at any point.
    pub total_infected: usize,
}

/// How an epidemic run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SirOutcome {
    /// No infected nodes remain.
    Converged(SirRun),
    /// The step cap was reached with infected nodes left.
    DidNotConverge(SirRun),
}

impl SirOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }

    pub fn run(&self) -> &SirRun {
        match self {
            Self::Converged(run) | Self::DidNotConverge(run) => run,
        }
    }

    pub fn into_run(self) -> SirRun {
        match self {
            Self::Converged(run) | Self::DidNotConverge(run) => run,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{rngs::SmallRng, SeedableRng};
    use rstest::rstest;

    use super::*;

    fn ring(n: u64) -> Graph {
        Graph::from_edges((0..n).map(|i| (i, (i + 1) % n))).unwrap()
    }

    fn rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }

    #[rstest]
    #[case(-0.1, 0.5, "beta")]
    #[case(1.5, 0.5, "beta")]
    #[case(0.5, -1.0, "alpha")]
    #[case(0.5, f64::NAN, "alpha")]
    fn probabilities_are_validated(#[case] beta: f64, #[case] alpha: f64, #[case] bad: &str) {
        match SirParams::new(beta, alpha) {
            Err(SimulationError::InvalidParameter { name, .. }) => assert_eq!(name, bad),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn too_many_initial_infections() {
        let graph = ring(5);
        let params = SirParams::new(0.1, 0.1).unwrap();

        let err = Epidemic::initialize(&graph, params, 6, &mut rng(1)).unwrap_err();

        assert_eq!(
            err,
            SimulationError::InvalidInfectionCount {
                requested: 6,
                available: 5
            }
        );
    }

    #[test]
    fn initialization_infects_distinct_nodes() {
        let graph = ring(20);
        let params = SirParams::new(0.1, 0.1).unwrap();

        let epidemic = Epidemic::initialize(&graph, params, 7, &mut rng(3)).unwrap();

        let seeds = epidemic.initially_infected();
        assert_eq!(seeds.len(), 7);
        assert!(seeds.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(seeds
            .iter()
            .all(|node| epidemic.state(*node) == Some(NodeState::Infected)));
        assert_eq!(
            epidemic.counts(),
            SirCounts {
                susceptible: 13,
                infected: 7,
                removed: 0
            }
        );
    }

    #[test]
    fn no_spread_and_certain_removal_converges_in_one_step() {
        let graph = ring(10);
        let params = SirParams::new(0.0, 1.0).unwrap();

        let outcome = Epidemic::initialize(&graph, params, 3, &mut rng(5))
            .unwrap()
            .run(&mut rng(6))
            .unwrap();

        assert!(outcome.is_converged());
        let run = outcome.into_run();
        assert_eq!(run.terminal_time, 1);
        assert_eq!(
            run.history,
            vec![SirCounts {
                susceptible: 7,
                infected: 0,
                removed: 3
            }]
        );
    }

    #[test]
    fn certain_spread_follows_the_ring() {
        let graph = ring(6);
        let params = SirParams::new(1.0, 1.0).unwrap();
        let mut epidemic = Epidemic::initialize(&graph, params, 1, &mut rng(0)).unwrap();
        let seed = epidemic.initially_infected()[0];

        let counts = epidemic.step(&mut rng(1)).unwrap();

        // The seed infects both neighbours and is removed in the same step.
        assert_eq!(
            counts,
            SirCounts {
                susceptible: 3,
                infected: 2,
                removed: 1
            }
        );
        assert_eq!(epidemic.state(seed), Some(NodeState::Removed));
        assert_eq!(epidemic.state((seed + 1) % 6), Some(NodeState::Infected));
        assert_eq!(epidemic.state((seed + 5) % 6), Some(NodeState::Infected));
    }

    #[test]
    fn newly_infected_do_not_spread_in_the_same_step() {
        let graph = Graph::from_edges([(1, 2), (2, 3)]).unwrap();
        let params = SirParams::new(1.0, 0.0).unwrap();
        let mut epidemic = Epidemic::initialize(&graph, params, 0, &mut rng(0)).unwrap();
        epidemic.states.insert(1, NodeState::Infected);

        epidemic.step(&mut rng(0)).unwrap();

        assert_eq!(epidemic.state(2), Some(NodeState::Infected));
        assert_eq!(epidemic.state(3), Some(NodeState::Susceptible));
    }

    #[test]
    fn no_infection_is_already_converged() {
        let graph = ring(4);
        let params = SirParams::new(0.5, 0.5).unwrap();

        let outcome = Epidemic::initialize(&graph, params, 0, &mut rng(0))
            .unwrap()
            .run(&mut rng(0))
            .unwrap();

        assert_eq!(outcome, SirOutcome::Converged(SirRun::default()));
    }

    #[test]
    fn step_cap_reports_non_convergence() {
        let graph = ring(8);
        // Nobody ever recovers.
        let params = SirParams::new(0.0, 0.0).unwrap().with_max_steps(5);

        let outcome = Epidemic::initialize(&graph, params, 2, &mut rng(2))
            .unwrap()
            .run(&mut rng(3))
            .unwrap();

        assert!(!outcome.is_converged());
        assert_eq!(outcome.run().terminal_time, 5);
        assert_eq!(outcome.run().history.len(), 5);
        assert!(outcome.run().history.iter().all(|c| c.infected == 2));
    }

    #[test]
    fn runs_are_reproducible() {
        let graph = ring(30);
        let params = SirParams::new(0.4, 0.3).unwrap();
        let simulate = || {
            let mut rng = rng(99);
            Epidemic::initialize(&graph, params, 2, &mut rng)
                .unwrap()
                .run(&mut rng)
                .unwrap()
        };

        assert_eq!(simulate(), simulate());
    }

    #[test]
    fn summary() {
        let run = SirRun {
            history: vec![
                SirCounts {
                    susceptible: 6,
                    infected: 3,
                    removed: 1,
                },
                SirCounts {
                    susceptible: 4,
                    infected: 3,
                    removed: 3,
                },
                SirCounts {
                    susceptible: 4,
                    infected: 0,
                    removed: 6,
                },
            ],
            terminal_time: 3,
            initially_infected: vec![1, 2],
        };

        assert_eq!(
            run.summary(),
            SirSummary {
                peak_infected: 3,
                peak_time: 1,
                total_infected: 6
            }
        );
    }

    proptest! {
        #[test]
        fn counts_are_conserved_and_removed_never_shrinks(
            seed in any::<u64>(),
            beta in 0.0f64..=1.0,
            alpha in 0.05f64..=1.0,
        ) {
            let graph = ring(25);
            let params = SirParams::new(beta, alpha).unwrap();
            let mut rng = rng(seed);

            let run = Epidemic::initialize(&graph, params, 3, &mut rng)
                .unwrap()
                .run(&mut rng)
                .unwrap()
                .into_run();

            let mut removed = 0;
            for counts in &run.history {
                prop_assert_eq!(counts.total(), 25);
                prop_assert!(counts.removed >= removed);
                removed = counts.removed;
            }
            prop_assert_eq!(run.history.last().map(|c| c.infected), Some(0));
        }

        #[test]
        fn without_transmission_the_susceptible_stay_susceptible(
            seed in any::<u64>(),
            alpha in 0.01f64..1.0,
            seeds in 1usize..=10,
        ) {
            let graph = ring(20);
            let params = SirParams::new(0.0, alpha).unwrap().with_max_steps(10_000);
            let mut rng = rng(seed);

            let outcome = Epidemic::initialize(&graph, params, seeds, &mut rng)
                .unwrap()
                .run(&mut rng)
                .unwrap();

            prop_assert!(outcome.is_converged());
            for counts in &outcome.run().history {
                prop_assert_eq!(counts.susceptible, 20 - seeds);
                prop_assert_eq!(counts.infected + counts.removed, seeds);
            }
            prop_assert_eq!(outcome.run().summary().total_infected, seeds);
        }

        #[test]
        fn certain_removal_keeps_nobody_infected_for_two_steps(seed in any::<u64>()) {
            let graph = ring(12);
            let params = SirParams::new(0.7, 1.0).unwrap();
            let mut rng = rng(seed);
            let mut epidemic = Epidemic::initialize(&graph, params, 2, &mut rng).unwrap();

            let mut infected_before: BTreeSet<NodeId> =
                epidemic.initially_infected().iter().copied().collect();
            while !infected_before.is_empty() {
                epidemic.step(&mut rng).unwrap();
                for node in &infected_before {
                    prop_assert_eq!(epidemic.state(*node), Some(NodeState::Removed));
                }
                infected_before = graph
                    .nodes()
                    .filter(|node| epidemic.state(*node) == Some(NodeState::Infected))
                    .collect();
            }
        }
    }
}
