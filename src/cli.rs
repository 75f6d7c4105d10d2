//! Command-line interface orchestration.
//!
//! Each subcommand turns its arguments into a [`SimulationConfig`], loads or generates a graph
//! and hands both to the library. Results are rendered in the same line formats the
//! [`io`](crate::io) readers accept.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{field, info, instrument, warn, Span};

use crate::{
    config::{
        InputFormat, SimulationConfig, DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_INITIAL_INFECTED,
        DEFAULT_MEASURE_EVERY, DEFAULT_RUNS,
    },
    error::{GraphError, IoError, SimulationError},
    generators::{self, EXTENDED_LINK_PROBABILITY, EXTENDED_REWIRE_PROBABILITY},
    graph::{default_num_threads, Graph},
    io::{self, DegreeBands, EdgeListFormat},
    metrics,
    robustness::{RobustnessReport, RobustnessSimulator, RunAborted},
    sir::{Epidemic, SirOutcome},
    spectral,
    strategy::{BetweennessAttack, DegreeAttack, RandomFailure, Strategy},
};

const DEFAULT_BINS: usize = 10;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "fragility",
    about = "Stress-test a network: robustness under node removal and SIR epidemic spread."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print structural metrics of a graph.
    Stats(StatsCommand),
    /// Remove nodes one at a time and track how the graph falls apart.
    Robustness(RobustnessCommand),
    /// Spread an SIR epidemic over a graph.
    Sir(SirCommand),
    /// Generate a preferential attachment graph as an edge list.
    Generate(GenerateCommand),
}

/// Where and how to read the input graph.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Edge list to load.
    pub input: PathBuf,

    /// Skip the first line of the edge list.
    #[arg(long)]
    pub skip_header: bool,

    /// Field separator; any whitespace when omitted.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Read `user<SEP>repo` membership lines instead of an edge list.
    #[arg(long, value_name = "SEP", conflicts_with_all = ["skip_header", "delimiter"])]
    pub bipartite: Option<char>,

    /// Keep users with 5 to 50 repositories and repositories with 5 to 100 users.
    #[arg(long, requires = "bipartite")]
    pub reduce: bool,
}

impl InputArgs {
    fn format(&self) -> InputFormat {
        match self.bipartite {
            Some(separator) => InputFormat::Bipartite {
                separator,
                reduce: self.reduce.then(DegreeBands::default),
            },
            None => InputFormat::EdgeList(EdgeListFormat {
                skip_header: self.skip_header,
                delimiter: self.delimiter,
            }),
        }
    }
}

/// Options shared by every command producing output.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Write results here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Worker threads for the path metrics.
    #[arg(long, default_value_t = default_num_threads())]
    pub threads: usize,
}

/// Options accepted by the `stats` command.
#[derive(Debug, Args, Clone)]
pub struct StatsCommand {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Number of logarithmic bins for the degree distribution.
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Also compute the algebraic connectivity (dense eigendecomposition).
    #[arg(long)]
    pub spectral: bool,
}

/// Node selection policies exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Remove uniformly random nodes.
    Failure,
    /// Remove the highest degree node.
    Degree,
    /// Remove the highest betweenness node.
    Betweenness,
}

/// Options accepted by the `robustness` command.
#[derive(Debug, Args, Clone)]
pub struct RobustnessCommand {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[arg(long, value_enum, default_value_t = StrategyKind::Degree)]
    pub strategy: StrategyKind,

    /// Nodes to remove; 90% of the graph when omitted.
    #[arg(long)]
    pub nodes_to_remove: Option<usize>,

    /// Measure on every n-th removal.
    #[arg(long, default_value_t = DEFAULT_MEASURE_EVERY)]
    pub measure_every: usize,

    /// Independent runs; only random failure uses more than one.
    #[arg(long, default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options accepted by the `sir` command.
#[derive(Debug, Args, Clone)]
pub struct SirCommand {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Nodes infected at time zero.
    #[arg(long, default_value_t = DEFAULT_INITIAL_INFECTED)]
    pub initial_infected: usize,

    /// Per-edge infection probability.
    #[arg(long, default_value_t = DEFAULT_BETA)]
    pub beta: f64,

    /// Per-step removal probability.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Give up after this many steps.
    #[arg(long)]
    pub max_steps: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

/// Graph models offered by `generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// Every new node attaches `m` edges.
    BarabasiAlbert,
    /// New nodes, links between existing nodes and rewiring.
    Extended,
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Number of nodes.
    #[arg(long)]
    pub nodes: usize,

    /// Edges attached by every new node.
    #[arg(long, short = 'm', default_value_t = 2)]
    pub edges_per_node: usize,

    #[arg(long, value_enum, default_value_t = ModelKind::BarabasiAlbert)]
    pub model: ModelKind,

    /// Chance of linking existing nodes in a round of the extended model.
    #[arg(long, default_value_t = EXTENDED_LINK_PROBABILITY)]
    pub link_probability: f64,

    /// Chance of rewiring edges in a round of the extended model.
    #[arg(long, default_value_t = EXTENDED_REWIRE_PROBABILITY)]
    pub rewire_probability: f64,

    /// Write the edge list here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub seed: Option<u64>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Aborted(#[from] RunAborted),
}

/// Headline metrics printed by `stats`.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub average_degree: f64,
    pub average_clustering: f64,
    pub diameter: usize,
    pub average_path_length: f64,
    pub giant_component_fraction: f64,
    pub components: usize,
    pub algebraic_connectivity: Option<f64>,
    /// Log-binned degree distribution as `(degree, share of nodes)` points.
    pub degree_distribution: Vec<(f64, f64)>,
}

/// What a command produced.
#[derive(Clone, Debug)]
pub enum Report {
    Stats(GraphStats),
    Robustness(RobustnessReport),
    Sir(SirOutcome),
    Generated(Graph),
}

/// A report and where it should go.
#[derive(Clone, Debug)]
pub struct ExecutionSummary {
    pub report: Report,
    /// Destination file, stdout when `None`.
    pub output: Option<PathBuf>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
///
/// Returns [`CliError`] when loading the graph, validating the settings or running the
/// simulation fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Stats(command) => {
            span.record("command", "stats");
            run_stats(command)
        }
        Command::Robustness(command) => {
            span.record("command", "robustness");
            run_robustness(command)
        }
        Command::Sir(command) => {
            span.record("command", "sir");
            run_sir(command)
        }
        Command::Generate(command) => {
            span.record("command", "generate");
            run_generate(command)
        }
    }
}

#[instrument(name = "cli.stats", err, skip(command))]
fn run_stats(command: StatsCommand) -> Result<ExecutionSummary, CliError> {
    let config = config_for(&command.input, &command.output);
    config.validate()?;

    let graph = load_graph(&config)?;
    let (diameter, average_path_length) =
        metrics::diameter_and_average_path_length(&graph, config.threads);

    let nodes = graph.node_count() as f64;
    let degree_distribution = metrics::log_binning(&metrics::degree_histogram(&graph), command.bins)
        .into_iter()
        .map(|(degree, count)| (degree, count / nodes))
        .collect();

    let stats = GraphStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        density: graph.density(),
        average_degree: metrics::average_degree(&graph),
        average_clustering: metrics::average_clustering(&graph),
        diameter,
        average_path_length,
        giant_component_fraction: metrics::giant_component_fraction(&graph),
        components: graph.connected_components().len(),
        algebraic_connectivity: command
            .spectral
            .then(|| spectral::algebraic_connectivity(&graph)),
        degree_distribution,
    };
    info!(nodes = stats.nodes, edges = stats.edges, "stats computed");

    Ok(ExecutionSummary {
        report: Report::Stats(stats),
        output: config.output,
    })
}

#[instrument(name = "cli.robustness", err, skip(command), fields(strategy = ?command.strategy))]
fn run_robustness(command: RobustnessCommand) -> Result<ExecutionSummary, CliError> {
    let config = SimulationConfig {
        nodes_to_remove: command.nodes_to_remove,
        measure_every: command.measure_every,
        runs: command.runs,
        seed: command.seed,
        ..config_for(&command.input, &command.output)
    };
    config.validate()?;

    let graph = load_graph(&config)?;
    let simulator = RobustnessSimulator::new(config.robustness_config(graph.node_count())?);

    let (name, histories) = match command.strategy {
        StrategyKind::Failure => {
            let histories = simulator
                .run_repeated(&graph, config.runs, |run| RandomFailure::new(config.rng(run)))?;
            ("failure", histories)
        }
        StrategyKind::Degree => {
            let mut attack = DegreeAttack;
            (attack.name(), vec![simulator.run(&graph, &mut attack)?])
        }
        StrategyKind::Betweenness => {
            let mut attack = BetweennessAttack::new(config.threads);
            (attack.name(), vec![simulator.run(&graph, &mut attack)?])
        }
    };

    let report = RobustnessReport::new(name, histories);
    if let Some(last) = report.aggregate().last() {
        info!(
            iteration = last.iteration,
            diameter = last.diameter.mean,
            giant_component_fraction = last.giant_component_fraction.mean,
            "final measurement"
        );
    }

    Ok(ExecutionSummary {
        report: Report::Robustness(report),
        output: config.output,
    })
}

#[instrument(name = "cli.sir", err, skip(command))]
fn run_sir(command: SirCommand) -> Result<ExecutionSummary, CliError> {
    let config = SimulationConfig {
        initial_infected: command.initial_infected,
        beta: command.beta,
        alpha: command.alpha,
        max_steps: command.max_steps,
        seed: command.seed,
        ..config_for(&command.input, &command.output)
    };
    config.validate()?;

    let graph = load_graph(&config)?;
    let mut rng = config.rng(0);
    let outcome = Epidemic::initialize(&graph, config.sir_params()?, config.initial_infected, &mut rng)?
        .run(&mut rng)?;

    let summary = outcome.run().summary();
    if outcome.is_converged() {
        info!(
            terminal_time = outcome.run().terminal_time,
            peak_infected = summary.peak_infected,
            peak_time = summary.peak_time,
            total_infected = summary.total_infected,
            "epidemic finished"
        );
    } else {
        warn!(
            terminal_time = outcome.run().terminal_time,
            "epidemic still active when the step cap was reached"
        );
    }

    Ok(ExecutionSummary {
        report: Report::Sir(outcome),
        output: config.output,
    })
}

#[instrument(name = "cli.generate", err, skip(command), fields(model = ?command.model))]
fn run_generate(command: GenerateCommand) -> Result<ExecutionSummary, CliError> {
    let config = SimulationConfig {
        seed: command.seed,
        output: command.output,
        ..Default::default()
    };

    let mut rng = config.rng(0);
    let graph = match command.model {
        ModelKind::BarabasiAlbert => {
            generators::barabasi_albert(command.nodes, command.edges_per_node, &mut rng)?
        }
        ModelKind::Extended => generators::extended_barabasi_albert(
            command.nodes,
            command.edges_per_node,
            command.link_probability,
            command.rewire_probability,
            &mut rng,
        )?,
    };

    Ok(ExecutionSummary {
        report: Report::Generated(graph),
        output: config.output,
    })
}

/// Renders `report` to `writer`.
///
/// Robustness histories, epidemic outcomes and generated graphs use the [`io`] formats; stats
/// are printed as `key: value` lines.
pub fn render_report(report: &Report, mut writer: impl Write) -> Result<(), IoError> {
    match report {
        Report::Stats(stats) => {
            writeln!(writer, "nodes: {}", stats.nodes)?;
            writeln!(writer, "edges: {}", stats.edges)?;
            writeln!(writer, "density: {}", stats.density)?;
            writeln!(writer, "average degree: {}", stats.average_degree)?;
            writeln!(writer, "average clustering: {}", stats.average_clustering)?;
            writeln!(writer, "diameter: {}", stats.diameter)?;
            writeln!(writer, "average path length: {}", stats.average_path_length)?;
            writeln!(writer, "giant component fraction: {}", stats.giant_component_fraction)?;
            writeln!(writer, "components: {}", stats.components)?;
            if let Some(connectivity) = stats.algebraic_connectivity {
                writeln!(writer, "algebraic connectivity: {connectivity}")?;
            }
            for (degree, share) in &stats.degree_distribution {
                writeln!(writer, "degree {degree}\t{share}")?;
            }
            writer.flush()?;
            Ok(())
        }
        Report::Robustness(report) => io::write_robustness_history(writer, &report.histories),
        Report::Sir(outcome) => io::write_sir_outcome(writer, outcome),
        Report::Generated(graph) => io::write_edge_list(writer, graph),
    }
}

//
// Helpers
//

fn config_for(input: &InputArgs, output: &OutputArgs) -> SimulationConfig {
    SimulationConfig {
        input: input.input.clone(),
        input_format: input.format(),
        output: output.output.clone(),
        threads: output.threads,
        ..Default::default()
    }
}

#[instrument(name = "cli.load_graph", err, skip(config), fields(path = %config.input.display()))]
fn load_graph(config: &SimulationConfig) -> Result<Graph, CliError> {
    let path = &config.input;
    let graph = match &config.input_format {
        InputFormat::EdgeList(format) => io::read_edge_list(path, format)?,
        InputFormat::Bipartite { separator, reduce } => {
            read_bipartite(path, *separator, reduce.as_ref())?
        }
    };
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

fn read_bipartite(
    path: &Path,
    separator: char,
    reduce: Option<&DegreeBands>,
) -> Result<Graph, CliError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::from(e).with_path(path))?;
    let parsed = io::parse_bipartite(std::io::BufReader::new(file), separator)
        .map_err(|e| e.with_path(path))?;
    info!(
        users = parsed.users.len(),
        repos = parsed.repos.len(),
        "bipartite membership loaded"
    );

    Ok(match reduce {
        Some(bands) => parsed.reduce(bands)?,
        None => parsed.graph()?,
    })
}
