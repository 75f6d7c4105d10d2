//! Fragility is a small toolkit for stress-testing network topologies: how a graph falls apart
//! as nodes are removed, and how an epidemic spreads across it.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure which can be built
//! from [`Edge`](edge::Edge) instances or parsed from an edge list with [`io`]. Once
//! constructed, [`metrics`] and [`spectral`] measure it, the [`robustness`] simulator removes
//! nodes picked by a [`strategy`] and the [`sir`] simulator spreads an infection over it.
//!
//! ```rust
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! use fragility::{
//!     graph::Graph,
//!     metrics,
//!     robustness::{RobustnessConfig, RobustnessSimulator},
//!     sir::{Epidemic, SirParams},
//!     strategy::DegreeAttack,
//! };
//!
//! // A hub with four spokes, the spokes joined in pairs.
//! let graph = Graph::from_edges([(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (3, 4)]).unwrap();
//! assert_eq!(metrics::diameter_and_average_path_length(&graph, 2).0, 2);
//!
//! // Knocking out the hub splits the graph in two.
//! let simulator = RobustnessSimulator::new(RobustnessConfig::new(1, 1).unwrap());
//! let history = simulator.run(&graph, &mut DegreeAttack).unwrap();
//! assert_eq!(history[0].giant_component_fraction, 0.5);
//!
//! // An epidemic on the intact graph always dies out.
//! let mut rng = SmallRng::seed_from_u64(1);
//! let params = SirParams::new(0.3, 0.4).unwrap();
//! let outcome = Epidemic::initialize(&graph, params, 1, &mut rng)
//!     .unwrap()
//!     .run(&mut rng)
//!     .unwrap();
//! assert!(outcome.is_converged());
//! ```

mod betweenness;
pub mod cli;
pub mod config;
pub mod edge;
pub mod error;
pub mod generators;
pub mod graph;
pub mod io;
pub mod logging;
pub mod metrics;
mod paths;
pub mod robustness;
pub mod sir;
pub mod spectral;
pub mod strategy;
