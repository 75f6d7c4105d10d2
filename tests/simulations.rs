use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

use fragility::{
    generators,
    graph::Graph,
    io,
    robustness::{aggregate, RobustnessConfig, RobustnessSimulator},
    sir::{Epidemic, SirParams},
    strategy::{BetweennessAttack, DegreeAttack, RandomFailure},
};

fn scale_free(seed: u64) -> Graph {
    generators::barabasi_albert(120, 2, &mut SmallRng::seed_from_u64(seed)).unwrap()
}

#[test]
fn attacks_hurt_more_than_failures() {
    let graph = scale_free(3);
    let config = RobustnessConfig::new(25, 24).unwrap().with_threads(2);
    let simulator = RobustnessSimulator::new(config);

    let attacked = simulator.run(&graph, &mut DegreeAttack).unwrap();
    let failures = simulator
        .run_repeated(&graph, 5, |run| {
            RandomFailure::new(SmallRng::seed_from_u64(run as u64))
        })
        .unwrap();

    let attack_fraction = attacked[1].giant_component_fraction;
    let failure_fraction = aggregate(&failures)[1].giant_component_fraction.mean;

    assert!(attack_fraction <= failure_fraction);
}

#[test]
fn betweenness_attack_runs_to_budget() {
    let graph = scale_free(4);
    let config = RobustnessConfig::new(10, 5).unwrap().with_threads(2);

    let history = RobustnessSimulator::new(config)
        .run(&graph, &mut BetweennessAttack::new(2))
        .unwrap();

    let iterations: Vec<usize> = history.iter().map(|s| s.iteration).collect();
    assert_eq!(iterations, vec![0, 5]);
    assert!(history
        .iter()
        .all(|s| (0.0..=1.0).contains(&s.giant_component_fraction)));
}

#[test]
fn robustness_histories_survive_a_file() {
    let graph = scale_free(5);
    let config = RobustnessConfig::new(20, 4).unwrap().with_threads(2);
    let histories = RobustnessSimulator::new(config)
        .run_repeated(&graph, 3, |run| {
            RandomFailure::new(SmallRng::seed_from_u64(100 + run as u64))
        })
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fail_history.txt");
    io::write_file(&path, |writer| io::write_robustness_history(writer, &histories)).unwrap();

    let file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
    assert_eq!(io::read_robustness_histories(file).unwrap(), histories);
}

#[test]
fn sir_run_survives_a_file() {
    let graph = scale_free(6);
    let mut rng = SmallRng::seed_from_u64(8);
    let params = SirParams::new(0.6, 0.2).unwrap();
    let run = Epidemic::initialize(&graph, params, 10, &mut rng)
        .unwrap()
        .run(&mut rng)
        .unwrap()
        .into_run();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sir_history.txt");
    io::write_file(&path, |writer| io::write_sir_run(writer, &run)).unwrap();

    let file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
    assert_eq!(io::read_sir_run(file).unwrap(), run);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn epidemic_conserves_population(seed in any::<u64>(), beta in 0.0f64..=1.0) {
        let graph = scale_free(seed % 4);
        let params = SirParams::new(beta, 0.5).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);

        let run = Epidemic::initialize(&graph, params, 5, &mut rng)
            .unwrap()
            .run(&mut rng)
            .unwrap()
            .into_run();

        prop_assert_eq!(run.terminal_time, run.history.len());
        prop_assert!(run
            .history
            .iter()
            .all(|counts| counts.total() == graph.node_count()));
        prop_assert!(run.summary().total_infected >= run.initially_infected.len());
    }

    #[test]
    fn failure_history_has_one_sample_per_removal(seed in any::<u64>()) {
        let graph = scale_free(seed % 4);
        let config = RobustnessConfig::new(30, 1).unwrap().with_threads(1);
        let mut failure = RandomFailure::new(SmallRng::seed_from_u64(seed));

        let history = RobustnessSimulator::new(config)
            .run(&graph, &mut failure)
            .unwrap();

        prop_assert_eq!(history.len(), 30);
        prop_assert!(history
            .iter()
            .all(|s| (0.0..=1.0).contains(&s.giant_component_fraction)));
    }
}
