//! Reading graphs and writing simulation results.
//!
//! Every format is line oriented. Histories are dumped as whitespace separated values, one
//! measure per line, and read back exactly: floats are printed in their shortest round-trip
//! form.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Lines, Write},
    ops::RangeInclusive,
    path::Path,
    str::FromStr,
};

use tracing::{debug, info};

use crate::{
    edge::Edge,
    error::{GraphError, IoError},
    graph::{Graph, NodeId},
    robustness::{RobustnessHistory, RobustnessSample},
    sir::{SirCounts, SirOutcome, SirRun},
};

/// Layout of an edge list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeListFormat {
    /// Skip the first line, as in Gephi exports.
    pub skip_header: bool,
    /// Field separator, any whitespace when `None`.
    pub delimiter: Option<char>,
}

impl EdgeListFormat {
    /// An edge list with a header line and whitespace separated ids.
    pub fn with_header() -> Self {
        Self {
            skip_header: true,
            delimiter: None,
        }
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self.delimiter {
            Some(delimiter) => line.split(delimiter).map(str::trim).collect(),
            None => line.split_whitespace().collect(),
        }
    }
}

/// Parses an edge list, one `source target` pair per line.
///
/// Blank lines and lines starting with `#` are skipped. Self-loops and repeated edges are
/// absorbed by the graph.
///
/// # Errors
///
/// Returns [`GraphError::MalformedEdge`] for a line that isn't two integer ids and
/// [`GraphError::EmptyEdgeList`] if no edge was read.
///
/// # Examples
///
/// ```
/// use fragility::io::{parse_edge_list, EdgeListFormat};
///
/// let input = "Source Target\n1 2\n\n2 3\n";
/// let graph = parse_edge_list(input.as_bytes(), &EdgeListFormat::with_header()).unwrap();
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
pub fn parse_edge_list<R: BufRead>(reader: R, format: &EdgeListFormat) -> Result<Graph, IoError> {
    let mut edges = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if format.skip_header && number == 0 {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = || GraphError::MalformedEdge {
            line: number + 1,
            content: trimmed.to_owned(),
        };

        let fields = format.split(trimmed);
        let [source, target] = fields.as_slice() else {
            return Err(malformed().into());
        };
        let source: NodeId = source.parse().map_err(|_| malformed())?;
        let target: NodeId = target.parse().map_err(|_| malformed())?;

        edges.push(Edge::new(source, target));
    }

    debug!(edges = edges.len(), "parsed edge list");

    Ok(Graph::from_edges(edges)?)
}

/// Reads an edge list from a file, see [`parse_edge_list`].
pub fn read_edge_list(path: impl AsRef<Path>, format: &EdgeListFormat) -> Result<Graph, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from(e).with_path(path))?;

    parse_edge_list(BufReader::new(file), format).map_err(|e| e.with_path(path))
}

/// A user to repository membership graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BipartiteEdges {
    /// User ids, as read.
    pub users: BTreeSet<NodeId>,
    /// Repository ids after renumbering.
    pub repos: BTreeSet<NodeId>,
    pub edges: Vec<Edge>,
}

impl BipartiteEdges {
    /// Builds the graph spanning both partitions.
    pub fn graph(&self) -> Result<Graph, GraphError> {
        Graph::from_edges(self.edges.iter().copied())
    }

    /// Builds the graph, then keeps only the users and repositories whose degree lies in their
    /// band and returns the subgraph they induce.
    ///
    /// Degrees are taken in the full graph, so a kept node may end up with fewer edges (or
    /// none) once its neighbours outside the bands are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragility::io::{parse_bipartite, DegreeBands};
    ///
    /// // User 1 follows three repositories, user 2 only one.
    /// let parsed = parse_bipartite("1:1\n1:2\n1:3\n2:1\n".as_bytes(), ':').unwrap();
    /// let bands = DegreeBands { users: 2..=5, repos: 1..=2 };
    ///
    /// let reduced = parsed.reduce(&bands).unwrap();
    ///
    /// assert_eq!(reduced.node_count(), 4);
    /// assert_eq!(reduced.edge_count(), 3);
    /// ```
    pub fn reduce(&self, bands: &DegreeBands) -> Result<Graph, GraphError> {
        let graph = self.graph()?;

        let in_band = |node: &NodeId, band: &RangeInclusive<usize>| {
            graph
                .degree(*node)
                .map_or(false, |degree| band.contains(&degree))
        };
        let kept: Vec<NodeId> = self
            .users
            .iter()
            .filter(|user| in_band(user, &bands.users))
            .chain(self.repos.iter().filter(|repo| in_band(repo, &bands.repos)))
            .copied()
            .collect();

        let reduced = graph.subgraph(kept);
        info!(
            nodes = reduced.node_count(),
            edges = reduced.edge_count(),
            "reduced membership graph to degree bands"
        );
        Ok(reduced)
    }
}

/// Inclusive degree ranges a user or repository must fall in to survive
/// [`BipartiteEdges::reduce`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DegreeBands {
    pub users: RangeInclusive<usize>,
    pub repos: RangeInclusive<usize>,
}

impl Default for DegreeBands {
    /// Users with 5 to 50 repositories, repositories with 5 to 100 users.
    fn default() -> Self {
        Self {
            users: 5..=50,
            repos: 5..=100,
        }
    }
}

/// Parses `user<separator>repo` lines into a bipartite edge set.
///
/// Users and repositories are numbered independently in the input, so repositories are
/// renumbered in ascending order starting right after the largest user id. Blank lines are
/// skipped.
///
/// # Examples
///
/// ```
/// use fragility::io::parse_bipartite;
///
/// let parsed = parse_bipartite("1:1\n2:1\n2:7\n".as_bytes(), ':').unwrap();
///
/// assert_eq!(parsed.users.len(), 2);
/// // Repositories 1 and 7 become 3 and 4.
/// assert_eq!(parsed.repos.iter().copied().collect::<Vec<_>>(), vec![3, 4]);
/// ```
pub fn parse_bipartite<R: BufRead>(reader: R, separator: char) -> Result<BipartiteEdges, IoError> {
    // (line number, user, repo)
    let mut pairs: Vec<(usize, NodeId, NodeId)> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let malformed = || GraphError::MalformedEdge {
            line: number + 1,
            content: trimmed.to_owned(),
        };

        let (user, repo) = trimmed.split_once(separator).ok_or_else(malformed)?;
        let user: NodeId = user.trim().parse().map_err(|_| malformed())?;
        let repo: NodeId = repo.trim().parse().map_err(|_| malformed())?;
        pairs.push((number + 1, user, repo));
    }

    let users: BTreeSet<NodeId> = pairs.iter().map(|(_, user, _)| *user).collect();
    let repos: BTreeSet<NodeId> = pairs.iter().map(|(_, _, repo)| *repo).collect();

    // Renumbered ids must fit after the largest user id.
    let first = match users.last() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    };
    let mut renumbered: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for (position, repo) in repos.iter().enumerate() {
        let id = first
            .and_then(|first| first.checked_add(position as NodeId))
            .ok_or_else(|| id_overflow(&pairs, separator, *repo))?;
        renumbered.insert(*repo, id);
    }

    let edges = pairs
        .iter()
        .map(|(_, user, repo)| Edge::new(*user, renumbered[repo]))
        .collect();

    Ok(BipartiteEdges {
        users,
        repos: renumbered.into_values().collect(),
        edges,
    })
}

/// Writes every edge of the graph on its own line, smallest endpoint first.
pub fn write_edge_list<W: Write>(mut writer: W, graph: &Graph) -> Result<(), IoError> {
    for edge in graph.edges() {
        let (source, target) = edge.endpoints();
        writeln!(writer, "{source} {target}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes robustness histories, five lines per run: the run index, then the iterations,
/// diameters, average path lengths and giant component fractions.
pub fn write_robustness_history<W: Write>(
    mut writer: W,
    histories: &[RobustnessHistory],
) -> Result<(), IoError> {
    for (run, history) in histories.iter().enumerate() {
        writeln!(writer, "{run}")?;
        write_values(&mut writer, history.iter().map(|s| s.iteration))?;
        write_values(&mut writer, history.iter().map(|s| s.diameter))?;
        write_values(&mut writer, history.iter().map(|s| s.average_path_length))?;
        write_values(&mut writer, history.iter().map(|s| s.giant_component_fraction))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads histories written by [`write_robustness_history`].
///
/// # Errors
///
/// Returns [`IoError::MalformedHistory`] on a truncated block, an unparsable value, measure
/// lines of different lengths, or runs out of order.
pub fn read_robustness_histories<R: BufRead>(reader: R) -> Result<Vec<RobustnessHistory>, IoError> {
    let mut lines = NumberedLines::new(reader);
    let mut histories = Vec::new();

    while let Some(header) = lines.next_non_empty()? {
        let run: usize = parse_value(lines.number, &header)?;
        if run != histories.len() {
            return Err(IoError::MalformedHistory {
                line: lines.number,
                reason: format!("expected run {}, found {run}", histories.len()),
            });
        }

        let iterations: Vec<usize> = lines.expect_values("iterations")?;
        let diameters: Vec<usize> = lines.expect_values("diameters")?;
        let paths: Vec<f64> = lines.expect_values("average path lengths")?;
        let fractions: Vec<f64> = lines.expect_values("giant component fractions")?;

        let len = iterations.len();
        if [diameters.len(), paths.len(), fractions.len()] != [len; 3] {
            return Err(IoError::MalformedHistory {
                line: lines.number,
                reason: format!("run {run} has measure lines of different lengths"),
            });
        }

        let history = (0..len)
            .map(|i| RobustnessSample {
                iteration: iterations[i],
                diameter: diameters[i],
                average_path_length: paths[i],
                giant_component_fraction: fractions[i],
            })
            .collect();
        histories.push(history);
    }

    Ok(histories)
}

/// Writes an epidemic run: the terminal time, the susceptible, infected and removed counts per
/// step, then the initially infected nodes.
pub fn write_sir_run<W: Write>(mut writer: W, run: &SirRun) -> Result<(), IoError> {
    writeln!(writer, "{}", run.terminal_time)?;
    write_values(&mut writer, run.history.iter().map(|c| c.susceptible))?;
    write_values(&mut writer, run.history.iter().map(|c| c.infected))?;
    write_values(&mut writer, run.history.iter().map(|c| c.removed))?;
    write_values(&mut writer, run.initially_infected.iter())?;
    writer.flush()?;
    Ok(())
}

/// Reads a run written by [`write_sir_run`].
pub fn read_sir_run<R: BufRead>(reader: R) -> Result<SirRun, IoError> {
    let mut lines = NumberedLines::new(reader);

    let terminal_time = match lines.next_line()? {
        Some(line) => parse_value(lines.number, &line)?,
        None => {
            return Err(IoError::MalformedHistory {
                line: 1,
                reason: "missing terminal time".to_owned(),
            })
        }
    };

    let susceptible: Vec<usize> = lines.expect_values("susceptible counts")?;
    let infected: Vec<usize> = lines.expect_values("infected counts")?;
    let removed: Vec<usize> = lines.expect_values("removed counts")?;
    let initially_infected: Vec<NodeId> = lines.expect_values("initially infected nodes")?;

    if infected.len() != susceptible.len() || removed.len() != susceptible.len() {
        return Err(IoError::MalformedHistory {
            line: lines.number,
            reason: "count lines have different lengths".to_owned(),
        });
    }

    let history = susceptible
        .into_iter()
        .zip(infected)
        .zip(removed)
        .map(|((susceptible, infected), removed)| SirCounts {
            susceptible,
            infected,
            removed,
        })
        .collect();

    Ok(SirRun {
        history,
        terminal_time,
        initially_infected,
    })
}

/// Writes an epidemic outcome: a `converged` or `did-not-converge` status line followed by the
/// run in the [`write_sir_run`] layout.
pub fn write_sir_outcome<W: Write>(mut writer: W, outcome: &SirOutcome) -> Result<(), IoError> {
    let status = if outcome.is_converged() {
        CONVERGED
    } else {
        NOT_CONVERGED
    };
    writeln!(writer, "{status}")?;
    write_sir_run(writer, outcome.run())
}

/// Reads an outcome written by [`write_sir_outcome`].
///
/// # Errors
///
/// Returns [`IoError::MalformedHistory`] for an unknown status line or a malformed run.
pub fn read_sir_outcome<R: BufRead>(mut reader: R) -> Result<SirOutcome, IoError> {
    let mut status = String::new();
    reader.read_line(&mut status)?;

    let converged = match status.trim() {
        CONVERGED => true,
        NOT_CONVERGED => false,
        other => {
            return Err(IoError::MalformedHistory {
                line: 1,
                reason: format!("unknown epidemic status `{other}`"),
            })
        }
    };

    let run = read_sir_run(reader).map_err(|err| match err {
        IoError::MalformedHistory { line, reason } => IoError::MalformedHistory {
            line: line + 1,
            reason,
        },
        other => other,
    })?;

    Ok(if converged {
        SirOutcome::Converged(run)
    } else {
        SirOutcome::DidNotConverge(run)
    })
}

/// Creates `path` and hands a buffered writer to `write`, attaching the path to any error.
pub fn write_file<F>(path: impl AsRef<Path>, write: F) -> Result<(), IoError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), IoError>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::from(e).with_path(path))?;
    let mut writer = BufWriter::new(file);

    write(&mut writer).map_err(|e| e.with_path(path))
}

//
// Helpers
//

const CONVERGED: &str = "converged";
const NOT_CONVERGED: &str = "did-not-converge";

/// Points at the first line mentioning `repo` when its renumbered id would overflow.
fn id_overflow(pairs: &[(usize, NodeId, NodeId)], separator: char, repo: NodeId) -> GraphError {
    let (line, user) = pairs
        .iter()
        .find(|(_, _, candidate)| *candidate == repo)
        .map_or((0, 0), |(line, user, _)| (*line, *user));

    GraphError::MalformedEdge {
        line,
        content: format!("{user}{separator}{repo}"),
    }
}

fn write_values<W, I>(writer: &mut W, values: I) -> Result<(), IoError>
where
    W: Write,
    I: IntoIterator,
    I::Item: Display,
{
    let mut first = true;
    for value in values {
        if !first {
            write!(writer, " ")?;
        }
        write!(writer, "{value}")?;
        first = false;
    }
    writeln!(writer)?;
    Ok(())
}

fn parse_value<T: FromStr>(line: usize, token: &str) -> Result<T, IoError> {
    token.trim().parse().map_err(|_| IoError::MalformedHistory {
        line,
        reason: format!("cannot parse `{}`", token.trim()),
    })
}

/// Line reader that remembers the one-based number of the last line handed out.
struct NumberedLines<R> {
    lines: Lines<R>,
    number: usize,
}

impl<R: BufRead> NumberedLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            number: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, IoError> {
        match self.lines.next() {
            Some(line) => {
                self.number += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    fn next_non_empty(&mut self) -> Result<Option<String>, IoError> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn expect_values<T: FromStr>(&mut self, what: &str) -> Result<Vec<T>, IoError> {
        let Some(line) = self.next_line()? else {
            return Err(IoError::MalformedHistory {
                line: self.number + 1,
                reason: format!("missing {what}"),
            });
        };

        line.split_whitespace()
            .map(|token| parse_value(self.number, token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! graph {
        ($(($a:expr, $b:expr)),* $(,)?) => {
            Graph::from_edges([$(($a, $b)),*]).unwrap()
        };
    }

    #[test]
    fn edge_list_with_header_and_blank_lines() {
        let input = "Source Target\n1 2\n\n  2 3  \n# comment\n3 1\n";

        let graph = parse_edge_list(input.as_bytes(), &EdgeListFormat::with_header()).unwrap();

        assert_eq!(graph, graph![(1, 2), (2, 3), (3, 1)]);
    }

    #[test]
    fn edge_list_with_tabs() {
        let format = EdgeListFormat {
            skip_header: false,
            delimiter: Some('\t'),
        };

        let graph = parse_edge_list("4\t5\n5\t6\n".as_bytes(), &format).unwrap();

        assert_eq!(graph, graph![(4, 5), (5, 6)]);
    }

    #[test]
    fn header_is_not_parsed_as_edge() {
        let err = parse_edge_list("a b\n1 2\n".as_bytes(), &EdgeListFormat::default()).unwrap_err();

        assert!(matches!(
            err,
            IoError::Graph(GraphError::MalformedEdge { line: 1, ref content }) if content == "a b"
        ));
    }

    #[test]
    fn malformed_line_is_reported_with_its_number() {
        let input = "1 2\n2 3\n3\n";

        let err = parse_edge_list(input.as_bytes(), &EdgeListFormat::default()).unwrap_err();

        assert!(matches!(
            err,
            IoError::Graph(GraphError::MalformedEdge { line: 3, .. })
        ));
    }

    #[test]
    fn blank_input_is_an_empty_edge_list() {
        let err = parse_edge_list("\n\n".as_bytes(), &EdgeListFormat::default()).unwrap_err();

        assert!(matches!(err, IoError::Graph(GraphError::EmptyEdgeList)));
    }

    #[test]
    fn self_loops_keep_the_node() {
        let graph = parse_edge_list("1 1\n1 2\n".as_bytes(), &EdgeListFormat::default()).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn bipartite_partitions_never_collide() {
        let input = "1:1\n2:1\n3:2\n3:1\n";

        let parsed = parse_bipartite(input.as_bytes(), ':').unwrap();

        assert_eq!(parsed.users, BTreeSet::from([1, 2, 3]));
        assert_eq!(parsed.repos, BTreeSet::from([4, 5]));
        assert!(parsed.users.is_disjoint(&parsed.repos));
        assert_eq!(
            parsed.edges,
            vec![
                Edge::new(1, 4),
                Edge::new(2, 4),
                Edge::new(3, 5),
                Edge::new(3, 4)
            ]
        );
        assert_eq!(parsed.graph().unwrap().node_count(), 5);
    }

    #[test]
    fn bipartite_without_separator() {
        let err = parse_bipartite("1:2\n3 4\n".as_bytes(), ':').unwrap_err();

        assert!(matches!(
            err,
            IoError::Graph(GraphError::MalformedEdge { line: 2, .. })
        ));
    }

    #[test]
    fn bipartite_ids_near_the_top_of_the_range() {
        let input = format!("{}:1\n", NodeId::MAX);

        let err = parse_bipartite(input.as_bytes(), ':').unwrap_err();

        assert!(matches!(
            err,
            IoError::Graph(GraphError::MalformedEdge { line: 1, ref content })
                if *content == format!("{}:1", NodeId::MAX)
        ));
    }

    #[test]
    fn bipartite_renumbering_that_runs_past_the_range() {
        let input = format!("{}:1\n1:2\n1:3\n", NodeId::MAX - 2);

        let err = parse_bipartite(input.as_bytes(), ':').unwrap_err();

        assert!(matches!(
            err,
            IoError::Graph(GraphError::MalformedEdge { line: 3, .. })
        ));
    }

    #[test]
    fn bipartite_renumbering_that_just_fits() {
        let input = format!("{}:1\n1:2\n", NodeId::MAX - 2);

        let parsed = parse_bipartite(input.as_bytes(), ':').unwrap();

        assert_eq!(parsed.repos, BTreeSet::from([NodeId::MAX - 1, NodeId::MAX]));
    }

    /// Users 1..=3 each follow repos 1..=3; user 4 follows only repo 1; user 5 follows all
    /// four repos, repo 4 having no other member.
    fn memberships() -> BipartiteEdges {
        let input = "1:1\n1:2\n1:3\n2:1\n2:2\n2:3\n3:1\n3:2\n3:3\n4:1\n5:1\n5:2\n5:3\n5:4\n";
        parse_bipartite(input.as_bytes(), ':').unwrap()
    }

    #[test]
    fn reduce_keeps_nodes_inside_both_bands() {
        let parsed = memberships();
        let bands = DegreeBands {
            users: 2..=3,
            repos: 2..=4,
        };

        let reduced = parsed.reduce(&bands).unwrap();

        // Users 4 (degree 1) and 5 (degree 4) fall out, as does repo 4 (degree 1). Repo 1 has
        // five members and is also dropped.
        let repos: Vec<NodeId> = parsed.repos.iter().copied().collect();
        assert_eq!(
            reduced.nodes().collect::<Vec<_>>(),
            vec![1, 2, 3, repos[1], repos[2]]
        );
        assert_eq!(reduced.edge_count(), 6);
    }

    #[test]
    fn reduce_measures_degree_before_dropping() {
        let parsed = memberships();
        let bands = DegreeBands {
            users: 4..=4,
            repos: 1..=1,
        };

        let reduced = parsed.reduce(&bands).unwrap();

        // User 5 and repo 4 are linked and both qualify on their full-graph degree.
        assert_eq!(reduced.node_count(), 2);
        assert_eq!(reduced.edge_count(), 1);
    }

    #[test]
    fn default_bands() {
        let bands = DegreeBands::default();

        assert_eq!(bands.users, 5..=50);
        assert_eq!(bands.repos, 5..=100);
        // Only repo 1, with five members, is inside a default band.
        let reduced = memberships().reduce(&bands).unwrap();
        assert_eq!(reduced.node_count(), 1);
        assert_eq!(reduced.edge_count(), 0);
    }

    #[test]
    fn edge_list_round_trip() {
        let graph = graph![(1, 2), (2, 3), (9, 1)];
        let mut buf = Vec::new();

        write_edge_list(&mut buf, &graph).unwrap();

        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "1 2\n1 9\n2 3\n");
        assert_eq!(
            parse_edge_list(buf.as_slice(), &EdgeListFormat::default()).unwrap(),
            graph
        );
    }

    #[test]
    fn robustness_history_round_trip() {
        let sample = |iteration, diameter, average_path_length, giant_component_fraction| {
            RobustnessSample {
                iteration,
                diameter,
                average_path_length,
                giant_component_fraction,
            }
        };
        let histories = vec![
            vec![sample(0, 4, 2.1, 0.9), sample(2, 5, 7.0 / 3.0, 0.1 + 0.2)],
            vec![],
            vec![sample(0, 0, 0.0, 1.0 / 7.0)],
        ];
        let mut buf = Vec::new();

        write_robustness_history(&mut buf, &histories).unwrap();

        assert_eq!(read_robustness_histories(buf.as_slice()).unwrap(), histories);
    }

    #[test]
    fn robustness_history_layout() {
        let history = vec![RobustnessSample {
            iteration: 0,
            diameter: 3,
            average_path_length: 1.5,
            giant_component_fraction: 0.25,
        }];
        let mut buf = Vec::new();

        write_robustness_history(&mut buf, &[history]).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), "0\n0\n3\n1.5\n0.25\n");
    }

    #[test]
    fn truncated_robustness_history() {
        let err = read_robustness_histories("0\n0 1\n3 2\n".as_bytes()).unwrap_err();

        assert!(matches!(err, IoError::MalformedHistory { line: 4, .. }));
    }

    #[test]
    fn uneven_robustness_history() {
        let err = read_robustness_histories("0\n0 1\n3\n1.0 2.0\n1.0 0.5\n".as_bytes()).unwrap_err();

        assert!(matches!(err, IoError::MalformedHistory { .. }));
    }

    #[test]
    fn sir_run_round_trip() {
        let run = SirRun {
            history: vec![
                SirCounts {
                    susceptible: 8,
                    infected: 3,
                    removed: 1,
                },
                SirCounts {
                    susceptible: 8,
                    infected: 0,
                    removed: 4,
                },
            ],
            terminal_time: 2,
            initially_infected: vec![3, 11],
        };
        let mut buf = Vec::new();

        write_sir_run(&mut buf, &run).unwrap();

        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "2\n8 8\n3 0\n1 4\n3 11\n");
        assert_eq!(read_sir_run(buf.as_slice()).unwrap(), run);
    }

    #[test]
    fn empty_sir_run_round_trip() {
        let run = SirRun::default();
        let mut buf = Vec::new();

        write_sir_run(&mut buf, &run).unwrap();

        assert_eq!(read_sir_run(buf.as_slice()).unwrap(), run);
    }

    #[test]
    fn sir_outcome_keeps_its_status() {
        let run = SirRun {
            history: vec![SirCounts {
                susceptible: 1,
                infected: 2,
                removed: 0,
            }],
            terminal_time: 1,
            initially_infected: vec![4, 5],
        };
        let outcome = SirOutcome::DidNotConverge(run);
        let mut buf = Vec::new();

        write_sir_outcome(&mut buf, &outcome).unwrap();

        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "did-not-converge\n1\n1\n2\n0\n4 5\n"
        );
        assert_eq!(read_sir_outcome(buf.as_slice()).unwrap(), outcome);
    }

    #[test]
    fn sir_outcome_with_unknown_status() {
        let err = read_sir_outcome("finished\n0\n\n\n\n\n".as_bytes()).unwrap_err();

        assert!(matches!(err, IoError::MalformedHistory { line: 1, .. }));
    }

    #[test]
    fn sir_outcome_errors_count_the_status_line() {
        let err = read_sir_outcome("converged\n1\n3\nx\n0\n1\n".as_bytes()).unwrap_err();

        assert!(matches!(err, IoError::MalformedHistory { line: 4, .. }));
    }

    #[test]
    fn sir_run_with_bad_count() {
        let err = read_sir_run("1\n3\nx\n0\n1\n".as_bytes()).unwrap_err();

        assert!(matches!(err, IoError::MalformedHistory { line: 3, .. }));
    }

    #[test]
    fn files_carry_their_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = read_edge_list(&missing, &EdgeListFormat::default()).unwrap_err();

        match err {
            IoError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn write_file_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        let graph = graph![(1, 2), (2, 3)];

        write_file(&path, |writer| write_edge_list(writer, &graph)).unwrap();

        assert_eq!(
            read_edge_list(&path, &EdgeListFormat::default()).unwrap(),
            graph
        );
    }
}
