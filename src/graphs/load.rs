/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Text format for weighted graphs.
//!
//! The first non-comment line contains the number of nodes and the number of
//! arcs; each of the following lines contains an arc as `src dst weight`,
//! with fields separated by whitespace. Empty lines and lines starting with
//! `#` are ignored.
//!
//! ```text
//! 3 2
//! 0 1 1.5
//! 1 2 0.25
//! ```

use super::weighted_graph::{GraphError, WeightedGraph, WeightedGraphBuilder};
use std::collections::TryReserveError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What to do with arcs having an endpoint out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ArcPolicy {
    /// Fail loading with [`LoadError::OutOfRangeEdge`].
    #[default]
    Reject,
    /// Skip the arc and log a warning with the number of skipped arcs.
    Drop,
}

/// Errors raised while loading a graph.
///
/// Every variant is fatal: no partially loaded graph is ever returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read graph file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading line {line}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing header line with the number of nodes and arcs")]
    MissingHeader,
    #[error("Line {line}: malformed header {content:?} (expected \"<nodes> <arcs>\")")]
    MalformedHeader { line: usize, content: String },
    #[error("Line {line}: cannot allocate a graph with {num_nodes} nodes")]
    TooManyNodes {
        line: usize,
        num_nodes: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("Line {line}: malformed arc {content:?} (expected \"<src> <dst> <weight>\")")]
    MalformedArc { line: usize, content: String },
    #[error("Line {line}: weight {weight} is not a finite non-negative number")]
    InvalidWeight { line: usize, weight: f64 },
    #[error("Line {line}: arc ({src}, {dst}) is out of range (the graph has {num_nodes} nodes)")]
    OutOfRangeEdge {
        line: usize,
        src: usize,
        dst: usize,
        num_nodes: usize,
    },
    #[error("The header announces {expected} arcs, but only {found} arc lines were found")]
    MissingArcs { expected: usize, found: usize },
}

/// Splits a line into exactly `N` whitespace-separated fields.
fn fields<const N: usize>(line: &str) -> Option<[&str; N]> {
    let mut iter = line.split_whitespace();
    let mut out = [""; N];
    for slot in out.iter_mut() {
        *slot = iter.next()?;
    }
    iter.next().is_none().then_some(out)
}

impl WeightedGraph {
    /// Loads a graph in text format from a file.
    pub fn load(path: impl AsRef<Path>, policy: ArcPolicy) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("Loading graph from {}", path.display());
        Self::from_reader(BufReader::new(file), policy)
    }

    /// Loads a graph in text format from a buffered reader.
    pub fn from_reader(reader: impl BufRead, policy: ArcPolicy) -> Result<Self, LoadError> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| {
                line.as_ref()
                    .map(|l| {
                        let l = l.trim();
                        !l.is_empty() && !l.starts_with('#')
                    })
                    .unwrap_or(true)
            });

        let (line_num, header) = lines.next().ok_or(LoadError::MissingHeader)?;
        let header = header.map_err(|source| LoadError::Read {
            line: line_num,
            source,
        })?;
        let malformed_header = || LoadError::MalformedHeader {
            line: line_num,
            content: header.clone(),
        };
        let [n, m] = fields::<2>(&header).ok_or_else(malformed_header)?;
        let num_nodes = n.parse::<usize>().map_err(|_| malformed_header())?;
        let num_arcs = m.parse::<usize>().map_err(|_| malformed_header())?;

        let mut builder =
            WeightedGraphBuilder::try_new(num_nodes).map_err(|source| LoadError::TooManyNodes {
                line: line_num,
                num_nodes,
                source,
            })?;
        let mut dropped = 0_usize;
        for found in 0..num_arcs {
            let (line_num, line) = lines.next().ok_or(LoadError::MissingArcs {
                expected: num_arcs,
                found,
            })?;
            let line = line.map_err(|source| LoadError::Read {
                line: line_num,
                source,
            })?;
            let malformed = || LoadError::MalformedArc {
                line: line_num,
                content: line.clone(),
            };
            let [src, dst, weight] = fields::<3>(&line).ok_or_else(malformed)?;
            let src = src.parse::<usize>().map_err(|_| malformed())?;
            let dst = dst.parse::<usize>().map_err(|_| malformed())?;
            let weight = weight.parse::<f64>().map_err(|_| malformed())?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(LoadError::InvalidWeight {
                    line: line_num,
                    weight,
                });
            }

            match builder.add_arc(src, dst, weight) {
                Ok(()) => {}
                Err(GraphError::OutOfRangeEdge { .. }) if policy == ArcPolicy::Drop => {
                    dropped += 1;
                }
                Err(_) => {
                    return Err(LoadError::OutOfRangeEdge {
                        line: line_num,
                        src,
                        dst,
                        num_nodes,
                    })
                }
            }
        }

        if dropped > 0 {
            log::warn!(
                "Dropped {} of {} arcs with an endpoint out of range",
                dropped,
                num_arcs
            );
        }
        if let Some((line_num, _)) = lines.next() {
            log::warn!(
                "Ignoring content after the {} announced arcs, starting at line {}",
                num_arcs,
                line_num
            );
        }

        let graph = builder.build();
        log::debug!(
            "Loaded graph with {} nodes and {} arcs",
            graph.num_nodes(),
            graph.num_arcs()
        );
        Ok(graph)
    }

    /// Stores the graph in text format into a file.
    ///
    /// Coordinates are not part of the format and are not stored.
    pub fn store(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    /// Writes the graph in text format.
    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        writeln!(writer, "{} {}", self.num_nodes(), self.num_arcs())?;
        for (src, dst, weight) in self.iter_arcs() {
            writeln!(writer, "{} {} {}", src, dst, weight)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str, policy: ArcPolicy) -> Result<WeightedGraph, LoadError> {
        WeightedGraph::from_reader(Cursor::new(text), policy)
    }

    #[test]
    fn test_parse() -> anyhow::Result<()> {
        let g = parse("# a comment\n3 3\n0 1 1.5\n\n1 2 0.25\n2 0 4\n", ArcPolicy::Reject)?;
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_arcs(), 3);
        assert_eq!(g.successors(1)[0].weight, 0.25);
        Ok(())
    }

    #[test]
    fn test_out_of_range() {
        let text = "2 2\n0 1 1.0\n1 5 1.0\n";
        match parse(text, ArcPolicy::Reject) {
            Err(LoadError::OutOfRangeEdge {
                line: 3,
                src: 1,
                dst: 5,
                num_nodes: 2,
            }) => {}
            other => panic!("Unexpected result {:?}", other),
        }
        let g = parse(text, ArcPolicy::Drop).unwrap();
        assert_eq!(g.num_arcs(), 1);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse("", ArcPolicy::Reject),
            Err(LoadError::MissingHeader)
        ));
        assert!(matches!(
            parse("3\n", ArcPolicy::Reject),
            Err(LoadError::MalformedHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse("3 x\n", ArcPolicy::Reject),
            Err(LoadError::MalformedHeader { .. })
        ));
        assert!(matches!(
            parse("18446744073709551615 0\n", ArcPolicy::Reject),
            Err(LoadError::TooManyNodes { line: 1, .. })
        ));
        assert!(matches!(
            parse("3 1\n0 1\n", ArcPolicy::Reject),
            Err(LoadError::MalformedArc { line: 2, .. })
        ));
        assert!(matches!(
            parse("3 2\n0 1 1.0\n", ArcPolicy::Reject),
            Err(LoadError::MissingArcs {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse("3 1\n0 1 -1.0\n", ArcPolicy::Reject),
            Err(LoadError::InvalidWeight { line: 2, .. })
        ));
        assert!(matches!(
            parse("3 1\n0 1 NaN\n", ArcPolicy::Reject),
            Err(LoadError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_store_load() -> anyhow::Result<()> {
        let g = WeightedGraph::from_edges(4, [(0, 1, 0.1), (1, 2, 2.0), (2, 3, 1e-3)])?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("graph.txt");
        g.store(&path)?;
        let h = WeightedGraph::load(&path, ArcPolicy::Reject)?;
        assert_eq!(g, h);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            WeightedGraph::load("/nonexistent/graph.txt", ArcPolicy::Reject),
            Err(LoadError::Io { .. })
        ));
    }
}
