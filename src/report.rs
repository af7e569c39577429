/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The human-readable summary of a run.
//!
//! The report is a sequence of `key: value` lines grouped in sections; keys
//! are stable, as benchmark scripts scrape them.

use crate::algo::relax::Termination;
use crate::algo::stats::RunSummary;
use crate::partition::Partition;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const RULE: &str = "===========================================";
const SEPARATOR: &str = "-------------------------------------------";

/// Everything the aggregation root knows at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub num_nodes: usize,
    pub num_arcs: u64,
    pub partition: Partition,
    pub num_workers: usize,
    /// The number of nodes owned by each rank.
    pub shares: Vec<usize>,
    pub source: usize,
    pub destination: usize,
    /// The distance of the destination, possibly [`f64::INFINITY`].
    pub distance: f64,
    /// A shortest path, if one could be reconstructed.
    pub path: Option<Vec<usize>>,
    pub termination: Termination,
    pub elapsed: Duration,
    pub summary: RunSummary,
}

impl Report {
    /// Returns whether the destination has been reached.
    pub fn found(&self) -> bool {
        self.distance < f64::INFINITY
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Distributed shortest paths (BSP model)")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Nodes: {}", self.num_nodes)?;
        writeln!(f, "  Edges: {}", self.num_arcs)?;
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "Parallel Configuration:")?;
        writeln!(f, "  Partitioning: {}", self.partition.name())?;
        writeln!(f, "  Processes: {}", self.num_workers)?;
        writeln!(
            f,
            "  Nodes per process: ~{}",
            self.num_nodes / self.num_workers.max(1)
        )?;
        for (rank, share) in self.shares.iter().enumerate() {
            writeln!(f, "  Rank {} nodes: {}", rank, share)?;
        }
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "Results:")?;
        writeln!(f, "  Source: {}", self.source)?;
        writeln!(f, "  Destination: {}", self.destination)?;
        if self.found() {
            writeln!(f, "  Distance: {}", self.distance)?;
        } else {
            writeln!(f, "  Distance: no path")?;
        }
        match &self.path {
            Some(path) => writeln!(f, "  Path: {}", path.iter().join(" -> "))?,
            None if self.found() => writeln!(f, "  Path: unavailable")?,
            None => writeln!(f, "  Path: none")?,
        }
        match self.termination {
            Termination::Converged => writeln!(f, "  Converged: yes")?,
            Termination::IterationLimitReached => {
                writeln!(f, "  Converged: no (iteration limit reached)")?
            }
        }
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "Performance:")?;
        writeln!(f, "  Execution time: {} ms", self.elapsed.as_millis())?;
        writeln!(f, "  Iterations: {}", self.summary.supersteps)?;
        writeln!(
            f,
            "  Productive supersteps: {}",
            self.summary.productive_supersteps
        )?;
        writeln!(
            f,
            "  Total edges relaxed: {}",
            self.summary.total_edges_relaxed
        )?;
        writeln!(f, "  Distance updates: {}", self.summary.total_local_updates)?;
        writeln!(f, "{}", RULE)
    }
}
