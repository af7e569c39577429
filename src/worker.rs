/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The life of a single worker.

use crate::algo::path::reconstruct;
use crate::algo::relax::{EngineError, RelaxationEngineBuilder, Termination};
use crate::algo::stats::{aggregate, WorkerStats};
use crate::collective::Collective;
use crate::graphs::weighted_graph::WeightedGraph;
use crate::partition::Partition;
use crate::report::Report;
use dsi_progress_logger::ProgressLog;
use std::time::{Duration, Instant};

/// The rank that aggregates statistics and assembles the report.
pub const ROOT: usize = 0;

/// What a cohort has to compute; every worker gets the same job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: usize,
    pub destination: usize,
    pub partition: Partition,
    /// The maximum number of supersteps; [`None`] means the number of nodes.
    pub max_supersteps: Option<usize>,
}

impl Job {
    pub fn new(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination,
            partition: Partition::default(),
            max_supersteps: None,
        }
    }

    pub fn partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub fn max_supersteps(mut self, max_supersteps: Option<usize>) -> Self {
        self.max_supersteps = max_supersteps;
        self
    }

    /// Checks that source and destination are nodes of `graph`.
    pub fn validate(&self, graph: &WeightedGraph) -> Result<(), EngineError> {
        let num_nodes = graph.num_nodes();
        for node in [self.source, self.destination] {
            if node >= num_nodes {
                return Err(EngineError::NodeOutOfRange { node, num_nodes });
            }
        }
        Ok(())
    }
}

/// What a worker knows at the end of a run.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub rank: usize,
    /// The final distances, identical on all workers.
    pub distances: Vec<f64>,
    pub termination: Termination,
    pub stats: WorkerStats,
    pub productive_supersteps: u64,
    /// The time spent relaxing, measured from the initial barrier.
    pub elapsed: Duration,
    /// The report, available only on [`ROOT`].
    pub report: Option<Report>,
}

/// Runs one worker of a cohort.
///
/// The worker validates the job, waits for all other workers, relaxes
/// distances until convergence or until the maximum number of supersteps,
/// and reduces its statistics to [`ROOT`], which also reconstructs a path to
/// the destination and assembles the [`Report`].
///
/// If the job is invalid the worker aborts the cohort.
pub fn run_worker<C: Collective>(
    coordinator: &mut C,
    graph: &WeightedGraph,
    job: &Job,
    pl: &mut impl ProgressLog,
) -> Result<WorkerOutcome, EngineError> {
    let rank = coordinator.rank();
    let num_workers = coordinator.num_workers();
    if let Err(e) = job.validate(graph) {
        coordinator.abort(&e.to_string());
        return Err(e);
    }

    coordinator.barrier()?;
    let start = Instant::now();

    let mut engine = RelaxationEngineBuilder::new(graph, &mut *coordinator)
        .partition(job.partition)
        .max_supersteps(job.max_supersteps)
        .build(job.source)?;
    let termination = engine.run(pl)?;
    let stats = *engine.stats();
    let productive_supersteps = engine.productive_supersteps();
    let distances = engine.into_distances().into_vec();

    let elapsed = start.elapsed();
    log::debug!(
        "Worker {}: {} supersteps, {} arcs relaxed, {} updates",
        rank,
        stats.supersteps,
        stats.edges_relaxed,
        stats.local_updates
    );

    let report = aggregate(coordinator, &stats, productive_supersteps, ROOT)?.map(|summary| {
        let num_nodes = graph.num_nodes();
        Report {
            num_nodes,
            num_arcs: graph.num_arcs(),
            partition: job.partition,
            num_workers,
            shares: (0..num_workers)
                .map(|r| job.partition.share(r, num_workers, num_nodes))
                .collect(),
            source: job.source,
            destination: job.destination,
            distance: distances[job.destination],
            path: reconstruct(graph, &distances, job.source, job.destination),
            termination,
            elapsed,
            summary,
        }
    });

    Ok(WorkerOutcome {
        rank,
        distances,
        termination,
        stats,
        productive_supersteps,
        elapsed,
        report,
    })
}
