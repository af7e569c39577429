/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Cohorts of worker threads in the same process.

use crate::algo::relax::EngineError;
use crate::collective::local::LocalCoordinator;
use crate::collective::{Collective, CollectiveError};
use crate::graphs::load::ArcPolicy;
use crate::graphs::weighted_graph::WeightedGraph;
use crate::report::Report;
use crate::worker::{run_worker, Job, WorkerOutcome, ROOT};
use anyhow::{anyhow, ensure, Context, Result};
use dsi_progress_logger::{ProgressLog, ProgressLogger};
use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

/// The outcomes of all workers of a cohort, in rank order.
#[derive(Debug, Clone)]
pub struct CohortOutcome {
    pub workers: Vec<WorkerOutcome>,
}

impl CohortOutcome {
    /// Returns the report assembled by the root.
    pub fn report(&self) -> Option<&Report> {
        self.workers.get(ROOT).and_then(|w| w.report.as_ref())
    }

    /// Returns the final distances (identical on all workers).
    pub fn distances(&self) -> &[f64] {
        self.workers
            .first()
            .map(|w| w.distances.as_slice())
            .unwrap_or(&[])
    }
}

/// Runs `P` workers as threads connected by a [`LocalCoordinator`].
///
/// Only the root worker logs its progress.
#[derive(Debug, Clone)]
pub struct LocalCohort {
    num_workers: usize,
    log_interval: Option<Duration>,
}

impl LocalCohort {
    pub fn new(num_workers: usize) -> Result<Self> {
        ensure!(num_workers > 0, "A cohort needs at least one worker");
        Ok(Self {
            num_workers,
            log_interval: None,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Sets the logging interval of the root's progress logger.
    pub fn log_interval(mut self, log_interval: Option<Duration>) -> Self {
        self.log_interval = log_interval;
        self
    }

    /// Runs `job` on a graph shared by all workers.
    pub fn run(&self, graph: &WeightedGraph, job: &Job) -> Result<CohortOutcome> {
        self.run_with(job, |_| Ok(Cow::Borrowed(graph)))
    }

    /// Runs `job` on a graph that every worker loads independently from
    /// `path`, as processes on different hosts would do.
    ///
    /// If a worker cannot load the graph, it aborts the cohort, and the
    /// returned error is the loading error.
    pub fn run_loading(
        &self,
        path: impl AsRef<Path>,
        policy: ArcPolicy,
        job: &Job,
    ) -> Result<CohortOutcome> {
        let path = path.as_ref();
        self.run_with(job, |rank| {
            let graph = WeightedGraph::load(path, policy).with_context(|| {
                format!("Worker {} could not load {}", rank, path.display())
            })?;
            Ok(Cow::Owned(graph))
        })
    }

    fn run_with<'g>(
        &self,
        job: &Job,
        obtain: impl Fn(usize) -> Result<Cow<'g, WeightedGraph>> + Sync,
    ) -> Result<CohortOutcome> {
        log::info!(
            "Starting a cohort of {} workers with {} partition",
            self.num_workers,
            job.partition.name()
        );
        let obtain = &obtain;
        let results: Vec<Result<WorkerOutcome>> = std::thread::scope(|s| {
            let handles = LocalCoordinator::cohort(self.num_workers)
                .into_iter()
                .map(|mut coordinator| {
                    let rank = coordinator.rank();
                    let handle = std::thread::Builder::new()
                        .name(format!("worker-{}", rank))
                        .spawn_scoped(s, move || -> Result<WorkerOutcome> {
                            let graph = match obtain(rank) {
                                Ok(graph) => graph,
                                Err(e) => {
                                    coordinator.abort(&format!("{:#}", e));
                                    return Err(e);
                                }
                            };
                            let mut pl: Option<ProgressLogger> = None;
                            if rank == ROOT {
                                let mut root_pl = ProgressLogger::default();
                                if let Some(log_interval) = self.log_interval {
                                    root_pl.log_interval(log_interval);
                                }
                                pl = Some(root_pl);
                            }
                            Ok(run_worker(&mut coordinator, &graph, job, &mut pl)?)
                        });
                    (rank, handle)
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|(rank, handle)| {
                    handle
                        .with_context(|| format!("Could not spawn worker {}", rank))?
                        .join()
                        .map_err(|_| anyhow!("Worker {} panicked", rank))?
                })
                .collect()
        });

        if results.iter().all(Result::is_ok) {
            return Ok(CohortOutcome {
                workers: results.into_iter().flatten().collect(),
            });
        }
        // Report the failure that caused the others
        let mut errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        let root_cause = errors
            .iter()
            .position(|e| !is_peer_failure(e))
            .unwrap_or(0);
        Err(errors.swap_remove(root_cause))
    }
}

/// Returns true if the error is a consequence of the failure of another
/// worker.
fn is_peer_failure(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<EngineError>()
            .is_some_and(EngineError::is_peer_failure)
            || cause
                .downcast_ref::<CollectiveError>()
                .is_some_and(CollectiveError::is_peer_failure)
    })
}
