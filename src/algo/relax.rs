/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bulk-synchronous relaxation of single-source distances.
//!
//! Every worker of a cohort holds a full replica of the graph and of the
//! distance vector, but relaxes only the outgoing arcs of the nodes it owns
//! according to a [`Partition`]. A superstep consists of
//!
//! 1. a local relaxation of the arcs of all owned nodes with a finite
//!    distance, improving the local distance vector in place;
//! 2. an element-wise-minimum all-reduce of the distance vector;
//! 3. a logical-or all-reduce of the flags telling whether a worker improved
//!    some distance.
//!
//! The computation converges when no worker improved anything. Since
//! distances only decrease and weights are non-negative, at most as many
//! supersteps as nodes are needed; the number of supersteps is however
//! capped, and reaching the cap is reported as
//! [`Termination::IterationLimitReached`].
//!
//! Because every worker folds the same contributions in the same order, the
//! distance vectors of all workers are bit-identical after every superstep.

use super::stats::WorkerStats;
use crate::collective::{Collective, CollectiveError};
use crate::graphs::weighted_graph::WeightedGraph;
use crate::partition::{boundary_nodes, Partition};
use dsi_progress_logger::ProgressLog;
use std::ops::Index;
use thiserror::Error;

/// Errors of the relaxation engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Node {node} is out of range for a graph with {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },
    #[error(transparent)]
    Collective(#[from] CollectiveError),
}

impl EngineError {
    /// Returns true if the error is the consequence of the failure of
    /// another worker.
    pub fn is_peer_failure(&self) -> bool {
        matches!(self, EngineError::Collective(e) if e.is_peer_failure())
    }
}

/// How a relaxation terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No worker improved a distance in the last superstep.
    Converged,
    /// The maximum number of supersteps was executed without convergence;
    /// distances are upper bounds of the actual distances.
    IterationLimitReached,
}

/// The state of a [`RelaxationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// The shared distance vector has not been initialized yet.
    Init,
    /// The given number of supersteps has been executed.
    Superstep(usize),
    /// The computation is over.
    Terminated(Termination),
}

/// A dense vector of tentative distances.
///
/// Unreached nodes have distance [`f64::INFINITY`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceState(Vec<f64>);

impl DistanceState {
    /// Returns a state in which all nodes are unreached.
    pub fn new(num_nodes: usize) -> Self {
        Self(vec![f64::INFINITY; num_nodes])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_reached(&self, node: usize) -> bool {
        self.0[node] < f64::INFINITY
    }

    /// Sets the distance of `node` to `candidate` if `candidate` is strictly
    /// smaller, returning whether the distance changed.
    #[inline(always)]
    pub fn improve(&mut self, node: usize, candidate: f64) -> bool {
        if candidate < self.0[node] {
            self.0[node] = candidate;
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Index<usize> for DistanceState {
    type Output = f64;

    #[inline(always)]
    fn index(&self, node: usize) -> &f64 {
        &self.0[node]
    }
}

impl AsRef<[f64]> for DistanceState {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// What happened in a superstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperstepOutcome {
    /// Whether some worker improved a distance.
    pub changed: bool,
    /// Arcs examined by this worker.
    pub edges_relaxed: u64,
    /// Improvements applied by this worker.
    pub local_updates: u64,
}

/// A builder for [`RelaxationEngine`].
///
/// All workers of a cohort must configure their builders identically, with
/// the exception of the coordinator.
#[derive(Debug)]
pub struct RelaxationEngineBuilder<'a, C: Collective> {
    graph: &'a WeightedGraph,
    coordinator: C,
    partition: Partition,
    max_supersteps: Option<usize>,
}

impl<'a, C: Collective> RelaxationEngineBuilder<'a, C> {
    pub fn new(graph: &'a WeightedGraph, coordinator: C) -> Self {
        Self {
            graph,
            coordinator,
            partition: Partition::default(),
            max_supersteps: None,
        }
    }

    /// Sets the partition policy (default: [`Partition::RoundRobin`]).
    pub fn partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    /// Sets the maximum number of supersteps; [`None`] (the default) means
    /// the number of nodes, which is always sufficient for convergence.
    pub fn max_supersteps(mut self, max_supersteps: Option<usize>) -> Self {
        self.max_supersteps = max_supersteps;
        self
    }

    /// Builds an engine computing distances from `source`.
    ///
    /// No collective is invoked until the engine is
    /// [initialized](RelaxationEngine::init).
    pub fn build(self, source: usize) -> Result<RelaxationEngine<'a, C>, EngineError> {
        let num_nodes = self.graph.num_nodes();
        if source >= num_nodes {
            return Err(EngineError::NodeOutOfRange {
                node: source,
                num_nodes,
            });
        }
        let rank = self.coordinator.rank();
        let num_workers = self.coordinator.num_workers();
        let owned = self.partition.assign(rank, num_workers, num_nodes);
        log::debug!(
            "Worker {} owns {} nodes, {} of which on the boundary",
            rank,
            owned.len(),
            boundary_nodes(self.graph, &owned, self.partition, rank, num_workers).len()
        );
        Ok(RelaxationEngine {
            graph: self.graph,
            coordinator: self.coordinator,
            partition: self.partition,
            source,
            owned,
            distances: DistanceState::new(num_nodes),
            stats: WorkerStats::default(),
            productive_supersteps: 0,
            max_supersteps: self.max_supersteps.unwrap_or(num_nodes),
            state: EngineState::Init,
        })
    }
}

/// One worker's replica of a bulk-synchronous relaxation.
///
/// Every worker of the cohort must call the same sequence of methods, as
/// each of them but the accessors runs collectives.
#[derive(Debug)]
pub struct RelaxationEngine<'a, C: Collective> {
    graph: &'a WeightedGraph,
    coordinator: C,
    partition: Partition,
    source: usize,
    owned: Vec<usize>,
    distances: DistanceState,
    stats: WorkerStats,
    productive_supersteps: u64,
    max_supersteps: usize,
    state: EngineState,
}

impl<C: Collective> RelaxationEngine<'_, C> {
    /// Establishes the shared initial state: only the owner of the source
    /// sets its distance to zero, and an all-reduce makes it visible to every
    /// worker.
    ///
    /// Does nothing if the engine has already been initialized.
    pub fn init(&mut self, pl: &mut impl ProgressLog) -> Result<(), EngineError> {
        if self.state != EngineState::Init {
            return Ok(());
        }
        let num_nodes = self.graph.num_nodes();
        let num_workers = self.coordinator.num_workers();
        self.distances = DistanceState::new(num_nodes);
        if self.partition.owner(self.source, num_workers, num_nodes) == self.coordinator.rank() {
            pl.debug(format_args!("Setting distance of source {} to 0", self.source));
            self.distances.improve(self.source, 0.0);
        }
        self.coordinator
            .all_reduce_min(self.distances.as_mut_slice())?;
        self.state = EngineState::Superstep(0);
        Ok(())
    }

    /// Executes a superstep, initializing the engine first if necessary.
    ///
    /// A superstep can be executed also after termination: after
    /// convergence, it will not change anything.
    pub fn superstep(&mut self, pl: &mut impl ProgressLog) -> Result<SuperstepOutcome, EngineError> {
        self.init(pl)?;

        let mut edges_relaxed = 0;
        let mut local_updates = 0;
        for &node in &self.owned {
            let d = self.distances[node];
            if d == f64::INFINITY {
                continue;
            }
            for edge in self.graph.successors(node) {
                edges_relaxed += 1;
                if self.distances.improve(edge.dst, d + edge.weight) {
                    local_updates += 1;
                }
            }
        }

        self.coordinator
            .all_reduce_min(self.distances.as_mut_slice())?;
        let changed = self.coordinator.any(local_updates > 0)?;

        self.stats.edges_relaxed += edges_relaxed;
        self.stats.local_updates += local_updates;
        self.stats.supersteps += 1;
        if changed {
            self.productive_supersteps += 1;
        }
        match self.state {
            EngineState::Terminated(_) if changed => {
                // Only possible if the engine was stopped by the cap
                self.state = EngineState::Superstep(self.stats.supersteps as usize)
            }
            EngineState::Terminated(_) => {}
            _ if !changed => self.state = EngineState::Terminated(Termination::Converged),
            _ => self.state = EngineState::Superstep(self.stats.supersteps as usize),
        }

        Ok(SuperstepOutcome {
            changed,
            edges_relaxed,
            local_updates,
        })
    }

    /// Runs supersteps until convergence or until the maximum number of
    /// supersteps has been executed.
    ///
    /// # Arguments
    ///
    /// * `pl`: A progress logger; one item is one superstep.
    pub fn run(&mut self, pl: &mut impl ProgressLog) -> Result<Termination, EngineError> {
        self.init(pl)?;
        if let EngineState::Terminated(termination) = self.state {
            return Ok(termination);
        }

        pl.item_name("superstep");
        pl.expected_updates(Some(self.max_supersteps));
        pl.start(format!(
            "Relaxing distances from node {} on worker {} of {} for at most {} supersteps",
            self.source,
            self.coordinator.rank(),
            self.coordinator.num_workers(),
            self.max_supersteps
        ));

        let termination = loop {
            if self.stats.supersteps as usize >= self.max_supersteps {
                break Termination::IterationLimitReached;
            }
            let outcome = self.superstep(pl)?;
            pl.update_and_display();
            if !outcome.changed {
                break Termination::Converged;
            }
        };

        match termination {
            Termination::Converged => pl.info(format_args!(
                "Terminating after {} superstep(s) by stabilisation",
                self.stats.supersteps
            )),
            Termination::IterationLimitReached => log::warn!(
                "Worker {}: stopping after {} supersteps without convergence",
                self.coordinator.rank(),
                self.stats.supersteps
            ),
        }
        self.state = EngineState::Terminated(termination);
        pl.done();

        Ok(termination)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn source(&self) -> usize {
        self.source
    }

    /// Returns the nodes owned by this worker, in increasing order.
    pub fn owned(&self) -> &[usize] {
        &self.owned
    }

    pub fn distances(&self) -> &DistanceState {
        &self.distances
    }

    pub fn into_distances(self) -> DistanceState {
        self.distances
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Returns the number of supersteps in which some worker improved a
    /// distance.
    pub fn productive_supersteps(&self) -> u64 {
        self.productive_supersteps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::local::LocalCoordinator;
    use dsi_progress_logger::no_logging;

    fn diamond() -> anyhow::Result<WeightedGraph> {
        Ok(WeightedGraph::from_arcs(
            5,
            [
                (0, 1, 1.0),
                (0, 2, 4.0),
                (1, 2, 2.0),
                (1, 3, 6.0),
                (2, 3, 3.0),
            ],
        )?)
    }

    #[test]
    fn test_single_worker() -> anyhow::Result<()> {
        let graph = diamond()?;
        let mut c = LocalCoordinator::cohort(1).pop().unwrap();
        let mut engine = RelaxationEngineBuilder::new(&graph, &mut c).build(0)?;
        assert_eq!(engine.state(), EngineState::Init);
        assert_eq!(engine.run(no_logging![])?, Termination::Converged);
        assert_eq!(
            engine.distances().as_slice(),
            &[0.0, 1.0, 3.0, 6.0, f64::INFINITY]
        );
        assert!(!engine.distances().is_reached(4));
        // In scan order, every arc improves its target exactly once
        assert_eq!(engine.stats().local_updates, 5);
        assert_eq!(engine.state(), EngineState::Terminated(Termination::Converged));
        Ok(())
    }

    #[test]
    fn test_cohort() -> anyhow::Result<()> {
        let graph = diamond()?;
        for num_workers in 1..=4 {
            let results: Vec<_> = std::thread::scope(|s| {
                LocalCoordinator::cohort(num_workers)
                    .into_iter()
                    .map(|c| {
                        let graph = &graph;
                        s.spawn(move || {
                            let mut engine = RelaxationEngineBuilder::new(graph, c)
                                .partition(Partition::Contiguous)
                                .build(0)?;
                            let termination = engine.run(no_logging![])?;
                            Ok::<_, EngineError>((termination, engine.into_distances()))
                        })
                    })
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|h| h.join().unwrap())
                    .collect()
            });
            for result in results {
                let (termination, distances) = result?;
                assert_eq!(termination, Termination::Converged);
                assert_eq!(
                    distances.as_slice(),
                    &[0.0, 1.0, 3.0, 6.0, f64::INFINITY]
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_idempotent() -> anyhow::Result<()> {
        let graph = diamond()?;
        let mut c = LocalCoordinator::cohort(1).pop().unwrap();
        let mut engine = RelaxationEngineBuilder::new(&graph, &mut c).build(1)?;
        engine.run(no_logging![])?;
        let before = engine.distances().clone();
        let updates = engine.stats().local_updates;
        let outcome = engine.superstep(no_logging![])?;
        assert!(!outcome.changed);
        assert_eq!(outcome.local_updates, 0);
        assert_eq!(engine.distances(), &before);
        assert_eq!(engine.stats().local_updates, updates);
        Ok(())
    }

    #[test]
    fn test_iteration_limit() -> anyhow::Result<()> {
        // Arcs against scan order: one hop per superstep
        let graph = WeightedGraph::from_arcs(4, [(3, 2, 1.0), (2, 1, 1.0), (1, 0, 1.0)])?;
        let mut c = LocalCoordinator::cohort(1).pop().unwrap();
        let mut engine = RelaxationEngineBuilder::new(&graph, &mut c)
            .max_supersteps(Some(2))
            .build(3)?;
        assert_eq!(
            engine.run(no_logging![])?,
            Termination::IterationLimitReached
        );
        assert_eq!(
            engine.distances().as_slice(),
            &[f64::INFINITY, 2.0, 1.0, 0.0]
        );
        assert_eq!(engine.stats().supersteps, 2);
        Ok(())
    }

    #[test]
    fn test_source_out_of_range() -> anyhow::Result<()> {
        let graph = diamond()?;
        let mut c = LocalCoordinator::cohort(1).pop().unwrap();
        assert!(matches!(
            RelaxationEngineBuilder::new(&graph, &mut c).build(5),
            Err(EngineError::NodeOutOfRange {
                node: 5,
                num_nodes: 5
            })
        ));
        Ok(())
    }
}
