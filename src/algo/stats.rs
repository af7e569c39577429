/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::collective::{Collective, CollectiveError, ReduceOp};

/// Counters accumulated by a worker during a relaxation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Outgoing arcs examined by local relaxation, whether or not they
    /// improved a distance.
    pub edges_relaxed: u64,
    /// Strict improvements applied by local relaxation.
    pub local_updates: u64,
    /// Executed supersteps, including the final quiescent one.
    pub supersteps: u64,
}

/// Cohort-wide totals, available on the aggregation root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_edges_relaxed: u64,
    pub total_local_updates: u64,
    /// Supersteps executed by the cohort (the maximum over the workers,
    /// which in a lockstep execution all agree).
    pub supersteps: u64,
    /// Supersteps in which at least one worker improved a distance.
    pub productive_supersteps: u64,
}

impl RunSummary {
    /// Sums the statistics of a set of workers.
    ///
    /// This is what [`aggregate`] computes through collectives; it is useful
    /// when all statistics are available in the same place.
    pub fn from_workers<'a>(
        stats: impl IntoIterator<Item = &'a WorkerStats>,
        productive_supersteps: u64,
    ) -> Self {
        stats.into_iter().fold(
            RunSummary {
                productive_supersteps,
                ..Default::default()
            },
            |acc, s| RunSummary {
                total_edges_relaxed: acc.total_edges_relaxed + s.edges_relaxed,
                total_local_updates: acc.total_local_updates + s.local_updates,
                supersteps: acc.supersteps.max(s.supersteps),
                productive_supersteps: acc.productive_supersteps,
            },
        )
    }
}

/// Reduces the statistics of all workers to `root`.
///
/// Every worker must call this function; only `root` gets a summary.
/// `productive_supersteps` is known to every worker after a run, so it is
/// passed through as is.
pub fn aggregate(
    coordinator: &mut impl Collective,
    stats: &WorkerStats,
    productive_supersteps: u64,
    root: usize,
) -> Result<Option<RunSummary>, CollectiveError> {
    let total_edges_relaxed = coordinator.reduce(stats.edges_relaxed, ReduceOp::Sum, root)?;
    let total_local_updates = coordinator.reduce(stats.local_updates, ReduceOp::Sum, root)?;
    let supersteps = coordinator.reduce(stats.supersteps, ReduceOp::Max, root)?;
    Ok(match (total_edges_relaxed, total_local_updates, supersteps) {
        (Some(total_edges_relaxed), Some(total_local_updates), Some(supersteps)) => {
            Some(RunSummary {
                total_edges_relaxed,
                total_local_updates,
                supersteps,
                productive_supersteps,
            })
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::local::LocalCoordinator;

    #[test]
    fn test_aggregate() {
        let summaries: Vec<_> = std::thread::scope(|s| {
            LocalCoordinator::cohort(3)
                .into_iter()
                .map(|mut c| {
                    s.spawn(move || {
                        let r = c.rank() as u64;
                        let stats = WorkerStats {
                            edges_relaxed: 10 * r,
                            local_updates: r,
                            supersteps: 4,
                        };
                        aggregate(&mut c, &stats, 2, 0)
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });
        assert_eq!(
            summaries[0],
            Some(RunSummary {
                total_edges_relaxed: 30,
                total_local_updates: 3,
                supersteps: 4,
                productive_supersteps: 2,
            })
        );
        assert_eq!(summaries[1], None);
        assert_eq!(summaries[2], None);
    }

    #[test]
    fn test_from_workers() {
        let stats = [
            WorkerStats {
                edges_relaxed: 3,
                local_updates: 1,
                supersteps: 2,
            },
            WorkerStats {
                edges_relaxed: 4,
                local_updates: 0,
                supersteps: 2,
            },
        ];
        let summary = RunSummary::from_workers(&stats, 1);
        assert_eq!(summary.total_edges_relaxed, 7);
        assert_eq!(summary.total_local_updates, 1);
        assert_eq!(summary.supersteps, 2);
        assert_eq!(summary.productive_supersteps, 1);
    }
}
