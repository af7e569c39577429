/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Assignment of relaxation responsibility to workers.
//!
//! A partition does not move any data: every worker holds the whole graph.
//! It only decides which worker relaxes the outgoing arcs of which node.

use crate::graphs::weighted_graph::WeightedGraph;

/// A policy mapping nodes to the rank of their owner.
///
/// For every number of workers `P ≥ 1` and every number of nodes `N`, the
/// sets returned by [`assign`](Self::assign) for ranks in `[0..P)` are a
/// partition of `[0..N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Partition {
    /// Rank `r` owns nodes `r`, `r + P`, `r + 2P`, and so on.
    ///
    /// Clustered or high-degree regions of consecutive nodes are spread
    /// evenly among workers, at the price of any locality between the nodes
    /// of a worker.
    #[default]
    RoundRobin,
    /// Rank `r` owns a block of consecutive nodes; the first `N mod P`
    /// ranks own one node more than the others.
    Contiguous,
}

impl Partition {
    /// Returns a human-readable name of the policy.
    pub fn name(&self) -> &'static str {
        match self {
            Partition::RoundRobin => "Round-Robin",
            Partition::Contiguous => "Contiguous",
        }
    }

    /// Returns the first node and the number of nodes of the block owned by
    /// `rank` in a contiguous partition.
    #[inline(always)]
    fn block(rank: usize, num_workers: usize, num_nodes: usize) -> (usize, usize) {
        let per_worker = num_nodes / num_workers;
        let remainder = num_nodes % num_workers;
        let start = rank * per_worker + rank.min(remainder);
        let len = per_worker + usize::from(rank < remainder);
        (start, len)
    }

    /// Returns the rank owning `node`.
    ///
    /// # Panics
    ///
    /// If `num_workers` is zero.
    pub fn owner(&self, node: usize, num_workers: usize, num_nodes: usize) -> usize {
        assert!(num_workers > 0, "The number of workers must be positive");
        match self {
            Partition::RoundRobin => node % num_workers,
            Partition::Contiguous => {
                let per_worker = num_nodes / num_workers;
                let remainder = num_nodes % num_workers;
                // The first `remainder` blocks have length `per_worker + 1`
                let long = remainder * (per_worker + 1);
                if node < long {
                    node / (per_worker + 1)
                } else if per_worker == 0 {
                    num_workers - 1
                } else {
                    (remainder + (node - long) / per_worker).min(num_workers - 1)
                }
            }
        }
    }

    /// Returns, in increasing order, the nodes owned by `rank`.
    ///
    /// # Panics
    ///
    /// If `num_workers` is zero.
    pub fn assign(&self, rank: usize, num_workers: usize, num_nodes: usize) -> Vec<usize> {
        assert!(num_workers > 0, "The number of workers must be positive");
        match self {
            Partition::RoundRobin => (rank..num_nodes).step_by(num_workers).collect(),
            Partition::Contiguous => {
                if rank >= num_workers {
                    return vec![];
                }
                let (start, len) = Self::block(rank, num_workers, num_nodes);
                (start..start + len).collect()
            }
        }
    }

    /// Returns the number of nodes owned by `rank`, without materializing
    /// them.
    pub fn share(&self, rank: usize, num_workers: usize, num_nodes: usize) -> usize {
        assert!(num_workers > 0, "The number of workers must be positive");
        if rank >= num_workers {
            return 0;
        }
        match self {
            Partition::RoundRobin => num_nodes.saturating_sub(rank).div_ceil(num_workers),
            Partition::Contiguous => Self::block(rank, num_workers, num_nodes).1,
        }
    }
}

/// Returns the owned nodes having at least one arc towards a node owned by
/// another worker.
///
/// These are the nodes whose improvements can become visible elsewhere only
/// through the global synchronization.
pub fn boundary_nodes(
    graph: &WeightedGraph,
    owned: &[usize],
    partition: Partition,
    rank: usize,
    num_workers: usize,
) -> Vec<usize> {
    let num_nodes = graph.num_nodes();
    owned
        .iter()
        .copied()
        .filter(|&node| {
            graph
                .successors(node)
                .iter()
                .any(|e| partition.owner(e.dst, num_workers, num_nodes) != rank)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_exact(partition: Partition, num_workers: usize, num_nodes: usize) {
        let mut seen = vec![false; num_nodes];
        for rank in 0..num_workers {
            let owned = partition.assign(rank, num_workers, num_nodes);
            assert_eq!(owned.len(), partition.share(rank, num_workers, num_nodes));
            for node in owned {
                assert!(!seen[node], "Node {} assigned twice", node);
                seen[node] = true;
                assert_eq!(
                    partition.owner(node, num_workers, num_nodes),
                    rank,
                    "{:?} P={} N={} node={}",
                    partition,
                    num_workers,
                    num_nodes,
                    node
                );
            }
        }
        assert!(seen.into_iter().all(|x| x));
    }

    #[test]
    fn test_exact() {
        for partition in [Partition::RoundRobin, Partition::Contiguous] {
            for num_workers in 1..=9 {
                for num_nodes in 0..40 {
                    check_exact(partition, num_workers, num_nodes);
                }
            }
        }
    }

    #[test]
    fn test_round_robin() {
        assert_eq!(Partition::RoundRobin.assign(1, 4, 14), vec![1, 5, 9, 13]);
        assert_eq!(Partition::RoundRobin.assign(5, 8, 3), Vec::<usize>::new());
        assert_eq!(Partition::RoundRobin.owner(13, 4, 14), 1);
    }

    #[test]
    fn test_contiguous() {
        assert_eq!(Partition::Contiguous.assign(0, 3, 10), vec![0, 1, 2, 3]);
        assert_eq!(Partition::Contiguous.assign(1, 3, 10), vec![4, 5, 6]);
        assert_eq!(Partition::Contiguous.assign(2, 3, 10), vec![7, 8, 9]);
        assert_eq!(Partition::Contiguous.owner(4, 3, 10), 1);
    }

    #[test]
    fn test_boundary() -> anyhow::Result<()> {
        // 0 -> 1 crosses workers, 2 -> 0 does not under round-robin with P = 2
        let g = WeightedGraph::from_arcs(3, [(0, 1, 1.0), (2, 0, 1.0), (1, 1, 1.0)])?;
        let owned = Partition::RoundRobin.assign(0, 2, 3);
        assert_eq!(
            boundary_nodes(&g, &owned, Partition::RoundRobin, 0, 2),
            vec![0]
        );
        let owned = Partition::RoundRobin.assign(1, 2, 3);
        assert!(boundary_nodes(&g, &owned, Partition::RoundRobin, 1, 2).is_empty());
        Ok(())
    }
}
