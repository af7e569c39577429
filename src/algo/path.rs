/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Shortest paths from distance vectors.
//!
//! The relaxation engine does not keep predecessors, as they would have to be
//! carried through the reductions. Once distances have converged, however,
//! every arc `(u, v, w)` on a shortest path is *tight*, that is,
//! `d(u) + w = d(v)`, and every reached node can be reached from the source
//! through tight arcs; a breadth-first visit of the tight arcs thus yields a
//! shortest-path tree, even in the presence of zero-weight cycles.

use crate::graphs::weighted_graph::WeightedGraph;
use itertools::Itertools;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// The result of a point-to-point shortest-path computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Whether the destination is reachable from the source.
    pub found: bool,
    /// The distance from the source to the destination, or
    /// [`f64::INFINITY`].
    pub distance: f64,
    /// The nodes of a shortest path, from the source to the destination, or
    /// the empty vector.
    pub path: Vec<usize>,
    /// The time spent computing the result.
    pub elapsed: Duration,
}

impl PathResult {
    pub fn not_found(elapsed: Duration) -> Self {
        Self {
            found: false,
            distance: f64::INFINITY,
            path: vec![],
            elapsed,
        }
    }

    /// Returns the number of arcs of the path.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

impl Display for PathResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.found {
            return writeln!(f, "No path found");
        }
        writeln!(f, "Distance: {}", self.distance)?;
        writeln!(f, "Path: {}", self.path.iter().join(" -> "))?;
        writeln!(f, "Hops: {}", self.hops())?;
        writeln!(f, "Time: {:.3} ms", self.elapsed.as_secs_f64() * 1000.0)
    }
}

/// Returns the predecessor of every node in a shortest-path tree rooted at
/// `source`, using only tight arcs with respect to `distances`.
///
/// The source and nodes not reachable through tight arcs have no
/// predecessor. The first node discovering a node in breadth-first order is
/// its predecessor.
pub fn tight_tree(graph: &WeightedGraph, distances: &[f64], source: usize) -> Vec<Option<usize>> {
    let num_nodes = graph.num_nodes();
    let mut pred = vec![None; num_nodes];
    let mut seen = vec![false; num_nodes];
    let mut queue = VecDeque::new();
    if source >= num_nodes || distances[source] == f64::INFINITY {
        return pred;
    }
    seen[source] = true;
    queue.push_back(source);
    while let Some(node) = queue.pop_front() {
        let d = distances[node];
        for edge in graph.successors(node) {
            if !seen[edge.dst] && d + edge.weight == distances[edge.dst] {
                seen[edge.dst] = true;
                pred[edge.dst] = Some(node);
                queue.push_back(edge.dst);
            }
        }
    }
    pred
}

/// Returns a shortest path from `source` to `destination` using only tight
/// arcs with respect to `distances`.
///
/// Returns [`None`] if the destination is unreached, or if it cannot be
/// reached through tight arcs, which can happen only if the distances have
/// not converged.
pub fn reconstruct(
    graph: &WeightedGraph,
    distances: &[f64],
    source: usize,
    destination: usize,
) -> Option<Vec<usize>> {
    if destination >= graph.num_nodes() || distances[destination] == f64::INFINITY {
        return None;
    }
    if destination == source {
        return Some(vec![source]);
    }
    let pred = tight_tree(graph, distances, source);
    let mut path = vec![destination];
    let mut node = destination;
    while let Some(p) = pred[node] {
        path.push(p);
        node = p;
    }
    if node != source {
        return None;
    }
    path.reverse();
    Some(path)
}

/// Returns the length of `path` in `graph`, using for each step the
/// lightest arc, or [`None`] if some step is not an arc.
pub fn path_length(graph: &WeightedGraph, path: &[usize]) -> Option<f64> {
    path.iter().tuple_windows().try_fold(0.0, |acc, (&u, &v)| {
        graph
            .successors(u)
            .iter()
            .filter(|e| e.dst == v)
            .map(|e| e.weight)
            .min_by(f64::total_cmp)
            .map(|w| acc + w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct() -> anyhow::Result<()> {
        let g = WeightedGraph::from_arcs(
            5,
            [
                (0, 1, 1.0),
                (0, 2, 4.0),
                (1, 2, 2.0),
                (2, 3, 3.0),
                (1, 3, 6.0),
            ],
        )?;
        let d = [0.0, 1.0, 3.0, 6.0, f64::INFINITY];
        assert_eq!(reconstruct(&g, &d, 0, 3), Some(vec![0, 1, 2, 3]));
        assert_eq!(reconstruct(&g, &d, 0, 0), Some(vec![0]));
        assert_eq!(reconstruct(&g, &d, 0, 4), None);
        assert_eq!(path_length(&g, &[0, 1, 2, 3]), Some(6.0));
        assert_eq!(path_length(&g, &[0, 3]), None);
        Ok(())
    }

    #[test]
    fn test_zero_weight_cycle() -> anyhow::Result<()> {
        let g = WeightedGraph::from_arcs(
            4,
            [(1, 2, 0.0), (2, 1, 0.0), (0, 1, 2.0), (2, 3, 1.0)],
        )?;
        let d = [0.0, 2.0, 2.0, 3.0];
        let pred = tight_tree(&g, &d, 0);
        assert_eq!(pred, vec![None, Some(0), Some(1), Some(2)]);
        assert_eq!(reconstruct(&g, &d, 0, 3), Some(vec![0, 1, 2, 3]));
        Ok(())
    }

    #[test]
    fn test_display() {
        let r = PathResult {
            found: true,
            distance: 4.0,
            path: vec![0, 1, 2],
            elapsed: Duration::from_micros(1500),
        };
        let s = r.to_string();
        assert!(s.contains("Path: 0 -> 1 -> 2"));
        assert!(s.contains("Hops: 2"));
        assert_eq!(
            PathResult::not_found(Duration::ZERO).to_string(),
            "No path found\n"
        );
    }
}
