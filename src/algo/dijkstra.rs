/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Sequential shortest paths, used as a baseline and as an oracle for the
//! distributed computation.

use super::path::PathResult;
use crate::graphs::weighted_graph::WeightedGraph;
use dary_heap::QuaternaryHeap;
use std::cmp::Ordering;
use std::time::Instant;

/// A heap entry; the order is reversed so that the heap pops the smallest
/// priority first.
#[derive(Debug, Clone, Copy)]
struct Entry {
    priority: f64,
    node: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Runs a best-first visit from `source`, with priority `d(v) + h(v)`,
/// stopping when `destination` (if any) is settled.
///
/// Returns distances and predecessors.
fn search(
    graph: &WeightedGraph,
    source: usize,
    destination: Option<usize>,
    h: impl Fn(usize) -> f64,
) -> (Vec<f64>, Vec<Option<usize>>) {
    let num_nodes = graph.num_nodes();
    let mut dist = vec![f64::INFINITY; num_nodes];
    let mut pred = vec![None; num_nodes];
    let mut settled = vec![false; num_nodes];
    let mut heap = QuaternaryHeap::new();
    if source >= num_nodes {
        return (dist, pred);
    }

    dist[source] = 0.0;
    heap.push(Entry {
        priority: h(source),
        node: source,
    });

    while let Some(Entry { node, .. }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if Some(node) == destination {
            break;
        }
        let d = dist[node];
        for edge in graph.successors(node) {
            let candidate = d + edge.weight;
            if candidate < dist[edge.dst] {
                dist[edge.dst] = candidate;
                pred[edge.dst] = Some(node);
                heap.push(Entry {
                    priority: candidate + h(edge.dst),
                    node: edge.dst,
                });
            }
        }
    }
    (dist, pred)
}

fn path_result(
    dist: &[f64],
    pred: &[Option<usize>],
    source: usize,
    destination: usize,
    start: Instant,
) -> PathResult {
    if dist[destination] == f64::INFINITY {
        return PathResult::not_found(start.elapsed());
    }
    let mut path = vec![destination];
    let mut node = destination;
    while node != source {
        match pred[node] {
            Some(p) => {
                path.push(p);
                node = p;
            }
            None => break,
        }
    }
    path.reverse();
    PathResult {
        found: true,
        distance: dist[destination],
        path,
        elapsed: start.elapsed(),
    }
}

/// Computes a shortest path from `source` to `destination` with Dijkstra's
/// algorithm, stopping as soon as the destination is settled.
///
/// If `source` or `destination` are out of range, no path is found.
pub fn dijkstra(graph: &WeightedGraph, source: usize, destination: usize) -> PathResult {
    let start = Instant::now();
    if source >= graph.num_nodes() || destination >= graph.num_nodes() {
        return PathResult::not_found(start.elapsed());
    }
    let (dist, pred) = search(graph, source, Some(destination), |_| 0.0);
    path_result(&dist, &pred, source, destination, start)
}

/// Computes a shortest path from `source` to `destination` with the A*
/// algorithm, using [`WeightedGraph::heuristic`] as estimate of the distance
/// to the destination.
///
/// The result is a shortest path only if the heuristic is admissible, that
/// is, if coordinates are such that Euclidean distances never exceed
/// actual distances (as in the graphs generated by [`Grid`]).
///
/// [`Grid`]: crate::graphs::random::Grid
///
/// If `source` or `destination` are out of range, no path is found.
pub fn astar(graph: &WeightedGraph, source: usize, destination: usize) -> PathResult {
    let start = Instant::now();
    if source >= graph.num_nodes() || destination >= graph.num_nodes() {
        return PathResult::not_found(start.elapsed());
    }
    let (dist, pred) = search(graph, source, Some(destination), |node| {
        graph.heuristic(node, destination)
    });
    path_result(&dist, &pred, source, destination, start)
}

/// Returns the distances of all nodes from `source`.
///
/// If `source` is out of range, all distances are infinite.
pub fn distances(graph: &WeightedGraph, source: usize) -> Vec<f64> {
    search(graph, source, None, |_| 0.0).0
}
