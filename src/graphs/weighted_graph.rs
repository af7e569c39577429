/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::TryReserveError;
use thiserror::Error;

/// An outgoing arc, as stored in the successor list of its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// The target node.
    pub dst: usize,
    /// The cost of traversing the arc.
    pub weight: f64,
}

/// Errors raised while building a [`WeightedGraph`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Arc ({src}, {dst}) has an endpoint out of range (the graph has {num_nodes} nodes)")]
    OutOfRangeEdge {
        src: usize,
        dst: usize,
        num_nodes: usize,
    },
    #[error("Node {node} does not exist (the graph has {num_nodes} nodes)")]
    NoSuchNode { node: usize, num_nodes: usize },
}

/// An immutable weighted directed graph based on a vector of successor
/// lists.
///
/// The graph is the replicated state of a cohort: every worker owns (or
/// borrows) an identical copy, and no method mutates it after construction.
/// Use a [`WeightedGraphBuilder`] to create one.
///
/// Successors are kept in insertion order, which is the order in which the
/// relaxation engine scans them. Undirected connections are represented by
/// two arcs.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct WeightedGraph {
    /// The number of arcs in the graph.
    number_of_arcs: u64,
    /// For each node, its list of outgoing arcs.
    succ: Vec<Vec<Edge>>,
    /// Optional planar coordinates, used by heuristic searches only.
    coords: Option<Vec<(f64, f64)>>,
}

impl WeightedGraph {
    /// Creates a graph with `n` nodes and no arcs.
    pub fn empty(n: usize) -> Self {
        WeightedGraphBuilder::new(n).build()
    }

    /// Creates a graph with `n` nodes from an iterator of `(src, dst,
    /// weight)` triples.
    ///
    /// Fails on the first arc with an endpoint not in `[0..n)`.
    pub fn from_arcs(
        n: usize,
        arcs: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, GraphError> {
        let mut builder = WeightedGraphBuilder::new(n);
        for (src, dst, weight) in arcs {
            builder.add_arc(src, dst, weight)?;
        }
        Ok(builder.build())
    }

    /// Creates a graph with `n` nodes from an iterator of undirected
    /// connections, each of which becomes two arcs.
    pub fn from_edges(
        n: usize,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, GraphError> {
        let mut builder = WeightedGraphBuilder::new(n);
        for (u, v, weight) in edges {
            builder.add_edge(u, v, weight)?;
        }
        Ok(builder.build())
    }

    /// Returns the number of nodes.
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    /// Returns the number of arcs actually stored.
    #[inline(always)]
    pub fn num_arcs(&self) -> u64 {
        self.number_of_arcs
    }

    /// Returns the outgoing arcs of `node`, in insertion order.
    ///
    /// # Panics
    ///
    /// If `node` is not smaller than [`num_nodes`](Self::num_nodes).
    #[doc(alias = "adjacency")]
    #[inline(always)]
    pub fn successors(&self, node: usize) -> &[Edge] {
        &self.succ[node]
    }

    /// Returns the outdegree of `node`.
    #[inline(always)]
    pub fn outdegree(&self, node: usize) -> usize {
        self.succ[node].len()
    }

    /// Returns an iterator over all arcs as `(src, dst, weight)` triples, in
    /// node order.
    pub fn iter_arcs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.succ
            .iter()
            .enumerate()
            .flat_map(|(src, succ)| succ.iter().map(move |e| (src, e.dst, e.weight)))
    }

    /// Returns the coordinates of `node`, if the graph has them.
    pub fn coordinates(&self, node: usize) -> Option<(f64, f64)> {
        self.coords.as_ref().and_then(|c| c.get(node).copied())
    }

    /// Returns the Euclidean distance between the coordinates of two nodes.
    ///
    /// Without coordinates, or with out-of-range nodes, the heuristic is
    /// zero, which turns A* into Dijkstra.
    pub fn heuristic(&self, from: usize, to: usize) -> f64 {
        match (self.coordinates(from), self.coordinates(to)) {
            (Some((x0, y0)), Some((x1, y1))) => {
                let (dx, dy) = (x0 - x1, y0 - y1);
                (dx * dx + dy * dy).sqrt()
            }
            _ => 0.0,
        }
    }
}

/// A mutable builder for [`WeightedGraph`].
///
/// The number of nodes is fixed at creation; arcs must have both endpoints
/// in range.
#[derive(Clone, Debug, Default)]
pub struct WeightedGraphBuilder {
    number_of_arcs: u64,
    succ: Vec<Vec<Edge>>,
    coords: Option<Vec<(f64, f64)>>,
}

impl WeightedGraphBuilder {
    /// Creates a builder for a graph with `n` nodes.
    pub fn new(n: usize) -> Self {
        Self {
            number_of_arcs: 0,
            succ: Vec::from_iter((0..n).map(|_| Vec::new())),
            coords: None,
        }
    }

    /// Creates a builder for a graph with `n` nodes, failing instead of
    /// panicking if the successor lists cannot be allocated.
    pub fn try_new(n: usize) -> Result<Self, TryReserveError> {
        let mut succ = Vec::new();
        succ.try_reserve_exact(n)?;
        succ.resize_with(n, Vec::new);
        Ok(Self {
            number_of_arcs: 0,
            succ,
            coords: None,
        })
    }

    /// Returns the number of nodes of the graph being built.
    pub fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    /// Returns the number of arcs added so far.
    pub fn num_arcs(&self) -> u64 {
        self.number_of_arcs
    }

    /// Adds the arc `(src, dst)` with the given weight.
    pub fn add_arc(&mut self, src: usize, dst: usize, weight: f64) -> Result<(), GraphError> {
        let num_nodes = self.succ.len();
        if src >= num_nodes || dst >= num_nodes {
            return Err(GraphError::OutOfRangeEdge {
                src,
                dst,
                num_nodes,
            });
        }
        self.succ[src].push(Edge { dst, weight });
        self.number_of_arcs += 1;
        Ok(())
    }

    /// Adds the arcs `(u, v)` and `(v, u)`, both with the given weight.
    ///
    /// If either endpoint is out of range no arc is added.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<(), GraphError> {
        let num_nodes = self.succ.len();
        if u >= num_nodes || v >= num_nodes {
            return Err(GraphError::OutOfRangeEdge {
                src: u,
                dst: v,
                num_nodes,
            });
        }
        self.add_arc(u, v, weight)?;
        self.add_arc(v, u, weight)
    }

    /// Sets the planar coordinates of a node.
    ///
    /// The first call allocates coordinates for all nodes, initialized to
    /// the origin.
    pub fn set_coordinates(&mut self, node: usize, x: f64, y: f64) -> Result<(), GraphError> {
        let num_nodes = self.succ.len();
        if node >= num_nodes {
            return Err(GraphError::NoSuchNode { node, num_nodes });
        }
        self.coords.get_or_insert_with(|| vec![(0.0, 0.0); num_nodes])[node] = (x, y);
        Ok(())
    }

    /// Freezes the builder into an immutable graph.
    pub fn build(self) -> WeightedGraph {
        WeightedGraph {
            number_of_arcs: self.number_of_arcs,
            succ: self.succ,
            coords: self.coords,
        }
    }
}
