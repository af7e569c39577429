/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

pub mod load;
pub mod random;
pub mod weighted_graph;

pub mod prelude {
    pub use super::load::{ArcPolicy, LoadError};
    pub use super::random::{GenerateError, Grid, RandomConnected};
    pub use super::weighted_graph::{Edge, GraphError, WeightedGraph, WeightedGraphBuilder};
}
