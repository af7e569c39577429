/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

pub mod dijkstra;
pub mod path;
pub mod relax;
pub mod stats;

pub mod prelude {
    pub use super::dijkstra::{astar, dijkstra, distances};
    pub use super::path::{reconstruct, tight_tree, PathResult};
    pub use super::relax::{
        DistanceState, EngineError, EngineState, RelaxationEngine, RelaxationEngineBuilder,
        SuperstepOutcome, Termination,
    };
    pub use super::stats::{aggregate, RunSummary, WorkerStats};
}
