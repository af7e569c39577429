/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Synthetic graphs for benchmarks and tests.

use thiserror::Error;

mod connected;
pub use connected::RandomConnected;

mod grid;
pub use grid::Grid;

/// Invalid generator parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("The number of nodes must be positive")]
    NoNodes,
    #[error("The number of arcs ({num_arcs}) must be at least the number of nodes minus one ({min})")]
    TooFewArcs { num_arcs: usize, min: usize },
    #[error("The weight range [{min}..{max}) is empty or contains negative values")]
    InvalidWeights { min: f64, max: f64 },
    #[error("Invalid grid dimensions {rows}x{cols}")]
    InvalidGrid { rows: usize, cols: usize },
    #[error("Invalid arc weight {0}")]
    InvalidWeight(f64),
}
