/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::GenerateError;
use crate::graphs::weighted_graph::{GraphError, WeightedGraph, WeightedGraphBuilder};

/// Four-connected grid graphs with constant weight.
///
/// Node `r * cols + c` sits at coordinates `(10c, 10r)` and is connected in
/// both directions to its right and bottom neighbors.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    weight: f64,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, weight: f64) -> Result<Self, GenerateError> {
        if rows == 0 || cols == 0 {
            return Err(GenerateError::InvalidGrid { rows, cols });
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(GenerateError::InvalidWeight(weight));
        }
        Ok(Self { rows, cols, weight })
    }

    pub fn generate(&self) -> Result<WeightedGraph, GraphError> {
        let (rows, cols) = (self.rows, self.cols);
        let mut builder = WeightedGraphBuilder::new(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let node = r * cols + c;
                builder.set_coordinates(node, c as f64 * 10.0, r as f64 * 10.0)?;
                if c + 1 < cols {
                    builder.add_edge(node, node + 1, self.weight)?;
                }
                if r + 1 < rows {
                    builder.add_edge(node, node + cols, self.weight)?;
                }
            }
        }
        Ok(builder.build())
    }
}
