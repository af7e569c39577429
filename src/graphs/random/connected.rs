/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::GenerateError;
use crate::graphs::weighted_graph::{GraphError, WeightedGraph, WeightedGraphBuilder};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Random connected graphs with uniform weights.
///
/// Generation first builds a random spanning tree, linking every node `i > 0`
/// to a uniformly chosen node in `[0..i)`, and then adds random connections
/// between distinct nodes until the requested number of arcs is reached or
/// ten times that number of attempts has been made. Every connection is
/// undirected, that is, it adds two arcs with the same weight, so the graph
/// is strongly connected.
///
/// Nodes receive random coordinates in `[0..1000)²`, which are used only by
/// heuristic searches.
#[derive(Debug, Clone)]
pub struct RandomConnected {
    num_nodes: usize,
    num_arcs: usize,
    min_weight: f64,
    max_weight: f64,
    seed: u64,
}

impl RandomConnected {
    /// Creates a new generator, given the number of nodes, the target number
    /// of arcs, and a seed for the [pseudorandom number generator](SmallRng).
    ///
    /// Weights are in `[1..100)` unless changed with
    /// [`weights`](Self::weights). A target number of arcs larger than the
    /// number of possible arcs is capped.
    pub fn new(num_nodes: usize, num_arcs: usize, seed: u64) -> Result<Self, GenerateError> {
        if num_nodes == 0 {
            return Err(GenerateError::NoNodes);
        }
        if num_arcs < num_nodes - 1 {
            return Err(GenerateError::TooFewArcs {
                num_arcs,
                min: num_nodes - 1,
            });
        }
        let max_arcs = num_nodes.saturating_mul(num_nodes - 1);
        if num_arcs > max_arcs {
            log::warn!(
                "The number of arcs {} exceeds the maximum possible; using {}",
                num_arcs,
                max_arcs
            );
        }
        Ok(Self {
            num_nodes,
            num_arcs: num_arcs.min(max_arcs),
            min_weight: 1.0,
            max_weight: 100.0,
            seed,
        })
    }

    /// Sets the range `[min..max)` of the weights.
    pub fn weights(mut self, min: f64, max: f64) -> Result<Self, GenerateError> {
        if !(min >= 0.0 && min < max && max.is_finite()) {
            return Err(GenerateError::InvalidWeights { min, max });
        }
        self.min_weight = min;
        self.max_weight = max;
        Ok(self)
    }

    /// Generates the graph.
    pub fn generate(&self) -> Result<WeightedGraph, GraphError> {
        let n = self.num_nodes;
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut builder = WeightedGraphBuilder::new(n);

        for node in 0..n {
            let x = rng.random_range(0.0..1000.0);
            let y = rng.random_range(0.0..1000.0);
            builder.set_coordinates(node, x, y)?;
        }

        log::debug!("Creating spanning tree");
        for node in 1..n {
            let parent = rng.random_range(0..node);
            let weight = rng.random_range(self.min_weight..self.max_weight);
            builder.add_edge(parent, node, weight)?;
        }

        log::debug!("Adding random connections");
        let max_attempts = self.num_arcs.saturating_mul(10);
        let mut attempts = 0;
        while (builder.num_arcs() as usize) < self.num_arcs && attempts < max_attempts {
            attempts += 1;
            let u = rng.random_range(0..n);
            let v = rng.random_range(0..n);
            if u == v {
                continue;
            }
            let weight = rng.random_range(self.min_weight..self.max_weight);
            builder.add_edge(u, v, weight)?;
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() -> anyhow::Result<()> {
        let g = RandomConnected::new(50, 200, 0)?.generate()?;
        let h = RandomConnected::new(50, 200, 0)?.generate()?;
        assert_eq!(g, h);
        assert!(g.num_arcs() >= 200);
        for (u, v, w) in g.iter_arcs() {
            assert_ne!(u, v);
            assert!((1.0..100.0).contains(&w));
        }
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            RandomConnected::new(0, 0, 0).unwrap_err(),
            GenerateError::NoNodes
        );
        assert!(matches!(
            RandomConnected::new(10, 3, 0),
            Err(GenerateError::TooFewArcs { .. })
        ));
        assert!(RandomConnected::new(10, 20, 0)
            .unwrap()
            .weights(5.0, 5.0)
            .is_err());
    }

    #[test]
    fn test_single_node() -> anyhow::Result<()> {
        let g = RandomConnected::new(1, 0, 42)?.generate()?;
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.num_arcs(), 0);
        Ok(())
    }
}
