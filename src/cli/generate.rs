/*
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::GlobalArgs;
use crate::graphs::random::{Grid, RandomConnected};
use crate::graphs::weighted_graph::WeightedGraph;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
#[command(name = "generate")]
/// Generates synthetic graphs in text format.
pub enum SubCommands {
    Random(RandomArgs),
    Grid(GridArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Generates a random strongly connected graph with undirected connections.", long_about = None)]
pub struct RandomArgs {
    /// The number of nodes.
    pub num_nodes: usize,
    /// The target number of arcs (every connection adds two arcs).
    pub num_arcs: usize,
    /// The output file.
    pub dst: PathBuf,
    #[arg(long, default_value_t = 1.0)]
    /// The minimum weight (inclusive).
    pub min_weight: f64,
    #[arg(long, default_value_t = 100.0)]
    /// The maximum weight (exclusive).
    pub max_weight: f64,
    #[arg(long, default_value_t = 0)]
    /// The seed of the pseudorandom number generator.
    pub seed: u64,
}

#[derive(Parser, Debug)]
#[command(about = "Generates a four-connected grid graph.", long_about = None)]
pub struct GridArgs {
    /// The number of rows.
    pub rows: usize,
    /// The number of columns.
    pub cols: usize,
    /// The output file.
    pub dst: PathBuf,
    #[arg(long, default_value_t = 1.0)]
    /// The weight of every arc.
    pub weight: f64,
}

pub fn main(_global_args: GlobalArgs, subcommand: SubCommands) -> Result<()> {
    match subcommand {
        SubCommands::Random(args) => {
            let graph = RandomConnected::new(args.num_nodes, args.num_arcs, args.seed)?
                .weights(args.min_weight, args.max_weight)?
                .generate()?;
            store(&graph, &args.dst)
        }
        SubCommands::Grid(args) => {
            let graph = Grid::new(args.rows, args.cols, args.weight)?.generate()?;
            store(&graph, &args.dst)
        }
    }
}

fn store(graph: &WeightedGraph, dst: &Path) -> Result<()> {
    graph
        .store(dst)
        .with_context(|| format!("Could not write graph to {}", dst.display()))?;
    log::info!(
        "Wrote {} nodes and {} arcs to {}",
        graph.num_nodes(),
        graph.num_arcs(),
        dst.display()
    );
    Ok(())
}
