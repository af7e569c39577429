/*
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::GlobalArgs;
use crate::algo::dijkstra::{astar, dijkstra};
use crate::graphs::load::ArcPolicy;
use crate::graphs::weighted_graph::WeightedGraph;
use anyhow::{ensure, Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oracle", about = "Computes a shortest path sequentially.", long_about = None)]
pub struct CliArgs {
    /// The graph, in text format.
    pub graph: PathBuf,
    /// The source node.
    pub source: usize,
    /// The destination node.
    pub destination: usize,
    #[arg(long)]
    /// Use A* with Euclidean distances between node coordinates instead of
    /// Dijkstra's algorithm (coordinates are not stored in graph files, so
    /// the search degenerates to Dijkstra's on loaded graphs).
    pub astar: bool,
    #[arg(long)]
    /// Drop arcs with out-of-range endpoints instead of failing.
    pub lenient: bool,
}

pub fn main(_global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let policy = if args.lenient {
        ArcPolicy::Drop
    } else {
        ArcPolicy::Reject
    };
    let graph = WeightedGraph::load(&args.graph, policy)
        .with_context(|| format!("Could not load graph {}", args.graph.display()))?;
    let num_nodes = graph.num_nodes();
    ensure!(
        args.source < num_nodes && args.destination < num_nodes,
        "Source ({}) and destination ({}) must be smaller than the number of nodes ({})",
        args.source,
        args.destination,
        num_nodes
    );

    let (name, result) = if args.astar {
        ("A*", astar(&graph, args.source, args.destination))
    } else {
        ("Dijkstra", dijkstra(&graph, args.source, args.destination))
    };
    println!("Algorithm: {}", name);
    println!("Source: {}", args.source);
    println!("Destination: {}", args.destination);
    print!("{}", result);
    Ok(())
}
