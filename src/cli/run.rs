/*
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{GlobalArgs, JobArgs};
use crate::cohort::LocalCohort;
use crate::graphs::weighted_graph::WeightedGraph;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "run", about = "Computes shortest paths with a cohort of worker threads.", long_about = None)]
pub struct CliArgs {
    #[clap(flatten)]
    pub job: JobArgs,
    #[arg(short = 'n', long, default_value_t = 1)]
    /// The number of workers.
    pub num_workers: usize,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    log::info!("Loading graph {}", args.job.graph.display());
    let graph = WeightedGraph::load(&args.job.graph, args.job.arc_policy())
        .with_context(|| format!("Could not load graph {}", args.job.graph.display()))?;
    log::info!(
        "Loaded {} nodes and {} arcs",
        graph.num_nodes(),
        graph.num_arcs()
    );

    let outcome = LocalCohort::new(args.num_workers)?
        .log_interval(global_args.log_interval)
        .run(&graph, &args.job.job())?;
    if let Some(report) = outcome.report() {
        print!("{}", report);
    }
    Ok(())
}
