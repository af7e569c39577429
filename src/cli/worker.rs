/*
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{parse_duration, GlobalArgs, JobArgs};
use crate::collective::tcp::{TcpCoordinator, TcpHub};
use crate::collective::Collective;
use crate::graphs::weighted_graph::WeightedGraph;
use crate::worker::{run_worker, ROOT};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use dsi_progress_logger::{ProgressLog, ProgressLogger};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "worker", about = "Runs one worker of a cohort of processes connected by TCP.", long_about = None)]
pub struct CliArgs {
    #[clap(flatten)]
    pub job: JobArgs,
    #[arg(long)]
    /// The rank of this worker; rank 0 listens on the address, the others
    /// connect to it.
    pub rank: usize,
    #[arg(long = "workers")]
    /// The number of workers in the cohort.
    pub num_workers: usize,
    #[arg(long, default_value = "127.0.0.1:7117")]
    /// The address of rank 0.
    pub address: String,
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    /// How long to keep trying to connect to rank 0.
    pub connect_timeout: Duration,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    ensure!(
        args.rank < args.num_workers,
        "The rank ({}) must be smaller than the number of workers ({})",
        args.rank,
        args.num_workers
    );

    // Connect first, so that a loading failure can be propagated
    let mut coordinator = if args.rank == ROOT {
        let hub = TcpHub::bind(args.address.as_str())?;
        log::info!(
            "Waiting for {} workers on {}",
            args.num_workers - 1,
            hub.local_addr()?
        );
        hub.accept(args.num_workers)?
    } else {
        TcpCoordinator::join(
            args.address.as_str(),
            args.rank,
            args.num_workers,
            args.connect_timeout,
        )?
    };

    let graph = match WeightedGraph::load(&args.job.graph, args.job.arc_policy()) {
        Ok(graph) => graph,
        Err(e) => {
            coordinator.abort(&e.to_string());
            return Err(e).with_context(|| {
                format!(
                    "Worker {} could not load graph {}",
                    args.rank,
                    args.job.graph.display()
                )
            });
        }
    };

    let mut pl: Option<ProgressLogger> = None;
    if args.rank == ROOT {
        let mut root_pl = ProgressLogger::default();
        if let Some(log_interval) = global_args.log_interval {
            root_pl.log_interval(log_interval);
        }
        pl = Some(root_pl);
    }

    let outcome = run_worker(&mut coordinator, &graph, &args.job.job(), &mut pl)
        .with_context(|| format!("Worker {} failed", args.rank))?;
    if let Some(report) = outcome.report {
        print!("{}", report);
    }
    Ok(())
}
