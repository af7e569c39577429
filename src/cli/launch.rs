/*
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{GlobalArgs, JobArgs};
use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "launch", about = "Runs a cohort of worker processes on this host.", long_about = None)]
pub struct CliArgs {
    #[clap(flatten)]
    pub job: JobArgs,
    #[arg(short = 'n', long, default_value_t = 2)]
    /// The number of worker processes.
    pub num_workers: usize,
    #[arg(long)]
    /// The address rank 0 listens on (default: a free port on 127.0.0.1).
    pub address: Option<String>,
    #[arg(long, hide = true)]
    /// The executable run by workers (default: this executable).
    pub worker_exe: Option<PathBuf>,
}

/// Kills and reaps all children still running.
fn kill_all(children: &mut [(usize, Child)]) {
    for (rank, child) in children.iter_mut() {
        if let Ok(None) = child.try_wait() {
            log::debug!("Killing worker {}", rank);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    ensure!(args.num_workers > 0, "A cohort needs at least one worker");
    let address = match args.address {
        Some(address) => address,
        None => TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .context("Could not find a free port")?
            .to_string(),
    };
    let exe = match args.worker_exe {
        Some(exe) => exe,
        None => std::env::current_exe().context("Could not locate the current executable")?,
    };

    log::info!(
        "Launching {} workers with rank 0 on {}",
        args.num_workers,
        address
    );
    let mut children: Vec<(usize, Child)> = Vec::with_capacity(args.num_workers);
    for rank in 0..args.num_workers {
        let mut command = Command::new(&exe);
        if let Some(log_interval) = global_args.log_interval {
            command
                .arg("--log-interval")
                .arg(log_interval.as_millis().to_string());
        }
        command
            .arg("worker")
            .arg("--rank")
            .arg(rank.to_string())
            .arg("--workers")
            .arg(args.num_workers.to_string())
            .arg("--address")
            .arg(&address)
            .args(args.job.to_args());
        match command.spawn() {
            Ok(child) => children.push((rank, child)),
            Err(e) => {
                kill_all(&mut children);
                return Err(e).with_context(|| format!("Could not spawn worker {}", rank));
            }
        }
    }

    // Wait for all workers; if one fails, the others are killed
    let mut done = vec![false; children.len()];
    let mut failure = None;
    while failure.is_none() && done.iter().any(|&d| !d) {
        for (i, (rank, child)) in children.iter_mut().enumerate() {
            if done[i] {
                continue;
            }
            let Some(status) = child
                .try_wait()
                .with_context(|| format!("Could not wait for worker {}", rank))?
            else {
                continue;
            };
            done[i] = true;
            if !status.success() {
                failure = Some((*rank, status));
                break;
            }
            log::debug!("Worker {} completed", rank);
        }
        if failure.is_none() {
            std::thread::sleep(Duration::from_millis(50));
        }
    }
    if let Some((rank, status)) = failure {
        kill_all(&mut children);
        bail!("Worker {} failed ({})", rank, status);
    }
    Ok(())
}
