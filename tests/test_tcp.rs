/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bsp_sssp::prelude::*;
use dsi_progress_logger::no_logging;
use std::time::Duration;

/// Runs a job on a TCP cohort whose workers are threads of this process.
fn run_tcp(graph: &WeightedGraph, job: &Job, num_workers: usize) -> Result<Vec<WorkerOutcome>> {
    let hub = TcpHub::bind("127.0.0.1:0")?;
    let address = hub.local_addr()?;
    std::thread::scope(|s| {
        let mut handles = vec![s.spawn(move || -> Result<WorkerOutcome> {
            let mut coordinator = hub.accept(num_workers)?;
            Ok(run_worker(&mut coordinator, graph, job, no_logging![])?)
        })];
        for rank in 1..num_workers {
            handles.push(s.spawn(move || -> Result<WorkerOutcome> {
                let mut coordinator =
                    TcpCoordinator::join(address, rank, num_workers, Duration::from_secs(10))?;
                Ok(run_worker(&mut coordinator, graph, job, no_logging![])?)
            }));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn test_tcp_matches_local() -> Result<()> {
    let graph = RandomConnected::new(120, 500, 9)?.generate()?;
    for num_workers in [1, 2, 4] {
        let job = Job::new(3, 111).partition(Partition::Contiguous);
        let tcp = run_tcp(&graph, &job, num_workers)?;
        let local = LocalCohort::new(num_workers)?.run(&graph, &job)?;
        for worker in &tcp {
            assert_eq!(worker.distances, local.distances());
        }
        let tcp_report = tcp[0].report.as_ref().unwrap();
        let local_report = local.report().unwrap();
        assert_eq!(tcp_report.distance, local_report.distance);
        assert_eq!(tcp_report.path, local_report.path);
        assert_eq!(tcp_report.summary, local_report.summary);
        assert!(tcp[1..].iter().all(|w| w.report.is_none()));
    }
    Ok(())
}

#[test]
fn test_tcp_abort() -> Result<()> {
    let graph = WeightedGraph::from_edges(3, [(0, 1, 1.0), (1, 2, 1.0)])?;
    let hub = TcpHub::bind("127.0.0.1:0")?;
    let address = hub.local_addr()?;
    let job = Job::new(0, 2);
    let results: Vec<Result<WorkerOutcome>> = std::thread::scope(|s| {
        let graph = &graph;
        let job = &job;
        let mut handles = vec![s.spawn(move || -> Result<WorkerOutcome> {
            let mut coordinator = hub.accept(3)?;
            Ok(run_worker(&mut coordinator, graph, job, no_logging![])?)
        })];
        for rank in 1..3 {
            handles.push(s.spawn(move || -> Result<WorkerOutcome> {
                let mut coordinator =
                    TcpCoordinator::join(address, rank, 3, Duration::from_secs(10))?;
                if rank == 2 {
                    coordinator.abort("could not load the graph");
                    anyhow::bail!("could not load the graph");
                }
                Ok(run_worker(&mut coordinator, graph, job, no_logging![])?)
            }));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for result in &results[..2] {
        let err = result.as_ref().unwrap_err();
        assert!(
            err.chain().any(|cause| matches!(
                cause.downcast_ref::<EngineError>(),
                Some(EngineError::Collective(CollectiveError::Aborted { rank: 2, .. }))
            )),
            "{:#}",
            err
        );
    }
    Ok(())
}
