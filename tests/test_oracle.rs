/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bsp_sssp::algo::path::path_length;
use bsp_sssp::prelude::*;
use dsi_progress_logger::no_logging;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Returns a random directed graph in which some nodes are typically
/// unreachable.
fn random_directed(num_nodes: usize, num_arcs: usize, seed: u64) -> Result<WeightedGraph> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut builder = WeightedGraphBuilder::new(num_nodes);
    for _ in 0..num_arcs {
        let u = rng.random_range(0..num_nodes);
        let v = rng.random_range(0..num_nodes);
        // Some zero weights to exercise ties
        let w = if rng.random_bool(0.1) {
            0.0
        } else {
            rng.random_range(0.0..10.0)
        };
        builder.add_arc(u, v, w)?;
    }
    Ok(builder.build())
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (node, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        if e == f64::INFINITY {
            assert_eq!(a, f64::INFINITY, "node {}", node);
        } else {
            assert!((a - e).abs() <= 1E-9 * e.max(1.0), "node {}: {} != {}", node, a, e);
        }
    }
}

#[test]
fn test_against_dijkstra() -> Result<()> {
    for seed in 0..5 {
        let graph = random_directed(150, 450, seed)?;
        let expected = distances(&graph, 0);
        for num_workers in [1, 2, 3, 7] {
            for partition in [Partition::RoundRobin, Partition::Contiguous] {
                let outcome = LocalCohort::new(num_workers)?
                    .run(&graph, &Job::new(0, 149).partition(partition))?;
                assert_close(outcome.distances(), &expected);

                let report = outcome.report().unwrap();
                let oracle = dijkstra(&graph, 0, 149);
                assert_eq!(report.found(), oracle.found);
                if let Some(path) = &report.path {
                    assert_eq!(path.first(), Some(&0));
                    assert_eq!(path.last(), Some(&149));
                    let length = path_length(&graph, path).unwrap();
                    assert!((length - oracle.distance).abs() <= 1E-9 * oracle.distance.max(1.0));
                }
            }
        }
    }
    Ok(())
}

#[test]
fn test_worker_count_invariance() -> Result<()> {
    let graph = RandomConnected::new(300, 1500, 42)?
        .weights(0.5, 20.0)?
        .generate()?;
    let reference = LocalCohort::new(1)?.run(&graph, &Job::new(17, 230))?;
    for num_workers in [2, 4, 8] {
        for partition in [Partition::RoundRobin, Partition::Contiguous] {
            let outcome = LocalCohort::new(num_workers)?
                .run(&graph, &Job::new(17, 230).partition(partition))?;
            // Bit-identical, not just close
            assert_eq!(outcome.distances(), reference.distances());
            for worker in &outcome.workers {
                assert_eq!(worker.distances, reference.workers[0].distances);
            }
        }
    }
    Ok(())
}

#[test]
fn test_astar_agrees() -> Result<()> {
    let graph = Grid::new(12, 15, 10.0)?.generate()?;
    let outcome = LocalCohort::new(4)?.run(&graph, &Job::new(0, 179))?;
    let a = astar(&graph, 0, 179);
    let report = outcome.report().unwrap();
    assert_eq!(report.distance, a.distance);
    assert_eq!(report.path.as_ref().map(Vec::len), Some(a.path.len()));
    Ok(())
}

/// Runs a cohort manually, recording the distance vector of every worker
/// after initialization and after every superstep.
fn snapshots(graph: &WeightedGraph, num_workers: usize) -> Vec<Vec<Vec<f64>>> {
    std::thread::scope(|s| {
        LocalCoordinator::cohort(num_workers)
            .into_iter()
            .map(|c| {
                s.spawn(move || -> Result<Vec<Vec<f64>>> {
                    let mut engine = RelaxationEngineBuilder::new(graph, c).build(0)?;
                    engine.init(no_logging![])?;
                    let mut snapshots = vec![engine.distances().as_slice().to_vec()];
                    loop {
                        let outcome = engine.superstep(no_logging![])?;
                        snapshots.push(engine.distances().as_slice().to_vec());
                        if !outcome.changed {
                            break;
                        }
                    }
                    Ok(snapshots)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    })
}

#[test]
fn test_monotone() -> Result<()> {
    let graph = random_directed(80, 300, 3)?;
    let workers = snapshots(&graph, 3);
    for snapshots in &workers {
        assert_eq!(snapshots, &workers[0]);
        assert_eq!(snapshots[0][0], 0.0);
        for (before, after) in snapshots.iter().zip(snapshots.iter().skip(1)) {
            for (node, (b, a)) in before.iter().zip(after).enumerate() {
                assert!(a <= b, "node {} went from {} to {}", node, b, a);
            }
        }
    }
    Ok(())
}

#[test]
fn test_idempotent() -> Result<()> {
    let graph = random_directed(80, 300, 4)?;
    let results: Vec<_> = std::thread::scope(|s| {
        LocalCoordinator::cohort(4)
            .into_iter()
            .map(|c| {
                let graph = &graph;
                s.spawn(move || -> Result<bool> {
                    let mut engine = RelaxationEngineBuilder::new(graph, c).build(0)?;
                    assert_eq!(engine.run(no_logging![])?, Termination::Converged);
                    let before = engine.distances().clone();
                    let updates = engine.stats().local_updates;
                    let outcome = engine.superstep(no_logging![])?;
                    Ok(!outcome.changed
                        && engine.distances() == &before
                        && engine.stats().local_updates == updates)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });
    for result in results {
        assert!(result?);
    }
    Ok(())
}
