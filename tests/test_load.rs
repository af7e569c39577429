/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bsp_sssp::prelude::*;
use std::io::Write;

fn write_graph(content: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_run_loading() -> Result<()> {
    let file = write_graph("# a square\n4 8\n0 1 1\n1 0 1\n1 2 1.5\n2 1 1.5\n2 3 1\n3 2 1\n3 0 5\n0 3 5\n")?;
    let outcome = LocalCohort::new(3)?.run_loading(file.path(), ArcPolicy::Reject, &Job::new(0, 3))?;
    let report = outcome.report().unwrap();
    assert_eq!(report.num_arcs, 8);
    assert_eq!(report.distance, 3.5);
    assert_eq!(report.path, Some(vec![0, 1, 2, 3]));
    Ok(())
}

#[test]
fn test_missing_file_aborts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("missing.txt");
    let err = LocalCohort::new(4)?
        .run_loading(&path, ArcPolicy::Reject, &Job::new(0, 1))
        .unwrap_err();
    // The root cause is reported, not the abort seen by the peers
    assert!(
        err.chain()
            .any(|cause| matches!(cause.downcast_ref::<LoadError>(), Some(LoadError::Io { .. }))),
        "{:#}",
        err
    );
    Ok(())
}

#[test]
fn test_out_of_range() -> Result<()> {
    let file = write_graph("3 3\n0 1 1\n1 7 1\n1 2 1\n")?;
    let err = LocalCohort::new(2)?
        .run_loading(file.path(), ArcPolicy::Reject, &Job::new(0, 2))
        .unwrap_err();
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<LoadError>(),
        Some(LoadError::OutOfRangeEdge {
            line: 3,
            src: 1,
            dst: 7,
            num_nodes: 3
        })
    )));

    let outcome = LocalCohort::new(2)?.run_loading(file.path(), ArcPolicy::Drop, &Job::new(0, 2))?;
    let report = outcome.report().unwrap();
    assert_eq!(report.num_arcs, 2);
    assert_eq!(report.distance, 2.0);
    Ok(())
}

#[test]
fn test_negative_weight() -> Result<()> {
    let file = write_graph("2 1\n0 1 -1\n")?;
    let err = LocalCohort::new(2)?
        .run_loading(file.path(), ArcPolicy::Drop, &Job::new(0, 1))
        .unwrap_err();
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<LoadError>(),
        Some(LoadError::InvalidWeight { line: 2, .. })
    )));
    Ok(())
}

#[test]
fn test_store_and_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("random.txt");
    let graph = RandomConnected::new(60, 200, 1)?.generate()?;
    graph.store(&path)?;
    let shared = LocalCohort::new(3)?.run(&graph, &Job::new(5, 50))?;
    let loaded = LocalCohort::new(3)?.run_loading(&path, ArcPolicy::Reject, &Job::new(5, 50))?;
    // Weights go through a decimal representation
    for (a, b) in shared.distances().iter().zip(loaded.distances()) {
        assert!((a - b).abs() < 1E-9);
    }
    Ok(())
}
