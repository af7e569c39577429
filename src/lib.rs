/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
// for now we don't need any new feature but we might remove this in the future
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod algo;
#[cfg(feature = "cli")]
pub mod cli;
pub mod cohort;
pub mod collective;
pub mod graphs;
pub mod partition;
pub mod report;
pub mod worker;

pub mod prelude {
    pub use crate::algo::prelude::*;
    pub use crate::cohort::{CohortOutcome, LocalCohort};
    pub use crate::collective::local::LocalCoordinator;
    pub use crate::collective::tcp::{TcpCoordinator, TcpHub};
    pub use crate::collective::{Collective, CollectiveError, ReduceOp};
    pub use crate::graphs::prelude::*;
    pub use crate::partition::{boundary_nodes, Partition};
    pub use crate::report::Report;
    pub use crate::worker::{run_worker, Job, WorkerOutcome};
}
