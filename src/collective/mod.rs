/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Collective operations among the workers of a cohort.
//!
//! A cohort is a fixed set of workers identified by their rank in `[0..P)`.
//! Workers coordinate exclusively through the blocking operations of the
//! [`Collective`] trait: every operation returns only after all workers
//! have entered it, so compute and communication phases never overlap.
//!
//! Two implementations are provided:
//!
//! * [`local::LocalCoordinator`] connects threads of the same process through
//!   channels;
//! * [`tcp::TcpCoordinator`] connects processes, possibly on different hosts,
//!   through TCP.
//!
//! There are no timeouts: a worker that stops calling collectives without
//! [aborting](Collective::abort) stalls the cohort. A worker that aborts, or
//! that disappears, makes the pending and all future collectives of its
//! peers fail.

use thiserror::Error;

pub mod local;
pub mod tcp;

/// Associative and commutative reductions on scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
    Min,
}

impl ReduceOp {
    /// Combines two values.
    #[inline(always)]
    pub fn apply(self, a: u64, b: u64) -> u64 {
        match self {
            ReduceOp::Sum => a.wrapping_add(b),
            ReduceOp::Max => a.max(b),
            ReduceOp::Min => a.min(b),
        }
    }
}

/// Folds `src` into `acc` by element-wise minimum.
///
/// The comparison is strict, so on ties (e.g., `-0.0` and `0.0`) the value
/// already in `acc` is kept; folding contributions in rank order thus gives
/// the same result on every worker.
#[inline]
pub(crate) fn fold_min(acc: &mut [f64], src: &[f64]) {
    for (a, &s) in acc.iter_mut().zip(src) {
        if s < *a {
            *a = s;
        }
    }
}

/// Errors of collective operations.
#[derive(Error, Debug)]
pub enum CollectiveError {
    #[error("Worker {rank} aborted the cohort: {reason}")]
    Aborted { rank: usize, reason: String },
    #[error("Worker {rank} left the cohort")]
    Departed { rank: usize },
    #[error("Worker {rank} contributed {actual} values, but {expected} were expected")]
    LengthMismatch {
        rank: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Protocol violation by worker {rank}: {detail}")]
    Protocol { rank: usize, detail: String },
    #[error("Rank {rank} is invalid for a cohort of {num_workers} workers")]
    InvalidRank { rank: usize, num_workers: usize },
    #[error("Could not connect to the coordinator at {address}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error in communication with worker {rank}")]
    Io {
        rank: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not encode or decode a message for worker {rank}")]
    Codec {
        rank: usize,
        #[source]
        source: bincode::Error,
    },
}

impl CollectiveError {
    /// Returns true if the error is the consequence of the failure of
    /// another worker, rather than a failure of this one.
    pub fn is_peer_failure(&self) -> bool {
        matches!(
            self,
            CollectiveError::Aborted { .. } | CollectiveError::Departed { .. }
        )
    }
}

/// The blocking collective operations used by the relaxation engine.
///
/// All workers of a cohort must call the same sequence of operations with
/// compatible arguments (e.g., vectors of the same length, the same root).
pub trait Collective {
    /// Returns the rank of this worker.
    fn rank(&self) -> usize;

    /// Returns the number of workers in the cohort.
    fn num_workers(&self) -> usize;

    /// Replaces `values`, on every worker, with the element-wise minimum of
    /// the vectors passed by all workers.
    fn all_reduce_min(&mut self, values: &mut [f64]) -> Result<(), CollectiveError>;

    /// Returns, on every worker, the reduction of the values passed by all
    /// workers.
    fn all_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, CollectiveError>;

    /// Returns, on `root` only, the reduction of the values passed by all
    /// workers; the other workers get `None`.
    fn reduce(
        &mut self,
        value: u64,
        op: ReduceOp,
        root: usize,
    ) -> Result<Option<u64>, CollectiveError> {
        if root >= self.num_workers() {
            return Err(CollectiveError::InvalidRank {
                rank: root,
                num_workers: self.num_workers(),
            });
        }
        let result = self.all_reduce(value, op)?;
        Ok((self.rank() == root).then_some(result))
    }

    /// Returns when all workers have called this method.
    fn barrier(&mut self) -> Result<(), CollectiveError> {
        self.all_reduce(0, ReduceOp::Max).map(|_| ())
    }

    /// Returns, on every worker, whether at least one worker passed `true`.
    fn any(&mut self, flag: bool) -> Result<bool, CollectiveError> {
        Ok(self.all_reduce(u64::from(flag), ReduceOp::Max)? != 0)
    }

    /// Makes all pending and future collectives of the other workers fail.
    ///
    /// This method must be called by a worker that cannot take part in the
    /// computation (e.g., because it could not load the graph), so that its
    /// peers do not wait for it forever. It is best effort and never fails.
    fn abort(&mut self, reason: &str);
}

impl<C: Collective + ?Sized> Collective for &mut C {
    fn rank(&self) -> usize {
        (**self).rank()
    }
    fn num_workers(&self) -> usize {
        (**self).num_workers()
    }
    fn all_reduce_min(&mut self, values: &mut [f64]) -> Result<(), CollectiveError> {
        (**self).all_reduce_min(values)
    }
    fn all_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, CollectiveError> {
        (**self).all_reduce(value, op)
    }
    fn reduce(
        &mut self,
        value: u64,
        op: ReduceOp,
        root: usize,
    ) -> Result<Option<u64>, CollectiveError> {
        (**self).reduce(value, op, root)
    }
    fn barrier(&mut self) -> Result<(), CollectiveError> {
        (**self).barrier()
    }
    fn any(&mut self, flag: bool) -> Result<bool, CollectiveError> {
        (**self).any(flag)
    }
    fn abort(&mut self, reason: &str) {
        (**self).abort(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_op() {
        assert_eq!(ReduceOp::Sum.apply(3, 4), 7);
        assert_eq!(ReduceOp::Max.apply(3, 4), 4);
        assert_eq!(ReduceOp::Min.apply(3, 4), 3);
    }

    #[test]
    fn test_fold_min() {
        let mut acc = [1.0, f64::INFINITY, 0.0, 5.0];
        fold_min(&mut acc, &[2.0, 3.0, -0.0, f64::INFINITY]);
        assert_eq!(acc[..2], [1.0, 3.0]);
        assert!(acc[2].is_sign_positive());
        assert_eq!(acc[3], 5.0);
    }
}
