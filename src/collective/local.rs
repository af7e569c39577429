/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Collectives among threads of the same process.

use super::{fold_min, Collective, CollectiveError, ReduceOp};
use crossbeam_channel::{unbounded, Receiver, Sender};

#[derive(Debug)]
enum Payload {
    Min(Vec<f64>),
    Scalar(u64),
    Abort(String),
    Departed,
}

#[derive(Debug)]
struct Envelope {
    from: usize,
    seq: u64,
    payload: Payload,
}

/// A worker's endpoint in a cohort of threads.
///
/// Every worker has an unbounded inbox and a sender towards the inbox of
/// every other worker. Each collective has a sequence number: since a worker
/// may enter the next collective while a slower peer is still reading the
/// previous one, messages from the future are stashed until needed.
///
/// Contributions are always folded in rank order, so every worker computes
/// bit-identical results.
///
/// Dropping a coordinator (e.g., because its thread panicked) makes the
/// collectives of its peers fail instead of blocking forever.
#[derive(Debug)]
pub struct LocalCoordinator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    seq: u64,
    stash: Vec<Envelope>,
    departed: Vec<bool>,
    aborted: Option<(usize, String)>,
}

impl LocalCoordinator {
    /// Returns the coordinators of a new cohort of `num_workers` threads,
    /// in rank order.
    ///
    /// # Panics
    ///
    /// If `num_workers` is zero.
    pub fn cohort(num_workers: usize) -> Vec<LocalCoordinator> {
        assert!(num_workers > 0, "A cohort needs at least one worker");
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..num_workers).map(|_| unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCoordinator {
                rank,
                peers: senders.clone(),
                inbox,
                seq: 0,
                stash: vec![],
                departed: vec![false; num_workers],
                aborted: None,
            })
            .collect()
    }

    fn check_aborted(&self) -> Result<(), CollectiveError> {
        match &self.aborted {
            Some((rank, reason)) => Err(CollectiveError::Aborted {
                rank: *rank,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Sends a payload to a peer.
    ///
    /// A peer always posts an abort or departure notice before its inbox is
    /// dropped, so failures are ignored here and detected when collecting.
    fn send(&self, to: usize, seq: u64, payload: Payload) {
        let _ = self.peers[to].send(Envelope {
            from: self.rank,
            seq,
            payload,
        });
    }

    fn broadcast(&self, seq: u64, payload: impl Fn() -> Payload) {
        for to in 0..self.num_workers() {
            if to != self.rank {
                self.send(to, seq, payload());
            }
        }
    }

    /// Collects the payloads of sequence number `seq` from the ranks for
    /// which `expected` is true, indexing them by rank.
    fn collect(
        &mut self,
        seq: u64,
        expected: &[bool],
    ) -> Result<Vec<Option<Payload>>, CollectiveError> {
        let num_workers = self.num_workers();
        let mut got: Vec<Option<Payload>> = (0..num_workers).map(|_| None).collect();
        let mut missing = expected.iter().filter(|&&e| e).count();

        let stash = std::mem::take(&mut self.stash);
        for envelope in stash {
            if envelope.seq == seq && expected[envelope.from] && got[envelope.from].is_none() {
                got[envelope.from] = Some(envelope.payload);
                missing -= 1;
            } else {
                self.stash.push(envelope);
            }
        }

        for rank in 0..num_workers {
            if expected[rank] && got[rank].is_none() && self.departed[rank] {
                return Err(CollectiveError::Departed { rank });
            }
        }

        while missing > 0 {
            let envelope = self.inbox.recv().map_err(|_| {
                let rank = (0..num_workers)
                    .find(|&r| expected[r] && got[r].is_none())
                    .unwrap_or(self.rank);
                CollectiveError::Departed { rank }
            })?;
            let from = envelope.from;
            match envelope.payload {
                Payload::Abort(reason) => {
                    self.aborted = Some((from, reason));
                    self.check_aborted()?;
                }
                Payload::Departed => {
                    self.departed[from] = true;
                    if expected[from] && got[from].is_none() {
                        return Err(CollectiveError::Departed { rank: from });
                    }
                }
                payload if envelope.seq == seq => {
                    if !expected[from] || got[from].is_some() {
                        return Err(CollectiveError::Protocol {
                            rank: from,
                            detail: format!("unexpected message in collective {}", seq),
                        });
                    }
                    got[from] = Some(payload);
                    missing -= 1;
                }
                payload => self.stash.push(Envelope {
                    from,
                    seq: envelope.seq,
                    payload,
                }),
            }
        }
        Ok(got)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn others(&self) -> Vec<bool> {
        (0..self.num_workers()).map(|r| r != self.rank).collect()
    }
}

fn scalar(rank: usize, payload: Option<Payload>) -> Result<u64, CollectiveError> {
    match payload {
        Some(Payload::Scalar(value)) => Ok(value),
        _ => Err(CollectiveError::Protocol {
            rank,
            detail: "expected a scalar".to_owned(),
        }),
    }
}

impl Collective for LocalCoordinator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_workers(&self) -> usize {
        self.peers.len()
    }

    fn all_reduce_min(&mut self, values: &mut [f64]) -> Result<(), CollectiveError> {
        self.check_aborted()?;
        let seq = self.next_seq();
        self.broadcast(seq, || Payload::Min(values.to_vec()));
        let others = self.others();
        let got = self.collect(seq, &others)?;

        let mine = values.to_vec();
        let mut first = true;
        for (rank, payload) in got.iter().enumerate() {
            let contribution = if rank == self.rank {
                mine.as_slice()
            } else {
                match payload {
                    Some(Payload::Min(v)) => v.as_slice(),
                    _ => {
                        return Err(CollectiveError::Protocol {
                            rank,
                            detail: "expected a distance vector".to_owned(),
                        })
                    }
                }
            };
            if contribution.len() != values.len() {
                return Err(CollectiveError::LengthMismatch {
                    rank,
                    expected: values.len(),
                    actual: contribution.len(),
                });
            }
            if first {
                values.copy_from_slice(contribution);
                first = false;
            } else {
                fold_min(values, contribution);
            }
        }
        Ok(())
    }

    fn all_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, CollectiveError> {
        self.check_aborted()?;
        let seq = self.next_seq();
        self.broadcast(seq, || Payload::Scalar(value));
        let others = self.others();
        let got = self.collect(seq, &others)?;
        let mut result = None;
        for (rank, payload) in got.into_iter().enumerate() {
            let v = if rank == self.rank {
                value
            } else {
                scalar(rank, payload)?
            };
            result = Some(result.map_or(v, |acc| op.apply(acc, v)));
        }
        Ok(result.unwrap_or(value))
    }

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
        self.check_aborted()?;
        let seq = self.next_seq();
        if self.rank != root {
            self.send(root, seq, Payload::Scalar(value));
            return Ok(None);
        }
        let others = self.others();
        let got = self.collect(seq, &others)?;
        let mut result = None;
        for (rank, payload) in got.into_iter().enumerate() {
            let v = if rank == self.rank {
                value
            } else {
                scalar(rank, payload)?
            };
            result = Some(result.map_or(v, |acc| op.apply(acc, v)));
        }
        Ok(result)
    }

    fn abort(&mut self, reason: &str) {
        log::error!("Worker {} aborting the cohort: {}", self.rank, reason);
        self.broadcast(0, || Payload::Abort(reason.to_owned()));
        if self.aborted.is_none() {
            self.aborted = Some((self.rank, reason.to_owned()));
        }
    }
}

impl Drop for LocalCoordinator {
    fn drop(&mut self) {
        if self.aborted.is_some() {
            return;
        }
        self.broadcast(self.seq, || Payload::Departed);
    }
}
