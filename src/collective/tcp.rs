/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Collectives among processes connected through TCP.
//!
//! The cohort is a star: rank 0 (the hub) listens, and every other rank
//! connects to it. In every collective each rank sends its contribution to
//! the hub, which folds the contributions in rank order and sends back the
//! result. Messages are [`Frame`]s serialized with [`bincode`].

use super::{fold_min, Collective, CollectiveError, ReduceOp};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
enum Frame {
    Hello { rank: usize, num_workers: usize },
    Min(Vec<f64>),
    Scalar(u64),
    Abort { rank: usize, reason: String },
}

#[derive(Debug)]
struct Link {
    /// The rank at the other end.
    peer: usize,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Link {
    fn new(peer: usize, stream: TcpStream) -> Result<Self, CollectiveError> {
        let io = |source| CollectiveError::Io { rank: peer, source };
        stream.set_nodelay(true).map_err(io)?;
        let reader = BufReader::new(stream.try_clone().map_err(io)?);
        Ok(Self {
            peer,
            reader,
            writer: BufWriter::new(stream),
        })
    }

    fn send(&mut self, frame: &Frame) -> Result<(), CollectiveError> {
        bincode::serialize_into(&mut self.writer, frame)
            .map_err(|e| self.codec_error(e))?;
        self.writer.flush().map_err(|source| CollectiveError::Io {
            rank: self.peer,
            source,
        })
    }

    fn recv(&mut self) -> Result<Frame, CollectiveError> {
        bincode::deserialize_from(&mut self.reader).map_err(|e| self.codec_error(e))
    }

    fn codec_error(&self, error: bincode::Error) -> CollectiveError {
        match *error {
            bincode::ErrorKind::Io(source) => match source.kind() {
                std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe => CollectiveError::Departed { rank: self.peer },
                _ => CollectiveError::Io {
                    rank: self.peer,
                    source,
                },
            },
            kind => CollectiveError::Codec {
                rank: self.peer,
                source: Box::new(kind),
            },
        }
    }
}

/// The listening side of a TCP cohort.
///
/// Binding and accepting are separate steps so that the actual address can
/// be published (e.g., when binding to port 0) before the other workers
/// connect.
#[derive(Debug)]
pub struct TcpHub {
    listener: TcpListener,
}

impl TcpHub {
    pub fn bind(address: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self, CollectiveError> {
        let listener = TcpListener::bind(&address).map_err(|source| CollectiveError::Connect {
            address: format!("{:?}", address),
            source,
        })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the other `num_workers - 1` workers and returns the
    /// coordinator of rank 0.
    pub fn accept(self, num_workers: usize) -> Result<TcpCoordinator, CollectiveError> {
        if num_workers == 0 {
            return Err(CollectiveError::InvalidRank {
                rank: 0,
                num_workers,
            });
        }
        let mut links: Vec<Option<Link>> = (0..num_workers).map(|_| None).collect();
        let mut connected = 1;
        while connected < num_workers {
            let (stream, peer_addr) =
                self.listener
                    .accept()
                    .map_err(|source| CollectiveError::Io { rank: 0, source })?;
            // The rank is unknown until the greeting has been read
            let mut link = Link::new(usize::MAX, stream)?;
            let (rank, their_workers) = match link.recv()? {
                Frame::Hello { rank, num_workers } => (rank, num_workers),
                other => {
                    return Err(CollectiveError::Protocol {
                        rank: usize::MAX,
                        detail: format!("expected a greeting from {}, got {:?}", peer_addr, other),
                    })
                }
            };
            if their_workers != num_workers {
                return Err(CollectiveError::Protocol {
                    rank,
                    detail: format!(
                        "the worker expects a cohort of {} workers, not {}",
                        their_workers, num_workers
                    ),
                });
            }
            if rank == 0 || rank >= num_workers {
                return Err(CollectiveError::InvalidRank { rank, num_workers });
            }
            if links[rank].is_some() {
                return Err(CollectiveError::Protocol {
                    rank,
                    detail: "rank already connected".to_owned(),
                });
            }
            link.peer = rank;
            link.send(&Frame::Hello {
                rank: 0,
                num_workers,
            })?;
            log::debug!("Worker {} connected from {}", rank, peer_addr);
            links[rank] = Some(link);
            connected += 1;
        }
        log::info!("All {} workers connected", num_workers);
        Ok(TcpCoordinator {
            rank: 0,
            num_workers,
            role: Role::Hub(links.into_iter().flatten().collect()),
        })
    }
}

#[derive(Debug)]
enum Role {
    /// The links towards ranks `1..P`, in rank order.
    Hub(Vec<Link>),
    Spoke(Link),
}

/// A worker's endpoint in a cohort of processes.
#[derive(Debug)]
pub struct TcpCoordinator {
    rank: usize,
    num_workers: usize,
    role: Role,
}

impl TcpCoordinator {
    /// The default time a worker keeps trying to reach the hub.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connects to the hub as worker `rank` of a cohort of `num_workers`.
    ///
    /// Since the hub may not be listening yet, connection is retried until
    /// `timeout` has elapsed.
    pub fn join(
        address: impl ToSocketAddrs + std::fmt::Debug,
        rank: usize,
        num_workers: usize,
        timeout: Duration,
    ) -> Result<Self, CollectiveError> {
        if rank == 0 || rank >= num_workers {
            return Err(CollectiveError::InvalidRank { rank, num_workers });
        }
        let deadline = Instant::now() + timeout;
        let stream = loop {
            match TcpStream::connect(&address) {
                Ok(stream) => break stream,
                Err(source) if Instant::now() >= deadline => {
                    return Err(CollectiveError::Connect {
                        address: format!("{:?}", address),
                        source,
                    })
                }
                Err(_) => std::thread::sleep(Duration::from_millis(50)),
            }
        };
        let mut link = Link::new(0, stream)?;
        link.send(&Frame::Hello { rank, num_workers })?;
        match link.recv()? {
            Frame::Hello { rank: 0, .. } => {}
            Frame::Abort { rank, reason } => return Err(CollectiveError::Aborted { rank, reason }),
            other => {
                return Err(CollectiveError::Protocol {
                    rank: 0,
                    detail: format!("expected a greeting, got {:?}", other),
                })
            }
        }
        log::debug!("Worker {} joined the cohort", rank);
        Ok(Self {
            rank,
            num_workers,
            role: Role::Spoke(link),
        })
    }

    /// Runs a collective.
    ///
    /// On the hub, `fold` is called on `state` with the contributions of
    /// ranks `1..P` in rank order, and the frame built by `result` is sent to
    /// every rank. On the other ranks the contribution is sent to the hub, and
    /// the result is read back.
    fn exchange<S>(
        &mut self,
        mine: Frame,
        state: &mut S,
        fold: impl Fn(&mut S, usize, Frame) -> Result<(), CollectiveError>,
        result: impl FnOnce(&S) -> Frame,
    ) -> Result<Frame, CollectiveError> {
        match &mut self.role {
            Role::Hub(links) => {
                for i in 0..links.len() {
                    let peer = links[i].peer;
                    let frame = match links[i].recv() {
                        Ok(Frame::Abort { rank, reason }) => {
                            forward_abort(links, rank, &reason);
                            return Err(CollectiveError::Aborted { rank, reason });
                        }
                        Ok(frame) => frame,
                        Err(e) => {
                            forward_abort(links, peer, &e.to_string());
                            return Err(e);
                        }
                    };
                    if let Err(e) = fold(state, peer, frame) {
                        forward_abort(links, 0, &e.to_string());
                        return Err(e);
                    }
                }
                let frame = result(state);
                for link in links.iter_mut() {
                    link.send(&frame)?;
                }
                Ok(frame)
            }
            Role::Spoke(link) => {
                link.send(&mine)?;
                match link.recv()? {
                    Frame::Abort { rank, reason } => Err(CollectiveError::Aborted { rank, reason }),
                    frame => Ok(frame),
                }
            }
        }
    }
}

fn forward_abort(links: &mut [Link], rank: usize, reason: &str) {
    for link in links.iter_mut().filter(|link| link.peer != rank) {
        let _ = link.send(&Frame::Abort {
            rank,
            reason: reason.to_owned(),
        });
    }
}

fn unexpected(rank: usize, frame: &Frame) -> CollectiveError {
    CollectiveError::Protocol {
        rank,
        detail: format!("unexpected frame {:?}", frame),
    }
}

impl Collective for TcpCoordinator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn all_reduce_min(&mut self, values: &mut [f64]) -> Result<(), CollectiveError> {
        let len = values.len();
        let mut acc = values.to_vec();
        let reply = self.exchange(
            Frame::Min(values.to_vec()),
            &mut acc,
            |acc, rank, frame| match frame {
                Frame::Min(v) if v.len() == len => {
                    fold_min(acc, &v);
                    Ok(())
                }
                Frame::Min(v) => Err(CollectiveError::LengthMismatch {
                    rank,
                    expected: len,
                    actual: v.len(),
                }),
                other => Err(unexpected(rank, &other)),
            },
            |acc| Frame::Min(acc.clone()),
        )?;
        match reply {
            Frame::Min(v) if v.len() == len => {
                values.copy_from_slice(&v);
                Ok(())
            }
            Frame::Min(v) => Err(CollectiveError::LengthMismatch {
                rank: 0,
                expected: len,
                actual: v.len(),
            }),
            other => Err(unexpected(0, &other)),
        }
    }

    fn all_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, CollectiveError> {
        let mut acc = value;
        let reply = self.exchange(
            Frame::Scalar(value),
            &mut acc,
            |acc, rank, frame| match frame {
                Frame::Scalar(v) => {
                    *acc = op.apply(*acc, v);
                    Ok(())
                }
                other => Err(unexpected(rank, &other)),
            },
            |acc| Frame::Scalar(*acc),
        )?;
        match reply {
            Frame::Scalar(v) => Ok(v),
            other => Err(unexpected(0, &other)),
        }
    }

    fn abort(&mut self, reason: &str) {
        log::error!("Worker {} aborting the cohort: {}", self.rank, reason);
        let rank = self.rank;
        match &mut self.role {
            Role::Hub(links) => forward_abort(links, rank, reason),
            Role::Spoke(link) => {
                let _ = link.send(&Frame::Abort {
                    rank,
                    reason: reason.to_owned(),
                });
            }
        }
    }
}
