//! Bridge between communicator handles and the channel transport underneath them
//!
//! Every worker owns one inbox and holds a sender for the inbox of every other rank, so a
//! receive only fails once all peers have exited. Collective operations are numbered per
//! communicator; a message tagged with a sequence number the receiver has not reached yet is
//! parked in an unexpected-message queue until the matching collective is entered.
//!
//! A worker that fails or panics broadcasts an abort notice. Every pending and future
//! collective of its peers then fails with `Error::Aborted` instead of waiting on a
//! contribution that will never arrive.
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::topology::Rank;

/// Channel transport traits
pub mod traits {
    pub use super::{AsRaw, RawCommunicator};
}

/// A type that can hand out the transport it communicates through.
pub trait AsRaw {
    /// The transport type
    type Raw;
    /// The transport
    fn as_raw(&self) -> &Self::Raw;
}

impl<'a, T: 'a + AsRaw> AsRaw for &'a T {
    type Raw = <T as AsRaw>::Raw;
    fn as_raw(&self) -> &Self::Raw {
        (*self).as_raw()
    }
}

/// A type that can identify as a `Transport`
pub trait RawCommunicator: AsRaw<Raw = Transport> {}
impl<'a, T: 'a + RawCommunicator> RawCommunicator for &'a T {}

pub(crate) type Payload = Box<dyn Any + Send>;

enum Envelope {
    Data {
        source: Rank,
        sequence: u64,
        payload: Payload,
    },
    Abort {
        source: Rank,
    },
}

/// Sender of abort notices to one worker, held by the runtime while workers are being started
pub(crate) struct AbortHandle {
    rank: Rank,
    inbox: Sender<Envelope>,
}

impl AbortHandle {
    /// Tell the worker that `source` will not take part in the run.
    pub(crate) fn abort(&self, source: Rank) {
        if self.inbox.send(Envelope::Abort { source }).is_err() {
            trace!(rank = self.rank, source, "abort notice to a finished worker dropped");
        }
    }
}

/// Per-worker endpoint of the message-passing fabric.
///
/// Not `Sync`: a transport belongs to exactly one worker thread.
pub struct Transport {
    rank: Rank,
    size: Rank,
    inbox: Receiver<Envelope>,
    peers: Vec<Option<Sender<Envelope>>>,
    sequence: Cell<u64>,
    unexpected: RefCell<HashMap<(u64, Rank), Payload>>,
    aborted: Cell<Option<Rank>>,
}

impl Transport {
    /// Wire up a fully connected fabric of `size` endpoints, returned in rank order together
    /// with one `AbortHandle` per endpoint.
    ///
    /// While an endpoint's handle is alive its inbox never reports `Error::Disconnected`.
    pub(crate) fn fabric(size: Rank) -> (Vec<Transport>, Vec<AbortHandle>) {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| channel::<Envelope>()).unzip();

        let transports = receivers
            .into_iter()
            .zip(0..)
            .map(|(inbox, rank)| Transport {
                rank,
                size,
                inbox,
                peers: senders
                    .iter()
                    .zip(0..)
                    .map(|(sender, peer)| (peer != rank).then(|| sender.clone()))
                    .collect(),
                sequence: Cell::new(0),
                unexpected: RefCell::new(HashMap::new()),
                aborted: Cell::new(None),
            })
            .collect();
        let handles = senders
            .into_iter()
            .zip(0..)
            .map(|(inbox, rank)| AbortHandle { rank, inbox })
            .collect();
        (transports, handles)
    }

    /// Tell every peer that this worker leaves the run.
    pub(crate) fn abort(&self) {
        debug!(rank = self.rank, "aborting peers");
        for peer in self.peers.iter().flatten() {
            // a peer that already exited has nothing left to wait for
            let _ = peer.send(Envelope::Abort { source: self.rank });
        }
    }

    pub(crate) fn rank(&self) -> Rank {
        self.rank
    }

    pub(crate) fn size(&self) -> Rank {
        self.size
    }

    /// Enter the next collective, returning its sequence number.
    pub(crate) fn next_sequence(&self) -> u64 {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        sequence
    }

    pub(crate) fn send(&self, dest: Rank, sequence: u64, payload: Payload) -> Result<()> {
        let peer = usize::try_from(dest)
            .ok()
            .and_then(|d| self.peers.get(d))
            .ok_or(Error::InvalidRank {
                rank: dest,
                size: self.size,
            })?;
        if let Some(aborted) = self.aborted.get() {
            return Err(Error::Aborted(aborted));
        }
        trace!(source = self.rank, dest, sequence, "send");
        let Some(peer) = peer else {
            self.unexpected
                .borrow_mut()
                .insert((sequence, self.rank), payload);
            return Ok(());
        };
        peer.send(Envelope::Data {
            source: self.rank,
            sequence,
            payload,
        })
        .map_err(|_| self.lost_peer())
    }

    /// Why a peer's inbox is gone: a peer that aborts notifies everyone before it exits, so a
    /// pending notice in the inbox takes precedence over plain disconnection.
    fn lost_peer(&self) -> Error {
        while let Ok(envelope) = self.inbox.try_recv() {
            match envelope {
                Envelope::Abort { source } => {
                    self.aborted.set(Some(source));
                    return Error::Aborted(source);
                }
                Envelope::Data {
                    source,
                    sequence,
                    payload,
                } => {
                    self.unexpected.borrow_mut().insert((sequence, source), payload);
                }
            }
        }
        Error::Disconnected(self.rank)
    }

    /// Block until the contribution of `source` to collective `sequence` has arrived.
    ///
    /// Fails with `Error::Aborted` once any peer has aborted the run, even if that peer is not
    /// `source`: the collective can no longer be completed by everyone.
    pub(crate) fn receive(&self, source: Rank, sequence: u64) -> Result<Payload> {
        if let Some(payload) = self.unexpected.borrow_mut().remove(&(sequence, source)) {
            return Ok(payload);
        }
        if let Some(aborted) = self.aborted.get() {
            return Err(Error::Aborted(aborted));
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| Error::Disconnected(self.rank))?;
            match envelope {
                Envelope::Abort { source: aborted } => {
                    debug!(rank = self.rank, aborted, sequence, "peer aborted the run");
                    self.aborted.set(Some(aborted));
                    return Err(Error::Aborted(aborted));
                }
                Envelope::Data {
                    source: sender,
                    sequence: tag,
                    payload,
                } if sender == source && tag == sequence => return Ok(payload),
                Envelope::Data {
                    source: sender,
                    sequence: tag,
                    payload,
                } => {
                    trace!(
                        rank = self.rank,
                        source = sender,
                        sequence = tag,
                        "parking unexpected message"
                    );
                    self.unexpected.borrow_mut().insert((tag, sender), payload);
                }
            }
        }
    }
}
