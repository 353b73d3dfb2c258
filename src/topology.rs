//! Organizing workers as communicators
//!
//! All workers partaking in a run are organized in a context called the 'world communicator'
//! which `Universe::run` hands to every worker. Workers can be addressed via their `Rank`
//! within the communicator. This information is encapsulated in a `Process`.
use conv::ConvUtil;

use crate::raw::traits::*;
use crate::raw::Transport;

/// Topology traits
pub mod traits {
    pub use super::{AsCommunicator, Communicator};
}

/// Something that has a communicator associated with it
pub trait AsCommunicator {
    /// The type of the associated communicator
    type Out: Communicator;
    /// Returns the associated communicator.
    fn as_communicator(&self) -> &Self::Out;
}

/// Identifies a certain worker within a communicator.
pub type Rank = i32;

/// The communicator containing every worker of a `Universe`
///
/// Each worker owns its own handle; handles are moved into the worker threads and never
/// shared between them.
pub struct WorldCommunicator(Transport);

impl WorldCommunicator {
    pub(crate) fn from_raw(transport: Transport) -> WorldCommunicator {
        WorldCommunicator(transport)
    }
}

impl AsRaw for WorldCommunicator {
    type Raw = Transport;
    fn as_raw(&self) -> &Self::Raw {
        &self.0
    }
}

impl RawCommunicator for WorldCommunicator {}

impl Communicator for WorldCommunicator {}

impl AsCommunicator for WorldCommunicator {
    type Out = WorldCommunicator;
    fn as_communicator(&self) -> &Self::Out {
        self
    }
}

/// Communicators are contexts for communication
pub trait Communicator: RawCommunicator {
    /// Number of workers in this communicator
    ///
    /// # Examples
    /// See `demos/barrier.rs`
    fn size(&self) -> Rank {
        self.as_raw().size()
    }

    /// The `Rank` that identifies the calling worker within this communicator
    ///
    /// # Examples
    /// See `demos/barrier.rs`
    fn rank(&self) -> Rank {
        self.as_raw().rank()
    }

    /// `size()` as an index type
    fn size_usize(&self) -> usize {
        // ranks are non-negative by construction
        self.size().value_as::<usize>().unwrap_or_default()
    }

    /// Bundles a reference to this communicator with a specific `Rank` into a `Process`.
    ///
    /// # Examples
    /// See `demos/gather.rs` `demos/reduce.rs`
    fn process_at_rank(&self, r: Rank) -> Process<Self>
    where
        Self: Sized,
    {
        assert!(
            0 <= r && r < self.size(),
            "rank {} outside of communicator of size {}",
            r,
            self.size()
        );
        Process::by_rank_unchecked(self, r)
    }

    /// A `Process` for the calling worker
    fn this_process(&self) -> Process<Self>
    where
        Self: Sized,
    {
        let rank = self.rank();
        Process::by_rank_unchecked(self, rank)
    }
}

/// Identifies a worker by its `Rank` within a certain communicator.
pub struct Process<'a, C>
where
    C: 'a + Communicator,
{
    comm: &'a C,
    rank: Rank,
}

impl<'a, C> Process<'a, C>
where
    C: 'a + Communicator,
{
    fn by_rank_unchecked(c: &'a C, r: Rank) -> Self {
        Process { comm: c, rank: r }
    }

    /// The process rank
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Whether this process is the calling worker
    pub fn is_self(&self) -> bool {
        self.comm.rank() == self.rank
    }
}

impl<'a, C> AsCommunicator for Process<'a, C>
where
    C: 'a + Communicator,
{
    type Out = C;
    fn as_communicator(&self) -> &Self::Out {
        self.comm
    }
}
