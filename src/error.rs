//! Error handling

use thiserror::Error;

use crate::topology::Rank;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Set of errors that can occur while setting up or running a pipeline.
///
/// Note that a worker that skips a collective operation is not an error: like an MPI
/// collective, the call blocks on the other participants until it is matched. A worker that
/// returns an error or panics is different, its peers are released with `Error::Aborted`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A universe needs at least one worker
    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    /// Rank outside of `0..size`
    #[error("invalid rank {rank} for a communicator of size {size}")]
    InvalidRank {
        /// Offending rank
        rank: Rank,
        /// Size of the communicator
        size: Rank,
    },

    /// Receive buffer does not match the counts sent by the participants
    #[error("invalid count: expected {expected} elements, got {actual}")]
    InvalidCount {
        /// Count implied by the collective
        expected: usize,
        /// Count provided by the caller
        actual: usize,
    },

    /// Two operands of an elementwise operation differ in length
    #[error("length mismatch: {left} != {right}")]
    LengthMismatch {
        /// Length of the left operand
        left: usize,
        /// Length of the right operand
        right: usize,
    },

    /// A contribution did not carry the datatype the root expected
    #[error("datatype mismatch in collective #{sequence} from rank {source_rank}")]
    TypeMismatch {
        /// Sequence number of the collective
        sequence: u64,
        /// Rank that sent the contribution
        source_rank: Rank,
    },

    /// All peers hung up before a collective completed
    #[error("rank {0} lost its peers during a collective operation")]
    Disconnected(Rank),

    /// Another worker failed or panicked and left the run
    #[error("rank {0} aborted the run")]
    Aborted(Rank),

    /// The thread of a worker could not be started
    #[error("failed to spawn worker {rank}: {reason}")]
    Spawn {
        /// Rank of the worker
        rank: Rank,
        /// Reason reported by the operating system
        reason: String,
    },

    /// A worker panicked instead of returning
    #[error("worker {0} panicked")]
    WorkerPanicked(Rank),

    /// Broken internal invariant
    #[error("internal error: {0}")]
    Internal(String),

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
