//! Collective communication
//!
//! Every operation in this module is collective: all workers of the communicator have to call
//! it, and they have to call the collectives in the same order. A worker that skips a call
//! leaves the others blocked inside it; there is no timeout. Operations that single out one
//! worker are methods of the `Root` trait, implemented for `Process`.
//!
//! Contributions are exchanged as owned copies, so every participant keeps exclusive ownership
//! of its local buffers throughout.
use tracing::debug;

use crate::datatype::traits::*;
use crate::error::{Error, Result};
use crate::raw::traits::*;
use crate::raw::{Payload, Transport};
use crate::topology::traits::*;
use crate::topology::{Process, Rank};

/// Collective traits
pub mod traits {
    pub use super::{CommunicatorCollectives, ReduceOperation, Root};
}

fn unpack<T: 'static>(payload: Payload, sequence: u64, source_rank: Rank) -> Result<T> {
    payload
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::TypeMismatch {
            sequence,
            source_rank,
        })
}

fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::InvalidCount { expected, actual })
    }
}

/// Collective communication patterns defined on `Communicator`s
pub trait CommunicatorCollectives: Communicator {
    /// Barrier synchronization among all workers in a `Communicator`
    ///
    /// Workers will enter the barrier and block execution until all workers in the
    /// `Communicator` `&self` have entered the barrier.
    ///
    /// # Examples
    ///
    /// See `demos/barrier.rs`
    fn barrier(&self) -> Result<()> {
        let raw = self.as_raw();
        let sequence = raw.next_sequence();
        if raw.rank() == 0 {
            for source in 1..raw.size() {
                unpack::<()>(raw.receive(source, sequence)?, sequence, source)?;
            }
            for dest in 1..raw.size() {
                raw.send(dest, sequence, Box::new(()))?;
            }
        } else {
            raw.send(0, sequence, Box::new(()))?;
            unpack::<()>(raw.receive(0, sequence)?, sequence, 0)?;
        }
        Ok(())
    }

    /// Performs a global reduction under the operation `op` of the value `sendbuf` and
    /// stores the result in `recvbuf` on all workers.
    ///
    /// # Examples
    ///
    /// See `demos/reduce.rs`
    fn all_reduce_into<T, O>(&self, sendbuf: &T, recvbuf: &mut T, op: O) -> Result<()>
    where
        Self: Sized,
        T: Equivalence,
        O: ReduceOperation<T>,
    {
        let root = self.process_at_rank(0);
        if root.is_self() {
            root.reduce_into_root(sendbuf, recvbuf, op)?;
        } else {
            root.reduce_into(sendbuf, op)?;
        }
        root.broadcast_into(std::slice::from_mut(recvbuf))
    }
}

impl<C: Communicator> CommunicatorCollectives for C {}

/// Something that can take the role of 'root' in a collective operation.
///
/// Many collective operations define a 'root' worker that takes a special role in the
/// communication. These collective operations are implemented as default methods of this trait.
pub trait Root: AsCommunicator {
    /// Rank of the root process
    fn root_rank(&self) -> Rank;

    /// Broadcast of the contents of a buffer
    ///
    /// After the call completes, `buffer` on all workers will contain what it contains on the
    /// `Root`. Every `buffer` must have the same length.
    fn broadcast_into<T>(&self, buffer: &mut [T]) -> Result<()>
    where
        T: Equivalence,
    {
        let raw = self.as_communicator().as_raw();
        let root = self.root_rank();
        let sequence = raw.next_sequence();
        if raw.rank() == root {
            for dest in (0..raw.size()).filter(|&r| r != root) {
                raw.send(dest, sequence, Box::new(buffer.to_vec()))?;
            }
        } else {
            let received: Vec<T> = unpack(raw.receive(root, sequence)?, sequence, root)?;
            check_count(buffer.len(), received.len())?;
            buffer.copy_from_slice(&received);
        }
        Ok(())
    }

    /// Gather contents of buffers on `Root`.
    ///
    /// After the call completes, the contents of the buffers on all ranks will be
    /// concatenated in rank order into the buffer on `Root`.
    ///
    /// All send buffers must have the same count of elements.
    ///
    /// This function must be called on all non-root workers.
    ///
    /// # Examples
    ///
    /// See `demos/gather.rs`
    fn gather_into<T>(&self, sendbuf: &[T]) -> Result<()>
    where
        T: Equivalence,
    {
        let raw = self.as_communicator().as_raw();
        assert_ne!(raw.rank(), self.root_rank());
        let sequence = raw.next_sequence();
        raw.send(self.root_rank(), sequence, Box::new(sendbuf.to_vec()))
    }

    /// Gather contents of buffers on `Root`.
    ///
    /// After the call completes, the contents of the buffers on all ranks will be
    /// concatenated in rank order into `recvbuf`, which must hold `sendbuf.len()` elements per
    /// worker.
    ///
    /// This function must be called on the root worker.
    ///
    /// # Examples
    ///
    /// See `demos/gather.rs`
    fn gather_into_root<T>(&self, sendbuf: &[T], recvbuf: &mut [T]) -> Result<()>
    where
        T: Equivalence,
    {
        let raw = self.as_communicator().as_raw();
        assert_eq!(raw.rank(), self.root_rank());
        let sequence = raw.next_sequence();
        let count = sendbuf.len();
        check_count(count * self.as_communicator().size_usize(), recvbuf.len())?;
        let counts = vec![count; self.as_communicator().size_usize()];
        collect_at_root(raw, sequence, sendbuf, recvbuf, &counts)
    }

    /// Gather contents of buffers with varying counts on `Root`.
    ///
    /// This function must be called on all non-root workers.
    fn gather_varcount_into<T>(&self, sendbuf: &[T]) -> Result<()>
    where
        T: Equivalence,
    {
        self.gather_into(sendbuf)
    }

    /// Gather contents of buffers with varying counts on `Root`.
    ///
    /// `counts[r]` is the number of elements contributed by rank `r`; the contributions are
    /// placed contiguously and in rank order into `recvbuf`, whose length must equal the sum of
    /// `counts`.
    ///
    /// This function must be called on the root worker.
    fn gather_varcount_into_root<T>(
        &self,
        sendbuf: &[T],
        recvbuf: &mut [T],
        counts: &[usize],
    ) -> Result<()>
    where
        T: Equivalence,
    {
        let raw = self.as_communicator().as_raw();
        assert_eq!(raw.rank(), self.root_rank());
        let sequence = raw.next_sequence();
        check_count(self.as_communicator().size_usize(), counts.len())?;
        check_count(counts.iter().sum(), recvbuf.len())?;
        collect_at_root(raw, sequence, sendbuf, recvbuf, counts)
    }

    /// Performs a global reduction under the operation `op` of the value `sendbuf`, storing
    /// the result on the `Root` worker.
    ///
    /// This function must be called on all non-root workers.
    ///
    /// # Examples
    ///
    /// See `demos/reduce.rs`
    fn reduce_into<T, O>(&self, sendbuf: &T, _op: O) -> Result<()>
    where
        T: Equivalence,
        O: ReduceOperation<T>,
    {
        let raw = self.as_communicator().as_raw();
        assert_ne!(raw.rank(), self.root_rank());
        let sequence = raw.next_sequence();
        raw.send(self.root_rank(), sequence, Box::new(*sendbuf))
    }

    /// Performs a global reduction under the operation `op` of the value `sendbuf`, storing
    /// the result in `recvbuf` on the `Root` worker.
    ///
    /// Contributions are folded in rank order, so the result is reproducible for a given
    /// communicator size.
    ///
    /// This function must be called on the root worker.
    ///
    /// # Examples
    ///
    /// See `demos/reduce.rs`
    fn reduce_into_root<T, O>(&self, sendbuf: &T, recvbuf: &mut T, op: O) -> Result<()>
    where
        T: Equivalence,
        O: ReduceOperation<T>,
    {
        let raw = self.as_communicator().as_raw();
        let root = self.root_rank();
        assert_eq!(raw.rank(), root);
        let sequence = raw.next_sequence();

        let mut accumulated: Option<T> = None;
        for source in 0..raw.size() {
            let contribution = if source == root {
                *sendbuf
            } else {
                unpack(raw.receive(source, sequence)?, sequence, source)?
            };
            accumulated = Some(match accumulated {
                Some(acc) => op.apply(acc, contribution),
                None => contribution,
            });
        }
        if let Some(result) = accumulated {
            *recvbuf = result;
        }
        debug!(root, sequence, "reduction complete");
        Ok(())
    }
}

fn collect_at_root<T: Equivalence>(
    raw: &Transport,
    sequence: u64,
    sendbuf: &[T],
    recvbuf: &mut [T],
    counts: &[usize],
) -> Result<()> {
    let mut offset = 0;
    for (source, &count) in (0..).zip(counts) {
        let chunk = &mut recvbuf[offset..offset + count];
        if source == raw.rank() {
            check_count(count, sendbuf.len())?;
            chunk.copy_from_slice(sendbuf);
        } else {
            let received: Vec<T> = unpack(raw.receive(source, sequence)?, sequence, source)?;
            check_count(count, received.len())?;
            chunk.copy_from_slice(&received);
        }
        offset += count;
    }
    debug!(root = raw.rank(), sequence, len = offset, "gather complete");
    Ok(())
}

impl<'a, C: 'a + Communicator> Root for Process<'a, C> {
    fn root_rank(&self) -> Rank {
        self.rank()
    }
}

/// An operation to be used in a reduction, e.g. a sum
///
/// Reductions fold the contributions in rank order, `op(op(x0, x1), x2)` and so on, so the
/// operation only has to be associative.
pub trait ReduceOperation<T> {
    /// Combine the value accumulated so far with the next contribution.
    fn apply(&self, accumulated: T, contribution: T) -> T;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SystemOp {
    Max,
    Min,
    Sum,
    Product,
}

/// A built-in operation like a sum
///
/// # Examples
///
/// See `demos/reduce.rs`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SystemOperation(SystemOp);

macro_rules! system_operation_constructors {
    ($($ctor:ident => $val:path),*) => (
        $(pub fn $ctor() -> SystemOperation {
            //! A built-in operation
            SystemOperation($val)
        })*
    )
}

impl SystemOperation {
    system_operation_constructors! {
        max => SystemOp::Max,
        min => SystemOp::Min,
        sum => SystemOp::Sum,
        product => SystemOp::Product
    }
}

impl<T: Arithmetic> ReduceOperation<T> for SystemOperation {
    fn apply(&self, accumulated: T, contribution: T) -> T {
        match self.0 {
            SystemOp::Max => {
                if contribution > accumulated {
                    contribution
                } else {
                    accumulated
                }
            }
            SystemOp::Min => {
                if contribution < accumulated {
                    contribution
                } else {
                    accumulated
                }
            }
            SystemOp::Sum => accumulated + contribution,
            SystemOp::Product => accumulated * contribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_operations_fold_as_expected() {
        assert_eq!(SystemOperation::sum().apply(2.5, 4.0), 6.5);
        assert_eq!(SystemOperation::product().apply(3, 4), 12);
        assert_eq!(SystemOperation::max().apply(3, 7), 7);
        assert_eq!(SystemOperation::min().apply(3, 7), 3);
    }
}
