//! Environmental management
//!
//! This module sets up the workers of a run and gives them access to the process clock.
//!
//! A `Universe` owns nothing but its size. `Universe::run` wires a fresh fabric of channels,
//! spawns one thread per rank, runs the same body on every rank (SPMD) and finalizes with a
//! barrier before the threads are joined.
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use conv::ConvUtil;
use once_cell::sync::Lazy;
use tracing::{debug, error};

use crate::collective::traits::*;
use crate::error::{Error, Result};
use crate::raw::traits::*;
use crate::raw::Transport;
use crate::topology::{Rank, WorldCommunicator};

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Global context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Universe {
    size: Rank,
}

impl Universe {
    /// Number of workers `run` spawns
    pub fn size(&self) -> Rank {
        self.size
    }

    /// Time in seconds since an arbitrary time in the past, see `time()`.
    pub fn get_time(&self) -> f64 {
        time()
    }

    /// Nominal resolution of `get_time()` in seconds, see `time_resolution()`.
    pub fn get_time_res(&self) -> f64 {
        time_resolution()
    }

    /// Run `body` on every worker of the universe.
    ///
    /// Each worker receives its own handle to the world communicator. Workers that return
    /// `Ok` meet in a final barrier. Results are returned in rank order.
    ///
    /// A worker that returns an error or panics aborts the run: collectives its peers are
    /// blocked in, or enter later, fail with `Error::Aborted`. A panicking worker is reported
    /// as `Error::WorkerPanicked`, which takes precedence over errors returned by the other
    /// workers; otherwise the first error that is not a consequence of an abort is returned.
    ///
    /// # Examples
    /// See `demos/barrier.rs`
    pub fn run<F, R>(&self, body: F) -> Result<Vec<R>>
    where
        F: Fn(&WorldCommunicator) -> Result<R> + Sync,
        R: Send,
    {
        let body = &body;
        let (transports, aborts) = Transport::fabric(self.size);
        let outcomes = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(transports.len());
            for transport in transports {
                let rank = transport.rank();
                let spawned = thread::Builder::new()
                    .name(format!("rank-{}", rank))
                    .spawn_scoped(scope, move || run_worker(body, transport));
                match spawned {
                    Ok(handle) => handles.push((rank, handle)),
                    Err(e) => {
                        error!(rank, error = %e, "failed to spawn worker");
                        for handle in &aborts {
                            handle.abort(rank);
                        }
                        return Err(Error::Spawn {
                            rank,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            // from here on an inbox disconnects once all of its peers are gone
            drop(aborts);

            Ok(handles
                .into_iter()
                .map(|(rank, handle)| (rank, handle.join()))
                .collect::<Vec<_>>())
        })?;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for (rank, outcome) in outcomes {
            match outcome {
                Err(_) => {
                    error!(rank, "worker panicked");
                    return Err(Error::WorkerPanicked(rank));
                }
                Ok(Err(e)) => {
                    debug!(rank, error = %e, "worker failed");
                    errors.push(e);
                }
                Ok(Ok(result)) => results.push(result),
            }
        }
        let cause = errors
            .iter()
            .position(|e| !matches!(e, Error::Aborted(_)))
            .unwrap_or(0);
        match errors.into_iter().nth(cause) {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

/// Body of one worker thread. On failure the peers are told to give up before the error or the
/// panic leaves the thread.
fn run_worker<F, R>(body: &F, transport: Transport) -> Result<R>
where
    F: Fn(&WorldCommunicator) -> Result<R>,
{
    let world = WorldCommunicator::from_raw(transport);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<R> {
        let result = body(&world)?;
        world.barrier()?;
        Ok(result)
    }));
    match outcome {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => {
            world.as_raw().abort();
            Err(e)
        }
        Err(payload) => {
            world.as_raw().abort();
            panic::resume_unwind(payload)
        }
    }
}

/// Set up a universe of `size` workers.
///
/// # Examples
/// See `demos/barrier.rs`
pub fn initialize(size: usize) -> Result<Universe> {
    if size == 0 {
        return Err(Error::InvalidWorkerCount(size));
    }
    let size = size
        .value_as::<Rank>()
        .map_err(|_| Error::InvalidWorkerCount(size))?;
    Lazy::force(&EPOCH);
    debug!(size, "universe initialized");
    Ok(Universe { size })
}

/// Time in seconds since an arbitrary time in the past.
///
/// The clock is monotonic and shared by all workers of the process.
pub fn time() -> f64 {
    EPOCH.elapsed().as_secs_f64()
}

/// Nominal resolution of `time()` in seconds.
///
/// This is the granularity of the `Duration` that `time()` is computed from, one nanosecond.
/// The monotonic clock of the platform may tick more coarsely.
pub fn time_resolution() -> f64 {
    Duration::from_nanos(1).as_secs_f64()
}
