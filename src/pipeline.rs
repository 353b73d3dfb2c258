//! The SPMD vector pipeline
//!
//! Every worker runs `run_rank`: it generates its segments of `x` and `y`, adds them, and for
//! `Operation::AddDotScale` contributes its partial dot product to a sum reduction and scales
//! its segments afterwards. Each vector is then gathered on the coordinator, which keeps the
//! preview for the report. The collectives are entered in the same order on every worker:
//!
//! 1. reduce of the dot product (`AddDotScale` only)
//! 2. gather of `x`, `y`, `z`
//! 3. gather of the scaled `x`, `y` (`AddDotScale` only)
use tracing::{debug, info};

use crate::collective::traits::*;
use crate::collective::SystemOperation;
use crate::config::Config;
use crate::environment;
use crate::error::{Error, Result};
use crate::generate::{Generator, Seed};
use crate::kernel::{self, Operation};
use crate::partition::Partitioner;
use crate::report::{RunReport, Section, TITLE_SCALED_X, TITLE_SCALED_Y, TITLE_X, TITLE_Y, TITLE_Z};
use crate::timer::Stopwatch;
use crate::topology::traits::*;
use crate::topology::{Process, Rank};

/// Rank that reduces, gathers and reports
pub const COORDINATOR: Rank = 0;

/// Run the whole pipeline on `config.workers` workers and return the coordinator's report.
pub fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(Seed::from_clock);
    info!(
        len = config.len,
        workers = config.workers,
        operation = %config.operation,
        remainder = %config.remainder,
        seed = %seed,
        "starting run"
    );

    let universe = environment::initialize(config.workers)?;
    let reports = universe.run(|world| run_rank(world, config, seed))?;
    reports
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| Error::Internal("coordinator returned no report".to_owned()))
}

/// The body every worker executes. Returns the report on the coordinator and `None` elsewhere.
pub fn run_rank<C: Communicator>(
    world: &C,
    config: &Config,
    seed: Seed,
) -> Result<Option<RunReport>> {
    let partitioner = config.partitioner()?;
    if world.size_usize() != partitioner.workers() {
        return Err(Error::InvalidConfig(format!(
            "configured for {} workers but the communicator has {}",
            partitioner.workers(),
            world.size()
        )));
    }
    let rank = world.rank();
    let partition = partitioner.partition(rank)?;
    debug!(rank, offset = partition.offset, len = partition.len, "partition");

    let mut generator = Generator::for_rank(seed, rank);
    let mut x = generator.generate(partition.len);
    let mut y = generator.generate(partition.len);
    let mut z = vec![0.0; partition.len];

    let coordinator = world.process_at_rank(COORDINATOR);

    let watch = Stopwatch::start();
    kernel::add_into(&x, &y, &mut z)?;
    let dot = match config.operation {
        Operation::Add => None,
        Operation::AddDotScale => {
            let local_dot = kernel::dot(&x, &y)?;
            if coordinator.is_self() {
                let mut global_dot = 0.0;
                let sum = SystemOperation::sum();
                coordinator.reduce_into_root(&local_dot, &mut global_dot, sum)?;
                Some(global_dot)
            } else {
                coordinator.reduce_into(&local_dot, SystemOperation::sum())?;
                None
            }
        }
    };
    let elapsed = watch.stop();

    let mut sections = Vec::with_capacity(3);
    for (title, local) in [(TITLE_X, &x), (TITLE_Y, &y), (TITLE_Z, &z)] {
        sections.extend(gather_section(&coordinator, &partitioner, title, local)?);
    }

    let mut scaled = Vec::new();
    if config.operation == Operation::AddDotScale {
        kernel::scale(&mut x, config.scalar);
        kernel::scale(&mut y, config.scalar);
        for (title, local) in [(TITLE_SCALED_X, &x), (TITLE_SCALED_Y, &y)] {
            scaled.extend(gather_section(&coordinator, &partitioner, title, local)?);
        }
    }

    if !coordinator.is_self() {
        return Ok(None);
    }
    info!(elapsed, "run complete");
    Ok(Some(RunReport {
        sections,
        elapsed,
        dot,
        scaled,
        covered_len: partitioner.covered_len(),
    }))
}

/// Gather `local` on the coordinator and take its preview there.
fn gather_section<C: Communicator>(
    root: &Process<C>,
    partitioner: &Partitioner,
    title: &str,
    local: &[f64],
) -> Result<Option<Section>> {
    let uniform = partitioner.is_uniform();
    if root.is_self() {
        let mut full = vec![0.0; partitioner.covered_len()];
        if uniform {
            root.gather_into_root(local, &mut full)?;
        } else {
            root.gather_varcount_into_root(local, &mut full, &partitioner.counts())?;
        }
        Ok(Some(Section::from_full(title, &full)))
    } else {
        if uniform {
            root.gather_into(local)?;
        } else {
            root.gather_varcount_into(local)?;
        }
        Ok(None)
    }
}

/// The full `x` and `y` a distributed run with `config` and `seed` operates on: every
/// worker's generated segments, concatenated in rank order.
pub fn logical_inputs(config: &Config, seed: Seed) -> Result<(Vec<f64>, Vec<f64>)> {
    let partitioner = config.partitioner()?;
    let mut x = Vec::with_capacity(partitioner.covered_len());
    let mut y = Vec::with_capacity(partitioner.covered_len());
    for (rank, len) in (0..).zip(partitioner.counts()) {
        let mut generator = Generator::for_rank(seed, rank);
        x.extend(generator.generate(len));
        y.extend(generator.generate(len));
    }
    Ok((x, y))
}
