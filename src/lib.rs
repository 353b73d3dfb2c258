#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
#![warn(trivial_casts)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

//! Random vector arithmetic over SPMD message-passing collectives
//!
//! Two vectors of uniformly distributed values in `[0, 100)` are generated across a number of
//! workers, added elementwise and optionally reduced to a dot product and scaled. The
//! coordinator (rank 0) gathers every vector and reports its first and last ten elements along
//! with the time spent in the arithmetic.
//!
//! Workers execute the same program (SPMD) and communicate exclusively through collective
//! operations modelled on the Message Passing Interface: a barrier, a broadcast, gathers with
//! equal and varying counts, and reductions. Like their MPI counterparts, collectives must be
//! entered by every worker in the same order.
//!
//! # Usage
//!
//! ```no_run
//! use vector_add::traits::*;
//! use vector_add::collective::SystemOperation;
//!
//! let universe = vector_add::initialize(4).unwrap();
//! let sums = universe
//!     .run(|world| {
//!         let mut sum = 0;
//!         world.all_reduce_into(&world.rank(), &mut sum, SystemOperation::sum())?;
//!         Ok(sum)
//!     })
//!     .unwrap();
//! assert_eq!(sums, vec![6; 4]);
//! ```
//!
//! The whole pipeline is a single call:
//!
//! ```no_run
//! use vector_add::{pipeline, Config};
//! use vector_add::kernel::Operation;
//!
//! let config = Config::default().with_workers(4).with_operation(Operation::AddDotScale);
//! let report = pipeline::run(&config).unwrap();
//! print!("{}", report);
//! ```

pub mod collective;
pub mod config;
pub mod datatype;
pub mod environment;
pub mod error;
pub mod generate;
pub mod kernel;
pub mod partition;
pub mod pipeline;
pub mod raw;
pub mod report;
pub mod timer;
pub mod topology;

/// Re-exports all traits.
pub mod traits {
    pub use crate::collective::traits::*;
    pub use crate::datatype::traits::*;
    pub use crate::topology::traits::*;
}

pub use crate::config::Config;
pub use crate::environment::{initialize, time, time_resolution, Universe};
pub use crate::error::{Error, Result};
pub use crate::topology::Rank;
