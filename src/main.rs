use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vector_add::config::DEFAULT_LEN;
use vector_add::generate::Seed;
use vector_add::kernel::{Operation, DEFAULT_SCALAR};
use vector_add::partition::RemainderPolicy;
use vector_add::report::RunReport;
use vector_add::{pipeline, Config};

/// Generate two random vectors across workers, add them and report timing and samples.
#[derive(Parser, Debug)]
#[command(name = "vector-add", version, about)]
struct Args {
    /// Total number of elements per vector
    #[arg(short = 'n', long, default_value_t = DEFAULT_LEN)]
    len: usize,

    /// Number of cooperating workers
    #[arg(short = 'w', long, env = "VECTOR_ADD_WORKERS", default_value_t = 1)]
    workers: usize,

    /// Arithmetic pass: `add` or `add-dot-scale`
    #[arg(short = 'o', long, default_value_t = Operation::Add)]
    operation: Operation,

    /// Factor applied to x and y by `add-dot-scale`
    #[arg(long, default_value_t = DEFAULT_SCALAR)]
    scalar: f64,

    /// Base seed of the random streams; taken from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Handling of elements that do not divide evenly: `spread` or `truncate`
    #[arg(long, default_value_t = RemainderPolicy::Spread)]
    remainder: RemainderPolicy,
}

impl From<Args> for Config {
    fn from(args: Args) -> Config {
        Config {
            len: args.len,
            workers: args.workers,
            operation: args.operation,
            scalar: args.scalar,
            seed: args.seed.map(Seed),
            remainder: args.remainder,
        }
    }
}

fn run(args: Args) -> vector_add::Result<RunReport> {
    pipeline::run(&Config::from(args))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("vector-add: {}", e);
            ExitCode::FAILURE
        }
    }
}
