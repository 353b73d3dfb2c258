//! Run configuration
use crate::error::{Error, Result};
use crate::generate::Seed;
use crate::kernel::{Operation, DEFAULT_SCALAR};
use crate::partition::{Partitioner, RemainderPolicy};

/// Length of the vectors when none is configured
pub const DEFAULT_LEN: usize = 100_000;

/// Parameters of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Total number of elements per vector
    pub len: usize,
    /// Number of workers
    pub workers: usize,
    /// Arithmetic pass
    pub operation: Operation,
    /// Factor applied by `Operation::AddDotScale`
    pub scalar: f64,
    /// Base seed; drawn from the clock when absent
    pub seed: Option<Seed>,
    /// Handling of `len % workers`
    pub remainder: RemainderPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            len: DEFAULT_LEN,
            workers: 1,
            operation: Operation::Add,
            scalar: DEFAULT_SCALAR,
            seed: None,
            remainder: RemainderPolicy::Spread,
        }
    }
}

impl Config {
    /// Set the vector length.
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the arithmetic pass.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Set the scaling factor.
    pub fn with_scalar(mut self, scalar: f64) -> Self {
        self.scalar = scalar;
        self
    }

    /// Fix the base seed.
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the remainder policy.
    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    /// Check the configuration for values no run can work with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkerCount(self.workers));
        }
        if !self.scalar.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "scalar must be finite, got {}",
                self.scalar
            )));
        }
        Ok(())
    }

    /// Partitioner matching this configuration
    pub fn partitioner(&self) -> Result<Partitioner> {
        Partitioner::new(self.len, self.workers, self.remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_program() {
        let config = Config::default();
        assert_eq!(config.len, 100_000);
        assert_eq!(config.scalar, 2.0);
        assert_eq!(config.operation, Operation::Add);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_values() {
        assert_eq!(
            Config::default().with_workers(0).validate(),
            Err(Error::InvalidWorkerCount(0))
        );
        assert!(Config::default()
            .with_scalar(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let config = Config::default()
            .with_len(10)
            .with_workers(3)
            .with_operation(Operation::AddDotScale)
            .with_seed(Seed(9))
            .with_remainder(RemainderPolicy::Truncate);
        assert_eq!(config.partitioner().unwrap().covered_len(), 9);
        assert_eq!(config.seed, Some(Seed(9)));
    }
}
