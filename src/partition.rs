//! Splitting a vector across workers
//!
//! A vector of `len` elements is cut into one contiguous segment per worker, in rank order.
//! How the remainder `len % workers` is handled is a `RemainderPolicy`.
use std::fmt;
use std::str::FromStr;

use conv::ConvUtil;

use crate::error::{Error, Result};
use crate::topology::Rank;

/// What happens to the `len % workers` elements that do not divide evenly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// The first `len % workers` workers own one extra element. Lengths sum to `len`.
    #[default]
    Spread,
    /// Every worker owns `len / workers` elements and the trailing remainder is never
    /// generated, computed or reported.
    Truncate,
}

impl fmt::Display for RemainderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RemainderPolicy::Spread => f.write_str("spread"),
            RemainderPolicy::Truncate => f.write_str("truncate"),
        }
    }
}

impl FromStr for RemainderPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spread" => Ok(RemainderPolicy::Spread),
            "truncate" => Ok(RemainderPolicy::Truncate),
            other => Err(Error::InvalidConfig(format!(
                "unknown remainder policy `{}`",
                other
            ))),
        }
    }
}

/// The segment of a vector owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Owning worker
    pub rank: Rank,
    /// Index of the first element within the full vector
    pub offset: usize,
    /// Number of elements
    pub len: usize,
}

impl Partition {
    /// Global index range covered by this partition
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Splits `len` elements across `workers` workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    len: usize,
    workers: usize,
    policy: RemainderPolicy,
}

impl Partitioner {
    /// A partitioner for `len` elements over `workers` workers.
    ///
    /// Fails if `workers` is zero.
    pub fn new(len: usize, workers: usize, policy: RemainderPolicy) -> Result<Partitioner> {
        if workers == 0 {
            return Err(Error::InvalidWorkerCount(workers));
        }
        Ok(Partitioner {
            len,
            workers,
            policy,
        })
    }

    /// Total length of the logical vector
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the logical vector is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Remainder policy in effect
    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    fn index(&self, rank: Rank) -> Result<usize> {
        rank.value_as::<usize>()
            .ok()
            .filter(|&r| r < self.workers)
            .ok_or(Error::InvalidRank {
                rank,
                size: self.workers.value_as::<Rank>().unwrap_or(Rank::MAX),
            })
    }

    fn len_at(&self, index: usize) -> usize {
        let base = self.len / self.workers;
        match self.policy {
            RemainderPolicy::Truncate => base,
            RemainderPolicy::Spread if index < self.len % self.workers => base + 1,
            RemainderPolicy::Spread => base,
        }
    }

    fn offset_at(&self, index: usize) -> usize {
        let base = self.len / self.workers;
        match self.policy {
            RemainderPolicy::Truncate => base * index,
            RemainderPolicy::Spread => base * index + index.min(self.len % self.workers),
        }
    }

    /// Number of elements owned by `rank`
    pub fn local_len(&self, rank: Rank) -> Result<usize> {
        self.index(rank).map(|i| self.len_at(i))
    }

    /// The partition owned by `rank`
    pub fn partition(&self, rank: Rank) -> Result<Partition> {
        let index = self.index(rank)?;
        Ok(Partition {
            rank,
            offset: self.offset_at(index),
            len: self.len_at(index),
        })
    }

    /// Element counts of all workers, in rank order
    pub fn counts(&self) -> Vec<usize> {
        (0..self.workers).map(|i| self.len_at(i)).collect()
    }

    /// Whether every worker owns the same number of elements
    pub fn is_uniform(&self) -> bool {
        self.policy == RemainderPolicy::Truncate || self.len % self.workers == 0
    }

    /// Number of elements covered by the partitions, `len - len % workers` when truncating
    pub fn covered_len(&self) -> usize {
        match self.policy {
            RemainderPolicy::Truncate => self.len - self.len % self.workers,
            RemainderPolicy::Spread => self.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn even_split() {
        let p = Partitioner::new(100_000, 4, RemainderPolicy::Spread).unwrap();
        assert_eq!(p.counts(), vec![25_000; 4]);
        assert_eq!(
            p.partition(3).unwrap(),
            Partition {
                rank: 3,
                offset: 75_000,
                len: 25_000
            }
        );
        assert!(p.is_uniform());
    }

    #[test]
    fn truncation_drops_the_remainder() {
        let p = Partitioner::new(10, 3, RemainderPolicy::Truncate).unwrap();
        assert_eq!(p.counts(), vec![3, 3, 3]);
        assert_eq!(p.covered_len(), 9);
        assert_eq!(p.partition(2).unwrap().range(), 6..9);
    }

    #[test]
    fn spreading_gives_leading_workers_an_extra_element() {
        let p = Partitioner::new(10, 3, RemainderPolicy::Spread).unwrap();
        assert_eq!(p.counts(), vec![4, 3, 3]);
        assert_eq!(p.partition(1).unwrap().range(), 4..7);
        assert!(!p.is_uniform());
    }

    #[test]
    fn more_workers_than_elements() {
        let p = Partitioner::new(2, 4, RemainderPolicy::Spread).unwrap();
        assert_eq!(p.counts(), vec![1, 1, 0, 0]);
        let t = Partitioner::new(2, 4, RemainderPolicy::Truncate).unwrap();
        assert_eq!(t.covered_len(), 0);
    }

    #[test]
    fn bad_arguments() {
        assert_eq!(
            Partitioner::new(10, 0, RemainderPolicy::Spread),
            Err(Error::InvalidWorkerCount(0))
        );
        let p = Partitioner::new(10, 2, RemainderPolicy::Spread).unwrap();
        assert_eq!(
            p.partition(2),
            Err(Error::InvalidRank { rank: 2, size: 2 })
        );
        assert!(p.local_len(-1).is_err());
        assert!("uneven".parse::<RemainderPolicy>().is_err());
    }

    proptest! {
        #[test]
        fn partitions_tile_the_covered_range(
            len in 0usize..5_000,
            workers in 1usize..64,
            truncate in any::<bool>(),
        ) {
            let policy = if truncate {
                RemainderPolicy::Truncate
            } else {
                RemainderPolicy::Spread
            };
            let p = Partitioner::new(len, workers, policy).unwrap();
            let mut next = 0;
            for rank in 0..workers as Rank {
                let part = p.partition(rank).unwrap();
                prop_assert_eq!(part.offset, next);
                next = part.offset + part.len;
            }
            prop_assert_eq!(next, p.covered_len());
            prop_assert_eq!(p.counts().iter().sum::<usize>(), p.covered_len());

            let counts = p.counts();
            let max = counts.iter().max().copied().unwrap_or(0);
            let min = counts.iter().min().copied().unwrap_or(0);
            prop_assert!(max - min <= 1);
            if truncate {
                prop_assert_eq!(p.covered_len(), len - len % workers);
            } else {
                prop_assert_eq!(p.covered_len(), len);
            }
        }
    }
}
