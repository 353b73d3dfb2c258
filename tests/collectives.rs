use vector_add::collective::SystemOperation;
use vector_add::traits::*;
use vector_add::{initialize, Error, Rank};

#[test]
fn gather_concatenates_in_rank_order() {
    let universe = initialize(4).unwrap();
    let gathered = universe
        .run(|world| {
            let root = world.process_at_rank(0);
            let local = vec![f64::from(world.rank()); 3];
            if root.is_self() {
                let mut full = vec![0.0; 12];
                root.gather_into_root(&local[..], &mut full[..])?;
                Ok(Some(full))
            } else {
                root.gather_into(&local[..])?;
                Ok(None)
            }
        })
        .unwrap();

    let full = gathered[0].as_ref().unwrap();
    let expected: Vec<f64> = (0..4)
        .flat_map(|r| std::iter::repeat(f64::from(r)).take(3))
        .collect();
    assert_eq!(full, &expected);
    assert!(gathered[1..].iter().all(Option::is_none));
}

#[test]
fn gather_to_a_non_zero_root() {
    let universe = initialize(3).unwrap();
    let gathered = universe
        .run(|world| {
            let root = world.process_at_rank(2);
            let local = [world.rank() * 10];
            if root.is_self() {
                let mut full = [0; 3];
                root.gather_into_root(&local[..], &mut full[..])?;
                Ok(full.to_vec())
            } else {
                root.gather_into(&local[..])?;
                Ok(Vec::new())
            }
        })
        .unwrap();
    assert_eq!(gathered[2], vec![0, 10, 20]);
}

#[test]
fn varcount_gather_places_segments_contiguously() {
    let universe = initialize(3).unwrap();
    let gathered = universe
        .run(|world| {
            let root = world.process_at_rank(0);
            let counts = [2, 0, 3];
            let local = vec![world.rank() as u64; counts[world.rank() as usize]];
            if root.is_self() {
                let mut full = vec![9; 5];
                root.gather_varcount_into_root(&local[..], &mut full[..], &counts)?;
                Ok(full)
            } else {
                root.gather_varcount_into(&local[..])?;
                Ok(Vec::new())
            }
        })
        .unwrap();
    assert_eq!(gathered[0], vec![0, 0, 2, 2, 2]);
}

#[test]
fn wrong_receive_buffer_is_rejected() {
    let universe = initialize(2).unwrap();
    let outcome = universe.run(|world| {
        let root = world.process_at_rank(0);
        if root.is_self() {
            let mut full = vec![0.0; 3];
            root.gather_into_root(&[1.0, 2.0][..], &mut full[..])
        } else {
            root.gather_into(&[3.0, 4.0][..])
        }
    });
    assert_eq!(
        outcome,
        Err(Error::InvalidCount {
            expected: 4,
            actual: 3
        })
    );
}

#[test]
fn mismatched_datatypes_are_detected() {
    let universe = initialize(2).unwrap();
    let outcome = universe.run(|world| {
        let root = world.process_at_rank(0);
        if root.is_self() {
            let mut sum = 0.0_f64;
            root.reduce_into_root(&1.0_f64, &mut sum, SystemOperation::sum())
        } else {
            root.reduce_into(&1_i32, SystemOperation::sum())
        }
    });
    assert_eq!(
        outcome,
        Err(Error::TypeMismatch {
            sequence: 0,
            source_rank: 1
        })
    );
}

#[test]
fn reduce_sums_every_contribution() {
    let universe = initialize(6).unwrap();
    let sums = universe
        .run(|world| {
            let root = world.process_at_rank(0);
            let rank = world.rank();
            if root.is_self() {
                let mut sum: Rank = 0;
                root.reduce_into_root(&rank, &mut sum, SystemOperation::sum())?;
                Ok(Some(sum))
            } else {
                root.reduce_into(&rank, SystemOperation::sum())?;
                Ok(None)
            }
        })
        .unwrap();
    assert_eq!(sums[0], Some(15));
}

#[test]
fn reductions_fold_every_rank_in_order() {
    let universe = initialize(4).unwrap();
    let results = universe
        .run(|world| {
            let rank = world.rank();
            let mut product = 0_u64;
            world.all_reduce_into(&(rank as u64 + 1), &mut product, SystemOperation::product())?;
            let mut max = 0.0;
            world.all_reduce_into(&(f64::from(rank) - 1.5), &mut max, SystemOperation::max())?;
            Ok((product, max))
        })
        .unwrap();
    assert_eq!(results, vec![(24, 1.5); 4]);
}

#[test]
fn all_reduce_and_broadcast_reach_everyone() {
    let universe = initialize(5).unwrap();
    let results = universe
        .run(|world| {
            let mut min = Rank::MAX;
            world.all_reduce_into(&(world.rank() + 3), &mut min, SystemOperation::min())?;

            let mut buffer = if world.rank() == 1 {
                [7.0, 8.0]
            } else {
                [0.0, 0.0]
            };
            world.process_at_rank(1).broadcast_into(&mut buffer[..])?;
            Ok((min, buffer))
        })
        .unwrap();
    assert!(results.iter().all(|&(min, buffer)| min == 3 && buffer == [7.0, 8.0]));
}

#[test]
fn collectives_interleave_without_mixing_up_messages() {
    // non-root workers run ahead through several gathers before the root reaches the first
    let universe = initialize(4).unwrap();
    let rounds = 25;
    let gathered = universe
        .run(|world| {
            let root = world.process_at_rank(0);
            let mut seen = Vec::new();
            for round in 0..rounds {
                let local = [world.rank() * 1000 + round];
                if root.is_self() {
                    if round == 0 {
                        std::thread::sleep(std::time::Duration::from_millis(20));
                    }
                    let mut full = [0; 4];
                    root.gather_into_root(&local[..], &mut full[..])?;
                    seen.push(full);
                } else {
                    root.gather_into(&local[..])?;
                }
            }
            world.barrier()?;
            Ok(seen)
        })
        .unwrap();

    for (round, full) in (0..).zip(&gathered[0]) {
        assert_eq!(full, &[round, 1000 + round, 2000 + round, 3000 + round]);
    }
}

#[test]
fn single_worker_collectives_are_local() {
    let universe = initialize(1).unwrap();
    let out = universe
        .run(|world| {
            let root = world.this_process();
            let mut full = [0.0; 2];
            root.gather_into_root(&[1.5, 2.5][..], &mut full[..])?;
            let mut sum = 0.0;
            root.reduce_into_root(&4.0, &mut sum, SystemOperation::sum())?;
            world.barrier()?;
            Ok((full, sum))
        })
        .unwrap();
    assert_eq!(out, vec![([1.5, 2.5], 4.0)]);
}

#[test]
fn worker_panicking_during_a_gather_releases_the_others() {
    let universe = initialize(5).unwrap();
    let outcome = universe.run(|world| {
        let root = world.process_at_rank(0);
        let local = [world.rank()];
        if world.rank() == 3 {
            panic!("rank 3 never contributes");
        }
        if root.is_self() {
            let mut full = [0; 5];
            root.gather_into_root(&local[..], &mut full[..])?;
        } else {
            root.gather_into(&local[..])?;
        }
        world.barrier()
    });
    assert_eq!(outcome, Err(Error::WorkerPanicked(3)));
}

#[test]
fn worker_error_reaches_the_caller_instead_of_a_hang() {
    let universe = initialize(3).unwrap();
    let outcome = universe.run(|world| {
        let root = world.process_at_rank(0);
        if world.rank() == 1 {
            return Err(Error::InvalidCount {
                expected: 2,
                actual: 1,
            });
        }
        let mut sum = 0.0;
        if root.is_self() {
            root.reduce_into_root(&1.0, &mut sum, SystemOperation::sum())?;
        } else {
            root.reduce_into(&1.0, SystemOperation::sum())?;
        }
        Ok(sum)
    });
    assert_eq!(
        outcome,
        Err(Error::InvalidCount {
            expected: 2,
            actual: 1
        })
    );
}
