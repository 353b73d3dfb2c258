#![deny(warnings)]

use vector_add::collective::SystemOperation;
use vector_add::traits::*;
use vector_add::Rank;

fn main() {
    let universe = vector_add::initialize(4).unwrap();
    universe
        .run(|world| {
            let rank = world.rank();
            let size = world.size();
            let root_rank = 0;

            let mut sum: Rank = 0;
            if rank == root_rank {
                world
                    .process_at_rank(root_rank)
                    .reduce_into_root(&rank, &mut sum, SystemOperation::sum())?;
                assert_eq!(sum, size * (size - 1) / 2);
            } else {
                world
                    .process_at_rank(root_rank)
                    .reduce_into(&rank, SystemOperation::sum())?;
            }

            let mut max: Rank = -1;
            world.all_reduce_into(&rank, &mut max, SystemOperation::max())?;
            assert_eq!(max, size - 1);

            // local dot products reduced to a global one
            let x = (0..5).map(|i| f64::from(10 * rank + i)).collect::<Vec<_>>();
            let y = (0..5).map(|i| f64::from(100 * rank + i)).collect::<Vec<_>>();
            let local = vector_add::kernel::dot(&x, &y)?;
            let mut global = 0.0;
            world.all_reduce_into(&local, &mut global, SystemOperation::sum())?;
            if rank == root_rank {
                println!("global dot product: {}", global);
            }

            let mut factorial: u64 = 0;
            world.all_reduce_into(&(rank as u64 + 1), &mut factorial, SystemOperation::product())?;
            assert_eq!(factorial, 24);
            Ok(())
        })
        .unwrap();
}
