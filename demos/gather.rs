#![deny(warnings)]

use vector_add::traits::*;

fn main() {
    let universe = vector_add::initialize(4).unwrap();
    universe
        .run(|world| {
            let root_rank = 0;
            let root_process = world.process_at_rank(root_rank);

            let count = world.size_usize();
            let factor = world.rank() as u64 + 1;
            let a = (1_u64..).take(count).map(|x| x * factor).collect::<Vec<_>>();

            if world.rank() == root_rank {
                let mut t = vec![0u64; count * count];
                root_process.gather_into_root(&a[..], &mut t[..])?;
                println!("Root gathered table:");
                for r in t.chunks(count) {
                    println!("{:?}", r);
                }
                assert!((0_u64..)
                    .zip(t.iter())
                    .all(|(a, &b)| b == (a / count as u64 + 1) * (a % count as u64 + 1)));
            } else {
                root_process.gather_into(&a[..])?;
            }

            // rank r contributes r + 1 copies of its rank
            let counts = (1..=count).collect::<Vec<_>>();
            let mine = vec![world.rank(); world.rank() as usize + 1];
            if world.rank() == root_rank {
                let mut ragged = vec![0; counts.iter().sum()];
                root_process.gather_varcount_into_root(&mine[..], &mut ragged[..], &counts)?;
                println!("Root gathered ragged sequence: {:?}.", ragged);
            } else {
                root_process.gather_varcount_into(&mine[..])?;
            }
            Ok(())
        })
        .unwrap();
}
