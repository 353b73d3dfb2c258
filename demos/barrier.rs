#![deny(warnings)]

use vector_add::traits::*;

fn main() {
    let universe = vector_add::initialize(4).unwrap();
    universe
        .run(|world| {
            println!("Before barrier, rank {}.", world.rank());
            let t_start = vector_add::time();
            world.barrier()?;
            let t_end = vector_add::time();
            println!("After barrier, rank {} waited {} s.", world.rank(), t_end - t_start);
            Ok(())
        })
        .unwrap();
    println!("the clock has a resolution of {} seconds", universe.get_time_res());
}
