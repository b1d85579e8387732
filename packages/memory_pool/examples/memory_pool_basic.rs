//! Basic usage of `MemoryPool`: small and large buffers, arena overflow and the usage report.

use std::num::NonZero;

use memory_pool::{MemoryPool, Route};

fn main() {
    // A deliberately small arena so that we can watch it overflow.
    let pool = MemoryPool::builder()
        .arena_capacity(NonZero::new(256).unwrap())
        .build()
        .unwrap();

    println!(
        "Requests under {} bytes go to the arena.",
        pool.routing_threshold()
    );

    let mut buffers = Vec::new();

    for size in [16, 48, 100, 200, 300, 2000] {
        let ptr = pool.allocate(size).unwrap();
        let route = match pool.route(size) {
            Route::Small => "small",
            Route::Large => "large",
        };

        println!(
            "Allocated {size} bytes ({route}), arena used: {} of {}",
            pool.arena_used(),
            pool.arena_capacity()
        );

        buffers.push((ptr, size));
    }

    for (ptr, size) in buffers {
        pool.deallocate(ptr, size).unwrap();
    }

    println!();
    println!("{}", pool.statistic());

    // Everything was returned, so the arena can be rewound for the next run.
    pool.reset().unwrap();
    println!("After reset, arena used: {}", pool.arena_used());
}
