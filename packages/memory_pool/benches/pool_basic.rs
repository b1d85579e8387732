//! Basic benchmarks for the `memory_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::alloc::{Layout, alloc, dealloc};
use std::hint::black_box;
use std::num::NonZero;
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use memory_pool::{DEFAULT_ALIGNMENT, MemoryPool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const SMALL_SIZE: usize = 64;
const LARGE_SIZE: usize = 4096;

const ARENA_CAPACITY: usize = 64 * 1024 * 1024;

// SMALL_SIZE is a multiple of the alignment, so each round trip consumes exactly SMALL_SIZE bytes.
const ROUND_TRIPS_PER_RESET: u64 = (ARENA_CAPACITY / SMALL_SIZE) as u64;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_basic");

    group.bench_function("build_default", |b| {
        b.iter(|| drop(black_box(MemoryPool::builder().build().unwrap())));
    });

    let pool = MemoryPool::builder()
        .arena_capacity(NonZero::new(ARENA_CAPACITY).unwrap())
        .build()
        .unwrap();

    // Every measured allocation is served from the buffer. The arena is rewound in untimed
    // pauses before it can fill up and overflow to the heap.
    group.bench_function("small_round_trip", |b| {
        b.iter_custom(|iters| {
            let mut elapsed = Duration::ZERO;
            let mut remaining = iters;

            while remaining > 0 {
                let batch = remaining.min(ROUND_TRIPS_PER_RESET);
                remaining -= batch;

                let start = Instant::now();

                for _ in 0..batch {
                    let ptr = pool.allocate(black_box(SMALL_SIZE)).unwrap();
                    pool.deallocate(ptr, SMALL_SIZE).unwrap();
                }

                elapsed += start.elapsed();
                pool.reset().unwrap();
            }

            elapsed
        });
    });

    group.bench_function("large_round_trip", |b| {
        b.iter(|| {
            let ptr = pool.allocate(black_box(LARGE_SIZE)).unwrap();
            pool.deallocate(ptr, LARGE_SIZE).unwrap();
        });
    });

    group.bench_function("global_allocator_small_round_trip", |b| {
        let layout = Layout::from_size_align(SMALL_SIZE, DEFAULT_ALIGNMENT).unwrap();

        b.iter(|| {
            // SAFETY: The layout is not zero-sized.
            let ptr = unsafe { alloc(black_box(layout)) };
            assert!(!ptr.is_null());

            // SAFETY: Allocated just above with the same layout.
            unsafe { dealloc(ptr, layout) };
        });
    });

    group.finish();
}
