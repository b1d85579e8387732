//! Thread safety integration tests for `memory_pool`.
//!
//! These tests verify that one pool can be shared by many threads without losing
//! any accounting.

use std::num::NonZero;
use std::sync::{Arc, Barrier};
use std::thread;

use memory_pool::MemoryPool;

const THREADS: usize = 8;
const ITERATIONS: usize = 200;

#[test]
fn concurrent_allocations_are_all_counted() {
    // A small arena so that some threads overflow to the heap while others still bump.
    let pool = Arc::new(
        MemoryPool::builder()
            .arena_capacity(NonZero::new(4096).unwrap())
            .build()
            .unwrap(),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles = (0..THREADS)
        .map(|thread_index| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                let mut held = Vec::with_capacity(ITERATIONS);

                for i in 0..ITERATIONS {
                    // Mix of small and large sizes, different per thread.
                    let size = 1 + (thread_index * 37 + i * 13) % 600;
                    let ptr = pool.allocate(size).unwrap();

                    // SAFETY: The block is live, at least `size` bytes and only this thread has it.
                    unsafe {
                        ptr.as_ptr().write_bytes(u8::try_from(thread_index).unwrap(), size);
                    }

                    held.push((ptr.as_ptr().addr(), size));

                    // Return every other block right away, keep the rest until the end.
                    if i % 2 == 0 {
                        pool.deallocate(ptr, size).unwrap();
                        held.pop();
                    }
                }

                held
            })
        })
        .collect::<Vec<_>>();

    let mut expected_allocated = 0_u64;
    let mut held_by_threads = Vec::new();

    for handle in handles {
        held_by_threads.extend(handle.join().unwrap());
    }

    for thread_index in 0..THREADS {
        for i in 0..ITERATIONS {
            expected_allocated += u64::try_from(1 + (thread_index * 37 + i * 13) % 600).unwrap();
        }
    }

    assert_eq!(pool.bytes_allocated(), expected_allocated);
    assert_eq!(pool.live_allocations(), held_by_threads.len());

    let still_live: u64 = held_by_threads
        .iter()
        .map(|(_, size)| u64::try_from(*size).unwrap())
        .sum();
    assert_eq!(
        pool.bytes_allocated() - pool.bytes_deallocated(),
        still_live
    );
}

#[test]
fn pool_can_be_moved_between_threads() {
    let pool = MemoryPool::builder().build().unwrap();
    let ptr = pool.allocate(100).unwrap();
    let address = ptr.as_ptr().addr();

    let pool = thread::spawn(move || {
        assert_eq!(pool.live_allocations(), 1);
        pool
    })
    .join()
    .unwrap();

    assert_eq!(ptr.as_ptr().addr(), address);
    pool.deallocate(ptr, 100).unwrap();
}

#[test]
fn threads_can_share_a_borrowed_pool() {
    let pool = MemoryPool::builder().build().unwrap();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for size in [1_usize, 100, 255, 256, 5000] {
                    let ptr = pool.allocate(size).unwrap();
                    pool.deallocate(ptr, size).unwrap();
                }
            });
        }
    });

    assert_eq!(pool.live_allocations(), 0);
    assert_eq!(pool.bytes_allocated(), pool.bytes_deallocated());
}
