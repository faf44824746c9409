//! Runs the program on top of a [`LockedArena`] and prints how the arena is
//! carved up after each step. Everything the standard library allocates
//! below, including stdout buffers and thread bookkeeping, comes out of
//! `ALLOCATOR`.

use std::{alloc::Layout, thread};

use arenalloc::{HEADER_SIZE, LockedArena};

#[global_allocator]
static ALLOCATOR: LockedArena<{ 1 << 20 }> = LockedArena::new();

fn report(step: &str) {
    println!("{step:<28} {}", ALLOCATOR.stats());
}

fn main() {
    report("startup");

    // Requests are rounded up to 8 bytes and cost one header each.
    let before = ALLOCATOR.stats();
    let odd = vec![0u8; 13];
    let after = ALLOCATOR.stats();
    println!(
        "13-byte vec took {} payload bytes plus a {HEADER_SIZE}-byte header",
        after.used_bytes - before.used_bytes
    );
    drop(odd);
    report("after dropping the vec");

    // Three neighbours freed in any order collapse back into free space the
    // next request can take whole.
    let blocks: Vec<Box<[u64; 8]>> = (0..3).map(|_| Box::new([0; 8])).collect();
    let start = blocks[0].as_ptr() as usize;
    let end = blocks[2].as_ptr() as usize + 64;
    report("three 64-byte boxes");
    drop(blocks);
    report("boxes dropped");

    let merged = Box::new([0u64; 24]);
    println!(
        "boxes spanned {start:#x}..{end:#x}, a 192-byte box now lands at {:#x}",
        merged.as_ptr() as usize
    );
    drop(merged);

    // Over-aligned layouts are refused rather than misaligned.
    let page = Layout::from_size_align(64, 4096).expect("valid layout");
    let refused = unsafe { std::alloc::alloc(page) }.is_null();
    println!("4096-aligned request refused: {refused}");

    // The lock lets threads share the arena.
    let handles: Vec<_> = (0..4)
        .map(|i| thread::spawn(move || (0..16).map(|j| i * j).collect::<Vec<u64>>()))
        .collect();
    for handle in handles {
        let values = handle.join().unwrap_or_default();
        println!("thread summed {}", values.iter().sum::<u64>());
    }
    report("after threads");

    match ALLOCATOR.lock().check() {
        Ok(()) => println!("block chain is consistent"),
        Err(kind) => println!("block chain is broken: {kind}"),
    }
}
