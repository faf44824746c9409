use arenalloc::{Arena, ArenaPtr, site};
use tracing_subscriber::{EnvFilter, fmt};

fn log_alloc(arena: &Arena<1024>, ptr: ArenaPtr, size: usize) {
    println!("Requested {size} bytes of memory");
    println!("Received offset {}", ptr.offset());
    println!("Arena: {}", arena.stats());
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .init();

    let mut arena = Arena::<1024>::new();

    let a = arena.allocate(8, site!()).unwrap();
    log_alloc(&arena, a, 8);

    let b = arena.allocate(13, site!()).unwrap();
    log_alloc(&arena, b, 13);

    let c = arena.allocate(64, site!()).unwrap();
    log_alloc(&arena, c, 64);

    arena.deallocate(Some(a), site!()).unwrap();
    arena.deallocate(Some(b), site!()).unwrap();
    println!("After freeing a and b: {}", arena.stats());

    // Each of these is reported on the error channel.
    let _ = arena.deallocate(Some(a), site!());
    let _ = arena.deallocate(None, site!());
    let _ = arena.allocate(0, site!());
    let _ = arena.allocate(2048, site!());

    arena.deallocate(Some(c), site!()).unwrap();
    println!("After freeing everything: {}", arena.stats());
}
