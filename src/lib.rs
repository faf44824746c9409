//! # arenalloc - A fixed-arena memory allocator
//!
//! Every allocation is carved out of one statically sized buffer. There are
//! no system calls and no growth: once the arena is exhausted, allocations
//! fail until something is freed.
//!
//! ## Overview
//!
//! The arena is an implicit chain of blocks. Each block is a header followed
//! by its payload, and the next header starts right where the payload ends:
//!
//! ```text
//!   0                                                                 CAPACITY
//!   +--------+----------+--------+-------------------+--------+------------+
//!   | Header | Payload  | Header |      Payload      | Header |  Payload   |
//!   | InUse  |          | Free   |                   | InUse  |            |
//!   +--------+----------+--------+-------------------+--------+------------+
//!            ^                                                ^
//!            +------------ handles given to callers ----------+
//! ```
//!
//! - **Allocation** walks the chain from the start and takes the first free
//!   block that fits (first fit). If what is left over can host a header and
//!   at least 8 bytes, it becomes a new free block; otherwise the whole block
//!   is handed out.
//! - **Deallocation** walks the chain again, flips the matching block to free
//!   and merges adjacent free blocks on the way, so no two neighbours are ever
//!   both free.
//! - **Validation** rejects zero or oversized requests, null handles,
//!   double frees and handles that are not the start of a payload. Errors
//!   never modify the arena.
//!
//! ## Crate Structure
//!
//! ```text
//!   arenalloc
//!   ├── arena     - Arena buffer, bounds-checked header access, handles
//!   ├── block     - Header layout and status
//!   ├── fit       - First-fit allocation and splitting
//!   ├── free      - Deallocation walk
//!   ├── coalesce  - Merging of adjacent free blocks
//!   ├── stats     - Usage snapshot and structural checks
//!   ├── global    - Mutex-guarded GlobalAlloc adapter
//!   ├── error     - Error kinds
//!   ├── site      - Call-site identifiers
//!   └── utils     - Alignment helpers
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use arenalloc::{Arena, ErrorKind, site};
//!
//! let mut arena = Arena::<4096>::new();
//!
//! let ptr = arena.allocate(100, site!()).unwrap();
//! arena.payload_mut(ptr).unwrap()[0] = 42;
//! assert_eq!(arena.payload(ptr).unwrap()[0], 42);
//!
//! arena.deallocate(Some(ptr), site!()).unwrap();
//!
//! let err = arena.deallocate(Some(ptr), site!()).unwrap_err();
//! assert!(matches!(err.kind(), ErrorKind::DoubleFree { .. }));
//! ```
//!
//! ## Diagnostics
//!
//! Failed operations are reported through `tracing` at the error level with
//! the caller's [`Site`] before the error is returned. Successful operations
//! are traced at the debug and trace levels.
//!
//! ## Limitations
//!
//! - **Single-threaded**: [`Arena`] has no internal locking. [`LockedArena`]
//!   adds a mutex around the whole arena.
//! - **Fixed alignment**: payloads are aligned to 8 bytes, nothing more.
//! - **Linear time**: both allocation and deallocation walk the chain.

mod arena;
mod block;
mod coalesce;
mod error;
mod fit;
mod free;
mod global;
mod site;
mod stats;
pub mod utils;

pub use arena::{Arena, ArenaPtr, BlockInfo, Blocks, DEFAULT_CAPACITY};
pub use block::{BlockStatus, HEADER_SIZE, MIN_BLOCK_SIZE};
pub use error::{AllocError, AllocResult, ErrorKind};
pub use global::LockedArena;
pub use site::Site;
pub use stats::ArenaStats;
