//! This module lets an [`Arena`] replace the platform allocator.
//!
//! The arena itself is not synchronised, so [`LockedArena`] puts it behind a
//! [`Mutex`] and implements [`GlobalAlloc`] on top of the quiet allocation
//! and deallocation paths. Nothing is logged from here: a `tracing`
//! subscriber may allocate, which would re-enter the allocator.
//!
//! ```no_run
//! use arenalloc::LockedArena;
//!
//! #[global_allocator]
//! static ALLOCATOR: LockedArena<{ 1 << 20 }> = LockedArena::new();
//!
//! fn main() {
//!     let boxed = Box::new(42);
//!     assert_eq!(*boxed, 42);
//! }
//! ```

use std::{
    alloc::{GlobalAlloc, Layout},
    ptr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    arena::{Arena, DEFAULT_CAPACITY},
    stats::ArenaStats,
    utils::ALIGNMENT,
};

/// An [`Arena`] guarded by a lock, usable as `#[global_allocator]`.
pub struct LockedArena<const CAPACITY: usize = DEFAULT_CAPACITY> {
    arena: Mutex<Arena<CAPACITY>>,
}

impl<const CAPACITY: usize> LockedArena<CAPACITY> {
    pub const fn new() -> Self {
        Self {
            arena: Mutex::new(Arena::new()),
        }
    }

    /// Locks the arena. A poisoned lock is recovered, since every arena
    /// operation leaves the block chain valid even when it fails.
    pub fn lock(&self) -> MutexGuard<'_, Arena<CAPACITY>> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> ArenaStats {
        self.lock().stats()
    }
}

impl<const CAPACITY: usize> Default for LockedArena<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<const CAPACITY: usize> GlobalAlloc for LockedArena<CAPACITY> {
    /// Returns null for alignments above the arena's fixed alignment unit,
    /// for zero-sized layouts and when the arena is exhausted.
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return ptr::null_mut();
        }

        let mut arena = self.lock();
        match arena.place(layout.size()) {
            Ok(placement) => arena.as_mut_ptr(placement.ptr),
            Err(_) => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        let mut arena = self.lock();
        let handle = arena.ptr_from_raw(ptr);
        // Bad pointers are the caller's bug; the arena stays consistent.
        let _ = arena.release(handle);
    }
}
