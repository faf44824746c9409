//! Usage statistics and structural checks of an arena.
//!
//! Both are computed by walking the block chain, so they cost as much as an
//! allocation. They are meant for diagnostics and tests.

use std::fmt;

use crate::{
    arena::Arena,
    block::HEADER_SIZE,
    error::ErrorKind,
    utils::ALIGNMENT,
};

/// Snapshot of how the arena is carved up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub capacity: usize,
    pub blocks: usize,
    pub free_blocks: usize,
    /// Payload bytes of in-use blocks, internal fragmentation included.
    pub used_bytes: usize,
    /// Payload bytes of free blocks.
    pub free_bytes: usize,
    /// Bytes spent on headers.
    pub overhead_bytes: usize,
    /// Payload of the largest free block: the biggest request that can
    /// currently succeed.
    pub largest_free: usize,
}

impl ArenaStats {
    #[inline]
    pub fn used_blocks(&self) -> usize {
        self.blocks - self.free_blocks
    }
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} blocks ({} free), {} used / {} free / {} overhead bytes of {}, largest free {}",
            self.blocks,
            self.free_blocks,
            self.used_bytes,
            self.free_bytes,
            self.overhead_bytes,
            self.capacity,
            self.largest_free,
        )
    }
}

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Collects an [`ArenaStats`] snapshot.
    pub fn stats(&self) -> ArenaStats {
        self.blocks().fold(
            ArenaStats {
                capacity: CAPACITY,
                ..ArenaStats::default()
            },
            |mut stats, block| {
                stats.blocks += 1;
                stats.overhead_bytes += HEADER_SIZE;

                if block.is_free() {
                    stats.free_blocks += 1;
                    stats.free_bytes += block.payload_size;
                    stats.largest_free = stats.largest_free.max(block.payload_size);
                } else {
                    stats.used_bytes += block.payload_size;
                }

                stats
            },
        )
    }

    /// Verifies the layout invariants of the block chain:
    /// - every payload size is a multiple of the alignment unit,
    /// - no two adjacent blocks are both free,
    /// - the footprints add up to exactly the capacity.
    pub fn check(&self) -> Result<(), ErrorKind> {
        if self.is_pristine() {
            return Ok(());
        }

        let mut offset = 0;
        let mut prev_free = false;

        while offset < CAPACITY {
            let header = self.header_at(offset)?;

            if header.payload_size % ALIGNMENT != 0 {
                return Err(ErrorKind::Corrupted {
                    offset,
                    reason: "unaligned payload size",
                });
            }

            if prev_free && header.is_free() {
                return Err(ErrorKind::Corrupted {
                    offset,
                    reason: "adjacent free blocks",
                });
            }

            prev_free = header.is_free();
            offset = header.next_offset(offset)?;
        }

        if offset != CAPACITY {
            return Err(ErrorKind::Corrupted {
                offset,
                reason: "blocks do not add up to the capacity",
            });
        }

        Ok(())
    }
}
