//! Deallocation path: validation of the handle, status flip and coalescing
//! of free neighbours during the same walk.

use tracing::{debug, error};

use crate::{
    arena::{Arena, ArenaPtr},
    block::{BlockStatus, HEADER_SIZE, Header},
    error::{AllocError, AllocResult, ErrorKind},
    site::Site,
};

/// Outcome of a successful release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Release {
    /// Header offset of the freed block.
    pub offset: usize,
    /// Number of merges performed during the walk.
    pub merges: usize,
}

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Returns the block whose payload starts at `ptr` to the arena.
    ///
    /// `None` plays the role of a null pointer. Failures are reported on the
    /// `tracing` error channel together with `site` and then returned; the
    /// arena is left as it was.
    ///
    /// ### Errors
    /// - [`ErrorKind::NullPointer`] if `ptr` is `None`.
    /// - [`ErrorKind::DoubleFree`] if the block is already free.
    /// - [`ErrorKind::PointerNotFound`] if `ptr` is not the payload start of
    ///   any block, e.g. an interior or foreign pointer.
    pub fn deallocate(&mut self, ptr: Option<ArenaPtr>, site: Site) -> AllocResult<()> {
        match self.release(ptr) {
            Ok(release) => {
                debug!(
                    offset = release.offset,
                    merges = release.merges,
                    %site,
                    "freed block"
                );

                Ok(())
            }
            Err(kind) => {
                error!(%site, "free failed: {kind}");

                Err(AllocError::new(kind, site))
            }
        }
    }

    /// Deallocation without diagnostics.
    ///
    /// The whole chain is walked on every call. Every block visited gets a
    /// chance to absorb its right neighbour, and the previous block gets a
    /// chance to absorb the current one, so the freed block and its
    /// neighbours are reconciled in a single pass.
    pub(crate) fn release(&mut self, ptr: Option<ArenaPtr>) -> Result<Release, ErrorKind> {
        let ptr = ptr.ok_or(ErrorKind::NullPointer)?;

        if self.is_pristine() {
            // Nothing was ever handed out: the only payload is the one of the
            // implicit free block.
            return Err(if ptr.offset() == HEADER_SIZE {
                ErrorKind::DoubleFree { offset: 0 }
            } else {
                ErrorKind::PointerNotFound
            });
        }

        let mut offset = 0;
        let mut prev: Option<usize> = None;
        let mut freed = None;
        let mut merges = 0;

        while offset < CAPACITY {
            let header = self.header_at(offset)?;

            if offset + HEADER_SIZE == ptr.offset() {
                if header.is_free() {
                    return Err(ErrorKind::DoubleFree { offset });
                }

                self.write_header(offset, Header::new(header.payload_size, BlockStatus::Free))?;
                freed = Some(offset);
            }

            if self.coalesce(offset)? {
                merges += 1;
            }

            if let Some(prev_offset) = prev {
                if self.coalesce(prev_offset)? {
                    merges += 1;
                    offset = prev_offset;
                }
            }

            prev = Some(offset);
            offset = self.header_at(offset)?.next_offset(offset)?;
        }

        freed
            .map(|offset| Release { offset, merges })
            .ok_or(ErrorKind::PointerNotFound)
    }
}
