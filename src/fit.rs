//! Allocation path: first-fit search over the implicit block chain and
//! splitting of the chosen block.

use tracing::{error, trace};

use crate::{
    arena::{Arena, ArenaPtr},
    block::{BlockStatus, HEADER_SIZE, Header, MIN_BLOCK_SIZE},
    error::{AllocError, AllocResult, ErrorKind},
    site::Site,
    utils::{ALIGNMENT, align},
};

/// Outcome of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub ptr: ArenaPtr,
    /// Payload recorded in the header. Larger than the rounded request when
    /// the remainder was too small to split off.
    pub payload_size: usize,
    pub split: bool,
}

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Allocates `size` bytes and returns the handle of the payload.
    ///
    /// The size is rounded up to a multiple of [`ALIGNMENT`]. Failures are
    /// reported on the `tracing` error channel together with `site` and then
    /// returned.
    ///
    /// ### Errors
    /// - [`ErrorKind::InvalidSize`] if `size` is zero or above
    ///   [`Arena::MAX_PAYLOAD`].
    /// - [`ErrorKind::OutOfMemory`] if no free block is large enough.
    pub fn allocate(&mut self, size: usize, site: Site) -> AllocResult<ArenaPtr> {
        match self.place(size) {
            Ok(placement) => {
                trace!(
                    size,
                    offset = placement.ptr.offset(),
                    payload_size = placement.payload_size,
                    split = placement.split,
                    %site,
                    "allocated block"
                );

                Ok(placement.ptr)
            }
            Err(kind) => {
                error!(%site, "allocation failed: {kind}");

                Err(AllocError::new(kind, site))
            }
        }
    }

    /// Allocation without diagnostics.
    pub(crate) fn place(&mut self, size: usize) -> Result<Placement, ErrorKind> {
        if size == 0 || size > Self::MAX_PAYLOAD {
            return Err(ErrorKind::InvalidSize { size });
        }

        // `MAX_PAYLOAD` is a multiple of the alignment unit, so this cannot
        // push the request past it.
        let rounded = align(size, ALIGNMENT);

        self.format_if_pristine()?;

        let offset = self
            .first_fit(rounded)?
            .ok_or(ErrorKind::OutOfMemory { size })?;

        self.carve(offset, rounded)
    }

    /// Returns the offset of the first free block able to hold `rounded`
    /// bytes of payload.
    fn first_fit(&self, rounded: usize) -> Result<Option<usize>, ErrorKind> {
        let mut offset = 0;

        while offset < CAPACITY {
            let header = self.header_at(offset)?;

            if header.is_free() && header.payload_size >= rounded {
                return Ok(Some(offset));
            }

            offset = header.next_offset(offset)?;
        }

        Ok(None)
    }

    /// Marks the free block at `offset` in use for `rounded` bytes, splitting
    /// the rest off as a new free block when it can stand on its own.
    fn carve(&mut self, offset: usize, rounded: usize) -> Result<Placement, ErrorKind> {
        let candidate = self.header_at(offset)?;
        let needed = HEADER_SIZE + rounded;
        let remaining = candidate.payload_size - rounded;

        let split = remaining >= MIN_BLOCK_SIZE;
        let payload_size = if split {
            // The remainder header is written first: if it fails, nothing in
            // the arena has changed yet.
            self.write_header(
                offset + needed,
                Header::new(remaining - HEADER_SIZE, BlockStatus::Free),
            )?;
            rounded
        } else {
            candidate.payload_size
        };

        self.write_header(offset, Header::new(payload_size, BlockStatus::InUse))?;

        Ok(Placement {
            ptr: ArenaPtr::from_offset(offset + HEADER_SIZE),
            payload_size,
            split,
        })
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::site;

    const CAPACITY: usize = 256;

    #[test]
    fn first_allocation_formats_and_splits() {
        let mut arena = Arena::<CAPACITY>::new();
        let ptr = arena.allocate(16, site!()).unwrap();

        assert_eq!(ptr.offset(), HEADER_SIZE);
        assert!(!arena.is_pristine());
        assert_eq!(
            arena.header_at(0),
            Ok(Header::new(16, BlockStatus::InUse))
        );
        assert_eq!(
            arena.header_at(HEADER_SIZE + 16),
            Ok(Header::new(
                CAPACITY - 2 * HEADER_SIZE - 16,
                BlockStatus::Free
            ))
        );
    }

    #[test]
    fn sizes_are_rounded_to_alignment() {
        let mut arena = Arena::<CAPACITY>::new();
        let first = arena.place(1).unwrap();
        let second = arena.place(9).unwrap();

        assert_eq!(first.payload_size, 8);
        assert_eq!(second.payload_size, 16);
        assert_eq!(second.ptr.offset(), first.ptr.offset() + 8 + HEADER_SIZE);
        assert_eq!(second.ptr.offset() % ALIGNMENT, 0);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let mut arena = Arena::<CAPACITY>::new();

        for size in [0, CAPACITY - HEADER_SIZE + 1, CAPACITY, usize::MAX] {
            let err = arena.allocate(size, site!()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidSize { size });
        }

        // Rejected requests do not even format the arena.
        assert!(arena.is_pristine());
    }

    #[test]
    fn largest_request_takes_whole_arena() {
        let mut arena = Arena::<CAPACITY>::new();
        let placement = arena.place(Arena::<CAPACITY>::MAX_PAYLOAD).unwrap();

        assert_eq!(placement.payload_size, CAPACITY - HEADER_SIZE);
        assert!(!placement.split);
        assert_eq!(
            arena.place(1),
            Err(ErrorKind::OutOfMemory { size: 1 })
        );
    }

    #[test]
    fn small_remainder_is_absorbed() {
        let mut arena = Arena::<CAPACITY>::new();
        // Leaves exactly one header worth of space, which is below the
        // minimum block size.
        let size = CAPACITY - 2 * HEADER_SIZE;
        let placement = arena.place(size).unwrap();

        assert!(!placement.split);
        assert_eq!(placement.payload_size, CAPACITY - HEADER_SIZE);
        assert_eq!(arena.blocks().count(), 1);
    }

    #[test]
    fn remainder_at_threshold_is_split() {
        let mut arena = Arena::<CAPACITY>::new();
        let size = CAPACITY - HEADER_SIZE - MIN_BLOCK_SIZE;
        let placement = arena.place(size).unwrap();

        assert!(placement.split);
        let blocks: Vec<_> = arena.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].is_free());
        assert_eq!(blocks[1].payload_size, ALIGNMENT);
    }

    #[test]
    fn first_fit_reuses_earliest_hole() {
        let mut arena = Arena::<CAPACITY>::new();
        let a = arena.place(32).unwrap().ptr;
        let _b = arena.place(16).unwrap().ptr;
        arena.release(Some(a)).unwrap();

        let c = arena.place(8).unwrap();
        assert_eq!(c.ptr, a);
        assert!(c.split);
    }

    #[test]
    fn out_of_memory_leaves_headers_untouched() {
        let mut arena = Arena::<CAPACITY>::new();
        arena.place(100).unwrap();
        let before: Vec<_> = arena.blocks().collect();

        let err = arena.allocate(200, site!()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OutOfMemory { size: 200 });
        assert_eq!(arena.blocks().collect::<Vec<_>>(), before);
    }

    #[test]
    fn oversized_header_stops_the_search() {
        let mut arena = Arena::<CAPACITY>::new();
        arena
            .write_header(0, Header::new(usize::MAX, BlockStatus::InUse))
            .unwrap();

        assert_eq!(
            arena.place(8),
            Err(ErrorKind::Corrupted {
                offset: 0,
                reason: "block size overflows",
            })
        );
    }

    #[traced_test]
    #[test]
    fn failures_are_reported_with_site() {
        let mut arena = Arena::<CAPACITY>::new();
        let site = site!();

        let _ = arena.allocate(0, site);
        assert!(logs_contain("allocation failed: invalid allocation size 0"));
        assert!(logs_contain(&site.to_string()));

        let _ = arena.allocate(CAPACITY, site);
        assert!(logs_contain(&format!("invalid allocation size {CAPACITY}")));
    }
}
