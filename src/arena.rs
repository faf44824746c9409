use std::mem;

use crate::{
    block::{BlockStatus, HEADER_SIZE, Header, MIN_BLOCK_SIZE},
    error::ErrorKind,
    utils::ALIGNMENT,
};

/// Default arena capacity in bytes: 4096 slots of the widest scalar type.
pub const DEFAULT_CAPACITY: usize = 4096 * mem::size_of::<f64>();

/// Backing bytes of an [`Arena`]. The alignment guarantees that every payload,
/// which starts at a multiple of [`ALIGNMENT`] from the base, is aligned too.
#[repr(C, align(8))]
struct Storage<const N: usize>([u8; N]);

/// A fixed-capacity arena. Every block lives inside `CAPACITY` contiguous
/// bytes owned by this value, laid out back to back from offset zero:
///
/// ```text
///  0                                                              CAPACITY
///  +--------+-----------+--------+-------------+--------+--------------+
///  | Header |  Payload  | Header |   Payload   | Header |   Payload    |
///  | InUse  |           | Free   |             | InUse  |              |
///  +--------+-----------+--------+-------------+--------+--------------+
///           ^
///           +-- ArenaPtr handed to the caller
/// ```
///
/// There is no separate free list: the next block always starts right after
/// the current payload, so the only way to find a block is to walk from the
/// start. A fresh arena is all zeroes, which reads as a single empty free
/// header. It is formatted into one free block spanning the whole buffer on
/// the first allocation.
///
/// The arena is not synchronised. Wrap it in a lock to share it between
/// threads, as [`LockedArena`](crate::LockedArena) does.
pub struct Arena<const CAPACITY: usize = DEFAULT_CAPACITY> {
    storage: Storage<CAPACITY>,
}

/// Handle to a payload: its byte offset from the arena base.
///
/// Handles obtained from [`Arena::allocate`] stay valid until they are passed
/// to [`Arena::deallocate`]. Any other offset can be wrapped with
/// [`ArenaPtr::from_offset`]; the arena rejects it when it does not name the
/// payload of a live block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaPtr(usize);

impl ArenaPtr {
    pub const fn from_offset(offset: usize) -> Self {
        Self(offset)
    }

    #[inline]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// Read-only view of one block, as produced by [`Arena::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block header.
    pub offset: usize,
    pub payload_size: usize,
    pub status: BlockStatus,
}

impl BlockInfo {
    #[inline]
    pub const fn footprint(&self) -> usize {
        HEADER_SIZE + self.payload_size
    }

    #[inline]
    pub const fn ptr(&self) -> ArenaPtr {
        ArenaPtr(self.offset + HEADER_SIZE)
    }

    #[inline]
    pub const fn is_free(&self) -> bool {
        matches!(self.status, BlockStatus::Free)
    }
}

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Largest payload a single block can hold: the whole arena minus one
    /// header.
    pub const MAX_PAYLOAD: usize = CAPACITY - HEADER_SIZE;

    const LAYOUT_CHECK: () = {
        assert!(
            CAPACITY % ALIGNMENT == 0,
            "arena capacity has to be a multiple of the alignment unit"
        );
        assert!(
            CAPACITY >= MIN_BLOCK_SIZE,
            "arena capacity cannot hold a single block"
        );
    };

    /// Creates a pristine arena. This is a `const fn` so an arena can back a
    /// `static`.
    pub const fn new() -> Self {
        let () = Self::LAYOUT_CHECK;

        Self {
            storage: Storage([0; CAPACITY]),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Returns `true` until the first allocation formats the arena.
    ///
    /// A formatted arena never goes back to this state: every block has a
    /// payload of at least one alignment unit, so the first header can only
    /// read zero before formatting.
    pub fn is_pristine(&self) -> bool {
        matches!(
            self.header_at(0),
            Ok(Header {
                payload_size: 0,
                status: BlockStatus::Free,
            })
        )
    }

    /// Formats the whole arena as a single free block if it has never been
    /// used. Returns whether it did.
    pub(crate) fn format_if_pristine(&mut self) -> Result<bool, ErrorKind> {
        if !self.is_pristine() {
            return Ok(false);
        }

        self.write_header(0, Header::new(Self::MAX_PAYLOAD, BlockStatus::Free))?;

        Ok(true)
    }

    /// Decodes the header at `offset`. Fails if the header would not fit in
    /// the arena or holds an unknown status.
    pub(crate) fn header_at(&self, offset: usize) -> Result<Header, ErrorKind> {
        let bytes = self.header_bytes(offset)?;

        Header::read(bytes).ok_or(ErrorKind::Corrupted {
            offset,
            reason: "unknown block status",
        })
    }

    pub(crate) fn write_header(&mut self, offset: usize, header: Header) -> Result<(), ErrorKind> {
        let bytes = self.header_bytes_mut(offset)?;
        header.write(bytes);

        Ok(())
    }

    fn header_bytes(&self, offset: usize) -> Result<&[u8; HEADER_SIZE], ErrorKind> {
        Self::header_range(offset)
            .and_then(|range| self.storage.0.get(range))
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(ErrorKind::HeaderOutOfBounds { offset })
    }

    fn header_bytes_mut(&mut self, offset: usize) -> Result<&mut [u8; HEADER_SIZE], ErrorKind> {
        Self::header_range(offset)
            .and_then(|range| self.storage.0.get_mut(range))
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(ErrorKind::HeaderOutOfBounds { offset })
    }

    fn header_range(offset: usize) -> Option<std::ops::Range<usize>> {
        let end = offset.checked_add(HEADER_SIZE)?;
        (end <= CAPACITY).then_some(offset..end)
    }

    /// Walks the blocks in address order.
    ///
    /// A pristine arena yields the single free block it implicitly contains.
    /// The walk stops early if it meets a header it cannot decode or whose
    /// size overflows; use
    /// [`Arena::check`] to find out why.
    pub fn blocks(&self) -> Blocks<'_, CAPACITY> {
        Blocks {
            arena: self,
            offset: 0,
            pristine: self.is_pristine(),
        }
    }

    /// Finds the live block whose payload starts at `ptr`.
    fn live_block(&self, ptr: ArenaPtr) -> Option<BlockInfo> {
        self.blocks()
            .find(|block| block.ptr() == ptr)
            .filter(|block| !block.is_free())
    }

    /// Payload bytes of a live allocation, or `None` if `ptr` is not the
    /// payload start of an in-use block.
    pub fn payload(&self, ptr: ArenaPtr) -> Option<&[u8]> {
        let block = self.live_block(ptr)?;
        self.storage
            .0
            .get(ptr.offset()..ptr.offset() + block.payload_size)
    }

    /// Mutable payload bytes of a live allocation.
    pub fn payload_mut(&mut self, ptr: ArenaPtr) -> Option<&mut [u8]> {
        let block = self.live_block(ptr)?;
        self.storage
            .0
            .get_mut(ptr.offset()..ptr.offset() + block.payload_size)
    }

    /// Address of the byte at `ptr`.
    ///
    /// The address stays valid only as long as the arena is neither moved
    /// nor dropped.
    pub fn as_mut_ptr(&mut self, ptr: ArenaPtr) -> *mut u8 {
        self.storage.0.as_mut_ptr().wrapping_add(ptr.offset())
    }

    /// Converts an address back into a handle. Null maps to `None`; addresses
    /// outside of the arena map to handles that no block will ever match.
    pub fn ptr_from_raw(&self, raw: *const u8) -> Option<ArenaPtr> {
        if raw.is_null() {
            return None;
        }

        let base = self.storage.0.as_ptr().addr();
        Some(ArenaPtr(raw.addr().wrapping_sub(base)))
    }
}

impl<const CAPACITY: usize> Default for Arena<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Address-order iterator over the blocks of an [`Arena`].
pub struct Blocks<'a, const CAPACITY: usize> {
    arena: &'a Arena<CAPACITY>,
    offset: usize,
    pristine: bool,
}

impl<const CAPACITY: usize> Iterator for Blocks<'_, CAPACITY> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= CAPACITY {
            return None;
        }

        let header = if self.pristine {
            Header::new(Arena::<CAPACITY>::MAX_PAYLOAD, BlockStatus::Free)
        } else {
            self.arena.header_at(self.offset).ok()?
        };

        let block = BlockInfo {
            offset: self.offset,
            payload_size: header.payload_size,
            status: header.status,
        };
        self.offset = header.next_offset(self.offset).ok()?;

        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: usize = 256;

    #[test]
    fn new_arena_is_pristine() {
        let arena = Arena::<CAPACITY>::new();

        assert!(arena.is_pristine());
        assert_eq!(arena.capacity(), CAPACITY);

        let blocks: Vec<_> = arena.blocks().collect();
        assert_eq!(
            blocks,
            vec![BlockInfo {
                offset: 0,
                payload_size: CAPACITY - HEADER_SIZE,
                status: BlockStatus::Free,
            }]
        );
    }

    #[test]
    fn formatting_happens_once() {
        let mut arena = Arena::<CAPACITY>::new();

        assert_eq!(arena.format_if_pristine(), Ok(true));
        assert!(!arena.is_pristine());
        assert_eq!(arena.format_if_pristine(), Ok(false));
        assert_eq!(
            arena.header_at(0),
            Ok(Header::new(CAPACITY - HEADER_SIZE, BlockStatus::Free))
        );
    }

    #[test]
    fn header_access_is_bounds_checked() {
        let mut arena = Arena::<CAPACITY>::new();
        let last = CAPACITY - HEADER_SIZE;

        assert!(arena.header_at(last).is_ok());
        assert_eq!(
            arena.header_at(last + 1),
            Err(ErrorKind::HeaderOutOfBounds { offset: last + 1 })
        );
        assert_eq!(
            arena.header_at(usize::MAX),
            Err(ErrorKind::HeaderOutOfBounds { offset: usize::MAX })
        );
        assert_eq!(
            arena.write_header(CAPACITY, Header::new(8, BlockStatus::Free)),
            Err(ErrorKind::HeaderOutOfBounds { offset: CAPACITY })
        );
    }

    #[test]
    fn raw_pointers_round_trip() {
        let mut arena = Arena::<CAPACITY>::new();
        let ptr = ArenaPtr::from_offset(HEADER_SIZE);
        let raw = arena.as_mut_ptr(ptr);

        assert_eq!(raw.addr() % ALIGNMENT, 0);
        assert_eq!(arena.ptr_from_raw(raw), Some(ptr));
        assert_eq!(arena.ptr_from_raw(std::ptr::null()), None);
    }

    #[test]
    fn walk_stops_at_oversized_header() {
        let mut arena = Arena::<CAPACITY>::new();
        arena
            .write_header(0, Header::new(usize::MAX, BlockStatus::InUse))
            .unwrap();

        assert_eq!(arena.blocks().count(), 0);
    }

    #[test]
    fn payload_of_free_block_is_unavailable() {
        let arena = Arena::<CAPACITY>::new();

        assert_eq!(arena.payload(ArenaPtr::from_offset(HEADER_SIZE)), None);
    }
}
