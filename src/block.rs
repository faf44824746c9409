use std::mem;

use crate::{
    error::ErrorKind,
    utils::{ALIGNMENT, align},
};

/// Number of bytes used to store [`Header::payload_size`].
const SIZE_FIELD: usize = mem::size_of::<usize>();

/// Header size of a block, rounded up to the alignment unit so that the
/// payload right after it is aligned as well.
pub const HEADER_SIZE: usize = align(SIZE_FIELD + mem::size_of::<u8>(), ALIGNMENT);

/// Smallest footprint a standalone block can have: one header plus one
/// alignment unit of payload. Remainders below this are never split off.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + ALIGNMENT;

/// Allocation status stored in every block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    Free,
    InUse,
}

impl BlockStatus {
    const fn tag(self) -> u8 {
        match self {
            BlockStatus::Free => 0,
            BlockStatus::InUse => 1,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(BlockStatus::Free),
            1 => Some(BlockStatus::InUse),
            _ => None,
        }
    }
}

/// This is the metadata that precedes every payload inside the arena.
///
/// ```text
/// +---------------------+ <------+
/// |    payload_size     |        |
/// +---------------------+        | -> Header (HEADER_SIZE bytes)
/// |  status  | padding  |        |
/// +---------------------+ <------+
/// |       Payload       |        |
/// |         ...         |        | -> payload_size bytes, handed out
/// |         ...         |        |    to the caller when IN_USE
/// +---------------------+ <------+
/// ```
///
/// Headers never live outside the arena buffer: they are decoded from and
/// encoded into the bytes at a block offset, see [`Header::read`] and
/// [`Header::write`]. A zeroed header (`payload_size == 0`, `Free`) is what a
/// freshly constructed arena contains before its first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Bytes of payload after the header. Always a multiple of [`ALIGNMENT`].
    pub payload_size: usize,
    /// Whether the payload is handed out.
    pub status: BlockStatus,
}

impl Header {
    pub const fn new(payload_size: usize, status: BlockStatus) -> Self {
        Self {
            payload_size,
            status,
        }
    }

    /// Offset of the block that follows this one when this header sits at
    /// `offset`. A size read from damaged bytes may not fit in a `usize`;
    /// that is reported instead of wrapping around.
    pub(crate) fn next_offset(&self, offset: usize) -> Result<usize, ErrorKind> {
        self.payload_size
            .checked_add(HEADER_SIZE)
            .and_then(|footprint| offset.checked_add(footprint))
            .ok_or(ErrorKind::Corrupted {
                offset,
                reason: "block size overflows",
            })
    }

    #[inline]
    pub const fn is_free(&self) -> bool {
        matches!(self.status, BlockStatus::Free)
    }

    /// Decodes a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// Returns `None` if the status byte holds an unknown tag.
    pub(crate) fn read(bytes: &[u8; HEADER_SIZE]) -> Option<Self> {
        let mut size = [0u8; SIZE_FIELD];
        size.copy_from_slice(&bytes[..SIZE_FIELD]);
        let status = BlockStatus::from_tag(bytes[SIZE_FIELD])?;

        Some(Self::new(usize::from_ne_bytes(size), status))
    }

    /// Encodes this header into `bytes`, zeroing the padding.
    pub(crate) fn write(&self, bytes: &mut [u8; HEADER_SIZE]) {
        bytes.fill(0);
        bytes[..SIZE_FIELD].copy_from_slice(&self.payload_size.to_ne_bytes());
        bytes[SIZE_FIELD] = self.status.tag();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_aligned() {
        assert_eq!(HEADER_SIZE % ALIGNMENT, 0);
        assert!(HEADER_SIZE > SIZE_FIELD);
        assert_eq!(MIN_BLOCK_SIZE, HEADER_SIZE + 8);
    }

    #[test]
    fn header_encoding() {
        let mut bytes = [0xAAu8; HEADER_SIZE];
        let header = Header::new(4064, BlockStatus::InUse);
        header.write(&mut bytes);

        assert_eq!(Header::read(&bytes), Some(header));
        assert_eq!(header.next_offset(32), Ok(32 + 4064 + HEADER_SIZE));
        // Padding is cleared so identical headers are byte-identical.
        assert!(bytes[SIZE_FIELD + 1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn zeroed_header_is_an_empty_free_block() {
        let bytes = [0u8; HEADER_SIZE];
        let header = Header::read(&bytes).unwrap();

        assert_eq!(header.payload_size, 0);
        assert!(header.is_free());
    }

    #[test]
    fn oversized_header_does_not_wrap() {
        let header = Header::new(usize::MAX - HEADER_SIZE, BlockStatus::Free);

        assert_eq!(header.next_offset(0), Ok(usize::MAX));
        assert_eq!(
            header.next_offset(8),
            Err(ErrorKind::Corrupted {
                offset: 8,
                reason: "block size overflows",
            })
        );
        assert!(Header::new(usize::MAX, BlockStatus::InUse).next_offset(0).is_err());
    }

    #[test]
    fn unknown_status_tag_is_rejected() {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[SIZE_FIELD] = 7;

        assert_eq!(Header::read(&bytes), None);
    }
}
