//! Arena errors.

use thiserror::Error;

use crate::site::Site;

/// Result type for arena operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// What went wrong inside an arena operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum ErrorKind {
    /// Requested size is zero or larger than any block could ever hold.
    #[error("invalid allocation size {size}")]
    InvalidSize { size: usize },

    /// No free block is large enough for the request.
    #[error("out of memory when trying to allocate {size} bytes")]
    OutOfMemory { size: usize },

    /// Free was called without a pointer.
    #[error("attempt to free a null pointer")]
    NullPointer,

    /// Free was called on a block that is already free.
    #[error("double free detected at offset {offset}")]
    DoubleFree { offset: usize },

    /// The pointer is not the payload start of any block.
    #[error("pointer not found in allocated memory")]
    PointerNotFound,

    /// A header would extend past the end of the arena.
    #[error("header at offset {offset} is outside of the arena")]
    HeaderOutOfBounds { offset: usize },

    /// The block chain violates a structural invariant.
    #[error("arena corrupted at offset {offset}: {reason}")]
    Corrupted { offset: usize, reason: &'static str },
}

/// An [`ErrorKind`] together with the [`Site`] of the call that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at {site}")]
pub struct AllocError {
    pub kind: ErrorKind,
    pub site: Site,
}

impl AllocError {
    pub const fn new(kind: ErrorKind, site: Site) -> Self {
        Self { kind, site }
    }

    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_kind_and_site() {
        let err = AllocError::new(ErrorKind::InvalidSize { size: 0 }, Site::new("main.rs", 12));

        assert_eq!(err.to_string(), "invalid allocation size 0 at main.rs:12");
        assert_eq!(err.kind(), ErrorKind::InvalidSize { size: 0 });
    }

    #[test]
    fn double_free_mentions_offset() {
        let kind = ErrorKind::DoubleFree { offset: 16 };

        assert_eq!(kind.to_string(), "double free detected at offset 16");
    }
}
