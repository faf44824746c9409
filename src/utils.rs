//! Small arithmetic helpers shared by the block layout and the allocation path.

/// Alignment unit of the arena. Every header size, payload size and payload
/// address is a multiple of this value.
pub const ALIGNMENT: usize = 8;

/// It aligns `to_be_aligned` using `alignment`, which must be a power of two.
///
/// This is used to round requested sizes up to [`ALIGNMENT`] and to compute
/// the padded size of a block header.
pub const fn align(to_be_aligned: usize, alignment: usize) -> usize {
    (to_be_aligned + alignment - 1) & !(alignment - 1)
}
