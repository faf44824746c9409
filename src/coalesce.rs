use crate::{
    arena::Arena,
    block::{BlockStatus, HEADER_SIZE, Header},
    error::ErrorKind,
};

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Tries to merge the block whose header is at `offset` with the block
    /// right after it. This can be performed only if both are free.
    ///
    /// The neighbour is found purely from the current block's footprint and
    /// is never looked at when it would start at or past the end of the
    /// arena. Only one neighbour is absorbed per call; longer runs of free
    /// blocks collapse over repeated calls.
    ///
    /// ```text
    /// +--------+---------+--------+---------+        +--------+----------------------------+
    /// | Header | Payload | Header | Payload |  --->  | Header |          Payload           |
    /// | Free   |         | Free   |         |        | Free   | (old neighbour header too) |
    /// +--------+---------+--------+---------+        +--------+----------------------------+
    /// ```
    ///
    /// `offset` has to be the start of a block reached by walking the chain;
    /// any other offset would make payload bytes read as a header.
    pub(crate) fn coalesce(&mut self, offset: usize) -> Result<bool, ErrorKind> {
        let block = self.header_at(offset)?;

        if !block.is_free() {
            return Ok(false);
        }

        let next = block.next_offset(offset)?;
        if next >= CAPACITY {
            return Ok(false);
        }

        let neighbour = self.header_at(next)?;
        if !neighbour.is_free() {
            return Ok(false);
        }

        let end = neighbour.next_offset(next)?;
        if end > CAPACITY {
            return Err(ErrorKind::Corrupted {
                offset: next,
                reason: "block runs past the end of the arena",
            });
        }

        // The neighbour's header becomes part of our payload.
        self.write_header(
            offset,
            Header::new(end - offset - HEADER_SIZE, BlockStatus::Free),
        )?;

        Ok(true)
    }
}
