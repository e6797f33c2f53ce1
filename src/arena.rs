use crate::block::Block;
use crate::error::Argon2Error;
use crate::params::{Geometry, BLOCK_SIZE};

use std::marker::PhantomData;
use zeroize::Zeroize;

/// The memory matrix of one derivation: `lanes` rows of `lane_length` blocks, stored as one
/// flat buffer. Block `(lane, index)` lives at `lane * lane_length + index`.
///
/// Dropping the arena overwrites every block with zeros before the buffer is freed, so the
/// wipe happens on every exit path, unwinding included.
pub(crate) struct Arena {
    blocks: Vec<Block>,
    lane_length: usize,
}

impl Arena {
    /// Reserves and zero-fills the matrix. Fails with `AllocationFailed` instead of aborting
    /// when the memory cannot be reserved.
    pub(crate) fn allocate(geometry: &Geometry) -> Result<Self, Argon2Error> {
        let block_count = geometry.memory_blocks as usize;

        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(block_count)
            .map_err(|_| Argon2Error::AllocationFailed)?;
        blocks.resize(block_count, Block::ZERO);

        tracing::trace!(
            blocks = block_count,
            bytes = block_count * BLOCK_SIZE,
            "arena allocated"
        );

        Ok(Self {
            blocks,
            lane_length: geometry.lane_length as usize,
        })
    }

    pub(crate) fn offset(&self, lane: u32, index: u32) -> usize {
        lane as usize * self.lane_length + index as usize
    }

    pub(crate) fn block(&self, lane: u32, index: u32) -> &Block {
        &self.blocks[self.offset(lane, index)]
    }

    pub(crate) fn block_mut(&mut self, lane: u32, index: u32) -> &mut Block {
        let offset = self.offset(lane, index);
        &mut self.blocks[offset]
    }

    /// A shared handle that lets each lane worker write its own segment while reading blocks
    /// that other lanes finished in earlier slices.
    pub(crate) fn view(&mut self) -> ArenaView<'_> {
        ArenaView {
            ptr: self.blocks.as_mut_ptr(),
            len: self.blocks.len(),
            lane_length: self.lane_length,
            _arena: PhantomData,
        }
    }

    #[cfg(test)]
    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.blocks.zeroize();
        tracing::trace!("arena wiped");
    }
}

/// Raw view over the arena for the duration of one slice.
///
/// Within a slice every block written belongs to the writing lane's current segment, and
/// every block read by another lane lies outside the current slice, so no block is written
/// while any other reference to it exists.
#[derive(Clone, Copy)]
pub(crate) struct ArenaView<'a> {
    ptr: *mut Block,
    len: usize,
    lane_length: usize,
    _arena: PhantomData<&'a mut [Block]>,
}

// SAFETY: Lane workers only write blocks of their own segment; see the type documentation.
unsafe impl Send for ArenaView<'_> {}
// SAFETY: Lane workers only write blocks of their own segment; see the type documentation.
unsafe impl Sync for ArenaView<'_> {}

impl<'a> ArenaView<'a> {
    pub(crate) fn offset(&self, lane: u32, index: u32) -> usize {
        lane as usize * self.lane_length + index as usize
    }

    /// # Safety
    ///
    /// No mutable reference to the block at `offset` may be alive.
    pub(crate) unsafe fn block(&self, offset: usize) -> &'a Block {
        assert!(offset < self.len);
        &*self.ptr.add(offset)
    }

    /// # Safety
    ///
    /// No other reference to the block at `offset` may be alive.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn block_mut(&self, offset: usize) -> &'a mut Block {
        assert!(offset < self.len);
        &mut *self.ptr.add(offset)
    }
}
