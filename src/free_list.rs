//! Address-ordered free list with splitting and coalescing.
//!
//! ```text
//!   free_head
//!      │
//!      ▼
//!   ┌──────┐ next ┌──────┐ next ┌──────┐
//!   │ 0x00 │ ───▶ │ 0x2c0│ ───▶ │ 0x9a0│ ───▶ None
//!   │      │ ◀─── │      │ ◀─── │      │
//!   └──────┘ prev └──────┘ prev └──────┘
//! ```
//!
//! Only general-family blocks ever sit on this list (plus the pristine arena
//! block before the first commit).

use crate::{
  block::{Block, State, block_end, payload_offset},
  config::{BLOCK_OVERHEAD, MIN_SPLIT_REMAINDER},
  heap::Heap,
};

impl Heap {
  /// `(prev, next)` of a block on the address list.
  fn links(
    &self,
    offset: usize,
  ) -> (Option<usize>, Option<usize>) {
    match self.block(offset).state {
      State::FreeGeneral { prev, next } => (prev, next),
      _ => (None, None),
    }
  }

  fn set_links(
    &mut self,
    offset: usize,
    prev: Option<usize>,
    next: Option<usize>,
  ) {
    let block = self.block_mut(offset);
    debug_assert!(matches!(block.state, State::FreeGeneral { .. }));
    block.state = State::FreeGeneral { prev, next };
  }

  /// Links the block at `offset` into the list, keeping ascending address order.
  pub(crate) fn insert_by_address(
    &mut self,
    offset: usize,
  ) {
    let mut prev = None;
    let mut current = self.free_head;

    while let Some(cursor) = current {
      if cursor > offset {
        break;
      }
      prev = Some(cursor);
      current = self.links(cursor).1;
    }

    self.set_state(offset, State::FreeGeneral { prev, next: current });

    match prev {
      Some(prev) => {
        let (before, _) = self.links(prev);
        self.set_links(prev, before, Some(offset));
      }
      None => self.free_head = Some(offset),
    }

    if let Some(next) = current {
      let (_, after) = self.links(next);
      self.set_links(next, Some(offset), after);
    }
  }

  /// Unlinks the block at `offset` using its own neighbours.
  pub(crate) fn unlink(
    &mut self,
    offset: usize,
  ) {
    let (prev, next) = self.links(offset);

    match prev {
      Some(prev) => {
        let (before, _) = self.links(prev);
        self.set_links(prev, before, next);
      }
      None => self.free_head = next,
    }

    if let Some(next) = next {
      let (_, after) = self.links(next);
      self.set_links(next, prev, after);
    }

    if matches!(self.block(offset).state, State::FreeGeneral { .. }) {
      self.set_links(offset, None, None);
    }
  }

  /// Shrinks the block at `offset` to `size` and lists the excess as a new
  /// free block, if the excess is big enough to stand on its own.
  ///
  /// Returns whether a split happened.
  pub(crate) fn split(
    &mut self,
    offset: usize,
    size: usize,
  ) -> bool {
    let available = self.block(offset).size;

    if size
      .checked_add(MIN_SPLIT_REMAINDER)
      .is_none_or(|needed| available < needed)
    {
      return false;
    }

    let remainder = available - size - BLOCK_OVERHEAD;
    self.block_mut(offset).size = size;

    let tail = payload_offset(offset) + size;
    self
      .blocks
      .insert(tail, Block::new(remainder, State::FreeGeneral { prev: None, next: None }));
    self.insert_by_address(tail);

    log::trace!(
      "split {:#x}: kept {} bytes, remainder {:#x} holds {} bytes",
      offset,
      size,
      tail,
      remainder
    );

    true
  }

  /// Merges the listed block at `offset` with its list neighbours when they
  /// touch it physically. One pass: the predecessor first, then the successor.
  ///
  /// Returns the offset of the resulting block.
  pub(crate) fn coalesce(
    &mut self,
    offset: usize,
  ) -> usize {
    let mut offset = offset;

    if let (Some(prev), _) = self.links(offset) {
      if block_end(prev, self.block(prev)) == offset {
        let absorbed = self.block(offset).span();
        self.unlink(offset);
        self.blocks.remove(&offset);
        self.block_mut(prev).size += absorbed;

        log::trace!("coalesced {:#x} into predecessor {:#x}", offset, prev);
        offset = prev;
      }
    }

    if let (_, Some(next)) = self.links(offset) {
      if block_end(offset, self.block(offset)) == next {
        let absorbed = self.block(next).span();
        self.unlink(next);
        self.blocks.remove(&next);
        self.block_mut(offset).size += absorbed;

        log::trace!("coalesced successor {:#x} into {:#x}", next, offset);
      }
    }

    offset
  }

  /// Returns a freed general block to the address list and coalesces it.
  pub(crate) fn release_general(
    &mut self,
    offset: usize,
  ) {
    self.set_state(offset, State::FreeGeneral { prev: None, next: None });
    self.insert_by_address(offset);

    let merged = self.coalesce(offset);

    if merged == 0 && self.blocks.len() == 1 {
      log::trace!("general family released the whole arena");
      self.reset();
    }
  }
}
