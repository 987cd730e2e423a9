//! Offset-level allocator state shared by both families.
//!
//! The heap knows nothing about the mapped arena: it hands out and takes back
//! block offsets. [`crate::Allocator`] turns those into pointers.

use std::collections::BTreeMap;

use crate::{
  block::{Block, Mode, State},
  config::{MAX_ORDER, ORDER_COUNT},
};

pub(crate) struct Heap {
  /// Every block in the arena, keyed by offset.
  pub(crate) blocks: BTreeMap<usize, Block>,
  /// Lowest general free block.
  pub(crate) free_head: Option<usize>,
  /// Next-fit resumes at the first free block at or after this offset.
  pub(crate) cursor: Option<usize>,
  /// Buddy free list heads, indexed by order.
  pub(crate) buddy_heads: [Option<usize>; ORDER_COUNT],
}

impl Heap {
  pub(crate) fn new() -> Self {
    let mut heap = Self {
      blocks: BTreeMap::new(),
      free_head: None,
      cursor: None,
      buddy_heads: [None; ORDER_COUNT],
    };
    heap.reset();
    heap
  }

  /// Installs the single whole-arena block on both families' lists.
  pub(crate) fn reset(&mut self) {
    self.blocks.clear();
    self.blocks.insert(0, Block::pristine());
    self.free_head = Some(0);
    self.cursor = None;
    self.buddy_heads = [None; ORDER_COUNT];
    self.buddy_heads[MAX_ORDER] = Some(0);
  }

  pub(crate) fn is_pristine(&self) -> bool {
    matches!(self.blocks.get(&0), Some(Block { state: State::Pristine, .. }))
  }

  /// Commits the pristine arena block to `mode`'s family and drops it from
  /// the other family's list.
  pub(crate) fn commit_pristine(
    &mut self,
    mode: Mode,
  ) {
    if !self.is_pristine() {
      return;
    }

    let state = match mode {
      Mode::General => {
        self.buddy_heads[MAX_ORDER] = None;
        State::FreeGeneral { prev: None, next: None }
      }
      Mode::Buddy(_) => {
        self.free_head = None;
        self.cursor = None;
        State::FreeBuddy { order: MAX_ORDER, next: None }
      }
    };

    log::trace!("arena committed to {:?} family", mode);
    self.set_state(0, state);
  }

  pub(crate) fn block(
    &self,
    offset: usize,
  ) -> &Block {
    match self.blocks.get(&offset) {
      Some(block) => block,
      None => unreachable!("no block at offset {offset:#x}"),
    }
  }

  pub(crate) fn block_mut(
    &mut self,
    offset: usize,
  ) -> &mut Block {
    match self.blocks.get_mut(&offset) {
      Some(block) => block,
      None => unreachable!("no block at offset {offset:#x}"),
    }
  }

  pub(crate) fn set_state(
    &mut self,
    offset: usize,
    state: State,
  ) {
    self.block_mut(offset).state = state;
  }

  /// Walks the address-ordered free list from its head.
  pub(crate) fn address_list(&self) -> AddressList<'_> {
    AddressList {
      heap: self,
      current: self.free_head,
    }
  }

  /// Walks the buddy free list of `order` from its head.
  pub(crate) fn buddy_list(
    &self,
    order: usize,
  ) -> BuddyList<'_> {
    BuddyList {
      heap: self,
      current: self.buddy_heads[order],
    }
  }
}

/// Iterator over the offsets on the address-ordered free list.
pub(crate) struct AddressList<'heap> {
  heap: &'heap Heap,
  current: Option<usize>,
}

impl Iterator for AddressList<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<usize> {
    let offset = self.current?;
    self.current = self.heap.blocks.get(&offset).and_then(|block| match block.state {
      State::FreeGeneral { next, .. } => next,
      _ => None,
    });
    Some(offset)
  }
}

/// Iterator over the offsets on one buddy free list.
pub(crate) struct BuddyList<'heap> {
  heap: &'heap Heap,
  current: Option<usize>,
}

impl Iterator for BuddyList<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<usize> {
    let offset = self.current?;
    self.current = self.heap.blocks.get(&offset).and_then(|block| match block.state {
      State::FreeBuddy { next, .. } => next,
      _ => None,
    });
    Some(offset)
  }
}
