//! Out-of-band block descriptors.
//!
//! A block is named by its byte offset from the arena base. Its metadata is
//! kept in the heap's side table rather than in the reserved header bytes,
//! so only free descriptors can carry linkage.

use crate::config::{ARENA_CAPACITY, BLOCK_OVERHEAD, MAX_ORDER};

/// Which allocator family owns a block's reclamation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  General,
  Buddy(usize),
}

/// Lifecycle state of a block, with the linkage that only free blocks have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  /// The whole arena, not yet committed to a family. Sits on the address
  /// list and on the top buddy list at once.
  Pristine,
  Allocated(Mode),
  FreeGeneral {
    prev: Option<usize>,
    next: Option<usize>,
  },
  FreeBuddy {
    order: usize,
    next: Option<usize>,
  },
}

impl State {
  /// The family this block belongs to, `None` while the arena is pristine.
  pub fn mode(&self) -> Option<Mode> {
    match *self {
      State::Pristine => None,
      State::Allocated(mode) => Some(mode),
      State::FreeGeneral { .. } => Some(Mode::General),
      State::FreeBuddy { order, .. } => Some(Mode::Buddy(order)),
    }
  }

  pub fn is_free(&self) -> bool {
    !matches!(self, State::Allocated(_))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  /// Payload capacity, overhead excluded.
  pub size: usize,
  pub state: State,
}

impl Block {
  pub fn new(
    size: usize,
    state: State,
  ) -> Self {
    Self { size, state }
  }

  /// The single block covering a fresh arena.
  pub fn pristine() -> Self {
    Self::new(ARENA_CAPACITY - BLOCK_OVERHEAD, State::Pristine)
  }

  /// Overhead plus payload.
  pub fn span(&self) -> usize {
    BLOCK_OVERHEAD + self.size
  }
}

/// Offset of the payload that belongs to the block at `offset`.
pub fn payload_offset(offset: usize) -> usize {
  offset + BLOCK_OVERHEAD
}

/// Offset of the block whose payload starts at `payload`.
pub fn block_offset(payload: usize) -> Option<usize> {
  payload.checked_sub(BLOCK_OVERHEAD)
}

/// First offset past the block at `offset`.
pub fn block_end(
  offset: usize,
  block: &Block,
) -> usize {
  offset + block.span()
}

/// Total bytes of a buddy block of `order`.
pub fn order_span(order: usize) -> usize {
  1 << order
}

/// Payload capacity of a buddy block of `order`.
pub fn order_payload(order: usize) -> usize {
  order_span(order).saturating_sub(BLOCK_OVERHEAD)
}

/// Offset of the buddy of the block at `offset` with `order`.
pub fn buddy_of(
  offset: usize,
  order: usize,
) -> usize {
  debug_assert!(order < MAX_ORDER);
  offset ^ order_span(order)
}
