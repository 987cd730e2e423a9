//! Power-of-two buddy allocation over the same arena.
//!
//! A block of order `k` spans `1 << k` bytes, overhead included, and sits at
//! an offset that is a multiple of its span. That makes the buddy of any
//! block computable from its offset alone:
//!
//! ```text
//!   order k + 1:  ┌───────────────────────────────┐
//!                 │            offset o           │
//!                 └───────────────────────────────┘
//!   order k:      ┌───────────────┬───────────────┐
//!                 │    offset o   │  o ^ (1 << k) │
//!                 └───────────────┴───────────────┘
//! ```

use crate::{
  block::{Block, Mode, State, buddy_of, order_payload, order_span},
  config::{BLOCK_OVERHEAD, MAX_ORDER},
  heap::Heap,
};

/// Smallest order whose blocks hold `payload` bytes plus the block overhead.
///
/// Returns `None` if not even the whole arena is large enough.
pub fn order_for(payload: usize) -> Option<usize> {
  let needed = payload.checked_add(BLOCK_OVERHEAD)?;
  let order = needed.checked_next_power_of_two()?.trailing_zeros() as usize;

  (order <= MAX_ORDER).then_some(order)
}

impl Heap {
  /// Pushes the block at `offset` onto the free list of `order`, resizing it
  /// to that order.
  pub(crate) fn buddy_push(
    &mut self,
    offset: usize,
    order: usize,
  ) {
    let next = self.buddy_heads[order];
    self.blocks.insert(
      offset,
      Block::new(order_payload(order), State::FreeBuddy { order, next }),
    );
    self.buddy_heads[order] = Some(offset);
  }

  /// Pops the head of the free list of `order`.
  pub(crate) fn buddy_pop(
    &mut self,
    order: usize,
  ) -> Option<usize> {
    let offset = self.buddy_heads[order]?;

    self.buddy_heads[order] = match self.block(offset).state {
      State::FreeBuddy { next, .. } => next,
      _ => None,
    };

    Some(offset)
  }

  /// Unlinks the block at `offset` from the free list of `order`.
  ///
  /// Returns `false` if it is not on that list, i.e. it is not a free buddy.
  pub(crate) fn buddy_remove(
    &mut self,
    order: usize,
    offset: usize,
  ) -> bool {
    let mut prev = None;

    for current in self.buddy_list(order) {
      if current == offset {
        break;
      }
      prev = Some(current);
    }

    let next = match self.blocks.get(&offset).map(|block| block.state) {
      Some(State::FreeBuddy { order: listed, next }) if listed == order => next,
      _ => return false,
    };

    match prev {
      Some(prev) => {
        if let State::FreeBuddy { next: link, .. } = &mut self.block_mut(prev).state {
          *link = next;
        }
      }
      None => self.buddy_heads[order] = next,
    }

    true
  }

  /// Allocates a block able to hold `payload` bytes, halving larger blocks
  /// as needed.
  ///
  /// Returns the block offset, or `None` without touching any state when no
  /// order at or above the target has a free block.
  pub(crate) fn allocate_buddy(
    &mut self,
    payload: usize,
  ) -> Option<usize> {
    let target = order_for(payload)?;
    let mut order = (target..=MAX_ORDER).find(|&order| self.buddy_heads[order].is_some())?;

    self.commit_pristine(Mode::Buddy(MAX_ORDER));
    let offset = self.buddy_pop(order)?;

    while order > target {
      order -= 1;
      let right = offset + order_span(order);
      self.buddy_push(right, order);

      log::trace!("halved {:#x}: buddy {:#x} listed at order {}", offset, right, order);
    }

    self.blocks.insert(
      offset,
      Block::new(order_payload(target), State::Allocated(Mode::Buddy(target))),
    );

    Some(offset)
  }

  /// Returns a freed buddy block of `order`, merging it with its buddy for
  /// as long as that buddy is free.
  pub(crate) fn release_buddy(
    &mut self,
    offset: usize,
    order: usize,
  ) {
    let mut offset = offset;
    let mut order = order;

    while order < MAX_ORDER {
      let buddy = buddy_of(offset, order);
      if !self.buddy_remove(order, buddy) {
        break;
      }

      self.blocks.remove(&offset.max(buddy));
      offset = offset.min(buddy);
      order += 1;

      log::trace!("merged buddies into {:#x} at order {}", offset, order);
    }

    if order == MAX_ORDER {
      log::trace!("buddy family released the whole arena");
      self.reset();
      return;
    }

    self.buddy_push(offset, order);
  }
}
