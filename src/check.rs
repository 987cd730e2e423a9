//! Heap walking, statistics and the consistency checker.

use crate::{
  block::{Mode, State, block_end, buddy_of, order_payload, order_span},
  config::{ARENA_CAPACITY, MAX_ORDER},
  error::Corruption,
  heap::Heap,
};

/// What a block is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
  /// The untouched arena, open to both families.
  Pristine,
  Allocated,
  FreeGeneral,
  FreeBuddy,
}

/// A snapshot of one block, as seen by [`crate::Allocator::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Byte offset of the block (not the payload) from the arena base.
  pub offset: usize,
  /// Payload capacity.
  pub size: usize,
  pub kind: BlockKind,
  pub mode: Option<Mode>,
}

/// Aggregate usage figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
  pub blocks: usize,
  pub allocated_blocks: usize,
  pub allocated_bytes: usize,
  pub free_blocks: usize,
  pub free_bytes: usize,
  /// Payload of the largest free block.
  pub largest_free: usize,
}

impl Heap {
  pub(crate) fn walk(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self.blocks.iter().map(|(&offset, block)| BlockInfo {
      offset,
      size: block.size,
      kind: match block.state {
        State::Pristine => BlockKind::Pristine,
        State::Allocated(_) => BlockKind::Allocated,
        State::FreeGeneral { .. } => BlockKind::FreeGeneral,
        State::FreeBuddy { .. } => BlockKind::FreeBuddy,
      },
      mode: block.state.mode(),
    })
  }

  pub(crate) fn stats(&self) -> Stats {
    self.blocks.values().fold(Stats::default(), |mut stats, block| {
      stats.blocks += 1;
      if block.state.is_free() {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.allocated_blocks += 1;
        stats.allocated_bytes += block.size;
      }
      stats
    })
  }

  /// Checks every structural invariant of the block table and free lists.
  pub(crate) fn verify(&self) -> Result<(), Corruption> {
    self.verify_tiling()?;
    self.verify_address_list()?;
    self.verify_buddy_lists()
  }

  fn verify_tiling(&self) -> Result<(), Corruption> {
    let mut expected = 0;
    let mut previous_free_general: Option<usize> = None;

    for (&offset, block) in &self.blocks {
      if offset != expected {
        return Err(Corruption::Gap { offset, expected });
      }

      let buddy_order = match block.state {
        State::FreeBuddy { order, .. } | State::Allocated(Mode::Buddy(order)) => Some(order),
        _ => None,
      };

      if let Some(order) = buddy_order {
        if order > MAX_ORDER || offset % order_span(order) != 0 || block.size != order_payload(order)
        {
          return Err(Corruption::BuddyShape { offset, order });
        }
      }

      let free_general = matches!(block.state, State::FreeGeneral { .. });
      if let (true, Some(previous)) = (free_general, previous_free_general) {
        return Err(Corruption::UnmergedNeighbours {
          offset: previous,
          next: offset,
        });
      }
      previous_free_general = free_general.then_some(offset);

      expected = block_end(offset, block);
    }

    if expected != ARENA_CAPACITY {
      return Err(Corruption::Coverage {
        covered: expected,
        capacity: ARENA_CAPACITY,
      });
    }

    Ok(())
  }

  fn verify_address_list(&self) -> Result<(), Corruption> {
    let expected = self
      .blocks
      .values()
      .filter(|block| matches!(block.state, State::Pristine | State::FreeGeneral { .. }))
      .count();

    let mut listed = 0;
    let mut previous: Option<usize> = None;
    let mut current = self.free_head;

    while let Some(offset) = current {
      listed += 1;
      if listed > expected {
        return Err(Corruption::AddressListCount { listed, expected });
      }

      let next = match self.blocks.get(&offset).map(|block| block.state) {
        Some(State::FreeGeneral { prev, next }) if prev == previous => next,
        Some(State::Pristine) if previous.is_none() => None,
        _ => return Err(Corruption::AddressList { offset }),
      };

      if next.is_some_and(|next| next <= offset) {
        return Err(Corruption::AddressList { offset });
      }

      previous = Some(offset);
      current = next;
    }

    if listed != expected {
      return Err(Corruption::AddressListCount { listed, expected });
    }

    Ok(())
  }

  fn verify_buddy_lists(&self) -> Result<(), Corruption> {
    let expected = self
      .blocks
      .values()
      .filter(|block| matches!(block.state, State::Pristine | State::FreeBuddy { .. }))
      .count();

    let mut listed = 0;

    for order in 0..=MAX_ORDER {
      let mut current = self.buddy_heads[order];

      while let Some(offset) = current {
        listed += 1;
        if listed > expected {
          return Err(Corruption::BuddyListCount { listed, expected });
        }

        current = match self.blocks.get(&offset).map(|block| block.state) {
          Some(State::FreeBuddy { order: own, next }) if own == order => next,
          Some(State::Pristine) if order == MAX_ORDER => None,
          _ => return Err(Corruption::BuddyList { order, offset }),
        };

        if order < MAX_ORDER {
          let buddy = buddy_of(offset, order);
          if let Some(State::FreeBuddy { order: other, .. }) = self.blocks.get(&buddy).map(|b| b.state) {
            if other == order {
              return Err(Corruption::UnmergedBuddies { offset, buddy });
            }
          }
        }
      }
    }

    if listed != expected {
      return Err(Corruption::BuddyListCount { listed, expected });
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    SearchMode,
    block::Block,
    config::BLOCK_OVERHEAD,
  };

  #[test]
  fn test_fresh_heap_verifies() {
    let heap = Heap::new();

    assert_eq!(heap.verify(), Ok(()));
    assert_eq!(
      heap.walk().collect::<Vec<_>>(),
      vec![BlockInfo {
        offset: 0,
        size: ARENA_CAPACITY - BLOCK_OVERHEAD,
        kind: BlockKind::Pristine,
        mode: None,
      }]
    );
  }

  #[test]
  fn test_stats_count_both_sides() {
    let mut heap = Heap::new();
    heap.allocate_general(SearchMode::First, 100).unwrap();
    heap.allocate_general(SearchMode::First, 200).unwrap();

    let stats = heap.stats();
    assert_eq!(stats.blocks, 3);
    assert_eq!(stats.allocated_blocks, 2);
    assert_eq!(stats.allocated_bytes, 104 + 200);
    assert_eq!(stats.free_blocks, 1);
    assert_eq!(stats.largest_free, stats.free_bytes);
    assert_eq!(
      stats.allocated_bytes + stats.free_bytes + stats.blocks * BLOCK_OVERHEAD,
      ARENA_CAPACITY
    );
  }

  #[test]
  fn test_detects_gap() {
    let mut heap = Heap::new();
    heap.allocate_general(SearchMode::First, 100).unwrap();
    heap.block_mut(0).size += 8;

    assert!(matches!(heap.verify(), Err(Corruption::Gap { .. })));
  }

  #[test]
  fn test_detects_unlisted_free_block() {
    let mut heap = Heap::new();
    let offset = heap.allocate_general(SearchMode::First, 100).unwrap();
    heap.set_state(offset, State::FreeGeneral { prev: None, next: None });

    assert!(matches!(
      heap.verify(),
      Err(Corruption::UnmergedNeighbours { .. }) | Err(Corruption::AddressListCount { .. })
    ));
  }

  #[test]
  fn test_detects_unmerged_buddies() {
    let mut heap = Heap::new();
    let offset = heap.allocate_buddy(50).unwrap();
    // List the block by hand, skipping the merge with its free buddy.
    heap.buddy_push(offset, 7);

    assert_eq!(
      heap.verify(),
      Err(Corruption::UnmergedBuddies { offset: 0, buddy: 128 })
    );
  }

  #[test]
  fn test_detects_misshapen_buddy() {
    let mut heap = Heap::new();
    heap.allocate_buddy(50).unwrap();
    heap.blocks.insert(128, Block::new(10, State::FreeBuddy { order: 7, next: None }));

    assert!(matches!(heap.verify(), Err(Corruption::BuddyShape { offset: 128, order: 7 })));
  }
}
