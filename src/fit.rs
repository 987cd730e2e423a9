//! The four general-family placement policies.
//!
//! All of them walk the same address-ordered free list and only differ in
//! which qualifying block they pick. Once picked, the block is unlinked,
//! split if worthwhile and handed out with [`Mode::General`].

use crate::{
  align::checked_align,
  block::{Mode, State, block_end},
  heap::Heap,
};

/// Block selection policy for general allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
  /// First block large enough, scanning from the lowest address.
  First,
  /// Like `First`, but resumes after the previous allocation and wraps.
  Next,
  /// Smallest block large enough; earliest wins ties.
  Best,
  /// Largest block; earliest wins ties.
  Worst,
}

impl Heap {
  fn first_fit(
    &self,
    size: usize,
  ) -> Option<usize> {
    self
      .address_list()
      .find(|&offset| self.block(offset).size >= size)
  }

  fn next_fit(
    &self,
    size: usize,
  ) -> Option<usize> {
    let head = self.free_head?;
    let start = self
      .cursor
      .and_then(|cursor| self.address_list().find(|&offset| offset >= cursor))
      .unwrap_or(head);

    let mut current = start;
    loop {
      if self.block(current).size >= size {
        return Some(current);
      }

      current = match self.block(current).state {
        State::FreeGeneral { next: Some(next), .. } => next,
        _ => head,
      };

      if current == start {
        return None;
      }
    }
  }

  fn best_fit(
    &self,
    size: usize,
  ) -> Option<usize> {
    let mut best: Option<usize> = None;

    for offset in self.address_list() {
      let candidate = self.block(offset).size;
      if candidate < size {
        continue;
      }
      if best.is_none_or(|best| candidate < self.block(best).size) {
        best = Some(offset);
      }
    }

    best
  }

  fn worst_fit(
    &self,
    size: usize,
  ) -> Option<usize> {
    let mut worst: Option<usize> = None;

    for offset in self.address_list() {
      let candidate = self.block(offset).size;
      if candidate < size {
        continue;
      }
      if worst.is_none_or(|worst| candidate > self.block(worst).size) {
        worst = Some(offset);
      }
    }

    worst
  }

  /// Picks a free block for `size` bytes following `mode`.
  pub(crate) fn find_fit(
    &self,
    mode: SearchMode,
    size: usize,
  ) -> Option<usize> {
    match mode {
      SearchMode::First => self.first_fit(size),
      SearchMode::Next => self.next_fit(size),
      SearchMode::Best => self.best_fit(size),
      SearchMode::Worst => self.worst_fit(size),
    }
  }

  /// Allocates `size` payload bytes from the address list.
  ///
  /// Returns the block offset, or `None` without touching any state when
  /// no free block is large enough.
  pub(crate) fn allocate_general(
    &mut self,
    mode: SearchMode,
    size: usize,
  ) -> Option<usize> {
    let size = checked_align(size)?;
    let offset = self.find_fit(mode, size)?;

    self.commit_pristine(Mode::General);
    self.unlink(offset);
    self.split(offset, size);
    self.set_state(offset, State::Allocated(Mode::General));

    if mode == SearchMode::Next {
      self.cursor = Some(block_end(offset, self.block(offset)));
    }

    log::trace!(
      "{:?} fit placed {} bytes at {:#x} (block holds {})",
      mode,
      size,
      offset,
      self.block(offset).size
    );

    Some(offset)
  }
}

#[cfg(test)]
mod tests {
  use super::SearchMode;
  use crate::{
    block::{Mode, State},
    config::{ARENA_CAPACITY, BLOCK_OVERHEAD, MAX_ORDER},
    heap::Heap,
  };

  /// Builds free holes of the given sizes separated by allocated spacers.
  /// Returns the heap and the hole offsets.
  fn holes(sizes: &[usize]) -> (Heap, Vec<usize>) {
    let mut heap = Heap::new();
    let mut live = Vec::new();
    let mut holes = Vec::new();

    for &size in sizes {
      let hole = heap.allocate_general(SearchMode::First, size).unwrap();
      let spacer = heap.allocate_general(SearchMode::First, 32).unwrap();
      holes.push(hole);
      live.push(spacer);
    }

    for &hole in &holes {
      heap.release_general(hole);
    }

    (heap, holes)
  }

  #[test]
  fn test_first_fit_takes_lowest() {
    let (mut heap, holes) = holes(&[64, 256, 128]);

    assert_eq!(heap.allocate_general(SearchMode::First, 100), Some(holes[1]));
    assert_eq!(heap.allocate_general(SearchMode::First, 8), Some(holes[0]));
  }

  #[test]
  fn test_best_fit_takes_smallest() {
    let (mut heap, holes) = holes(&[256, 128, 128]);

    assert_eq!(heap.allocate_general(SearchMode::Best, 100), Some(holes[1]));
    assert_eq!(heap.allocate_general(SearchMode::Best, 100), Some(holes[2]));
    assert_eq!(heap.allocate_general(SearchMode::Best, 100), Some(holes[0]));
  }

  #[test]
  fn test_worst_fit_takes_largest() {
    let (mut heap, _) = holes(&[512, 64, 512]);
    let tail = *heap.address_list().collect::<Vec<_>>().last().unwrap();

    // The trailing remainder of the arena is the largest hole.
    assert_eq!(heap.allocate_general(SearchMode::Worst, 16), Some(tail));

    let (mut heap, holes) = holes_without_tail(&[512, 64, 512]);
    assert_eq!(heap.allocate_general(SearchMode::Worst, 16), Some(holes[0]));
  }

  /// Same as `holes`, with the trailing remainder of the arena allocated.
  fn holes_without_tail(sizes: &[usize]) -> (Heap, Vec<usize>) {
    let (mut heap, holes) = holes(sizes);
    let tail = *heap.address_list().collect::<Vec<_>>().last().unwrap();
    let rest = heap.block(tail).size;
    assert_eq!(heap.allocate_general(SearchMode::First, rest), Some(tail));
    (heap, holes)
  }

  #[test]
  fn test_next_fit_resumes_after_last_allocation() {
    let (mut heap, holes) = holes_without_tail(&[64, 64, 64]);

    assert_eq!(heap.allocate_general(SearchMode::Next, 64), Some(holes[0]));
    assert_eq!(heap.allocate_general(SearchMode::Next, 64), Some(holes[1]));

    heap.release_general(holes[0]);

    // Resumes at the third hole instead of going back to the first.
    assert_eq!(heap.allocate_general(SearchMode::Next, 64), Some(holes[2]));
    // Nothing left after the cursor, so it wraps.
    assert_eq!(heap.allocate_general(SearchMode::Next, 64), Some(holes[0]));
    assert_eq!(heap.allocate_general(SearchMode::Next, 64), None);
  }

  #[test]
  fn test_failed_search_changes_nothing() {
    let mut heap = Heap::new();

    assert_eq!(heap.allocate_general(SearchMode::Best, ARENA_CAPACITY), None);
    assert!(heap.is_pristine());
    assert_eq!(heap.buddy_heads[MAX_ORDER], Some(0));
  }

  #[test]
  fn test_allocation_rounds_to_word_and_commits() {
    let mut heap = Heap::new();
    let offset = heap.allocate_general(SearchMode::First, 13).unwrap();

    assert_eq!(offset, 0);
    assert_eq!(heap.block(0).size, crate::align!(13usize));
    assert_eq!(heap.block(0).state, State::Allocated(Mode::General));
    assert!(heap.buddy_heads.iter().all(Option::is_none));
    assert_eq!(heap.free_head, Some(BLOCK_OVERHEAD + crate::align!(13usize)));
  }

  #[test]
  fn test_whole_arena_is_not_split() {
    let mut heap = Heap::new();
    let whole = ARENA_CAPACITY - BLOCK_OVERHEAD;

    assert_eq!(heap.allocate_general(SearchMode::Worst, whole - 40), Some(0));
    assert_eq!(heap.block(0).size, whole);
    assert_eq!(heap.free_head, None);
  }
}
