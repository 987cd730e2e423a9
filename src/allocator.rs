use std::ptr;

use crate::{
  arena::Arena,
  block::{Mode, State, block_offset, payload_offset},
  check::{BlockInfo, Stats},
  config::ARENA_CAPACITY,
  error::{Corruption, FreeError},
  fit::SearchMode,
  heap::Heap,
};

/// One arena plus every list and cursor that manages it.
///
/// The arena is mapped on the first allocation request and unmapped when the
/// allocator is dropped. Pointers returned by one allocator must only be
/// freed through that same allocator.
pub struct Allocator {
  arena: Option<Arena>,
  heap: Heap,
}

impl Allocator {
  pub fn new() -> Self {
    Self {
      arena: None,
      heap: Heap::new(),
    }
  }

  /// Maps the arena if this is the first request. Without an arena nothing
  /// else can proceed, so a failed mapping aborts the process.
  fn arena(&mut self) -> &Arena {
    self.arena.get_or_insert_with(|| match Arena::map(ARENA_CAPACITY) {
      Ok(arena) => arena,
      Err(err) => {
        log::error!("{}", err);
        std::process::abort();
      }
    })
  }

  fn payload_pointer(
    &mut self,
    offset: Option<usize>,
  ) -> *mut u8 {
    match offset {
      Some(offset) => self.arena().pointer_at(payload_offset(offset)),
      None => ptr::null_mut(),
    }
  }

  /// Allocates `size` bytes from the general family using `mode`.
  ///
  /// Returns a null pointer if no free block is large enough.
  pub fn allocate(
    &mut self,
    mode: SearchMode,
    size: usize,
  ) -> *mut u8 {
    self.arena();
    let offset = self.heap.allocate_general(mode, size);

    match offset {
      Some(offset) => log::debug!("{:?} fit: {} bytes at offset {:#x}", mode, size, offset),
      None => log::debug!("{:?} fit: no block for {} bytes", mode, size),
    }

    self.payload_pointer(offset)
  }

  pub fn allocate_first_fit(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.allocate(SearchMode::First, size)
  }

  pub fn allocate_next_fit(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.allocate(SearchMode::Next, size)
  }

  pub fn allocate_best_fit(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.allocate(SearchMode::Best, size)
  }

  pub fn allocate_worst_fit(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.allocate(SearchMode::Worst, size)
  }

  /// Allocates a power-of-two block able to hold `size` bytes.
  ///
  /// Returns a null pointer if `size` exceeds the arena or no block of a
  /// sufficient order is free.
  pub fn allocate_buddy(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.arena();
    let offset = self.heap.allocate_buddy(size);

    match offset {
      Some(offset) => log::debug!("buddy: {} bytes at offset {:#x}", size, offset),
      None => log::debug!("buddy: no block for {} bytes", size),
    }

    self.payload_pointer(offset)
  }

  /// Frees `address`, logging a warning instead if it cannot be freed.
  ///
  /// A null pointer is ignored.
  pub fn free(
    &mut self,
    address: *mut u8,
  ) {
    if let Err(err) = self.try_free(address) {
      log::warn!("{}", err);
    }
  }

  /// Frees `address` and hands it back to the family that produced it.
  ///
  /// A rejected pointer leaves every block and list untouched.
  pub fn try_free(
    &mut self,
    address: *mut u8,
  ) -> Result<(), FreeError> {
    if address.is_null() {
      return Ok(());
    }

    let offset = self.locate(address)?;

    let mode = match self.heap.block(offset).state {
      State::Allocated(mode) => mode,
      _ => return Err(FreeError::DoubleFree { offset }),
    };

    log::debug!("free: offset {:#x} back to {:?}", offset, mode);

    match mode {
      Mode::General => self.heap.release_general(offset),
      Mode::Buddy(order) => self.heap.release_buddy(offset, order),
    }

    Ok(())
  }

  /// Resolves a payload pointer to the offset of its block.
  fn locate(
    &self,
    address: *const u8,
  ) -> Result<usize, FreeError> {
    let addr = address as usize;

    let payload = self
      .arena
      .as_ref()
      .and_then(|arena| arena.offset_of(address))
      .ok_or(FreeError::Foreign { addr })?;

    block_offset(payload)
      .filter(|offset| self.heap.blocks.contains_key(offset))
      .ok_or(FreeError::NotABlock { addr })
  }

  /// Payload capacity of the live allocation at `address`.
  ///
  /// This may exceed the requested size when the block was not split.
  pub fn usable_size(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    let offset = self.locate(address).ok()?;
    let block = self.heap.block(offset);

    (!block.state.is_free()).then_some(block.size)
  }

  /// Every block of the arena in address order.
  pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self.heap.walk()
  }

  pub fn stats(&self) -> Stats {
    self.heap.stats()
  }

  /// Checks the block table and all free lists for consistency.
  pub fn verify(&self) -> Result<(), Corruption> {
    self.heap.verify()
  }
}

impl Default for Allocator {
  fn default() -> Self {
    Self::new()
  }
}
