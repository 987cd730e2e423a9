//! Error types surfaced by the allocator.

use std::io;

use thiserror::Error;

/// The backing region could not be obtained from the OS.
#[derive(Debug, Error)]
pub enum ArenaError {
  #[error("failed to map a {capacity} byte arena: {source}")]
  Map {
    capacity: usize,
    #[source]
    source: io::Error,
  },
}

/// A pointer handed to [`crate::Allocator::try_free`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FreeError {
  #[error("pointer {addr:#x} does not belong to the arena")]
  Foreign { addr: usize },

  #[error("pointer {addr:#x} is not the start of a block payload")]
  NotABlock { addr: usize },

  #[error("invalid or double free of block at offset {offset:#x}")]
  DoubleFree { offset: usize },
}

/// An invariant of the block table or the free lists does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
  #[error("block at {offset:#x} does not start where the previous one ended ({expected:#x})")]
  Gap { offset: usize, expected: usize },

  #[error("blocks cover {covered} bytes, arena holds {capacity}")]
  Coverage { covered: usize, capacity: usize },

  #[error("buddy block at {offset:#x} is not a well-formed order {order} block")]
  BuddyShape { offset: usize, order: usize },

  #[error("address list is broken at {offset:#x}")]
  AddressList { offset: usize },

  #[error("address list holds {listed} blocks, {expected} general blocks are free")]
  AddressListCount { listed: usize, expected: usize },

  #[error("buddy list {order} is broken at {offset:#x}")]
  BuddyList { order: usize, offset: usize },

  #[error("buddy lists hold {listed} blocks, {expected} buddy blocks are free")]
  BuddyListCount { listed: usize, expected: usize },

  #[error("free buddies at {offset:#x} and {buddy:#x} were never merged")]
  UnmergedBuddies { offset: usize, buddy: usize },

  #[error("free blocks at {offset:#x} and {next:#x} are adjacent but not coalesced")]
  UnmergedNeighbours { offset: usize, next: usize },
}
