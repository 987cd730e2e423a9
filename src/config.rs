//! Compile-time configuration of the arena and its block layout.
//!
//! ```text
//!   One block inside the arena:
//!
//!   ┌──────────────┬──────────────────────────┬────────────────────────┐
//!   │   Header     │        Linkage           │        Payload         │
//!   │   16 bytes   │        48 bytes          │     `size` bytes       │
//!   └──────────────┴──────────────────────────┴────────────────────────┘
//!   ▲                                         ▲
//!   └── block offset                          └── pointer handed out
//! ```
//!
//! Header and linkage are reserved in the arena but their contents are kept
//! out of band, see [`crate::block`].

/// Total number of bytes in the arena.
pub const ARENA_CAPACITY: usize = 4096;

/// Smallest payload a split is allowed to leave behind.
pub const MIN_BLOCK_SIZE: usize = 32;

/// Largest buddy order (inclusive). `1 << MAX_ORDER` spans the whole arena.
pub const MAX_ORDER: usize = 12;

/// Number of per-order buddy lists.
pub const ORDER_COUNT: usize = MAX_ORDER + 1;

/// Bytes reserved for the block header (size, flag, tag).
pub const HEADER_SIZE: usize = 16;

/// Bytes reserved for the free-list linkage record.
pub const LINKAGE_SIZE: usize = 48;

/// Fixed prefix in front of every payload.
pub const BLOCK_OVERHEAD: usize = HEADER_SIZE + LINKAGE_SIZE;

/// A split only happens when the trailing remainder can hold at least this much.
pub const MIN_SPLIT_REMAINDER: usize = BLOCK_OVERHEAD + MIN_BLOCK_SIZE;

const _: () = assert!(ARENA_CAPACITY == 1 << MAX_ORDER);
const _: () = assert!(BLOCK_OVERHEAD % core::mem::size_of::<usize>() == 0);
