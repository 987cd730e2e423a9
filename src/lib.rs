//! # poolalloc - Fit and Buddy Allocation over One Arena
//!
//! This crate manages a single fixed-size arena with two interchangeable
//! allocator families sharing the same pool:
//!
//! - **General**: first-fit, next-fit, best-fit and worst-fit over an
//!   address-ordered free list, with splitting and coalescing.
//! - **Buddy**: power-of-two blocks with one free list per order, halving on
//!   allocation and merging upwards on free.
//!
//! One [`Allocator::free`] serves both: every block remembers which family
//! produced it and goes back through that family's reclamation path.
//!
//! ## Arena Layout
//!
//! ```text
//!   Fresh arena (4096 bytes), open to both families:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ H+L │                    Pristine (4032 bytes)                       │
//!   └──────────────────────────────────────────────────────────────────────┘
//!     ▲
//!     └── on the address list AND on buddy list 12
//!
//!   After allocate_first_fit(100) and allocate_first_fit(200):
//!
//!   ┌─────┬────────┬─────┬──────────────┬─────┬──────────────────────────┐
//!   │ H+L │  104   │ H+L │     200      │ H+L │        free 3600         │
//!   └─────┴────────┴─────┴──────────────┴─────┴──────────────────────────┘
//!
//!   After allocate_buddy(50) on a fresh arena:
//!
//!   ┌───────┬───────┬───────────┬───────────────┬─────────────────────────┐
//!   │ 7:use │ 7:free│  8:free   │    9:free     │    10:free  ...  11:free│
//!   └───────┴───────┴───────────┴───────────────┴─────────────────────────┘
//! ```
//!
//! `H+L` is the 64 byte header and linkage prefix every block reserves. The
//! metadata itself lives in a side table keyed by block offset, never in the
//! arena bytes.
//!
//! The first allocation commits the arena to one family. Once every block is
//! freed again and the arena is back to one block, it is pristine again.
//!
//! ## Crate Structure
//!
//! ```text
//!   poolalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── allocator  - Allocator: public entry points and free dispatch
//!   ├── arena      - mmap-backed fixed region
//!   ├── block      - Block descriptors and offset arithmetic
//!   ├── buddy      - Order math, halving and merging
//!   ├── check      - Walking, statistics and consistency checks
//!   ├── config     - Compile-time sizes
//!   ├── error      - Error types
//!   ├── fit        - The four placement policies
//!   ├── free_list  - Address-ordered list, split and coalesce
//!   └── heap       - Offset-level state shared by both families
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use poolalloc::Allocator;
//!
//! let mut allocator = Allocator::new();
//!
//! let a = allocator.allocate_first_fit(100);
//! assert!(!a.is_null());
//!
//! unsafe { a.cast::<u64>().write(42) };
//!
//! allocator.free(a);
//! assert!(allocator.verify().is_ok());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Allocator` is neither `Send` nor `Sync`
//! - **Fixed capacity**: the arena never grows
//! - **One family at a time**: general and buddy blocks never share the
//!   arena, the first allocation after a reset decides
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Safety
//!
//! Allocation and free never dereference caller pointers, so the API is safe
//! to call. Writing through a returned pointer is up to the caller: past
//! the payload, after free, or through a different allocator is undefined.

pub mod align;
mod allocator;
mod arena;
mod block;
mod buddy;
mod check;
pub mod config;
mod error;
mod fit;
mod free_list;
mod heap;

pub use allocator::Allocator;
pub use block::Mode;
pub use buddy::order_for;
pub use check::{BlockInfo, BlockKind, Stats};
pub use error::{ArenaError, Corruption, FreeError};
pub use fit::SearchMode;
