use std::{io, ptr::{self, NonNull}};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};

use crate::error::ArenaError;

/// A fixed-size anonymous mapping that never moves or grows.
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
}

impl Arena {
  /// Maps `capacity` bytes of private read/write memory.
  pub fn map(capacity: usize) -> Result<Self, ArenaError> {
    // SAFETY: anonymous private mapping with no address hint, nothing else
    // in the process is affected.
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        capacity,
        PROT_READ | PROT_WRITE,
        MAP_ANONYMOUS | MAP_PRIVATE,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(ArenaError::Map {
        capacity,
        source: io::Error::last_os_error(),
      });
    }

    let base = NonNull::new(address.cast::<u8>()).ok_or_else(|| ArenaError::Map {
      capacity,
      source: io::Error::other("mmap returned a null mapping"),
    })?;

    log::debug!("mapped {} byte arena at {:?}", capacity, base);

    Ok(Self { base, capacity })
  }

  /// Byte offset of `address` from the base, if it lies inside the arena or
  /// one past its end (where an empty payload of the last block starts).
  pub fn offset_of(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    let offset = (address as usize).checked_sub(self.base.as_ptr() as usize)?;
    (offset <= self.capacity).then_some(offset)
  }

  /// Pointer to the byte at `offset`, which may be one past the end.
  pub fn pointer_at(
    &self,
    offset: usize,
  ) -> *mut u8 {
    debug_assert!(offset <= self.capacity);
    // SAFETY: `offset` is at most one past the mapping.
    unsafe { self.base.as_ptr().add(offset) }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    // SAFETY: `base` and `capacity` describe exactly the mapping made in `map`.
    let result = unsafe { munmap(self.base.as_ptr().cast::<c_void>(), self.capacity) };

    if result != 0 {
      log::error!("failed to unmap arena: {}", io::Error::last_os_error());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_map_is_writable() {
    let arena = Arena::map(4096).unwrap();

    unsafe {
      let first = arena.pointer_at(0);
      let last = arena.pointer_at(4095);

      *first = 0xAB;
      *last = 0xCD;

      assert_eq!(*first, 0xAB);
      assert_eq!(*last, 0xCD);
    }
  }

  #[test]
  fn test_offset_round_trip() {
    let arena = Arena::map(4096).unwrap();

    for offset in [0, 64, 4095] {
      assert_eq!(arena.offset_of(arena.pointer_at(offset)), Some(offset));
    }

    assert_eq!(arena.offset_of(arena.pointer_at(4096)), Some(4096));
    assert_eq!(arena.offset_of(arena.pointer_at(4096).wrapping_add(1)), None);
    assert_eq!(arena.offset_of(ptr::null()), None);
  }

  #[test]
  fn test_base_is_page_aligned() {
    let arena = Arena::map(4096).unwrap();

    assert_eq!(arena.pointer_at(0) as usize % 4096, 0);
  }
}
