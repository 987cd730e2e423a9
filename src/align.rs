/// Rounds a request up to the machine word.
///
/// General-family requests go through this before a block is searched for,
/// so every payload handed out stays word aligned.
///
/// # Examples
///
/// ```rust
/// use poolalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `align`, which must be a power of two.
///
/// ```rust
/// use poolalloc::align_to;
///
/// assert_eq!(align_to!(100, 64), 128);
/// assert_eq!(align_to!(128, 64), 128);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Word-aligns `size`, returning `None` when the rounding would overflow.
pub(crate) fn checked_align(size: usize) -> Option<usize> {
  size.checked_add(core::mem::size_of::<usize>() - 1).map(|_| align!(size))
}
