use crate::{MemoryAddress, PageSize};
use core::fmt;

/// The offset of an address within its page (`0..page_size`).
///
/// For a UIO map this is the alignment skew: the distance between the page
/// base that gets mapped and the first register of the block.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageOffset {
    value: u64,
}

impl PageOffset {
    /// Construct from a full address's offset bits.
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: MemoryAddress, page_size: PageSize) -> Self {
        Self {
            value: page_size.offset_of(addr.as_u64()),
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.value
    }
}

impl fmt::Debug for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageOffset({:#X})", self.value)
    }
}
