use core::fmt;

/// A page size in bytes, guaranteed to be a non-zero power of two.
///
/// The host decides the page size, so this is a runtime value. All alignment
/// arithmetic in this crate goes through it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageSize(u64);

impl PageSize {
    /// 4 KiB page (4096 bytes).
    pub const SIZE_4K: Self = Self(4096);

    /// Validate a raw page size.
    ///
    /// # Errors
    /// Returns [`InvalidPageSize`] if `bytes` is zero or not a power of two.
    #[inline]
    pub const fn new(bytes: u64) -> Result<Self, InvalidPageSize> {
        if bytes.is_power_of_two() {
            Ok(Self(bytes))
        } else {
            Err(InvalidPageSize(bytes))
        }
    }

    /// Page size in bytes.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    const fn mask(self) -> u64 {
        self.0 - 1
    }

    /// Clear the in-page bits of `value`.
    #[inline]
    #[must_use]
    const fn align_down(self, value: u64) -> u64 {
        value & !self.mask()
    }

    /// The in-page bits of `value`.
    #[inline]
    #[must_use]
    pub const fn offset_of(self, value: u64) -> u64 {
        value & self.mask()
    }

    /// Round `bytes` up to a whole number of pages, `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn round_up(self, bytes: u64) -> Option<u64> {
        match bytes.checked_add(self.mask()) {
            Some(v) => Some(self.align_down(v)),
            None => None,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            b if b >= 1 << 30 && b.is_multiple_of(1 << 30) => write!(f, "{}G", b >> 30),
            b if b >= 1 << 20 && b.is_multiple_of(1 << 20) => write!(f, "{}M", b >> 20),
            b if b >= 1 << 10 && b.is_multiple_of(1 << 10) => write!(f, "{}K", b >> 10),
            b => write!(f, "{b}"),
        }
    }
}

impl fmt::Debug for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

/// A page size that is zero or not a power of two.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidPageSize(pub u64);

impl fmt::Display for InvalidPageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid page size {:#X}: not a power of two", self.0)
    }
}

impl core::error::Error for InvalidPageSize {}
