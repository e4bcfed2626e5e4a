//! # Register Windows
//!
//! A [`RegisterWindow`] is a bounds-checked view of a byte range inside a
//! [`MappedRegion`]. Every read or write is exactly one volatile load or store
//! of the requested width; nothing is cached, merged or split.
//!
//! ## Offsets
//!
//! Offsets passed to the accessors are relative to the start of the window,
//! which in turn already includes the region's alignment skew:
//!
//! ```text
//! address = mapping base + skew + window offset + local offset
//! ```
//!
//! ## Access Rules
//!
//! * **Bounds**: `local_offset + width <= len()`, else [`MmioError::OutOfRange`].
//! * **Alignment**: [`AccessPolicy::Unaligned`] (default) allows any offset and
//!   issues an unaligned access when needed. [`AccessPolicy::Aligned`] rejects
//!   window offsets that are not a multiple of the access width with
//!   [`MmioError::Misaligned`] before touching the bus. The check is relative
//!   to the window, not to the absolute address.
//! * **Values**: writes through [`write_width`](RegisterWindow::write_width)
//!   reject values wider than the access with [`MmioError::ValueOutOfDomain`]
//!   instead of truncating them.
//! * **Byte order**: values are converted per [`ByteOrder`] after the load and
//!   before the store.

use crate::region::fit_range;
use crate::{ByteOrder, MappedRegion, MmioError, Register, Width};
use log::trace;
use std::fmt;
use std::ptr::{self, NonNull};

/// How a window treats accesses that are not naturally aligned.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AccessPolicy {
    /// Reject accesses whose window offset is not a multiple of the access width.
    Aligned,
    /// Allow any offset.
    #[default]
    Unaligned,
}

/// Forces an alignment of 1 so misaligned addresses can be loaded volatile.
#[repr(C, packed)]
struct Unaligned<T>(T);

/// A bounds-checked register view into a [`MappedRegion`].
#[derive(Copy, Clone)]
pub struct RegisterWindow<'a> {
    region: &'a MappedRegion,
    base: NonNull<u8>,
    start: usize,
    len: usize,
    policy: AccessPolicy,
    order: ByteOrder,
}

// SAFETY: See `MappedRegion`; the window adds no state beyond plain values.
unsafe impl Send for RegisterWindow<'_> {}
unsafe impl Sync for RegisterWindow<'_> {}

impl<'a> RegisterWindow<'a> {
    /// Callers must have validated `start + len <= region.mapped_length()`.
    pub(crate) fn new(region: &'a MappedRegion, start: usize, len: usize) -> Self {
        debug_assert!(start + len <= region.mapped_length());
        let base = region.base_ptr().unwrap_or(NonNull::dangling());
        Self {
            region,
            base,
            start,
            len,
            policy: AccessPolicy::default(),
            order: ByteOrder::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// The region this window borrows from.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> &'a MappedRegion {
        self.region
    }

    /// Offset of the window from the mapping base (skew included).
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn policy(&self) -> AccessPolicy {
        self.policy
    }

    #[inline]
    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Narrow this window to `length` bytes at `offset`; `None` takes the rest.
    ///
    /// The returned window inherits the access policy and byte order.
    ///
    /// # Errors
    /// [`MmioError::RegionRange`] if the range does not fit this window.
    pub fn window(&self, offset: usize, length: Option<usize>) -> Result<Self, MmioError> {
        let (offset, len) = fit_range(Some(offset), length, self.len)?;
        Ok(Self {
            start: self.start + offset,
            len,
            ..*self
        })
    }

    /// Read one register of type `T` at `offset`.
    ///
    /// # Errors
    /// [`MmioError::OutOfRange`] or [`MmioError::Misaligned`].
    #[inline]
    pub fn read<T: Register>(&self, offset: usize) -> Result<T, MmioError> {
        let p = self.checked_ptr::<T>(offset)?;
        // SAFETY: `checked_ptr` verified the access lies inside the live mapping.
        let raw = unsafe { load::<T>(p) };
        let value = raw.decode(self.order);
        trace!("read  {offset:#06x} {} -> {value:#x}", T::WIDTH);
        Ok(value)
    }

    /// Write one register of type `T` at `offset`.
    ///
    /// # Errors
    /// [`MmioError::OutOfRange`] or [`MmioError::Misaligned`].
    #[inline]
    pub fn write<T: Register>(&self, offset: usize, value: T) -> Result<(), MmioError> {
        let p = self.checked_ptr::<T>(offset)?;
        trace!("write {offset:#06x} {} <- {value:#x}", T::WIDTH);
        // SAFETY: `checked_ptr` verified the access lies inside the live mapping.
        unsafe { store::<T>(p, value.encode(self.order)) };
        Ok(())
    }

    /// Read `width` bytes at `offset` as an unsigned integer.
    ///
    /// # Errors
    /// [`MmioError::OutOfRange`] or [`MmioError::Misaligned`].
    pub fn read_width(&self, offset: usize, width: Width) -> Result<u64, MmioError> {
        match width {
            Width::Byte => self.read::<u8>(offset).map(u64::from),
            Width::Half => self.read::<u16>(offset).map(u64::from),
            Width::Word => self.read::<u32>(offset).map(u64::from),
            Width::Quad => self.read::<u64>(offset),
        }
    }

    /// Write `value` as a `width`-byte unsigned integer at `offset`.
    ///
    /// # Errors
    /// - [`MmioError::OutOfRange`] or [`MmioError::Misaligned`].
    /// - [`MmioError::ValueOutOfDomain`] if `value` does not fit in `width`;
    ///   nothing is written in that case.
    pub fn write_width(&self, offset: usize, width: Width, value: u64) -> Result<(), MmioError> {
        match width {
            Width::Byte => self.write::<u8>(offset, narrow(value)?),
            Width::Half => self.write::<u16>(offset, narrow(value)?),
            Width::Word => self.write::<u32>(offset, narrow(value)?),
            Width::Quad => self.write::<u64>(offset, value),
        }
    }

    /// # Errors
    /// See [`read`](Self::read).
    pub fn read_u8(&self, offset: usize) -> Result<u8, MmioError> {
        self.read(offset)
    }

    /// # Errors
    /// See [`read`](Self::read).
    pub fn read_u16(&self, offset: usize) -> Result<u16, MmioError> {
        self.read(offset)
    }

    /// # Errors
    /// See [`read`](Self::read).
    pub fn read_u32(&self, offset: usize) -> Result<u32, MmioError> {
        self.read(offset)
    }

    /// # Errors
    /// See [`read`](Self::read).
    pub fn read_u64(&self, offset: usize) -> Result<u64, MmioError> {
        self.read(offset)
    }

    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_u8(&self, offset: usize, value: u8) -> Result<(), MmioError> {
        self.write(offset, value)
    }

    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_u16(&self, offset: usize, value: u16) -> Result<(), MmioError> {
        self.write(offset, value)
    }

    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_u32(&self, offset: usize, value: u32) -> Result<(), MmioError> {
        self.write(offset, value)
    }

    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_u64(&self, offset: usize, value: u64) -> Result<(), MmioError> {
        self.write(offset, value)
    }

    /// Validate an access of `T` at `offset` and return its address.
    fn checked_ptr<T: Register>(&self, offset: usize) -> Result<*mut u8, MmioError> {
        let width = T::WIDTH.bytes();
        if offset.checked_add(width).is_none_or(|end| end > self.len) {
            return Err(MmioError::OutOfRange {
                offset,
                width,
                length: self.len,
            });
        }

        if self.policy == AccessPolicy::Aligned && !offset.is_multiple_of(width) {
            return Err(MmioError::Misaligned { offset, width });
        }

        debug_assert!(self.region.is_mapped());

        // SAFETY: `start + offset + width <= start + len <= mapped_length`.
        Ok(unsafe { self.base.as_ptr().add(self.start + offset) })
    }
}

impl fmt::Debug for RegisterWindow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterWindow")
            .field("region", &self.region.index())
            .field("start", &format_args!("{:#x}", self.start))
            .field("len", &format_args!("{:#x}", self.len))
            .field("policy", &self.policy)
            .field("order", &self.order)
            .finish()
    }
}

fn narrow<T: Register>(value: u64) -> Result<T, MmioError> {
    T::from_u64(value).ok_or(MmioError::ValueOutOfDomain {
        value,
        width: T::WIDTH.bytes(),
    })
}

/// # Safety
/// `p` must be valid for reads of `size_of::<T>()` bytes.
#[inline(always)]
unsafe fn load<T: Register>(p: *const u8) -> T {
    let p = p.cast::<T>();
    if p.is_aligned() {
        // SAFETY: aligned and valid per the caller.
        unsafe { ptr::read_volatile(p) }
    } else {
        // SAFETY: `Unaligned<T>` has alignment 1 and the size of `T`.
        unsafe { ptr::read_volatile(p.cast::<Unaligned<T>>()).0 }
    }
}

/// # Safety
/// `p` must be valid for writes of `size_of::<T>()` bytes.
#[inline(always)]
unsafe fn store<T: Register>(p: *mut u8, value: T) {
    let p = p.cast::<T>();
    if p.is_aligned() {
        // SAFETY: aligned and valid per the caller.
        unsafe { ptr::write_volatile(p, value) }
    } else {
        // SAFETY: `Unaligned<T>` has alignment 1 and the size of `T`.
        unsafe { ptr::write_volatile(p.cast::<Unaligned<T>>(), Unaligned(value)) }
    }
}
