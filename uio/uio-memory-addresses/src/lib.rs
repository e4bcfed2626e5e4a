//! # Hardware and Process Memory Address Types
//!
//! Strongly typed wrappers for the two kinds of addresses a UIO mapping deals
//! with: the **physical** address a driver reports for a register block, and
//! the **virtual** address the block ends up at inside this process.
//!
//! ## Overview
//!
//! | Concept | Description |
//! |----------|-------------|
//! | [`MemoryAddress`] | A raw 64-bit address, either physical or virtual. |
//! | [`PageSize`] | A power-of-two page size, known only at runtime. |
//! | [`PageOffset`] | An offset within a page, i.e. the alignment skew of an address. |
//!
//! These are then wrapped to distinguish between the two address spaces:
//!
//! | Wrapper | Meaning |
//! |----------|----------|
//! | [`PhysicalAddress`] | Bus/physical address as published by the UIO driver. |
//! | [`VirtualAddress`] | Address inside the current process, e.g. an `mmap` base. |
//!
//! ## Page Sizes
//!
//! Unlike a kernel, user space does not get to pick its page size. The host
//! reports it at runtime, so [`PageSize`] is a validated value rather than a
//! marker type. All helpers take the page size explicitly.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use uio_memory_addresses::*;
//! let page_size = PageSize::SIZE_4K;
//!
//! // Hardware block at 0x4000_1010: mapping must start at the page base,
//! // registers start 0x10 bytes in.
//! let pa = PhysicalAddress::new(0x4000_1010);
//! assert_eq!(pa.offset(page_size).as_u64(), 0x10);
//!
//! // A 0x150 byte block still needs a whole page.
//! assert_eq!(page_size.round_up(0x150), Some(0x1000));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod memory_address_offset;
mod page_size;

pub use memory_address_offset::PageOffset;
pub use page_size::{InvalidPageSize, PageSize};

use core::fmt;
use core::ptr::NonNull;

/// Principal raw memory address ([virtual](VirtualAddress) or [physical](PhysicalAddress)).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The offset within the page of size `page_size` that contains this address.
    #[inline]
    #[must_use]
    pub const fn offset(self, page_size: PageSize) -> PageOffset {
        PageOffset::from_addr(self, page_size)
    }

    /// Add a byte count, wrapping around the 64-bit address space.
    ///
    /// Wrapping keeps in-page offsets exact since every page size divides `2^64`.
    #[inline]
    #[must_use]
    pub const fn wrapping_add(self, rhs: u64) -> Self {
        Self(self.0.wrapping_add(rhs))
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

/// Virtual memory address inside the current process.
///
/// A thin wrapper around [`MemoryAddress`] for addresses returned by `mmap`.
/// It carries the *kind* of address at the type level so a process pointer
/// never gets mixed up with a hardware address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(MemoryAddress);

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub fn from_nonnull<T>(ptr: NonNull<T>) -> Self {
        Self(MemoryAddress::new(ptr.as_ptr().addr() as u64))
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.as_u64()
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

/// Physical (bus) address of a register block.
///
/// This is what a UIO driver publishes in `maps/mapN/addr`. It is never
/// dereferenced in user space; it only determines how a mapping is aligned.
///
/// ### Examples
/// ```rust
/// # use uio_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x1000).wrapping_add(0x10);
/// assert_eq!(pa.offset(PageSize::SIZE_4K).as_u64(), 0x10);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(MemoryAddress);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(MemoryAddress::new(v))
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.as_u64()
    }

    /// Distance from the start of the containing page.
    #[inline]
    #[must_use]
    pub const fn offset(self, page_size: PageSize) -> PageOffset {
        self.0.offset(page_size)
    }

    #[inline]
    #[must_use]
    pub const fn wrapping_add(self, rhs: u64) -> Self {
        Self(self.0.wrapping_add(rhs))
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}
