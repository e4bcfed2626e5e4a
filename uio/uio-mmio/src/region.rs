//! # Mapped UIO Regions
//!
//! A [`MappedRegion`] owns one shared `mmap` of a UIO device file. The kernel
//! selects map `N` of a device through the file offset `N * page_size`, and
//! always maps from the start of the page holding the register block. The
//! block itself starts [`alignment_skew`](MappedRegion::alignment_skew) bytes
//! into the mapping:
//!
//! ```text
//!  mapping base                      mapping base + mapped_length
//!  │◄─ skew ─►│◄──────── register block ───────►│          │
//!  ├──────────┼──────────────────────────────────┼──────────┤
//!  page aligned    addr + offset                  padding to page size
//! ```
//!
//! Windows are handed out by [`MappedRegion::window`] and borrow the region, so
//! the mapping cannot be released while a window is alive.

use crate::{MmioError, RegisterWindow};
use log::{debug, warn};
use std::io;
use std::os::fd::{AsFd, AsRawFd};
use std::ptr::{self, NonNull};
use uio_info::device::{FALLBACK_PAGE_SIZE, MAX_UIO_MAPS};
use uio_memory_addresses::{PageOffset, PageSize, PhysicalAddress, VirtualAddress};

/// Location of one UIO map as reported by the driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MapInfo {
    /// Physical start address (`maps/mapN/addr`).
    pub addr: PhysicalAddress,
    /// Size in bytes (`maps/mapN/size`).
    pub size: u64,
    /// Offset of the registers from the start of their page (`maps/mapN/offset`).
    pub offset: u64,
}

impl MapInfo {
    #[must_use]
    pub const fn new(addr: u64, size: u64, offset: u64) -> Self {
        Self {
            addr: PhysicalAddress::new(addr),
            size,
            offset,
        }
    }

    /// Distance from the mapped page base to the first register.
    #[must_use]
    pub const fn alignment_skew(&self, page_size: PageSize) -> PageOffset {
        self.addr.wrapping_add(self.offset).offset(page_size)
    }

    /// Mapping length: the map size rounded up to whole pages.
    #[must_use]
    pub const fn mapped_length(&self, page_size: PageSize) -> Option<u64> {
        page_size.round_up(self.size)
    }
}

/// Page size of the running host.
#[must_use]
pub fn host_page_size() -> PageSize {
    // SAFETY: sysconf has no memory safety preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(raw)
        .ok()
        .and_then(|bytes| PageSize::new(bytes).ok())
        .unwrap_or_else(|| {
            warn!("sysconf(_SC_PAGESIZE) returned {raw}, assuming {FALLBACK_PAGE_SIZE} bytes");
            PageSize::new(FALLBACK_PAGE_SIZE).unwrap_or(PageSize::SIZE_4K)
        })
}

/// One memory map of a UIO device, mapped shared and read-write.
pub struct MappedRegion {
    base: Option<NonNull<u8>>,
    mapped_len: usize,
    skew: usize,
    index: usize,
    info: MapInfo,
    page_size: PageSize,
}

// SAFETY: The region only exposes its memory through volatile loads and stores.
// Serializing hardware access is up to the caller, as with any device memory.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Map region `index` of the device behind `fd`.
    ///
    /// The mapping covers `info.size` rounded up to whole pages and starts at
    /// file offset `index * page_size`. The file descriptor is only needed for
    /// the duration of this call; the mapping stays valid after it is closed.
    ///
    /// # Errors
    /// [`MmioError::MapFailed`] if `index` is not a valid UIO map index, the
    /// size or offset overflow, or `mmap(2)` fails.
    pub fn map(
        fd: impl AsFd,
        index: usize,
        info: MapInfo,
        page_size: PageSize,
    ) -> Result<Self, MmioError> {
        if index >= MAX_UIO_MAPS {
            return Err(MmioError::map_failed(
                index,
                io::ErrorKind::InvalidInput,
                "map index out of range",
            ));
        }

        let mapped_len = info
            .mapped_length(page_size)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                MmioError::map_failed(index, io::ErrorKind::InvalidInput, "map size overflows")
            })?;

        let file_offset = (index as u64)
            .checked_mul(page_size.as_u64())
            .and_then(|off| libc::off_t::try_from(off).ok())
            .ok_or_else(|| {
                MmioError::map_failed(index, io::ErrorKind::InvalidInput, "map offset overflows")
            })?;

        // Always below the page size, which itself fits the address space.
        let skew = usize::try_from(info.alignment_skew(page_size).as_u64()).map_err(|_| {
            MmioError::map_failed(index, io::ErrorKind::InvalidInput, "skew overflows")
        })?;

        // SAFETY: We request a fresh mapping at a kernel-chosen address, so no
        // existing memory is affected. The result is checked before use.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                mapped_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_fd().as_raw_fd(),
                file_offset,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(MmioError::MapFailed {
                index,
                source: io::Error::last_os_error(),
            });
        }

        let Some(base) = NonNull::new(addr.cast::<u8>()) else {
            return Err(MmioError::map_failed(
                index,
                io::ErrorKind::Other,
                "mmap returned a null mapping",
            ));
        };

        debug!(
            "Mapped region {index}: {} bytes at {} (hw {} size {:#x} offset {:#x}, skew {skew:#x})",
            mapped_len,
            VirtualAddress::from_nonnull(base),
            info.addr,
            info.size,
            info.offset,
        );

        Ok(Self {
            base: Some(base),
            mapped_len,
            skew,
            index,
            info,
            page_size,
        })
    }

    /// Release the mapping. Calling this again is a no-op.
    ///
    /// # Errors
    /// [`MmioError::MapFailed`] if `munmap(2)` fails; the region is considered
    /// unmapped either way.
    pub fn unmap(&mut self) -> Result<(), MmioError> {
        let Some(base) = self.base.take() else {
            return Ok(());
        };

        // SAFETY: `base`/`mapped_len` describe a mapping we created and still own.
        // Windows borrow `self`, so none can be alive while we hold `&mut self`.
        let rc = unsafe { libc::munmap(base.as_ptr().cast(), self.mapped_len) };
        if rc != 0 {
            return Err(MmioError::MapFailed {
                index: self.index,
                source: io::Error::last_os_error(),
            });
        }

        debug!("Unmapped region {}", self.index);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        self.base.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Map metadata this region was created from.
    #[inline]
    #[must_use]
    pub const fn info(&self) -> MapInfo {
        self.info
    }

    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Length of the mapping in bytes, a multiple of the page size.
    #[inline]
    #[must_use]
    pub const fn mapped_length(&self) -> usize {
        self.mapped_len
    }

    /// Offset of the first register from the mapping base.
    #[inline]
    #[must_use]
    pub const fn alignment_skew(&self) -> usize {
        self.skew
    }

    /// Process address of the mapping, `None` once unmapped.
    #[must_use]
    pub fn base(&self) -> Option<VirtualAddress> {
        self.base.map(VirtualAddress::from_nonnull)
    }

    pub(crate) const fn base_ptr(&self) -> Option<NonNull<u8>> {
        self.base
    }

    /// Borrow a window of `length` bytes starting `offset` bytes after the
    /// first register. `None` extends the window to the end of the mapping.
    ///
    /// # Errors
    /// - [`MmioError::Unmapped`] if the region was unmapped.
    /// - [`MmioError::RegionRange`] if the window does not fit the mapping.
    pub fn window(
        &self,
        offset: usize,
        length: Option<usize>,
    ) -> Result<RegisterWindow<'_>, MmioError> {
        if !self.is_mapped() {
            return Err(MmioError::Unmapped { index: self.index });
        }

        let start = self.skew.checked_add(offset);
        let (start, length) = fit_range(start, length, self.mapped_len)?;
        debug!(
            "Issuing window on region {}: start {start:#x}, length {length:#x}",
            self.index
        );
        Ok(RegisterWindow::new(self, start, length))
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let Err(e) = self.unmap() {
            warn!("Failed to unmap region {}: {e}", self.index);
        }
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("index", &self.index)
            .field("base", &self.base())
            .field("mapped_len", &self.mapped_len)
            .field("skew", &self.skew)
            .field("info", &self.info)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Resolve `start..start+length` against `available` bytes.
///
/// A missing `length` means "up to `available`".
pub(crate) fn fit_range(
    start: Option<usize>,
    length: Option<usize>,
    available: usize,
) -> Result<(usize, usize), MmioError> {
    let err = |offset: Option<usize>| MmioError::RegionRange {
        offset: offset.unwrap_or(usize::MAX),
        length: length.unwrap_or(0),
        available,
    };

    let start = match start {
        Some(s) if s <= available => s,
        other => return Err(err(other)),
    };

    let length = length.unwrap_or(available - start);
    match start.checked_add(length) {
        Some(end) if end <= available => Ok((start, length)),
        _ => Err(err(Some(start))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_of_unaligned_map() {
        let info = MapInfo::new(0x1000, 0x150, 0x10);
        assert_eq!(info.alignment_skew(PageSize::SIZE_4K).as_u64(), 0x10);
        assert_eq!(info.mapped_length(PageSize::SIZE_4K), Some(0x1000));
    }

    #[test]
    fn skew_comes_from_address_and_offset() {
        let info = MapInfo::new(0x4000_0F00, 0x2000, 0x200);
        assert_eq!(info.alignment_skew(PageSize::SIZE_4K).as_u64(), 0x100);
        assert_eq!(info.mapped_length(PageSize::SIZE_4K), Some(0x2000));
    }

    #[test]
    fn fit_range_defaults_to_remainder() {
        assert_eq!(fit_range(Some(0x10), None, 0x1000).unwrap(), (0x10, 0xFF0));
        assert_eq!(fit_range(Some(0x1000), None, 0x1000).unwrap(), (0x1000, 0));
        assert_eq!(fit_range(Some(0x10), Some(0xFF0), 0x1000).unwrap(), (0x10, 0xFF0));
    }

    #[test]
    fn fit_range_rejects_overhang() {
        assert!(matches!(
            fit_range(Some(0x10), Some(0xFF1), 0x1000),
            Err(MmioError::RegionRange {
                offset: 0x10,
                length: 0xFF1,
                available: 0x1000
            })
        ));
        assert!(matches!(
            fit_range(Some(0x1001), None, 0x1000),
            Err(MmioError::RegionRange { .. })
        ));
        assert!(matches!(
            fit_range(None, Some(1), 0x1000),
            Err(MmioError::RegionRange { .. })
        ));
        assert!(matches!(
            fit_range(Some(1), Some(usize::MAX), 0x1000),
            Err(MmioError::RegionRange { .. })
        ));
    }

    #[test]
    fn host_page_size_is_sane() {
        let ps = host_page_size();
        assert!(ps.as_u64() >= 4096);
    }
}
