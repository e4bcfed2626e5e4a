//! # Device Handles
//!
//! A [`DeviceHandle`] owns the open device file and up to
//! [`MAX_UIO_MAPS`] lazily created mappings. Register windows borrow the
//! handle, so [`close`](DeviceHandle::close) cannot run while any window is
//! still in use:
//!
//! ```compile_fail
//! # use uio_device::DeviceHandle;
//! # fn f(mut dev: DeviceHandle) -> Result<(), uio_device::UioError> {
//! let regs = dev.registers(0, 0, None)?;
//! dev.close()?;
//! regs.read_u32(0)?;
//! # Ok(())
//! # }
//! ```

use crate::{DeviceLocator, DeviceNode, SysfsLocator, UioError};
use log::{debug, info, warn};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use uio_info::device::MAX_UIO_MAPS;
use uio_info::irq::{IRQ_DISABLE, IRQ_ENABLE, IRQ_WORD_SIZE};
use uio_memory_addresses::PageSize;
use uio_mmio::{MapInfo, MappedRegion, MmioError, RegisterWindow, host_page_size};

/// Lifecycle of a [`DeviceHandle`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceState {
    /// The device file is open; all operations are available.
    Open,
    /// [`DeviceHandle::close`] has run; only metadata queries remain.
    Closed,
}

/// An open UIO device.
pub struct DeviceHandle<L: DeviceLocator = SysfsLocator> {
    locator: L,
    name: String,
    node: DeviceNode,
    path: PathBuf,
    file: Option<File>,
    page_size: PageSize,
    regions: [OnceLock<MappedRegion>; MAX_UIO_MAPS],
}

impl DeviceHandle {
    /// Open the device registered as `name`, looked up in sysfs.
    ///
    /// # Errors
    /// See [`open_with`](Self::open_with).
    pub fn open(name: &str) -> Result<Self, UioError> {
        Self::open_with(SysfsLocator::new(), name)
    }
}

impl<L: DeviceLocator> DeviceHandle<L> {
    /// Open the device registered as `name`, looked up through `locator`.
    ///
    /// The device file is opened for synchronous reading and writing.
    ///
    /// # Errors
    /// - [`UioError::DeviceNotFound`] if no device carries that name; no file
    ///   is opened in that case.
    /// - [`UioError::OpenFailed`] if the device file cannot be opened.
    pub fn open_with(locator: L, name: &str) -> Result<Self, UioError> {
        let node = locator
            .find_device(name)?
            .ok_or_else(|| UioError::DeviceNotFound {
                name: name.to_owned(),
            })?;

        let path = locator.device_path(&node);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|source| UioError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self::from_parts(locator, name, node, file))
    }

    /// Wrap an already open device file.
    ///
    /// `file` must be the device file of `node`.
    #[must_use]
    pub fn from_parts(locator: L, name: impl Into<String>, node: DeviceNode, file: File) -> Self {
        let name = name.into();
        let path = locator.device_path(&node);
        let page_size = host_page_size();
        info!("Opened UIO device {name:?} ({}, page size {page_size})", path.display());
        Self {
            locator,
            name,
            node,
            path,
            file: Some(file),
            page_size,
            regions: Default::default(),
        }
    }

    /// Name the driver registered the device under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn device_node(&self) -> &DeviceNode {
        &self.node
    }

    #[must_use]
    pub fn device_path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn locator(&self) -> &L {
        &self.locator
    }

    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    #[must_use]
    pub const fn state(&self) -> DeviceState {
        if self.file.is_some() {
            DeviceState::Open
        } else {
            DeviceState::Closed
        }
    }

    /// Whether map `index` has been mapped by an earlier [`registers`](Self::registers) call.
    #[must_use]
    pub fn is_mapped(&self, index: usize) -> bool {
        self.regions.get(index).is_some_and(|slot| slot.get().is_some())
    }

    /// Metadata of map `index`, straight from the locator.
    ///
    /// # Errors
    /// [`UioError::Io`] or [`UioError::InvalidAttribute`].
    pub fn map_info(&self, index: usize) -> Result<MapInfo, UioError> {
        self.locator.map_info(&self.node, index)
    }

    /// Read an integer attribute of this device, e.g. `"maps/map0/size"`.
    ///
    /// # Errors
    /// [`UioError::Io`] or [`UioError::InvalidAttribute`].
    pub fn read_attribute(&self, attribute: &str) -> Result<u64, UioError> {
        self.locator.read_attribute(&self.node, attribute)
    }

    /// Borrow a register window over map `index`.
    ///
    /// The window starts `offset` bytes after the first register of the map
    /// and spans `length` bytes, or the rest of the mapping for `None`. The
    /// map is created on first use and shared by all later windows.
    ///
    /// # Errors
    /// - [`UioError::InvalidState`] after [`close`](Self::close).
    /// - [`UioError::Io`] or [`UioError::InvalidAttribute`] if the map
    ///   metadata cannot be read.
    /// - [`UioError::Mmio`] with [`MmioError::MapFailed`] or
    ///   [`MmioError::RegionRange`].
    ///
    /// Nothing is cached when this fails.
    pub fn registers(
        &self,
        index: usize,
        offset: usize,
        length: Option<usize>,
    ) -> Result<RegisterWindow<'_>, UioError> {
        let file = self.file()?;
        let slot = self.regions.get(index).ok_or_else(|| MmioError::MapFailed {
            index,
            source: io::Error::new(io::ErrorKind::InvalidInput, "map index out of range"),
        })?;

        if let Some(region) = slot.get() {
            return Ok(region.window(offset, length)?);
        }

        let info = self.locator.map_info(&self.node, index)?;
        let region = MappedRegion::map(file, index, info, self.page_size)?;
        region.window(offset, length)?;

        // A concurrent caller may have won; our mapping is dropped then.
        let region = slot.get_or_init(|| region);
        Ok(region.window(offset, length)?)
    }

    /// Unmask the device interrupt.
    ///
    /// # Errors
    /// [`UioError::InvalidState`] or [`UioError::Io`].
    pub fn irq_on(&self) -> Result<(), UioError> {
        self.write_control(IRQ_ENABLE)?;
        debug!("{}: interrupt enabled", self.name);
        Ok(())
    }

    /// Mask the device interrupt.
    ///
    /// # Errors
    /// [`UioError::InvalidState`] or [`UioError::Io`].
    pub fn irq_off(&self) -> Result<(), UioError> {
        self.write_control(IRQ_DISABLE)?;
        debug!("{}: interrupt disabled", self.name);
        Ok(())
    }

    /// Wait for an interrupt and return the device's event count.
    ///
    /// `None` waits indefinitely and `Some(Duration::ZERO)` only checks for a
    /// pending event. Timeouts are rounded up to whole milliseconds. Returns
    /// `Ok(None)` if the timeout expires or the device reports no data.
    ///
    /// # Errors
    /// - [`UioError::InvalidState`] after [`close`](Self::close).
    /// - [`UioError::Io`] if polling or reading fails, including a count
    ///   shorter than four bytes.
    pub fn wait_irq(&self, timeout: Option<Duration>) -> Result<Option<i32>, UioError> {
        let mut file = self.file()?;
        if !poll_readable(file, timeout)? {
            return Ok(None);
        }

        let count = read_count(&mut file)?;
        if let Some(count) = count {
            debug!("{}: interrupt count {count}", self.name);
        }
        Ok(count)
    }

    /// Unmap all regions and close the device file.
    ///
    /// Afterwards every operation that needs the device file fails with
    /// [`UioError::InvalidState`]. Closing twice is a no-op.
    ///
    /// # Errors
    /// The first [`MmioError::MapFailed`] raised while unmapping; all regions
    /// are released regardless.
    pub fn close(&mut self) -> Result<(), UioError> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let mut result = Ok(());
        for slot in &mut self.regions {
            if let Some(mut region) = slot.take()
                && let Err(e) = region.unmap()
                && result.is_ok()
            {
                result = Err(e.into());
            }
        }
        drop(file);

        info!("Closed UIO device {:?}", self.name);
        result
    }

    fn file(&self) -> Result<&File, UioError> {
        self.file.as_ref().ok_or(UioError::InvalidState)
    }

    fn write_control(&self, word: u32) -> Result<(), UioError> {
        let mut file = self.file()?;
        file.write_all(&word.to_le_bytes())?;
        Ok(())
    }
}

impl<L: DeviceLocator> Drop for DeviceHandle<L> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close UIO device {:?}: {e}", self.name);
        }
    }
}

impl<L: DeviceLocator> fmt::Debug for DeviceHandle<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mapped: Vec<usize> = (0..MAX_UIO_MAPS).filter(|&i| self.is_mapped(i)).collect();
        f.debug_struct("DeviceHandle")
            .field("name", &self.name)
            .field("node", &self.node)
            .field("path", &self.path)
            .field("state", &self.state())
            .field("mapped", &mapped)
            .finish_non_exhaustive()
    }
}

/// Read one little-endian event count. `None` if the source is at its end.
fn read_count(src: &mut impl Read) -> io::Result<Option<i32>> {
    let mut count = [0u8; IRQ_WORD_SIZE];
    let n = loop {
        match src.read(&mut count) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    };
    if n == 0 {
        return Ok(None);
    }
    src.read_exact(&mut count[n..])?;
    Ok(Some(i32::from_le_bytes(count)))
}

/// Wait until `file` is readable. `Ok(false)` on timeout.
fn poll_readable(file: &File, timeout: Option<Duration>) -> io::Result<bool> {
    let timeout_ms = timeout.map_or(-1, |t| {
        libc::c_int::try_from(t.as_nanos().div_ceil(1_000_000)).unwrap_or(libc::c_int::MAX)
    });

    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    loop {
        // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&raw mut pfd, 1, timeout_ms) };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }

    if pfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    Ok(pfd.revents != 0)
}
