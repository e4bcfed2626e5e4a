//! # UIO Devices
//!
//! Finds a Linux UIO device by name, opens its device file and hands out
//! register windows over its memory maps:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use uio_device::DeviceHandle;
//!
//! # fn main() -> Result<(), uio_device::UioError> {
//! let dev = DeviceHandle::open("axi-timer")?;
//! let regs = dev.registers(0, 0, None)?;
//! regs.write_u32(0x00, 0x0000_00D2)?;
//!
//! dev.irq_on()?;
//! if let Some(count) = dev.wait_irq(Some(Duration::from_millis(100)))? {
//!     println!("{count} interrupts so far");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Lookups go through a [`DeviceLocator`]; [`SysfsLocator`] is the default and
//! can be pointed at other directories with [`SysfsLocator::with_roots`].

mod attribute;
mod device;
mod error;
mod locator;

pub use attribute::{parse_integer, read_integer};
pub use device::{DeviceHandle, DeviceState};
pub use error::UioError;
pub use locator::{DeviceLocator, DeviceNode, SysfsLocator};
pub use uio_mmio::{AccessPolicy, ByteOrder, MapInfo, MmioError, RegisterWindow, Width};
