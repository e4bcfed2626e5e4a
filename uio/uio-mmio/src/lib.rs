//! # Memory-Mapped UIO Register Access
//!
//! This crate turns a UIO memory map into typed, bounds-checked register
//! accesses. It is the layer between a raw `mmap` of a device file and the
//! code that pokes at hardware registers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 RegisterWindow<'a>                  │
//! │    • read/write of u8/u16/u32/u64 at byte offsets   │
//! │    • bounds, alignment and value-domain checks      │
//! │    • one volatile load/store per call               │
//! └─────────────────┬───────────────────────────────────┘
//!                   │ borrows
//! ┌─────────────────▼───────────────────────────────────┐
//! │                   MappedRegion                      │
//! │    • owns one shared mmap of a device file          │
//! │    • page rounding and alignment skew               │
//! │    • unmaps on drop                                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! A window cannot outlive the region it was issued from; this is checked by
//! the compiler through the `'a` lifetime.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::fs::OpenOptions;
//! use uio_mmio::{MapInfo, MappedRegion, host_page_size};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = OpenOptions::new().read(true).write(true).open("/dev/uio0")?;
//! let info = MapInfo::new(0x43c0_0000, 0x1_0000, 0);
//! let region = MappedRegion::map(&file, 0, info, host_page_size())?;
//!
//! let regs = region.window(0, None)?;
//! let version = regs.read_u32(0x00)?;
//! regs.write_u32(0x04, 0x1)?;
//! # let _ = version;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Regions and windows are `Send + Sync`. No locking happens on register
//! accesses; concurrent accesses observe whatever the device does for
//! concurrent bus cycles.

#![allow(clippy::inline_always)]

mod error;
mod region;
mod register;
mod window;

pub use error::MmioError;
pub use region::{MapInfo, MappedRegion, host_page_size};
pub use register::{ByteOrder, Register, Width};
pub use window::{AccessPolicy, RegisterWindow};
