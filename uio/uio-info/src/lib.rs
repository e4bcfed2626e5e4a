//! # UIO Configuration and Kernel Interface Constants
//!
//! This crate defines the constants that describe how the Linux Userspace I/O
//! (UIO) subsystem publishes a device to user space. It is the single source of
//! truth for file-system locations, attribute names, map limits and the
//! interrupt control protocol shared by the mapping and device crates.
//!
//! ## Overview
//!
//! A UIO driver exposes every device twice:
//!
//! ```text
//! /sys/class/uio/uioN/                  /dev/uioN
//! ├── name          "my-ip-core"        ├── read()   → 4-byte LE irq count
//! └── maps/                             ├── write()  ← 4-byte LE 0/1 (irq off/on)
//!     ├── map0/                         └── mmap()   at offset N * page_size
//!     │   ├── addr    0x43c00000                      maps region N
//!     │   ├── size    0x10000
//!     │   └── offset  0x0
//!     └── map1/ ...
//! ```
//!
//! ### Sysfs Layout ([`sysfs`])
//! * **Class directory**: where devices are enumerated
//! * **Attribute names**: `name`, `maps/mapN/{addr,size,offset}`
//!
//! ### Device Files ([`device`])
//! * **Device directory**: where `uioN` nodes live
//! * **Map limits**: the kernel supports at most [`MAX_UIO_MAPS`](device::MAX_UIO_MAPS) regions
//!
//! ### Interrupt Protocol ([`irq`])
//! * **Control words**: the values written to enable or disable interrupts
//! * **Event counter**: the width of the value returned by a read
//!
//! ## Configuration Management
//!
//! All values are `const` and validated at compile time. Components that need
//! alternative roots (containers, tests) take explicit paths instead of
//! mutating these defaults.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod device;
pub mod irq;
pub mod sysfs;
