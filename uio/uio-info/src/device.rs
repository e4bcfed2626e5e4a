//! # Device Files

/// Directory holding the `uioN` character devices.
pub const DEFAULT_DEVICE_DIR: &str = "/dev";

/// Maximum number of memory maps a single UIO device can expose.
///
/// Mirrors `MAX_UIO_MAPS` in `include/linux/uio_driver.h`.
pub const MAX_UIO_MAPS: usize = 5;

/// Page size assumed when the host cannot report one.
pub const FALLBACK_PAGE_SIZE: u64 = 4096;

const _: () = {
    assert!(MAX_UIO_MAPS > 0);
    assert!(FALLBACK_PAGE_SIZE.is_power_of_two());
};
