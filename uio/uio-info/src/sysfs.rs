//! # Sysfs Layout

/// Directory in which the kernel enumerates UIO devices.
pub const DEFAULT_SYSFS_CLASS_DIR: &str = "/sys/class/uio";

/// Prefix shared by all UIO device directories (`uio0`, `uio1`, ...).
pub const DEVICE_PREFIX: &str = "uio";

/// Attribute holding the name the driver registered the device under.
pub const NAME_ATTRIBUTE: &str = "name";

/// Directory below a device that holds one `mapN` directory per region.
pub const MAPS_DIR: &str = "maps";

/// Prefix of a per-map directory; the map index is appended.
pub const MAP_DIR_PREFIX: &str = "map";

/// Physical start address of a map.
pub const MAP_ADDR_ATTRIBUTE: &str = "addr";

/// Size of a map in bytes.
pub const MAP_SIZE_ATTRIBUTE: &str = "size";

/// Offset of the register block relative to the map's page.
pub const MAP_OFFSET_ATTRIBUTE: &str = "offset";

/// Prefixes marking hexadecimal attribute values.
pub const HEX_PREFIXES: [&str; 2] = ["0x", "0X"];
