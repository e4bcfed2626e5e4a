//! # Device Lookup
//!
//! A [`DeviceLocator`] resolves the name a driver registered into a device
//! node and answers questions about that node's memory maps. The default
//! [`SysfsLocator`] reads the kernel's UIO class directory:
//!
//! ```text
//! /sys/class/uio/uio3/name               -> "axi-dma\n"
//! /sys/class/uio/uio3/maps/map0/addr     -> "0x40400000\n"
//! /sys/class/uio/uio3/maps/map0/size     -> "0x10000\n"
//! /sys/class/uio/uio3/maps/map0/offset   -> "0x0\n"
//! /dev/uio3
//! ```

use crate::UioError;
use crate::attribute::read_integer;
use log::debug;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uio_info::device::DEFAULT_DEVICE_DIR;
use uio_info::sysfs::{
    DEFAULT_SYSFS_CLASS_DIR, DEVICE_PREFIX, MAP_ADDR_ATTRIBUTE, MAP_DIR_PREFIX,
    MAP_OFFSET_ATTRIBUTE, MAP_SIZE_ATTRIBUTE, MAPS_DIR, NAME_ATTRIBUTE,
};
use uio_mmio::MapInfo;

/// Kernel name of a UIO device, e.g. `uio0`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DeviceNode(String);

impl DeviceNode {
    #[must_use]
    pub fn new(node: impl Into<String>) -> Self {
        Self(node.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number after the `uio` prefix, if there is one.
    #[must_use]
    pub fn number(&self) -> Option<u32> {
        self.0.strip_prefix(DEVICE_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of device nodes and their map metadata.
pub trait DeviceLocator {
    /// Find the node whose registered name equals `name`.
    ///
    /// Whitespace around the registered name is ignored; `name` is compared
    /// as given.
    ///
    /// # Errors
    /// Implementations report registry failures; a missing device is `Ok(None)`.
    fn find_device(&self, name: &str) -> Result<Option<DeviceNode>, UioError>;

    /// Path of the character device for `node`.
    fn device_path(&self, node: &DeviceNode) -> PathBuf;

    /// Read the integer attribute at `attribute`, relative to the node's record.
    ///
    /// # Errors
    /// [`UioError::Io`] or [`UioError::InvalidAttribute`].
    fn read_attribute(&self, node: &DeviceNode, attribute: &str) -> Result<u64, UioError>;

    /// Address, size and offset of map `index`.
    ///
    /// # Errors
    /// See [`read_attribute`](Self::read_attribute).
    fn map_info(&self, node: &DeviceNode, index: usize) -> Result<MapInfo, UioError> {
        let map = format!("{MAPS_DIR}/{MAP_DIR_PREFIX}{index}");
        let info = MapInfo::new(
            self.read_attribute(node, &format!("{map}/{MAP_ADDR_ATTRIBUTE}"))?,
            self.read_attribute(node, &format!("{map}/{MAP_SIZE_ATTRIBUTE}"))?,
            self.read_attribute(node, &format!("{map}/{MAP_OFFSET_ATTRIBUTE}"))?,
        );
        debug!(
            "{node} map {index}: addr {} size {:#x} offset {:#x}",
            info.addr, info.size, info.offset
        );
        Ok(info)
    }
}

/// Looks devices up in sysfs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SysfsLocator {
    class_dir: PathBuf,
    device_dir: PathBuf,
}

impl Default for SysfsLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsLocator {
    /// Locator for `/sys/class/uio` and `/dev`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_roots(DEFAULT_SYSFS_CLASS_DIR, DEFAULT_DEVICE_DIR)
    }

    /// Locator for an alternative class directory and device directory.
    #[must_use]
    pub fn with_roots(class_dir: impl Into<PathBuf>, device_dir: impl Into<PathBuf>) -> Self {
        Self {
            class_dir: class_dir.into(),
            device_dir: device_dir.into(),
        }
    }

    #[must_use]
    pub fn class_dir(&self) -> &Path {
        &self.class_dir
    }

    #[must_use]
    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    /// The sysfs directory describing `node`.
    #[must_use]
    pub fn sysfs_dir(&self, node: &DeviceNode) -> PathBuf {
        self.class_dir.join(node.as_str())
    }

    /// All `uioN` entries of the class directory, in ascending order of `N`.
    fn candidates(&self) -> Result<Vec<DeviceNode>, UioError> {
        let entries = match fs::read_dir(&self.class_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist", self.class_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut nodes = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(node) = entry.file_name().to_str().map(DeviceNode::new)
                && node.number().is_some()
            {
                nodes.push(node);
            }
        }
        nodes.sort_by_key(DeviceNode::number);
        Ok(nodes)
    }
}

impl DeviceLocator for SysfsLocator {
    fn find_device(&self, name: &str) -> Result<Option<DeviceNode>, UioError> {
        for node in self.candidates()? {
            let path = self.sysfs_dir(&node).join(NAME_ATTRIBUTE);
            let registered = match fs::read_to_string(&path) {
                Ok(text) => text,
                // Devices may vanish between listing and reading.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            let registered = registered.trim();
            debug!("{node} is named {registered:?}");
            if registered == name {
                return Ok(Some(node));
            }
        }

        debug!("No UIO device named {name:?} in {}", self.class_dir.display());
        Ok(None)
    }

    fn device_path(&self, node: &DeviceNode) -> PathBuf {
        self.device_dir.join(node.as_str())
    }

    fn read_attribute(&self, node: &DeviceNode, attribute: &str) -> Result<u64, UioError> {
        read_integer(&self.sysfs_dir(node).join(attribute))
    }
}
