#![allow(dead_code)]

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uio_device::SysfsLocator;
use uio_mmio::host_page_size;

/// A sysfs class directory and a device directory inside a temporary root.
pub struct FakeUio {
    root: TempDir,
}

impl FakeUio {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("class")).unwrap();
        fs::create_dir(root.path().join("dev")).unwrap();
        Self { root }
    }

    pub fn class_dir(&self) -> PathBuf {
        self.root.path().join("class")
    }

    pub fn dev_dir(&self) -> PathBuf {
        self.root.path().join("dev")
    }

    pub fn locator(&self) -> SysfsLocator {
        SysfsLocator::with_roots(self.class_dir(), self.dev_dir())
    }

    /// Register `node` under `name`, the way the kernel prints it.
    pub fn add_device(&self, node: &str, name: &str) {
        fs::create_dir_all(self.class_dir().join(node)).unwrap();
        self.write_attribute(node, "name", &format!("{name}\n"));
    }

    pub fn add_map(&self, node: &str, index: usize, addr: &str, size: &str, offset: &str) {
        let map = format!("maps/map{index}");
        fs::create_dir_all(self.class_dir().join(node).join(&map)).unwrap();
        self.write_attribute(node, &format!("{map}/addr"), &format!("{addr}\n"));
        self.write_attribute(node, &format!("{map}/size"), &format!("{size}\n"));
        self.write_attribute(node, &format!("{map}/offset"), &format!("{offset}\n"));
    }

    pub fn write_attribute(&self, node: &str, attribute: &str, text: &str) {
        fs::write(self.class_dir().join(node).join(attribute), text).unwrap();
    }

    /// Create the device file for `node`, backing `pages` host pages.
    pub fn add_node_file(&self, node: &str, pages: u64) -> File {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(self.dev_dir().join(node))
            .unwrap();
        file.set_len(pages * host_page_size().as_u64()).unwrap();
        file
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

/// Host page size in bytes.
pub fn page_size() -> u64 {
    host_page_size().as_u64()
}

/// Two registered devices; `test-device` (`uio1`) has two maps and a node.
///
/// Map 0 starts 0x10 bytes into its page and is 0x150 bytes long. Map 1 is
/// one full page, with its metadata printed in decimal.
pub fn fixture() -> (FakeUio, File) {
    let uio = FakeUio::new();
    uio.add_device("uio0", "other-device");
    uio.add_device("uio1", "test-device");
    uio.add_map("uio1", 0, "0x40000000", "0x150", "0x10");
    uio.add_map("uio1", 1, "1073807360", &page_size().to_string(), "0");
    let node = uio.add_node_file("uio1", 2);
    (uio, node)
}
