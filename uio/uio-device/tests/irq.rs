use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::thread;
use std::time::{Duration, Instant};
use uio_device::{DeviceHandle, DeviceNode, SysfsLocator, UioError};

/// A handle whose device file is one end of a socket pair; the other end
/// plays the kernel.
fn irq_device() -> (DeviceHandle, UnixStream) {
    let (ours, kernel) = UnixStream::pair().unwrap();
    let file = File::from(OwnedFd::from(ours));
    let locator = SysfsLocator::with_roots("/nonexistent/class", "/nonexistent/dev");
    let dev = DeviceHandle::from_parts(locator, "irq-test", DeviceNode::new("uio9"), file);
    (dev, kernel)
}

fn control_word(kernel: &mut UnixStream) -> [u8; 4] {
    let mut word = [0u8; 4];
    kernel.read_exact(&mut word).unwrap();
    word
}

#[test]
fn enable_then_poll_without_pending_interrupt() {
    let (dev, mut kernel) = irq_device();

    dev.irq_on().unwrap();
    assert_eq!(control_word(&mut kernel), [1, 0, 0, 0]);
    assert_eq!(dev.wait_irq(Some(Duration::ZERO)).unwrap(), None);
}

#[test]
fn disable_writes_zero() {
    let (dev, mut kernel) = irq_device();

    dev.irq_off().unwrap();
    assert_eq!(control_word(&mut kernel), [0, 0, 0, 0]);
}

#[test]
fn pending_count_is_returned() {
    let (dev, mut kernel) = irq_device();

    dev.irq_on().unwrap();
    kernel.write_all(&7i32.to_le_bytes()).unwrap();
    assert_eq!(dev.wait_irq(Some(Duration::ZERO)).unwrap(), Some(7));

    kernel.write_all(&(-2i32).to_le_bytes()).unwrap();
    assert_eq!(dev.wait_irq(Some(Duration::from_secs(1))).unwrap(), Some(-2));
    assert_eq!(dev.wait_irq(Some(Duration::ZERO)).unwrap(), None);
}

#[test]
fn wait_without_timeout_blocks_until_an_interrupt() {
    let (dev, mut kernel) = irq_device();

    let fire = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        kernel.write_all(&3i32.to_le_bytes()).unwrap();
        kernel
    });

    assert_eq!(dev.wait_irq(None).unwrap(), Some(3));
    drop(fire.join().unwrap());
}

#[test]
fn count_split_across_writes_is_reassembled() {
    let (dev, mut kernel) = irq_device();

    let fire = thread::spawn(move || {
        kernel.write_all(&[0x2A, 0x00]).unwrap();
        thread::sleep(Duration::from_millis(20));
        kernel.write_all(&[0x00, 0x00]).unwrap();
        kernel
    });

    assert_eq!(dev.wait_irq(None).unwrap(), Some(42));
    drop(fire.join().unwrap());
}

#[test]
fn timeout_expires_without_interrupt() {
    let (dev, _kernel) = irq_device();

    let start = Instant::now();
    assert_eq!(dev.wait_irq(Some(Duration::from_millis(30))).unwrap(), None);
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn closed_peer_reports_no_data() {
    let (dev, kernel) = irq_device();
    drop(kernel);

    assert_eq!(dev.wait_irq(Some(Duration::from_secs(1))).unwrap(), None);
}

#[test]
fn truncated_count_is_an_io_error() {
    let (dev, mut kernel) = irq_device();
    kernel.write_all(&[1, 2]).unwrap();
    drop(kernel);

    assert!(matches!(
        dev.wait_irq(Some(Duration::from_secs(1))),
        Err(UioError::Io(ref e)) if e.kind() == ErrorKind::UnexpectedEof
    ));
}
