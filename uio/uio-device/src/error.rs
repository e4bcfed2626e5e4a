use std::io;
use std::path::PathBuf;
use uio_mmio::MmioError;

/// Errors raised by device lookup, the device file and interrupt control.
#[derive(Debug, thiserror::Error)]
pub enum UioError {
    #[error("no UIO device is named {name:?}")]
    DeviceNotFound { name: String },
    #[error("failed to open {}: {source}", .path.display())]
    OpenFailed { path: PathBuf, source: io::Error },
    #[error("{}: {value:?} is neither a decimal nor a 0x-prefixed integer", .path.display())]
    InvalidAttribute { path: PathBuf, value: String },
    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("the device handle has been closed")]
    InvalidState,
    #[error(transparent)]
    Mmio(#[from] MmioError),
}
