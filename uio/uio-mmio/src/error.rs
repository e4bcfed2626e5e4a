use std::io;

/// Errors raised while mapping a region or accessing registers through it.
#[derive(Debug, thiserror::Error)]
pub enum MmioError {
    #[error("failed to map region {index}: {source}")]
    MapFailed { index: usize, source: io::Error },
    #[error("region {index} is no longer mapped")]
    Unmapped { index: usize },
    #[error("range {offset:#x}+{length:#x} exceeds the {available:#x} bytes available")]
    RegionRange {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("{width}-byte access at offset {offset:#x} exceeds window of {length:#x} bytes")]
    OutOfRange {
        offset: usize,
        width: usize,
        length: usize,
    },
    #[error("value {value:#x} does not fit in {width} bytes")]
    ValueOutOfDomain { value: u64, width: usize },
    #[error("offset {offset:#x} violates {width}-byte alignment")]
    Misaligned { offset: usize, width: usize },
}

impl MmioError {
    pub(crate) fn map_failed(index: usize, kind: io::ErrorKind, msg: &'static str) -> Self {
        Self::MapFailed {
            index,
            source: io::Error::new(kind, msg),
        }
    }
}
