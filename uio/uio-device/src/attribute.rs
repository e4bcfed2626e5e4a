//! Integer attribute files.
//!
//! The kernel prints map addresses as `0x`-prefixed hexadecimal and most
//! other values as decimal, each followed by a newline.

use crate::UioError;
use std::fs;
use std::path::Path;
use uio_info::sysfs::HEX_PREFIXES;

/// Parse the text of an integer attribute.
///
/// Surrounding whitespace is ignored. Returns `None` unless the remainder is
/// a non-empty run of decimal digits, or of hexadecimal digits behind `0x`.
#[must_use]
pub fn parse_integer(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, radix) = match HEX_PREFIXES.iter().find_map(|p| text.strip_prefix(p)) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Read and parse the integer attribute file at `path`.
///
/// # Errors
/// - [`UioError::Io`] if the file cannot be read.
/// - [`UioError::InvalidAttribute`] if its contents are not an integer.
pub fn read_integer(path: &Path) -> Result<u64, UioError> {
    let text = fs::read_to_string(path)?;
    parse_integer(&text).ok_or_else(|| UioError::InvalidAttribute {
        path: path.to_path_buf(),
        value: text.trim().to_owned(),
    })
}
