//! Blake3 checksums for installed payloads.
//!
//! Checksums are stored in the format `"blake3:<hex>"` for easy
//! identification and future algorithm upgrades.

use crate::error::{InstallError, Result};

/// Calculates the Blake3 checksum of a payload.
///
/// Returns `"blake3:<hex>"` where `<hex>` is the hash in lowercase
/// hexadecimal. Deterministic: the same bytes always hash the same.
///
/// # Examples
///
/// ```
/// use skein_store::calculate_checksum;
///
/// let checksum = calculate_checksum(b"module bytes");
/// assert!(checksum.starts_with("blake3:"));
/// assert_eq!(checksum.len(), 71); // "blake3:" + 64 hex chars
/// ```
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Verifies that a payload matches its recorded checksum.
///
/// Uses constant-time comparison so the comparison itself leaks nothing
/// about the expected value.
///
/// # Errors
///
/// Returns [`InstallError::ChecksumMismatch`] if the calculated checksum
/// differs from the expected value.
pub fn verify_checksum(data: &[u8], expected: &str, path: &str) -> Result<()> {
    let actual = calculate_checksum(data);

    if !constant_time_compare(&actual, expected) {
        return Err(InstallError::ChecksumMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Compares two checksum strings in constant time.
///
/// Always processes the full length of both inputs; differences are
/// accumulated with bitwise OR instead of short-circuiting.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let len_match = a.len() == b.len();

    let bytes_a = a.as_bytes();
    let bytes_b = b.as_bytes();
    let max_len = a.len().max(b.len());

    let mut diff = 0u8;
    for i in 0..max_len {
        let byte_a = bytes_a.get(i).copied().unwrap_or(0);
        let byte_b = bytes_b.get(i).copied().unwrap_or(0);
        diff |= byte_a ^ byte_b;
    }

    len_match && diff == 0
}
