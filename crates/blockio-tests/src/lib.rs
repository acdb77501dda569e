#![warn(clippy::pedantic)]

//! Shared fixtures for the blockio integration tests and benches.

use std::fs;
use std::path::Path;

/// Deterministic position-dependent byte pattern.
///
/// Every offset gets a distinct-looking value, so a read served from the
/// wrong position shows up as a content mismatch, not just a length one.
#[must_use]
pub fn pattern_bytes(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i.wrapping_mul(31).wrapping_add(7)) as u8)
        .collect()
}

/// Drop a `<id>.blk` block file into `dir`.
///
/// # Panics
///
/// Panics on any filesystem failure — this is fixture setup.
pub fn write_block(dir: &Path, id: u64, data: &[u8]) {
    fs::write(dir.join(format!("{id}.blk")), data).unwrap();
}
