//! Content integrity checking for mediafire-dl
//!
//! MediaFire listings report a SHA-256 hash per file; this module computes
//! the matching digest of a local file so already-present content can be
//! trusted (or re-fetched) without another network round-trip.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::core::error::Result;

/// Buffer size for chunked reads; keeps memory flat regardless of file size.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Computes the lowercase hex SHA-256 digest of a file on disk.
///
/// Reads in fixed-size chunks, so files larger than available memory are
/// fine. Fails with `Error::Io` when the file cannot be opened or read.
pub async fn file_digest(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compares two hex digests, ignoring case.
pub fn matches(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
