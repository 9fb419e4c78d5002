//! Whole-file SHA-256 used to verify cross-filesystem copies and to confirm
//! duplicates before `delete-moved` removes anything.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use super::helpers::io_error_with_help;
use crate::errors::Result;

/// Hex-encoded SHA-256 of the file at `path`, read in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(io_error_with_help("open for checksum", path))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(io_error_with_help("read for checksum", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let hex = format!("{:x}", hasher.finalize());
    debug!(path = %path.display(), sha256 = %hex, "checksum computed");
    Ok(hex)
}
