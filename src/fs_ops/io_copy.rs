//! Streaming copy into a brand-new destination file.
//!
//! Features:
//! - Creates the destination with `create_new(true)` so we never clobber an existing file.
//! - Buffered I/O with large (1 MiB) buffers to reduce syscall count.
//! - Applies the source permission bits, then `sync_all` before reporting success.
//! - Any failure after the destination was created removes the partial file, so a
//!   re-run is never blocked by a corrupt leftover.
//!
//! Snapshot semantics: the source is read once from start to EOF; if it grows
//! concurrently, the additional bytes are not included. The caller compares sizes.

use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::helpers::io_error_with_help;
use crate::errors::{Result, TidyError};

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst` (which must not exist). Returns the number of bytes written.
pub(super) fn copy_to_new_file(src: &Path, dst: &Path) -> Result<u64> {
    let src_f = File::open(src).map_err(io_error_with_help("open source", src))?;
    let perms = src_f
        .metadata()
        .map_err(io_error_with_help("stat source", src))?
        .permissions();
    copy_reader_to_new_file(src_f, perms, dst)
}

/// Write everything `reader` yields into a newly created `dst` with `perms`.
pub(super) fn copy_reader_to_new_file<R: Read>(reader: R, perms: Permissions, dst: &Path) -> Result<u64> {
    let dst_f = match OpenOptions::new().write(true).create_new(true).open(dst) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(TidyError::Clobber { dest: dst.to_path_buf() });
        }
        Err(e) => return Err(io_error_with_help("create destination", dst)(e)),
    };

    match stream_and_sync(reader, dst_f, perms, dst) {
        Ok(bytes) => {
            debug!(dest = %dst.display(), bytes, "copy synced");
            Ok(bytes)
        }
        Err(e) => {
            discard_partial(dst);
            Err(io_error_with_help("copy data to", dst)(e))
        }
    }
}

fn stream_and_sync<R: Read>(reader: R, dst_f: File, perms: Permissions, dst: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, reader);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    let dst_f = writer.into_inner().map_err(|e| e.into_error())?;
    dst_f.sync_all()?;
    drop(dst_f);
    fs::set_permissions(dst, perms)?;
    Ok(bytes)
}

/// Remove a destination this run created. Failures are logged, never propagated,
/// so the original error reaches the caller.
pub(super) fn discard_partial(dst: &Path) {
    match fs::remove_file(dst) {
        Ok(()) => debug!(dest = %dst.display(), "removed partial destination"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, dest = %dst.display(), "failed to remove partial destination"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Yields `good` bytes, then fails like a yanked network mount.
    struct FailingReader {
        good: usize,
        served: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served >= self.good {
                return Err(io::Error::other("device went away"));
            }
            let n = buf.len().min(self.good - self.served);
            buf[..n].fill(b'z');
            self.served += n;
            Ok(n)
        }
    }

    #[test]
    fn copy_small_file_ok() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, b"hello world").unwrap();

        let n = copy_to_new_file(&src, &dst).unwrap();
        assert_eq!(n, 11);
        assert_eq!(fs::read(&dst).unwrap(), b"hello world");
        assert!(src.exists());
    }

    #[test]
    fn copy_zero_length_ok() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty");
        let dst = dir.path().join("out");
        File::create(&src).unwrap();

        assert_eq!(copy_to_new_file(&src, &dst).unwrap(), 0);
        assert_eq!(fs::metadata(&dst).unwrap().len(), 0);
    }

    #[test]
    fn existing_destination_is_clobber_and_untouched() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::write(&src, b"data").unwrap();
        fs::write(&dst, b"keep me").unwrap();

        let err = copy_to_new_file(&src, &dst).unwrap_err();
        assert!(matches!(err, TidyError::Clobber { .. }));
        assert_eq!(fs::read(&dst).unwrap(), b"keep me");
    }

    #[test]
    fn mid_stream_failure_leaves_no_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        let original = vec![7u8; 3 * BUF_SIZE];
        fs::write(&src, &original).unwrap();
        let perms = fs::metadata(&src).unwrap().permissions();

        let reader = FailingReader { good: BUF_SIZE + 17, served: 0 };
        let err = copy_reader_to_new_file(reader, perms, &dst).unwrap_err();

        assert!(matches!(err, TidyError::Io { .. }));
        assert!(!dst.exists(), "partial destination must be removed");
        assert_eq!(fs::read(&src).unwrap(), original);
    }

    #[test]
    fn large_file_copy_boundary() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("big.bin");
        let dst = dir.path().join("big.out");
        let size = 2 * BUF_SIZE + 123;
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        assert_eq!(copy_to_new_file(&src, &dst).unwrap() as usize, size);
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[cfg(unix)]
    #[test]
    fn permission_bits_follow_source() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let src = dir.path().join("script.sh");
        let dst = dir.path().join("copy.sh");
        fs::write(&src, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, Permissions::from_mode(0o750)).unwrap();

        copy_to_new_file(&src, &dst).unwrap();
        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }
}
