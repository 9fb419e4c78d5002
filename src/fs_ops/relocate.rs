//! Single-file relocation.
//! Attempts a no-clobber atomic rename; when source and destination sit on
//! different filesystems, falls back to exclusive-create copy, fsync, verify, and
//! only then removes the source.
//!
//! Limitation: the copy path keeps permission bits only. Timestamps and extended
//! attributes of the original are not carried across filesystems.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use super::atomic::rename_no_clobber;
use super::digest::sha256_file;
use super::helpers::io_error_with_help;
use super::io_copy::{copy_to_new_file, discard_partial};
use super::util::is_cross_device;
use crate::errors::{Result, TidyError};

/// How a relocation was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationMethod {
    /// Same-filesystem atomic rename.
    Renamed,
    /// Copy + verify + delete across a filesystem boundary.
    Copied {
        bytes: u64,
        /// Hex SHA-256 when checksum verification was enabled.
        sha256: Option<String>,
    },
}

/// Moves one file at a time without ever overwriting a destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relocator {
    /// Compare whole-file SHA-256 of source and copy before deleting the source.
    pub verify_checksum: bool,
    /// Skip the rename attempt and always copy (exercises the cross-filesystem path).
    pub force_copy: bool,
}

impl Relocator {
    pub fn new(verify_checksum: bool) -> Self {
        Self {
            verify_checksum,
            force_copy: false,
        }
    }

    /// Relocate `src` to `dest`.
    ///
    /// On any error the source is still in place, and `dest` is either absent or
    /// exactly what it was before the call.
    pub fn relocate(&self, src: &Path, dest: &Path) -> Result<RelocationMethod> {
        if !self.force_copy {
            match rename_no_clobber(src, dest) {
                Ok(()) => {
                    debug!(src = %src.display(), dest = %dest.display(), "renamed atomically");
                    return Ok(RelocationMethod::Renamed);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return Err(TidyError::Clobber { dest: dest.to_path_buf() });
                }
                Err(e) if is_cross_device(&e) => {
                    info!(src = %src.display(), dest = %dest.display(), "cross-filesystem move; copying instead");
                }
                Err(e) => return Err(io_error_with_help("rename", src)(e)),
            }
        }
        self.copy_then_delete(src, dest)
    }

    fn copy_then_delete(&self, src: &Path, dest: &Path) -> Result<RelocationMethod> {
        let src_digest = if self.verify_checksum {
            Some(sha256_file(src)?)
        } else {
            None
        };

        let bytes = copy_to_new_file(src, dest)?;

        // From here on `dest` is ours: every failure removes it before returning.
        if let Err(e) = verify_sizes(src, dest, bytes) {
            discard_partial(dest);
            return Err(e);
        }

        if let Some(expected) = &src_digest {
            let actual = match sha256_file(dest) {
                Ok(d) => d,
                Err(e) => {
                    discard_partial(dest);
                    return Err(e);
                }
            };
            if &actual != expected {
                discard_partial(dest);
                return Err(TidyError::Verification {
                    src: src.to_path_buf(),
                    dest: dest.to_path_buf(),
                    detail: format!("checksum mismatch: source={expected} dest={actual}"),
                });
            }
        }

        if let Err(e) = fs::remove_file(src) {
            // The verified copy is complete; keep both rather than lose anything.
            warn!(error = %e, src = %src.display(), dest = %dest.display(), "copy verified but source could not be removed");
            return Err(io_error_with_help("remove source after verified copy", src)(e));
        }

        info!(src = %src.display(), dest = %dest.display(), bytes, "copied across filesystems and removed source");
        Ok(RelocationMethod::Copied {
            bytes,
            sha256: src_digest,
        })
    }
}

fn verify_sizes(src: &Path, dest: &Path, copied: u64) -> Result<()> {
    let src_len = fs::metadata(src).map_err(io_error_with_help("stat source", src))?.len();
    let dest_len = fs::metadata(dest).map_err(io_error_with_help("stat destination", dest))?.len();
    if src_len != dest_len || copied != src_len {
        return Err(TidyError::Verification {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            detail: format!("size mismatch: source={src_len} dest={dest_len} copied={copied}"),
        });
    }
    Ok(())
}
