//! No-clobber atomic rename.
//! - On Linux, `renameat2(RENAME_NOREPLACE)` refuses an existing destination inside the kernel.
//! - Elsewhere (or when the filesystem rejects the flag) an existence check immediately
//!   precedes `rename`; the remaining window is the documented look-then-act race.
//! - On Unix, best-effort fsync of the destination directory after the rename.

use std::fs;
use std::io;
use std::path::Path;

/// Rename `src` to `dst` without ever replacing an existing `dst`.
/// Returns `io::ErrorKind::AlreadyExists` when the destination is occupied.
/// Cross-filesystem failures are returned untouched so the caller can classify them.
pub(super) fn rename_no_clobber(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        match renameat2_noreplace(src, dst) {
            Ok(()) => {
                sync_parent(dst);
                return Ok(());
            }
            Err(e) if noreplace_unsupported(&e) => {}
            Err(e) => return Err(e),
        }
    }

    match fs::symlink_metadata(dst) {
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination exists: {}", dst.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::rename(src, dst)?;
    sync_parent(dst);
    Ok(())
}

fn sync_parent(dst: &Path) {
    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = super::util::fsync_dir(parent);
    }
    #[cfg(not(unix))]
    let _ = dst;
}

#[cfg(target_os = "linux")]
fn renameat2_noreplace(src: &Path, dst: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    const RENAME_NOREPLACE: libc::c_uint = 1;

    let src_c = CString::new(src.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    let dst_c = CString::new(dst.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;

    let rc = unsafe {
        libc::syscall(
            libc::SYS_renameat2,
            libc::AT_FDCWD,
            src_c.as_ptr(),
            libc::AT_FDCWD,
            dst_c.as_ptr(),
            RENAME_NOREPLACE,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Kernel or filesystem does not implement RENAME_NOREPLACE.
#[cfg(target_os = "linux")]
fn noreplace_unsupported(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(code) if code == libc::EINVAL || code == libc::ENOSYS || code == libc::EOPNOTSUPP
    )
}
