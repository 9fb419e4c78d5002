use std::fs::File;
use std::io;
use std::path::Path;

/// True when a rename failed because source and destination live on different
/// filesystems. Uses the structured error first; message matching only applies
/// when the platform gave us no OS code at all.
pub(super) fn is_cross_device(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    if let Some(code) = e.raw_os_error() {
        return raw_code_is_cross_device(code);
    }
    let msg = e.to_string().to_ascii_lowercase();
    msg.contains("cross-device") || msg.contains("exdev") || msg.contains("not same device")
}

#[cfg(unix)]
fn raw_code_is_cross_device(code: i32) -> bool {
    code == libc::EXDEV
}

#[cfg(windows)]
fn raw_code_is_cross_device(code: i32) -> bool {
    // ERROR_NOT_SAME_DEVICE
    code == 17
}

#[cfg(not(any(unix, windows)))]
fn raw_code_is_cross_device(_code: i32) -> bool {
    false
}

#[cfg(unix)]
pub(super) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(super) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
