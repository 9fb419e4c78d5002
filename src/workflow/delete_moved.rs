//! delete-moved: clean up a source directory after an interrupted copy.
//!
//! A file in `from` is deleted only when `to` holds a file with the same name,
//! the same size and the same SHA-256 digest. Both directories are scanned flat.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Progress;
use crate::errors::{OverlapKind, Result, TidyError};
use crate::fs_ops::{FileItem, collect_flat, io_error_with_help, sha256_file};
use crate::safety::resolve_real;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMovedReport {
    pub deleted: Vec<PathBuf>,
    /// Same name in both directories but different size or content.
    pub skipped: usize,
}

pub fn delete_moved(
    from: &Path,
    to: &Path,
    dry_run: bool,
    mut on: impl FnMut(Progress<'_>),
) -> Result<DeleteMovedReport> {
    require_dir(from)?;
    require_dir(to)?;
    if resolve_real(from)? == resolve_real(to)? {
        return Err(TidyError::Overlap {
            target: to.to_path_buf(),
            source_dir: from.to_path_buf(),
            relation: OverlapKind::Same,
        });
    }

    let copies: HashMap<OsString, FileItem> = collect_flat(to)?
        .into_iter()
        .map(|item| (item.name.clone(), item))
        .collect();

    let mut report = DeleteMovedReport::default();
    for original in collect_flat(from)? {
        let Some(copy) = copies.get(&original.name) else {
            continue;
        };
        if copy.size != original.size {
            debug!(file = %original.source_path.display(), "size differs; keeping");
            report.skipped += 1;
            continue;
        }
        if sha256_file(&original.source_path)? != sha256_file(&copy.source_path)? {
            debug!(file = %original.source_path.display(), "content differs; keeping");
            report.skipped += 1;
            continue;
        }

        let path = original.source_path;
        if !dry_run {
            fs::remove_file(&path).map_err(io_error_with_help("remove file", &path))?;
        }
        info!(file = %path.display(), copy = %copy.source_path.display(), dry_run, "duplicate of moved file removed");
        on(Progress::Removed { path: &path, dry_run });
        report.deleted.push(path);
    }
    Ok(report)
}

fn require_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir) {
        Ok(m) if m.is_dir() => Ok(()),
        Ok(_) => Err(TidyError::Access {
            path: dir.to_path_buf(),
            cause: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        }),
        Err(cause) => Err(TidyError::Access { path: dir.to_path_buf(), cause }),
    }
}
