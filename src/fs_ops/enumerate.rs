//! Candidate-file enumeration.
//! Recursive (consolidate) and flat (split) listings of regular files, sorted by
//! name so dry-run output matches the later execution.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{Result, TidyError};

/// One enumerated regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub name: OsString,
    pub size: u64,
    pub source_path: PathBuf,
}

/// Every regular file below `dir`, depth-first with entries sorted by name.
///
/// Symlinks are neither followed nor collected. An unreadable `dir` is an
/// `Access` error (the caller skips the whole source); unreadable nested
/// directories are logged and skipped individually.
pub fn collect_tree(dir: &Path) -> Result<Vec<FileItem>> {
    ensure_listable(dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!(path = %at.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping file without metadata");
                continue;
            }
        };
        files.push(FileItem {
            name: entry.file_name().to_os_string(),
            size,
            source_path: entry.into_path(),
        });
    }
    debug!(dir = %dir.display(), count = files.len(), "enumerated tree");
    Ok(files)
}

/// Regular files directly inside `dir`, sorted by name. Subdirectories are ignored.
pub fn collect_flat(dir: &Path) -> Result<Vec<FileItem>> {
    let rd = fs::read_dir(dir).map_err(|cause| TidyError::Access {
        path: dir.to_path_buf(),
        cause,
    })?;

    let mut files = Vec::new();
    for ent in rd {
        let ent = ent.map_err(|cause| TidyError::Access {
            path: dir.to_path_buf(),
            cause,
        })?;
        let ft = match ent.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                warn!(path = %ent.path().display(), error = %e, "skipping entry without file type");
                continue;
            }
        };
        if !ft.is_file() {
            continue;
        }
        let meta = ent.metadata().map_err(|cause| TidyError::Access {
            path: ent.path(),
            cause,
        })?;
        files.push(FileItem {
            name: ent.file_name(),
            size: meta.len(),
            source_path: ent.path(),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn ensure_listable(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|cause| TidyError::Access {
        path: dir.to_path_buf(),
        cause,
    })?;
    if !meta.is_dir() {
        return Err(TidyError::Access {
            path: dir.to_path_buf(),
            cause: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    fs::read_dir(dir).map_err(|cause| TidyError::Access {
        path: dir.to_path_buf(),
        cause,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(items: &[FileItem]) -> Vec<String> {
        items.iter().map(|i| i.name.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn tree_walks_nested_dirs_in_name_order() {
        let td = tempdir().unwrap();
        fs::create_dir_all(td.path().join("b/inner")).unwrap();
        fs::write(td.path().join("z.txt"), b"zz").unwrap();
        fs::write(td.path().join("a.txt"), b"a").unwrap();
        fs::write(td.path().join("b/inner/c.txt"), b"ccc").unwrap();

        let items = collect_tree(td.path()).unwrap();
        assert_eq!(names(&items), ["a.txt", "c.txt", "z.txt"]);
        assert_eq!(items[1].size, 3);
        assert_eq!(items[1].source_path, td.path().join("b/inner/c.txt"));
    }

    #[test]
    fn tree_on_missing_dir_is_access_error() {
        let td = tempdir().unwrap();
        let err = collect_tree(&td.path().join("gone")).unwrap_err();
        assert!(matches!(err, TidyError::Access { .. }));
    }

    #[test]
    fn flat_ignores_subdirectories() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("1")).unwrap();
        fs::write(td.path().join("1/old.bin"), b"x").unwrap();
        fs::write(td.path().join("b.bin"), b"bb").unwrap();
        fs::write(td.path().join("a.bin"), b"a").unwrap();

        let items = collect_flat(td.path()).unwrap();
        assert_eq!(names(&items), ["a.bin", "b.bin"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_collected() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(td.path().join("real.txt"), td.path().join("link.txt")).unwrap();

        assert_eq!(names(&collect_tree(td.path()).unwrap()), ["real.txt"]);
        assert_eq!(names(&collect_flat(td.path()).unwrap()), ["real.txt"]);
    }
}
