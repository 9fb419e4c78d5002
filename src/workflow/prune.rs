//! prune-empty: remove empty immediate subdirectories of a root.
//! One level only; a directory that holds nothing but an empty directory is kept.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Progress;
use crate::errors::{Result, TidyError};
use crate::fs_ops::io_error_with_help;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub failed: usize,
}

/// Remove (or, with `dry_run`, list) every empty directory directly inside `root`.
/// Symlinks are never followed. Failures on one entry are reported and the scan continues.
pub fn prune_empty_dirs(root: &Path, dry_run: bool, mut on: impl FnMut(Progress<'_>)) -> Result<PruneReport> {
    let rd = fs::read_dir(root).map_err(|cause| TidyError::Access {
        path: root.to_path_buf(),
        cause,
    })?;

    let mut candidates: Vec<PathBuf> = rd
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    candidates.sort();

    let mut report = PruneReport::default();
    for dir in candidates {
        match is_empty_dir(&dir).and_then(|empty| {
            if empty && !dry_run {
                fs::remove_dir(&dir).map_err(io_error_with_help("remove directory", &dir))?;
            }
            Ok(empty)
        }) {
            Ok(true) => {
                info!(dir = %dir.display(), dry_run, "pruned empty directory");
                on(Progress::Removed { path: &dir, dry_run });
                report.removed.push(dir);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "could not prune directory");
                on(Progress::RemoveFailed { path: &dir, error: &e });
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut rd = fs::read_dir(dir).map_err(|cause| TidyError::Access {
        path: dir.to_path_buf(),
        cause,
    })?;
    Ok(rd.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn removes_only_empty_immediate_children() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::create_dir(root.join("empty")).unwrap();
        fs::create_dir(root.join("full")).unwrap();
        fs::write(root.join("full/f"), b"x").unwrap();
        fs::create_dir_all(root.join("nested/inner")).unwrap();
        fs::write(root.join("file.txt"), b"x").unwrap();

        let report = prune_empty_dirs(root, false, |_| {}).unwrap();

        assert_eq!(report.removed, [root.join("empty")]);
        assert_eq!(report.failed, 0);
        assert!(!root.join("empty").exists());
        assert!(root.join("full/f").exists());
        assert!(root.join("nested/inner").is_dir(), "one level only");
        assert!(root.join("file.txt").exists());
    }

    #[test]
    fn dry_run_lists_without_removing() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("a")).unwrap();
        fs::create_dir(td.path().join("b")).unwrap();

        let mut seen = Vec::new();
        let report = prune_empty_dirs(td.path(), true, |p| {
            if let Progress::Removed { path, dry_run } = p {
                assert!(dry_run);
                seen.push(path.file_name().unwrap().to_owned());
            }
        })
        .unwrap();

        assert_eq!(report.removed.len(), 2);
        assert_eq!(seen, ["a", "b"]);
        assert!(td.path().join("a").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_not_followed() {
        let td = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), td.path().join("link")).unwrap();

        let report = prune_empty_dirs(td.path(), false, |_| {}).unwrap();
        assert!(report.removed.is_empty());
        assert!(outside.path().is_dir());
    }

    #[test]
    fn missing_root_is_access_error() {
        let td = tempdir().unwrap();
        let err = prune_empty_dirs(&td.path().join("nope"), false, |_| {}).unwrap_err();
        assert!(matches!(err, TidyError::Access { .. }));
    }
}
