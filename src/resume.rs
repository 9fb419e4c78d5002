//! Resume support for the split workflow.
//! Finds the numbered subdirectories a previous (possibly interrupted) run left
//! behind, so a re-run numbers new bins after them instead of reusing them.
//! Nothing is persisted: each run recomputes the cursor from disk.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{Result, TidyError};

/// A prior run's numbered directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedDir {
    pub index: u64,
    pub path: PathBuf,
}

/// Highest numbered subdirectory found under a split root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeCursor {
    pub highest: u64,
}

impl ResumeCursor {
    /// Scan `root` once and remember the largest numbered directory (0 if none).
    pub fn scan(root: &Path) -> Result<Self> {
        let highest = numbered_dirs(root)?.last().map(|d| d.index).unwrap_or(0);
        debug!(root = %root.display(), highest, "resume cursor");
        Ok(Self { highest })
    }

    /// Indices for `count` new bins, starting after `highest` and skipping any
    /// number whose path is already taken by something that is not a numbered dir.
    /// Fails with `Parse` when the numbering would run past `u64::MAX`.
    pub fn allocate(&self, root: &Path, count: usize) -> Result<Vec<u64>> {
        let mut out = Vec::with_capacity(count);
        let mut current = self.highest;
        while out.len() < count {
            let next = current.checked_add(1).ok_or_else(|| TidyError::Parse {
                what: "directory index",
                input: current.to_string(),
                reason: format!("no numbers left for new directories under {}", root.display()),
            })?;
            if fs::symlink_metadata(root.join(next.to_string())).is_ok() {
                warn!(root = %root.display(), index = next, "numbered name taken by a non-directory; skipping");
            } else {
                out.push(next);
            }
            current = next;
        }
        Ok(out)
    }
}

/// Immediate child directories of `root` whose names are plain decimal numbers,
/// sorted by index.
pub fn numbered_dirs(root: &Path) -> Result<Vec<NumberedDir>> {
    let rd = fs::read_dir(root).map_err(|cause| TidyError::Access {
        path: root.to_path_buf(),
        cause,
    })?;

    let mut found = Vec::new();
    for ent in rd.flatten() {
        let is_dir = ent.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(index) = ent.file_name().to_str().and_then(parse_index) {
            found.push(NumberedDir { index, path: ent.path() });
        }
    }
    found.sort_by_key(|d| d.index);
    Ok(found)
}

fn parse_index(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Total size of the regular files directly inside `dir`.
pub fn occupancy(dir: &Path) -> Result<u64> {
    let rd = fs::read_dir(dir).map_err(|cause| TidyError::Access {
        path: dir.to_path_buf(),
        cause,
    })?;
    let mut used = 0u64;
    for ent in rd.flatten() {
        if let Ok(meta) = ent.metadata()
            && meta.is_file()
        {
            used = used.saturating_add(meta.len());
        }
    }
    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_root_starts_at_one() {
        let td = tempdir().unwrap();
        let cursor = ResumeCursor::scan(td.path()).unwrap();
        assert_eq!(cursor.highest, 0);
        assert_eq!(cursor.allocate(td.path(), 2).unwrap(), [1, 2]);
    }

    #[test]
    fn only_numeric_directories_count() {
        let td = tempdir().unwrap();
        for d in ["1", "3", "12", "x7", "2b", "-4"] {
            fs::create_dir(td.path().join(d)).unwrap();
        }
        fs::write(td.path().join("40"), b"a file, not a bin").unwrap();

        let dirs = numbered_dirs(td.path()).unwrap();
        let idx: Vec<u64> = dirs.iter().map(|d| d.index).collect();
        assert_eq!(idx, [1, 3, 12]);
        assert_eq!(ResumeCursor::scan(td.path()).unwrap().highest, 12);
    }

    #[test]
    fn allocation_skips_occupied_numbers() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("2")).unwrap();
        fs::write(td.path().join("3"), b"stray").unwrap();
        let cursor = ResumeCursor::scan(td.path()).unwrap();
        assert_eq!(cursor.allocate(td.path(), 2).unwrap(), [4, 5]);
    }

    #[test]
    fn largest_index_cannot_be_followed() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join(u64::MAX.to_string())).unwrap();
        let cursor = ResumeCursor::scan(td.path()).unwrap();
        assert_eq!(cursor.highest, u64::MAX);
        assert!(cursor.allocate(td.path(), 0).unwrap().is_empty());
        let err = cursor.allocate(td.path(), 1).unwrap_err();
        assert!(matches!(err, TidyError::Parse { what: "directory index", .. }), "{err}");
    }

    #[test]
    fn occupancy_sums_flat_files() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("a"), vec![0u8; 10]).unwrap();
        fs::write(td.path().join("b"), vec![0u8; 5]).unwrap();
        fs::create_dir(td.path().join("sub")).unwrap();
        fs::write(td.path().join("sub/c"), vec![0u8; 100]).unwrap();
        assert_eq!(occupancy(td.path()).unwrap(), 15);
    }

    #[test]
    fn missing_root_is_access_error() {
        let td = tempdir().unwrap();
        let err = ResumeCursor::scan(&td.path().join("nope")).unwrap_err();
        assert!(matches!(err, TidyError::Access { .. }));
    }
}
