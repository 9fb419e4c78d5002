//! Pre-flight overlap checks between a target directory and its sources.
//!
//! Paths are compared after full resolution: made absolute, `.`/`..` collapsed,
//! and symbolic links resolved through the deepest existing ancestor. A target
//! that does not exist yet is resolved through its existing parent, so a symlinked
//! parent cannot smuggle the target into a source tree.

use std::env;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::errors::{OverlapKind, Result, TidyError};

/// Fail with `TidyError::Overlap` if relocating from any of `sources` into `target`
/// could move the target into itself or re-discover already relocated files.
pub fn check_path_overlap(target: &Path, sources: &[PathBuf]) -> Result<()> {
    let real_target = resolve_real(target)?;

    for src in sources {
        let real_src = resolve_real(src)?;
        debug!(target = %real_target.display(), source = %real_src.display(), "overlap check");

        let relation = if real_target == real_src {
            Some(OverlapKind::Same)
        } else if is_sub_path(&real_target, &real_src) {
            Some(OverlapKind::TargetInsideSource)
        } else if is_sub_path(&real_src, &real_target) {
            Some(OverlapKind::SourceInsideTarget)
        } else {
            None
        };

        if let Some(relation) = relation {
            return Err(TidyError::Overlap {
                target: target.to_path_buf(),
                source_dir: src.clone(),
                relation,
            });
        }
    }
    Ok(())
}

/// True if `child` lies strictly below `parent`. Comparison is per component,
/// so `/a/bc` is not below `/a/b`.
pub fn is_sub_path(child: &Path, parent: &Path) -> bool {
    child != parent && child.starts_with(parent)
}

/// Absolute, symlink-free form of `path`, even when its tail does not exist yet.
pub fn resolve_real(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|cause| TidyError::Access {
            path: PathBuf::from("."),
            cause,
        })?;
        cwd.join(path)
    };

    // Deepest existing ancestor goes through the OS, the rest is normalized lexically.
    let comps: Vec<Component<'_>> = absolute.components().collect();
    for split in (1..=comps.len()).rev() {
        let prefix: PathBuf = comps[..split].iter().collect();
        if let Ok(real) = dunce::canonicalize(&prefix) {
            let mut resolved = real;
            for comp in &comps[split..] {
                match comp {
                    Component::CurDir => {}
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    Component::Normal(seg) => resolved.push(seg),
                    Component::RootDir | Component::Prefix(_) => {}
                }
            }
            return Ok(resolved);
        }
    }
    Ok(normalize_lexically(&absolute))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
