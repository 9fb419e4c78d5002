//! Relocation plans and their fail-fast execution.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::{Progress, RunStage};
use crate::errors::{Result, TidyError};
use crate::fs_ops::{RelocationMethod, Relocator, io_error_with_help};
use crate::shutdown;

/// One planned relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// The destination name differs from the source name to avoid a collision.
    pub renamed: bool,
}

/// The complete, ordered set of relocations for one run.
/// Destinations are pairwise distinct by construction (see `ClaimedNameSet`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationPlan {
    entries: Vec<PlanEntry>,
}

impl RelocationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PlanEntry) {
        debug_assert!(
            self.entries.iter().all(|e| e.destination != entry.destination),
            "duplicate destination in plan: {}",
            entry.destination.display()
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn renamed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.renamed).count()
    }
}

/// Counts from a plan that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub moved: usize,
    pub renamed: usize,
    pub copied: usize,
    pub directories: usize,
}

/// Apply `plan` in order.
///
/// Destination directories are created lazily, once each. The first failure stops
/// the run: nothing already moved is rolled back, and the error is
/// `TidyError::Halted` carrying how many entries completed. Re-running is the
/// recovery path, because moved files are gone from their sources and the planner
/// never reuses an occupied destination.
pub fn execute_plan(
    plan: &RelocationPlan,
    relocator: &Relocator,
    mut on: impl FnMut(Progress<'_>),
) -> Result<ExecutionReport> {
    on(Progress::Stage(RunStage::Executing));
    let total = plan.len();
    let mut report = ExecutionReport::default();
    let mut ready_dirs: HashSet<PathBuf> = HashSet::new();

    for entry in plan.entries() {
        let halt = |cause: TidyError, completed: usize| {
            error!(
                src = %entry.source.display(),
                dest = %entry.destination.display(),
                completed,
                total,
                kind = cause.kind(),
                "relocation failed; stopping"
            );
            TidyError::Halted {
                completed,
                total,
                src: entry.source.clone(),
                dest: entry.destination.clone(),
                cause: Box::new(cause),
            }
        };

        if shutdown::is_requested() {
            return Err(halt(TidyError::Interrupted, report.moved));
        }

        if let Some(parent) = entry.destination.parent()
            && !ready_dirs.contains(parent)
        {
            let created = ensure_dir(parent).map_err(|e| halt(e, report.moved))?;
            ready_dirs.insert(parent.to_path_buf());
            report.directories += 1;
            on(Progress::DirReady { path: parent, created });
        }

        let method = relocator
            .relocate(&entry.source, &entry.destination)
            .map_err(|e| halt(e, report.moved))?;

        report.moved += 1;
        if entry.renamed {
            report.renamed += 1;
        }
        if matches!(method, RelocationMethod::Copied { .. }) {
            report.copied += 1;
        }
        on(Progress::Relocated { entry, method: &method });
    }

    info!(moved = report.moved, renamed = report.renamed, copied = report.copied, "plan complete");
    on(Progress::Stage(RunStage::Completed));
    Ok(report)
}

/// Create `dir` if needed; returns true if it did not exist before.
fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;
    debug!(dir = %dir.display(), "created destination directory");
    Ok(true)
}
