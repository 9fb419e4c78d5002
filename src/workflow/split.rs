//! Split: partition the files directly inside a directory into numbered,
//! size-bounded subdirectories (`1/`, `2/`, ...).
//!
//! Re-running is safe: moved files are no longer at the top level, and new bins
//! are numbered after the highest existing numbered directory. With
//! `fill_existing`, under-filled directories from earlier runs are topped up first.

use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use super::plan::{PlanEntry, RelocationPlan, execute_plan};
use super::{Progress, RunStage, RunSummary};
use crate::errors::{Result, TidyError};
use crate::fs_ops::{ClaimedNameSet, FileItem, Relocator, collect_flat};
use crate::packing::pack_with_seeds;
use crate::resume::{NumberedDir, ResumeCursor, numbered_dirs, occupancy};

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub root: PathBuf,
    /// Maximum bytes per numbered directory.
    pub capacity: u64,
    pub dry_run: bool,
    pub fill_existing: bool,
    pub relocator: Relocator,
}

pub fn split(opts: &SplitOptions, mut on: impl FnMut(Progress<'_>)) -> Result<RunSummary> {
    on(Progress::Stage(RunStage::Validating));
    if opts.capacity == 0 {
        return Err(TidyError::Parse {
            what: "split size",
            input: "0".into(),
            reason: "must be greater than zero".into(),
        });
    }
    let root = &opts.root;
    match root.metadata() {
        Ok(m) if m.is_dir() => {}
        Ok(_) => {
            return Err(TidyError::Access {
                path: root.clone(),
                cause: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Err(cause) => return Err(TidyError::Access { path: root.clone(), cause }),
    }

    on(Progress::Stage(RunStage::Enumerating));
    let cursor = ResumeCursor::scan(root)?;
    if cursor.highest > 0 {
        on(Progress::Resuming { highest: cursor.highest });
    }
    let files = collect_flat(root)?;

    on(Progress::Stage(RunStage::Planning));
    let existing: Vec<NumberedDir> = if opts.fill_existing {
        numbered_dirs(root)?
    } else {
        Vec::new()
    };
    let seeds = existing
        .iter()
        .map(|d| occupancy(&d.path))
        .collect::<Result<Vec<u64>>>()?;

    let mut oversize: Vec<FileItem> = Vec::new();
    let bins = pack_with_seeds(files, opts.capacity, &seeds, |item| oversize.push(item.clone()));
    for item in &oversize {
        on(Progress::Oversize { item, capacity: opts.capacity });
    }

    let new_indices = cursor.allocate(root, bins.len() - existing.len())?;
    let mut claimed = ClaimedNameSet::new();
    let mut plan = RelocationPlan::new();
    let mut directories = 0usize;

    for (pos, bin) in bins.iter().enumerate() {
        if bin.items.is_empty() {
            continue;
        }
        let (index, dir, reused) = match existing.get(pos) {
            Some(prior) => {
                claimed.seed_dir(&prior.path).map_err(|cause| TidyError::Access {
                    path: prior.path.clone(),
                    cause,
                })?;
                (prior.index, prior.path.clone(), true)
            }
            None => {
                let index = new_indices[pos - existing.len()];
                (index, root.join(index.to_string()), false)
            }
        };
        debug!(index, dir = %dir.display(), files = bin.items.len(), reused, "bin planned");
        on(Progress::BinPlanned { index, bin, reused });
        directories += 1;

        for item in &bin.items {
            let resolved = claimed.resolve(&dir, &item.name);
            plan.push(PlanEntry {
                source: item.source_path.clone(),
                destination: resolved.path,
                renamed: resolved.renamed,
            });
        }
    }
    info!(root = %root.display(), files = plan.len(), directories, "split planned");

    if opts.dry_run {
        on(Progress::Stage(RunStage::DryRunReport));
        for entry in plan.entries() {
            on(Progress::Planned(entry));
        }
        on(Progress::Stage(RunStage::Completed));
        return Ok(RunSummary {
            dry_run: true,
            files: plan.len(),
            renamed: plan.renamed_count(),
            copied: 0,
            directories,
        });
    }

    if plan.is_empty() {
        on(Progress::Stage(RunStage::Completed));
        return Ok(RunSummary::default());
    }

    let report = execute_plan(&plan, &opts.relocator, on)?;
    Ok(RunSummary {
        dry_run: false,
        files: report.moved,
        renamed: report.renamed,
        copied: report.copied,
        directories: report.directories,
    })
}
