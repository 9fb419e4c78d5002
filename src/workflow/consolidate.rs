//! Consolidate: flatten-and-merge one or more source trees into a single target.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::plan::{PlanEntry, RelocationPlan, execute_plan};
use super::{Progress, RunStage, RunSummary};
use crate::errors::{Result, TidyError};
use crate::fs_ops::{ClaimedNameSet, Relocator, collect_tree};
use crate::safety::{check_path_overlap, resolve_real};

#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    pub target: PathBuf,
    pub sources: Vec<PathBuf>,
    pub dry_run: bool,
    pub relocator: Relocator,
}

/// Validate, enumerate and plan without touching the filesystem.
///
/// Sources whose root cannot be listed are reported through `SourceSkipped`
/// and left out; the remaining sources are still planned. A file reached through
/// more than one source (repeated or nested sources) is planned once.
pub fn plan_consolidation(
    opts: &ConsolidateOptions,
    on: &mut impl FnMut(Progress<'_>),
) -> Result<RelocationPlan> {
    on(Progress::Stage(RunStage::Validating));
    check_path_overlap(&opts.target, &opts.sources)?;

    on(Progress::Stage(RunStage::Enumerating));
    let mut claimed = ClaimedNameSet::seeded_from(&opts.target).map_err(|cause| TidyError::Access {
        path: opts.target.clone(),
        cause,
    })?;

    let mut files = Vec::new();
    let mut seen = HashSet::new();
    for src in &opts.sources {
        match collect_tree(src) {
            Ok(found) => {
                for item in found {
                    let key = resolve_real(&item.source_path)?;
                    if seen.insert(key) {
                        files.push(item);
                    } else {
                        debug!(file = %item.source_path.display(), "already listed through another source");
                    }
                }
            }
            Err(e @ TidyError::Access { .. }) => {
                warn!(source = %src.display(), error = %e, "skipping unreadable source");
                on(Progress::SourceSkipped { path: src, error: &e });
            }
            Err(e) => return Err(e),
        }
    }

    on(Progress::Stage(RunStage::Planning));
    let mut plan = RelocationPlan::new();
    for item in files {
        let resolved = claimed.resolve(&opts.target, &item.name);
        plan.push(PlanEntry {
            source: item.source_path,
            destination: resolved.path,
            renamed: resolved.renamed,
        });
    }
    info!(
        target = %opts.target.display(),
        files = plan.len(),
        renamed = plan.renamed_count(),
        "consolidation planned"
    );
    Ok(plan)
}

/// Run a consolidation (or report it, in dry-run).
pub fn consolidate(opts: &ConsolidateOptions, mut on: impl FnMut(Progress<'_>)) -> Result<RunSummary> {
    let plan = plan_consolidation(opts, &mut on)?;

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
            directories: usize::from(!plan.is_empty()),
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
