//! End-to-end workflows built on the relocation engine.
//!
//! Every workflow plans completely before it mutates anything, reports progress
//! through a caller-supplied callback, and stops at the first failed relocation.
//!
//! Stages: `Validating -> Enumerating -> Planning -> (DryRunReport | Executing) -> Completed`.
//! Overlap validation runs first in both modes, so a rejected run has no side effects.
//! An error at any point ends the run; nothing is rolled back.

pub mod consolidate;
pub mod delete_moved;
pub mod plan;
pub mod prune;
pub mod split;

use std::fmt;
use std::path::Path;

use crate::errors::TidyError;
use crate::fs_ops::{FileItem, RelocationMethod};
use crate::packing::Bin;

pub use consolidate::{ConsolidateOptions, consolidate, plan_consolidation};
pub use delete_moved::{DeleteMovedReport, delete_moved};
pub use plan::{ExecutionReport, PlanEntry, RelocationPlan, execute_plan};
pub use prune::{PruneReport, prune_empty_dirs};
pub use split::{SplitOptions, split};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Validating,
    Enumerating,
    Planning,
    DryRunReport,
    Executing,
    Completed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::Validating => "validating",
            RunStage::Enumerating => "enumerating",
            RunStage::Planning => "planning",
            RunStage::DryRunReport => "dry_run_report",
            RunStage::Executing => "executing",
            RunStage::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Events a workflow reports while it runs. The CLI turns them into output lines;
/// tests collect them.
#[derive(Debug)]
pub enum Progress<'a> {
    Stage(RunStage),
    /// A source directory could not be listed and was left out of the plan.
    SourceSkipped { path: &'a Path, error: &'a TidyError },
    /// Split found numbered directories from an earlier run.
    Resuming { highest: u64 },
    /// An item larger than the split capacity gets a directory of its own.
    Oversize { item: &'a FileItem, capacity: u64 },
    /// Split planned bin `index`; `reused` marks a prior run's directory being topped up.
    BinPlanned { index: u64, bin: &'a Bin, reused: bool },
    /// A plan entry, reported during dry-run.
    Planned(&'a PlanEntry),
    /// A destination directory is about to receive its first file this run.
    DirReady { path: &'a Path, created: bool },
    Relocated { entry: &'a PlanEntry, method: &'a RelocationMethod },
    /// prune-empty / delete-moved: `path` was (or would be) removed.
    Removed { path: &'a Path, dry_run: bool },
    /// prune-empty: an entry could not be inspected or removed; the run continues.
    RemoveFailed { path: &'a Path, error: &'a TidyError },
}

/// What a consolidate or split run did (or would do, in dry-run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dry_run: bool,
    pub files: usize,
    pub renamed: usize,
    pub copied: usize,
    pub directories: usize,
}

impl RunSummary {
    pub fn nothing_to_do(&self) -> bool {
        self.files == 0
    }
}
