//! Application orchestrator.
//! Loads/merges config, initializes logging, installs signal handlers, and runs
//! the selected subcommand, turning workflow progress into user-facing lines.

use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use media_tidy::cli::{Args, Command, ConsolidateArgs, DeleteMovedArgs, PruneEmptyArgs, SplitArgs};
use media_tidy::config::{CONFIG_ENV, config_path, load_config};
use media_tidy::output as out;
use media_tidy::workflow::{self, ConsolidateOptions, SplitOptions};
use media_tidy::{Config, Progress, RelocationMethod, Relocator, RunSummary, TidyError, format_size, shutdown};

use crate::logging::init_tracing;

/// Exit status for a failed run: 130 when the user interrupted, 1 otherwise.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TidyError>() {
        Some(e) if e.code() == TidyError::Interrupted.code() => 130,
        _ => 1,
    }
}

/// Run the CLI application. Errors are reported to the user before returning.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    let mut cfg = load_config().inspect_err(|e| out::print_error(&format!("{e:#}")))?;
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json)
        .inspect_err(|e| out::print_error(&format!("Failed to initialize logging: {e}")))?;

    // Guard is dropped on SIGINT to flush logs.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; finishing the current file, then stopping...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        }) {
            out::print_warn(&format!("Could not install interrupt handler: {e}"));
        }
    }

    debug!(?args, config = ?cfg, "starting media_tidy");

    let result = match &args.command {
        Some(Command::Consolidate(c)) => run_consolidate(c, &cfg),
        Some(Command::Split(s)) => run_split(s, &cfg),
        Some(Command::PruneEmpty(p)) => run_prune(p),
        Some(Command::DeleteMoved(d)) => run_delete_moved(d),
        None => Err(anyhow!("a subcommand is required (see --help)")),
    };

    if let Err(e) = &result {
        report_failure(e);
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {}", Path::new(&explicit).display()));
        return;
    }
    match config_path() {
        Some(p) => {
            out::print_info(&format!("Default media_tidy config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults are used.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

fn relocator(cfg: &Config, force_copy: bool) -> Relocator {
    Relocator {
        verify_checksum: cfg.verify_checksum,
        force_copy,
    }
}

fn run_consolidate(c: &ConsolidateArgs, cfg: &Config) -> Result<()> {
    let opts = ConsolidateOptions {
        target: c.target.clone(),
        sources: c.sources.clone(),
        dry_run: c.dry_run,
        relocator: relocator(cfg, c.force_copy),
    };
    if c.dry_run {
        out::print_user("DRY RUN - no files will be moved\n");
    } else if cfg.verify_checksum {
        out::print_user("Checksum verification enabled (SHA256)");
    }
    let reporter = Reporter::new(Mode::Consolidate, c.dry_run);
    let summary = workflow::consolidate(&opts, |p| reporter.handle(p))?;
    print_move_summary(Mode::Consolidate, &summary);
    Ok(())
}

fn run_split(s: &SplitArgs, cfg: &Config) -> Result<()> {
    let opts = SplitOptions {
        root: s.dir.clone(),
        capacity: cfg.split_size,
        dry_run: s.dry_run,
        fill_existing: s.fill_existing,
        relocator: relocator(cfg, s.force_copy),
    };
    if s.dry_run {
        out::print_user("DRY RUN - no files will be moved\n");
    }
    let reporter = Reporter::new(Mode::Split { capacity: cfg.split_size }, s.dry_run);
    let summary = workflow::split(&opts, |p| reporter.handle(p))?;
    print_move_summary(Mode::Split { capacity: cfg.split_size }, &summary);
    Ok(())
}

fn run_prune(p: &PruneEmptyArgs) -> Result<()> {
    if p.dry_run {
        out::print_user("DRY RUN - no directories will be deleted\n");
    }
    let reporter = Reporter::new(Mode::Prune, p.dry_run);
    let report = workflow::prune_empty_dirs(&p.root, p.dry_run, |e| reporter.handle(e))?;
    let count = report.removed.len();
    let noun = if count == 1 { "directory" } else { "directories" };
    let action = if p.dry_run { "would be deleted" } else { "deleted" };
    out::print_user(&format!("\n{count} empty {noun} {action}"));
    if report.failed > 0 {
        out::print_warn(&format!("{} director{} could not be checked or removed", report.failed, if report.failed == 1 { "y" } else { "ies" }));
    }
    Ok(())
}

fn run_delete_moved(d: &DeleteMovedArgs) -> Result<()> {
    if d.dry_run {
        out::print_user("DRY RUN - no files will be deleted\n");
    }
    let reporter = Reporter::new(Mode::DeleteMoved, d.dry_run);
    let report = workflow::delete_moved(&d.from_dir, &d.to_dir, d.dry_run, |e| reporter.handle(e))?;
    let action = if d.dry_run { "would be deleted" } else { "deleted" };
    out::print_user(&format!("\n{} file(s) {action}, {} kept because they differ", report.deleted.len(), report.skipped));
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Consolidate,
    Split { capacity: u64 },
    Prune,
    DeleteMoved,
}

/// Turns workflow progress events into the per-file lines users script against.
struct Reporter {
    mode: Mode,
    dry_run: bool,
}

impl Reporter {
    fn new(mode: Mode, dry_run: bool) -> Self {
        Self { mode, dry_run }
    }

    fn handle(&self, p: Progress<'_>) {
        match p {
            Progress::Stage(stage) => debug!(%stage, "stage"),
            Progress::SourceSkipped { path, error } => {
                out::print_user(&format!("Skipping {}: not found or not accessible", path.display()));
                debug!(error = %error, "source skipped");
            }
            Progress::Resuming { highest } => match highest.checked_add(1) {
                Some(next) => out::print_user(&format!(
                    "Found existing numbered directories up to {highest}/, starting from {next}/\n"
                )),
                None => out::print_user(&format!("Found existing numbered directories up to {highest}/\n")),
            },
            Progress::Oversize { item, capacity } => out::print_user(&format!(
                "Warning: {} exceeds {} ({}), placing in its own directory",
                item.name.to_string_lossy(),
                format_size(capacity),
                format_size(item.size)
            )),
            Progress::BinPlanned { index, bin, reused } => {
                debug!(index, files = bin.items.len(), reused, "bin");
                // A real run announces each directory on DirReady instead.
                if self.dry_run {
                    let added: u64 = bin.items.iter().map(|i| i.size).sum();
                    let note = if reused { ", topping up" } else { "" };
                    out::print_user(&format!(
                        "Directory {index}: {} files ({}{note})",
                        bin.items.len(),
                        format_size(added)
                    ));
                    for item in &bin.items {
                        out::print_user(&format!("  {}", item.name.to_string_lossy()));
                    }
                }
            }
            Progress::Planned(entry) => {
                if let Mode::Consolidate = self.mode {
                    out::print_user(&format!(
                        "Would move: {} -> {}{}",
                        entry.source.display(),
                        entry.destination.display(),
                        renamed_suffix(entry.renamed)
                    ));
                }
            }
            Progress::DirReady { path, .. } => {
                if let Mode::Split { .. } = self.mode {
                    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                    out::print_user(&format!("\nDirectory {name}:"));
                }
            }
            Progress::Relocated { entry, method } => {
                let indent = if let Mode::Split { .. } = self.mode { "  " } else { "" };
                out::print_user(&format!(
                    "{indent}Moved: {} -> {}{}",
                    entry.source.display(),
                    entry.destination.display(),
                    renamed_suffix(entry.renamed)
                ));
                if let RelocationMethod::Copied { sha256: Some(hex), .. } = method {
                    out::print_user(&format!("{indent}  [verified] SHA256: {hex}"));
                }
            }
            Progress::Removed { path, dry_run } => {
                let shown = match self.mode {
                    Mode::Prune => path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                    _ => path.display().to_string(),
                };
                let verb = if dry_run { "Would delete" } else { "Deleted" };
                out::print_user(&format!("{verb}: {shown}"));
            }
            Progress::RemoveFailed { path, error } => {
                out::print_user_err(&format!("Error deleting {}: {error}", path.display()));
            }
        }
    }
}

fn renamed_suffix(renamed: bool) -> &'static str {
    if renamed { " (renamed)" } else { "" }
}

fn print_move_summary(mode: Mode, summary: &RunSummary) {
    if summary.nothing_to_do() {
        out::print_user("No files found to move.");
        return;
    }
    let plural = if summary.files == 1 { "" } else { "s" };
    match (mode, summary.dry_run) {
        (Mode::Split { capacity }, true) => out::print_user(&format!(
            "\n{} file{plural} would be moved into {} directories (max {} each)",
            summary.files,
            summary.directories,
            format_size(capacity)
        )),
        (Mode::Split { .. }, false) => out::print_user(&format!(
            "\nDone! {} file{plural} moved into {} directories.",
            summary.files, summary.directories
        )),
        (_, true) => out::print_user(&format!(
            "\n{} file{plural} would be moved ({} renamed to avoid duplicates)",
            summary.files, summary.renamed
        )),
        (_, false) => out::print_user(&format!(
            "\n{} file{plural} moved ({} renamed to avoid duplicates)",
            summary.files, summary.renamed
        )),
    }
    if summary.copied > 0 {
        debug!(copied = summary.copied, "files copied across filesystems");
    }
}

/// Log the failure with stable code/kind fields and print the user-facing explanation.
fn report_failure(err: &anyhow::Error) {
    let Some(tidy) = err.downcast_ref::<TidyError>() else {
        error!(error = ?err, "run failed");
        out::print_error(&format!("{err:#}"));
        return;
    };

    let code = tidy.code();
    match tidy {
        TidyError::Halted { completed, total, src, dest, cause } => {
            error!(code, kind = cause.kind(), completed, total, src = %src.display(), dest = %dest.display(), "run stopped");
            if matches!(**cause, TidyError::Interrupted) {
                out::print_user_err("\nInterrupted.");
            } else {
                out::print_user_err(&format!("\nFAILED: {} -> {}", src.display(), dest.display()));
                out::print_user_err(&format!("Error: {cause}"));
            }
            out::print_user_err(&format!("\nStopping. {completed}/{total} files moved successfully."));
            out::print_user_err("Re-run to continue with remaining files.");
        }
        TidyError::Overlap { target, source_dir, relation } => {
            error!(code, kind = tidy.kind(), target = %target.display(), source = %source_dir.display(), %relation, "refusing to run");
            out::print_error(&tidy.to_string());
        }
        TidyError::Access { path, cause } => {
            error!(code, kind = tidy.kind(), path = %path.display(), error = %cause, "cannot access path");
            out::print_error(&tidy.to_string());
        }
        other => {
            error!(code, kind = other.kind(), error = %other, "run failed");
            out::print_error(&other.to_string());
        }
    }
}
