//! CLI definition and parsing.
//! Defines Args and the subcommands, and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug and wins over it.
//! - CLI flags override config values (which are loaded from XML if present).

use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::size::parse_size;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Consolidate, split and prune media directories without losing files",
    arg_required_else_help = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, value_name = "LEVEL", help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file as well as stderr.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Print where media_tidy will look for the config file, then exit.
    #[arg(long, help = "Print the config file location used by media_tidy and exit")]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Recursively move every file from SOURCE trees into TARGET (flat), renaming collisions.
    Consolidate(ConsolidateArgs),
    /// Move the files directly inside DIR into numbered subdirectories of bounded size.
    Split(SplitArgs),
    /// Remove empty immediate subdirectories of a root.
    PruneEmpty(PruneEmptyArgs),
    /// Delete files in --from-dir that already exist unchanged in --to-dir.
    DeleteMoved(DeleteMovedArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ConsolidateArgs {
    /// Directory that receives every file.
    #[arg(value_hint = ValueHint::DirPath)]
    pub target: PathBuf,

    /// Source directories to empty into TARGET.
    #[arg(required = true, value_hint = ValueHint::DirPath)]
    pub sources: Vec<PathBuf>,

    #[arg(short = 'n', long, help = "Show what would be moved, but do not modify anything")]
    pub dry_run: bool,

    #[arg(long, help = "Compare SHA-256 digests after cross-filesystem copies")]
    pub verify: bool,

    /// Always copy-then-delete, even on one filesystem.
    #[arg(long, hide = true)]
    pub force_copy: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SplitArgs {
    /// Directory whose top-level files are split.
    #[arg(value_hint = ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Maximum size per numbered directory, e.g. 8GB, 500MB, 1.5TB.
    #[arg(short = 's', long, value_name = "SIZE", value_parser = parse_split_size)]
    pub split_size: Option<u64>,

    #[arg(short = 'n', long, help = "Show the planned directories, but do not modify anything")]
    pub dry_run: bool,

    #[arg(long, help = "Compare SHA-256 digests after cross-filesystem copies")]
    pub verify: bool,

    #[arg(long, help = "Top up under-filled numbered directories from earlier runs first")]
    pub fill_existing: bool,

    #[arg(long, hide = true)]
    pub force_copy: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PruneEmptyArgs {
    /// Directory whose empty subdirectories are removed.
    #[arg(short = 'r', long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    #[arg(short = 'n', long, help = "List empty directories without removing them")]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DeleteMovedArgs {
    /// Directory the files were copied from; verified duplicates are deleted here.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub from_dir: PathBuf,

    /// Directory the files were copied to.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub to_dir: PathBuf,

    #[arg(short = 'n', long, help = "List files that would be deleted without deleting them")]
    pub dry_run: bool,
}

fn parse_split_size(s: &str) -> Result<u64, String> {
    match parse_size(s) {
        Ok(0) => Err("split size must be greater than zero".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(path) = &self.log_file {
            cfg.log_file = Some(path.clone());
        }
        match &self.command {
            Some(Command::Consolidate(c)) if c.verify => cfg.verify_checksum = true,
            Some(Command::Split(s)) => {
                if let Some(size) = s.split_size {
                    cfg.split_size = size;
                }
                if s.verify {
                    cfg.verify_checksum = true;
                }
            }
            _ => {}
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
