//! Core library for `media_tidy`.
//!
//! A safe bulk file-relocation engine and the workflows built on it:
//! consolidate several trees into one directory, split a flat directory into
//! size-bounded numbered subdirectories, prune empty directories, and delete
//! source copies that were already moved.
//!
//! Relocation never overwrites a destination and never loses a source: same
//! filesystem moves are no-clobber renames, cross-filesystem moves are an
//! exclusive-create copy that is synced (and optionally SHA-256 verified) before
//! the source is removed.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod packing;
pub mod resume;
pub mod safety;
pub mod shutdown;
pub mod size;
pub mod workflow;

pub use config::{Config, LogLevel, default_config_path, path_has_symlink_ancestor};
pub use errors::{OverlapKind, Result, TidyError};
pub use fs_ops::{ClaimedNameSet, FileItem, RelocationMethod, Relocator};
pub use packing::{Bin, pack_first_fit_decreasing};
pub use safety::check_path_overlap;
pub use size::{format_size, parse_size};
pub use workflow::{Progress, RunStage, RunSummary};
