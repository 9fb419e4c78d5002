//! Typed error definitions for media_tidy.
//! Every failure the relocation engine can report maps to one variant, so the
//! binary can log a stable code/kind and decide whether the run can continue.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which unsafe relationship between target and source was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapKind {
    /// Target and source resolve to the same directory.
    Same,
    /// Target lives somewhere below the source.
    TargetInsideSource,
    /// Source lives somewhere below the target.
    SourceInsideTarget,
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverlapKind::Same => "is the same as",
            OverlapKind::TargetInsideSource => "is inside",
            OverlapKind::SourceInsideTarget => "contains",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum TidyError {
    #[error("invalid {what} {input:?}: {reason}")]
    Parse {
        what: &'static str,
        input: String,
        reason: String,
    },

    #[error("path overlap detected: target directory '{}' {relation} source directory '{}'", target.display(), source_dir.display())]
    Overlap {
        target: PathBuf,
        source_dir: PathBuf,
        relation: OverlapKind,
    },

    #[error("cannot access '{}': {cause}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },

    #[error("destination file already exists (no-clobber): {}", dest.display())]
    Clobber { dest: PathBuf },

    #[error("copy verification failed for '{}' -> '{}': {detail}", src.display(), dest.display())]
    Verification {
        src: PathBuf,
        dest: PathBuf,
        detail: String,
    },

    #[error("{message}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        cause: io::Error,
    },

    #[error("Operation interrupted by user")]
    Interrupted,

    #[error("stopped after {completed}/{total} files: '{}' -> '{}': {cause}", src.display(), dest.display())]
    Halted {
        completed: usize,
        total: usize,
        src: PathBuf,
        dest: PathBuf,
        #[source]
        cause: Box<TidyError>,
    },
}

impl TidyError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u8 {
        match self {
            TidyError::Parse { .. } => 2,
            TidyError::Overlap { .. } => 3,
            TidyError::Access { .. } => 4,
            TidyError::Clobber { .. } => 5,
            TidyError::Verification { .. } => 6,
            TidyError::Io { .. } => 7,
            TidyError::Interrupted => 130,
            TidyError::Halted { cause, .. } => cause.code(),
        }
    }

    /// Short snake_case name used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TidyError::Parse { .. } => "parse",
            TidyError::Overlap { .. } => "overlap",
            TidyError::Access { .. } => "access",
            TidyError::Clobber { .. } => "clobber",
            TidyError::Verification { .. } => "verification",
            TidyError::Io { .. } => "io",
            TidyError::Interrupted => "interrupted",
            TidyError::Halted { .. } => "halted",
        }
    }

    /// Errors raised before the filesystem is touched.
    pub fn is_preflight(&self) -> bool {
        matches!(self, TidyError::Parse { .. } | TidyError::Overlap { .. })
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;
