//! Destination-name collision resolution.
//!
//! Policy:
//! - Use the requested name when neither the disk nor the current plan holds it.
//! - Otherwise append `_N` before the last dot (`photo.jpg` -> `photo_1.jpg`, `photo_2.jpg`, ...;
//!   `.env` -> `_1.env`).
//! - Every returned path is claimed immediately, so two inputs with the same name
//!   never receive the same destination, in dry-run or execute mode.
//!
//! Notes:
//! - This only plans names. A different process creating the same path between plan
//!   and move is caught by the executor's no-clobber checks, not here.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A destination chosen by [`ClaimedNameSet::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub path: PathBuf,
    /// True when the requested name was taken and a suffix was added.
    pub renamed: bool,
}

/// Destination paths reserved by the current run.
#[derive(Debug, Default, Clone)]
pub struct ClaimedNameSet {
    claimed: HashSet<PathBuf>,
}

impl ClaimedNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every entry currently in `dir`. A missing directory yields an empty set.
    pub fn seeded_from(dir: &Path) -> io::Result<Self> {
        let mut set = Self::new();
        set.seed_dir(dir)?;
        Ok(set)
    }

    /// Add every entry currently in `dir` to the set.
    pub fn seed_dir(&mut self, dir: &Path) -> io::Result<()> {
        let rd = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        for ent in rd {
            self.claimed.insert(dir.join(ent?.file_name()));
        }
        Ok(())
    }

    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Pick and claim a destination for `name` inside `dir`.
    pub fn resolve(&mut self, dir: &Path, name: &OsStr) -> ResolvedName {
        let literal = dir.join(name);
        if self.is_free(&literal) {
            self.claimed.insert(literal.clone());
            return ResolvedName { path: literal, renamed: false };
        }

        let (stem, ext) = split_extension(name);

        let mut n: u64 = 1;
        loop {
            let candidate = dir.join(build_name_with_suffix(&stem, &ext, &format!("_{n}")));
            if self.is_free(&candidate) {
                self.claimed.insert(candidate.clone());
                return ResolvedName { path: candidate, renamed: true };
            }
            if n == 3 {
                trace!(name = ?name, dir = %dir.display(), "duplicate: multiple collisions, still searching");
            }
            n += 1;
        }
    }

    fn is_free(&self, candidate: &Path) -> bool {
        !self.claimed.contains(candidate) && fs::symlink_metadata(candidate).is_err()
    }
}

// Conservative filename limits (bytes/characters, platform-specific and approximate).
#[cfg(windows)]
const MAX_FILENAME_LEN: usize = 240;
#[cfg(not(windows))]
const MAX_FILENAME_LEN: usize = 255;

#[cfg(unix)]
fn name_len_units(s: &OsStr) -> usize {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().len()
}

#[cfg(not(unix))]
fn name_len_units(s: &OsStr) -> usize {
    s.to_string_lossy().len()
}

/// Split `name` at its last dot; the extension keeps the dot and may be empty.
/// A leading dot counts too, so `.env` has an empty stem.
fn split_extension(name: &OsStr) -> (OsString, OsString) {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};
        let bytes = name.as_bytes();
        match bytes.iter().rposition(|&b| b == b'.') {
            Some(dot) => (
                OsString::from_vec(bytes[..dot].to_vec()),
                OsString::from_vec(bytes[dot..].to_vec()),
            ),
            None => (name.to_os_string(), OsString::new()),
        }
    }
    #[cfg(not(unix))]
    {
        let lossy = name.to_string_lossy();
        match lossy.rfind('.') {
            Some(dot) => (OsString::from(&lossy[..dot]), OsString::from(&lossy[dot..])),
            None => (name.to_os_string(), OsString::new()),
        }
    }
}

/// Join `stem + suffix + ext`, shortening the stem if the result would
/// exceed the filename limit.
fn build_name_with_suffix(stem: &OsStr, ext: &OsStr, suffix: &str) -> OsString {
    let overhead = suffix.len() + name_len_units(ext);

    let mut stem_os = stem.to_os_string();
    if name_len_units(&stem_os) + overhead > MAX_FILENAME_LEN {
        let budget = MAX_FILENAME_LEN.saturating_sub(overhead).max(1);
        stem_os = truncate_stem(stem, budget);
    }

    let mut new_name = stem_os;
    new_name.push(suffix);
    new_name.push(ext);
    new_name
}

fn truncate_stem(stem: &OsStr, budget: usize) -> OsString {
    if let Some(s) = stem.to_str() {
        let mut acc = String::new();
        for ch in s.chars() {
            if acc.len() + ch.len_utf8() > budget {
                break;
            }
            acc.push(ch);
        }
        if acc.is_empty() {
            acc.push('f');
        }
        return OsString::from(acc);
    }
    #[cfg(unix)]
    {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};
        let bytes = stem.as_bytes();
        OsString::from_vec(bytes[..bytes.len().min(budget)].to_vec())
    }
    #[cfg(not(unix))]
    {
        let lossy = stem.to_string_lossy();
        truncate_stem(OsStr::new(lossy.as_ref()), budget)
    }
}
