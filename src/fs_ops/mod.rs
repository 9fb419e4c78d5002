//! Filesystem operations: modularized.

mod atomic;
pub mod digest;
pub mod duplicate;
pub mod enumerate;
mod helpers;
mod io_copy;
pub mod relocate;
mod util;

pub use digest::sha256_file;
pub use duplicate::{ClaimedNameSet, ResolvedName};
pub use enumerate::{FileItem, collect_flat, collect_tree};
pub(crate) use helpers::io_error_with_help;
pub use relocate::{RelocationMethod, Relocator};
