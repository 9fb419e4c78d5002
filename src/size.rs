//! Human-readable byte sizes: `8GB`, `500mb`, `1.5 TB`, `100`.
//! Units are binary multiples of 1024; a missing unit means bytes.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{Result, TidyError};

pub const DEFAULT_SPLIT_SIZE: &str = "8GB";

const UNITS: [(&str, u64); 5] = [
    ("B", 1),
    ("KB", 1 << 10),
    ("MB", 1 << 20),
    ("GB", 1 << 30),
    ("TB", 1 << 40),
];

fn size_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+)(?:\.(\d+))?\s*(B|KB|MB|GB|TB)?$").expect("size regex is valid")
    })
}

/// Parse a size string into bytes.
pub fn parse_size(input: &str) -> Result<u64> {
    let invalid = |reason: &str| TidyError::Parse {
        what: "size",
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let caps = size_pattern()
        .captures(input.trim())
        .ok_or_else(|| invalid("expected a number and optional unit, e.g. 8GB, 500MB, 1TB"))?;

    let unit = caps
        .get(3)
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| "B".to_string());
    let multiplier = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, m)| *m)
        .ok_or_else(|| invalid("unknown unit"))?;

    let whole: u64 = caps[1].parse().map_err(|_| invalid("number too large"))?;
    let whole_bytes = whole
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("number too large"))?;

    let frac_bytes = match caps.get(2) {
        Some(frac) => {
            let digits = frac.as_str();
            let value: f64 = format!("0.{digits}").parse().map_err(|_| invalid("bad fraction"))?;
            (value * multiplier as f64) as u64
        }
        None => 0,
    };

    whole_bytes
        .checked_add(frac_bytes)
        .ok_or_else(|| invalid("number too large"))
}

/// Render bytes with two decimals in the largest fitting unit, e.g. `8.00 GB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit].0)
}
