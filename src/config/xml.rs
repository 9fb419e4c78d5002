//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - A missing file means defaults; a file that exists but does not parse is a hard error.
//!
//! Example:
//! ```xml
//! <config>
//!   <log_level>info</log_level>
//!   <log_file>/var/log/media_tidy.log</log_file>
//!   <split_size>4GB</split_size>
//!   <verify_checksum>true</verify_checksum>
//! </config>
//! ```

use anyhow::{Context, Result, anyhow};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::config_path;
use super::types::{Config, LogLevel};
use crate::size::parse_size;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "split_size")]
    split_size: Option<String>,
    #[serde(rename = "verify_checksum", default, deserialize_with = "de_bool_trimmed_opt")]
    verify_checksum: Option<bool>,
}

// Accept surrounding whitespace around true/false.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!("expected true or false, got '{other}'"))),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config, validating values.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.split_size.as_deref()) {
        cfg.split_size = parse_size(s)?;
    }
    if let Some(v) = parsed.verify_checksum {
        cfg.verify_checksum = v;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in config xml '{}'", path.display()))
}

/// Load the active config file (see [`config_path`]). A missing file yields defaults.
pub fn load_config() -> Result<Config> {
    let Some(path) = config_path() else {
        debug!("no config location available; using defaults");
        return Ok(Config::default());
    };
    match fs::metadata(&path) {
        Ok(_) => {
            debug!(path = %path.display(), "loading config");
            load_config_from_xml_path(&path)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found; using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("stat config xml '{}'", path.display())),
    }
}
