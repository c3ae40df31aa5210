use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/inscribe.toml";

/// Runtime configuration, loaded once at startup.
/// Every field has a built-in default so a missing file is never fatal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub list: ListConfig,
    pub install: InstallConfig,
    pub progress: ProgressConfig,
    pub ui: UiConfig,
}

/// Disk-listing command and the parsing protocol for its output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Substring marking the line that precedes each device's data line.
    /// Empty disables the two-line protocol and matches every line instead.
    pub marker: String,
    /// Regex with named groups `path`, `size`, `modelName`; the parted
    /// field groups `transportType`, `logicalSectorSize`,
    /// `physicalSectorSize` and `partitionTableType` are picked up when
    /// present.
    pub pattern: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            command: "parted".to_string(),
            args: vec!["-lm".to_string()],
            marker: "BYT".to_string(),
            pattern: r"(?<path>.*):(?<size>.*):.*:.*:.*:.*:(?<modelName>.*);".to_string(),
        }
    }
}

/// Install script invocation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub command: String,
    pub working_dir: String,
    /// Optional single token passed before the device path
    pub extra_arg: String,
    pub confirm_message: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            command: "./create_sdcard".to_string(),
            working_dir: ".".to_string(),
            extra_arg: String::new(),
            confirm_message: "All data on the selected disk will be erased. Continue?".to_string(),
        }
    }
}

/// Progress gauge bounds; one increment per relayed output line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub max: u64,
    pub increment: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { max: 100, increment: 1 }
    }
}

/// Labels consumed by the presentation layer only
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub placeholder: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Inscribe".to_string(),
            placeholder: "<select installation disk>".to_string(),
        }
    }
}

/// Load the configuration, falling back to the built-in defaults when the
/// file is missing or malformed. Never fails: startup must not depend on a
/// readable config file.
pub fn load(override_path: Option<&Path>) -> Config {
    let path = resolve_path(override_path);
    match std::fs::read_to_string(&path) {
        Ok(text) => match toml::from_str(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!(
                    "config file {} is malformed, using built-in defaults: {e}",
                    path.display()
                );
                Config::default()
            }
        },
        Err(e) => {
            log::warn!(
                "cannot read config file {} ({e}), using built-in defaults",
                path.display()
            );
            Config::default()
        }
    }
}

fn resolve_path(override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) => {
            eprintln!(
                "inscribe: config file {} not found, falling back to {}",
                p.display(),
                DEFAULT_CONFIG_PATH
            );
            PathBuf::from(DEFAULT_CONFIG_PATH)
        }
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}
