//! Configuration file loading and merging with command-line values.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clipfetch_core::artifact::DEFAULT_MIME_TYPE;
use clipfetch_core::transfer::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use serde::Deserialize;

use crate::cli::Args;

const MAX_TIMEOUT_SECS: u64 = 3600;
const MAX_DEADLINE_SECS: u64 = 86_400;

/// TOML-backed defaults for the command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Directory artifacts are saved to.
    pub(crate) output_dir: Option<PathBuf>,
    /// MIME type attached to artifacts.
    pub(crate) mime_type: Option<String>,
    /// Endpoint of the JSON describer.
    pub(crate) describe_endpoint: Option<String>,
    /// Transfer client connect timeout in seconds.
    pub(crate) connect_timeout_secs: Option<u64>,
    /// Transfer client read timeout in seconds.
    pub(crate) read_timeout_secs: Option<u64>,
    /// Cancel the transfer after this many seconds (0 disables).
    pub(crate) deadline_secs: Option<u64>,
}

impl FileConfig {
    /// Validates values against the same ranges the CLI enforces.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(deadline) = self.deadline_secs
            && deadline > MAX_DEADLINE_SECS
        {
            bail!(
                "Invalid config value for `deadline_secs`: {deadline}. Expected range: 0..={MAX_DEADLINE_SECS}"
            );
        }
        if let Some(mime) = &self.mime_type
            && !mime.contains('/')
        {
            bail!("Invalid config value for `mime_type`: {mime:?}. Expected type/subtype");
        }
        Ok(())
    }
}

fn validate_timeout_secs(key: &str, value: Option<u64>) -> Result<()> {
    if let Some(value) = value
        && !(1..=MAX_TIMEOUT_SECS).contains(&value)
    {
        bail!("Invalid config value for `{key}`: {value}. Expected range: 1..={MAX_TIMEOUT_SECS}");
    }
    Ok(())
}

/// Settings after merging command line, config file and built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) output_dir: PathBuf,
    pub(crate) mime_type: String,
    pub(crate) describe_endpoint: Option<String>,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
    pub(crate) deadline: Option<Duration>,
}

impl Settings {
    /// Explicit command-line values win over file values, which win over defaults.
    pub(crate) fn merge(args: &Args, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let deadline_secs = args.deadline.or(file.deadline_secs).unwrap_or(0);
        Self {
            output_dir: args
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            mime_type: args
                .mime_type
                .clone()
                .or(file.mime_type)
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            describe_endpoint: args
                .describe_endpoint
                .clone()
                .or(file.describe_endpoint)
                .filter(|endpoint| !endpoint.trim().is_empty()),
            connect_timeout_secs: args
                .connect_timeout
                .or(file.connect_timeout_secs)
                .unwrap_or(CONNECT_TIMEOUT_SECS),
            read_timeout_secs: args
                .read_timeout
                .or(file.read_timeout_secs)
                .unwrap_or(READ_TIMEOUT_SECS),
            deadline: (deadline_secs > 0).then(|| Duration::from_secs(deadline_secs)),
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/clipfetch/config.toml`
/// 2. `$HOME/.config/clipfetch/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("clipfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("clipfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub(crate) fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match resolve_default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    Ok(Some(config))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
