use crate::config::{DirFilter, SyncConfig, ToolConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const RMAPI_ENV: &str = "RMAPI_BIN";
pub const RMC_ENV: &str = "RMC_BIN";
pub const TIMEOUT_ENV: &str = "RMCLOUD2PDF_TIMEOUT_SECS";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StaticConfig {
    work_dir: Option<PathBuf>,
    keep_archives: Option<bool>,
    ignore_dirs: Vec<String>,
    sync_dirs: Vec<String>,
    tools: ToolsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ToolsSection {
    rmapi: Option<PathBuf>,
    rmc: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

/// Values given on the command line. They always win over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub ignore_dirs: Vec<String>,
    pub sync_dirs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub sync: SyncConfig,
    pub tools: ToolConfig,
}

/// Builds the run configuration from an optional YAML file, the environment
/// (`RMAPI_BIN`, `RMC_BIN`, `RMCLOUD2PDF_TIMEOUT_SECS`) and the CLI.
///
/// Tool settings: environment over file over defaults. Filters from the CLI
/// are appended to those in the file.
pub fn load_config(path: Option<&Path>, cli: CliOverrides) -> Result<LoadedConfig> {
    let file_conf = match path {
        Some(path) => read_static_config(path)?,
        None => StaticConfig::default(),
    };

    let defaults = ToolConfig::default();
    let timeout_secs = match std::env::var(TIMEOUT_ENV) {
        Ok(var) => Some(var.parse::<u64>().map_err(|e| {
            error!(error = ?e, var = ?var, "{TIMEOUT_ENV} must be a whole number of seconds");
            anyhow::anyhow!("{TIMEOUT_ENV} must be a whole number of seconds: {e}")
        })?),
        Err(_) => file_conf.tools.timeout_secs,
    };
    let tools = ToolConfig {
        rmapi: env_path(RMAPI_ENV)
            .or(file_conf.tools.rmapi)
            .unwrap_or(defaults.rmapi),
        rmc: env_path(RMC_ENV)
            .or(file_conf.tools.rmc)
            .unwrap_or(defaults.rmc),
        timeout: timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    };
    if tools.timeout.is_zero() {
        anyhow::bail!("tool timeout must be greater than zero");
    }

    let mut filter = DirFilter {
        ignore_dirs: file_conf.ignore_dirs,
        sync_dirs: file_conf.sync_dirs,
    };
    filter.ignore_dirs.extend(cli.ignore_dirs);
    filter.sync_dirs.extend(cli.sync_dirs);

    let mut sync = SyncConfig::new(cli.output_dir.unwrap_or_else(|| PathBuf::from(".")));
    if let Some(work_dir) = file_conf.work_dir {
        sync.work_dir = work_dir;
    }
    if let Some(keep) = file_conf.keep_archives {
        sync.keep_archives = keep;
    }
    sync.filter = filter;

    info!(
        output_dir = %sync.output_dir.display(),
        rmapi = %tools.rmapi.display(),
        "Config loaded and merged successfully"
    );
    Ok(LoadedConfig { sync, tools })
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    // An empty file is a valid, empty config.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
