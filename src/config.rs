// rmcloud2pdf/src/config.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::listing::{EntryKind, ListingEntry, RemotePath};

pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Resolved settings for one synchronisation run. Read-only once built.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub output_dir: PathBuf,
    /// Parent of the scoped fetch and extraction directories.
    pub work_dir: PathBuf,
    pub filter: DirFilter,
    /// Leave the downloaded `.rmdoc` next to the produced PDF.
    pub keep_archives: bool,
}

impl SyncConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            work_dir: std::env::temp_dir(),
            filter: DirFilter::default(),
            keep_archives: true,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            work_dir = %self.work_dir.display(),
            ignore_dirs = ?self.filter.ignore_dirs,
            sync_dirs = ?self.filter.sync_dirs,
            keep_archives = self.keep_archives,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// Locations of the external tools and how long each call may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub rmapi: PathBuf,
    pub rmc: PathBuf,
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            rmapi: PathBuf::from("rmapi"),
            rmc: PathBuf::from("rmc"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ToolConfig {
    pub fn trace_loaded(&self) {
        info!(
            rmapi = %self.rmapi.display(),
            rmc = %self.rmc.display(),
            timeout_secs = self.timeout.as_secs(),
            "Loaded ToolConfig"
        );
    }
}

/// Directory name filters. A value matches when it equals one path segment exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirFilter {
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    #[serde(default)]
    pub sync_dirs: Vec<String>,
}

impl DirFilter {
    pub fn allows_directory(&self, path: &RemotePath) -> bool {
        self.allows_segments(&path.segments().collect::<Vec<_>>())
    }

    /// Files are judged by the directory that holds them.
    pub fn allows_file(&self, path: &RemotePath) -> bool {
        self.allows_segments(&path.parent_segments())
    }

    pub fn allows(&self, entry: &ListingEntry) -> bool {
        match entry.kind {
            EntryKind::Directory => self.allows_directory(&entry.path),
            EntryKind::File => self.allows_file(&entry.path),
        }
    }

    fn allows_segments(&self, segments: &[&str]) -> bool {
        let matches = |names: &[String]| segments.iter().any(|s| names.iter().any(|n| n == s));
        if matches(&self.ignore_dirs) {
            return false;
        }
        self.sync_dirs.is_empty() || matches(&self.sync_dirs)
    }
}
