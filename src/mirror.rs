//! Recreating the remote folder structure under the output root.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::listing::RemotePath;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("cannot create output root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
pub struct MirrorReport {
    pub created: Vec<PathBuf>,
    pub failed: Vec<(RemotePath, String)>,
}

/// Ensures `<root>/<dir>` exists for every directory. Only a failure to create
/// `root` itself is an error; individual directories that fail are recorded
/// and skipped.
pub fn mirror_tree<'a, I>(root: &Path, directories: I) -> Result<MirrorReport, MirrorError>
where
    I: IntoIterator<Item = &'a RemotePath>,
{
    fs::create_dir_all(root).map_err(|e| {
        error!(error = ?e, path = %root.display(), "Failed to create output root");
        MirrorError::Root {
            path: root.to_path_buf(),
            source: e,
        }
    })?;
    info!(root = %root.display(), "Mirroring remote directories");

    let mut report = MirrorReport::default();
    for dir in directories {
        let local = dir.local_path(root);
        match fs::create_dir_all(&local) {
            Ok(()) => {
                debug!(remote = %dir, path = %local.display(), "Directory created or already exists");
                report.created.push(local);
            }
            Err(e) => {
                error!(error = ?e, remote = %dir, path = %local.display(), "Failed to create directory");
                report.failed.push((dir.clone(), e.to_string()));
            }
        }
    }
    info!(
        created = report.created.len(),
        failed = report.failed.len(),
        "Directory mirroring finished"
    );
    Ok(report)
}
