//! Fetching one remote notebook into its mirrored location.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::command::CommandError;
use crate::config::SyncConfig;
use crate::contract::RemoteStore;
use crate::listing::RemotePath;
use crate::scoped::scoped;

pub const ARCHIVE_EXTENSION: &str = "rmdoc";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("remote path {0} has no file name")]
    NoFileName(RemotePath),

    #[error("fetch of {remote} failed: {source}")]
    Command {
        remote: RemotePath,
        #[source]
        source: CommandError,
    },

    #[error("fetch of {remote} did not produce {expected}")]
    MissingArtifact { remote: RemotePath, expected: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where the archive for `remote` ends up: `<output>/<remote>.rmdoc`.
pub fn archive_destination(remote: &RemotePath, output_dir: &Path) -> PathBuf {
    remote.local_path_with_extension(output_dir, ARCHIVE_EXTENSION)
}

/// Downloads `remote` inside a scoped working directory and moves the
/// resulting archive to its mirrored destination. The working directory is
/// removed whether or not the fetch succeeds.
pub async fn fetch_archive<R>(
    store: &R,
    remote: &RemotePath,
    config: &SyncConfig,
) -> Result<PathBuf, FetchError>
where
    R: RemoteStore + ?Sized,
{
    let file_name = remote
        .file_name()
        .ok_or_else(|| FetchError::NoFileName(remote.clone()))?
        .to_string();
    let destination = archive_destination(remote, &config.output_dir);

    scoped(&config.work_dir, "fetch-", |workdir| {
        fetch_into(store, remote, workdir, file_name, destination)
    })
    .await
}

async fn fetch_into<R>(
    store: &R,
    remote: &RemotePath,
    workdir: PathBuf,
    file_name: String,
    destination: PathBuf,
) -> Result<PathBuf, FetchError>
where
    R: RemoteStore + ?Sized,
{
    store.fetch(remote, &workdir).await.map_err(|e| {
        error!(remote = %remote, error = %e, "Download failed");
        FetchError::Command {
            remote: remote.clone(),
            source: e,
        }
    })?;

    let produced = workdir.join(format!("{}.{}", file_name, ARCHIVE_EXTENSION));
    if !produced.is_file() {
        error!(remote = %remote, expected = %produced.display(), "Downloaded archive not found");
        return Err(FetchError::MissingArtifact {
            remote: remote.clone(),
            expected: produced,
        });
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
        debug!(path = %parent.display(), "Ensured destination directory exists");
    }
    relocate(&produced, &destination)?;
    info!(remote = %remote, path = %destination.display(), "Archive downloaded");
    Ok(destination)
}

/// Moves `from` to `to`, replacing `to`. Falls back to copy and delete when a
/// plain rename is not possible (e.g. across filesystems).
pub fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = ?e, from = %from.display(), to = %to.display(), "Rename failed, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
