//! High-level pipeline: listing → mirror → (fetch → convert) per file.
//!
//! # Responsibilities
//! - Retrieves and parses the remote listing, applies the directory filters
//!   and drops paths that would escape the output root.
//! - Mirrors every remote directory before the first download starts.
//! - Processes files strictly one after another. A failure while fetching or
//!   converting one file is logged and recorded, and the loop moves on.
//!
//! # Error Handling
//! Only two conditions end a run early: the listing cannot be retrieved (or
//! comes back empty), or the output root cannot be created. Everything else ends up in the
//! [`SynchroniseReport`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::command::CommandError;
use crate::config::SyncConfig;
use crate::contract::{DocumentMerger, PageConverter, RemoteStore};
use crate::download::{fetch_archive, FetchError};
use crate::listing::{parse_listing, Listing, RemotePath};
use crate::mirror::{mirror_tree, MirrorError};
use crate::preprocess::{process_archive, ArchiveOutcome, ProcessError};
use crate::scoped::scoped;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot retrieve remote listing: {0}")]
    Listing(#[source] CommandError),

    #[error("remote listing is empty")]
    EmptyListing,

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

/// Why a file produced no document.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("conversion failed: {0}")]
    Process(#[from] ProcessError),

    #[error("cannot prepare working directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct FileReport {
    pub remote: RemotePath,
    pub result: Result<ArchiveOutcome, FileError>,
}

/// Summary of one synchronisation run.
#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub directories_mirrored: usize,
    pub directory_failures: Vec<(RemotePath, String)>,
    /// Entries dropped by the filters or as unsafe, in listing order.
    pub excluded: Vec<RemotePath>,
    pub files: Vec<FileReport>,
}

impl SynchroniseReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.result.is_err())
    }
}

impl fmt::Display for SynchroniseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Directories mirrored: {} ({} failed)",
            self.directories_mirrored,
            self.directory_failures.len()
        )?;
        for (dir, reason) in &self.directory_failures {
            writeln!(f, "  [dir failed] {dir}: {reason}")?;
        }
        writeln!(
            f,
            "Files converted: {} of {} ({} excluded by filters)",
            self.succeeded().count(),
            self.files.len(),
            self.excluded.len()
        )?;
        for file in &self.files {
            match &file.result {
                Ok(ArchiveOutcome::Copied { output }) => {
                    writeln!(f, "  [copied]   {} -> {}", file.remote, output.display())?
                }
                Ok(ArchiveOutcome::Rendered {
                    output,
                    pages,
                    skipped,
                }) => writeln!(
                    f,
                    "  [rendered] {} -> {} ({} pages, {} skipped)",
                    file.remote,
                    output.display(),
                    pages,
                    skipped.len()
                )?,
                Ok(ArchiveOutcome::PassedThrough { output, .. }) => {
                    writeln!(f, "  [passthru] {} -> {}", file.remote, output.display())?
                }
                Err(e) => writeln!(f, "  [failed]   {}: {}", file.remote, e)?,
            }
        }
        Ok(())
    }
}

/// Fetches the listing and keeps only entries allowed by the filters and safe
/// to join onto the output root. Dropped entries are returned alongside.
pub async fn retrieve_listing<R>(
    remote: &R,
    config: &SyncConfig,
) -> Result<(Listing, Vec<RemotePath>), SyncError>
where
    R: RemoteStore + ?Sized,
{
    let raw = remote.list().await.map_err(|e| {
        error!(error = %e, "Remote listing failed");
        SyncError::Listing(e)
    })?;
    if raw.trim().is_empty() {
        error!("Remote listing produced no output");
        return Err(SyncError::EmptyListing);
    }
    let mut listing = parse_listing(&raw);
    info!(entries = listing.entries.len(), "Parsed remote listing");

    let mut excluded = Vec::new();
    listing.retain(|entry| {
        if !entry.path.is_contained() {
            warn!(remote = %entry.path, "Skipping remote path that escapes the output root");
            excluded.push(entry.path.clone());
            return false;
        }
        if !config.filter.allows(entry) {
            excluded.push(entry.path.clone());
            return false;
        }
        true
    });
    Ok((listing, excluded))
}

/// Runs the full pipeline for `config`.
pub async fn synchronise<R, C, M>(
    config: &SyncConfig,
    remote: &R,
    converter: &C,
    merger: &M,
) -> Result<SynchroniseReport, SyncError>
where
    R: RemoteStore + ?Sized,
    C: PageConverter + ?Sized,
    M: DocumentMerger + ?Sized,
{
    info!("[SYNC] Starting synchronisation");
    let (listing, excluded) = retrieve_listing(remote, config).await?;
    let (directories, files) = listing.split();
    info!(
        directories = directories.len(),
        files = files.len(),
        excluded = excluded.len(),
        "[SYNC] Listing filtered"
    );

    let mirrored = mirror_tree(&config.output_dir, &directories)?;

    let mut report = SynchroniseReport {
        directories_mirrored: mirrored.created.len(),
        directory_failures: mirrored.failed,
        excluded,
        files: Vec::with_capacity(files.len()),
    };

    for remote_path in files {
        let span = info_span!("file", remote = %remote_path);
        let result = sync_file(&remote_path, config, remote, converter, merger)
            .instrument(span)
            .await;
        match &result {
            Ok(outcome) => info!(remote = %remote_path, output = %outcome.output().display(), "[SYNC] File done"),
            Err(e) => error!(remote = %remote_path, error = %e, "[SYNC][ERROR] File failed, continuing"),
        }
        report.files.push(FileReport {
            remote: remote_path,
            result,
        });
    }

    info!(
        succeeded = report.succeeded().count(),
        failed = report.failed().count(),
        "[SYNC] Synchronisation finished"
    );
    Ok(report)
}

/// Fetches and converts one file. Everything temporary for this file lives
/// under a single scoped directory, removed once the file is done.
async fn sync_file<R, C, M>(
    remote_path: &RemotePath,
    config: &SyncConfig,
    remote: &R,
    converter: &C,
    merger: &M,
) -> Result<ArchiveOutcome, FileError>
where
    R: RemoteStore + ?Sized,
    C: PageConverter + ?Sized,
    M: DocumentMerger + ?Sized,
{
    scoped(&config.work_dir, "file-", |scope| {
        let file_config = SyncConfig {
            work_dir: scope,
            ..config.clone()
        };
        async move {
            let archive: PathBuf = fetch_archive(remote, remote_path, &file_config).await?;
            let outcome = process_archive(&archive, &file_config, converter, merger).await;
            // A failed archive stays on disk for a later retry.
            if !file_config.keep_archives && outcome.is_ok() {
                if let Err(e) = std::fs::remove_file(&archive) {
                    warn!(error = ?e, archive = %archive.display(), "Failed to remove downloaded archive");
                }
            }
            Ok::<_, FileError>(outcome?)
        }
    })
    .await
}
