//! Turning one downloaded `.rmdoc` archive into a PDF next to it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::archive::{extract_archive, ArchiveContents, ArchiveError, RENDERED_EXTENSION};
use crate::classify::{classify, ArchiveShape, ClassifyError};
use crate::config::SyncConfig;
use crate::contract::{DocumentMerger, PageConverter};
use crate::merge::MergeError;
use crate::reconstruct::{reconstruct_pages, ReconstructError, SkippedPage};
use crate::scoped::scoped;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What was written for one archive.
#[derive(Debug, Clone)]
pub enum ArchiveOutcome {
    /// The embedded PDF was copied.
    Copied { output: PathBuf },
    /// Pages were rendered and merged.
    Rendered {
        output: PathBuf,
        pages: usize,
        skipped: Vec<SkippedPage>,
    },
    /// An unrecognised payload was copied under the PDF name.
    PassedThrough { output: PathBuf, source: PathBuf },
}

impl ArchiveOutcome {
    pub fn output(&self) -> &Path {
        match self {
            ArchiveOutcome::Copied { output }
            | ArchiveOutcome::Rendered { output, .. }
            | ArchiveOutcome::PassedThrough { output, .. } => output,
        }
    }
}

/// `<dir>/<archive stem>.pdf`
pub fn output_path(archive: &Path) -> PathBuf {
    archive.with_extension(RENDERED_EXTENSION)
}

/// Extracts `archive` into a scoped directory, classifies it and produces the
/// output document. The extraction directory is removed on every path.
pub async fn process_archive<C, M>(
    archive: &Path,
    config: &SyncConfig,
    converter: &C,
    merger: &M,
) -> Result<ArchiveOutcome, ProcessError>
where
    C: PageConverter + ?Sized,
    M: DocumentMerger + ?Sized,
{
    let output = output_path(archive);
    info!(archive = %archive.display(), "Processing archive");

    scoped(&config.work_dir, "extract-", |root| {
        convert_extracted(archive, root, output, converter, merger)
    })
    .await
}

async fn convert_extracted<C, M>(
    archive: &Path,
    root: PathBuf,
    output: PathBuf,
    converter: &C,
    merger: &M,
) -> Result<ArchiveOutcome, ProcessError>
where
    C: PageConverter + ?Sized,
    M: DocumentMerger + ?Sized,
{
    extract_archive(archive, &root)?;
    let contents = ArchiveContents::load(&root)?;
    let shape = classify(&contents)?;
    debug!(archive = %archive.display(), ?shape, "Archive classified");

    match shape {
        ArchiveShape::EmbeddedDocument { document } => {
            fs::copy(contents.absolute(&document), &output)?;
            info!(output = %output.display(), "Copied embedded PDF");
            Ok(ArchiveOutcome::Copied { output })
        }
        ArchiveShape::NativeNotebook { pages } => {
            info!(pages = pages.len(), "Rendering native notebook");
            let rendered = reconstruct_pages(&contents, &pages, converter).await?;
            merger.merge(&rendered.rendered, &output).map_err(|e| {
                error!(error = %e, output = %output.display(), "Merging pages failed");
                e
            })?;
            Ok(ArchiveOutcome::Rendered {
                output,
                pages: rendered.rendered.len(),
                skipped: rendered.skipped,
            })
        }
        ArchiveShape::UnrecognizedPayload { payload } => {
            info!(payload = %payload.display(), "Manifest has no pages, copying payload through");
            fs::copy(contents.absolute(&payload), &output)?;
            Ok(ArchiveOutcome::PassedThrough {
                output,
                source: payload,
            })
        }
    }
}
