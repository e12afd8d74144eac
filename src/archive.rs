//! Unpacking `.rmdoc` archives and reading their `.content` manifest.
//!
//! An archive is a zip holding, for a document `<id>`:
//!
//! ```text
//! <id>.content        JSON manifest (page order lives here)
//! <id>.metadata       JSON metadata
//! <id>.pdf            present for imported PDFs
//! <id>/<page>.rm      native notebook pages
//! ```
//!
//! Entries are listed sorted by file name so that "first match" lookups do
//! not depend on the platform's directory enumeration order.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MANIFEST_SUFFIX: &str = ".content";
pub const METADATA_SUFFIX: &str = ".metadata";
pub const PAGEDATA_SUFFIX: &str = ".pagedata";
pub const PAGE_SUFFIX: &str = ".rm";
pub const RENDERED_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no .content manifest found in archive")]
    ManifestMissing,

    #[error("manifest {path} is not valid JSON: {source}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot walk extracted archive: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One page of a native notebook, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub id: String,
    pub position: usize,
}

/// Unzips every entry of `archive` below `dest`. Returns the number of files written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let open_err = |source| ArchiveError::Open {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(open_err)?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(open_err)?;
        let target = match entry.enclosed_name() {
            Some(name) => dest.join(name),
            None => {
                warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
                continue;
            }
        };
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }
    debug!(archive = %archive.display(), files = written, "Archive extracted");
    Ok(written)
}

/// An extracted archive: its files and parsed manifest.
#[derive(Debug, Clone)]
pub struct ArchiveContents {
    pub root: PathBuf,
    /// File paths relative to `root`, sorted.
    pub entries: Vec<PathBuf>,
    /// Relative path of the manifest that was picked.
    pub manifest_path: PathBuf,
    /// Manifest file stem, the document id.
    pub base_id: String,
    pub manifest: Value,
}

impl ArchiveContents {
    /// Walks `root`, picks the first `.content` entry and parses it.
    pub fn load(root: &Path) -> Result<Self, ArchiveError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                if let Ok(rel) = entry.path().strip_prefix(root) {
                    entries.push(rel.to_path_buf());
                }
            }
        }

        let manifests: Vec<&PathBuf> = entries
            .iter()
            .filter(|p| file_name_str(p).ends_with(MANIFEST_SUFFIX))
            .collect();
        let manifest_path = match manifests.as_slice() {
            [] => return Err(ArchiveError::ManifestMissing),
            [only] => (*only).clone(),
            [first, ..] => {
                warn!(
                    count = manifests.len(),
                    picked = %first.display(),
                    "Archive holds several manifests, using the first"
                );
                (*first).clone()
            }
        };

        let base_id = manifest_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = fs::read(root.join(&manifest_path))?;
        let manifest =
            serde_json::from_slice(&raw).map_err(|source| ArchiveError::ManifestUnreadable {
                path: manifest_path.clone(),
                source,
            })?;

        Ok(Self {
            root: root.to_path_buf(),
            entries,
            manifest_path,
            base_id,
            manifest,
        })
    }

    /// First entry (in sorted order) whose file name satisfies `pred`.
    pub fn find_entry<F>(&self, mut pred: F) -> Option<&PathBuf>
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.iter().find(|p| pred(file_name_str(p)))
    }

    pub fn absolute(&self, entry: &Path) -> PathBuf {
        self.root.join(entry)
    }

    /// Ordered page ids from the manifest, or `None` when the manifest has no
    /// page structure at all.
    ///
    /// Understands the current `cPages.pages[].id` layout (dropping pages
    /// flagged as deleted) and the older top-level `pages` list of ids.
    pub fn page_descriptors(&self) -> Option<Vec<PageDescriptor>> {
        let ids = cpages_ids(&self.manifest).or_else(|| legacy_ids(&self.manifest))?;
        Some(
            ids.into_iter()
                .enumerate()
                .map(|(position, id)| PageDescriptor { id, position })
                .collect(),
        )
    }
}

fn cpages_ids(manifest: &Value) -> Option<Vec<String>> {
    let pages = manifest.get("cPages")?.get("pages")?.as_array()?;
    let mut ids = Vec::with_capacity(pages.len());
    for page in pages {
        let id = page.get("id")?.as_str()?;
        let deleted = page
            .get("deleted")
            .and_then(|d| d.get("value"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if deleted != 0 {
            debug!(page = id, "Dropping page marked as deleted");
            continue;
        }
        ids.push(id.to_string());
    }
    Some(ids)
}

fn legacy_ids(manifest: &Value) -> Option<Vec<String>> {
    manifest
        .get("pages")?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

pub(crate) fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}
