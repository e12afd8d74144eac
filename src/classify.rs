//! Deciding what kind of document an extracted archive holds.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::{
    ArchiveContents, PageDescriptor, MANIFEST_SUFFIX, METADATA_SUFFIX, PAGEDATA_SUFFIX,
    RENDERED_EXTENSION,
};

/// The three archive layouts, each with what its handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveShape {
    /// An imported PDF stored as `<id>.pdf`; copied as is.
    EmbeddedDocument { document: PathBuf },
    /// Handwritten notebook; pages are rendered one by one and merged.
    NativeNotebook { pages: Vec<PageDescriptor> },
    /// No page structure in the manifest; the first non-bookkeeping file is
    /// copied through.
    UnrecognizedPayload { payload: PathBuf },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("manifest has no pages and archive holds no payload to copy")]
    NoPayload,
}

/// Classifies `contents`. Paths in the result are relative to `contents.root`.
///
/// Precedence: embedded PDF, then manifest pages (an empty page list still
/// counts as a notebook), then passthrough.
pub fn classify(contents: &ArchiveContents) -> Result<ArchiveShape, ClassifyError> {
    let embedded_name = format!("{}.{}", contents.base_id, RENDERED_EXTENSION);
    if let Some(document) = contents.find_entry(|name| name == embedded_name) {
        return Ok(ArchiveShape::EmbeddedDocument {
            document: document.clone(),
        });
    }

    if let Some(pages) = contents.page_descriptors() {
        return Ok(ArchiveShape::NativeNotebook { pages });
    }

    let rendered_suffix = format!(".{}", RENDERED_EXTENSION);
    contents
        .find_entry(|name| {
            ![
                MANIFEST_SUFFIX,
                METADATA_SUFFIX,
                PAGEDATA_SUFFIX,
                rendered_suffix.as_str(),
            ]
            .iter()
            .any(|suffix| name.ends_with(suffix))
        })
        .map(|payload| ArchiveShape::UnrecognizedPayload {
            payload: payload.clone(),
        })
        .ok_or(ClassifyError::NoPayload)
}
