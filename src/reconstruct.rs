//! Rendering a native notebook page by page, in manifest order.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{ArchiveContents, PageDescriptor, PAGE_SUFFIX, RENDERED_EXTENSION};
use crate::contract::PageConverter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("no pages produced ({skipped} skipped)")]
    NoPagesProduced { skipped: usize },
}

/// Why a page is absent from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SourceMissing,
    ConversionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub page: PageDescriptor,
    pub reason: SkipReason,
}

/// Rendered pages ready for merging, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct ReconstructedPages {
    pub rendered: Vec<PathBuf>,
    pub skipped: Vec<SkippedPage>,
}

/// Converts each page of `pages` to `<root>/<page id>.pdf`.
///
/// A page whose `.rm` source is missing, or whose conversion fails, is
/// skipped with a warning; the rest carry on. Fails only if nothing at all
/// was rendered.
pub async fn reconstruct_pages<C>(
    contents: &ArchiveContents,
    pages: &[PageDescriptor],
    converter: &C,
) -> Result<ReconstructedPages, ReconstructError>
where
    C: PageConverter + ?Sized,
{
    let mut out = ReconstructedPages::default();

    for page in pages {
        let Some(source) = contents
            .find_entry(|name| name.starts_with(page.id.as_str()) && name.ends_with(PAGE_SUFFIX))
        else {
            warn!(page = %page.id, position = page.position, "Page source not found, skipping");
            out.skipped.push(SkippedPage {
                page: page.clone(),
                reason: SkipReason::SourceMissing,
            });
            continue;
        };

        let input = contents.absolute(source);
        let output = contents
            .root
            .join(format!("{}.{}", page.id, RENDERED_EXTENSION));

        let result = match converter.convert(&input, &output).await {
            Ok(()) if output.is_file() => Ok(()),
            Ok(()) => Err("converter reported success but wrote no output".to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => out.rendered.push(output),
            Err(reason) => {
                warn!(page = %page.id, position = page.position, error = %reason, "Page conversion failed, skipping");
                out.skipped.push(SkippedPage {
                    page: page.clone(),
                    reason: SkipReason::ConversionFailed(reason),
                });
            }
        }
    }

    if out.rendered.is_empty() {
        return Err(ReconstructError::NoPagesProduced {
            skipped: out.skipped.len(),
        });
    }
    info!(
        rendered = out.rendered.len(),
        skipped = out.skipped.len(),
        "Notebook pages rendered"
    );
    Ok(out)
}
