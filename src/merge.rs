//! Concatenating rendered pages into the final PDF.

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::DocumentMerger;

/// Page attributes a page may inherit from its page tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("nothing to merge")]
    NoInput,

    #[error("cannot read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("merged document would have no pages")]
    NoPages,

    #[error("cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// In-process [`DocumentMerger`] built on `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfMerger;

impl DocumentMerger for LopdfMerger {
    fn merge(&self, pages: &[PathBuf], dest: &Path) -> Result<(), MergeError> {
        merge_documents(pages, dest)
    }
}

/// Appends every page of every input, in input order, into a new document
/// written to `dest` (replacing any existing file).
pub fn merge_documents(inputs: &[PathBuf], dest: &Path) -> Result<(), MergeError> {
    if inputs.is_empty() {
        return Err(MergeError::NoInput);
    }

    let mut merged = Document::with_version("1.5");
    let mut next_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();

    for input in inputs {
        let mut doc = Document::load(input).map_err(|source| MergeError::Load {
            path: input.clone(),
            source,
        })?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            warn!(path = %input.display(), "Input document has no pages");
        }
        for id in &page_ids {
            let mut page = doc
                .get_dictionary(*id)
                .map_err(|source| MergeError::Load {
                    path: input.clone(),
                    source,
                })?
                .clone();
            for key in INHERITABLE {
                if !page.has(key) {
                    if let Some(value) = inherited(&doc, &page, key) {
                        page.set(key.to_vec(), value);
                    }
                }
            }
            pages.push((*id, page));
        }

        for (id, object) in std::mem::take(&mut doc.objects) {
            if page_ids.contains(&id) {
                continue;
            }
            match type_name(&object) {
                Some(b"Catalog") | Some(b"Pages") => continue,
                _ => {
                    merged.objects.insert(id, object);
                }
            }
        }
        debug!(path = %input.display(), pages = page_ids.len(), "Collected pages");
    }

    if pages.is_empty() {
        return Err(MergeError::NoPages);
    }

    merged.max_id = next_id;
    let tree_id = merged.new_object_id();
    let count = pages.len();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    for (id, mut page) in pages {
        page.set("Parent", tree_id);
        merged.objects.insert(id, Object::Dictionary(page));
    }
    merged.objects.insert(
        tree_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => tree_id,
    });
    merged.trailer.set("Root", catalog_id);
    merged.prune_objects();
    merged.compress();

    merged.save(dest).map_err(|e| MergeError::Write {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(path = %dest.display(), pages = count, "Merged document written");
    Ok(())
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Guards against cyclic Parent links in malformed files.
    let mut hops = 0;
    while let Some(id) = parent {
        let node = doc.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        hops += 1;
        if hops > 64 {
            return None;
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}
