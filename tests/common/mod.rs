//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Builder for `.rmdoc` zip fixtures. Entries are written in insertion order.
#[derive(Debug, Default, Clone)]
pub struct Rmdoc {
    entries: Vec<(String, Vec<u8>)>,
}

impl Rmdoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: impl Into<String>, bytes: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.into(), bytes.as_ref().to_vec()));
        self
    }

    pub fn write(&self, path: &Path) {
        let file = File::create(path).expect("create archive");
        let mut zip = zip::ZipWriter::new(file);
        for (name, bytes) in &self.entries {
            zip.start_file(name.as_str(), zip::write::FileOptions::default())
                .expect("start entry");
            zip.write_all(bytes).expect("write entry");
        }
        zip.finish().expect("finish archive");
    }
}

/// A `.content` manifest listing `ids` in the current `cPages` layout.
pub fn cpages_manifest(ids: &[&str]) -> String {
    let pages: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id, "idx": { "value": "ba" } }))
        .collect();
    serde_json::json!({
        "fileType": "notebook",
        "formatVersion": 2,
        "cPages": { "pages": pages }
    })
    .to_string()
}

/// Writes a one-page PDF whose page dictionary carries `/Label (<label>)`.
pub fn write_labelled_page(path: &Path, label: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(label)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Label" => Object::string_literal(label),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save page pdf");
}

/// Labels of the pages of the PDF at `path`, in page order.
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("load merged pdf");
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).expect("page dictionary");
            let label = page
                .get(b"Label")
                .and_then(Object::as_str)
                .expect("page label");
            String::from_utf8_lossy(label).into_owned()
        })
        .collect()
}

/// True when the PDF at `path` has a MediaBox on every page (own or inherited).
pub fn every_page_has_media_box(path: &Path) -> bool {
    let doc = Document::load(path).expect("load merged pdf");
    doc.get_pages().values().all(|id| {
        doc.get_dictionary(*id)
            .map(|page| page.has(b"MediaBox"))
            .unwrap_or(false)
    })
}

/// Number of entries directly below `dir`.
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
