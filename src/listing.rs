//! Parsing the tree listing printed by `rmapi find .`.
//!
//! Each line looks like `[d] /Some/Folder` or `[f] /Some/Folder/Notebook`.
//! Anything else (blank lines, banners, unknown tags) is skipped.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

pub const DIRECTORY_TAG: &str = "[d]";
pub const FILE_TAG: &str = "[f]";

/// Slash-delimited path of one node in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl Into<String>) -> Self {
        RemotePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path with any leading separators removed, ready to join onto a local root.
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Segments of the containing directory.
    pub fn parent_segments(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.segments().collect();
        segments.pop();
        segments
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// True when joining this path onto a root cannot leave the root.
    pub fn is_contained(&self) -> bool {
        !self.relative().is_empty()
            && Path::new(self.relative())
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
    }

    /// `<root>/<relative>`
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(self.relative())
    }

    /// `<root>/<relative>.<extension>`
    pub fn local_path_with_extension(&self, root: &Path, extension: &str) -> PathBuf {
        let mut joined = self.local_path(root).into_os_string();
        joined.push(".");
        joined.push(extension);
        PathBuf::from(joined)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::Directory => DIRECTORY_TAG,
            EntryKind::File => FILE_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub kind: EntryKind,
    pub path: RemotePath,
}

/// Ordered entries of one remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    pub fn directories(&self) -> impl Iterator<Item = &RemotePath> {
        self.of_kind(EntryKind::Directory)
    }

    pub fn files(&self) -> impl Iterator<Item = &RemotePath> {
        self.of_kind(EntryKind::File)
    }

    fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &RemotePath> {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| &e.path)
    }

    /// `(directories, files)`, each in listing order.
    pub fn split(&self) -> (Vec<RemotePath>, Vec<RemotePath>) {
        (
            self.directories().cloned().collect(),
            self.files().cloned().collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the entries accepted by `keep`, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ListingEntry) -> bool,
    {
        self.entries.retain(|e| keep(e));
    }
}

/// Renders the listing back into tagged lines, one per entry.
impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {}", entry.kind.tag(), entry.path)?;
        }
        Ok(())
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[([df])\] (.+)$").expect("static listing pattern"))
}

pub fn parse_listing(text: &str) -> Listing {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let Some(caps) = line_pattern().captures(line) else {
            debug!(line = line, "Skipping unrecognised listing line");
            continue;
        };
        let kind = match &caps[1] {
            "d" => EntryKind::Directory,
            _ => EntryKind::File,
        };
        entries.push(ListingEntry {
            kind,
            path: RemotePath::new(&caps[2]),
        });
    }
    Listing { entries }
}
