//! # contract: seams to the external collaborators
//!
//! The pipeline never shells out directly. It talks to three traits:
//!
//! - [`RemoteStore`] lists the cloud tree and fetches one archive.
//! - [`PageConverter`] renders one native `.rm` page to a PDF page.
//! - [`DocumentMerger`] concatenates rendered pages into the final document.
//!
//! Production implementations live in [`crate::remote`], [`crate::convert`] and
//! [`crate::merge`]. With the `test-export-mocks` feature (on by default) every
//! trait also gets a `mockall` mock so integration tests can script the tools.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::command::CommandError;
use crate::listing::RemotePath;
use crate::merge::MergeError;

/// Source of the remote listing and of downloaded archives.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the raw tagged listing of the whole remote tree.
    async fn list(&self) -> Result<String, CommandError>;

    /// Downloads `remote` into `workdir`, which must then contain
    /// `<file name>.rmdoc`.
    async fn fetch(&self, remote: &RemotePath, workdir: &Path) -> Result<(), CommandError>;
}

/// Renders a single native notebook page.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageConverter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), CommandError>;
}

/// Assembles ordered rendered pages into one document at `dest`, replacing it.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait DocumentMerger: Send + Sync {
    fn merge(&self, pages: &[PathBuf], dest: &Path) -> Result<(), MergeError>;
}
