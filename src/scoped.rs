//! Uniquely named working directories that are always removed.
//!
//! [`scoped`] is the acquire / run / remove helper used around fetching,
//! archive extraction and per-file processing. [`ScopedDir`] is the guard
//! behind it; dropping the guard removes the directory, so early returns and
//! unwinding clean up too.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct ScopedDir {
    path: PathBuf,
    removed: bool,
}

impl ScopedDir {
    /// Creates `<parent>/<prefix><uuid>` (and `parent` if needed).
    pub fn create(parent: &Path, prefix: &str) -> std::io::Result<Self> {
        let path = parent.join(format!("{}{}", prefix, Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        debug!(path = %path.display(), "Created scoped directory");
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory now. Failures are logged, not returned.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scoped directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                error = ?e,
                path = %self.path.display(),
                "Failed to remove scoped directory"
            ),
        }
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Runs `f` with a fresh scoped directory under `parent` and removes it afterwards,
/// whatever `f` returned.
pub async fn scoped<T, E, F, Fut>(parent: &Path, prefix: &str, f: F) -> Result<T, E>
where
    E: From<std::io::Error>,
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let dir = ScopedDir::create(parent, prefix)?;
    let result = f(dir.path().to_path_buf()).await;
    dir.close();
    result
}
