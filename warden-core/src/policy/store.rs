//! Ownership and atomic replacement of the active policy document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{PolicyDocument, PolicyError};

/// Holds the active [`PolicyDocument`] and replaces it on reload.
///
/// Readers get an `Arc` snapshot. A reload parses a complete new document
/// before taking the write lock, so a reader sees either the old document or
/// the new one and never a mixture.
#[derive(Debug)]
pub struct PolicyStore {
    source: Option<PathBuf>,
    current: RwLock<Arc<PolicyDocument>>,
}

impl PolicyStore {
    /// Create a store for `path` and load it immediately.
    ///
    /// A missing or malformed file leaves the store on the deny-all document.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        store.load();
        store
    }

    /// Create a store for `path` without reading it. The store starts on the
    /// deny-all document until [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            current: RwLock::new(Arc::new(PolicyDocument::deny_all())),
        }
    }

    /// Create a store with no backing file.
    ///
    /// [`reload`](Self::reload) on such a store is a no-op returning false.
    pub fn with_document(document: PolicyDocument) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(document)),
        }
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The active document.
    pub fn current(&self) -> Arc<PolicyDocument> {
        Arc::clone(&self.current.read())
    }

    /// Parse the backing file and make it active.
    ///
    /// Any failure installs the deny-all document and returns false.
    pub fn load(&self) -> bool {
        let Some(path) = self.source.as_deref() else {
            return false;
        };

        match read_document(path) {
            Ok(document) => {
                self.install(document);
                tracing::info!(path = %path.display(), "loaded permission policy");
                true
            }
            Err(err) => {
                log_load_failure(path, &err);
                self.install(PolicyDocument::deny_all());
                false
            }
        }
    }

    /// Re-read the backing file.
    ///
    /// Behaves like [`load`](Self::load) except that an I/O fault other than
    /// a missing file keeps the previously active document.
    pub fn reload(&self) -> bool {
        let Some(path) = self.source.as_deref() else {
            tracing::debug!("policy store has no backing file; reload skipped");
            return false;
        };

        match read_document(path) {
            Ok(document) => {
                self.install(document);
                tracing::info!(path = %path.display(), "reloaded permission policy");
                true
            }
            Err(PolicyError::Io(err)) => {
                tracing::error!(
                    path = %path.display(),
                    error = %err,
                    "failed to reload permission policy; keeping previous policy"
                );
                false
            }
            Err(err) => {
                log_load_failure(path, &err);
                self.install(PolicyDocument::deny_all());
                false
            }
        }
    }

    fn install(&self, document: PolicyDocument) {
        let next = Arc::new(document);
        *self.current.write() = next;
    }
}

fn read_document(path: &Path) -> Result<PolicyDocument, PolicyError> {
    let source = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => PolicyError::NotFound(path.to_path_buf()),
        _ => PolicyError::Io(err),
    })?;
    PolicyDocument::from_yaml(&source)
}

fn log_load_failure(path: &Path, err: &PolicyError) {
    match err {
        PolicyError::NotFound(_) => tracing::warn!(
            path = %path.display(),
            "permission policy not found; denying all capabilities"
        ),
        PolicyError::Empty => tracing::warn!(
            path = %path.display(),
            "permission policy is empty; denying all capabilities"
        ),
        other => tracing::error!(
            path = %path.display(),
            error = %other,
            "failed to load permission policy; denying all capabilities"
        ),
    }
}
