use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        source: serde_json::Error,
    },
}

/// Result of a best-effort write. `Ignored` carries the fault that was
/// swallowed so callers and tests can still observe it.
#[must_use]
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    Ignored(StoreError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn log_if_ignored(self, context: &str) {
        if let Self::Ignored(error) = self {
            tracing::warn!(%error, "{context}: write ignored");
        }
    }
}

impl From<Result<(), StoreError>> for SaveOutcome {
    fn from(value: Result<(), StoreError>) -> Self {
        match value {
            Ok(()) => Self::Saved,
            Err(error) => Self::Ignored(error),
        }
    }
}

/// Reads a file to a string, returning `None` for a missing or unreadable file.
pub(crate) fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to read store file");
            None
        }
    }
}

pub(crate) fn write_pretty_json<T: Serialize + ?Sized>(
    path: &Path,
    what: &'static str,
    value: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let encoded =
        serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode { what, source })?;
    std::fs::write(path, encoded).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
