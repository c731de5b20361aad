//! Error types for wikivc-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from classification and sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store failure (index, cache, repo config).
    #[error(transparent)]
    Store(#[from] wikivc_core::StoreError),

    /// Content-service failure that is fatal to the whole operation.
    /// Per-item remote failures are folded into reports instead.
    #[error(transparent)]
    Remote(#[from] wikivc_remote::RemoteError),

    /// Working-tree I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Merge was requested but the repo config has no `merge_tool` entry.
    #[error("no merge tool configured; set merge_tool in .wikivc/config.yaml")]
    NoMergeTool,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
