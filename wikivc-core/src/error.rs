//! Error types for wikivc-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{PageId, RevisionId};

/// All errors that can arise from repository and store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (config write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error (index / cache write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Index or cache document parse error on load.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No `.wikivc` directory was found in `start` or any of its parents.
    #[error("not a wikivc repository (searched {start} and parents)")]
    NotARepo { start: PathBuf },

    /// `init` was run inside a directory that already belongs to a repository.
    #[error("already a wikivc repository at {root}")]
    AlreadyInitialized { root: PathBuf },

    /// The requested revision is not in the local cache.
    #[error("revision {revision} of page {page} is not cached")]
    RevisionNotFound { page: PageId, revision: RevisionId },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
