//! Error types for wikivc-remote.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise at the content-service boundary.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, TLS or HTTP-level failure from the transport.
    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: Box<ureq::Error>,
    },

    /// Failed to read the response body off the wire.
    #[error("failed to read response body: {0}")]
    Body(std::io::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON error in response: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with an error payload.
    #[error("service error: {info} ({code})")]
    Api { code: String, info: String },

    /// The service refused the operation for lack of rights. Kept separate
    /// from [`RemoteError::Api`] because commits treat it as batch-fatal.
    #[error("permission denied by service: {info} ({code})")]
    PermissionDenied { code: String, info: String },

    /// Login handshake ended in something other than `Success`.
    #[error("login failed: {result}")]
    Login { result: String },

    /// Structurally valid JSON that is missing a piece we need.
    #[error("malformed response: {context}")]
    Malformed { context: String },

    /// Session-file I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    pub(crate) fn malformed(context: impl Into<String>) -> Self {
        RemoteError::Malformed {
            context: context.into(),
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RemoteError {
    RemoteError::Io {
        path: path.into(),
        source,
    }
}
