//! wikivc core library — domain types, repository handle, local stores.
//!
//! Public API surface:
//! - [`types`] — newtypes, persisted records, text normalization
//! - [`error`] — [`StoreError`]
//! - [`repo`] — the [`Repo`] handle and versioned config
//! - [`index`] — page name → remote identity
//! - [`cache`] — append-only per-page revision store

pub mod cache;
pub mod error;
pub mod index;
pub mod repo;
pub mod types;

pub use error::StoreError;
pub use repo::{Config, RemoteConfig, Repo};
pub use types::{normalize_text, PageId, PageName, PageRecord, RevisionId, RevisionRecord};
