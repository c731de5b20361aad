//! # wikivc-remote
//!
//! Client for the remote content service: blocking HTTP calls to the
//! `api.php` endpoint, a persisted cookie session, and the
//! [`ContentService`] trait the sync engine is written against.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::{Client, ContentService, TITLE_BATCH};
pub use error::RemoteError;
pub use session::SessionStore;
pub use types::{EditContext, EditOutcome, EditRequest, PageBundle, PageLookup};
