//! Revision cache — append-only per-page store of revision records.
//!
//! One JSON document per page id at `<root>/.wikivc/cache/pages/<id>.json`,
//! mapping revision ids to [`RevisionRecord`]s. Documents only grow: records
//! are added or enriched, never removed, and a stored content body is never
//! replaced by a metadata-only record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::index::write_json_atomic;
use crate::repo::Repo;
use crate::types::{PageId, RevisionId, RevisionRecord};

const CACHE_VERSION: u32 = 1;

/// On-disk cache document for one page. `BTreeMap` keys give ascending
/// revision order for free.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageCacheFile {
    pub version: u32,
    pub revisions: BTreeMap<RevisionId, RevisionRecord>,
}

impl Default for PageCacheFile {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            revisions: BTreeMap::new(),
        }
    }
}

fn load_doc(repo: &Repo, page: PageId) -> Result<Option<PageCacheFile>, StoreError> {
    let path = repo.page_cache_path(page);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let doc = serde_json::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })?;
    Ok(Some(doc))
}

/// Store a revision record, or enrich the one already stored.
///
/// A metadata-only record (`content: None`) never overwrites cached content:
/// if the existing record carries text and the incoming one does not, the
/// text is kept. Durable before return.
pub fn append_revision(
    repo: &Repo,
    page: PageId,
    revision: RevisionId,
    mut record: RevisionRecord,
) -> Result<(), StoreError> {
    let mut doc = load_doc(repo, page)?.unwrap_or_default();
    if record.content.is_none() {
        if let Some(existing) = doc.revisions.get(&revision) {
            record.content = existing.content.clone();
        }
    }
    doc.revisions.insert(revision, record);
    write_json_atomic(&repo.page_cache_path(page), &doc)
}

/// All cached revision ids for `page`, ascending.
///
/// `None` means the page has no cache document at all — distinct from
/// `Some(vec![])`, which would be an empty document.
pub fn list_revision_ids(repo: &Repo, page: PageId) -> Result<Option<Vec<RevisionId>>, StoreError> {
    Ok(load_doc(repo, page)?.map(|doc| doc.revisions.keys().copied().collect()))
}

/// The highest cached revision for `page`, if any revision is cached.
pub fn latest_revision(
    repo: &Repo,
    page: PageId,
) -> Result<Option<(RevisionId, RevisionRecord)>, StoreError> {
    Ok(load_doc(repo, page)?.and_then(|mut doc| {
        let id = doc.revisions.keys().next_back().copied()?;
        let record = doc.revisions.remove(&id)?;
        Some((id, record))
    }))
}

/// Fetch one cached revision record.
pub fn get_revision(
    repo: &Repo,
    page: PageId,
    revision: RevisionId,
) -> Result<RevisionRecord, StoreError> {
    load_doc(repo, page)?
        .and_then(|mut doc| doc.revisions.remove(&revision))
        .ok_or(StoreError::RevisionNotFound { page, revision })
}
