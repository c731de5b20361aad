//! Identity index — durable mapping from page names to remote identity.
//!
//! Persists an [`IndexFile`] JSON document at `<root>/.wikivc/index.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the config.
//!
//! Entries are created on first pull, overwritten whenever a newer revision
//! is cached, and never deleted.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::repo::Repo;
use crate::types::{PageName, PageRecord};

const INDEX_VERSION: u32 = 1;

/// On-disk index payload. `BTreeMap` keeps listings deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexFile {
    pub version: u32,
    pub pages: BTreeMap<PageName, PageRecord>,
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            pages: BTreeMap::new(),
        }
    }
}

/// Load the index, or an empty one if the file does not yet exist.
pub fn load(repo: &Repo) -> Result<IndexFile, StoreError> {
    let path = repo.index_path();
    if !path.exists() {
        return Ok(IndexFile::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// Save the index atomically: pretty JSON → `.json.tmp` sibling → rename.
pub fn save(repo: &Repo, index: &IndexFile) -> Result<(), StoreError> {
    let path = repo.index_path();
    write_json_atomic(&path, index)
}

/// Look up the identity record for a page name, if it is tracked.
pub fn lookup(repo: &Repo, name: &PageName) -> Result<Option<PageRecord>, StoreError> {
    Ok(load(repo)?.pages.get(name).copied())
}

/// Insert or overwrite the identity record for `name`.
///
/// Durable before return; the caller sees the update on the next `lookup`
/// even across a crash after this call.
pub fn upsert(repo: &Repo, name: &PageName, record: PageRecord) -> Result<(), StoreError> {
    let mut index = load(repo)?;
    index.pages.insert(name.clone(), record);
    save(repo, &index)
}

/// Serialize `value` to `<path>.tmp` in the same directory and rename over
/// the target. Shared by the index and the revision cache.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid store path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageId, RevisionId};
    use tempfile::TempDir;

    const API: &str = "https://wiki.example.org/w/api.php";

    fn make_repo(tmp: &TempDir) -> Repo {
        Repo::init_at(tmp.path(), API).expect("init")
    }

    fn rec(id: u64, last_revision: u64) -> PageRecord {
        PageRecord {
            id: PageId(id),
            last_revision: RevisionId(last_revision),
        }
    }

    #[test]
    fn empty_index_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        let index = load(&repo).unwrap();
        assert!(index.pages.is_empty());
        assert_eq!(index.version, INDEX_VERSION);
    }

    #[test]
    fn upsert_then_lookup() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        let name = PageName::from("Main Page");
        upsert(&repo, &name, rec(7, 1)).unwrap();
        let found = lookup(&repo, &name).unwrap().expect("tracked");
        assert_eq!(found.id, PageId(7));
        assert_eq!(found.last_revision, RevisionId(1));
    }

    #[test]
    fn upsert_overwrites_last_revision() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        let name = PageName::from("Main Page");
        upsert(&repo, &name, rec(7, 1)).unwrap();
        upsert(&repo, &name, rec(7, 2)).unwrap();
        let found = lookup(&repo, &name).unwrap().expect("tracked");
        assert_eq!(found.last_revision, RevisionId(2));
    }

    #[test]
    fn lookup_unknown_page_is_none() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        assert!(lookup(&repo, &PageName::from("Nope")).unwrap().is_none());
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        upsert(&repo, &PageName::from("Foo"), rec(1, 1)).unwrap();
        let tmp_path = repo.index_path().with_extension("json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn index_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        upsert(&repo, &PageName::from("A"), rec(1, 1)).unwrap();
        upsert(&repo, &PageName::from("B"), rec(2, 5)).unwrap();

        let reopened = Repo::discover(tmp.path()).expect("discover");
        let index = load(&reopened).unwrap();
        assert_eq!(index.pages.len(), 2);
        assert_eq!(
            index.pages.get(&PageName::from("B")).unwrap().last_revision,
            RevisionId(5)
        );
    }

    #[test]
    fn corrupt_index_reports_path() {
        let tmp = TempDir::new().unwrap();
        let repo = make_repo(&tmp);
        std::fs::write(repo.index_path(), "{ not json").unwrap();
        let err = load(&repo).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("index.json"));
    }
}
