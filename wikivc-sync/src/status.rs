//! Working-file classification against the index and revision cache.

use std::path::{Path, PathBuf};

use wikivc_core::{cache, index, PageName, Repo};

use crate::error::SyncError;
use crate::workdir;

/// Where a working file stands relative to its cached base revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Not in the index, or indexed without any cached revision.
    Untracked,
    /// Canonical content equals the cached latest revision.
    Clean,
    /// Canonical content differs from the cached latest revision, the
    /// file is gone, or the latest cached revision has no text to
    /// compare against.
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: PathBuf,
    pub name: PageName,
    pub state: FileState,
}

/// Classify one working file. Total: every input maps to a state.
pub fn classify_path(repo: &Repo, path: &Path) -> Result<StatusEntry, SyncError> {
    let name = match workdir::page_name_for(path) {
        Some(name) => name,
        None => {
            return Ok(StatusEntry {
                path: path.to_path_buf(),
                name: PageName::from(""),
                state: FileState::Untracked,
            })
        }
    };
    let state = classify_state(repo, &name, path)?;
    Ok(entry(path, name, state))
}

/// Classify a page at its canonical working path.
pub fn classify_page(repo: &Repo, name: &PageName) -> Result<FileState, SyncError> {
    let path = repo.working_path(name);
    classify_state(repo, name, &path)
}

fn classify_state(repo: &Repo, name: &PageName, path: &Path) -> Result<FileState, SyncError> {
    let record = match index::lookup(repo, name)? {
        Some(record) => record,
        None => return Ok(FileState::Untracked),
    };

    let (_, latest) = match cache::latest_revision(repo, record.id)? {
        Some(entry) => entry,
        None => return Ok(FileState::Untracked),
    };

    Ok(match (&latest.content, workdir::read_normalized(path)?) {
        (Some(cached), Some(on_disk)) if *cached == on_disk => FileState::Clean,
        _ => FileState::Modified,
    })
}

fn entry(path: &Path, name: PageName, state: FileState) -> StatusEntry {
    StatusEntry {
        path: path.to_path_buf(),
        name,
        state,
    }
}

/// Classify a set of paths in deterministic lexicographic order.
pub fn classify_paths(repo: &Repo, paths: &[PathBuf]) -> Result<Vec<StatusEntry>, SyncError> {
    let mut paths = paths.to_vec();
    workdir::sort_paths(&mut paths);
    paths
        .iter()
        .map(|path| classify_path(repo, path))
        .collect()
}

/// Classify every working file under the repo root.
pub fn classify_working_dir(repo: &Repo) -> Result<Vec<StatusEntry>, SyncError> {
    let paths = workdir::scan(repo)?;
    classify_paths(repo, &paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;
    use wikivc_core::{PageId, PageRecord, RevisionId, RevisionRecord};

    const API: &str = "https://wiki.example.org/w/api.php";

    fn repo_with_page(tmp: &TempDir, name: &str, content: Option<&str>) -> (Repo, PathBuf) {
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        let page = PageName::from(name);
        index::upsert(
            &repo,
            &page,
            PageRecord {
                id: PageId(7),
                last_revision: RevisionId(1),
            },
        )
        .unwrap();
        cache::append_revision(
            &repo,
            PageId(7),
            RevisionId(1),
            RevisionRecord {
                author: "Editor".into(),
                timestamp: Utc::now(),
                content: content.map(String::from),
            },
        )
        .unwrap();
        let path = repo.working_path(&page);
        (repo, path)
    }

    #[test]
    fn unknown_file_is_untracked() {
        let tmp = TempDir::new().unwrap();
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        let path = tmp.path().join("Stray.wiki");
        std::fs::write(&path, "stray\n").unwrap();
        let entry = classify_path(&repo, &path).unwrap();
        assert_eq!(entry.state, FileState::Untracked);
        assert_eq!(entry.name, PageName::from("Stray"));
    }

    #[test]
    fn indexed_without_cache_is_untracked() {
        let tmp = TempDir::new().unwrap();
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        let page = PageName::from("Orphan");
        index::upsert(
            &repo,
            &page,
            PageRecord {
                id: PageId(9),
                last_revision: RevisionId(4),
            },
        )
        .unwrap();
        let path = repo.working_path(&page);
        std::fs::write(&path, "orphan\n").unwrap();
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Untracked);
    }

    #[test]
    fn matching_content_is_clean() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", Some("Hello"));
        workdir::write_page(&path, "Hello").unwrap();
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Clean);
    }

    #[test]
    fn crlf_on_disk_still_compares_clean() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", Some("Hello\nWorld"));
        std::fs::write(&path, "Hello\r\nWorld\r\n").unwrap();
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Clean);
    }

    #[test]
    fn edited_content_is_modified() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", Some("Hello"));
        workdir::write_page(&path, "Hello edited").unwrap();
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Modified);
    }

    #[test]
    fn missing_file_is_modified() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", Some("Hello"));
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Modified);
    }

    #[test]
    fn metadata_only_base_is_modified() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", None);
        workdir::write_page(&path, "Hello").unwrap();
        assert_eq!(classify_path(&repo, &path).unwrap().state, FileState::Modified);
    }

    #[test]
    fn classify_page_uses_the_canonical_path() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = repo_with_page(&tmp, "Main Page", Some("Hello"));
        workdir::write_page(&path, "Hello").unwrap();
        assert_eq!(
            classify_page(&repo, &PageName::from("Main Page")).unwrap(),
            FileState::Clean
        );
        assert_eq!(
            classify_page(&repo, &PageName::from("Other")).unwrap(),
            FileState::Untracked
        );
    }

    #[test]
    fn classify_paths_orders_and_dedups() {
        let tmp = TempDir::new().unwrap();
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        let a = tmp.path().join("Alpha.wiki");
        let z = tmp.path().join("Zebra.wiki");
        std::fs::write(&a, "a\n").unwrap();
        std::fs::write(&z, "z\n").unwrap();

        let entries =
            classify_paths(&repo, &[z.clone(), a.clone(), z.clone()]).unwrap();
        let paths: Vec<&PathBuf> = entries.iter().map(|e| &e.path).collect();
        assert_eq!(paths, vec![&a, &z]);
    }
}
