//! Dry-run unified diff support for `wikivc diff`.

use std::path::PathBuf;

use similar::TextDiff;

use wikivc_core::{cache, index, Repo};

use crate::status::{self, FileState};
use crate::workdir;
use crate::SyncError;

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare modified working files against their cached base revision.
///
/// Clean and untracked files produce no output. No files are written.
pub fn diff_paths(repo: &Repo, paths: &[PathBuf]) -> Result<Vec<FileDiff>, SyncError> {
    let entries = status::classify_paths(repo, paths)?;
    let mut diffs = Vec::new();
    for entry in entries {
        if entry.state != FileState::Modified {
            continue;
        }

        let base = cached_base(repo, &entry.name)?;
        let on_disk = workdir::read_normalized(&entry.path)?.unwrap_or_default();
        let old = with_final_newline(&base);
        let new = with_final_newline(&on_disk);
        if old == new {
            continue;
        }

        let relative = entry
            .path
            .strip_prefix(repo.root())
            .unwrap_or(entry.path.as_path());
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let unified = TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path: entry.path,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

/// Diff every working file under the repo root.
pub fn diff_working_dir(repo: &Repo) -> Result<Vec<FileDiff>, SyncError> {
    let paths = workdir::scan(repo)?;
    diff_paths(repo, &paths)
}

/// The latest cached text for a page, empty when nothing usable is cached.
fn cached_base(repo: &Repo, name: &wikivc_core::PageName) -> Result<String, SyncError> {
    let record = match index::lookup(repo, name)? {
        Some(record) => record,
        None => return Ok(String::new()),
    };
    Ok(match cache::latest_revision(repo, record.id)? {
        Some((_, latest)) => latest.content.unwrap_or_default(),
        None => String::new(),
    })
}

fn with_final_newline(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!("{text}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;
    use wikivc_core::{PageId, PageName, PageRecord, RevisionId, RevisionRecord};

    const API: &str = "https://wiki.example.org/w/api.php";

    fn seeded_repo(tmp: &TempDir, content: &str) -> (Repo, PathBuf) {
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        let name = PageName::from("Main Page");
        index::upsert(
            &repo,
            &name,
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
                content: Some(content.to_string()),
            },
        )
        .unwrap();
        let path = repo.working_path(&name);
        (repo, path)
    }

    #[test]
    fn clean_file_has_no_diff() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = seeded_repo(&tmp, "Hello");
        workdir::write_page(&path, "Hello").unwrap();
        assert!(diff_working_dir(&repo).unwrap().is_empty());
    }

    #[test]
    fn local_edit_produces_unified_diff() {
        let tmp = TempDir::new().unwrap();
        let (repo, path) = seeded_repo(&tmp, "Hello\nWorld");
        workdir::write_page(&path, "Hello\nEdited world").unwrap();

        let diffs = diff_working_dir(&repo).unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/Main_Page.wiki"));
        assert!(diff.contains("+++ b/Main_Page.wiki"));
        assert!(diff.contains("@@"));
        assert!(diff.contains("-World"));
        assert!(diff.contains("+Edited world"));
    }

    #[test]
    fn untracked_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let repo = Repo::init_at(tmp.path(), API).expect("init");
        std::fs::write(tmp.path().join("Stray.wiki"), "stray\n").unwrap();
        assert!(diff_working_dir(&repo).unwrap().is_empty());
    }

    #[test]
    fn deleted_file_diffs_against_cached_text() {
        let tmp = TempDir::new().unwrap();
        let (repo, _path) = seeded_repo(&tmp, "Hello");
        let diffs = diff_working_dir(&repo).unwrap();
        // No working file means no scan hit; an explicit path still diffs.
        assert!(diffs.is_empty());

        let explicit = repo.working_path(&PageName::from("Main Page"));
        let diffs = diff_paths(&repo, &[explicit]).unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].unified_diff.contains("-Hello"));
    }

}
