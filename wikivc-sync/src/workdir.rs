//! Working-tree scanning and page-file I/O.
//!
//! Working files live anywhere under the repo root with a `.wiki` extension;
//! their page identity comes from the file name alone. All reads normalize
//! to LF with the trailing newline stripped, all writes restore exactly one
//! trailing newline and go through a `.tmp` sibling + rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wikivc_core::repo::{Repo, CONTROL_DIR, WIKI_EXT};
use wikivc_core::{normalize_text, PageName};

use crate::error::{io_err, SyncError};

/// All working files under the repo root, in lexicographic path order.
///
/// Walks the tree recursively, skipping the control directory.
pub fn scan(repo: &Repo) -> Result<Vec<PathBuf>, SyncError> {
    let mut found = Vec::new();
    walk(repo.root(), &mut found)?;
    sort_paths(&mut found);
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            if entry.file_name() == CONTROL_DIR {
                continue;
            }
            walk(&path, found)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(WIKI_EXT) {
            found.push(path);
        }
    }
    Ok(())
}

/// The page a working file stands for, from its file name alone.
///
/// `None` when the path has no usable stem (no `.wiki` file does).
pub fn page_name_for(path: &Path) -> Option<PageName> {
    let stem = path.file_stem()?.to_str()?;
    Some(PageName::from_filename(stem))
}

/// Turn a command-line argument into a page name: a `*.wiki` path goes
/// through the filename transform, anything else is taken as a literal
/// page name.
pub fn resolve_name(arg: &str) -> PageName {
    match arg.strip_suffix(".wiki") {
        Some(stem) => {
            let stem = stem.rsplit('/').next().unwrap_or(stem);
            PageName::from_filename(stem)
        }
        None => PageName::from(arg),
    }
}

/// Read a working file in canonical form, `None` when it does not exist.
pub fn read_normalized(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(normalize_text(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Atomically write a working file: canonical content plus one trailing
/// newline, via a `.wikivc.tmp` sibling and rename.
pub fn write_page(path: &Path, content: &str) -> Result<(), SyncError> {
    let body = format!("{}\n", normalize_text(content));
    let tmp = PathBuf::from(format!("{}.wikivc.tmp", path.display()));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(&tmp, &body).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::info!("wrote: {}", path.display());
    Ok(())
}

/// Keep only the `.wiki` files among explicit path arguments.
pub fn wiki_paths_only(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some(WIKI_EXT))
        .cloned()
        .collect()
}

/// Lexicographic order on the display form, duplicates dropped.
pub(crate) fn sort_paths(paths: &mut Vec<PathBuf>) {
    paths.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    paths.dedup();
}
