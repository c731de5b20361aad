//! Pull, commit, and merge orchestration.
//!
//! ## `pull` — per page
//!
//! 1. Missing on the remote → report, touch nothing.
//! 2. Working file present with local edits and not forced → skip.
//! 3. Head already cached and the working file exists → unchanged.
//! 4. Otherwise cache the revision, update the index, rewrite the file
//!    (this restores a deleted working file).
//!
//! ## `commit` — per modified file
//!
//! 1. Fetch an edit token together with the current remote head.
//! 2. Head moved past our base → conflict, nothing is submitted.
//! 3. Submit with an md5 checksum of the text.
//! 4. Server reports no change → normalize the file in place.
//! 5. Server based the edit on a different head → conflict, local
//!    stores stay untouched.
//! 6. Otherwise record the new head and refetch it for the cache.
//!
//! A permission error from the remote aborts the rest of the batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chrono::Utc;

use wikivc_core::{cache, index, PageName, PageRecord, Repo, RevisionId, RevisionRecord};
use wikivc_remote::{ContentService, EditOutcome, EditRequest, PageLookup, RemoteError, TITLE_BATCH};

use crate::error::{io_err, SyncError};
use crate::status::{self, FileState};
use crate::workdir;

/// Pause between consecutive edit submissions.
pub const COMMIT_COOLDOWN: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Pull
// ---------------------------------------------------------------------------

/// Outcome of pulling a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// A revision was cached and the working file rewritten.
    Pulled { revision: RevisionId },
    /// The cached head already matches the remote and the file exists.
    Unchanged,
    /// The working file has local edits and `force` was not given.
    SkippedModified,
    /// The remote has no page under this name.
    Missing,
    /// The remote request for this page failed.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub name: PageName,
    pub outcome: PullOutcome,
}

/// Pull the named pages from the remote.
///
/// Names are processed in lexicographic order, deduplicated, and queried
/// in batches. A failed batch fails only the names in it.
pub fn pull(
    repo: &Repo,
    service: &mut dyn ContentService,
    names: &[PageName],
    force: bool,
) -> Result<Vec<PullReport>, SyncError> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();

    let mut reports = Vec::new();
    for chunk in names.chunks(TITLE_BATCH) {
        let lookups = match service.page_bundles(chunk) {
            Ok(lookups) => lookups,
            Err(err) => {
                tracing::warn!("page query failed: {err}");
                let error = err.to_string();
                reports.extend(chunk.iter().map(|name| PullReport {
                    name: name.clone(),
                    outcome: PullOutcome::Failed {
                        error: error.clone(),
                    },
                }));
                continue;
            }
        };

        let mut seen = BTreeSet::new();
        for lookup in lookups {
            let report = match lookup {
                PageLookup::Missing { name } => {
                    tracing::warn!("no such page: {name}");
                    seen.insert(name.clone());
                    PullReport {
                        name,
                        outcome: PullOutcome::Missing,
                    }
                }
                PageLookup::Found(bundle) => {
                    seen.insert(bundle.name.clone());
                    let outcome = pull_one(repo, &bundle, force)?;
                    PullReport {
                        name: bundle.name,
                        outcome,
                    }
                }
            };
            reports.push(report);
        }

        for name in chunk {
            if !seen.contains(name) {
                reports.push(PullReport {
                    name: name.clone(),
                    outcome: PullOutcome::Failed {
                        error: "page absent from the response".to_string(),
                    },
                });
            }
        }
    }

    reports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(reports)
}

fn pull_one(
    repo: &Repo,
    bundle: &wikivc_remote::PageBundle,
    force: bool,
) -> Result<PullOutcome, SyncError> {
    let path = repo.working_path(&bundle.name);
    let state = status::classify_page(repo, &bundle.name)?;
    // A deleted working file is restored; the skip protects local edits only.
    if state == FileState::Modified && path.exists() && !force {
        tracing::debug!("skipping modified page: {}", bundle.name);
        return Ok(PullOutcome::SkippedModified);
    }

    if let Some(record) = index::lookup(repo, &bundle.name)? {
        if record.last_revision == bundle.latest && path.exists() {
            tracing::debug!("up to date: {}", bundle.name);
            return Ok(PullOutcome::Unchanged);
        }
    }

    cache::append_revision(repo, bundle.id, bundle.latest, bundle.record.clone())?;
    index::upsert(
        repo,
        &bundle.name,
        PageRecord {
            id: bundle.id,
            last_revision: bundle.latest,
        },
    )?;
    workdir::write_page(&path, bundle.record.content.as_deref().unwrap_or_default())?;
    tracing::info!("pulled {} at revision {}", bundle.name, bundle.latest);
    Ok(PullOutcome::Pulled {
        revision: bundle.latest,
    })
}

/// Refresh every page that has a working file.
pub fn pull_all(
    repo: &Repo,
    service: &mut dyn ContentService,
    force: bool,
) -> Result<Vec<PullReport>, SyncError> {
    let paths = workdir::scan(repo)?;
    let names: Vec<PageName> = paths.iter().filter_map(|p| workdir::page_name_for(p)).collect();
    pull(repo, service, &names, force)
}

/// Pull every member of a remote category.
pub fn pull_category(
    repo: &Repo,
    service: &mut dyn ContentService,
    category: &str,
    force: bool,
) -> Result<Vec<PullReport>, SyncError> {
    let names = service.category_members(category)?;
    tracing::info!("category has {} member(s)", names.len());
    pull(repo, service, &names, force)
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Outcome of committing a single working file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The edit was accepted; the new head is cached.
    Committed { new_revision: RevisionId },
    /// The server stored nothing; the file was normalized in place.
    NoChange,
    /// The remote head is not the revision this file was based on.
    /// Nothing was submitted or recorded.
    Conflict {
        remote_head: RevisionId,
        last_known: RevisionId,
    },
    /// The remote refused the edit outright; the rest of the batch
    /// is not attempted.
    PermissionDenied { error: String },
    /// The remote request for this file failed.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub path: PathBuf,
    pub name: PageName,
    pub outcome: CommitOutcome,
}

#[derive(Debug, Clone)]
pub struct CommitOptions {
    pub summary: String,
    pub bot: bool,
    pub cooldown: Duration,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            summary: String::new(),
            bot: false,
            cooldown: COMMIT_COOLDOWN,
        }
    }
}

/// Commit the modified files among `paths`, in lexicographic order.
///
/// Clean and untracked files are passed over without a report. A
/// permission error stops the batch at the file that hit it.
pub fn commit_paths(
    repo: &Repo,
    service: &mut dyn ContentService,
    paths: &[PathBuf],
    options: &CommitOptions,
) -> Result<Vec<CommitReport>, SyncError> {
    let targets: Vec<_> = status::classify_paths(repo, paths)?
        .into_iter()
        .filter(|entry| entry.state == FileState::Modified)
        .collect();

    let mut reports = Vec::new();
    for (i, entry) in targets.iter().enumerate() {
        if i > 0 && !options.cooldown.is_zero() {
            std::thread::sleep(options.cooldown);
        }

        let (outcome, abort) = commit_one(repo, service, entry, options)?;
        reports.push(CommitReport {
            path: entry.path.clone(),
            name: entry.name.clone(),
            outcome,
        });
        if abort {
            break;
        }
    }
    Ok(reports)
}

fn commit_one(
    repo: &Repo,
    service: &mut dyn ContentService,
    entry: &status::StatusEntry,
    options: &CommitOptions,
) -> Result<(CommitOutcome, bool), SyncError> {
    let ctx = match service.edit_context(&entry.name) {
        Ok(ctx) => ctx,
        Err(err @ RemoteError::PermissionDenied { .. }) => {
            return Ok((
                CommitOutcome::PermissionDenied {
                    error: err.to_string(),
                },
                true,
            ))
        }
        Err(err) => {
            return Ok((
                CommitOutcome::Failed {
                    error: err.to_string(),
                },
                false,
            ))
        }
    };

    let record = match index::lookup(repo, &entry.name)? {
        Some(record) => record,
        None => {
            return Ok((
                CommitOutcome::Failed {
                    error: "page is not tracked".to_string(),
                },
                false,
            ))
        }
    };

    if ctx.head != record.last_revision {
        tracing::warn!(
            "conflict on {}: remote head {} is past local base {}",
            entry.name,
            ctx.head,
            record.last_revision
        );
        return Ok((
            CommitOutcome::Conflict {
                remote_head: ctx.head,
                last_known: record.last_revision,
            },
            false,
        ));
    }

    let text = match workdir::read_normalized(&entry.path)? {
        Some(text) => text,
        None => {
            return Ok((
                CommitOutcome::Failed {
                    error: "working file disappeared".to_string(),
                },
                false,
            ))
        }
    };

    let request = EditRequest {
        name: entry.name.clone(),
        text: text.clone(),
        token: ctx.token.clone(),
        summary: options.summary.clone(),
        bot: options.bot,
    };
    let outcome = match service.submit_edit(&request) {
        Ok(outcome) => outcome,
        Err(err @ RemoteError::PermissionDenied { .. }) => {
            return Ok((
                CommitOutcome::PermissionDenied {
                    error: err.to_string(),
                },
                true,
            ))
        }
        Err(err) => {
            return Ok((
                CommitOutcome::Failed {
                    error: err.to_string(),
                },
                false,
            ))
        }
    };

    match outcome {
        EditOutcome::NoChange => {
            tracing::warn!("no change on the server for {}", entry.name);
            workdir::write_page(&entry.path, &text)?;
            Ok((CommitOutcome::NoChange, false))
        }
        EditOutcome::Saved { base, new } => {
            if base != ctx.head {
                tracing::warn!(
                    "conflict on {}: edit landed on {} instead of {}",
                    entry.name,
                    base,
                    ctx.head
                );
                return Ok((
                    CommitOutcome::Conflict {
                        remote_head: base,
                        last_known: record.last_revision,
                    },
                    false,
                ));
            }

            cache::append_revision(
                repo,
                ctx.id,
                new,
                RevisionRecord {
                    author: String::new(),
                    timestamp: Utc::now(),
                    content: None,
                },
            )?;
            index::upsert(
                repo,
                &entry.name,
                PageRecord {
                    id: ctx.id,
                    last_revision: new,
                },
            )?;

            match service.revision_bundle(new) {
                Ok(bundle) => {
                    let content = bundle.record.content.as_deref().unwrap_or_default().to_string();
                    cache::append_revision(repo, bundle.id, bundle.latest, bundle.record)?;
                    workdir::write_page(&entry.path, &content)?;
                }
                Err(err) => {
                    tracing::warn!("could not refetch revision {new} for {}: {err}", entry.name);
                }
            }

            tracing::info!("committed {} as revision {new}", entry.name);
            Ok((CommitOutcome::Committed { new_revision: new }, false))
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Outcome of merging a single working file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The tool output was committed as a new revision.
    Merged { new_revision: RevisionId },
    /// The tool output matched the pulled head; nothing to submit.
    NoChange,
    /// The head moved again between the pull and the commit.
    Conflict {
        remote_head: RevisionId,
        last_known: RevisionId,
    },
    PermissionDenied { error: String },
    /// The merge tool exited nonzero; the local file was restored.
    ToolFailed { error: String },
    /// The file has no local edits, so there is nothing to merge.
    SkippedClean,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub path: PathBuf,
    pub name: PageName,
    pub outcome: MergeOutcome,
}

/// Reconcile conflicted files with the remote head through the configured
/// merge tool, then commit each merged result.
///
/// Per file: the local edit is set aside, the head is force-pulled, both
/// versions are handed to the tool, and its output replaces the working
/// file before a single-file commit.
pub fn merge_paths(
    repo: &Repo,
    service: &mut dyn ContentService,
    paths: &[PathBuf],
    options: &CommitOptions,
) -> Result<Vec<MergeReport>, SyncError> {
    let template = repo
        .config()
        .merge_tool
        .clone()
        .ok_or(SyncError::NoMergeTool)?;

    let entries = status::classify_paths(repo, paths)?;
    let mut reports = Vec::new();
    for entry in entries {
        let outcome = if entry.state == FileState::Modified {
            merge_one(repo, service, &entry, &template, options)?
        } else {
            MergeOutcome::SkippedClean
        };
        let abort = matches!(outcome, MergeOutcome::PermissionDenied { .. });
        reports.push(MergeReport {
            path: entry.path.clone(),
            name: entry.name.clone(),
            outcome,
        });
        if abort {
            break;
        }
    }
    Ok(reports)
}

fn merge_one(
    repo: &Repo,
    service: &mut dyn ContentService,
    entry: &status::StatusEntry,
    template: &str,
    options: &CommitOptions,
) -> Result<MergeOutcome, SyncError> {
    let path = &entry.path;
    let local = PathBuf::from(format!("{}.local", path.display()));
    let remote = PathBuf::from(format!("{}.remote", path.display()));

    std::fs::rename(path, &local).map_err(|e| io_err(path, e))?;

    let pulled = pull(repo, service, std::slice::from_ref(&entry.name), true)?;
    match pulled.first().map(|r| &r.outcome) {
        Some(PullOutcome::Pulled { .. }) => {}
        Some(PullOutcome::Missing) => {
            std::fs::rename(&local, path).map_err(|e| io_err(path, e))?;
            return Ok(MergeOutcome::Failed {
                error: "page no longer exists on the remote".to_string(),
            });
        }
        Some(PullOutcome::Failed { error }) => {
            std::fs::rename(&local, path).map_err(|e| io_err(path, e))?;
            return Ok(MergeOutcome::Failed {
                error: error.clone(),
            });
        }
        other => {
            std::fs::rename(&local, path).map_err(|e| io_err(path, e))?;
            return Ok(MergeOutcome::Failed {
                error: format!("unexpected pull result: {other:?}"),
            });
        }
    }

    std::fs::rename(path, &remote).map_err(|e| io_err(path, e))?;

    let command = render_tool_command(template, &local, &remote, path);
    tracing::debug!("running merge tool: {command}");
    let status = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .status()
        .map_err(|e| io_err(path, e))?;

    if !status.success() || !path.exists() {
        let _ = std::fs::remove_file(path);
        std::fs::rename(&local, path).map_err(|e| io_err(path, e))?;
        let _ = std::fs::remove_file(&remote);
        return Ok(MergeOutcome::ToolFailed {
            error: format!("merge tool exited with {status}"),
        });
    }

    std::fs::remove_file(&local).map_err(|e| io_err(&local, e))?;
    std::fs::remove_file(&remote).map_err(|e| io_err(&remote, e))?;

    let mut committed = commit_paths(repo, service, std::slice::from_ref(path), options)?;
    Ok(match committed.pop().map(|r| r.outcome) {
        Some(CommitOutcome::Committed { new_revision }) => MergeOutcome::Merged { new_revision },
        Some(CommitOutcome::NoChange) => MergeOutcome::NoChange,
        Some(CommitOutcome::Conflict {
            remote_head,
            last_known,
        }) => MergeOutcome::Conflict {
            remote_head,
            last_known,
        },
        Some(CommitOutcome::PermissionDenied { error }) => {
            MergeOutcome::PermissionDenied { error }
        }
        Some(CommitOutcome::Failed { error }) => MergeOutcome::Failed { error },
        // Tool output equals the pulled head, so the file classified clean.
        None => MergeOutcome::NoChange,
    })
}

fn render_tool_command(template: &str, local: &Path, remote: &Path, merged: &Path) -> String {
    template
        .replace("{local}", &shell_word(local))
        .replace("{remote}", &shell_word(remote))
        .replace("{merged}", &shell_word(merged))
}

fn shell_word(path: &Path) -> String {
    let raw = path.display().to_string();
    format!("'{}'", raw.replace('\'', r"'\''"))
}
