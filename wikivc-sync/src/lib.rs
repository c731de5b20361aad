//! # wikivc-sync
//!
//! Status classification and the pull / commit / merge engines.
//!
//! Call [`engine::pull`] to bring remote revisions into the cache and the
//! working tree, [`engine::commit_paths`] to push modified files back, and
//! [`engine::merge_paths`] to reconcile conflicted files through the
//! configured merge tool. [`status::classify_working_dir`] answers where
//! every working file stands.

pub mod diff;
pub mod engine;
pub mod error;
pub mod status;
pub mod workdir;

pub use diff::{diff_paths, diff_working_dir, FileDiff};
pub use engine::{
    commit_paths, merge_paths, pull, pull_all, pull_category, CommitOptions, CommitOutcome,
    CommitReport, MergeOutcome, MergeReport, PullOutcome, PullReport, COMMIT_COOLDOWN,
};
pub use error::SyncError;
pub use status::{classify_paths, classify_working_dir, FileState, StatusEntry};
