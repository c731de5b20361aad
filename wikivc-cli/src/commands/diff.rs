//! `wikivc diff [<file>...]`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use wikivc_sync::diff_paths;

/// Show unified diffs against the cached revisions. No files are written.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Files to diff. With none given, diff every working file.
    pub files: Vec<PathBuf>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let paths = super::target_paths(&repo, &self.files)?;

        for diff in diff_paths(&repo, &paths)? {
            print!("{}", diff.unified_diff);
        }
        Ok(())
    }
}
