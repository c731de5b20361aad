//! `wikivc status` — where every working file stands.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use wikivc_sync::{classify_working_dir, FileState};

/// List working files that differ from their cached revisions.
///
/// One row per file, git-style: `M` for locally modified, `?` for files
/// the index does not know. Clean files print nothing.
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let cwd = std::env::current_dir().context("could not determine the current directory")?;

        for entry in classify_working_dir(&repo)? {
            let shown = display_path(&entry.path, &cwd, repo.root());
            match entry.state {
                FileState::Clean => {}
                FileState::Modified => println!("{} {shown}", "M".red().bold()),
                FileState::Untracked => println!("{} {shown}", "?".bright_black().bold()),
            }
        }
        Ok(())
    }
}

fn display_path(path: &Path, cwd: &Path, root: &Path) -> String {
    path.strip_prefix(cwd)
        .or_else(|_| path.strip_prefix(root))
        .unwrap_or(path)
        .display()
        .to_string()
}
