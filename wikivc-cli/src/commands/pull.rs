//! `wikivc pull [<page|file>...] [--force]`

use anyhow::Result;
use clap::Args;

use wikivc_core::PageName;
use wikivc_sync::{pull, pull_all, workdir};

/// Fetch pages into the revision cache and the working tree.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Page names or `.wiki` paths. With none given, refresh every
    /// working file.
    pub names: Vec<String>,

    /// Overwrite files with local edits.
    #[arg(long, short = 'f')]
    pub force: bool,
}

impl PullArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let mut client = super::connect(&repo)?;

        let reports = if self.names.is_empty() {
            pull_all(&repo, &mut client, self.force)?
        } else {
            let names: Vec<PageName> = self
                .names
                .iter()
                .map(|arg| workdir::resolve_name(arg))
                .collect();
            pull(&repo, &mut client, &names, self.force)?
        };

        super::print_pull_reports(&reports);
        Ok(())
    }
}
