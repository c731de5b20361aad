//! `wikivc pullcat <category> [--force]`

use anyhow::Result;
use clap::Args;

use wikivc_sync::pull_category;

/// Pull every page in a remote category.
#[derive(Args, Debug)]
pub struct PullcatArgs {
    /// Category name, with or without the `Category:` prefix.
    pub category: String,

    /// Overwrite files with local edits.
    #[arg(long, short = 'f')]
    pub force: bool,
}

impl PullcatArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let mut client = super::connect(&repo)?;

        let reports = pull_category(&repo, &mut client, &self.category, self.force)?;
        super::print_pull_reports(&reports);
        Ok(())
    }
}
