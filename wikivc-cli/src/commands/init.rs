//! `wikivc init <api-url>`

use anyhow::{Context, Result};
use clap::Args;

use wikivc_core::Repo;

/// Turn the current directory into a checkout of a remote wiki.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Full URL of the remote's api.php endpoint
    /// (e.g. "https://wiki.example.org/w/api.php").
    pub api_url: String,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let cwd = std::env::current_dir().context("could not determine the current directory")?;
        let repo = Repo::init_at(&cwd, &self.api_url)?;

        println!("✓ Initialized checkout of {}", self.api_url);
        println!("  Control data lives in {}", repo.control_dir().display());
        println!("  Run 'wikivc login', then 'wikivc pull <page>' to start.");
        Ok(())
    }
}
