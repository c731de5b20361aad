//! `wikivc logout`

use std::io::ErrorKind;

use anyhow::{Context, Result};
use clap::Args;

/// Drop the stored session cookie.
///
/// Purely local: the session file is removed, nothing is sent to the
/// remote.
#[derive(Args, Debug)]
pub struct LogoutArgs {}

impl LogoutArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let path = repo.session_path();
        match std::fs::remove_file(&path) {
            Ok(()) => println!("logged out"),
            Err(err) if err.kind() == ErrorKind::NotFound => println!("no stored session"),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("could not remove {}", path.display()))
            }
        }
        Ok(())
    }
}
