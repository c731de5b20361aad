//! `wikivc login [--user <name>]`

use anyhow::{Context, Result};
use clap::Args;

/// Log in to the remote and store the session cookie.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account name; prompted for when omitted.
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

impl LoginArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;

        let username = match self.user {
            Some(user) => user,
            None => super::prompt_line("username: ")?,
        };
        let password =
            rpassword::prompt_password("password: ").context("could not read the password")?;

        let mut client = super::connect(&repo)?;
        let logged_in = client.log_in(username.trim(), &password)?;
        println!("logged in as {logged_in}");
        Ok(())
    }
}
