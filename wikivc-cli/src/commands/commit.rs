//! `wikivc commit [<file>...] [-m <summary>] [--bot]`

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use wikivc_sync::{
    classify_paths, commit_paths, CommitOptions, CommitOutcome, FileState, COMMIT_COOLDOWN,
};

/// Push modified files back as new revisions.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Files to commit. With none given, commit every modified file.
    pub files: Vec<PathBuf>,

    /// Edit summary recorded with each revision; prompted for when omitted.
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Mark the edits as bot edits.
    #[arg(long, short = 'b')]
    pub bot: bool,
}

impl CommitArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let paths = super::target_paths(&repo, &self.files)?;

        let modified: Vec<_> = classify_paths(&repo, &paths)?
            .into_iter()
            .filter(|entry| entry.state == FileState::Modified)
            .collect();
        if modified.is_empty() {
            println!("nothing to commit");
            return Ok(());
        }
        for entry in &modified {
            println!("{} {}", "M".red().bold(), entry.name);
        }

        let summary = match self.message {
            Some(message) => message,
            None => super::prompt_line("summary: ")?,
        };

        let mut client = super::connect(&repo)?;
        let options = CommitOptions {
            summary,
            bot: self.bot,
            cooldown: COMMIT_COOLDOWN,
        };
        let reports = commit_paths(&repo, &mut client, &paths, &options)?;

        let mut denied = false;
        for report in &reports {
            match &report.outcome {
                CommitOutcome::Committed { new_revision } => {
                    println!(
                        "{} {} (r{new_revision})",
                        "committed".green().bold(),
                        report.name
                    );
                }
                CommitOutcome::NoChange => {
                    println!(
                        "{} {} (the server stored nothing)",
                        "no change".yellow().bold(),
                        report.name
                    );
                }
                CommitOutcome::Conflict {
                    remote_head,
                    last_known,
                } => {
                    println!(
                        "{} {} (remote is at r{remote_head}, local base is r{last_known}; pull or merge first)",
                        "conflict".red().bold(),
                        report.name
                    );
                }
                CommitOutcome::PermissionDenied { error } => {
                    println!("{} {}: {error}", "denied".red().bold(), report.name);
                    denied = true;
                }
                CommitOutcome::Failed { error } => {
                    println!("{} {}: {error}", "failed".red().bold(), report.name);
                }
            }
        }

        if denied {
            bail!("the remote refused the edit; remaining files were not committed");
        }
        Ok(())
    }
}
