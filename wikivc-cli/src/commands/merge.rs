//! `wikivc merge [<file>...] [-m <summary>]`

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use wikivc_sync::{merge_paths, CommitOptions, MergeOutcome, COMMIT_COOLDOWN};

/// Reconcile conflicted files through the configured merge tool.
///
/// Needs `merge_tool` in `.wikivc/config.yaml`, a shell template with
/// `{local}`, `{remote}` and `{merged}` placeholders.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Files to merge. With none given, consider every working file.
    pub files: Vec<PathBuf>,

    /// Edit summary recorded with each merged revision.
    #[arg(long, short = 'm', default_value = "merge")]
    pub message: String,
}

impl MergeArgs {
    pub fn run(self) -> Result<()> {
        let repo = super::open_repo()?;
        let paths = super::target_paths(&repo, &self.files)?;

        let mut client = super::connect(&repo)?;
        let options = CommitOptions {
            summary: self.message,
            bot: false,
            cooldown: COMMIT_COOLDOWN,
        };
        let reports = merge_paths(&repo, &mut client, &paths, &options)?;
        if reports.is_empty() {
            println!("nothing to merge");
            return Ok(());
        }

        let mut denied = false;
        for report in &reports {
            match &report.outcome {
                MergeOutcome::Merged { new_revision } => {
                    println!(
                        "{} {} (r{new_revision})",
                        "merged".green().bold(),
                        report.name
                    );
                }
                MergeOutcome::NoChange => {
                    println!(
                        "{} {} (already matches the remote)",
                        "no change".yellow().bold(),
                        report.name
                    );
                }
                MergeOutcome::Conflict {
                    remote_head,
                    last_known,
                } => {
                    println!(
                        "{} {} (remote moved to r{remote_head} past r{last_known}; run merge again)",
                        "conflict".red().bold(),
                        report.name
                    );
                }
                MergeOutcome::PermissionDenied { error } => {
                    println!("{} {}: {error}", "denied".red().bold(), report.name);
                    denied = true;
                }
                MergeOutcome::ToolFailed { error } => {
                    println!(
                        "{} {}: {error} (local file restored)",
                        "tool failed".red().bold(),
                        report.name
                    );
                }
                MergeOutcome::SkippedClean => {
                    println!("{} {}", "clean".bright_black(), report.name);
                }
                MergeOutcome::Failed { error } => {
                    println!("{} {}: {error}", "failed".red().bold(), report.name);
                }
            }
        }

        if denied {
            bail!("the remote refused the edit; remaining files were not merged");
        }
        Ok(())
    }
}
