//! Subcommand implementations.

pub mod commit;
pub mod diff;
pub mod init;
pub mod login;
pub mod logout;
pub mod merge;
pub mod pull;
pub mod pullcat;
pub mod status;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use wikivc_core::Repo;
use wikivc_remote::Client;
use wikivc_sync::{workdir, PullOutcome, PullReport};

/// Open the repository enclosing the current directory.
pub(crate) fn open_repo() -> Result<Repo> {
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    Ok(Repo::discover(&cwd)?)
}

/// Connect a client to the repository's remote, reusing any stored session.
pub(crate) fn connect(repo: &Repo) -> Result<Client> {
    Ok(Client::new(
        repo.config().remote.api_url.clone(),
        repo.session_path(),
    )?)
}

/// Explicit file arguments resolved against the current directory, or every
/// working file when none were given. Arguments without a `.wiki` extension
/// are dropped.
pub(crate) fn target_paths(repo: &Repo, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Ok(workdir::scan(repo)?);
    }
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    let resolved: Vec<PathBuf> = files
        .iter()
        .map(|file| {
            if file.is_absolute() {
                file.clone()
            } else {
                cwd.join(file)
            }
        })
        .collect();
    Ok(workdir::wiki_paths_only(&resolved))
}

pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush().context("could not flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("could not read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub(crate) fn print_pull_reports(reports: &[PullReport]) {
    if reports.is_empty() {
        println!("nothing to pull");
        return;
    }

    let mut pulled = 0usize;
    for report in reports {
        match &report.outcome {
            PullOutcome::Pulled { revision } => {
                pulled += 1;
                println!("{} {} (r{revision})", "pulled".green().bold(), report.name);
            }
            PullOutcome::Unchanged => {
                println!("{} {}", "unchanged".bright_black(), report.name);
            }
            PullOutcome::SkippedModified => {
                println!(
                    "{} {} (locally modified; use --force to overwrite)",
                    "skipped".yellow().bold(),
                    report.name
                );
            }
            PullOutcome::Missing => {
                println!("{} {} (no such page)", "missing".red().bold(), report.name);
            }
            PullOutcome::Failed { error } => {
                println!("{} {}: {error}", "failed".red().bold(), report.name);
            }
        }
    }
    println!("{pulled} of {} page(s) pulled", reports.len());
}
