//! wikivc — track wiki pages as local files and sync them both ways.
//!
//! # Usage
//!
//! ```text
//! wikivc init <api-url>
//! wikivc login [--user <name>]
//! wikivc logout
//! wikivc pull [<page|file>...] [--force]
//! wikivc pullcat <category> [--force]
//! wikivc status                          (alias: st)
//! wikivc diff [<file>...]
//! wikivc commit [<file>...] [-m <summary>] [--bot]   (alias: ci)
//! wikivc merge [<file>...] [-m <summary>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    commit::CommitArgs, diff::DiffArgs, init::InitArgs, login::LoginArgs, logout::LogoutArgs,
    merge::MergeArgs, pull::PullArgs, pullcat::PullcatArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "wikivc",
    version,
    about = "Work on wiki pages as local .wiki files",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn the current directory into a checkout of a remote wiki.
    Init(InitArgs),

    /// Log in to the remote and store the session cookie.
    Login(LoginArgs),

    /// Drop the stored session cookie.
    Logout(LogoutArgs),

    /// Fetch pages into the revision cache and the working tree.
    Pull(PullArgs),

    /// Pull every page in a remote category.
    Pullcat(PullcatArgs),

    /// List working files that differ from their cached revisions.
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Show unified diffs against the cached revisions.
    Diff(DiffArgs),

    /// Push modified files back as new revisions.
    #[command(visible_alias = "ci")]
    Commit(CommitArgs),

    /// Reconcile conflicted files through the configured merge tool.
    Merge(MergeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();

    // Usage problems exit 1; help and version keep exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().ok();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Login(args) => args.run(),
        Commands::Logout(args) => args.run(),
        Commands::Pull(args) => args.run(),
        Commands::Pullcat(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Commit(args) => args.run(),
        Commands::Merge(args) => args.run(),
    }
}
