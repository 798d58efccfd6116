use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

mod builder;
mod commands;
mod config;
mod error;
mod git_gateway;
mod hash;
mod inspect;
mod logging;
mod mapping;
mod mgit_dir;
mod object_store;
mod output;
mod reconstruct;
mod ref_store;
#[cfg(test)]
mod test_support;

#[derive(Parser)]
#[command(
    name = "mgit",
    about = "MGit: git commits bound to public keys",
    long_about = None,
    version,
    disable_help_subcommand = true,
    help_template = "\
{about}

{usage-heading} {usage}

Get Started:
  init           Initialize MGit metadata in a git repository
  commit         Commit the index and record its MGit hash

Inspect:
  show           Show an MGit commit
  log            Show MGit history from HEAD
  test-hash      Recompute the MGit hash of a git commit
  mappings       List git to MGit hash mappings

Repair:
  reconstruct    Rebuild .mgit objects and refs from the mapping table
  sync-metadata  Import a mapping payload, then reconstruct

Setup:
  completion     Generate shell completions

Options:
  -C <PATH>      Run as if started in PATH
  -v, --verbose  Show debug logging
  -h, --help     Print help
  -V, --version  Print version

Run '{bin} <command> --help' for more information on a command.
"
)]
pub struct Cli {
    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Run as if started in PATH
    #[arg(short = 'C', value_name = "PATH", global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(next_help_heading = "Get Started")]
    /// Initialize MGit metadata in a git repository
    Init {
        /// Repository name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Commit the index and record its MGit hash
    #[command(after_help = "\
Examples:
  commit -m \"Intake notes\"             Commit staged changes
  commit -am \"Intake notes\"            Stage all changes and commit
  commit -m \"x\" --pubkey npub1...      Bind the commit to a specific key")]
    Commit {
        /// Commit message
        #[arg(short = 'm', long)]
        message: String,
        /// Stage all changes
        #[arg(short = 'a', long)]
        all: bool,
        /// Author name (defaults to user config)
        #[arg(long)]
        author_name: Option<String>,
        /// Author email (defaults to user config)
        #[arg(long)]
        author_email: Option<String>,
        /// Public key (defaults to MGIT_PUBKEY, then user config)
        #[arg(long)]
        pubkey: Option<String>,
    },

    #[command(next_help_heading = "Inspect")]
    /// Show an MGit commit
    Show {
        /// HEAD, a branch, an MGit hash or any git revision
        #[arg(default_value = "HEAD")]
        commit: String,
        /// Compute the MGit hash of an unmapped commit for this key
        #[arg(long)]
        pubkey: Option<String>,
        /// Print the commit object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show MGit history from HEAD
    Log {
        /// Limit the number of commits
        #[arg(short = 'n', long = "max-count")]
        max_count: Option<usize>,
    },
    /// Recompute the MGit hash of a git commit
    TestHash {
        /// Git revision
        commit: String,
        /// Public key to hash with
        #[arg(long)]
        pubkey: String,
    },
    /// List git to MGit hash mappings
    Mappings,

    #[command(next_help_heading = "Repair")]
    /// Rebuild .mgit objects and refs from the mapping table
    Reconstruct,
    /// Import a mapping payload, then reconstruct
    SyncMetadata {
        /// Path to a mapping table JSON file
        payload: PathBuf,
    },

    #[command(next_help_heading = "Setup")]
    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let log = logging::terminal_logger(cli.verbose);

    let result = commands::repo_root(cli.repo.as_deref()).and_then(|root| match cli.command {
        Commands::Init { name } => commands::init::run(&root, name.as_deref(), &log),
        Commands::Commit {
            message,
            all,
            author_name,
            author_email,
            pubkey,
        } => commands::commit::run(
            &root,
            commands::commit::CommitArgs {
                message,
                all,
                author_name,
                author_email,
                pubkey,
            },
            &log,
        ),
        Commands::Show { commit, pubkey, json } => commands::show::run(&root, &commit, pubkey.as_deref(), json, &log),
        Commands::Log { max_count } => commands::log::run(&root, max_count, &log),
        Commands::TestHash { commit, pubkey } => commands::hash::run(&root, &commit, &pubkey, &log),
        Commands::Mappings => commands::mappings::list(&root),
        Commands::Reconstruct => commands::reconstruct::run(&root, &log),
        Commands::SyncMetadata { payload } => commands::mappings::sync_metadata(&root, &payload, &log),
        Commands::Completion { shell } => commands::completion::run(shell),
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
