use std::path::Path;

use anyhow::{Context, Result};
use slog::Logger;

use super::lock_repo;
use crate::builder::{create_mcommit, CommitRequest};
use crate::config::{UserConfig, PUBKEY_ENV};
use crate::git_gateway::GitGateway;
use crate::hash::short;
use crate::output;

/// Flags of `mgit commit`
pub struct CommitArgs {
    pub message: String,
    pub all: bool,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub pubkey: Option<String>,
}

pub fn run(repo_root: &Path, args: CommitArgs, log: &Logger) -> Result<()> {
    let user = UserConfig::load(log);

    let author_name = args
        .author_name
        .or_else(|| user.user.name.clone())
        .context("No author name: pass --author-name or set [user] name in the mgit user config")?;
    let author_email = args
        .author_email
        .or_else(|| user.user.email.clone())
        .context("No author email: pass --author-email or set [user] email in the mgit user config")?;
    let pubkey = args.pubkey.or_else(|| user.pubkey()).with_context(|| {
        format!(
            "No public key: pass --pubkey, set {} or set [user] pubkey in the mgit user config",
            PUBKEY_ENV
        )
    })?;

    let _lock = lock_repo(repo_root)?;

    if args.all {
        GitGateway::open(repo_root)?.stage_all()?;
    }

    let created = create_mcommit(
        repo_root,
        &CommitRequest {
            message: &args.message,
            author_name: &author_name,
            author_email: &author_email,
            pubkey: &pubkey,
        },
        log,
    )?;

    output::success(&format!(
        "Committed {} (git {})",
        output::print_hash(short(&created.mgit_hash)),
        short(&created.git_hash)
    ));
    Ok(())
}
