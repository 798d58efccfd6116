use std::path::Path;

use anyhow::{Context, Result};
use slog::Logger;

use super::lock_repo;
use crate::git_gateway::GitGateway;
use crate::mgit_dir::{self, MgitDir};
use crate::output;

const DEFAULT_BRANCH: &str = "main";

/// Initialize `.mgit/` next to an existing git repository
pub fn run(repo_root: &Path, name: Option<&str>, log: &Logger) -> Result<()> {
    let gateway = GitGateway::open(repo_root).context("mgit init must run inside a git repository")?;
    let head_branch = gateway.head_branch()?.unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    let dir = MgitDir::at(repo_root);
    let already = dir.is_initialized();
    let _lock = lock_repo(repo_root)?;
    let config = mgit_dir::init(&dir, &head_branch, name, log)?;

    if already {
        output::info(&format!(
            "MGit is already initialized for '{}' ({})",
            config.repository.name, config.repository.id
        ));
    } else {
        output::success(&format!(
            "Initialized MGit repository '{}' in {}",
            config.repository.name,
            dir.path().display()
        ));
    }
    Ok(())
}
