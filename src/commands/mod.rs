//! CLI commands. Each command wraps one engine operation and prints its result.

pub mod commit;
pub mod completion;
pub mod hash;
pub mod init;
pub mod log;
pub mod mappings;
pub mod reconstruct;
pub mod show;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::mgit_dir::MgitDir;
use crate::ref_store::RepoLockGuard;

/// Working directory of the repository the command runs against.
///
/// `-C <path>` wins over the current directory.
pub fn repo_root(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Take the repository lock for a command that writes `.mgit/`.
///
/// Fails fast instead of waiting when another mgit process holds it.
fn lock_repo(repo_root: &Path) -> Result<RepoLockGuard> {
    let dir = MgitDir::at(repo_root);
    RepoLockGuard::try_acquire(&dir)?
        .with_context(|| format!("Another mgit command is running in {}", repo_root.display()))
}
