use std::path::Path;

use anyhow::Result;
use slog::Logger;

use crate::inspect::test_mcommit_hash;
use crate::output;

/// Recompute a commit's MGit hash and compare it with the recorded mapping
pub fn run(repo_root: &Path, git_ref: &str, pubkey: &str, log: &Logger) -> Result<()> {
    let check = test_mcommit_hash(repo_root, git_ref, pubkey, log)?;

    println!("Git hash:      {}", check.git_hash);
    println!("Computed MGit: {}", output::print_hash(&check.computed));
    match &check.mapped {
        Some(mapped) => println!("Mapped MGit:   {}", output::print_hash(mapped)),
        None => println!("Mapped MGit:   (none)"),
    }

    match (&check.mapped, check.matches()) {
        (Some(_), true) => output::success("Computed hash matches the mapping"),
        (Some(_), false) => output::warning("Computed hash differs from the mapping"),
        (None, _) => output::info("Commit has no MGit mapping"),
    }
    Ok(())
}
