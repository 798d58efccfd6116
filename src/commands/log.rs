use std::path::Path;

use anyhow::Result;
use slog::Logger;

use super::show::print_commit;
use crate::inspect::log_mcommits;
use crate::output;

pub fn run(repo_root: &Path, max_count: Option<usize>, log: &Logger) -> Result<()> {
    let commits = log_mcommits(repo_root, max_count, log)?;

    if commits.is_empty() {
        output::info("No MGit commits reachable from HEAD");
        return Ok(());
    }

    for commit in &commits {
        print_commit(commit);
    }
    Ok(())
}
