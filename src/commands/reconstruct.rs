use std::path::Path;

use anyhow::Result;
use slog::Logger;

use super::lock_repo;
use crate::hash::short;
use crate::output;
use crate::reconstruct::{reconstruct, ReconstructReport};
use crate::ref_store::MgitHead;

pub fn run(repo_root: &Path, log: &Logger) -> Result<()> {
    let _lock = lock_repo(repo_root)?;
    let report = reconstruct(repo_root, log)?;
    print_report(&report);
    Ok(())
}

pub(crate) fn print_report(report: &ReconstructReport) {
    output::success(&format!(
        "Reconstructed {} MGit objects",
        output::print_count(report.objects_written)
    ));

    if !report.missing_commits.is_empty() {
        output::warning(&format!(
            "{} mapped commits are not in the git object database",
            output::print_count(report.missing_commits.len())
        ));
        for hash in &report.missing_commits {
            output::bullet(short(hash));
        }
    }

    for branch in &report.refs.branches_written {
        output::bullet(&format!("refs/heads/{}", branch));
    }
    for branch in &report.refs.branches_skipped {
        output::warning(&format!("Skipped branch '{}' (tip has no MGit mapping)", branch));
    }

    match &report.refs.head {
        Some(MgitHead::Symbolic(target)) => output::info(&format!("HEAD -> {}", target)),
        Some(MgitHead::Detached(hash)) => output::info(&format!("HEAD detached at {}", short(hash))),
        None => {}
    }
}
