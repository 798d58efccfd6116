use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slog::Logger;

use super::lock_repo;
use super::reconstruct::print_report;
use crate::mapping::{self, import_payload};
use crate::mgit_dir::MgitDir;
use crate::output;
use crate::reconstruct::reconstruct;

/// Print the mapping table, one entry per line
pub fn list(repo_root: &Path) -> Result<()> {
    let table = mapping::load(&MgitDir::at(repo_root))?;

    if table.is_empty() {
        output::info("No hash mappings");
        return Ok(());
    }

    for entry in &table {
        println!("{} {} {}", entry.git_hash, output::print_hash(&entry.mgit_hash), entry.pubkey);
    }
    Ok(())
}

/// Merge a transferred mapping table, then rebuild `.mgit/` from it
pub fn sync_metadata(repo_root: &Path, payload_path: &Path, log: &Logger) -> Result<()> {
    let payload = fs::read(payload_path)
        .with_context(|| format!("Failed to read mapping payload {}", payload_path.display()))?;

    let _lock = lock_repo(repo_root)?;
    let dir = MgitDir::at(repo_root);
    let summary = import_payload(&dir, &payload, payload_path, log)?;
    output::success(&format!(
        "Imported {} new and {} updated mappings",
        output::print_count(summary.inserted),
        output::print_count(summary.replaced)
    ));

    let report = reconstruct(repo_root, log)?;
    print_report(&report);
    Ok(())
}
