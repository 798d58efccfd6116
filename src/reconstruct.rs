//! Reconstruction of MGit metadata from git history and a mapping table.
//!
//! Used after git objects and the mapping table arrive separately (clone,
//! sync). Every mapped commit whose git object is present gets its MGit
//! object rewritten, then branch refs and HEAD are translated from git.
//! Running it twice over unchanged inputs rewrites identical bytes.

use std::path::Path;

use slog::{debug, info, warn, Logger};

use crate::builder::mgit_hash_for_commit;
use crate::config::unmapped_parent_policy;
use crate::error::Result;
use crate::git_gateway::{GitGateway, HeadState};
use crate::mapping::{self, resolve_parent_hashes, MappingTable};
use crate::mgit_dir::MgitDir;
use crate::object_store::{write_object, MgitCommitObject};
use crate::ref_store::{self, MgitHead};

/// What a reconstruction pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructReport {
    pub objects_written: usize,
    /// Mapped git hashes with no git object yet
    pub missing_commits: Vec<String>,
    pub refs: RefTranslation,
}

/// What ref translation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefTranslation {
    pub branches_written: Vec<String>,
    /// Branches whose tip has no mapping
    pub branches_skipped: Vec<String>,
    pub head: Option<MgitHead>,
}

/// Rebuild `.mgit/objects`, `.mgit/refs/heads` and `.mgit/HEAD` for the
/// repository at `repo_root`.
///
/// Without a mapping table there is nothing to rebuild and this succeeds
/// without touching anything.
pub fn reconstruct(repo_root: &Path, log: &Logger) -> Result<ReconstructReport> {
    let dir = MgitDir::at(repo_root);
    if !mapping::exists(&dir) {
        info!(log, "no mapping table, nothing to reconstruct");
        return Ok(ReconstructReport::default());
    }

    let table = mapping::load(&dir)?;
    let policy = unmapped_parent_policy(&dir)?;
    let gateway = GitGateway::open(repo_root)?;
    dir.ensure_layout()?;

    let mut report = ReconstructReport::default();

    for entry in &table {
        let Some(info) = gateway.find_commit(&entry.git_hash)? else {
            debug!(log, "git object not present, skipping"; "git_hash" => entry.git_hash.as_str());
            report.missing_commits.push(entry.git_hash.clone());
            continue;
        };

        let parents = resolve_parent_hashes(&table, &info.parents, policy, log)?;

        let computed = mgit_hash_for_commit(&info, &parents, &entry.pubkey)?;
        if computed != entry.mgit_hash {
            warn!(log, "mapped MGit hash differs from recomputed hash";
                "git_hash" => entry.git_hash.as_str(),
                "mapped" => entry.mgit_hash.as_str(),
                "computed" => computed.as_str());
        }

        let object = MgitCommitObject::from_commit(&info, &entry.mgit_hash, parents, &entry.pubkey);
        write_object(&dir, &object, log)?;
        report.objects_written += 1;
    }

    report.refs = translate_refs(&gateway, &dir, &table, log)?;

    info!(log, "reconstruction complete";
        "objects" => report.objects_written,
        "missing" => report.missing_commits.len(),
        "branches" => report.refs.branches_written.len());
    Ok(report)
}

/// Mirror git's local branches and HEAD into the MGit ref namespace.
///
/// Branches whose tip is unmapped are skipped. A symbolic HEAD is mirrored
/// symbolically; a detached HEAD is translated through the table and left
/// unwritten when unmapped.
pub fn translate_refs(
    gateway: &GitGateway,
    dir: &MgitDir,
    table: &MappingTable,
    log: &Logger,
) -> Result<RefTranslation> {
    let mut result = RefTranslation::default();

    for (branch, target) in gateway.list_branches()? {
        match table.find_by_git_hash(&target) {
            Some(entry) => {
                ref_store::update_ref(dir, &ref_store::branch_ref(&branch), &entry.mgit_hash)?;
                debug!(log, "wrote MGit branch"; "branch" => branch.as_str(), "mgit_hash" => entry.mgit_hash.as_str());
                result.branches_written.push(branch);
            }
            None => {
                warn!(log, "branch tip has no MGit mapping, skipping"; "branch" => branch.as_str(), "git_hash" => target.as_str());
                result.branches_skipped.push(branch);
            }
        }
    }

    result.head = match gateway.head_state()? {
        HeadState::Symbolic(target) => Some(MgitHead::Symbolic(target)),
        HeadState::Detached(git_hash) => match table.find_by_git_hash(&git_hash) {
            Some(entry) => Some(MgitHead::Detached(entry.mgit_hash.clone())),
            None => {
                warn!(log, "detached HEAD has no MGit mapping, leaving MGit HEAD unwritten"; "git_hash" => git_hash.as_str());
                None
            }
        },
        HeadState::Missing => None,
    };

    if let Some(head) = &result.head {
        ref_store::write_head(dir, head)?;
    }

    Ok(result)
}
