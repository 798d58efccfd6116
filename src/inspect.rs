//! Read-side MGit operations: show, log and hash verification.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use slog::{warn, Logger};

use crate::builder::mgit_hash_for_commit;
use crate::config::unmapped_parent_policy;
use crate::error::{MgitError, Result};
use crate::git_gateway::GitGateway;
use crate::hash::is_full_hash;
use crate::mapping::{self, resolve_parent_hashes, MappingTable};
use crate::mgit_dir::MgitDir;
use crate::object_store::{read_object, MgitCommitObject};
use crate::ref_store;

/// Resolve `commit_ref` and return its MGit commit.
///
/// `commit_ref` may be `HEAD`, an MGit branch, a full MGit or git hash, or any
/// git revision. The stored object is returned when materialized; otherwise
/// it is built from the git commit. An unmapped commit is only shown when
/// `pubkey` is supplied, in which case its MGit hash is computed for that key.
pub fn show_mcommit(repo_root: &Path, commit_ref: &str, pubkey: Option<&str>, log: &Logger) -> Result<MgitCommitObject> {
    let dir = MgitDir::at(repo_root);
    let table = mapping::load(&dir)?;

    if let Some(mgit_hash) = resolve_mgit_ref(&dir, commit_ref)? {
        return load_by_mgit_hash(repo_root, &dir, &table, &mgit_hash, log);
    }

    if is_full_hash(commit_ref) && table.find_by_mgit_hash(commit_ref).is_some() {
        return load_by_mgit_hash(repo_root, &dir, &table, commit_ref, log);
    }

    let gateway = GitGateway::open(repo_root)?;
    let git_hash = gateway
        .resolve_revision(commit_ref)?
        .ok_or_else(|| MgitError::not_found(format!("commit '{}'", commit_ref)))?;

    if let Some(entry) = table.find_by_git_hash(&git_hash) {
        return load_by_mgit_hash(repo_root, &dir, &table, &entry.mgit_hash, log);
    }

    let pubkey = pubkey.ok_or_else(|| {
        MgitError::not_found(format!("MGit mapping for git commit {} (pass a pubkey to compute one)", git_hash))
    })?;
    build_from_git(&gateway, &dir, &table, &git_hash, None, pubkey, log)
}

/// `HEAD` or an MGit branch name, resolved through `.mgit/`
fn resolve_mgit_ref(dir: &MgitDir, commit_ref: &str) -> Result<Option<String>> {
    if commit_ref == "HEAD" {
        return ref_store::resolve_head(dir);
    }
    match ref_store::read_ref(dir, &ref_store::branch_ref(commit_ref)) {
        Ok(hash) => Ok(hash),
        Err(MgitError::InvalidRef { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn load_by_mgit_hash(
    repo_root: &Path,
    dir: &MgitDir,
    table: &MappingTable,
    mgit_hash: &str,
    log: &Logger,
) -> Result<MgitCommitObject> {
    if is_full_hash(mgit_hash) {
        if let Some(object) = read_object(dir, mgit_hash)? {
            return Ok(object);
        }
    }

    let entry = table
        .find_by_mgit_hash(mgit_hash)
        .ok_or_else(|| MgitError::not_found(format!("MGit commit {}", mgit_hash)))?;
    let gateway = GitGateway::open(repo_root)?;
    build_from_git(
        &gateway,
        dir,
        table,
        &entry.git_hash,
        Some(&entry.mgit_hash),
        &entry.pubkey,
        log,
    )
}

fn build_from_git(
    gateway: &GitGateway,
    dir: &MgitDir,
    table: &MappingTable,
    git_hash: &str,
    mgit_hash: Option<&str>,
    pubkey: &str,
    log: &Logger,
) -> Result<MgitCommitObject> {
    let info = gateway
        .find_commit(git_hash)?
        .ok_or_else(|| MgitError::not_found(format!("git commit {}", git_hash)))?;
    let parents = resolve_parent_hashes(table, &info.parents, unmapped_parent_policy(dir)?, log)?;
    let mgit_hash = match mgit_hash {
        Some(hash) => hash.to_string(),
        None => mgit_hash_for_commit(&info, &parents, pubkey)?,
    };
    Ok(MgitCommitObject::from_commit(&info, &mgit_hash, parents, pubkey))
}

/// MGit history reachable from HEAD, newest first by committer time.
///
/// Walks `parent_hashes` through the object store; a parent without a stored
/// object (unmapped or not yet reconstructed) ends that line of history.
pub fn log_mcommits(repo_root: &Path, max_count: Option<usize>, log: &Logger) -> Result<Vec<MgitCommitObject>> {
    let dir = MgitDir::at(repo_root);
    let Some(head) = ref_store::resolve_head(&dir)? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([head]);
    let mut commits = Vec::new();

    while let Some(hash) = queue.pop_front() {
        if !seen.insert(hash.clone()) {
            continue;
        }
        if !is_full_hash(&hash) {
            warn!(log, "skipping malformed hash in history"; "hash" => hash.as_str());
            continue;
        }
        match read_object(&dir, &hash)? {
            Some(object) => {
                queue.extend(object.parent_hashes.iter().cloned());
                commits.push(object);
            }
            None => warn!(log, "MGit object not found, history truncated"; "mgit_hash" => hash.as_str()),
        }
    }

    // Stable sort keeps walk order for equal timestamps
    commits.sort_by_key(|c| std::cmp::Reverse(c.committer.timestamp().unwrap_or(i64::MIN)));
    if let Some(max) = max_count {
        commits.truncate(max);
    }
    Ok(commits)
}

/// Result of recomputing a commit's MGit hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCheck {
    pub git_hash: String,
    pub computed: String,
    pub mapped: Option<String>,
}

impl HashCheck {
    pub fn matches(&self) -> bool {
        self.mapped.as_deref() == Some(self.computed.as_str())
    }
}

/// Recompute the MGit hash of an existing git commit for `pubkey` and compare
/// it with the mapping table.
pub fn test_mcommit_hash(repo_root: &Path, git_ref: &str, pubkey: &str, log: &Logger) -> Result<HashCheck> {
    let dir = MgitDir::at(repo_root);
    let table = mapping::load(&dir)?;
    let gateway = GitGateway::open(repo_root)?;

    let git_hash = gateway
        .resolve_revision(git_ref)?
        .ok_or_else(|| MgitError::not_found(format!("git commit '{}'", git_ref)))?;
    let info = gateway
        .find_commit(&git_hash)?
        .ok_or_else(|| MgitError::not_found(format!("git commit {}", git_hash)))?;

    let parents = resolve_parent_hashes(&table, &info.parents, unmapped_parent_policy(&dir)?, log)?;
    let computed = mgit_hash_for_commit(&info, &parents, pubkey)?;

    Ok(HashCheck {
        mapped: table.find_by_git_hash(&git_hash).map(|m| m.mgit_hash.clone()),
        git_hash,
        computed,
    })
}
