//! MGit commit creation.
//!
//! A commit is created in git first. Once git has it, the commit is
//! authoritative: the mapping, object and refs that follow are derived data a
//! later reconstruction pass can regenerate if this process is interrupted.

use std::path::Path;

use chrono::Utc;
use slog::{info, Logger};

use crate::config::unmapped_parent_policy;
use crate::error::{MgitError, Result};
use crate::git_gateway::{CommitInfo, GitGateway};
use crate::hash::{compute_mgit_hash, MgitHashInput, SignatureLine};
use crate::mapping::{self, resolve_parent_hashes, HashMapping};
use crate::mgit_dir::MgitDir;
use crate::object_store::{write_object, MgitCommitObject};
use crate::reconstruct::translate_refs;

/// Inputs for a new MGit commit
#[derive(Debug, Clone)]
pub struct CommitRequest<'a> {
    pub message: &'a str,
    pub author_name: &'a str,
    pub author_email: &'a str,
    pub pubkey: &'a str,
}

/// Hashes of a freshly created commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCommit {
    pub git_hash: String,
    pub mgit_hash: String,
}

/// MGit hash of a git commit, given its parents' MGit hashes.
pub fn mgit_hash_for_commit(info: &CommitInfo, parent_mgit_hashes: &[String], pubkey: &str) -> Result<String> {
    compute_mgit_hash(&MgitHashInput {
        tree: &info.tree,
        parents: parent_mgit_hashes,
        author: SignatureLine {
            name: &info.author.name,
            email: &info.author.email,
            timestamp: info.author.time,
        },
        committer: SignatureLine {
            name: &info.committer.name,
            email: &info.committer.email,
            timestamp: info.committer.time,
        },
        message: &info.raw_message,
        pubkey,
    })
}

/// Commit the index of the repository at `repo_root` and bind it to `pubkey`.
///
/// The mapping table and parent policy are checked before git is touched, so
/// a corrupt table or a rejected unmapped parent leaves the repository as it was.
pub fn create_mcommit(repo_root: &Path, request: &CommitRequest<'_>, log: &Logger) -> Result<CreatedCommit> {
    let gateway = GitGateway::open(repo_root)?;
    let dir = MgitDir::at(repo_root);
    dir.ensure_layout()?;

    let policy = unmapped_parent_policy(&dir)?;
    let table = mapping::load(&dir)?;

    let parents = gateway.pending_parents()?;
    let parent_mgit_hashes = resolve_parent_hashes(&table, &parents, policy, log)?;

    let git_hash = gateway.create_commit(
        request.message,
        request.author_name,
        request.author_email,
        Utc::now().timestamp(),
        &parents,
    )?;

    let info = gateway
        .find_commit(&git_hash)?
        .ok_or_else(|| MgitError::not_found(format!("new commit {}", git_hash)))?;
    let mgit_hash = mgit_hash_for_commit(&info, &parent_mgit_hashes, request.pubkey)?;

    mapping::upsert(
        &dir,
        HashMapping {
            git_hash: git_hash.clone(),
            mgit_hash: mgit_hash.clone(),
            pubkey: request.pubkey.to_string(),
        },
        log,
    )?;
    let table = mapping::load(&dir)?;

    let object = MgitCommitObject::from_commit(&info, &mgit_hash, parent_mgit_hashes, request.pubkey);
    write_object(&dir, &object, log)?;
    translate_refs(&gateway, &dir, &table, log)?;

    info!(log, "created MGit commit"; "git_hash" => git_hash.as_str(), "mgit_hash" => mgit_hash.as_str());
    Ok(CreatedCommit { git_hash, mgit_hash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;
    use crate::object_store::read_object;
    use crate::ref_store;
    use crate::test_support::{commit_file, discard_logger, init_test_repo};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn request<'a>(message: &'a str, pubkey: &'a str) -> CommitRequest<'a> {
        CommitRequest {
            message,
            author_name: "Dr. Bob",
            author_email: "bob@clinic.org",
            pubkey,
        }
    }

    #[test]
    fn test_root_commit_records_mapping_object_and_refs() -> Result<()> {
        let dir = tempdir()?;
        init_test_repo(dir.path())?;
        fs::write(dir.path().join("visit.txt"), "pulse 72")?;
        GitGateway::open(dir.path())?.stage_all()?;
        let log = discard_logger();

        let created = create_mcommit(dir.path(), &request("intake", "npub1bob"), &log)?;

        let mgit = MgitDir::at(dir.path());
        let table = mapping::load(&mgit)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].git_hash, created.git_hash);
        assert_eq!(table.entries()[0].mgit_hash, created.mgit_hash);
        assert_eq!(table.entries()[0].pubkey, "npub1bob");

        let info = GitGateway::open(dir.path())?
            .find_commit(&created.git_hash)?
            .expect("commit exists");
        assert_eq!(created.mgit_hash, mgit_hash_for_commit(&info, &[], "npub1bob")?);
        assert_eq!(info.author, info.committer);
        assert_eq!(info.author.offset_minutes, 0);

        let object = read_object(&mgit, &created.mgit_hash)?.expect("object written");
        assert!(object.parent_hashes.is_empty());
        assert_eq!(object.message, "intake");

        assert_eq!(ref_store::resolve_head(&mgit)?, Some(created.mgit_hash.clone()));
        Ok(())
    }

    #[test]
    fn test_child_commit_chains_parent_mgit_hash() -> Result<()> {
        let dir = tempdir()?;
        init_test_repo(dir.path())?;
        let log = discard_logger();

        let first = create_mcommit(dir.path(), &request("one", "npub1a"), &log)?;
        let second = create_mcommit(dir.path(), &request("two", "npub1b"), &log)?;

        let mgit = MgitDir::at(dir.path());
        let object = read_object(&mgit, &second.mgit_hash)?.expect("object written");
        assert_eq!(object.parent_hashes, vec![first.mgit_hash.clone()]);
        assert_eq!(mapping::load(&mgit)?.len(), 2);
        assert_eq!(ref_store::read_ref(&mgit, "refs/heads/main")?, Some(second.mgit_hash));
        Ok(())
    }

    #[test]
    fn test_merge_commit_resolves_every_parent() -> Result<()> {
        let dir = tempdir()?;
        let repo = init_test_repo(dir.path())?;
        let log = discard_logger();

        let base = create_mcommit(dir.path(), &request("base", "npub1a"), &log)?;
        repo.branch("side", &repo.find_commit(git2::Oid::from_str(&base.git_hash)?)?, false)?;
        repo.set_head("refs/heads/side")?;
        let side = create_mcommit(dir.path(), &request("side work", "npub1b"), &log)?;
        repo.set_head("refs/heads/main")?;
        let main = create_mcommit(dir.path(), &request("main work", "npub1a"), &log)?;

        fs::write(repo.path().join("MERGE_HEAD"), format!("{}\n", side.git_hash))?;
        let merge = create_mcommit(dir.path(), &request("merge side", "npub1a"), &log)?;

        let mgit = MgitDir::at(dir.path());
        let object = read_object(&mgit, &merge.mgit_hash)?.expect("object written");
        assert_eq!(object.parent_hashes, vec![main.mgit_hash, side.mgit_hash]);
        assert!(!repo.path().join("MERGE_HEAD").exists());
        assert_eq!(repo.state(), git2::RepositoryState::Clean);
        assert_eq!(ref_store::read_ref(&mgit, "refs/heads/main")?, Some(merge.mgit_hash));
        Ok(())
    }

    #[test]
    fn test_hash_covers_raw_message_bytes() -> Result<()> {
        let dir = tempdir()?;
        let repo = init_test_repo(dir.path())?;
        let oid = crate::test_support::write_latin1_commit(&repo)?;
        let info = GitGateway::open(dir.path())?.find_commit(&oid.to_string())?.expect("commit exists");

        let lossy = CommitInfo {
            raw_message: info.message.clone().into_bytes(),
            ..info.clone()
        };

        assert_ne!(
            mgit_hash_for_commit(&info, &[], "npub1a")?,
            mgit_hash_for_commit(&lossy, &[], "npub1a")?
        );
        Ok(())
    }

    #[test]
    fn test_unmapped_parent_falls_back_to_git_hash() -> Result<()> {
        let dir = tempdir()?;
        let repo = init_test_repo(dir.path())?;
        let plain = commit_file(&repo, "a.txt", "a", "plain git commit", 1000)?;

        let created = create_mcommit(dir.path(), &request("on top", "npub1a"), &discard_logger())?;

        let object = read_object(&MgitDir::at(dir.path()), &created.mgit_hash)?.expect("object written");
        assert_eq!(object.parent_hashes, vec![plain.to_string()]);
        Ok(())
    }

    #[test]
    fn test_reject_policy_aborts_before_git_commit() -> Result<()> {
        let dir = tempdir()?;
        let repo = init_test_repo(dir.path())?;
        let plain = commit_file(&repo, "a.txt", "a", "plain git commit", 1000)?;

        let mgit = MgitDir::at(dir.path());
        mgit.ensure_layout()?;
        let mut config = RepoConfig::new(dir.path(), "r");
        config.core.unmapped_parents = crate::mapping::UnmappedParentPolicy::Reject;
        config.save(&mgit)?;

        let result = create_mcommit(dir.path(), &request("blocked", "npub1a"), &discard_logger());

        assert!(matches!(result, Err(MgitError::UnmappedParent { .. })));
        assert_eq!(repo.head()?.peel_to_commit()?.id(), plain);
        Ok(())
    }

    #[test]
    fn test_corrupt_mapping_aborts_before_git_commit() -> Result<()> {
        let dir = tempdir()?;
        let repo = init_test_repo(dir.path())?;
        let plain = commit_file(&repo, "a.txt", "a", "plain git commit", 1000)?;

        let mgit = MgitDir::at(dir.path());
        mgit.ensure_layout()?;
        fs::write(mgit.mappings_path(), "garbage")?;

        let result = create_mcommit(dir.path(), &request("blocked", "npub1a"), &discard_logger());

        assert!(matches!(result, Err(MgitError::MappingCorruption { .. })));
        assert_eq!(repo.head()?.peel_to_commit()?.id(), plain);
        assert_eq!(fs::read_to_string(mgit.mappings_path())?, "garbage");
        Ok(())
    }

    #[test]
    fn test_outside_repository_is_git_error() -> Result<()> {
        let dir = tempdir()?;
        let result = create_mcommit(dir.path(), &request("x", "npub1a"), &discard_logger());
        assert!(matches!(result, Err(MgitError::Git { .. })));
        Ok(())
    }
}
