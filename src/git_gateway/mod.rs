//! Git operations gateway for MGit.
//!
//! All access to the git object store goes through [`GitGateway`], a thin
//! wrapper over libgit2. The gateway owns nothing under `.mgit/`; it reports
//! commits, branches and HEAD in plain string form so the engine never holds
//! git2 borrows across its own operations.
//!
//! # Example
//!
//! ```ignore
//! use crate::git_gateway::GitGateway;
//!
//! let gateway = GitGateway::open(repo_root)?;
//! let head = gateway.head_state()?;
//! let commit = gateway.find_commit(&hash)?;
//! ```

mod commit;


use std::path::Path;

use git2::{BranchType, ErrorCode, ReferenceType, Repository};

use crate::error::{MgitError, Result};

/// Prefix of local branch refs
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Author or committer of a git commit.
///
/// Name and email are decoded lossily; git requires them to be UTF-8 in
/// practice and the codec hashes them as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch
    pub time: i64,
    /// UTC offset in minutes
    pub offset_minutes: i32,
}

impl Identity {
    fn from_signature(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            time: sig.when().seconds(),
            offset_minutes: sig.when().offset_minutes(),
        }
    }
}

/// The parts of a git commit that feed an MGit hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub git_hash: String,
    pub tree: [u8; 20],
    /// Parent git hashes in recorded order
    pub parents: Vec<String>,
    pub author: Identity,
    pub committer: Identity,
    /// Message for display, lossily decoded
    pub message: String,
    /// Message bytes exactly as stored, whatever the commit's encoding
    pub raw_message: Vec<u8>,
}

impl CommitInfo {
    pub fn tree_hash(&self) -> String {
        hex::encode(self.tree)
    }

    fn from_commit(commit: &git2::Commit<'_>) -> Result<Self> {
        let tree_id = commit.tree_id();
        let tree = <[u8; 20]>::try_from(tree_id.as_bytes()).map_err(|_| MgitError::InvalidHash {
            value: tree_id.to_string(),
            reason: "tree id is not a 20-byte SHA-1".to_string(),
        })?;

        Ok(Self {
            git_hash: commit.id().to_string(),
            tree,
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            author: Identity::from_signature(&commit.author()),
            committer: Identity::from_signature(&commit.committer()),
            message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
            raw_message: commit.message_raw_bytes().to_vec(),
        })
    }
}

/// Where git's HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// Symbolic HEAD, holding the full ref name (e.g. `refs/heads/main`).
    /// The branch may be unborn.
    Symbolic(String),
    /// Detached HEAD at a commit hash
    Detached(String),
    /// No HEAD at all
    Missing,
}

/// Unified interface to the git object store.
pub struct GitGateway {
    repo: Repository,
}

impl GitGateway {
    /// Open the repository at `path` (the working directory root).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(MgitError::git(format!("open repository {}", path.display())))?;
        Ok(Self { repo })
    }

    /// Look up a commit by its full hash.
    ///
    /// Returns `None` when the object is not in the store, which happens when a
    /// mapping table arrives ahead of the objects it describes.
    pub fn find_commit(&self, git_hash: &str) -> Result<Option<CommitInfo>> {
        let oid = git2::Oid::from_str(git_hash).map_err(|e| MgitError::InvalidHash {
            value: git_hash.to_string(),
            reason: e.message().to_string(),
        })?;

        match self.repo.find_commit(oid) {
            Ok(commit) => CommitInfo::from_commit(&commit).map(Some),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(MgitError::git(format!("find commit {}", git_hash))(e)),
        }
    }

    /// Resolve any revision (branch, tag, abbreviated hash) to a commit hash.
    pub fn resolve_revision(&self, revision: &str) -> Result<Option<String>> {
        let object = match self.repo.revparse_single(revision) {
            Ok(object) => object,
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous) => {
                return Ok(None)
            }
            Err(e) => return Err(MgitError::git(format!("resolve revision '{}'", revision))(e)),
        };

        let commit = object
            .peel_to_commit()
            .map_err(MgitError::git(format!("peel '{}' to a commit", revision)))?;
        Ok(Some(commit.id().to_string()))
    }

    /// Local branches as (short name, target commit hash), sorted by name.
    pub fn list_branches(&self) -> Result<Vec<(String, String)>> {
        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(MgitError::git("list branches"))?;

        let mut result = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(MgitError::git("read branch"))?;
            let name = match branch.name().map_err(MgitError::git("read branch name"))? {
                Some(name) => name.to_string(),
                None => continue, // non-UTF-8 branch names cannot be mirrored
            };
            if let Some(target) = branch.get().target() {
                result.push((name, target.to_string()));
            }
        }

        result.sort();
        Ok(result)
    }

    /// Where git's HEAD points, without requiring the branch to exist.
    pub fn head_state(&self) -> Result<HeadState> {
        let head = match self.repo.find_reference("HEAD") {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(HeadState::Missing),
            Err(e) => return Err(MgitError::git("read HEAD")(e)),
        };

        match head.kind() {
            Some(ReferenceType::Symbolic) => Ok(head
                .symbolic_target()
                .map(|target| HeadState::Symbolic(target.to_string()))
                .unwrap_or(HeadState::Missing)),
            _ => Ok(head
                .target()
                .map(|oid| HeadState::Detached(oid.to_string()))
                .unwrap_or(HeadState::Missing)),
        }
    }

    /// Short name of the branch HEAD points at, if any
    pub fn head_branch(&self) -> Result<Option<String>> {
        Ok(match self.head_state()? {
            HeadState::Symbolic(target) => target.strip_prefix(HEADS_PREFIX).map(str::to_string),
            _ => None,
        })
    }
}
