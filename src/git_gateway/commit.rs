//! Commit creation for GitGateway.

use std::fs;
use std::io;
use std::path::Path;

use git2::{ErrorCode, IndexAddOption, RepositoryState, Signature, Time};

use super::GitGateway;
use crate::error::{MgitError, Result};
use crate::mgit_dir::MGIT_DIR;

impl GitGateway {
    /// Stage all changes (git add -A), leaving `.mgit/` out of the index
    pub fn stage_all(&self) -> Result<()> {
        let mut skip_mgit = |path: &Path, _spec: &[u8]| -> i32 { i32::from(path.starts_with(MGIT_DIR)) };

        let mut index = self.repo.index().map_err(MgitError::git("open index"))?;
        index
            .add_all(
                ["*"].iter(),
                IndexAddOption::DEFAULT,
                Some(&mut skip_mgit as &mut git2::IndexMatchedPath<'_>),
            )
            .map_err(MgitError::git("stage all files"))?;
        index
            .update_all(["*"].iter(), Some(&mut skip_mgit as &mut git2::IndexMatchedPath<'_>))
            .map_err(MgitError::git("stage removals"))?;
        index.write().map_err(MgitError::git("write index"))?;
        Ok(())
    }

    /// Parents the next commit on HEAD will get: the HEAD commit (unless the
    /// branch is unborn) followed by any MERGE_HEAD commits.
    pub fn pending_parents(&self) -> Result<Vec<String>> {
        let mut parents = Vec::new();

        match self.repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit().map_err(MgitError::git("peel HEAD to a commit"))?;
                parents.push(commit.id().to_string());
            }
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {}
            Err(e) => return Err(MgitError::git("read HEAD")(e)),
        }

        if self.repo.state() == RepositoryState::Merge {
            parents.extend(self.merge_heads()?);
        }

        Ok(parents)
    }

    /// Commits listed in `.git/MERGE_HEAD`, one hash per line
    fn merge_heads(&self) -> Result<Vec<String>> {
        let path = self.repo.path().join("MERGE_HEAD");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MgitError::io("read MERGE_HEAD", &path)(e)),
        };

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                git2::Oid::from_str(line)
                    .map(|oid| oid.to_string())
                    .map_err(|e| MgitError::InvalidHash {
                        value: line.to_string(),
                        reason: format!("in MERGE_HEAD: {}", e.message()),
                    })
            })
            .collect()
    }

    /// Commit the index on HEAD with the given parents.
    ///
    /// Author and committer share one signature at `timestamp` with UTC
    /// offset 0. A pending merge is concluded by the commit.
    pub fn create_commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
        timestamp: i64,
        parents: &[String],
    ) -> Result<String> {
        let sig = Signature::new(author_name, author_email, &Time::new(timestamp, 0))
            .map_err(MgitError::git("create signature"))?;

        let mut index = self.repo.index().map_err(MgitError::git("open index"))?;
        let tree_id = index.write_tree().map_err(MgitError::git("write tree"))?;
        let tree = self.repo.find_tree(tree_id).map_err(MgitError::git("find tree"))?;

        let parent_commits = parents
            .iter()
            .map(|hash| {
                let oid = git2::Oid::from_str(hash).map_err(MgitError::git(format!("parse parent {}", hash)))?;
                self.repo
                    .find_commit(oid)
                    .map_err(MgitError::git(format!("find parent {}", hash)))
            })
            .collect::<Result<Vec<_>>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .map_err(MgitError::git("create commit"))?;

        if self.repo.state() == RepositoryState::Merge {
            self.repo.cleanup_state().map_err(MgitError::git("clear merge state"))?;
        }

        Ok(oid.to_string())
    }
}
