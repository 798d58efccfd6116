//! Shared fixtures for unit tests.
//!
//! Repositories are created with git2 in temp directories, always on a
//! `main` branch and with fixed signatures so commit hashes are stable.

use std::fs;
use std::path::Path;

use anyhow::Result;
use git2::{Repository, Signature, Time};

/// Logger that drops everything
pub fn discard_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

/// Initialize an empty repository whose HEAD points at an unborn `main`.
pub fn init_test_repo(path: &Path) -> Result<Repository> {
    let repo = Repository::init(path)?;

    let mut config = repo.config()?;
    config.set_str("user.name", "Test User")?;
    config.set_str("user.email", "test@example.com")?;
    drop(config);

    repo.set_head("refs/heads/main")?;
    Ok(repo)
}

/// Write `name` with `content`, stage it and commit on HEAD at `timestamp`.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str, timestamp: i64) -> Result<git2::Oid> {
    let workdir = repo.workdir().ok_or_else(|| anyhow::anyhow!("bare repository"))?;
    fs::write(workdir.join(name), content)?;

    let mut index = repo.index()?;
    index.add_path(Path::new(name))?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let sig = Signature::new("Alice", "alice@clinic.org", &Time::new(timestamp, 0))?;
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit()?],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

    Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?)
}

/// Write a commit object by hand, with a Latin-1 message git2 cannot express as &str
pub fn write_latin1_commit(repo: &Repository) -> Result<git2::Oid> {
    let tree = repo.treebuilder(None)?.write()?;
    let mut raw = format!(
        "tree {}\nauthor Alice <a@x.com> 1000 +0000\ncommitter Alice <a@x.com> 1000 +0000\nencoding ISO-8859-1\n\n",
        tree
    )
    .into_bytes();
    raw.extend_from_slice(b"caf\xe9\n");
    Ok(repo.odb()?.write(git2::ObjectType::Commit, &raw)?)
}

