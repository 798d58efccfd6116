//! RefStore maintains the MGit ref namespace under `.mgit/`.
//!
//! Refs are plain-text files:
//!   .mgit/refs/heads/<branch> -> "<mgit hash>"
//!   .mgit/HEAD                -> "ref: refs/heads/<branch>" or "<hash>"
//!
//! HEAD resolution follows exactly one level of symbolic indirection.

mod lock;

#[cfg(test)]
mod tests;

pub use lock::RepoLockGuard;

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{MgitError, Result};
use crate::mgit_dir::{atomic_write, MgitDir, TEMP_SUFFIX};

pub use crate::git_gateway::HEADS_PREFIX;

/// Prefix marking a symbolic ref
pub const SYMBOLIC_PREFIX: &str = "ref: ";

/// Contents of `.mgit/HEAD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MgitHead {
    /// Points at a ref path such as `refs/heads/main`
    Symbolic(String),
    /// Holds a hash directly
    Detached(String),
}

impl MgitHead {
    fn parse(content: &str) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(match content.strip_prefix(SYMBOLIC_PREFIX) {
            Some(target) => MgitHead::Symbolic(target.trim().to_string()),
            None => MgitHead::Detached(content.to_string()),
        })
    }

    fn render(&self) -> String {
        match self {
            MgitHead::Symbolic(target) => format!("{}{}\n", SYMBOLIC_PREFIX, target),
            MgitHead::Detached(hash) => format!("{}\n", hash),
        }
    }
}

/// Map a ref name like `refs/heads/main` to its file, rejecting names that
/// would escape `.mgit/`.
fn ref_path(dir: &MgitDir, ref_name: &str) -> Result<PathBuf> {
    let invalid = || MgitError::InvalidRef {
        name: ref_name.to_string(),
    };

    if ref_name.is_empty() || ref_name.ends_with('/') {
        return Err(invalid());
    }
    let relative = Path::new(ref_name);
    let valid_component = |c: Component<'_>| match c {
        Component::Normal(part) => !part.to_string_lossy().ends_with(TEMP_SUFFIX),
        _ => false,
    };
    if !relative.components().all(valid_component) {
        return Err(invalid());
    }
    if !ref_name.starts_with("refs/") {
        return Err(invalid());
    }

    Ok(dir.path().join(relative))
}

fn read_trimmed(path: &Path, operation: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim();
            Ok((!content.is_empty()).then(|| content.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MgitError::io(operation, path)(e)),
    }
}

/// Point `ref_name` (e.g. `refs/heads/main`) at `hash`.
///
/// Parent directories are created as needed and the file is replaced atomically.
pub fn update_ref(dir: &MgitDir, ref_name: &str, hash: &str) -> Result<()> {
    let path = ref_path(dir, ref_name)?;
    atomic_write(&path, format!("{}\n", hash).as_bytes(), "write ref")
}

/// Read the hash stored in `ref_name`, if the ref exists.
pub fn read_ref(dir: &MgitDir, ref_name: &str) -> Result<Option<String>> {
    let path = ref_path(dir, ref_name)?;
    read_trimmed(&path, "read ref")
}

/// Full ref name of a local branch
pub fn branch_ref(branch: &str) -> String {
    format!("{}{}", HEADS_PREFIX, branch)
}

/// Read `.mgit/HEAD` without resolving it.
pub fn read_head(dir: &MgitDir) -> Result<Option<MgitHead>> {
    Ok(read_trimmed(&dir.head_path(), "read HEAD")?.and_then(|c| MgitHead::parse(&c)))
}

pub fn write_head(dir: &MgitDir, head: &MgitHead) -> Result<()> {
    if let MgitHead::Symbolic(target) = head {
        ref_path(dir, target)?;
    }
    atomic_write(&dir.head_path(), head.render().as_bytes(), "write HEAD")
}

/// Resolve HEAD to a hash.
///
/// A symbolic HEAD is followed one level to its branch file; the branch file
/// is taken as a hash even if it looks symbolic. Returns `None` when HEAD or
/// its branch does not exist yet.
pub fn resolve_head(dir: &MgitDir) -> Result<Option<String>> {
    match read_head(dir)? {
        None => Ok(None),
        Some(MgitHead::Detached(hash)) => Ok(Some(hash)),
        Some(MgitHead::Symbolic(target)) => read_ref(dir, &target),
    }
}

