//! File-based locking for commands that mutate `.mgit/`.
//!
//! The engine assumes a single writer per repository. The CLI upholds that by
//! holding this lock for the duration of each mutating command.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};

use crate::mgit_dir::MgitDir;

/// Guard that holds an exclusive lock on a repository's `.mgit/` tree.
///
/// The lock is automatically released when this guard is dropped.
pub struct RepoLockGuard {
    _file: File, // Held to keep the lock active
}

impl RepoLockGuard {
    /// Try to acquire the lock without blocking.
    ///
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(dir: &MgitDir) -> Result<Option<Self>> {
        let file = Self::open_lock_file(dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e).context("Failed to acquire lock on .mgit"),
        }
    }

    fn open_lock_file(dir: &MgitDir) -> Result<File> {
        fs::create_dir_all(dir.path()).context("Failed to create .mgit directory")?;
        File::create(dir.lock_path()).context("Failed to create lock file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_lock_is_exclusive_until_dropped() -> Result<()> {
        let dir = tempdir()?;
        let mgit = MgitDir::at(dir.path());

        let guard = RepoLockGuard::try_acquire(&mgit)?;
        assert!(guard.is_some());
        assert!(mgit.lock_path().exists());

        // Held: a second attempt fails without blocking
        assert!(RepoLockGuard::try_acquire(&mgit)?.is_none());
        drop(guard);

        // Released: can be taken again
        assert!(RepoLockGuard::try_acquire(&mgit)?.is_some());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_lock_creates_mgit_directory() -> Result<()> {
        let dir = tempdir()?;
        let mgit = MgitDir::at(dir.path());
        assert!(!mgit.path().exists());

        let _guard = RepoLockGuard::try_acquire(&mgit)?;
        assert!(mgit.path().is_dir());
        Ok(())
    }
}
