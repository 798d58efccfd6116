//! Layout of the `.mgit/` metadata tree.
//!
//! ```text
//! .mgit/
//!   HEAD                          "ref: refs/heads/<name>" or a bare hash
//!   config                        TOML, [repository] id + name
//!   objects/<xx>/<38 chars>       MGit commit objects
//!   refs/heads/<branch>
//!   refs/tags/
//!   mappings/hash_mappings.json   canonical mapping table
//!   nostr_mappings.json           legacy copy of the mapping table
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use slog::{debug, Logger};

use crate::config::RepoConfig;
use crate::error::{MgitError, Result};
use crate::ref_store::{self, MgitHead};

pub const MGIT_DIR: &str = ".mgit";

/// Paths of one repository's `.mgit/` tree.
#[derive(Debug, Clone)]
pub struct MgitDir {
    root: PathBuf,
    path: PathBuf,
}

impl MgitDir {
    /// `.mgit/` tree of the repository whose working directory is `repo_root`
    pub fn at(repo_root: &Path) -> Self {
        Self {
            root: repo_root.to_path_buf(),
            path: repo_root.join(MGIT_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.path.join("objects")
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.path.join("mappings").join("hash_mappings.json")
    }

    pub fn legacy_mappings_path(&self) -> PathBuf {
        self.path.join("nostr_mappings.json")
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join("HEAD")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join("config")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path.join("lock")
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// Create the directory skeleton. Existing content is left alone.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.objects_dir(),
            self.refs_dir().join("heads"),
            self.refs_dir().join("tags"),
            self.path.join("mappings"),
        ] {
            fs::create_dir_all(&dir).map_err(MgitError::io("create directory", &dir))?;
        }
        Ok(())
    }
}

/// Initialize `.mgit/` for a repository.
///
/// HEAD points at `head_branch` unless a HEAD already exists; an existing
/// config is kept so re-running init never changes the repository id.
pub fn init(dir: &MgitDir, head_branch: &str, name: Option<&str>, log: &Logger) -> Result<RepoConfig> {
    dir.ensure_layout()?;

    if !dir.head_path().exists() {
        let head = MgitHead::Symbolic(format!("{}{}", ref_store::HEADS_PREFIX, head_branch));
        ref_store::write_head(dir, &head)?;
        debug!(log, "wrote MGit HEAD"; "branch" => head_branch);
    }

    if let Some(existing) = RepoConfig::load(dir)? {
        return Ok(existing);
    }

    let repo_name = name.map(str::to_string).unwrap_or_else(|| default_repo_name(dir.root()));
    let config = RepoConfig::new(dir.root(), &repo_name);
    config.save(dir)?;
    debug!(log, "wrote MGit config"; "id" => &config.repository.id, "name" => &config.repository.name);

    Ok(config)
}

fn default_repo_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "repository".to_string())
}

/// Suffix of the sibling file `atomic_write` stages content in. Git forbids
/// ref components ending in `.lock`, so it never collides with a ref file.
pub const TEMP_SUFFIX: &str = ".lock";

/// Write a file via a sibling temp file and rename, creating parent directories.
///
/// Readers observe either the previous content or the new content, never a
/// partial write.
pub fn atomic_write(path: &Path, contents: &[u8], operation: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(MgitError::io(format!("{} (create directory)", operation), parent))?;
    }

    let mut temp_name = OsString::from(path.as_os_str());
    temp_name.push(TEMP_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, contents).map_err(MgitError::io(operation, &temp_path))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(MgitError::io(format!("{} (rename)", operation), path)(e));
    }

    Ok(())
}
