//! Configuration for MGit.
//!
//! Two sources:
//! 1. Repository: `.mgit/config` (TOML, `[repository]` id + name, optional `[core]`)
//! 2. User global: `~/.config/mgit/config.toml` (default author identity and pubkey)
//!
//! Command-line flags override the user config; `MGIT_PUBKEY` overrides the
//! configured pubkey.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use slog::{warn, Logger};

use crate::error::{MgitError, Result};
use crate::mapping::UnmappedParentPolicy;
use crate::mgit_dir::{atomic_write, MgitDir};

/// Environment variable overriding the configured pubkey
pub const PUBKEY_ENV: &str = "MGIT_PUBKEY";

/// `[repository]` section of `.mgit/config`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositorySection {
    pub id: String,
    pub name: String,
}

/// `[core]` section of `.mgit/config`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreSection {
    /// What to do when a parent commit has no MGit mapping
    #[serde(default)]
    pub unmapped_parents: UnmappedParentPolicy,
}

/// Repository-level configuration stored in `.mgit/config`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    pub repository: RepositorySection,
    #[serde(default)]
    pub core: CoreSection,
}

impl RepoConfig {
    /// Fresh config with an id derived from the repository path and creation time
    pub fn new(root: &Path, name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(root.to_string_lossy().as_bytes());
        hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        let id = hex::encode(&hasher.finalize()[..16]);

        Self {
            repository: RepositorySection {
                id,
                name: name.to_string(),
            },
            core: CoreSection::default(),
        }
    }

    /// Load `.mgit/config`. Returns `None` when the file does not exist.
    pub fn load(dir: &MgitDir) -> Result<Option<Self>> {
        let path = dir.config_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(MgitError::io("read config", &path))?;
        toml::from_str(&content).map(Some).map_err(|e| MgitError::Config {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self, dir: &MgitDir) -> Result<()> {
        let path = dir.config_path();
        let content = toml::to_string_pretty(self).map_err(|e| MgitError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        atomic_write(&path, content.as_bytes(), "write config")
    }
}

/// Unmapped-parent policy for a repository, defaulting when no config exists
pub fn unmapped_parent_policy(dir: &MgitDir) -> Result<UnmappedParentPolicy> {
    Ok(RepoConfig::load(dir)?
        .map(|c| c.core.unmapped_parents)
        .unwrap_or_default())
}

/// `[user]` section of the user config
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pubkey: Option<String>,
}

/// User-level configuration (stored in ~/.config/mgit/)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub user: UserSection,
}

impl UserConfig {
    /// Load the user config, falling back to defaults when missing or invalid
    pub fn load(log: &Logger) -> Self {
        match Self::user_config_path() {
            Ok(path) => Self::load_from(&path, log),
            Err(_) => Self::default(),
        }
    }

    pub fn load_from(path: &Path, log: &Logger) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(log, "could not read user config, using defaults"; "path" => %path.display(), "error" => %e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(log, "user config is invalid, using defaults"; "path" => %path.display(), "error" => %e);
                Self::default()
            }
        }
    }

    /// Get path to user config: ~/.config/mgit/config.toml
    pub fn user_config_path() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine user config directory"))?;
        Ok(config_dir.join("mgit").join("config.toml"))
    }

    /// Pubkey from the environment, then the config file
    pub fn pubkey(&self) -> Option<String> {
        std::env::var(PUBKEY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.user.pubkey.clone())
    }
}
