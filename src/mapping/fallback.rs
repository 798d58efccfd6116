//! Resolution of parent git hashes to MGit hashes.
//!
//! A parent without a mapping is, by default, represented by its raw git
//! hash. This mixes the two hash namespaces, so the behaviour is selectable
//! per repository through `[core] unmapped_parents` in `.mgit/config`.

use serde::{Deserialize, Serialize};
use slog::{warn, Logger};

use super::MappingTable;
use crate::error::{MgitError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmappedParentPolicy {
    /// Substitute the parent's git hash for its missing MGit hash
    #[default]
    RawGitHash,
    /// Refuse to compute an MGit hash over an unmapped parent
    Reject,
}

/// Map each parent git hash to its MGit hash, preserving parent order.
pub fn resolve_parent_hashes(
    table: &MappingTable,
    parent_git_hashes: &[String],
    policy: UnmappedParentPolicy,
    log: &Logger,
) -> Result<Vec<String>> {
    parent_git_hashes
        .iter()
        .map(|git_hash| match table.find_by_git_hash(git_hash) {
            Some(mapping) => Ok(mapping.mgit_hash.clone()),
            None => match policy {
                UnmappedParentPolicy::RawGitHash => {
                    warn!(log, "parent has no MGit mapping, using its git hash"; "git_hash" => git_hash.as_str());
                    Ok(git_hash.clone())
                }
                UnmappedParentPolicy::Reject => Err(MgitError::UnmappedParent {
                    git_hash: git_hash.clone(),
                }),
            },
        })
        .collect()
}
