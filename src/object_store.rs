//! Content-addressed store of MGit commit objects.
//!
//! Objects live at `.mgit/objects/<first 2 hex>/<remaining 38 hex>` as
//! pretty-printed JSON. Serialization is deterministic: field order is fixed
//! by the struct definitions, so rewriting an object from the same inputs
//! produces identical bytes.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use slog::{debug, Logger};

use crate::error::{MgitError, Result};
use crate::git_gateway::{CommitInfo, Identity};
use crate::hash::validate_hash;
use crate::mgit_dir::{atomic_write, MgitDir};

/// Format version recorded in every object
pub const OBJECT_VERSION: &str = "1.0";

/// Author or committer of an MGit commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MgitSignature {
    pub name: String,
    pub email: String,
    pub pubkey: String,
    /// RFC 3339 timestamp carrying the original UTC offset
    pub when: String,
}

impl MgitSignature {
    fn from_identity(identity: &Identity, pubkey: &str) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.clone(),
            pubkey: pubkey.to_string(),
            when: format_when(identity.time, identity.offset_minutes),
        }
    }

    /// Seconds since the epoch, if `when` parses
    pub fn timestamp(&self) -> Option<i64> {
        DateTime::parse_from_rfc3339(&self.when).ok().map(|t| t.timestamp())
    }
}

fn format_when(seconds: i64, offset_minutes: i32) -> String {
    let utc = DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default();
    match FixedOffset::east_opt(offset_minutes * 60) {
        Some(offset) => utc.with_timezone(&offset).to_rfc3339(),
        None => utc.to_rfc3339(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub version: String,
}

/// An MGit commit as stored under `.mgit/objects/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MgitCommitObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub mgit_hash: String,
    pub git_hash: String,
    pub tree_hash: String,
    pub parent_hashes: Vec<String>,
    pub author: MgitSignature,
    pub committer: MgitSignature,
    pub message: String,
    pub metadata: ObjectMetadata,
}

impl MgitCommitObject {
    /// Build the object for a git commit whose parents are already resolved
    /// to MGit hashes.
    pub fn from_commit(info: &CommitInfo, mgit_hash: &str, parent_hashes: Vec<String>, pubkey: &str) -> Self {
        Self {
            kind: "commit".to_string(),
            mgit_hash: mgit_hash.to_string(),
            git_hash: info.git_hash.clone(),
            tree_hash: info.tree_hash(),
            parent_hashes,
            author: MgitSignature::from_identity(&info.author, pubkey),
            committer: MgitSignature::from_identity(&info.committer, pubkey),
            message: info.message.clone(),
            metadata: ObjectMetadata {
                version: OBJECT_VERSION.to_string(),
            },
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| MgitError::ObjectCorruption {
            path: PathBuf::from(&self.mgit_hash),
            reason: format!("failed to serialize: {}", e),
        })
    }
}

/// Path of an object: `objects/<xx>/<rest>`
pub fn object_path(dir: &MgitDir, mgit_hash: &str) -> Result<PathBuf> {
    validate_hash(mgit_hash)?;
    let hash = mgit_hash.to_ascii_lowercase();
    let (prefix, rest) = hash.split_at(2);
    Ok(dir.objects_dir().join(prefix).join(rest))
}

/// Persist an object under its MGit hash.
///
/// Skips the write when the file already holds identical bytes.
pub fn write_object(dir: &MgitDir, object: &MgitCommitObject, log: &Logger) -> Result<PathBuf> {
    let path = object_path(dir, &object.mgit_hash)?;
    let bytes = object.to_bytes()?;

    match fs::read(&path) {
        Ok(existing) if existing == bytes => return Ok(path),
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(MgitError::io("read object", &path)(e)),
    }

    atomic_write(&path, &bytes, "write object")?;
    debug!(log, "wrote MGit object"; "mgit_hash" => object.mgit_hash.as_str(), "git_hash" => object.git_hash.as_str());
    Ok(path)
}

/// Read an object, returning `None` when it has not been materialized.
pub fn read_object(dir: &MgitDir, mgit_hash: &str) -> Result<Option<MgitCommitObject>> {
    let path = object_path(dir, mgit_hash)?;
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MgitError::io("read object", &path)(e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| MgitError::ObjectCorruption {
            path,
            reason: e.to_string(),
        })
}
