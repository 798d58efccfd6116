//! Mapping table between git hashes, MGit hashes and pubkeys.
//!
//! The table is persisted as a pretty-printed JSON array at
//! `.mgit/mappings/hash_mappings.json` and duplicated to the legacy
//! `.mgit/nostr_mappings.json`. Both files always hold the same bytes.
//!
//! At most one entry exists per git hash and per MGit hash: an upsert that
//! collides on either field replaces the first colliding entry in place.

mod fallback;


pub use fallback::{resolve_parent_hashes, UnmappedParentPolicy};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slog::{debug, warn, Logger};

use crate::error::{MgitError, Result};
use crate::hash::validate_hash;
use crate::mgit_dir::{atomic_write, MgitDir};

/// One git hash ↔ MGit hash ↔ pubkey triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashMapping {
    pub git_hash: String,
    pub mgit_hash: String,
    pub pubkey: String,
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced { index: usize },
}

/// Ordered mapping table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<HashMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HashMapping>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HashMapping] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_git_hash(&self, git_hash: &str) -> Option<&HashMapping> {
        self.entries.iter().find(|m| m.git_hash.eq_ignore_ascii_case(git_hash))
    }

    pub fn find_by_mgit_hash(&self, mgit_hash: &str) -> Option<&HashMapping> {
        self.entries.iter().find(|m| m.mgit_hash.eq_ignore_ascii_case(mgit_hash))
    }

    /// Replace the first entry matching on git hash or MGit hash, else append.
    pub fn upsert(&mut self, mapping: HashMapping) -> Upsert {
        match self
            .entries
            .iter()
            .position(|m| m.git_hash == mapping.git_hash || m.mgit_hash == mapping.mgit_hash)
        {
            Some(index) => {
                self.entries[index] = mapping;
                Upsert::Replaced { index }
            }
            None => {
                self.entries.push(mapping);
                Upsert::Inserted
            }
        }
    }

    /// Serialized form shared by the canonical and legacy files
    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| MgitError::MappingCorruption {
            path: PathBuf::new(),
            reason: format!("failed to serialize mapping table: {}", e),
        })
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = &'a HashMapping;
    type IntoIter = std::slice::Iter<'a, HashMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// True when either the canonical or the legacy mapping file exists
pub fn exists(dir: &MgitDir) -> bool {
    dir.mappings_path().exists() || dir.legacy_mappings_path().exists()
}

/// Load the mapping table.
///
/// Reads the canonical file, falling back to the legacy file for
/// repositories written by older clients. No file at all is an empty table.
/// An unparseable file is an error; callers must not write over it.
pub fn load(dir: &MgitDir) -> Result<MappingTable> {
    let canonical = dir.mappings_path();
    let legacy = dir.legacy_mappings_path();

    let path = if canonical.exists() {
        canonical
    } else if legacy.exists() {
        legacy
    } else {
        return Ok(MappingTable::new());
    };

    let bytes = fs::read(&path).map_err(MgitError::io("read mapping table", &path))?;
    parse_table(&bytes, &path)
}

/// Parse and validate a serialized mapping table.
///
/// `origin` names the file or payload in error messages. Hashes are
/// lowercased to match the form git reports them in.
pub fn parse_table(bytes: &[u8], origin: &Path) -> Result<MappingTable> {
    let mut entries: Vec<HashMapping> = serde_json::from_slice(bytes).map_err(|e| MgitError::MappingCorruption {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    })?;

    for (i, entry) in entries.iter_mut().enumerate() {
        for (field, value) in [("git_hash", &mut entry.git_hash), ("mgit_hash", &mut entry.mgit_hash)] {
            if let Err(e) = validate_hash(value) {
                return Err(MgitError::MappingCorruption {
                    path: origin.to_path_buf(),
                    reason: format!("entry {} has invalid {}: {}", i, field, e),
                });
            }
            value.make_ascii_lowercase();
        }
    }

    Ok(MappingTable::from_entries(entries))
}

/// Persist the table to the canonical file, then mirror it to the legacy file.
///
/// Both targets receive the same serialized bytes. A canonical write failure
/// is fatal; a legacy write failure is logged and tolerated.
pub fn persist_mappings(dir: &MgitDir, table: &MappingTable, log: &Logger) -> Result<()> {
    let json = table.to_json()?;

    atomic_write(&dir.mappings_path(), json.as_bytes(), "write mapping table")?;

    if let Err(e) = atomic_write(&dir.legacy_mappings_path(), json.as_bytes(), "write legacy mapping table") {
        warn!(log, "legacy mapping table not updated"; "error" => %e);
    }

    debug!(log, "persisted mapping table"; "entries" => table.len());
    Ok(())
}

/// Load, upsert one mapping, persist.
pub fn upsert(dir: &MgitDir, mapping: HashMapping, log: &Logger) -> Result<Upsert> {
    let mut table = load(dir)?;
    let outcome = table.upsert(mapping);
    persist_mappings(dir, &table, log)?;
    Ok(outcome)
}

/// Counts from merging a transferred mapping payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub replaced: usize,
}

/// Merge a transferred mapping payload into the local table.
///
/// The payload is fully parsed before the local table is touched, so a
/// corrupt payload leaves local state unchanged.
pub fn import_payload(dir: &MgitDir, payload: &[u8], origin: &Path, log: &Logger) -> Result<ImportSummary> {
    let incoming = parse_table(payload, origin)?;
    let mut table = load(dir)?;

    let mut summary = ImportSummary::default();
    for mapping in incoming.entries {
        match table.upsert(mapping) {
            Upsert::Inserted => summary.inserted += 1,
            Upsert::Replaced { .. } => summary.replaced += 1,
        }
    }

    persist_mappings(dir, &table, log)?;
    Ok(summary)
}
