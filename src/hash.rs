//! MGit hash codec.
//!
//! An MGit hash is the SHA-1 of:
//!
//! ```text
//! tree (20 raw bytes)
//! parent MGit hashes (20 raw bytes each, in parent order)
//! "<author name> <<author email>> <author timestamp> <pubkey>"
//! "<committer name> <<committer email>> <committer timestamp> <pubkey>"
//! message (raw bytes)
//! ```
//!
//! The byte layout is shared with other MGit implementations and must not change.

use sha1::{Digest, Sha1};

use crate::error::{MgitError, Result};

/// Length of a hex-encoded SHA-1 hash
pub const HASH_HEX_LEN: usize = 40;

/// Author or committer line fed to the codec.
#[derive(Debug, Clone, Copy)]
pub struct SignatureLine<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub timestamp: i64,
}

/// All inputs that determine an MGit hash.
#[derive(Debug, Clone, Copy)]
pub struct MgitHashInput<'a> {
    pub tree: &'a [u8; 20],
    pub parents: &'a [String],
    pub author: SignatureLine<'a>,
    pub committer: SignatureLine<'a>,
    /// Raw message bytes as stored in the commit object
    pub message: &'a [u8],
    pub pubkey: &'a str,
}

/// Compute the lowercase hex MGit hash for a commit.
///
/// Fails if any parent hash is not a 40-character hex string.
pub fn compute_mgit_hash(input: &MgitHashInput<'_>) -> Result<String> {
    let mut hasher = Sha1::new();
    hasher.update(input.tree);

    for parent in input.parents {
        hasher.update(decode_hash(parent)?);
    }

    hasher.update(signature_bytes(&input.author, input.pubkey));
    hasher.update(signature_bytes(&input.committer, input.pubkey));
    hasher.update(input.message);

    Ok(hex::encode(hasher.finalize()))
}

fn signature_bytes(sig: &SignatureLine<'_>, pubkey: &str) -> Vec<u8> {
    format!("{} <{}> {} {}", sig.name, sig.email, sig.timestamp, pubkey).into_bytes()
}

/// Decode a 40-character hex hash into its 20 raw bytes.
pub fn decode_hash(value: &str) -> Result<[u8; 20]> {
    if value.len() != HASH_HEX_LEN {
        return Err(MgitError::InvalidHash {
            value: value.to_string(),
            reason: format!("expected {} hex characters, got {}", HASH_HEX_LEN, value.len()),
        });
    }

    let mut out = [0u8; 20];
    hex::decode_to_slice(value, &mut out).map_err(|e| MgitError::InvalidHash {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    Ok(out)
}

/// Validate that a string is a well-formed hash without keeping the bytes.
pub fn validate_hash(value: &str) -> Result<()> {
    decode_hash(value).map(|_| ())
}

/// True for a full 40-character hex string.
pub fn is_full_hash(value: &str) -> bool {
    value.len() == HASH_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Short form used in human-facing output
pub fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_TREE: [u8; 20] = [0u8; 20];

    fn alice() -> SignatureLine<'static> {
        SignatureLine {
            name: "Alice",
            email: "a@x.com",
            timestamp: 1000,
        }
    }

    fn root_input<'a>(parents: &'a [String], pubkey: &'a str) -> MgitHashInput<'a> {
        MgitHashInput {
            tree: &ZERO_TREE,
            parents,
            author: alice(),
            committer: alice(),
            message: b"init",
            pubkey,
        }
    }

    #[test]
    fn test_root_commit_hash_is_reproducible() -> Result<()> {
        let hash = compute_mgit_hash(&root_input(&[], "npub1xyz"))?;
        assert_eq!(hash, "fae1229ac411f78dbe6fac8518384c71e79213bf");
        assert_eq!(hash, compute_mgit_hash(&root_input(&[], "npub1xyz"))?);
        Ok(())
    }

    #[test]
    fn test_pubkey_changes_hash() -> Result<()> {
        let xyz = compute_mgit_hash(&root_input(&[], "npub1xyz"))?;
        let abc = compute_mgit_hash(&root_input(&[], "npub1abc"))?;
        assert_eq!(abc, "9b358af537e1718f22ede348bab8a7514ed454a8");
        assert_ne!(xyz, abc);
        Ok(())
    }

    #[test]
    fn test_parents_change_hash() -> Result<()> {
        let root = compute_mgit_hash(&root_input(&[], "npub1xyz"))?;
        let parents = vec![root.clone()];
        let child = compute_mgit_hash(&root_input(&parents, "npub1xyz"))?;
        assert_eq!(child, "a908fd9a609f5d2eabd282165fc3035325ea7094");
        assert_ne!(root, child);
        Ok(())
    }

    #[test]
    fn test_parent_order_matters() -> Result<()> {
        let a = "1".repeat(40);
        let b = "2".repeat(40);
        let ab = vec![a.clone(), b.clone()];
        let ba = vec![b, a];
        assert_ne!(
            compute_mgit_hash(&root_input(&ab, "npub1xyz"))?,
            compute_mgit_hash(&root_input(&ba, "npub1xyz"))?
        );
        Ok(())
    }

    #[test]
    fn test_malformed_parent_fails() {
        let short_parent = vec!["abc123".to_string()];
        assert!(matches!(
            compute_mgit_hash(&root_input(&short_parent, "npub1xyz")),
            Err(MgitError::InvalidHash { .. })
        ));

        let non_hex = vec!["z".repeat(40)];
        assert!(matches!(
            compute_mgit_hash(&root_input(&non_hex, "npub1xyz")),
            Err(MgitError::InvalidHash { .. })
        ));
    }

    #[test]
    fn test_decode_hash() -> Result<()> {
        let bytes = decode_hash("00112233445566778899aabbccddeeff00112233")?;
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], 0x11);
        assert_eq!(bytes[19], 0x33);
        assert!(decode_hash("").is_err());
        assert!(decode_hash(&"a".repeat(41)).is_err());
        Ok(())
    }

    #[test]
    fn test_is_full_hash_and_short() {
        assert!(is_full_hash(&"a".repeat(40)));
        assert!(!is_full_hash("main"));
        assert!(!is_full_hash(&"g".repeat(40)));
        assert_eq!(short("fae1229ac411f78dbe6fac8518384c71e79213bf"), "fae1229");
        assert_eq!(short("abc"), "abc");
    }
}
