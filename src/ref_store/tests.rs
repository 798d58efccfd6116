//! Tests for RefStore.

use super::*;
use anyhow::Result;
use tempfile::tempdir;

const HASH_A: &str = "fae1229ac411f78dbe6fac8518384c71e79213bf";
const HASH_B: &str = "a908fd9a609f5d2eabd282165fc3035325ea7094";

fn test_dir() -> Result<(tempfile::TempDir, MgitDir)> {
    let dir = tempdir()?;
    let mgit = MgitDir::at(dir.path());
    mgit.ensure_layout()?;
    Ok((dir, mgit))
}

#[test]
fn test_update_and_read_ref() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    assert_eq!(read_ref(&dir, "refs/heads/main")?, None);

    update_ref(&dir, "refs/heads/main", HASH_A)?;
    assert_eq!(read_ref(&dir, "refs/heads/main")?, Some(HASH_A.to_string()));

    update_ref(&dir, "refs/heads/main", HASH_B)?;
    assert_eq!(read_ref(&dir, "refs/heads/main")?, Some(HASH_B.to_string()));
    Ok(())
}

#[test]
fn test_update_ref_creates_nested_directories() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    update_ref(&dir, "refs/heads/feature/cardiology", HASH_A)?;

    let path = dir.path().join("refs").join("heads").join("feature").join("cardiology");
    assert_eq!(fs::read_to_string(path)?.trim(), HASH_A);
    Ok(())
}

#[test]
fn test_invalid_ref_names_rejected() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    for name in [
        "",
        "refs/heads/../../escape",
        "/etc/passwd",
        "HEAD",
        "refs/heads/",
        "objects/aa",
        "refs/heads/main.lock",
        "refs/heads/topic.lock/x",
    ] {
        assert!(
            matches!(update_ref(&dir, name, HASH_A), Err(MgitError::InvalidRef { .. })),
            "expected '{}' to be rejected",
            name
        );
    }
    Ok(())
}

#[test]
fn test_ref_names_git_accepts_are_writable() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    for name in ["refs/heads/release.tmp", "refs/heads/v1.0", "refs/heads/lock"] {
        update_ref(&dir, name, HASH_A)?;
        assert_eq!(read_ref(&dir, name)?, Some(HASH_A.to_string()), "ref {}", name);
    }
    Ok(())
}

#[test]
fn test_symbolic_head_resolves_through_branch() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    write_head(&dir, &MgitHead::Symbolic("refs/heads/main".to_string()))?;
    assert_eq!(fs::read_to_string(dir.head_path())?, "ref: refs/heads/main\n");

    // Unborn branch
    assert_eq!(resolve_head(&dir)?, None);

    update_ref(&dir, "refs/heads/main", HASH_A)?;
    assert_eq!(resolve_head(&dir)?, Some(HASH_A.to_string()));
    Ok(())
}

#[test]
fn test_detached_head_resolves_directly() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    write_head(&dir, &MgitHead::Detached(HASH_B.to_string()))?;

    assert_eq!(read_head(&dir)?, Some(MgitHead::Detached(HASH_B.to_string())));
    assert_eq!(resolve_head(&dir)?, Some(HASH_B.to_string()));
    Ok(())
}

#[test]
fn test_resolution_follows_only_one_level() -> Result<()> {
    let (_tmp, dir) = test_dir()?;

    write_head(&dir, &MgitHead::Symbolic("refs/heads/alias".to_string()))?;
    fs::write(dir.path().join("refs/heads/alias"), "ref: refs/heads/main\n")?;
    update_ref(&dir, "refs/heads/main", HASH_A)?;

    assert_eq!(resolve_head(&dir)?, Some("ref: refs/heads/main".to_string()));
    Ok(())
}

#[test]
fn test_missing_head_resolves_to_none() -> Result<()> {
    let (_tmp, dir) = test_dir()?;
    assert_eq!(read_head(&dir)?, None);
    assert_eq!(resolve_head(&dir)?, None);
    Ok(())
}

#[test]
fn test_branch_ref() {
    assert_eq!(branch_ref("main"), "refs/heads/main");
}
