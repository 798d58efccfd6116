use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub const PUBKEY: &str = "npub1clinician";

/// Path to the mgit binary built for this test run
pub fn mgit_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mgit"))
}

/// Helper to initialize a git repository on `main` with MGit metadata
///
/// No commits are made; the first `mgit commit` is the root.
pub fn init_test_repo(dir: &Path) -> Result<()> {
    run_git(dir, &["init"])?;
    run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    run_git(dir, &["config", "user.name", "Test User"])?;
    run_git(dir, &["config", "user.email", "test@example.com"])?;
    run_git(dir, &["config", "commit.gpgsign", "false"])?;
    fs::create_dir_all(dir.join(".git/info"))?;
    fs::write(dir.join(".git/info/exclude"), ".test-config/\n")?;

    let output = run_mgit(dir, &["init"])?;
    assert!(output.status.success(), "mgit init failed: {}", stderr(&output));
    Ok(())
}

/// Helper to run mgit with an isolated user config directory
pub fn run_mgit(dir: &Path, args: &[&str]) -> Result<Output> {
    let config_home = dir.join(".test-config");
    fs::create_dir_all(&config_home)?;
    Ok(Command::new(mgit_binary())
        .args(args)
        .current_dir(dir)
        .env("HOME", &config_home)
        .env("XDG_CONFIG_HOME", &config_home)
        .env_remove("MGIT_PUBKEY")
        .env("NO_COLOR", "1")
        .stdin(Stdio::null())
        .output()?)
}

/// `mgit commit -a` with explicit identity, asserting success
pub fn mgit_commit(dir: &Path, file: &str, content: &str, message: &str) -> Result<Output> {
    fs::write(dir.join(file), content)?;
    let output = run_mgit(
        dir,
        &[
            "commit",
            "-a",
            "-m",
            message,
            "--author-name",
            "Dr. Bob",
            "--author-email",
            "bob@clinic.org",
            "--pubkey",
            PUBKEY,
        ],
    )?;
    assert!(output.status.success(), "mgit commit failed: {}", stderr(&output));
    Ok(output)
}

/// Helper to run git commands directly (bypassing MGit)
pub fn run_git(dir: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new("git").args(args).current_dir(dir).output()?)
}

/// Helper to get commit hash for a revision
pub fn get_commit_hash(dir: &Path, revision: &str) -> Result<String> {
    let output = run_git(dir, &["rev-parse", revision])?;
    Ok(stdout(&output).trim().to_string())
}

/// Parsed canonical mapping table
pub fn read_mappings(dir: &Path) -> Result<serde_json::Value> {
    let bytes = fs::read(dir.join(".mgit/mappings/hash_mappings.json"))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
