use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use slog::Logger;

use crate::inspect::show_mcommit;
use crate::object_store::{MgitCommitObject, MgitSignature};

pub fn run(repo_root: &Path, commit_ref: &str, pubkey: Option<&str>, json: bool, log: &Logger) -> Result<()> {
    let object = show_mcommit(repo_root, commit_ref, pubkey, log)?;

    if json {
        let text = serde_json::to_string_pretty(&object).context("Failed to serialize MGit commit")?;
        println!("{}", text);
    } else {
        print_commit(&object);
    }
    Ok(())
}

/// git-show style header followed by the indented message
pub(crate) fn print_commit(object: &MgitCommitObject) {
    println!("{} {}", "commit".yellow(), object.mgit_hash.yellow());
    println!("Git:    {}", object.git_hash);
    if object.parent_hashes.len() > 1 {
        println!("Merge:  {}", object.parent_hashes.join(" "));
    }
    println!("Author: {}", signature_line(&object.author));
    if object.committer != object.author {
        println!("Commit: {}", signature_line(&object.committer));
    }
    println!("Date:   {}", object.author.when);
    println!();
    for line in object.message.lines() {
        println!("    {}", line);
    }
    println!();
}

fn signature_line(sig: &MgitSignature) -> String {
    format!("{} <{}> {}", sig.name, sig.email, sig.pubkey.dimmed())
}
