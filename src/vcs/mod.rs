//! git adapter.
//!
//! Narrow interface over the git subcommands the tool consumes: listing a
//! backup branch's manifest, querying untracked/ignored files, squashing a
//! set of worktree paths onto a branch, and pruning stale branches. The
//! reconciliation engine only sees the [`Vcs`] trait, so its tests inject a
//! fake; listing failures degrade to empty results instead of propagating.

use anyhow::Result;
use chrono::{Datelike, Local};
use std::path::Path;

use crate::shell::{self, quote};
use crate::ui;

/// Prefix shared by every backup branch this tool creates.
pub const BRANCH_PREFIX: &str = "untracked-files";

pub trait Vcs {
    /// Relative paths recorded on `branch`, or empty when the branch does
    /// not exist (a fresh year, a fresh repo) or the query fails.
    fn branch_files(&self, branch: &str) -> Vec<String>;

    /// Relative paths of all currently untracked or gitignored files in the
    /// repository the process is sitting in. Empty on failure.
    fn status_files(&self) -> Vec<String>;

    /// Squash-commit the given worktree paths onto `branch` without touching
    /// HEAD or the worktree. Content-idempotent: an unchanged file set
    /// produces no new commit.
    fn squash_commit(&self, branch: &str, message: &str, paths: &[String]) -> Result<()>;

    /// Prune branches already merged into HEAD. Informational only.
    fn cleanup(&self);
}

/// Backup branch for a repository at the current local year.
pub fn backup_branch(repo_root: &Path) -> String {
    let basename = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    backup_branch_for_year(&basename, Local::now().year())
}

/// Branch name incorporates the year on purpose: a file archived under last
/// year's branch is re-offered and re-saved under the new one.
pub fn backup_branch_for_year(basename: &str, year: i32) -> String {
    format!("{}/{:04}/{}", BRANCH_PREFIX, year, basename)
}

/// Real adapter, shelling out to the git binary in the current directory.
#[derive(Debug, Default)]
pub struct GitVcs;

impl GitVcs {
    pub fn new() -> Self {
        GitVcs
    }
}

impl Vcs for GitVcs {
    fn branch_files(&self, branch: &str) -> Vec<String> {
        let out = shell::run(&format!(
            "git ls-tree -r --name-only {}",
            quote(&format!("refs/heads/{}", branch))
        ));
        if out.success {
            // ls-tree quotes special-character paths the same way status
            // does; saved-set entries must match candidates byte for byte.
            out.lines().iter().map(|l| unquote(l)).collect()
        } else {
            Vec::new()
        }
    }

    fn status_files(&self) -> Vec<String> {
        let out = shell::run("git status --porcelain --untracked-files=all --ignored");
        if out.success {
            parse_status_lines(&out.lines())
        } else {
            Vec::new()
        }
    }

    fn squash_commit(&self, branch: &str, message: &str, paths: &[String]) -> Result<()> {
        let refname = format!("refs/heads/{}", branch);
        let tip = shell::run(&format!("git rev-parse -q --verify {}", quote(&refname)));
        let parent = tip.success.then(|| tip.text.trim().to_string());

        // Build the snapshot in a scratch index so HEAD and the operator's
        // real index stay untouched.
        let index_file = std::env::temp_dir().join(format!(
            "git-housekeep-index-{}",
            std::process::id()
        ));
        let index = quote(&index_file.to_string_lossy());
        let _ = std::fs::remove_file(&index_file);

        // One add per path: a file recorded on the branch may since have
        // vanished from the worktree, and that must not sink the rest.
        for path in paths {
            let out = shell::run(&format!(
                "GIT_INDEX_FILE={} git add -f -- {}",
                index,
                quote(path)
            ));
            if !out.success {
                ui::warn(&format!("could not stage {}: {}", path, out.text.trim()));
            }
        }

        let tree_out = shell::run(&format!("GIT_INDEX_FILE={} git write-tree", index));
        let _ = std::fs::remove_file(&index_file);
        if !tree_out.success {
            anyhow::bail!("git write-tree failed: {}", tree_out.text.trim());
        }
        let tree = tree_out.text.trim().to_string();

        if let Some(ref parent) = parent {
            let parent_tree = shell::run(&format!("git rev-parse {}", quote(&format!("{}^{{tree}}", parent))));
            if parent_tree.success && parent_tree.text.trim() == tree {
                ui::info(&format!("{} already up to date", branch));
                return Ok(());
            }
        }

        let commit_cmd = match parent {
            Some(ref parent) => format!(
                "git commit-tree {} -p {} -m {}",
                quote(&tree),
                quote(parent),
                quote(message)
            ),
            None => format!("git commit-tree {} -m {}", quote(&tree), quote(message)),
        };
        let commit_out = shell::run(&commit_cmd);
        if !commit_out.success {
            anyhow::bail!("git commit-tree failed: {}", commit_out.text.trim());
        }
        let commit = commit_out.text.trim().to_string();

        let update = shell::run(&format!(
            "git update-ref {} {}",
            quote(&refname),
            quote(&commit)
        ));
        if !update.success {
            anyhow::bail!("git update-ref failed: {}", update.text.trim());
        }
        Ok(())
    }

    fn cleanup(&self) {
        let merged = shell::run("git branch --merged HEAD");
        if !merged.success {
            ui::warn("branch cleanup skipped: could not list merged branches");
            return;
        }
        for line in merged.lines() {
            // Current and checked-out-elsewhere branches carry a marker.
            if line.starts_with('*') || line.starts_with('+') {
                continue;
            }
            let name = line.trim();
            if name.is_empty()
                || name == "main"
                || name == "master"
                || name.starts_with(BRANCH_PREFIX)
            {
                continue;
            }
            let out = shell::run(&format!("git branch -d {}", quote(name)));
            if out.success {
                ui::info(&format!("pruned merged branch {}", name));
            } else {
                ui::warn(&format!("could not prune {}: {}", name, out.text.trim()));
            }
        }
        shell::run("git gc --auto --quiet");
    }
}

/// Keep untracked (`?? `) and ignored (`!! `) entries of porcelain status
/// output, stripping the fixed-width status columns.
fn parse_status_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let path = line
                .strip_prefix("?? ")
                .or_else(|| line.strip_prefix("!! "))?;
            Some(unquote(path))
        })
        .collect()
}

/// Undo git's C-style quoting of paths with special characters. Non-ASCII
/// bytes arrive as three-digit octal escapes (`caf\303\251.txt`), so the
/// escapes are decoded byte-wise before reassembling the string.
fn unquote(path: &str) -> String {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    else {
        return path.to_string();
    };
    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(d) if (b'0'..=b'7').contains(&d) => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&n) if (b'0'..=b'7').contains(&n) => {
                            value = value * 8 + u32::from(n - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => bytes.push(other),
            None => break,
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
