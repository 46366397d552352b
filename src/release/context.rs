//! Release context: which branch and commit a release run is for.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::constants::tag;

/// Branch and commit the release was triggered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    pub branch: String,
    pub commit: String,
}

impl ReleaseContext {
    pub fn new(branch: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            commit: commit.into(),
        }
    }

    /// Resolve the context from CI environment variables, falling back
    /// to the git working tree. Missing commit information is fatal.
    pub fn resolve(project_path: &Path) -> Result<Self> {
        if let Some(ctx) = Self::from_ci_env() {
            debug!("Release context from CI environment: {:?}", ctx);
            return Ok(ctx);
        }
        let ctx = Self::from_git(project_path)?;
        debug!("Release context from git: {:?}", ctx);
        Ok(ctx)
    }

    fn from_ci_env() -> Option<Self> {
        let branch = std::env::var("GITHUB_REF_NAME").ok()?;
        let commit = std::env::var("GITHUB_SHA").ok()?;
        if branch.is_empty() || commit.is_empty() {
            return None;
        }
        Some(Self::new(branch, commit))
    }

    fn from_git(project_path: &Path) -> Result<Self> {
        let branch = git_output(project_path, &["rev-parse", "--abbrev-ref", "HEAD"])
            .context("Failed to resolve current branch")?;
        let commit = git_output(project_path, &["rev-parse", "HEAD"])
            .context("Failed to resolve current commit")?;
        Ok(Self::new(branch, commit))
    }

    /// The commit-derived immutable tag.
    pub fn short_sha(&self) -> String {
        short_sha(&self.commit)
    }

    /// Single publish gate: only the designated branch publishes.
    pub fn should_publish(&self, designated_branch: &str) -> bool {
        self.branch == designated_branch
    }
}

/// Abbreviate a commit id to its tag form. Deterministic; input
/// already shorter than the tag length passes through unchanged.
pub fn short_sha(commit: &str) -> String {
    commit.chars().take(tag::SHORT_SHA_LEN).collect()
}

fn git_output(project_path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_path)
        .output()
        .context("Failed to execute git")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {:?} failed: {}", args, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
