//! Read-only git queries with fixed timeouts.
//!
//! Every query yields `None` when git is missing, the directory is not a
//! repository, the command fails, or the timeout expires. The child process
//! is killed when its timeout expires.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::debug;

const BRANCH_TIMEOUT: Duration = Duration::from_secs(5);
const LOG_TIMEOUT: Duration = Duration::from_secs(10);
const DIFF_TIMEOUT: Duration = Duration::from_secs(15);

/// Number of hot files reported by [`Git::recent_changes`].
pub const HOT_FILE_LIMIT: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotFile {
    pub file: String,
    pub changes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentChanges {
    /// `hash|author|relative date|subject` lines with file stats.
    pub log: String,
    /// `git diff --stat HEAD`, empty when clean or unavailable.
    pub uncommitted: String,
    pub hot_files: Vec<HotFile>,
}

#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run(&self, args: &[&str], limit: Duration) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .kill_on_drop(true)
            .output();
        let output = match timeout(limit, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!(?args, error = %e, "git not runnable");
                return None;
            }
            Err(_) => {
                debug!(?args, timeout_secs = limit.as_secs(), "git timed out");
                return None;
            }
        };
        if !output.status.success() {
            debug!(
                ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git failed"
            );
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Name of the checked-out branch. Detached heads give `None`.
    pub async fn current_branch(&self) -> Option<String> {
        let out = self.run(&["branch", "--show-current"], BRANCH_TIMEOUT).await?;
        let branch = out.trim();
        (!branch.is_empty()).then(|| branch.to_string())
    }

    /// Last `count` commits with file stats.
    pub async fn recent_log(&self, count: usize) -> Option<String> {
        let depth = format!("-{count}");
        let out = self
            .run(
                &["log", &depth, "--pretty=format:%h|%an|%ar|%s", "--stat"],
                LOG_TIMEOUT,
            )
            .await?;
        Some(out.trim().to_string())
    }

    /// Stat of uncommitted changes against `HEAD`.
    pub async fn uncommitted_stat(&self) -> Option<String> {
        let out = self.run(&["diff", "--stat", "HEAD"], LOG_TIMEOUT).await?;
        Some(out.trim().to_string())
    }

    /// Files touched most often in the last `count` commits.
    pub async fn hot_files(&self, count: usize) -> Option<Vec<HotFile>> {
        let depth = format!("-{count}");
        let out = self
            .run(&["log", &depth, "--pretty=format:", "--name-only"], LOG_TIMEOUT)
            .await?;
        Some(rank_hot_files(&out))
    }

    /// Log, uncommitted stat and hot files. `None` when the log fails.
    pub async fn recent_changes(&self, count: usize) -> Option<RecentChanges> {
        let log = self.recent_log(count).await?;
        let uncommitted = self.uncommitted_stat().await.unwrap_or_default();
        let hot_files = self.hot_files(count).await.unwrap_or_default();
        Some(RecentChanges {
            log,
            uncommitted,
            hot_files,
        })
    }

    /// Zero-context diff of the working tree against `reference` (`HEAD`
    /// when absent).
    pub async fn diff(&self, reference: Option<&str>) -> Option<String> {
        let reference = reference.unwrap_or("HEAD");
        self.run(
            &["diff", reference, "--unified=0", "--no-color"],
            DIFF_TIMEOUT,
        )
        .await
    }
}

fn rank_hot_files(name_only: &str) -> Vec<HotFile> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in name_only.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line).or_default() += 1;
    }
    let mut ranked: Vec<HotFile> = counts
        .into_iter()
        .map(|(file, changes)| HotFile {
            file: file.to_string(),
            changes,
        })
        .collect();
    ranked.sort_by(|a, b| b.changes.cmp(&a.changes).then_with(|| a.file.cmp(&b.file)));
    ranked.truncate(HOT_FILE_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn git_ok(repo: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_rank_hot_files() {
        let out = "src/a.rs\nsrc/b.rs\n\nsrc/a.rs\nREADME.md\n\nsrc/a.rs\nsrc/b.rs\n";
        let ranked = rank_hot_files(out);
        assert_eq!(
            ranked,
            vec![
                HotFile { file: "src/a.rs".into(), changes: 3 },
                HotFile { file: "src/b.rs".into(), changes: 2 },
                HotFile { file: "README.md".into(), changes: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_outside_repository_is_none() {
        let dir = tempdir().unwrap();
        let git = Git::new(dir.path().join("missing"));
        assert!(git.current_branch().await.is_none());
        assert!(git.recent_changes(5).await.is_none());
        assert!(git.diff(None).await.is_none());
    }

    #[tokio::test]
    async fn test_queries_in_repository() {
        let dir = tempdir().unwrap();
        let repo = dir.path();
        // skip when git is not installed
        if !git_ok(repo, &["init", "-b", "main"]).await {
            return;
        }
        git_ok(repo, &["config", "user.email", "test@example.com"]).await;
        git_ok(repo, &["config", "user.name", "Test"]).await;
        std::fs::write(repo.join("a.py"), "x = 1\n").unwrap();
        git_ok(repo, &["add", "."]).await;
        if !git_ok(repo, &["commit", "--no-gpg-sign", "-m", "first"]).await {
            return;
        }

        let git = Git::new(repo);
        assert_eq!(git.current_branch().await.as_deref(), Some("main"));

        let changes = git.recent_changes(5).await.unwrap();
        assert!(changes.log.contains("|Test|"));
        assert!(changes.log.contains("first"));
        assert!(changes.uncommitted.is_empty());
        assert_eq!(changes.hot_files, vec![HotFile { file: "a.py".into(), changes: 1 }]);

        std::fs::write(repo.join("a.py"), "x = 2\n").unwrap();
        let diff = git.diff(None).await.unwrap();
        assert!(diff.contains("diff --git a/a.py b/a.py"));
        assert!(diff.contains("+x = 2"));
    }
}
