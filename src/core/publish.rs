use crate::adapters::process::{failure_reason, run_command};
use crate::domain::model::PublishOutcome;
use crate::utils::error::{ForgeError, Result};
use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;
use std::process::Output;

pub const DEFAULT_GIT_PROGRAM: &str = "git";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update rule-sets {timestamp}";

/// Stages and commits generated rule-sets with an external git.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    program: String,
    args: Vec<String>,
    repo_dir: PathBuf,
    paths: Vec<String>,
    message: String,
    push: bool,
}

impl GitPublisher {
    pub fn new(repo_dir: impl Into<PathBuf>, paths: Vec<String>) -> Self {
        Self {
            program: DEFAULT_GIT_PROGRAM.to_string(),
            args: Vec::new(),
            repo_dir: repo_dir.into(),
            paths,
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            push: false,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Leading arguments for every invocation, e.g. `-c user.name=bot`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    /// `{timestamp}` expands to the current UTC time.
    pub fn commit_message(&self) -> String {
        self.message.replace(
            "{timestamp}",
            &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub async fn publish(&self) -> Result<PublishOutcome> {
        let paths = self.existing_paths().await;
        if paths.is_empty() {
            tracing::info!("No rule-set paths exist yet, nothing to commit");
            return Ok(PublishOutcome::NothingToCommit);
        }

        let mut add = vec!["add", "-A", "--"];
        add.extend(paths);
        self.git(&add).await?;

        // diff --quiet: 0 = clean index, 1 = staged changes
        let diff = self.run(&["diff", "--cached", "--quiet"]).await?;
        match diff.status.code() {
            Some(0) => {
                tracing::info!("No rule-set changes to commit");
                return Ok(PublishOutcome::NothingToCommit);
            }
            Some(1) => {}
            _ => {
                return Err(ForgeError::PublishError {
                    message: format!("git diff failed: {}", failure_reason(&diff)),
                })
            }
        }

        let message = self.commit_message();
        self.git(&["commit", "-m", message.as_str()]).await?;
        tracing::info!("📝 Committed: {}", message);

        if self.push {
            self.git(&["push"]).await?;
            tracing::info!("🚀 Pushed to remote");
        }

        Ok(PublishOutcome::Committed { pushed: self.push })
    }

    /// git rejects a pathspec that matches nothing, so missing paths are left out.
    async fn existing_paths(&self) -> Vec<&str> {
        let mut existing = Vec::new();
        for path in &self.paths {
            match tokio::fs::try_exists(self.repo_dir.join(path)).await {
                Ok(true) => existing.push(path.as_str()),
                Ok(false) => tracing::debug!("Not staging missing {}", path),
                Err(e) => tracing::warn!("Not staging {}: {}", path, e),
            }
        }
        existing
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let full_args = self.args.iter().map(String::as_str).chain(args.iter().copied());
        run_command(&self.program, full_args, Some(self.repo_dir.as_path())).await
    }

    async fn git(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(ForgeError::PublishError {
                message: format!("git {} failed: {}", args[0], failure_reason(&output)),
            });
        }
        Ok(())
    }
}
