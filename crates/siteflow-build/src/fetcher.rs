//! Repository cloning

use crate::error::{BuildError, Result};
use crate::runner::{CommandRunner, CommandSpec, OUTPUT_TAIL_LINES};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKDIR_PREFIX: &str = "siteflow-";
const ACCEPTED_SCHEMES: [&str; 5] = ["https://", "http://", "ssh://", "git://", "file://"];

/// A cloned repository inside a temporary directory.
///
/// The directory is deleted on drop unless `keep` is called.
#[derive(Debug)]
pub struct Workdir {
    temp: TempDir,
    repo: PathBuf,
    name: String,
}

impl Workdir {
    /// Repository root
    pub fn path(&self) -> &Path {
        &self.repo
    }

    /// Repository name derived from the URL
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keep the directory on disk and return the repository root
    pub fn keep(self) -> PathBuf {
        let base = self.temp.keep();
        tracing::debug!("Keeping work directory {}", base.display());
        self.repo
    }
}

/// Accepts remote URLs git can clone without a local checkout of ours
pub fn validate_repository_url(url: &str) -> Result<()> {
    let url = url.trim();
    let invalid = |reason: &str| Err(BuildError::InvalidRepositoryUrl(format!("{} ({})", url, reason)));

    if url.is_empty() {
        return invalid("empty");
    }
    if url.chars().any(char::is_whitespace) {
        return invalid("contains whitespace");
    }

    let scp_like = url.starts_with("git@") && url.contains(':');
    if !scp_like && !ACCEPTED_SCHEMES.iter().any(|s| url.starts_with(s)) {
        return invalid("expected https://, ssh://, git:// or git@host:owner/repo");
    }
    if repository_name(url).is_empty() {
        return invalid("no repository name");
    }
    Ok(())
}

/// Last path segment of the URL without `.git`
pub fn repository_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

pub struct RepositoryFetcher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> RepositoryFetcher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Shallow-clone `url` (optionally at `branch`) into a fresh temporary directory
    pub async fn fetch(&self, url: &str, branch: Option<&str>) -> Result<Workdir> {
        validate_repository_url(url)?;
        let url = url.trim();
        let name = repository_name(url);

        let temp = tempfile::Builder::new().prefix(WORKDIR_PREFIX).tempdir()?;
        let repo = temp.path().join(&name);

        let mut command = CommandSpec::new("git", temp.path())
            .args(["clone", "--depth", "1"])
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(branch) = branch {
            command = command.args(["--branch", branch]);
        }
        command = command.arg("--").arg(url).arg(repo.to_string_lossy());

        tracing::info!("Cloning {}", url);
        let output = self.runner.run(&command).await.map_err(|e| match e {
            BuildError::ToolNotFound(_) => e,
            other => BuildError::CloneFailed {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;

        if !output.is_success() {
            return Err(BuildError::CloneFailed {
                url: url.to_string(),
                message: output.tail(OUTPUT_TAIL_LINES),
            });
        }
        if !repo.is_dir() {
            return Err(BuildError::CloneFailed {
                url: url.to_string(),
                message: "git reported success but the checkout is missing".to_string(),
            });
        }

        tracing::debug!("Cloned into {}", repo.display());
        Ok(Workdir { temp, repo, name })
    }
}
