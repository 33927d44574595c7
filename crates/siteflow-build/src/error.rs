use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Unsupported framework: {0}")]
    UnsupportedFramework(String),

    #[error("Dependency install failed: `{command}` exited with {status}")]
    InstallFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Build failed: `{command}` exited with {status}")]
    BuildFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Cannot enable static export in {path}: {reason}")]
    ConfigInjection { path: PathBuf, reason: String },

    #[error("Build output not found under {0}")]
    OutputNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Operator-facing message with the next step to take
    pub fn user_message(&self) -> String {
        match self {
            BuildError::CloneFailed { url, message } => {
                format!(
                    "Could not clone {}\n\
                     {}\n\
                     \n\
                     Check that:\n\
                     1. the URL is correct and the repository exists\n\
                     2. git can access it without prompting (public repo, SSH key or credential helper)\n\
                     3. the branch passed with --branch exists",
                    url, message
                )
            }
            BuildError::ToolNotFound(tool) => {
                format!(
                    "`{}` is not installed or not on PATH.\n\
                     \n\
                     siteflow runs git and the project's package manager (npm, yarn or pnpm) locally.",
                    tool
                )
            }
            BuildError::UnsupportedFramework(reason) => {
                format!(
                    "Could not detect a supported framework: {}\n\
                     \n\
                     Supported: Next.js (static export), Angular, React.\n\
                     The repository root must contain a package.json.",
                    reason
                )
            }
            BuildError::InstallFailed {
                command, output, ..
            }
            | BuildError::BuildFailed {
                command, output, ..
            } => {
                format!("{}\n\nCommand: {}\n\nLast output:\n{}", self, command, output)
            }
            BuildError::ConfigInjection { path, reason } => {
                format!(
                    "{}\n\
                     \n\
                     Add `output: \"export\"` to the config object in {} and deploy again.\n\
                     ({})",
                    self,
                    path.display(),
                    reason
                )
            }
            BuildError::OutputNotFound(root) => {
                format!(
                    "The build finished but no directory with an index.html was found in {}.\n\
                     \n\
                     Looked in the framework's output directory and in build/, dist/ and out/.",
                    root.display()
                )
            }
            _ => format!("{}", self),
        }
    }

    /// Errors raised while obtaining the source
    pub fn is_clone_error(&self) -> bool {
        matches!(
            self,
            BuildError::InvalidRepositoryUrl(_) | BuildError::CloneFailed { .. }
        )
    }

    pub fn is_detection_error(&self) -> bool {
        matches!(self, BuildError::UnsupportedFramework(_))
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
