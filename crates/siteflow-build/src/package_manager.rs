use crate::runner::CommandSpec;
use std::path::Path;

/// Node package manager, chosen from the lockfile in the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub fn detect(root: &Path) -> Self {
        if root.join("pnpm-lock.yaml").is_file() {
            PackageManager::Pnpm
        } else if root.join("yarn.lock").is_file() {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Dependency install command
    pub fn install(&self, root: &Path) -> CommandSpec {
        let verb = match self {
            PackageManager::Npm if root.join("package-lock.json").is_file() => "ci",
            _ => "install",
        };
        CommandSpec::new(self.program(), root).arg(verb)
    }

    /// `run <script>` with extra arguments forwarded to the script
    pub fn run_script(&self, root: &Path, script: &str, extra: &[&str]) -> CommandSpec {
        let spec = CommandSpec::new(self.program(), root).args(["run", script]);
        match self {
            PackageManager::Npm if !extra.is_empty() => spec.arg("--").args(extra.iter().copied()),
            _ => spec.args(extra.iter().copied()),
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program())
    }
}
