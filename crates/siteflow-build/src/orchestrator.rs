//! Dependency install, build, and output discovery

use crate::detect::{Detection, NextExport};
use crate::error::{BuildError, Result};
use crate::framework::FrameworkKind;
use crate::nextjs;
use crate::package_manager::PackageManager;
use crate::runner::{CommandRunner, CommandSpec, OUTPUT_TAIL_LINES};
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";
const FALLBACK_OUTPUT_DIRS: [&str; 3] = ["build", "dist", "out"];

/// A finished static build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Absolute path of the directory to publish
    pub output_dir: PathBuf,
    pub framework: FrameworkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Install,
    Build,
}

/// One command of a build plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub stage: Stage,
    pub command: CommandSpec,
}

pub struct BuildOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Commands that build `detection` in `root`, in order
    pub fn plan(root: &Path, detection: &Detection) -> Result<Vec<BuildStep>> {
        if !detection.is_supported() {
            return Err(BuildError::UnsupportedFramework(detection.reason.clone()));
        }

        let pm = PackageManager::detect(root);
        let mut steps = vec![BuildStep {
            stage: Stage::Install,
            command: pm.install(root),
        }];

        let build = |script: &str, extra: &[&str]| BuildStep {
            stage: Stage::Build,
            command: pm.run_script(root, script, extra),
        };

        match detection.kind {
            FrameworkKind::Angular => {
                steps.push(build("build", &["--configuration=production"]));
            }
            FrameworkKind::NextJS => {
                steps.push(build("build", &[]));
                if detection.next_export == Some(NextExport::LegacyCommand) {
                    steps.push(build("export", &[]));
                }
                for step in &mut steps {
                    step.command = step.command.clone().env("NEXT_TELEMETRY_DISABLED", "1");
                }
            }
            FrameworkKind::React | FrameworkKind::Unknown => {
                steps.push(build("build", &[]));
            }
        }

        Ok(steps)
    }

    /// Install dependencies, build, and locate the output directory
    pub async fn build(&self, root: &Path, detection: &Detection) -> Result<BuildArtifact> {
        let steps = Self::plan(root, detection)?;

        if let Some(NextExport::ConfigField { .. }) = &detection.next_export {
            nextjs::ensure_static_export(root)?;
        }

        for step in &steps {
            tracing::info!("Running `{}`", step.command.display());
            let output = self.runner.run(&step.command).await?;
            if output.is_success() {
                continue;
            }

            let command = step.command.display();
            let status = output.status();
            let output = output.tail(OUTPUT_TAIL_LINES);
            return Err(match step.stage {
                Stage::Install => BuildError::InstallFailed {
                    command,
                    status,
                    output,
                },
                Stage::Build => BuildError::BuildFailed {
                    command,
                    status,
                    output,
                },
            });
        }

        let output_dir = resolve_output(root, detection.output_dir.as_deref())?;
        tracing::info!("Build output: {}", output_dir.display());

        Ok(BuildArtifact {
            output_dir,
            framework: detection.kind,
        })
    }
}

/// Find the directory to publish after a build.
///
/// Tries the expected directory, then a direct subdirectory of it holding an
/// `index.html` (Angular's `browser/`), then the expected directory without
/// an index, then the conventional `build`, `dist` and `out`.
pub fn resolve_output(root: &Path, expected: Option<&Path>) -> Result<PathBuf> {
    if let Some(expected) = expected {
        let dir = root.join(expected);
        if dir.join(INDEX_FILE).is_file() {
            return Ok(dir);
        }
        if let Some(sub) = index_subdirectory(&dir)? {
            return Ok(sub);
        }
        if dir.is_dir() {
            tracing::warn!(
                "{} has no {}; publishing it anyway",
                dir.display(),
                INDEX_FILE
            );
            return Ok(dir);
        }
        tracing::debug!("Expected output {} does not exist", dir.display());
    }

    FALLBACK_OUTPUT_DIRS
        .iter()
        .map(|name| root.join(name))
        .find(|dir| dir.join(INDEX_FILE).is_file())
        .ok_or_else(|| BuildError::OutputNotFound(root.to_path_buf()))
}

fn index_subdirectory(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && path.join(INDEX_FILE).is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    let browser = candidates
        .iter()
        .position(|p| p.file_name().is_some_and(|n| n == "browser"));
    Ok(match browser {
        Some(i) => Some(candidates.swap_remove(i)),
        None => candidates.into_iter().next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;
    use crate::testing::ScriptedRunner;
    use std::fs;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    const CRA: &str = r#"{ "dependencies": { "react": "^18.2.0", "react-scripts": "5.0.1" }, "scripts": { "build": "react-scripts build" } }"#;

    #[test]
    fn test_react_plan() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", CRA);
        write(dir.path(), "package-lock.json", "{}");

        let steps = BuildOrchestrator::plan(dir.path(), &detect(dir.path())).unwrap();
        let commands: Vec<String> = steps.iter().map(|s| s.command.display()).collect();
        assert_eq!(commands, vec!["npm ci", "npm run build"]);
    }

    #[test]
    fn test_angular_plan_with_yarn() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", "{}");
        write(dir.path(), "yarn.lock", "");
        write(dir.path(), "angular.json", r#"{ "projects": { "app": {} } }"#);

        let steps = BuildOrchestrator::plan(dir.path(), &detect(dir.path())).unwrap();
        assert_eq!(
            steps[1].command.display(),
            "yarn run build --configuration=production"
        );
    }

    #[test]
    fn test_next_legacy_plan() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{ "dependencies": { "next": "13.4.0" }, "scripts": { "export": "next export" } }"#,
        );

        let steps = BuildOrchestrator::plan(dir.path(), &detect(dir.path())).unwrap();
        let commands: Vec<String> = steps.iter().map(|s| s.command.display()).collect();
        assert_eq!(commands, vec!["npm install", "npm run build", "npm run export"]);
        assert!(
            steps
                .iter()
                .all(|s| s.command.envs.contains(&("NEXT_TELEMETRY_DISABLED".into(), "1".into())))
        );
    }

    #[test]
    fn test_unknown_cannot_be_planned() {
        let dir = tempfile::tempdir().unwrap();
        let result = BuildOrchestrator::plan(dir.path(), &detect(dir.path()));
        assert!(matches!(result, Err(BuildError::UnsupportedFramework(_))));
    }

    #[tokio::test]
    async fn test_build_cra() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", CRA);
        let runner = ScriptedRunner::new().writes(
            "npm run build",
            &[("build/index.html", "<html></html>"), ("build/static/js/main.js", "")],
        );

        let artifact = BuildOrchestrator::new(&runner)
            .build(dir.path(), &detect(dir.path()))
            .await
            .unwrap();

        assert_eq!(artifact.framework, FrameworkKind::React);
        assert_eq!(artifact.output_dir, dir.path().join("build"));
        assert_eq!(runner.calls(), vec!["npm install", "npm run build"]);
    }

    #[tokio::test]
    async fn test_build_failure_carries_output_tail() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", CRA);
        let runner = ScriptedRunner::new().fails("npm run build", 1, "Failed to compile.\nModule not found");

        let err = BuildOrchestrator::new(&runner)
            .build(dir.path(), &detect(dir.path()))
            .await
            .unwrap_err();

        match err {
            BuildError::BuildFailed { command, output, .. } => {
                assert_eq!(command, "npm run build");
                assert!(output.contains("Module not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_install_failure_stops_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", CRA);
        let runner = ScriptedRunner::new().fails("npm install", 1, "ERESOLVE");

        let err = BuildOrchestrator::new(&runner)
            .build(dir.path(), &detect(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::InstallFailed { .. }));
        assert_eq!(runner.calls(), vec!["npm install"]);
    }

    #[tokio::test]
    async fn test_next_build_injects_export() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", r#"{ "dependencies": { "next": "^14.2.0" } }"#);
        write(dir.path(), "next.config.js", "module.exports = {\n  reactStrictMode: true,\n}\n");
        let runner = ScriptedRunner::new().writes(
            "npm run build",
            &[("out/index.html", ""), ("out/404.html", "")],
        );

        let artifact = BuildOrchestrator::new(&runner)
            .build(dir.path(), &detect(dir.path()))
            .await
            .unwrap();

        assert_eq!(artifact.output_dir, dir.path().join("out"));
        assert!(dir.path().join("next.config.js.bak").exists());
        let config = fs::read_to_string(dir.path().join("next.config.js")).unwrap();
        assert!(config.contains("output: \"export\""));
    }

    #[test]
    fn test_resolve_prefers_browser_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dist/app/browser/index.html", "");
        write(dir.path(), "dist/app/3rdpartylicenses.txt", "");

        let resolved = resolve_output(dir.path(), Some(Path::new("dist/app"))).unwrap();
        assert_eq!(resolved, dir.path().join("dist/app/browser"));
    }

    #[test]
    fn test_resolve_falls_back_to_candidates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dist/index.html", "");

        let resolved = resolve_output(dir.path(), Some(Path::new("build"))).unwrap();
        assert_eq!(resolved, dir.path().join("dist"));
    }

    #[test]
    fn test_resolve_uses_existing_dir_without_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "out/app.js", "");

        let resolved = resolve_output(dir.path(), Some(Path::new("out"))).unwrap();
        assert_eq!(resolved, dir.path().join("out"));
    }

    #[test]
    fn test_resolve_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_output(dir.path(), Some(Path::new("build"))),
            Err(BuildError::OutputNotFound(_))
        ));
    }
}
