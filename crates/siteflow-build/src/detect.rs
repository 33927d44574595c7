//! Framework detection
//!
//! Classification is a fixed, ordered rule table evaluated against the
//! repository root. The first rule that claims the project decides the
//! result, so precedence is Next.js, then Angular, then React.

use crate::framework::FrameworkKind;
use crate::manifest::PackageManifest;
use crate::nextjs::{self, EXPORT_COMMAND_REMOVED_IN};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const ANGULAR_CONFIG: &str = "angular.json";
const NEXT_OUTPUT_DIR: &str = "out";
const REACT_OUTPUT_DIR: &str = "build";
const VITE_OUTPUT_DIR: &str = "dist";

static BUILD_PATH_ENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bBUILD_PATH=['"]?([^\s'"&;]+)"#).expect("valid regex"));
static OUT_DIR_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"--(?:outDir|out-dir)(?:=|\s+)['"]?([^\s'"&;]+)"#).expect("valid regex")
});
static VITE_BUILD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvite\s+build\b").expect("valid regex"));

/// How a Next.js project produces its static export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextExport {
    /// `next build && next export` through the project's `export` script
    LegacyCommand,
    /// `output: "export"` in the config (injected or created when missing)
    ConfigField { config: Option<PathBuf> },
}

/// Result of classifying a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: FrameworkKind,

    /// Expected build output, relative to the repository root
    pub output_dir: Option<PathBuf>,

    /// Static export mode, Next.js only
    pub next_export: Option<NextExport>,

    /// Why this classification was chosen
    pub reason: String,
}

impl Detection {
    fn found(kind: FrameworkKind, output_dir: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            output_dir: Some(output_dir.into()),
            next_export: None,
            reason: reason.into(),
        }
    }

    fn unknown(reason: impl Into<String>) -> Self {
        Self {
            kind: FrameworkKind::Unknown,
            output_dir: None,
            next_export: None,
            reason: reason.into(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.kind.is_supported()
    }
}

/// What the rules look at
struct Project<'a> {
    root: &'a Path,
    manifest: PackageManifest,
}

type Rule = fn(&Project<'_>) -> Option<Detection>;

/// Evaluated in order; the first `Some` wins
const RULES: &[(FrameworkKind, Rule)] = &[
    (FrameworkKind::NextJS, detect_nextjs),
    (FrameworkKind::Angular, detect_angular),
    (FrameworkKind::React, detect_react),
];

/// Classify the repository at `root`
pub fn detect(root: &Path) -> Detection {
    let manifest = match PackageManifest::read(root) {
        Ok(manifest) => manifest,
        Err(issue) => {
            tracing::debug!("Detection stopped: {}", issue);
            return Detection::unknown(issue.to_string());
        }
    };

    let project = Project { root, manifest };
    for (kind, rule) in RULES {
        if let Some(detection) = rule(&project) {
            tracing::debug!("Rule {} matched: {}", kind, detection.reason);
            return detection;
        }
    }

    Detection::unknown("package.json declares none of next, @angular/core (angular.json), react")
}

fn detect_nextjs(project: &Project<'_>) -> Option<Detection> {
    let config = nextjs::find_config(project.root);
    let declared = project.manifest.has_dependency("next");
    if config.is_none() && !declared {
        return None;
    }

    let legacy = project.manifest.script("export").is_some()
        && project
            .manifest
            .major_version("next")
            .is_none_or(|major| major < EXPORT_COMMAND_REMOVED_IN);

    let reason = match &config {
        Some(path) => format!("found {}", file_name(path)),
        None => "package.json depends on next".to_string(),
    };

    let mut detection = Detection::found(FrameworkKind::NextJS, NEXT_OUTPUT_DIR, reason);
    detection.next_export = Some(if legacy {
        NextExport::LegacyCommand
    } else {
        NextExport::ConfigField { config }
    });
    Some(detection)
}

fn detect_angular(project: &Project<'_>) -> Option<Detection> {
    let path = project.root.join(ANGULAR_CONFIG);
    if !path.is_file() {
        return None;
    }

    let workspace: Value = match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|c| serde_json::from_str(&c).map_err(|e| e.to_string()))
    {
        Ok(value) => value,
        Err(e) => return Some(Detection::unknown(format!("angular.json could not be parsed: {}", e))),
    };

    let Some((name, project_config)) = select_angular_project(&workspace) else {
        return Some(Detection::unknown("angular.json defines no projects"));
    };

    let output_dir = angular_output_path(project_config).unwrap_or_else(|| format!("dist/{}", name));
    Some(Detection::found(
        FrameworkKind::Angular,
        output_dir,
        format!("found angular.json (project {})", name),
    ))
}

/// `defaultProject`, else the first application, else the first project
fn select_angular_project(workspace: &Value) -> Option<(&str, &Value)> {
    let projects = workspace.get("projects")?.as_object()?;

    if let Some(default) = workspace.get("defaultProject").and_then(Value::as_str)
        && let Some(config) = projects.get(default)
    {
        return Some((default, config));
    }

    projects
        .iter()
        .find(|(_, p)| p.get("projectType").and_then(Value::as_str) == Some("application"))
        .or_else(|| projects.iter().next())
        .map(|(name, config)| (name.as_str(), config))
}

fn angular_output_path(project: &Value) -> Option<String> {
    let output = project.pointer("/architect/build/options/outputPath")?;
    match output {
        Value::String(path) => Some(path.clone()),
        Value::Object(parts) => {
            let base = parts.get("base").and_then(Value::as_str)?;
            let browser = parts
                .get("browser")
                .and_then(Value::as_str)
                .unwrap_or("browser");
            if browser.is_empty() {
                Some(base.to_string())
            } else {
                Some(format!("{}/{}", base.trim_end_matches('/'), browser))
            }
        }
        _ => None,
    }
}

fn detect_react(project: &Project<'_>) -> Option<Detection> {
    let marker = ["react", "react-scripts"]
        .into_iter()
        .find(|dep| project.manifest.has_dependency(dep))?;

    let output_dir = project
        .manifest
        .script("build")
        .and_then(react_output_dir)
        .unwrap_or_else(|| REACT_OUTPUT_DIR.to_string());

    Some(Detection::found(
        FrameworkKind::React,
        output_dir,
        format!("package.json depends on {}", marker),
    ))
}

/// Output directory named by a React build script, if any
fn react_output_dir(script: &str) -> Option<String> {
    if let Some(c) = BUILD_PATH_ENV.captures(script) {
        return Some(c[1].to_string());
    }
    if let Some(c) = OUT_DIR_FLAG.captures(script) {
        return Some(c[1].to_string());
    }
    VITE_BUILD
        .is_match(script)
        .then(|| VITE_OUTPUT_DIR.to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    const CRA: &str = r#"{
        "name": "cra-app",
        "dependencies": { "react": "^18.2.0", "react-dom": "^18.2.0", "react-scripts": "5.0.1" },
        "scripts": { "start": "react-scripts start", "build": "react-scripts build" }
    }"#;

    #[test]
    fn test_create_react_app() {
        let dir = repo(&[("package.json", CRA)]);
        let detection = detect(dir.path());

        assert_eq!(detection.kind, FrameworkKind::React);
        assert_eq!(detection.output_dir, Some(PathBuf::from("build")));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let dir = repo(&[
            ("package.json", CRA),
            (
                "angular.json",
                r#"{ "projects": { "zeta": { "projectType": "library" }, "alpha": { "projectType": "application" } } }"#,
            ),
        ]);

        let first = detect(dir.path());
        for _ in 0..10 {
            assert_eq!(detect(dir.path()), first);
        }
    }

    #[test]
    fn test_angular_beats_react() {
        let dir = repo(&[
            ("package.json", CRA),
            (
                "angular.json",
                r#"{ "projects": { "myapp": { "projectType": "application" } } }"#,
            ),
        ]);

        assert_eq!(detect(dir.path()).kind, FrameworkKind::Angular);
    }

    #[test]
    fn test_nextjs_beats_angular_and_react() {
        let dir = repo(&[
            ("package.json", CRA),
            ("angular.json", r#"{ "projects": { "a": {} } }"#),
            ("next.config.js", "module.exports = {}"),
        ]);

        let detection = detect(dir.path());
        assert_eq!(detection.kind, FrameworkKind::NextJS);
        assert_eq!(detection.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_angular_output_path_read_exactly() {
        let dir = repo(&[
            ("package.json", r#"{ "dependencies": { "@angular/core": "^17.0.0" } }"#),
            (
                "angular.json",
                r#"{
                    "projects": {
                        "myapp": {
                            "projectType": "application",
                            "architect": { "build": { "options": { "outputPath": "dist/myapp" } } }
                        }
                    }
                }"#,
            ),
        ]);

        let detection = detect(dir.path());
        assert_eq!(detection.kind, FrameworkKind::Angular);
        assert_eq!(detection.output_dir, Some(PathBuf::from("dist/myapp")));
    }

    #[test]
    fn test_angular_object_output_path() {
        let dir = repo(&[
            ("package.json", "{}"),
            (
                "angular.json",
                r#"{ "projects": { "shop": { "architect": { "build": { "options": { "outputPath": { "base": "dist/shop" } } } } } } }"#,
            ),
        ]);

        assert_eq!(
            detect(dir.path()).output_dir,
            Some(PathBuf::from("dist/shop/browser"))
        );
    }

    #[test]
    fn test_angular_project_selection() {
        let workspace: Value = serde_json::from_str(
            r#"{ "projects": { "a-lib": { "projectType": "library" }, "b-app": { "projectType": "application" } } }"#,
        )
        .unwrap();
        assert_eq!(select_angular_project(&workspace).unwrap().0, "b-app");

        let workspace: Value = serde_json::from_str(
            r#"{ "defaultProject": "a-lib", "projects": { "a-lib": {}, "b-app": { "projectType": "application" } } }"#,
        )
        .unwrap();
        assert_eq!(select_angular_project(&workspace).unwrap().0, "a-lib");
    }

    #[test]
    fn test_angular_default_output() {
        let dir = repo(&[
            ("package.json", "{}"),
            ("angular.json", r#"{ "projects": { "portal": { "projectType": "application" } } }"#),
        ]);

        assert_eq!(detect(dir.path()).output_dir, Some(PathBuf::from("dist/portal")));
    }

    #[test]
    fn test_broken_angular_json_is_unknown() {
        let dir = repo(&[("package.json", CRA), ("angular.json", "{ broken")]);
        assert_eq!(detect(dir.path()).kind, FrameworkKind::Unknown);

        let dir = repo(&[("package.json", CRA), ("angular.json", r#"{ "projects": {} }"#)]);
        assert_eq!(detect(dir.path()).kind, FrameworkKind::Unknown);
    }

    #[test]
    fn test_no_manifest_is_unknown() {
        let dir = repo(&[("index.html", "<html></html>")]);
        let detection = detect(dir.path());

        assert_eq!(detection.kind, FrameworkKind::Unknown);
        assert!(detection.output_dir.is_none());
        assert!(detection.reason.contains("package.json"));
    }

    #[test]
    fn test_unparsable_manifest_is_unknown() {
        let dir = repo(&[("package.json", "not json"), ("next.config.js", "module.exports = {}")]);
        assert_eq!(detect(dir.path()).kind, FrameworkKind::Unknown);
    }

    #[test]
    fn test_no_framework_is_unknown() {
        let dir = repo(&[("package.json", r#"{ "dependencies": { "express": "^4" } }"#)]);
        assert_eq!(detect(dir.path()).kind, FrameworkKind::Unknown);
    }

    #[test]
    fn test_next_legacy_export() {
        let dir = repo(&[(
            "package.json",
            r#"{ "dependencies": { "next": "^13.5.0" }, "scripts": { "build": "next build", "export": "next export" } }"#,
        )]);

        assert_eq!(detect(dir.path()).next_export, Some(NextExport::LegacyCommand));
    }

    #[test]
    fn test_next_14_uses_config_field() {
        let dir = repo(&[
            (
                "package.json",
                r#"{ "dependencies": { "next": "14.1.0" }, "scripts": { "export": "next export" } }"#,
            ),
            ("next.config.mjs", "export default {}"),
        ]);

        assert_eq!(
            detect(dir.path()).next_export,
            Some(NextExport::ConfigField {
                config: Some(dir.path().join("next.config.mjs"))
            })
        );
    }

    #[test]
    fn test_next_without_config_file() {
        let dir = repo(&[("package.json", r#"{ "devDependencies": { "next": "latest" } }"#)]);
        let detection = detect(dir.path());

        assert_eq!(detection.kind, FrameworkKind::NextJS);
        assert_eq!(detection.next_export, Some(NextExport::ConfigField { config: None }));
    }

    #[test]
    fn test_react_output_overrides() {
        assert_eq!(
            react_output_dir("BUILD_PATH=./public_html react-scripts build").as_deref(),
            Some("./public_html")
        );
        assert_eq!(react_output_dir("vite build --outDir site").as_deref(), Some("site"));
        assert_eq!(react_output_dir("vite build --out-dir=www").as_deref(), Some("www"));
        assert_eq!(react_output_dir("tsc && vite build").as_deref(), Some("dist"));
        assert_eq!(react_output_dir("react-scripts build"), None);
    }

    #[test]
    fn test_vite_react_project() {
        let dir = repo(&[(
            "package.json",
            r#"{ "dependencies": { "react": "^18" }, "scripts": { "build": "tsc && vite build" } }"#,
        )]);

        assert_eq!(detect(dir.path()).output_dir, Some(PathBuf::from("dist")));
    }
}
