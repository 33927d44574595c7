//! `package.json` reading

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

pub const MANIFEST_FILE: &str = "package.json";

static MAJOR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*(\d+)").expect("valid regex"));

/// The fields of `package.json` detection looks at
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Why a manifest could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestIssue {
    Missing,
    Unparsable(String),
}

impl std::fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestIssue::Missing => write!(f, "no {} at the repository root", MANIFEST_FILE),
            ManifestIssue::Unparsable(e) => write!(f, "{} could not be parsed: {}", MANIFEST_FILE, e),
        }
    }
}

impl PackageManifest {
    pub fn read(root: &Path) -> Result<Self, ManifestIssue> {
        let path = root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestIssue::Missing);
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| ManifestIssue::Unparsable(e.to_string()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestIssue> {
        serde_json::from_str(content).map_err(|e| ManifestIssue::Unparsable(e.to_string()))
    }

    /// Version range of a dependency or dev dependency
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .map(String::as_str)
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependency(name).is_some()
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Major version of a dependency when its range starts with a number
    /// (`^13.4.0`, `~14`, `14.x`); `None` for tags like `latest`
    pub fn major_version(&self, name: &str) -> Option<u64> {
        let range = self.dependency(name)?;
        MAJOR_VERSION
            .captures(range.trim())
            .and_then(|c| c[1].parse().ok())
    }
}
