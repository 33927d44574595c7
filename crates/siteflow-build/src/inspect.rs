//! Sanity checks on a build output directory

use crate::error::Result;
use std::path::Path;

/// An `index.html` smaller than this is almost certainly a broken build
pub const SMALL_INDEX_BYTES: u64 = 100;

const MOUNT_POINTS: &[&str] = &[r#"<div id="root""#, r#"<div id="app""#, "<app-root"];

/// What the output directory looks like before it is published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputInspection {
    /// Size of `index.html`, `None` when there is none
    pub index_size: Option<u64>,

    /// `index.html` contains a root element a client-side app mounts into
    pub has_mount_point: bool,

    /// `index.html` references at least one script file
    pub has_script_imports: bool,

    /// Top-level `.js` files, sorted
    pub scripts: Vec<String>,

    /// Top-level entries, sorted
    pub entries: Vec<String>,
}

impl OutputInspection {
    pub fn inspect(output_dir: &Path) -> Result<Self> {
        let mut inspection = Self::default();

        for entry in std::fs::read_dir(output_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_file() && name.ends_with(".js") {
                inspection.scripts.push(name.clone());
            }
            inspection.entries.push(name);
        }
        inspection.scripts.sort();
        inspection.entries.sort();

        let index = output_dir.join("index.html");
        if index.is_file() {
            let bytes = std::fs::read(&index)?;
            let html = String::from_utf8_lossy(&bytes);
            inspection.index_size = Some(bytes.len() as u64);
            inspection.has_mount_point = MOUNT_POINTS.iter().any(|m| html.contains(m));
            inspection.has_script_imports = html.contains(r#".js""#);
        }

        Ok(inspection)
    }

    pub fn has_index(&self) -> bool {
        self.index_size.is_some()
    }

    pub fn index_looks_small(&self) -> bool {
        self.index_size.is_some_and(|size| size < SMALL_INDEX_BYTES)
    }
}
