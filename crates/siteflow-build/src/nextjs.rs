//! Next.js static export configuration

use crate::error::{BuildError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Config file names, in lookup order
pub const CONFIG_FILES: [&str; 3] = ["next.config.js", "next.config.mjs", "next.config.ts"];

/// Config written when the project has none
pub const GENERATED_CONFIG: &str = "next.config.mjs";

/// Release that removed `next export`
pub const EXPORT_COMMAND_REMOVED_IN: u64 = 14;

static OUTPUT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\boutput\s*:\s*(?:['"`]([A-Za-z-]+)['"`])?"#).expect("valid regex")
});

static EXPORT_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:module\.exports\s*=\s*\{|const\s+nextConfig\s*(?::\s*[\w.]+\s*)?=\s*\{|export\s+default\s*\{)",
    )
    .expect("valid regex")
});

/// What `ensure_static_export` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSetup {
    /// The config already sets `output: "export"`
    AlreadyConfigured(PathBuf),
    /// `output: "export"` was added; the original is at `backup`
    Injected { config: PathBuf, backup: PathBuf },
    /// No config existed; a minimal one was written
    Created(PathBuf),
}

/// First Next.js config file present in `root`
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Value of the `output:` field, `Some("")` when present but not a string literal
pub fn output_field(content: &str) -> Option<String> {
    OUTPUT_FIELD
        .captures(content)
        .map(|c| c.get(1).map_or(String::new(), |m| m.as_str().to_string()))
}

/// Insert `output: "export"` at the top of the exported config object
pub fn inject_export_output(content: &str) -> Option<String> {
    let anchor = EXPORT_OBJECT.find(content)?;
    let mut updated = String::with_capacity(content.len() + 24);
    updated.push_str(&content[..anchor.end()]);
    updated.push_str("\n  output: \"export\",");
    updated.push_str(&content[anchor.end()..]);
    Some(updated)
}

/// Make sure `next build` writes a static export to `out/`
pub fn ensure_static_export(root: &Path) -> Result<ExportSetup> {
    let Some(config) = find_config(root) else {
        let path = root.join(GENERATED_CONFIG);
        std::fs::write(
            &path,
            "/** @type {import('next').NextConfig} */\nexport default { output: \"export\" };\n",
        )?;
        tracing::info!("Created {} with static export enabled", GENERATED_CONFIG);
        return Ok(ExportSetup::Created(path));
    };

    let content = std::fs::read_to_string(&config)?;
    match output_field(&content).as_deref() {
        Some("export") => return Ok(ExportSetup::AlreadyConfigured(config)),
        Some(other) => {
            let value = if other.is_empty() { "a computed value" } else { other };
            return Err(BuildError::ConfigInjection {
                path: config,
                reason: format!("`output` is already set to {}", value),
            });
        }
        None => {}
    }

    let updated = inject_export_output(&content).ok_or_else(|| BuildError::ConfigInjection {
        path: config.clone(),
        reason: "no exported config object found".to_string(),
    })?;

    let backup = backup_path(&config);
    std::fs::copy(&config, &backup)?;
    std::fs::write(&config, updated)?;
    tracing::info!(
        "Enabled static export in {} (original saved as {})",
        config.display(),
        backup.display()
    );

    Ok(ExportSetup::Injected { config, backup })
}

fn backup_path(config: &Path) -> PathBuf {
    let mut name = config.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
