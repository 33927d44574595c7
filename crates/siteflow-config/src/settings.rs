//! Non-secret settings
//!
//! Layered from `settings.toml` in the state directory and `SITEFLOW_*`
//! environment variables (environment wins).

use crate::SiteflowPaths;
use crate::credentials::validate_region;
use crate::error::{ConfigError, Result};
use serde::Deserialize;

const DEFAULT_BUCKET_PREFIX: &str = "static-site";
const DEFAULT_UPLOAD_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Region used when the credential source does not provide one
    pub region: Option<String>,

    /// Prefix for generated bucket names
    pub bucket_prefix: String,

    /// Maximum number of concurrent object uploads
    pub upload_concurrency: usize,

    /// Keep the cloned working directory after a deploy
    pub keep_workdir: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: None,
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            keep_workdir: false,
        }
    }
}

impl Settings {
    pub fn load(paths: &SiteflowPaths) -> Result<Self> {
        let settings_path = paths.settings_path();

        let settings: Settings = config::Config::builder()
            .add_source(
                config::File::from(settings_path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("SITEFLOW").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upload_concurrency == 0 {
            return Err(ConfigError::InvalidSetting(
                "upload_concurrency must be at least 1".to_string(),
            ));
        }
        if !is_valid_bucket_prefix(&self.bucket_prefix) {
            return Err(ConfigError::InvalidSetting(format!(
                "bucket_prefix '{}' must be 3-40 lowercase letters, digits or hyphens",
                self.bucket_prefix
            )));
        }
        if let Some(region) = &self.region {
            validate_region(region)?;
        }
        Ok(())
    }
}

fn is_valid_bucket_prefix(prefix: &str) -> bool {
    (3..=40).contains(&prefix.len())
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !prefix.starts_with('-')
}
