//! Top-level error kinds and process exit codes

use siteflow_build::BuildError;
use siteflow_cloud::{CloudError, PublishReport};
use siteflow_cloud_aws::AwsError;
use siteflow_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Clone error: {0}")]
    Clone(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiteflowError {
    pub fn exit_code(&self) -> u8 {
        match self {
            SiteflowError::Config(_) => 2,
            SiteflowError::Auth(_) => 3,
            SiteflowError::Clone(_) => 4,
            SiteflowError::Detection(_) => 5,
            SiteflowError::Build(_) => 6,
            SiteflowError::Publish(_) => 7,
            SiteflowError::Ledger(_) => 8,
            SiteflowError::Other(_) => 1,
        }
    }
}

impl From<ConfigError> for SiteflowError {
    fn from(e: ConfigError) -> Self {
        SiteflowError::Config(e.to_string())
    }
}

impl From<CloudError> for SiteflowError {
    fn from(e: CloudError) -> Self {
        if e.is_ledger_error() {
            return SiteflowError::Ledger(e.to_string());
        }
        match e {
            CloudError::AuthenticationFailed(_) => SiteflowError::Auth(e.to_string()),
            CloudError::InvalidConfig(_) | CloudError::InvalidBucketName { .. } => {
                SiteflowError::Config(e.to_string())
            }
            _ => SiteflowError::Publish(e.to_string()),
        }
    }
}

impl From<AwsError> for SiteflowError {
    fn from(e: AwsError) -> Self {
        match e {
            AwsError::NoRegion => SiteflowError::Config(e.to_string()),
            AwsError::Config(inner) => inner.into(),
            AwsError::Cloud(inner) => inner.into(),
        }
    }
}

/// A publish that left some objects behind
impl From<PublishReport> for SiteflowError {
    fn from(report: PublishReport) -> Self {
        SiteflowError::Publish(format!(
            "{} of {} objects failed to upload to {}",
            report.failed.len(),
            report.total(),
            report.bucket
        ))
    }
}

impl From<BuildError> for SiteflowError {
    fn from(e: BuildError) -> Self {
        if e.is_clone_error() {
            SiteflowError::Clone(e.user_message())
        } else if e.is_detection_error() {
            SiteflowError::Detection(e.user_message())
        } else {
            SiteflowError::Build(e.user_message())
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteflowError>;
