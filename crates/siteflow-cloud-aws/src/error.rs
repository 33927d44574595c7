//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("No AWS region configured. Pass --region, run `siteflow configure`, or set AWS_REGION")]
    NoRegion,

    #[error("Configuration error: {0}")]
    Config(#[from] siteflow_config::ConfigError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] siteflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, AwsError>;
