//! Hosting provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Bucket name '{0}' is already taken by another account")]
    BucketNameTaken(String),

    #[error("Bucket '{0}' exists but is not accessible with these credentials")]
    BucketNotOwned(String),

    #[error("Bucket '{0}' already exists but was not created by siteflow; choose another name")]
    BucketNotTracked(String),

    #[error("Invalid bucket name '{name}': {reason}")]
    InvalidBucketName { name: String, reason: String },

    #[error("Failed to configure bucket '{bucket}' ({step}): {message}")]
    BucketConfiguration {
        bucket: String,
        step: String,
        message: String,
    },

    #[error("Nothing to publish: {0}")]
    EmptySource(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Errors that come from the local ledger rather than the provider
    pub fn is_ledger_error(&self) -> bool {
        matches!(
            self,
            CloudError::StateError(_) | CloudError::LockError(_) | CloudError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
