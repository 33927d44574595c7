//! Hosting provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object storage with static-website hosting.
///
/// The publisher, `init` and `rollback` flows only talk to storage through
/// this trait, so they run unchanged against the in-memory provider in tests.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws-s3")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Region all buckets of this provider live in
    fn region(&self) -> &str;

    /// Check that the resolved credentials are accepted by the provider
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Whether the bucket exists and is owned by the current account
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket (already owning it counts as success)
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Allow anonymous `GetObject` on every key in the bucket
    async fn allow_public_read(&self, bucket: &str) -> Result<()>;

    /// Enable static-website hosting with the given documents
    async fn configure_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()>;

    /// Upload one file
    async fn put_object(&self, bucket: &str, object: &ObjectUpload) -> Result<()>;

    /// Delete every object in the bucket, returning how many were removed
    async fn empty_bucket(&self, bucket: &str) -> Result<usize>;

    /// Delete an (empty) bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Public website URL of a bucket
    fn website_url(&self, bucket: &str) -> String;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account identity if available
    pub identity: Option<AccountIdentity>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(identity: AccountIdentity) -> Self {
        Self {
            authenticated: true,
            identity: Some(identity),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            identity: None,
            error: Some(error.into()),
        }
    }
}

/// Who the provider thinks we are
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub account_id: String,
    pub arn: String,

    /// Where the credentials came from ("configuration store", "ambient chain")
    pub credential_source: String,
}

/// Index and error documents for website hosting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    pub index_document: String,
    pub error_document: String,
}

impl WebsiteConfig {
    pub const INDEX: &'static str = "index.html";

    /// Single-page app: unknown paths fall back to the index so the
    /// client-side router can handle them
    pub fn spa() -> Self {
        Self {
            index_document: Self::INDEX.to_string(),
            error_document: Self::INDEX.to_string(),
        }
    }

    /// Pre-rendered site with its own error page
    pub fn with_error_document(error_document: impl Into<String>) -> Self {
        Self {
            index_document: Self::INDEX.to_string(),
            error_document: error_document.into(),
        }
    }

    pub fn is_spa_fallback(&self) -> bool {
        self.error_document == self.index_document
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self::spa()
    }
}

/// One file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Object key (relative path, `/`-separated)
    pub key: String,

    /// Local file
    pub path: PathBuf,

    pub content_type: &'static str,
    pub cache_control: &'static str,

    /// File size in bytes
    pub size: u64,
}

/// Validate a bucket name against the S3 naming rules we rely on
pub fn validate_bucket_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(crate::CloudError::InvalidBucketName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if !(3..=63).contains(&name.len()) {
        return invalid("must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return invalid("only lowercase letters, digits, '-' and '.' are allowed");
    }
    let first = name.chars().next().unwrap_or('-');
    let last = name.chars().last().unwrap_or('-');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return invalid("must begin and end with a letter or digit");
    }
    if name.contains("..") {
        return invalid("must not contain consecutive dots");
    }
    Ok(())
}
