//! Outcome reports for multi-step operations

use serde::{Deserialize, Serialize};

/// Result of a publish: every object lands in exactly one of the two lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub bucket: String,

    /// Website URL of the bucket
    pub website_url: String,

    /// Objects uploaded successfully, sorted by key
    pub uploaded: Vec<UploadedObject>,

    /// Objects that failed to upload, sorted by key
    pub failed: Vec<FailedObject>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded.iter().map(|o| o.size).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedObject {
    pub key: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedObject {
    pub key: String,
    pub error: String,
}

/// Result of applying a batch of resource actions (rollback)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, resource_id: String, message: String) {
        self.succeeded.push(ActionResult {
            resource_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, resource_id: String, error: String) {
        self.failed.push(ActionResult {
            resource_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Resource the action applied to
    pub resource_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}
