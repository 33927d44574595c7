//! Resource ledger
//!
//! Manages `state.json` in the siteflow state directory, which records every
//! bucket siteflow has created. Records are never removed: rollback moves
//! them to `deleted` so the history stays auditable.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const LEDGER_VERSION: u32 = 1;
const LEDGER_FILE: &str = "state.json";
const LEDGER_BACKUP: &str = "state.json.backup";
const LEDGER_STAGING: &str = "state.json.tmp";
const LOCK_FILE: &str = "lock.json";

/// All resources siteflow knows about, keyed by identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Records indexed by resource identifier (identifiers are unique)
    pub resources: BTreeMap<String, ResourceRecord>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record with the same identifier
    pub fn record(&mut self, record: ResourceRecord) {
        self.resources.insert(record.id.clone(), record);
        self.updated_at = Utc::now();
    }

    /// All records, most recently created first
    pub fn list(&self) -> Vec<&ResourceRecord> {
        let mut records: Vec<&ResourceRecord> = self.resources.values().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    pub fn get(&self, id: &str) -> Option<&ResourceRecord> {
        self.resources.get(id)
    }

    /// The record for `id` if it is still active
    pub fn get_active(&self, id: &str) -> Option<&ResourceRecord> {
        self.get(id).filter(|r| r.is_active())
    }

    /// Active records, most recently created first
    pub fn active(&self) -> Vec<&ResourceRecord> {
        self.list().into_iter().filter(|r| r.is_active()).collect()
    }

    /// Most recently created active bucket
    pub fn latest_active_bucket(&self) -> Option<&ResourceRecord> {
        self.active()
            .into_iter()
            .find(|r| r.kind == ResourceKind::Bucket)
    }

    /// Transition a record to `deleted`
    pub fn mark_deleted(&mut self, id: &str) -> Result<&ResourceRecord> {
        let record = self
            .resources
            .get_mut(id)
            .ok_or_else(|| CloudError::StateError(format!("No ledger record for '{}'", id)))?;

        record.status = ResourceStatus::Deleted;
        record.updated_at = Utc::now();
        self.updated_at = record.updated_at;
        Ok(record)
    }

    /// Attach the outcome of a deploy to an active record
    pub fn record_deploy(&mut self, id: &str, deploy: DeploySummary) -> Result<()> {
        let record = self
            .resources
            .get_mut(id)
            .filter(|r| r.is_active())
            .ok_or_else(|| {
                CloudError::StateError(format!("No active ledger record for '{}'", id))
            })?;

        record.updated_at = deploy.deployed_at;
        record.last_deploy = Some(deploy);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Kind of tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bucket,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Bucket => write!(f, "bucket"),
        }
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource exists and is served
    Active,
    /// Resource has been deleted by rollback
    Deleted,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Active => write!(f, "active"),
            ResourceStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single tracked resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,

    /// Provider-side identifier (bucket name)
    pub id: String,

    pub region: String,

    pub status: ResourceStatus,

    /// Website endpoint, only meaningful while active
    website_url: String,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Most recent successful deploy into this resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deploy: Option<DeploySummary>,
}

impl ResourceRecord {
    pub fn bucket(
        id: impl Into<String>,
        region: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            kind: ResourceKind::Bucket,
            id: id.into(),
            region: region.into(),
            status: ResourceStatus::Active,
            website_url: website_url.into(),
            created_at: now,
            updated_at: now,
            last_deploy: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }

    /// Public URL, present only while the resource is active
    pub fn public_url(&self) -> Option<&str> {
        self.is_active().then_some(self.website_url.as_str())
    }
}

/// Summary of the last deploy into a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploySummary {
    pub repository: String,
    pub framework: String,
    pub objects: usize,
    pub deployed_at: DateTime<Utc>,
}

/// Result of a lenient ledger read
#[derive(Debug)]
pub struct LedgerRead {
    pub ledger: Ledger,

    /// Why the on-disk ledger was ignored, if it was
    pub corruption: Option<CloudError>,
}

/// Reads and writes the ledger file
pub struct LedgerStore {
    state_dir: PathBuf,
}

impl LedgerStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the ledger file path
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_BACKUP)
    }

    fn staging_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_STAGING)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir.join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir).await?;
            tracing::debug!("Created state directory: {}", self.state_dir.display());
        }
        Ok(())
    }

    /// Load the ledger; a missing file is an empty ledger, an unreadable one
    /// is a `StateError`
    pub async fn load(&self) -> Result<Ledger> {
        let path = self.ledger_path();
        if !path.exists() {
            tracing::debug!("Ledger file not found, returning empty ledger");
            return Ok(Ledger::new());
        }

        let content = fs::read_to_string(&path).await?;
        let ledger: Ledger = serde_json::from_str(&content).map_err(|e| {
            CloudError::StateError(format!("{} is corrupt: {}", path.display(), e))
        })?;

        if ledger.version > LEDGER_VERSION {
            return Err(CloudError::StateError(format!(
                "Ledger version {} is newer than supported version {}",
                ledger.version, LEDGER_VERSION
            )));
        }

        tracing::debug!("Loaded ledger with {} resources", ledger.resources.len());
        Ok(ledger)
    }

    /// Load the ledger, falling back to an empty one when it cannot be read.
    ///
    /// Used by read-only commands so a corrupt file is reported instead of
    /// aborting them.
    pub async fn load_lenient(&self) -> LedgerRead {
        match self.load().await {
            Ok(ledger) => LedgerRead {
                ledger,
                corruption: None,
            },
            Err(e) => {
                tracing::warn!("Ignoring unreadable ledger: {}", e);
                LedgerRead {
                    ledger: Ledger::new(),
                    corruption: Some(e),
                }
            }
        }
    }

    /// Save the ledger, keeping the previous file as a backup.
    ///
    /// The new content goes to a temporary file that is renamed over
    /// `state.json`, so a failed write leaves the current ledger in place.
    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.ledger_path();
        let staged = self.staging_path();

        let content = serde_json::to_string_pretty(ledger)?;
        fs::write(&staged, content).await?;

        if path.exists() {
            fs::copy(&path, self.backup_path()).await?;
            tracing::debug!("Created ledger backup");
        }
        fs::rename(&staged, &path).await?;

        tracing::debug!("Saved ledger with {} resources", ledger.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<LedgerLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            match serde_json::from_str::<LockInfo>(&content) {
                Ok(lock_info) => {
                    // Locks older than one hour are considered stale
                    let age = Utc::now().signed_duration_since(lock_info.acquired_at);
                    if age.num_hours() < 1 {
                        return Err(CloudError::LockError(format!(
                            "Ledger is locked by {} (pid {}) since {}. \
                             Remove {} if no other siteflow command is running",
                            lock_info.holder,
                            lock_info.pid,
                            lock_info.acquired_at,
                            lock_path.display()
                        )));
                    }
                    tracing::warn!("Removing stale lock from {}", lock_info.holder);
                }
                Err(e) => tracing::warn!("Replacing unreadable lock file: {}", e),
            }
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired ledger lock");
        Ok(LedgerLock {
            lock_path,
            released: false,
        })
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the ledger lock
pub struct LedgerLock {
    lock_path: PathBuf,
    released: bool,
}

impl LedgerLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released ledger lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            // Drop cannot await; fall back to blocking removal
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn bucket(id: &str, minutes_ago: i64) -> ResourceRecord {
        ResourceRecord::bucket(id, "us-east-1", format!("http://{id}.example/"))
            .with_created_at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn test_ledger_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let mut ledger = Ledger::new();
        ledger.record(bucket("static-site-1", 0));
        store.save(&ledger).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(loaded.get("static-site-1"), ledger.get("static-site-1"));
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let ledger = store.load().await.unwrap();
        assert!(ledger.resources.is_empty());
    }

    #[test]
    fn test_list_most_recent_first() {
        let mut ledger = Ledger::new();
        ledger.record(bucket("old", 60));
        ledger.record(bucket("newest", 1));
        ledger.record(bucket("middle", 30));

        let ids: Vec<&str> = ledger.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "middle", "old"]);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut ledger = Ledger::new();
        ledger.record(bucket("site", 10));
        ledger.record(bucket("site", 0));

        assert_eq!(ledger.list().len(), 1);
    }

    #[test]
    fn test_mark_deleted_keeps_history() {
        let mut ledger = Ledger::new();
        ledger.record(bucket("site", 0));

        let record = ledger.mark_deleted("site").unwrap();
        assert_eq!(record.status, ResourceStatus::Deleted);
        assert!(record.public_url().is_none());

        assert_eq!(ledger.list().len(), 1);
        assert!(ledger.active().is_empty());
        assert!(ledger.get_active("site").is_none());
        assert!(ledger.mark_deleted("missing").is_err());
    }

    #[test]
    fn test_public_url_only_when_active() {
        let record = bucket("site", 0);
        assert_eq!(record.public_url(), Some("http://site.example/"));
    }

    #[test]
    fn test_latest_active_bucket_skips_deleted() {
        let mut ledger = Ledger::new();
        ledger.record(bucket("older", 20));
        ledger.record(bucket("newer", 10));
        ledger.mark_deleted("newer").unwrap();

        assert_eq!(ledger.latest_active_bucket().unwrap().id, "older");
    }

    #[test]
    fn test_record_deploy_requires_active() {
        let mut ledger = Ledger::new();
        ledger.record(bucket("site", 0));

        let summary = DeploySummary {
            repository: "https://github.com/acme/site".to_string(),
            framework: "React".to_string(),
            objects: 12,
            deployed_at: Utc::now(),
        };
        ledger.record_deploy("site", summary.clone()).unwrap();
        assert_eq!(ledger.get("site").unwrap().last_deploy, Some(summary.clone()));

        ledger.mark_deleted("site").unwrap();
        assert!(ledger.record_deploy("site", summary).is_err());
    }

    #[tokio::test]
    async fn test_corrupt_ledger() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());
        std::fs::write(store.ledger_path(), "{ not json").unwrap();

        assert!(matches!(
            store.load().await,
            Err(CloudError::StateError(_))
        ));

        let read = store.load_lenient().await;
        assert!(read.ledger.resources.is_empty());
        assert!(read.corruption.is_some());
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let mut ledger = Ledger::new();
        store.save(&ledger).await.unwrap();
        ledger.record(bucket("site", 0));
        store.save(&ledger).await.unwrap();

        assert!(temp_dir.path().join("state.json.backup").exists());
        assert!(!temp_dir.path().join("state.json.tmp").exists());

        let backup = std::fs::read_to_string(temp_dir.path().join("state.json.backup")).unwrap();
        let previous: Ledger = serde_json::from_str(&backup).unwrap();
        assert!(previous.resources.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_ledger_intact() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let mut ledger = Ledger::new();
        ledger.record(bucket("kept-site", 0));
        store.save(&ledger).await.unwrap();

        // A directory in the staging location makes the write fail
        std::fs::create_dir(temp_dir.path().join("state.json.tmp")).unwrap();
        ledger.record(bucket("lost-site", 0));
        assert!(store.save(&ledger).await.is_err());

        let loaded = store.load().await.unwrap();
        assert!(loaded.get("kept-site").is_some());
        assert!(loaded.get("lost-site").is_none());
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let lock = store.acquire_lock().await.unwrap();
        assert!(matches!(
            store.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = store.acquire_lock().await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join("lock.json").exists());
    }
}
