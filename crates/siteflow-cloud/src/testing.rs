//! In-memory hosting provider for tests

use crate::error::{CloudError, Result};
use crate::provider::{AccountIdentity, AuthStatus, HostingProvider, ObjectUpload, WebsiteConfig};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An uploaded object as the memory provider stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub cache_control: String,
    pub size: u64,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    public: bool,
    website: Option<WebsiteConfig>,
    objects: BTreeMap<String, StoredObject>,
}

/// `HostingProvider` backed by a map of buckets
pub struct MemoryProvider {
    region: String,
    authenticated: bool,
    buckets: Mutex<BTreeMap<String, MemoryBucket>>,
    failing_keys: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
    failing_policies: BTreeSet<String>,
    failing_lookups: BTreeSet<String>,
    taken_names: BTreeSet<String>,
    create_calls: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            authenticated: true,
            buckets: Mutex::new(BTreeMap::new()),
            failing_keys: BTreeSet::new(),
            failing_deletes: BTreeSet::new(),
            failing_policies: BTreeSet::new(),
            failing_lookups: BTreeSet::new(),
            taken_names: BTreeSet::new(),
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Uploads of `key` fail
    pub fn failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Deleting `bucket` fails
    pub fn failing_delete(mut self, bucket: impl Into<String>) -> Self {
        self.failing_deletes.insert(bucket.into());
        self
    }

    /// Making `bucket` public fails
    pub fn failing_policy(mut self, bucket: impl Into<String>) -> Self {
        self.failing_policies.insert(bucket.into());
        self
    }

    /// Existence checks for `bucket` fail
    pub fn failing_lookup(mut self, bucket: impl Into<String>) -> Self {
        self.failing_lookups.insert(bucket.into());
        self
    }

    /// `bucket` belongs to someone else
    pub fn taken_name(mut self, bucket: impl Into<String>) -> Self {
        self.taken_names.insert(bucket.into());
        self
    }

    /// Credentials are rejected
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets().contains_key(bucket)
    }

    pub fn is_public(&self, bucket: &str) -> bool {
        self.buckets().get(bucket).is_some_and(|b| b.public)
    }

    pub fn website(&self, bucket: &str) -> Option<WebsiteConfig> {
        self.buckets().get(bucket).and_then(|b| b.website.clone())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets()
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets().get(bucket).map_or(0, |b| b.objects.len())
    }

    fn buckets(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MemoryBucket>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_bucket<T>(&self, bucket: &str, f: impl FnOnce(&mut MemoryBucket) -> T) -> Result<T> {
        let mut buckets = self.buckets();
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| CloudError::BucketNotFound(bucket.to_string()))?;
        Ok(f(entry))
    }
}

#[async_trait]
impl HostingProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn display_name(&self) -> &str {
        "In-memory storage"
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        if !self.authenticated {
            return Ok(AuthStatus::failed("The security token included in the request is invalid"));
        }
        Ok(AuthStatus::ok(AccountIdentity {
            account_id: "123456789012".to_string(),
            arn: "arn:aws:iam::123456789012:user/siteflow".to_string(),
            credential_source: "memory".to_string(),
        }))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        if self.failing_lookups.contains(bucket) {
            return Err(CloudError::ApiError(format!(
                "simulated lookup failure for {}",
                bucket
            )));
        }
        if self.taken_names.contains(bucket) {
            return Err(CloudError::BucketNotOwned(bucket.to_string()));
        }
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.taken_names.contains(bucket) {
            return Err(CloudError::BucketNameTaken(bucket.to_string()));
        }
        self.buckets().entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn allow_public_read(&self, bucket: &str) -> Result<()> {
        if self.failing_policies.contains(bucket) {
            return Err(CloudError::ApiError(format!(
                "simulated policy failure for {}",
                bucket
            )));
        }
        self.with_bucket(bucket, |b| b.public = true)
    }

    async fn configure_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()> {
        self.with_bucket(bucket, |b| b.website = Some(website.clone()))
    }

    async fn put_object(&self, bucket: &str, object: &ObjectUpload) -> Result<()> {
        if self.failing_keys.contains(&object.key) {
            return Err(CloudError::ApiError(format!(
                "simulated upload failure for {}",
                object.key
            )));
        }
        self.with_bucket(bucket, |b| {
            b.objects.insert(
                object.key.clone(),
                StoredObject {
                    content_type: object.content_type.to_string(),
                    cache_control: object.cache_control.to_string(),
                    size: object.size,
                },
            );
        })
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        self.with_bucket(bucket, |b| {
            let count = b.objects.len();
            b.objects.clear();
            count
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        if self.failing_deletes.contains(bucket) {
            return Err(CloudError::ApiError(format!(
                "simulated delete failure for {}",
                bucket
            )));
        }
        let mut buckets = self.buckets();
        match buckets.get(bucket) {
            None => Err(CloudError::BucketNotFound(bucket.to_string())),
            Some(b) if !b.objects.is_empty() => Err(CloudError::ApiError(format!(
                "bucket {} is not empty",
                bucket
            ))),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    fn website_url(&self, bucket: &str) -> String {
        format!("http://{}.s3-website-{}.amazonaws.com/", bucket, self.region)
    }
}
