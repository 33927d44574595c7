//! Bucket provisioning and rollback
//!
//! Both flows hold the ledger lock for their whole duration. A bucket is
//! recorded as soon as the provider confirms its creation, before any further
//! configuration, and only buckets siteflow created ever enter the ledger.

use crate::error::{CloudError, Result};
use crate::ledger::{DeploySummary, Ledger, LedgerStore, ResourceRecord};
use crate::provider::{HostingProvider, WebsiteConfig, validate_bucket_name};
use crate::report::ApplyResult;
use std::collections::BTreeSet;

/// How `provision_bucket` obtained the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Already recorded as active; only the hosting configuration was re-applied
    AlreadyTracked,
    /// Newly created
    Created,
}

impl ProvisionOutcome {
    pub fn made_changes(&self) -> bool {
        !matches!(self, ProvisionOutcome::AlreadyTracked)
    }
}

#[derive(Debug, Clone)]
pub struct Provisioned {
    pub record: ResourceRecord,
    pub outcome: ProvisionOutcome,
}

/// Make sure `bucket` exists, serves a public website and is recorded.
///
/// Running it twice for the same name creates nothing the second time. A
/// bucket that exists but is not in the ledger is refused, so rollback never
/// touches buckets siteflow did not create.
pub async fn provision_bucket(
    provider: &dyn HostingProvider,
    store: &LedgerStore,
    bucket: &str,
    website: &WebsiteConfig,
) -> Result<Provisioned> {
    validate_bucket_name(bucket)?;

    let lock = store.acquire_lock().await?;
    let mut ledger = store.load().await?;

    let tracked = ledger.get_active(bucket).cloned();
    let (record, outcome) = match tracked {
        Some(record) => {
            tracing::info!("Bucket {} is already tracked", bucket);
            (record, ProvisionOutcome::AlreadyTracked)
        }
        None => {
            if provider.bucket_exists(bucket).await? {
                return Err(CloudError::BucketNotTracked(bucket.to_string()));
            }

            tracing::info!("Creating bucket {} in {}", bucket, provider.region());
            provider.create_bucket(bucket).await?;

            // Tracked from here on, even if the configuration below fails
            let record =
                ResourceRecord::bucket(bucket, provider.region(), provider.website_url(bucket));
            ledger.record(record.clone());
            store.save(&ledger).await?;
            (record, ProvisionOutcome::Created)
        }
    };

    configure_hosting(provider, bucket, website).await?;
    lock.release().await?;

    Ok(Provisioned { record, outcome })
}

async fn configure_hosting(
    provider: &dyn HostingProvider,
    bucket: &str,
    website: &WebsiteConfig,
) -> Result<()> {
    provider
        .allow_public_read(bucket)
        .await
        .map_err(|e| step_error(bucket, "public-read policy", e))?;
    provider
        .configure_website(bucket, website)
        .await
        .map_err(|e| step_error(bucket, "website hosting", e))
}

/// Whether a tracked bucket still exists at the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Exists,
    Missing,
    /// The provider could not be asked
    Unknown,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Exists => write!(f, "exists"),
            Presence::Missing => write!(f, "missing"),
            Presence::Unknown => write!(f, "unknown"),
        }
    }
}

/// Ask the provider whether `bucket` exists; failures yield `Unknown`
pub async fn bucket_presence(provider: &dyn HostingProvider, bucket: &str) -> Presence {
    match provider.bucket_exists(bucket).await {
        Ok(true) => Presence::Exists,
        Ok(false) => Presence::Missing,
        Err(e) => {
            tracing::debug!("Could not check bucket {}: {}", bucket, e);
            Presence::Unknown
        }
    }
}

/// Attach a deploy summary to the bucket's ledger record
pub async fn record_deploy(store: &LedgerStore, bucket: &str, deploy: DeploySummary) -> Result<()> {
    let lock = store.acquire_lock().await?;
    let mut ledger = store.load().await?;
    ledger.record_deploy(bucket, deploy)?;
    store.save(&ledger).await?;
    lock.release().await
}

/// Regions that still hold active resources
pub fn active_regions(ledger: &Ledger) -> BTreeSet<String> {
    ledger.active().into_iter().map(|r| r.region.clone()).collect()
}

/// Delete every active bucket in the provider's region.
///
/// Each bucket is emptied then deleted; a bucket that is already gone counts
/// as deleted. Failures leave the record active and are reported in the
/// result without stopping the remaining deletions.
pub async fn rollback(provider: &dyn HostingProvider, store: &LedgerStore) -> Result<ApplyResult> {
    let start = std::time::Instant::now();
    let lock = store.acquire_lock().await?;
    let mut ledger = store.load().await?;

    let targets: Vec<String> = ledger
        .active()
        .into_iter()
        .filter(|r| r.region == provider.region())
        .map(|r| r.id.clone())
        .collect();

    let mut result = ApplyResult::new();
    for bucket in targets {
        match delete_bucket_and_contents(provider, &bucket).await {
            Ok(message) => {
                ledger.mark_deleted(&bucket)?;
                tracing::info!("Rolled back {}: {}", bucket, message);
                result.add_success(bucket, message);
            }
            Err(e) => {
                tracing::warn!("Failed to roll back {}: {}", bucket, e);
                result.add_failure(bucket, e.to_string());
            }
        }
    }

    store.save(&ledger).await?;
    lock.release().await?;

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}

async fn delete_bucket_and_contents(provider: &dyn HostingProvider, bucket: &str) -> Result<String> {
    let removed = match provider.empty_bucket(bucket).await {
        Ok(count) => count,
        Err(CloudError::BucketNotFound(_)) => return Ok("already deleted".to_string()),
        Err(e) => return Err(e),
    };

    match provider.delete_bucket(bucket).await {
        Ok(()) | Err(CloudError::BucketNotFound(_)) => {
            Ok(format!("deleted ({} objects removed)", removed))
        }
        Err(e) => Err(e),
    }
}

fn step_error(bucket: &str, step: &str, error: CloudError) -> CloudError {
    match error {
        CloudError::BucketConfiguration { .. } => error,
        other => CloudError::BucketConfiguration {
            bucket: bucket.to_string(),
            step: step.to_string(),
            message: other.to_string(),
        },
    }
}
