//! Publishing a build output directory to a bucket

use crate::content_type::ObjectMetadata;
use crate::error::{CloudError, Result};
use crate::provider::{HostingProvider, ObjectUpload, WebsiteConfig};
use crate::report::{FailedObject, PublishReport, UploadedObject};
use futures_util::stream::{self, StreamExt};
use std::path::Path;
use walkdir::WalkDir;

pub const DEFAULT_CONCURRENCY: usize = 8;

pub struct Publisher<'a> {
    provider: &'a dyn HostingProvider,
    concurrency: usize,
}

impl<'a> Publisher<'a> {
    pub fn new(provider: &'a dyn HostingProvider) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of uploads in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Every regular file beneath `source_dir`, keyed by its relative path
    pub fn collect_objects(source_dir: &Path) -> Result<Vec<ObjectUpload>> {
        if !source_dir.is_dir() {
            return Err(CloudError::EmptySource(format!(
                "{} is not a directory",
                source_dir.display()
            )));
        }

        let mut objects = Vec::new();
        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|e| CloudError::EmptySource(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let metadata = ObjectMetadata::for_path(entry.path());
            objects.push(ObjectUpload {
                key,
                path: entry.path().to_path_buf(),
                content_type: metadata.content_type,
                cache_control: metadata.cache_control,
                size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            });
        }

        if objects.is_empty() {
            return Err(CloudError::EmptySource(format!(
                "{} contains no files",
                source_dir.display()
            )));
        }
        Ok(objects)
    }

    /// Make the bucket a public website and upload the directory into it.
    ///
    /// Bucket configuration failures abort before any upload. Upload failures
    /// do not: the report lists every key that failed, and objects already
    /// uploaded stay in place.
    pub async fn publish(
        &self,
        source_dir: &Path,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<PublishReport> {
        let start = std::time::Instant::now();
        let objects = Self::collect_objects(source_dir)?;

        if !objects.iter().any(|o| o.key == website.index_document) {
            tracing::warn!(
                "No {} at the root of {}; the site may not load",
                website.index_document,
                source_dir.display()
            );
        }

        tracing::info!(
            "Publishing {} objects to {} via {}",
            objects.len(),
            bucket,
            self.provider.display_name()
        );

        self.provider
            .allow_public_read(bucket)
            .await
            .map_err(|e| configuration_error(bucket, "public-read policy", e))?;
        self.provider
            .configure_website(bucket, website)
            .await
            .map_err(|e| configuration_error(bucket, "website hosting", e))?;

        let provider = self.provider;
        let outcomes: Vec<(ObjectUpload, Result<()>)> = stream::iter(objects)
            .map(|object| async move {
                tracing::debug!("Uploading {} [{}]", object.key, object.content_type);
                let outcome = provider.put_object(bucket, &object).await;
                (object, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut uploaded = Vec::new();
        let mut failed = Vec::new();
        for (object, outcome) in outcomes {
            match outcome {
                Ok(()) => uploaded.push(UploadedObject {
                    key: object.key,
                    content_type: object.content_type.to_string(),
                    size: object.size,
                }),
                Err(e) => {
                    tracing::warn!("Upload failed for {}: {}", object.key, e);
                    failed.push(FailedObject {
                        key: object.key,
                        error: e.to_string(),
                    });
                }
            }
        }
        uploaded.sort_by(|a, b| a.key.cmp(&b.key));
        failed.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(PublishReport {
            bucket: bucket.to_string(),
            website_url: self.provider.website_url(bucket),
            uploaded,
            failed,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn configuration_error(bucket: &str, step: &str, error: CloudError) -> CloudError {
    match error {
        CloudError::BucketConfiguration { .. } | CloudError::AuthenticationFailed(_) => error,
        other => CloudError::BucketConfiguration {
            bucket: bucket.to_string(),
            step: step.to_string(),
            message: other.to_string(),
        },
    }
}
