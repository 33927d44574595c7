//! S3 hosting provider implementation

use crate::session::AwsSession;
use crate::website::website_endpoint;
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ErrorDocument, IndexDocument,
    ObjectIdentifier, PublicAccessBlockConfiguration, WebsiteConfiguration,
};
use aws_sdk_sts::Client as StsClient;
use siteflow_cloud::{
    AccountIdentity, AuthStatus, CloudError, HostingProvider, ObjectUpload, Result, WebsiteConfig,
};

const AUTH_ERROR_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
];

/// Static-website hosting on S3
pub struct S3HostingProvider {
    s3: S3Client,
    sts: StsClient,
    region: String,
    credential_source: String,
}

impl S3HostingProvider {
    pub fn new(session: &AwsSession) -> Self {
        Self {
            s3: S3Client::new(session.config()),
            sts: StsClient::new(session.config()),
            region: session.region().to_string(),
            credential_source: session.source().to_string(),
        }
    }

    fn public_read_policy(bucket: &str) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{}/*", bucket),
            }]
        })
        .to_string()
    }
}

/// Map an SDK failure to a `CloudError`, recognising auth and missing-bucket codes
fn api_error<E, R>(operation: &str, bucket: &str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match err.code() {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => CloudError::AuthenticationFailed(message),
        Some("NoSuchBucket") => CloudError::BucketNotFound(bucket.to_string()),
        _ => CloudError::ApiError(format!("{} failed for {}: {}", operation, bucket, message)),
    }
}

fn build_error(bucket: &str, step: &str, err: impl std::fmt::Display) -> CloudError {
    CloudError::BucketConfiguration {
        bucket: bucket.to_string(),
        step: step.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl HostingProvider for S3HostingProvider {
    fn name(&self) -> &str {
        "aws-s3"
    }

    fn display_name(&self) -> &str {
        "Amazon S3"
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        match self.sts.get_caller_identity().send().await {
            Ok(output) => Ok(AuthStatus::ok(AccountIdentity {
                account_id: output.account().unwrap_or("unknown").to_string(),
                arn: output.arn().unwrap_or("unknown").to_string(),
                credential_source: self.credential_source.clone(),
            })),
            Err(e) => {
                tracing::debug!("GetCallerIdentity failed: {}", DisplayErrorContext(&e));
                Ok(AuthStatus::failed(
                    e.code()
                        .map(str::to_string)
                        .unwrap_or_else(|| DisplayErrorContext(&e).to_string()),
                ))
            }
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let status = err.raw_response().map(|r| r.status().as_u16());
                if err.as_service_error().is_some_and(|e| e.is_not_found()) || status == Some(404) {
                    return Ok(false);
                }
                if status == Some(403) {
                    return Err(CloudError::BucketNotOwned(bucket.to_string()));
                }
                Err(api_error("HeadBucket", bucket, err))
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.s3.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!("Created bucket {} in {}", bucket, self.region);
                Ok(())
            }
            Err(err) => match err.as_service_error() {
                Some(e) if e.is_bucket_already_owned_by_you() => {
                    tracing::debug!("Bucket {} already owned by this account", bucket);
                    Ok(())
                }
                Some(e) if e.is_bucket_already_exists() => {
                    Err(CloudError::BucketNameTaken(bucket.to_string()))
                }
                _ => Err(api_error("CreateBucket", bucket, err)),
            },
        }
    }

    async fn allow_public_read(&self, bucket: &str) -> Result<()> {
        let block = PublicAccessBlockConfiguration::builder()
            .block_public_acls(false)
            .ignore_public_acls(false)
            .block_public_policy(false)
            .restrict_public_buckets(false)
            .build();

        self.s3
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(block)
            .send()
            .await
            .map_err(|e| api_error("PutPublicAccessBlock", bucket, e))?;

        self.s3
            .put_bucket_policy()
            .bucket(bucket)
            .policy(Self::public_read_policy(bucket))
            .send()
            .await
            .map_err(|e| api_error("PutBucketPolicy", bucket, e))?;

        tracing::debug!("Bucket {} allows public read", bucket);
        Ok(())
    }

    async fn configure_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()> {
        let index = IndexDocument::builder()
            .suffix(&website.index_document)
            .build()
            .map_err(|e| build_error(bucket, "index document", e))?;
        let error = ErrorDocument::builder()
            .key(&website.error_document)
            .build()
            .map_err(|e| build_error(bucket, "error document", e))?;

        self.s3
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(index)
                    .error_document(error)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| api_error("PutBucketWebsite", bucket, e))?;

        tracing::debug!(
            "Website hosting on {}: index {}, error {}",
            bucket,
            website.index_document,
            website.error_document
        );
        Ok(())
    }

    async fn put_object(&self, bucket: &str, object: &ObjectUpload) -> Result<()> {
        let body = ByteStream::from_path(&object.path).await.map_err(|e| {
            CloudError::ApiError(format!("Failed to read {}: {}", object.path.display(), e))
        })?;

        self.s3
            .put_object()
            .bucket(bucket)
            .key(&object.key)
            .content_type(object.content_type)
            .cache_control(object.cache_control)
            .body(body)
            .send()
            .await
            .map_err(|e| api_error("PutObject", bucket, e))?;
        Ok(())
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        let mut removed = 0;
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .s3
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| api_error("ListObjectsV2", bucket, e))?;

            let identifiers = page
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| CloudError::ApiError(e.to_string()))?;

            if !identifiers.is_empty() {
                let count = identifiers.len();
                let delete = Delete::builder()
                    .set_objects(Some(identifiers))
                    .quiet(true)
                    .build()
                    .map_err(|e| CloudError::ApiError(e.to_string()))?;

                let output = self
                    .s3
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| api_error("DeleteObjects", bucket, e))?;

                if let Some(first) = output.errors().first() {
                    return Err(CloudError::ApiError(format!(
                        "DeleteObjects failed for {} objects in {} (first: {} {})",
                        output.errors().len(),
                        bucket,
                        first.key().unwrap_or("?"),
                        first.message().unwrap_or("unknown error")
                    )));
                }
                removed += count;
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!("Removed {} objects from {}", removed, bucket);
        Ok(removed)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.s3
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| api_error("DeleteBucket", bucket, e))?;
        tracing::info!("Deleted bucket {}", bucket);
        Ok(())
    }

    fn website_url(&self, bucket: &str) -> String {
        website_endpoint(bucket, &self.region)
    }
}
