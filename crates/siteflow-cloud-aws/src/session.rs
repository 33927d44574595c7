//! Credential and region resolution
//!
//! Stored credentials win; without them the standard AWS chain is used
//! (environment, shared profiles, SSO, instance metadata).

use crate::error::{AwsError, Result};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::{Credentials as AwsCredentials, Region};
use siteflow_config::{CredentialStore, validate_region};

const PROVIDER_NAME: &str = "siteflow";

/// Where the active credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    ConfigurationStore,
    AmbientChain,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::ConfigurationStore => write!(f, "configuration store"),
            CredentialSource::AmbientChain => write!(f, "ambient credential chain"),
        }
    }
}

/// Resolved SDK configuration
#[derive(Debug, Clone)]
pub struct AwsSession {
    config: SdkConfig,
    region: String,
    source: CredentialSource,
}

impl AwsSession {
    /// Resolve credentials and region.
    ///
    /// Region precedence: `region_override`, then the region stored with the
    /// credentials (or `default_region` from settings when falling back to the
    /// ambient chain), then whatever the chain itself provides.
    pub async fn resolve(
        store: &dyn CredentialStore,
        region_override: Option<&str>,
        default_region: Option<&str>,
    ) -> Result<Self> {
        if let Some(region) = region_override {
            validate_region(region)?;
        }

        let loader = aws_config::defaults(BehaviorVersion::latest());

        let (loader, source) = match store.load()? {
            Some(credentials) => {
                tracing::debug!(
                    "Using stored credentials {} from {}",
                    credentials.masked_access_key_id(),
                    store.name()
                );
                let region = region_override.unwrap_or(&credentials.region).to_string();
                let loader = loader
                    .credentials_provider(AwsCredentials::new(
                        credentials.access_key_id.clone(),
                        credentials.secret_access_key().to_string(),
                        None,
                        None,
                        PROVIDER_NAME,
                    ))
                    .region(Region::new(region));
                (loader, CredentialSource::ConfigurationStore)
            }
            None => {
                tracing::debug!("No stored credentials, using the ambient AWS chain");
                let loader = match region_override.or(default_region) {
                    Some(region) => loader.region(Region::new(region.to_string())),
                    None => loader,
                };
                (loader, CredentialSource::AmbientChain)
            }
        };

        // Credentials are only exercised by the first request; callers run
        // `HostingProvider::check_auth` before touching any bucket
        let config = loader.load().await;
        let region = config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or(AwsError::NoRegion)?;

        tracing::debug!("AWS session: region {}, credentials from {}", region, source);
        Ok(Self {
            config,
            region,
            source,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Same credentials, different region
    pub fn for_region(&self, region: &str) -> Self {
        let config = self
            .config
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();
        Self {
            config,
            region: region.to_string(),
            source: self.source,
        }
    }
}
