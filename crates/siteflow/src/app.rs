//! Per-invocation application state

use crate::error::Result;
use siteflow_cloud::LedgerStore;
use siteflow_cloud_aws::{AwsSession, S3HostingProvider};
use siteflow_config::{
    CredentialStore, Credentials, EncryptedFileStore, Settings, SiteflowPaths, validate_region,
};
use uuid::Uuid;

/// Everything a command needs from the local machine
pub struct AppContext {
    pub paths: SiteflowPaths,
    pub settings: Settings,
    pub credentials: Box<dyn CredentialStore>,
    pub ledger: LedgerStore,

    /// `--region` from the command line
    pub region_override: Option<String>,
}

impl AppContext {
    /// Resolve the state directory and load settings
    pub fn load(region_override: Option<String>) -> Result<Self> {
        Self::with_paths(SiteflowPaths::resolve()?, region_override)
    }

    pub fn with_paths(paths: SiteflowPaths, region_override: Option<String>) -> Result<Self> {
        if let Some(region) = &region_override {
            validate_region(region)?;
        }

        let settings = Settings::load(&paths)?;
        let credentials = Box::new(EncryptedFileStore::new(&paths));
        let ledger = LedgerStore::new(paths.root());

        Ok(Self {
            paths,
            settings,
            credentials,
            ledger,
            region_override,
        })
    }

    /// Resolve credentials and region for cloud calls
    pub async fn session(&self) -> Result<AwsSession> {
        let session = AwsSession::resolve(
            self.credentials.as_ref(),
            self.region_override.as_deref(),
            self.settings.region.as_deref(),
        )
        .await?;
        Ok(session)
    }

    /// S3 provider in the resolved region
    pub async fn provider(&self) -> Result<S3HostingProvider> {
        Ok(S3HostingProvider::new(&self.session().await?))
    }

    /// Persist credentials through the configured store
    pub fn save_credentials(
        &self,
        access_key_id: String,
        secret_access_key: String,
        region: String,
    ) -> Result<Credentials> {
        let credentials = Credentials::new(access_key_id, secret_access_key, region);
        self.credentials.save(&credentials)?;
        Ok(credentials)
    }

    /// Fresh bucket name: `<bucket_prefix>-<8 hex chars>`
    pub fn generate_bucket_name(&self) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.settings.bucket_prefix, &id[..8])
    }
}
