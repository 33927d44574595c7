//! Credential model and the storage capability

use crate::error::{ConfigError, Result};
use regex::Regex;
use std::sync::LazyLock;

static REGION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // us-east-1, eu-west-2, us-gov-west-1, ap-southeast-4
    Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d{1,2}$").expect("valid region regex")
});

/// AWS credentials plus the region they are used in.
///
/// The secret is private and never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    secret_access_key: String,
    pub region: String,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into().trim().to_string(),
            secret_access_key: secret_access_key.into().trim().to_string(),
            region: region.into().trim().to_string(),
        }
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Access key id with everything but the last four characters masked
    pub fn masked_access_key_id(&self) -> String {
        let total = self.access_key_id.chars().count();
        let hidden = total.saturating_sub(4);
        let tail: String = self.access_key_id.chars().skip(hidden).collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.masked_access_key_id())
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Check presence and shape of all three credential parts
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.access_key_id.is_empty() {
        return Err(ConfigError::MissingField("access_key_id"));
    }
    if credentials.secret_access_key.is_empty() {
        return Err(ConfigError::MissingField("secret_access_key"));
    }
    if credentials.region.is_empty() {
        return Err(ConfigError::MissingField("region"));
    }

    let key = &credentials.access_key_id;
    if key.len() != 20
        || !key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ConfigError::InvalidAccessKeyId);
    }

    if credentials.secret_access_key.len() != 40 {
        return Err(ConfigError::InvalidSecretAccessKey);
    }

    validate_region(&credentials.region)
}

pub fn validate_region(region: &str) -> Result<()> {
    if REGION_PATTERN.is_match(region) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRegion(region.to_string()))
    }
}

/// Backing storage for credentials.
///
/// Implementations decide where (and whether) secrets are persisted; callers
/// only rely on `load`, `save` and `validate`.
pub trait CredentialStore: Send + Sync {
    /// Short name shown in `verify` output
    fn name(&self) -> &str;

    /// Stored credentials, or `None` when nothing has been configured
    fn load(&self) -> Result<Option<Credentials>>;

    /// Validate and persist credentials
    fn save(&self, credentials: &Credentials) -> Result<()>;

    fn validate(&self, credentials: &Credentials) -> Result<()> {
        validate_credentials(credentials)
    }
}

/// Store that never holds secrets locally; resolution falls through to the
/// ambient AWS credential chain (environment, profiles, SSO, IMDS).
#[derive(Debug, Default, Clone, Copy)]
pub struct AmbientChainStore;

impl CredentialStore for AmbientChainStore {
    fn name(&self) -> &str {
        "ambient"
    }

    fn load(&self) -> Result<Option<Credentials>> {
        Ok(None)
    }

    fn save(&self, _credentials: &Credentials) -> Result<()> {
        Err(ConfigError::ReadOnlyStore(self.name().to_string()))
    }
}
