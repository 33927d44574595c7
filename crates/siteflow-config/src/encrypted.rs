//! Encrypted-at-rest credential store
//!
//! The access key id and secret are sealed with AES-256-GCM using a random key
//! kept next to the credentials file. Both files are written with 0600
//! permissions. The region is not secret and is stored in clear.

use crate::credentials::{CredentialStore, Credentials};
use crate::error::{ConfigError, Result};
use crate::{SiteflowPaths, restrict_permissions};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FORMAT_VERSION: u32 = 1;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// On-disk shape of `credentials.json`
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    version: u32,
    access_key_id: String,
    secret_access_key: String,
    region: String,
    saved_at: DateTime<Utc>,
}

pub struct EncryptedFileStore {
    credentials_path: PathBuf,
    key_path: PathBuf,
}

impl EncryptedFileStore {
    pub fn new(paths: &SiteflowPaths) -> Self {
        Self {
            credentials_path: paths.credentials_path(),
            key_path: paths.key_path(),
        }
    }

    /// Whether a credentials file exists
    pub fn exists(&self) -> bool {
        self.credentials_path.exists()
    }

    fn cipher(&self, create: bool) -> Result<Aes256Gcm> {
        if self.key_path.exists() {
            let encoded = std::fs::read_to_string(&self.key_path)?;
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigError::Decrypt(format!("key file: {e}")))?;
            if bytes.len() != KEY_LEN {
                return Err(ConfigError::Decrypt(format!(
                    "key file holds {} bytes, expected {}",
                    bytes.len(),
                    KEY_LEN
                )));
            }
            let key = Key::<Aes256Gcm>::from_slice(&bytes);
            return Ok(Aes256Gcm::new(key));
        }

        if !create {
            return Err(ConfigError::Decrypt("key file not found".to_string()));
        }

        if let Some(parent) = self.key_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let key = Aes256Gcm::generate_key(&mut OsRng);
        std::fs::write(&self.key_path, STANDARD.encode(key))?;
        restrict_permissions(&self.key_path)?;
        tracing::debug!("Generated new encryption key: {}", self.key_path.display());

        Ok(Aes256Gcm::new(&key))
    }

    fn seal(cipher: &Aes256Gcm, value: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, value.as_bytes())
            .map_err(|e| ConfigError::Encrypt(e.to_string()))?;

        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&sealed);
        Ok(STANDARD.encode(blob))
    }

    fn open(cipher: &Aes256Gcm, encoded: &str) -> Result<String> {
        let blob = STANDARD
            .decode(encoded)
            .map_err(|e| ConfigError::Decrypt(e.to_string()))?;
        if blob.len() <= NONCE_LEN {
            return Err(ConfigError::Decrypt("ciphertext too short".to_string()));
        }

        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| ConfigError::Decrypt(e.to_string()))?;

        String::from_utf8(plain).map_err(|e| ConfigError::Decrypt(e.to_string()))
    }
}

impl CredentialStore for EncryptedFileStore {
    fn name(&self) -> &str {
        "encrypted-file"
    }

    fn load(&self) -> Result<Option<Credentials>> {
        if !self.credentials_path.exists() {
            tracing::debug!("No stored credentials at {}", self.credentials_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.credentials_path)?;
        let stored: StoredCredentials = serde_json::from_str(&content)?;
        if stored.version > FORMAT_VERSION {
            return Err(ConfigError::InvalidSetting(format!(
                "credentials file version {} is newer than supported version {}",
                stored.version, FORMAT_VERSION
            )));
        }

        let cipher = self.cipher(false)?;
        let credentials = Credentials::new(
            Self::open(&cipher, &stored.access_key_id)?,
            Self::open(&cipher, &stored.secret_access_key)?,
            stored.region,
        );
        self.validate(&credentials)?;

        tracing::debug!(
            "Loaded credentials for key {} ({})",
            credentials.masked_access_key_id(),
            credentials.region
        );
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        self.validate(credentials)?;

        let cipher = self.cipher(true)?;
        let stored = StoredCredentials {
            version: FORMAT_VERSION,
            access_key_id: Self::seal(&cipher, &credentials.access_key_id)?,
            secret_access_key: Self::seal(&cipher, credentials.secret_access_key())?,
            region: credentials.region.clone(),
            saved_at: Utc::now(),
        };

        if let Some(parent) = self.credentials_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            &self.credentials_path,
            serde_json::to_string_pretty(&stored)?,
        )?;
        restrict_permissions(&self.credentials_path)?;

        tracing::info!(
            "Saved credentials for key {}",
            credentials.masked_access_key_id()
        );
        Ok(())
    }
}
