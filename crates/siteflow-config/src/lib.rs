//! siteflow configuration
//!
//! Local state lives in a single tool directory (`~/.siteflow` by default):
//!
//! ```text
//! ~/.siteflow/
//! ├── credentials.json   # access key id + secret, AES-256-GCM encrypted
//! ├── .key               # local encryption key (0600)
//! ├── settings.toml      # optional non-secret settings
//! ├── state.json         # resource ledger (siteflow-cloud)
//! └── lock.json          # advisory lock while a command mutates the ledger
//! ```

pub mod credentials;
pub mod encrypted;
pub mod error;
pub mod settings;

pub use credentials::{
    AmbientChainStore, CredentialStore, Credentials, validate_credentials, validate_region,
};
pub use encrypted::EncryptedFileStore;
pub use error::*;
pub use settings::Settings;

use std::path::{Path, PathBuf};

/// Environment variable overriding the state directory
pub const HOME_ENV: &str = "SITEFLOW_HOME";

const DIR_NAME: &str = ".siteflow";
const CREDENTIALS_FILE: &str = "credentials.json";
const KEY_FILE: &str = ".key";
const SETTINGS_FILE: &str = "settings.toml";

/// Locations of every file siteflow keeps on the local machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteflowPaths {
    root: PathBuf,
}

impl SiteflowPaths {
    /// Resolve the state directory.
    ///
    /// `SITEFLOW_HOME` wins when set; otherwise `~/.siteflow`.
    pub fn resolve() -> Result<Self> {
        if let Ok(dir) = std::env::var(HOME_ENV)
            && !dir.trim().is_empty()
        {
            return Ok(Self::at(dir));
        }

        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Self::at(home.join(DIR_NAME)))
    }

    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.root.join(KEY_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Create the state directory if it does not exist yet
    pub fn ensure(&self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
            tracing::debug!("Created state directory: {}", self.root.display());
        }
        Ok(())
    }
}

/// Restrict a file to its owner (0600) where the platform supports it
pub(crate) fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_resolve_uses_env_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("state");

        temp_env::with_var(HOME_ENV, Some(dir.to_str().unwrap()), || {
            let paths = SiteflowPaths::resolve().unwrap();
            assert_eq!(paths.root(), dir.as_path());
            assert!(paths.credentials_path().ends_with("credentials.json"));
        });
    }

    #[test]
    #[serial]
    fn test_resolve_defaults_to_home() {
        temp_env::with_var_unset(HOME_ENV, || {
            let paths = SiteflowPaths::resolve().unwrap();
            assert!(paths.root().ends_with(".siteflow"));
        });
    }

    #[test]
    fn test_ensure_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let paths = SiteflowPaths::at(temp_dir.path().join("nested/state"));

        paths.ensure().unwrap();
        assert!(paths.root().is_dir());

        // second call is a no-op
        paths.ensure().unwrap();
    }
}
