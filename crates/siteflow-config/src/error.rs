use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Home directory not found. Set SITEFLOW_HOME to choose a state directory")]
    HomeDirNotFound,

    #[error("Missing required configuration: {0}")]
    MissingField(&'static str),

    #[error("Invalid AWS Access Key ID format (expected 20 upper-case alphanumeric characters)")]
    InvalidAccessKeyId,

    #[error("Invalid AWS Secret Access Key format (expected 40 characters)")]
    InvalidSecretAccessKey,

    #[error("Invalid AWS region format: {0}")]
    InvalidRegion(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Failed to encrypt credentials: {0}")]
    Encrypt(String),

    #[error(
        "Failed to decrypt stored credentials: {0}\n\
        The key file may have been replaced. Run `siteflow configure` again."
    )]
    Decrypt(String),

    #[error("Credential store '{0}' does not persist credentials")]
    ReadOnlyStore(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
