use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// An isolated `SITEFLOW_HOME` with no credentials or settings
pub struct TestHome {
    pub root: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn write_ledger(&self, content: &str) {
        fs::write(self.root.path().join("state.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_settings(&self, content: &str) {
        fs::write(self.root.path().join("settings.toml"), content).unwrap();
    }

    /// `siteflow` with the environment scrubbed of anything that could reach AWS
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("siteflow").unwrap();
        cmd.env("SITEFLOW_HOME", self.path())
            .env_remove("SITEFLOW_REGION")
            .env_remove("SITEFLOW_BUCKET_PREFIX")
            .env_remove("SITEFLOW_UPLOAD_CONCURRENCY")
            .env_remove("SITEFLOW_KEEP_WORKDIR")
            .env_remove("AWS_ACCESS_KEY_ID")
            .env_remove("AWS_SECRET_ACCESS_KEY")
            .env_remove("AWS_SESSION_TOKEN")
            .env_remove("AWS_PROFILE")
            .env_remove("AWS_REGION")
            .env_remove("AWS_DEFAULT_REGION")
            .env_remove("AWS_WEB_IDENTITY_TOKEN_FILE")
            .env_remove("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI")
            .env_remove("AWS_CONTAINER_CREDENTIALS_FULL_URI")
            .env("AWS_CONFIG_FILE", self.path().join("aws-config"))
            .env("AWS_SHARED_CREDENTIALS_FILE", self.path().join("aws-credentials"))
            .env("AWS_EC2_METADATA_DISABLED", "true")
            .env("NO_COLOR", "1");
        cmd
    }
}

pub const ACTIVE_LEDGER: &str = r#"{
  "version": 1,
  "updated_at": "2026-03-01T10:00:00Z",
  "resources": {
    "static-site-0a1b2c3d": {
      "kind": "bucket",
      "id": "static-site-0a1b2c3d",
      "region": "eu-west-1",
      "status": "active",
      "website_url": "http://static-site-0a1b2c3d.s3-website-eu-west-1.amazonaws.com/",
      "created_at": "2026-03-01T10:00:00Z",
      "updated_at": "2026-03-01T10:00:00Z"
    },
    "static-site-old": {
      "kind": "bucket",
      "id": "static-site-old",
      "region": "us-east-1",
      "status": "deleted",
      "website_url": "http://static-site-old.s3-website-us-east-1.amazonaws.com/",
      "created_at": "2026-01-10T08:30:00Z",
      "updated_at": "2026-02-01T09:00:00Z"
    }
  }
}"#;
