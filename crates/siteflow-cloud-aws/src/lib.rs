//! Amazon S3 provider for siteflow
//!
//! Buckets are created in the session region, opened for anonymous reads
//! and switched to static-website hosting. Credentials come from the
//! siteflow configuration store or, failing that, the standard AWS chain.

pub mod error;
pub mod provider;
pub mod session;
pub mod website;

pub use error::{AwsError, Result};
pub use provider::S3HostingProvider;
pub use session::{AwsSession, CredentialSource};
pub use website::website_endpoint;
