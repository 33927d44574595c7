//! Siteflow hosting layer
//!
//! This crate defines the storage abstraction siteflow publishes into,
//! plus the local resource ledger that remembers which buckets it created.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  siteflow CLI                    │
//! │        (init / deploy / list / rollback)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                siteflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait HostingProvider { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Publisher   │  │    Ledger    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────┐
//! │ siteflow-cloud │
//! │     -aws       │
//! └────────────────┘
//! ```

pub mod content_type;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod provider;
pub mod publish;
pub mod report;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use content_type::ObjectMetadata;
pub use error::{CloudError, Result};
pub use ledger::{
    DeploySummary, Ledger, LedgerLock, LedgerRead, LedgerStore, ResourceKind, ResourceRecord,
    ResourceStatus,
};
pub use lifecycle::{
    Presence, ProvisionOutcome, Provisioned, active_regions, bucket_presence, provision_bucket,
    record_deploy, rollback,
};
pub use provider::{
    AccountIdentity, AuthStatus, HostingProvider, ObjectUpload, WebsiteConfig,
    validate_bucket_name,
};
pub use publish::{DEFAULT_CONCURRENCY, Publisher};
pub use report::{ActionResult, ApplyResult, FailedObject, PublishReport, UploadedObject};
