//! siteflow: clone a front-end repository, build it, and publish the result
//! to an S3 bucket configured for static-website hosting.

pub mod app;
pub mod error;
pub mod workflow;

pub use app::AppContext;
pub use error::{Result, SiteflowError};
pub use workflow::{
    DeployOutcome, DeployPhase, DeployRequest, Workflow, authenticate, choose_bucket, rollback_all,
    website_for,
};
