//! siteflow source-to-static-site pipeline
//!
//! This crate turns a repository URL into a directory of static files:
//! shallow clone, framework detection, dependency install and build, and
//! discovery of the output directory. External programs (git and the
//! project's package manager) run through the `CommandRunner` trait.

pub mod detect;
pub mod error;
pub mod fetcher;
pub mod framework;
pub mod inspect;
pub mod manifest;
pub mod nextjs;
pub mod orchestrator;
pub mod package_manager;
pub mod progress;
pub mod runner;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use detect::{Detection, NextExport, detect};
pub use error::{BuildError, Result};
pub use fetcher::{RepositoryFetcher, Workdir, repository_name, validate_repository_url};
pub use framework::FrameworkKind;
pub use inspect::OutputInspection;
pub use manifest::PackageManifest;
pub use nextjs::ExportSetup;
pub use orchestrator::{BuildArtifact, BuildOrchestrator, BuildStep, Stage, resolve_output};
pub use package_manager::PackageManager;
pub use progress::StepProgress;
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
