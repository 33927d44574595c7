//! The deploy workflow and the thinner init/rollback flows
//!
//! Everything here talks to storage through `HostingProvider` and to git and
//! the package manager through `CommandRunner`, so the full pipeline runs in
//! tests without AWS or Node.js.

use crate::error::{Result, SiteflowError};
use chrono::Utc;
use siteflow_build::{
    BuildError, BuildOrchestrator, CommandRunner, FrameworkKind, OutputInspection,
    RepositoryFetcher, detect, validate_repository_url,
};
use siteflow_cloud::{
    ApplyResult, AuthStatus, DEFAULT_CONCURRENCY, DeploySummary, HostingProvider, LedgerStore,
    ProvisionOutcome, Provisioned, PublishReport, Publisher, WebsiteConfig, lifecycle,
};
use std::path::{Path, PathBuf};

const NEXT_ERROR_DOCUMENT: &str = "404.html";

/// Progress notifications from `Workflow::deploy`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPhase {
    Provisioning { bucket: String },
    Cloning { repository: String },
    Detecting,
    Building { framework: FrameworkKind },
    Publishing { output_dir: PathBuf },
    Recording,
}

#[derive(Debug, Clone, Default)]
pub struct DeployRequest {
    pub repository: String,
    pub branch: Option<String>,
    pub keep_workdir: bool,
}

#[derive(Debug)]
pub struct DeployOutcome {
    pub bucket: String,
    pub website_url: String,
    pub framework: FrameworkKind,
    pub provisioned: ProvisionOutcome,
    pub report: PublishReport,

    /// The build output as it was before upload
    pub inspection: OutputInspection,

    /// Repository checkout, when it was kept
    pub workdir: Option<PathBuf>,
}

pub struct Workflow<'a> {
    provider: &'a dyn HostingProvider,
    runner: &'a dyn CommandRunner,
    ledger: &'a LedgerStore,
    upload_concurrency: usize,
}

impl<'a> Workflow<'a> {
    pub fn new(
        provider: &'a dyn HostingProvider,
        runner: &'a dyn CommandRunner,
        ledger: &'a LedgerStore,
    ) -> Self {
        Self {
            provider,
            runner,
            ledger,
            upload_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, upload_concurrency: usize) -> Self {
        self.upload_concurrency = upload_concurrency;
        self
    }

    /// Create `bucket` and record it; a tracked bucket is returned as is
    pub async fn init(&self, bucket: &str) -> Result<Provisioned> {
        authenticate(self.provider).await?;
        let provisioned =
            lifecycle::provision_bucket(self.provider, self.ledger, bucket, &WebsiteConfig::spa())
                .await?;
        Ok(provisioned)
    }

    /// Clone, detect, build and publish into `bucket`
    pub async fn deploy(
        &self,
        request: &DeployRequest,
        bucket: &str,
        on_phase: &dyn Fn(DeployPhase),
    ) -> Result<DeployOutcome> {
        validate_repository_url(&request.repository)?;

        on_phase(DeployPhase::Provisioning {
            bucket: bucket.to_string(),
        });
        let provisioned = self.init(bucket).await?;

        on_phase(DeployPhase::Cloning {
            repository: request.repository.clone(),
        });
        let workdir = RepositoryFetcher::new(self.runner)
            .fetch(&request.repository, request.branch.as_deref())
            .await?;

        let result = self.build_and_publish(workdir.path(), bucket, on_phase).await;

        let kept = if request.keep_workdir {
            let path = workdir.keep();
            if result.is_err() {
                tracing::warn!("Work directory kept at {}", path.display());
            }
            Some(path)
        } else {
            None
        };
        let (framework, report, inspection) = result?;

        if report.is_success() {
            on_phase(DeployPhase::Recording);
            lifecycle::record_deploy(
                self.ledger,
                bucket,
                DeploySummary {
                    repository: request.repository.clone(),
                    framework: framework.to_string(),
                    objects: report.uploaded.len(),
                    deployed_at: Utc::now(),
                },
            )
            .await?;
        }

        Ok(DeployOutcome {
            bucket: bucket.to_string(),
            website_url: report.website_url.clone(),
            framework,
            provisioned: provisioned.outcome,
            report,
            inspection,
            workdir: kept,
        })
    }

    async fn build_and_publish(
        &self,
        root: &Path,
        bucket: &str,
        on_phase: &dyn Fn(DeployPhase),
    ) -> Result<(FrameworkKind, PublishReport, OutputInspection)> {
        on_phase(DeployPhase::Detecting);
        let detection = detect(root);
        if !detection.is_supported() {
            return Err(BuildError::UnsupportedFramework(detection.reason).into());
        }

        on_phase(DeployPhase::Building {
            framework: detection.kind,
        });
        let artifact = BuildOrchestrator::new(self.runner)
            .build(root, &detection)
            .await?;

        let inspection = OutputInspection::inspect(&artifact.output_dir)?;
        if inspection.index_looks_small() {
            tracing::warn!(
                "index.html in {} is only {} bytes",
                artifact.output_dir.display(),
                inspection.index_size.unwrap_or_default()
            );
        }

        on_phase(DeployPhase::Publishing {
            output_dir: artifact.output_dir.clone(),
        });
        let website = website_for(artifact.framework, &artifact.output_dir);
        let report = Publisher::new(self.provider)
            .with_concurrency(self.upload_concurrency)
            .publish(&artifact.output_dir, bucket, &website)
            .await?;

        Ok((artifact.framework, report, inspection))
    }
}

/// Identity check run before any bucket is touched
pub async fn authenticate(provider: &dyn HostingProvider) -> Result<AuthStatus> {
    let status = provider.check_auth().await?;
    if !status.authenticated {
        let reason = status
            .error
            .unwrap_or_else(|| "credentials were rejected".to_string());
        return Err(SiteflowError::Auth(format!(
            "{} rejected the credentials: {}",
            provider.display_name(),
            reason
        )));
    }
    Ok(status)
}

/// Website documents for a framework's output.
///
/// Client-side routed apps fall back to `index.html`; a Next.js export serves
/// its generated `404.html` when there is one.
pub fn website_for(framework: FrameworkKind, output_dir: &Path) -> WebsiteConfig {
    match framework {
        FrameworkKind::NextJS if output_dir.join(NEXT_ERROR_DOCUMENT).is_file() => {
            WebsiteConfig::with_error_document(NEXT_ERROR_DOCUMENT)
        }
        _ => WebsiteConfig::spa(),
    }
}

/// Bucket for a deploy: the one asked for, else the most recent active one,
/// else a freshly generated name
pub async fn choose_bucket(
    ledger: &LedgerStore,
    requested: Option<&str>,
    generate: impl FnOnce() -> String,
) -> Result<String> {
    if let Some(bucket) = requested {
        return Ok(bucket.to_string());
    }
    let current = ledger.load().await?;
    Ok(match current.latest_active_bucket() {
        Some(record) => record.id.clone(),
        None => generate(),
    })
}

/// Roll back every active bucket, one provider per region
pub async fn rollback_all(
    ledger: &LedgerStore,
    providers: &[&dyn HostingProvider],
) -> Result<ApplyResult> {
    for provider in providers {
        authenticate(*provider).await?;
    }

    let mut combined = ApplyResult::new();
    for provider in providers {
        let result = lifecycle::rollback(*provider, ledger).await?;
        combined.succeeded.extend(result.succeeded);
        combined.failed.extend(result.failed);
        combined.duration_ms += result.duration_ms;
    }

    let remaining = ledger.load().await?;
    for record in remaining.active() {
        if !providers.iter().any(|p| p.region() == record.region) {
            combined.add_failure(
                record.id.clone(),
                format!("no provider for region {}", record.region),
            );
        }
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteflow_build::testing::ScriptedRunner;
    use siteflow_cloud::testing::MemoryProvider;
    use std::cell::RefCell;

    const CRA_MANIFEST: &str = r#"{
        "name": "storefront",
        "dependencies": { "react": "^18.2.0", "react-dom": "^18.2.0", "react-scripts": "5.0.1" },
        "scripts": { "build": "react-scripts build" }
    }"#;

    fn request(repository: &str) -> DeployRequest {
        DeployRequest {
            repository: repository.to_string(),
            ..Default::default()
        }
    }

    fn cra_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .writes("git clone", &[("package.json", CRA_MANIFEST), ("src/App.js", "")])
            .writes(
                "npm run build",
                &[
                    ("build/index.html", "<!doctype html>"),
                    ("build/static/js/main.8f1c.js", "(()=>{})()"),
                    ("build/static/css/main.2a1b.css", "body{}"),
                ],
            )
    }

    #[tokio::test]
    async fn test_deploy_create_react_app() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = cra_runner();
        let phases = RefCell::new(Vec::new());

        let outcome = Workflow::new(&provider, &runner, &ledger)
            .deploy(
                &request("https://github.com/acme/storefront.git"),
                "storefront-site",
                &|phase| phases.borrow_mut().push(phase),
            )
            .await
            .unwrap();

        assert_eq!(outcome.framework, FrameworkKind::React);
        assert_eq!(
            outcome.website_url,
            "http://storefront-site.s3-website-us-east-1.amazonaws.com/"
        );
        assert!(outcome.report.is_success());
        assert_eq!(outcome.provisioned, ProvisionOutcome::Created);
        assert!(outcome.workdir.is_none());

        let index = provider.object("storefront-site", "index.html").unwrap();
        assert_eq!(index.content_type, "text/html");
        assert_eq!(
            provider.website("storefront-site").unwrap().error_document,
            "index.html"
        );

        let calls = runner.calls();
        assert!(calls[0].starts_with("git clone --depth 1 -- https://github.com/acme/storefront.git"));
        assert_eq!(&calls[1..], &["npm install", "npm run build"]);

        let record = ledger.load().await.unwrap();
        let summary = record.get("storefront-site").unwrap().last_deploy.clone().unwrap();
        assert_eq!(summary.framework, "React");
        assert_eq!(summary.objects, 3);

        assert_eq!(phases.borrow().last(), Some(&DeployPhase::Recording));
        assert_eq!(outcome.inspection.index_size, Some(15));
        assert!(outcome.inspection.index_looks_small());
    }

    #[tokio::test]
    async fn test_deploy_without_manifest_uploads_nothing() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new().writes("git clone", &[("README.md", "# docs")]);

        let err = Workflow::new(&provider, &runner, &ledger)
            .deploy(&request("https://github.com/acme/docs"), "docs-site", &|_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, SiteflowError::Detection(_)));
        assert_eq!(err.exit_code(), 5);
        assert_eq!(provider.object_count("docs-site"), 0);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_deploy_rejects_bad_url_before_provisioning() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new();

        let err = Workflow::new(&provider, &runner, &ledger)
            .deploy(&request("not a url"), "site", &|_| {})
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(provider.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials_stop_init_and_deploy() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1").unauthenticated();
        let runner = cra_runner();
        let workflow = Workflow::new(&provider, &runner, &ledger);

        let err = workflow.init("static-site-0a1b2c3d").await.unwrap_err();
        assert!(matches!(err, SiteflowError::Auth(_)));
        assert_eq!(err.exit_code(), 3);

        let err = workflow
            .deploy(&request("https://github.com/acme/storefront"), "storefront", &|_| {})
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("security token"));

        assert_eq!(provider.create_calls(), 0);
        assert_eq!(provider.object_count("storefront"), 0);
        assert!(runner.calls().is_empty());
        assert!(ledger.load().await.unwrap().list().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credentials_stop_rollback() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new();
        Workflow::new(&provider, &runner, &ledger)
            .init("storefront")
            .await
            .unwrap();

        let rejected = MemoryProvider::new("us-east-1").unauthenticated();
        let err = rollback_all(&ledger, &[&rejected]).await.unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert!(provider.has_bucket("storefront"));
        assert_eq!(ledger.load().await.unwrap().active().len(), 1);
    }

    #[tokio::test]
    async fn test_init_refuses_existing_untracked_bucket() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        provider.create_bucket("users-own-bucket").await.unwrap();
        let runner = ScriptedRunner::new();

        let err = Workflow::new(&provider, &runner, &ledger)
            .init("users-own-bucket")
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 7);
        assert!(!provider.is_public("users-own-bucket"));
        assert!(rollback_all(&ledger, &[&provider]).await.unwrap().succeeded.is_empty());
        assert!(provider.has_bucket("users-own-bucket"));
    }

    #[tokio::test]
    async fn test_deploy_nextjs_uses_404_page() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("eu-central-1");
        let runner = ScriptedRunner::new()
            .writes(
                "git clone",
                &[
                    ("package.json", r#"{ "dependencies": { "next": "^14.2.3", "react": "^18" } }"#),
                    ("next.config.mjs", "const nextConfig = {\n  images: { unoptimized: true },\n};\nexport default nextConfig;\n"),
                ],
            )
            .writes(
                "npm run build",
                &[("out/index.html", ""), ("out/404.html", ""), ("out/_next/static/app.js", "")],
            );

        let outcome = Workflow::new(&provider, &runner, &ledger)
            .deploy(&request("https://github.com/acme/landing"), "landing", &|_| {})
            .await
            .unwrap();

        assert_eq!(outcome.framework, FrameworkKind::NextJS);
        assert_eq!(provider.website("landing").unwrap().error_document, "404.html");
        assert!(provider.object("landing", "_next/static/app.js").is_some());
    }

    #[tokio::test]
    async fn test_deploy_partial_failure_is_reported() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1").failing_key("static/js/main.8f1c.js");
        let runner = cra_runner();

        let outcome = Workflow::new(&provider, &runner, &ledger)
            .deploy(&request("https://github.com/acme/storefront"), "storefront", &|_| {})
            .await
            .unwrap();

        assert!(!outcome.report.is_success());
        assert_eq!(outcome.report.failed[0].key, "static/js/main.8f1c.js");
        assert!(provider.object("storefront", "index.html").is_some());

        let ledger = ledger.load().await.unwrap();
        assert!(ledger.get("storefront").unwrap().last_deploy.is_none());

        let err = SiteflowError::from(outcome.report);
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_deploy_build_failure_keeps_workdir() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new()
            .writes("git clone", &[("package.json", CRA_MANIFEST)])
            .fails("npm run build", 1, "Failed to compile.");

        let mut req = request("https://github.com/acme/storefront");
        req.keep_workdir = true;
        let err = Workflow::new(&provider, &runner, &ledger)
            .deploy(&req, "storefront", &|_| {})
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("Failed to compile."));
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new();
        let workflow = Workflow::new(&provider, &runner, &ledger);

        let first = workflow.init("static-site-0a1b2c3d").await.unwrap();
        let second = workflow.init("static-site-0a1b2c3d").await.unwrap();

        assert_eq!(first.record, second.record);
        assert_eq!(second.outcome, ProvisionOutcome::AlreadyTracked);
        assert_eq!(provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_choose_bucket() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = ScriptedRunner::new();

        let generated = choose_bucket(&ledger, None, || "static-site-new".to_string())
            .await
            .unwrap();
        assert_eq!(generated, "static-site-new");

        Workflow::new(&provider, &runner, &ledger)
            .init("static-site-live")
            .await
            .unwrap();
        let reused = choose_bucket(&ledger, None, || unreachable!()).await.unwrap();
        assert_eq!(reused, "static-site-live");

        let explicit = choose_bucket(&ledger, Some("other"), || unreachable!())
            .await
            .unwrap();
        assert_eq!(explicit, "other");
    }

    #[tokio::test]
    async fn test_rollback_then_list_shows_nothing_active() {
        let state = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(state.path());
        let provider = MemoryProvider::new("us-east-1");
        let runner = cra_runner();

        Workflow::new(&provider, &runner, &ledger)
            .deploy(&request("https://github.com/acme/storefront"), "storefront", &|_| {})
            .await
            .unwrap();

        let result = rollback_all(&ledger, &[&provider]).await.unwrap();
        assert!(result.is_success());
        assert!(!provider.has_bucket("storefront"));

        let listed = ledger.load_lenient().await.ledger;
        assert!(listed.active().is_empty());
        assert_eq!(listed.list().len(), 1);
        assert!(listed.list()[0].public_url().is_none());
    }

    #[test]
    fn test_website_for() {
        let dir = tempfile::tempdir().unwrap();
        assert!(website_for(FrameworkKind::NextJS, dir.path()).is_spa_fallback());

        std::fs::write(dir.path().join("404.html"), "").unwrap();
        assert_eq!(
            website_for(FrameworkKind::NextJS, dir.path()).error_document,
            "404.html"
        );
        assert!(website_for(FrameworkKind::Angular, dir.path()).is_spa_fallback());
    }
}
