use colored::Colorize;
use siteflow::{AppContext, DeployPhase, DeployRequest, Result, Workflow, choose_bucket};
use siteflow_build::{OutputInspection, StepProgress, SystemRunner, validate_repository_url};
use siteflow_cloud::{HostingProvider, ProvisionOutcome, validate_bucket_name};
use std::cell::RefCell;

fn phase_message(phase: &DeployPhase) -> String {
    match phase {
        DeployPhase::Provisioning { bucket } => format!("Preparing bucket {}", bucket),
        DeployPhase::Cloning { repository } => format!("Cloning {}", repository),
        DeployPhase::Detecting => "Detecting framework".to_string(),
        DeployPhase::Building { framework } => format!("Building {} project", framework),
        DeployPhase::Publishing { output_dir } => {
            format!("Uploading {}", output_dir.display())
        }
        DeployPhase::Recording => "Recording deploy".to_string(),
    }
}

pub struct DeployOptions {
    pub bucket: Option<String>,
    pub branch: Option<String>,
    pub keep_workdir: bool,
    pub debug: bool,
}

const LISTED_SCRIPTS: usize = 5;

fn print_inspection(inspection: &OutputInspection) {
    println!();
    println!("{}", "Build output:".bold());
    match inspection.index_size {
        Some(size) => {
            println!("  index.html size: {} bytes", size);
            println!("  index.html has root element: {}", inspection.has_mount_point);
            println!("  index.html has script imports: {}", inspection.has_script_imports);
        }
        None => {
            println!("  no index.html; top-level entries:");
            for entry in &inspection.entries {
                println!("    - {}", entry);
            }
        }
    }
    println!(
        "  {} top-level JavaScript files",
        inspection.scripts.len()
    );
    for script in inspection.scripts.iter().take(LISTED_SCRIPTS) {
        println!("    - {}", script);
    }
}

pub async fn handle(app: &AppContext, repository: String, options: DeployOptions) -> Result<()> {
    let DeployOptions {
        bucket,
        branch,
        keep_workdir,
        debug,
    } = options;

    validate_repository_url(&repository)?;
    if let Some(name) = &bucket {
        validate_bucket_name(name)?;
    }

    let bucket = choose_bucket(&app.ledger, bucket.as_deref(), || {
        app.generate_bucket_name()
    })
    .await?;
    let provider = app.provider().await?;

    println!("{}", "Deploying...".yellow());
    println!("Repository: {}", repository.cyan());
    if let Some(branch) = &branch {
        println!("Branch:     {}", branch.cyan());
    }
    println!("Bucket:     {} ({})", bucket.cyan(), provider.region());
    println!();

    let request = DeployRequest {
        repository,
        branch,
        keep_workdir: keep_workdir || app.settings.keep_workdir,
    };

    // One spinner per phase; the previous one is finished when the next starts
    let current: RefCell<Option<(StepProgress, String)>> = RefCell::new(None);
    let on_phase = |phase: DeployPhase| {
        let message = phase_message(&phase);
        let previous = current.borrow_mut().take();
        if let Some((progress, done)) = previous {
            progress.finish_success(&done);
        }
        *current.borrow_mut() = Some((StepProgress::new(&message), message));
    };

    let runner = SystemRunner;
    let result = Workflow::new(&provider, &runner, &app.ledger)
        .with_concurrency(app.settings.upload_concurrency)
        .deploy(&request, &bucket, &on_phase)
        .await;

    let last = current.borrow_mut().take();
    if let Some((progress, message)) = last {
        match &result {
            Ok(outcome) if outcome.report.is_success() => progress.finish_success(&message),
            _ => progress.finish_error(&message),
        }
    }
    let outcome = result?;

    if let Some(path) = &outcome.workdir {
        println!("Work directory kept at {}", path.display());
    }

    if debug {
        print_inspection(&outcome.inspection);
    }
    if outcome.inspection.index_looks_small() {
        eprintln!(
            "{} index.html seems unusually small",
            "Warning:".yellow().bold()
        );
    }

    let report = outcome.report;
    if !report.is_success() {
        println!();
        println!(
            "{}",
            format!("{} objects failed to upload:", report.failed.len())
                .red()
                .bold()
        );
        for failed in &report.failed {
            println!("  ✗ {}: {}", failed.key, failed.error);
        }
        return Err(report.into());
    }

    if outcome.provisioned == ProvisionOutcome::Created {
        println!("  ✓ Created bucket {}", outcome.bucket);
    }
    println!();
    println!(
        "{} {} project, {} objects ({} bytes) in {}ms",
        "✓ Deployed".green().bold(),
        outcome.framework,
        report.uploaded.len(),
        report.uploaded_bytes(),
        report.duration_ms
    );
    println!("Website: {}", outcome.website_url.cyan());
    Ok(())
}
