use colored::Colorize;
use siteflow::{AppContext, Result, Workflow, choose_bucket};
use siteflow_build::SystemRunner;
use siteflow_cloud::{HostingProvider, ProvisionOutcome, validate_bucket_name};

pub async fn handle(app: &AppContext, bucket: Option<String>) -> Result<()> {
    if let Some(name) = &bucket {
        validate_bucket_name(name)?;
    }

    let bucket = choose_bucket(&app.ledger, bucket.as_deref(), || {
        app.generate_bucket_name()
    })
    .await?;
    let provider = app.provider().await?;

    println!("{}", "Preparing hosting bucket...".yellow());
    println!("Bucket: {}", bucket.cyan());
    println!("Region: {}", provider.region().cyan());

    let runner = SystemRunner;
    let provisioned = Workflow::new(&provider, &runner, &app.ledger)
        .init(&bucket)
        .await?;

    match provisioned.outcome {
        ProvisionOutcome::Created => println!("  ✓ Bucket created"),
        ProvisionOutcome::AlreadyTracked => println!("  ℹ Bucket is already tracked"),
    }

    println!();
    println!("{}", "✓ Ready".green().bold());
    if let Some(url) = provisioned.record.public_url() {
        println!("Website: {}", url.cyan());
    }
    Ok(())
}
