use super::{confirm, print_record};
use colored::Colorize;
use siteflow::{AppContext, Result, SiteflowError, rollback_all};
use siteflow_cloud::{HostingProvider, active_regions};
use siteflow_cloud_aws::S3HostingProvider;

pub async fn handle(app: &AppContext, yes: bool) -> Result<()> {
    let ledger = app.ledger.load().await?;
    let active = ledger.active();
    if active.is_empty() {
        println!("Nothing to roll back.");
        return Ok(());
    }

    println!(
        "{}",
        format!("Buckets to delete ({}):", active.len()).bold()
    );
    for record in &active {
        print_record(record);
    }

    if !yes {
        println!();
        let question = format!(
            "Delete these {} buckets and all their objects?",
            active.len()
        );
        match confirm(&question)? {
            Some(true) => {}
            Some(false) => return Err(anyhow::anyhow!("Rollback cancelled").into()),
            None => {
                return Err(anyhow::anyhow!(
                    "Refusing to delete buckets without confirmation; re-run with --yes"
                )
                .into());
            }
        }
    }

    let session = app.session().await?;
    let providers: Vec<S3HostingProvider> = active_regions(&ledger)
        .iter()
        .map(|region| S3HostingProvider::new(&session.for_region(region)))
        .collect();
    let providers: Vec<&dyn HostingProvider> = providers
        .iter()
        .map(|p| p as &dyn HostingProvider)
        .collect();

    println!();
    println!("{}", "Rolling back...".yellow());
    let result = rollback_all(&app.ledger, &providers).await?;

    for action in &result.succeeded {
        println!("  ✓ {}: {}", action.resource_id, action.message);
    }
    for action in &result.failed {
        println!(
            "  ✗ {}: {}",
            action.resource_id,
            action.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !result.is_success() {
        return Err(SiteflowError::Publish(format!(
            "{} of {} buckets could not be deleted",
            result.failed.len(),
            result.failed.len() + result.succeeded.len()
        )));
    }

    println!();
    println!("{}", "✓ Rollback complete".green().bold());
    Ok(())
}
