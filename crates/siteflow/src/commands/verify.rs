use super::print_record;
use colored::Colorize;
use siteflow::{AppContext, Result, authenticate};

pub async fn handle(app: &AppContext) -> Result<()> {
    println!("{}", "Verifying credentials...".yellow());

    let session = app.session().await?;
    println!("Credential source: {}", session.source().to_string().cyan());
    println!("Region: {}", session.region().cyan());

    let provider = siteflow_cloud_aws::S3HostingProvider::new(&session);
    let status = authenticate(&provider).await?;

    if let Some(identity) = &status.identity {
        println!("  ✓ Authenticated");
        println!("    Account: {}", identity.account_id);
        println!("    ARN:     {}", identity.arn);
    }

    let read = app.ledger.load_lenient().await;
    if let Some(problem) = &read.corruption {
        println!("  {} {}", "⚠".yellow(), problem);
    }

    let active = read.ledger.active();
    println!();
    println!("{}", format!("Tracked resources ({}):", active.len()).bold());
    for record in active {
        print_record(record);
    }
    Ok(())
}
