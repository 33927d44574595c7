use super::print_record_with_presence;
use colored::Colorize;
use siteflow::{AppContext, Result};
use siteflow_cloud::{Presence, bucket_presence};
use siteflow_cloud_aws::S3HostingProvider;
use std::collections::BTreeMap;

/// Live state of every active record; everything is `Unknown` without a session
async fn check_active(app: &AppContext, ids: &[(&str, &str)]) -> BTreeMap<String, Presence> {
    let mut presence = BTreeMap::new();
    if ids.is_empty() {
        return presence;
    }

    let session = match app.session().await {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!(
                "{} live status unavailable: {}",
                "Warning:".yellow().bold(),
                e
            );
            None
        }
    };

    for (id, region) in ids {
        let state = match &session {
            Some(session) => {
                let provider = S3HostingProvider::new(&session.for_region(region));
                bucket_presence(&provider, id).await
            }
            None => Presence::Unknown,
        };
        presence.insert(id.to_string(), state);
    }
    presence
}

pub async fn handle(app: &AppContext) -> Result<()> {
    let read = app.ledger.load_lenient().await;
    if let Some(problem) = &read.corruption {
        eprintln!(
            "{} ledger could not be read, showing nothing: {}",
            "Warning:".yellow().bold(),
            problem
        );
    }

    let records = read.ledger.list();
    if records.is_empty() {
        println!("No tracked resources.");
        return Ok(());
    }

    let active: Vec<(&str, &str)> = records
        .iter()
        .filter(|r| r.is_active())
        .map(|r| (r.id.as_str(), r.region.as_str()))
        .collect();
    let presence = check_active(app, &active).await;

    println!("{}", format!("Tracked resources ({}):", records.len()).bold());
    for record in records {
        print_record_with_presence(record, presence.get(&record.id).copied());
    }

    let missing = presence.values().filter(|p| **p == Presence::Missing).count();
    if missing > 0 {
        println!();
        println!(
            "{}",
            format!("{} tracked buckets no longer exist", missing).yellow()
        );
    }
    Ok(())
}
