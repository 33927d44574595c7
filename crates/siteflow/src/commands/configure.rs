use anyhow::Context;
use colored::Colorize;
use siteflow::{AppContext, Result, SiteflowError};
use std::io::{BufRead, Write};

fn prompt(label: &str, default: Option<&str>) -> anyhow::Result<String> {
    match default {
        Some(value) => print!("{} [{}]: ", label, value),
        None => print!("{}: ", label),
    }
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    let value = line.trim();
    Ok(match (value.is_empty(), default) {
        (true, Some(default)) => default.to_string(),
        _ => value.to_string(),
    })
}

pub fn handle(app: &AppContext, access_key_id: Option<String>) -> Result<()> {
    let existing = app.credentials.load().ok().flatten();

    let access_key_id = match access_key_id {
        Some(id) => id,
        None => prompt("AWS access key id", None)?,
    };
    let secret = rpassword::prompt_password("AWS secret access key: ")
        .context("failed to read secret access key")?;

    let default_region = existing
        .map(|c| c.region)
        .or_else(|| app.settings.region.clone());
    let region = match &app.region_override {
        Some(region) => region.clone(),
        None => prompt("Region", default_region.as_deref())?,
    };
    if region.is_empty() {
        return Err(SiteflowError::Config("region is required".to_string()));
    }

    let credentials = app.save_credentials(access_key_id, secret, region)?;

    println!(
        "{} {} ({}) saved to the {} store at {}",
        "✓".green(),
        credentials.masked_access_key_id(),
        credentials.region,
        app.credentials.name(),
        app.paths.root().display()
    );
    Ok(())
}
