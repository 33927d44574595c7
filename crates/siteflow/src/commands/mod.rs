pub mod configure;
pub mod deploy;
pub mod init;
pub mod list;
pub mod rollback;
pub mod verify;

use colored::Colorize;
use siteflow_cloud::{Presence, ResourceRecord, ResourceStatus};
use std::io::{BufRead, IsTerminal, Write};

/// Ask a yes/no question on the terminal; anything but `y`/`yes` is a no.
///
/// Returns `None` when stdin is not a terminal.
pub(crate) fn confirm(question: &str) -> anyhow::Result<Option<bool>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }

    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    let answer = input.trim();
    Ok(Some(
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"),
    ))
}

/// One line per tracked resource, with its URL while it is still served
pub(crate) fn print_record(record: &ResourceRecord) {
    print_record_with_presence(record, None);
}

pub(crate) fn print_record_with_presence(record: &ResourceRecord, presence: Option<Presence>) {
    let status = match record.status {
        ResourceStatus::Active => record.status.to_string().green(),
        ResourceStatus::Deleted => record.status.to_string().dimmed(),
    };
    let live = match presence {
        Some(Presence::Exists) => format!(" live: {}", "exists".green()),
        Some(Presence::Missing) => format!(" live: {}", "missing".red()),
        Some(Presence::Unknown) => format!(" live: {}", "unknown".yellow()),
        None => String::new(),
    };
    println!(
        "  • {} [{}]{} {} ({})",
        record.id.cyan(),
        status,
        live,
        record.kind,
        record.region
    );
    if let Some(url) = record.public_url() {
        println!("    {}", url);
    }
    if let Some(deploy) = &record.last_deploy {
        println!(
            "    last deploy: {} ({}, {} objects) at {}",
            deploy.repository,
            deploy.framework,
            deploy.objects,
            deploy.deployed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
