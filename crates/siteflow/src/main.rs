mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use siteflow::{AppContext, SiteflowError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str =
    "siteflow=debug,siteflow_config=debug,siteflow_build=debug,siteflow_cloud=debug,siteflow_cloud_aws=debug";

#[derive(Parser)]
#[command(name = "siteflow")]
#[command(about = "Clone, build and publish static sites to S3 website hosting", long_about = None)]
struct Cli {
    /// Debug logging for siteflow crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// AWS region (overrides the configured region)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the destination bucket and record it
    Init {
        /// Bucket name (default: latest tracked bucket or a generated name)
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Check credentials, show the account identity and tracked resources
    Verify,
    /// List tracked resources
    List,
    /// Clone, build and publish a repository
    Deploy {
        /// Repository URL (https://, ssh:// or git@host:owner/repo)
        repository: String,
        /// Destination bucket (default: latest tracked bucket or a new one)
        #[arg(long)]
        bucket: Option<String>,
        /// Branch or tag to deploy
        #[arg(long)]
        branch: Option<String>,
        /// Keep the cloned working directory
        #[arg(long)]
        keep_workdir: bool,
        /// Report details of the build output before it is uploaded
        #[arg(long)]
        debug: bool,
    },
    /// Delete every tracked bucket and its contents
    Rollback {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Store AWS credentials (encrypted at rest)
    Configure {
        /// Access key id (prompted when omitted)
        #[arg(long)]
        access_key_id: Option<String>,
    },
    /// Show version information
    Version,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), SiteflowError> {
    if matches!(cli.command, Commands::Version) {
        println!("siteflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let app = AppContext::load(cli.region)?;

    match cli.command {
        Commands::Init { bucket } => commands::init::handle(&app, bucket).await,
        Commands::Verify => commands::verify::handle(&app).await,
        Commands::List => commands::list::handle(&app).await,
        Commands::Deploy {
            repository,
            bucket,
            branch,
            keep_workdir,
            debug,
        } => {
            let options = commands::deploy::DeployOptions {
                bucket,
                branch,
                keep_workdir,
                debug,
            };
            commands::deploy::handle(&app, repository, options).await
        }
        Commands::Rollback { yes } => commands::rollback::handle(&app, yes).await,
        Commands::Configure { access_key_id } => commands::configure::handle(&app, access_key_id),
        Commands::Version => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}
