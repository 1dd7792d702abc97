use anyhow::Result;
use clap::{Parser, Subcommand};
use meetsink::app;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meetsink")]
#[command(about = "Meeting-record ingestion service", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print version information
    Version,
    /// Provision record tables and the aggregate ledger ahead of traffic
    Init,
    /// Check storage accessibility and report per-table row counts
    Diagnose,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("meetsink {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Init) => {
            app::run_init()?;
            return Ok(());
        }
        Some(CliCommand::Diagnose) => {
            app::run_diagnose()?;
            return Ok(());
        }
        None => {}
    }

    app::run_service().await
}
