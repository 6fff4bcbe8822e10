use anyhow::Result;
use clap::Parser;
use profile_deploy::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(report) => tracing::info!(
            published = report.published(),
            "CLI completed successfully"
        ),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result.map(|_| ())
}
