/// CLI glue for profile-deploy: command parsing and the async [`run`] entrypoint.
///
/// All publishing logic lives in `profile-deploy-core`; this module only wires
/// configuration, the OSS client and the core pipeline together.
use crate::load_config::{load_config, Overrides};
use crate::oss::OssClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use profile_deploy_core::deploy::{deploy, DeployReport};
use profile_deploy_core::publisher::Publisher;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for profile-deploy: publish managed-config profiles to OSS.
#[derive(Parser)]
#[clap(
    name = "profile-deploy",
    version,
    about = "Publish profile files to OSS with a self-referencing #!MANAGED-CONFIG header"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every file of the source directory
    Deploy {
        /// Directory holding the profile files [default: profiles]
        #[clap(long)]
        dir: Option<PathBuf>,
        /// Optional YAML file with deploy settings
        #[clap(long)]
        config: Option<PathBuf>,
        /// Key prefix inside the bucket [default: profiles]
        #[clap(long)]
        prefix: Option<String>,
        /// Maximum number of uploads in flight [default: 8]
        #[clap(long)]
        concurrency: Option<usize>,
        /// Per-upload timeout in seconds [default: 60]
        #[clap(long)]
        timeout_secs: Option<u64>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<DeployReport> {
    match cli.command {
        Commands::Deploy {
            dir,
            config,
            prefix,
            concurrency,
            timeout_secs,
        } => {
            let overrides = Overrides {
                source_dir: dir,
                key_prefix: prefix,
                max_concurrency: concurrency,
                upload_timeout_secs: timeout_secs,
            };
            let config = load_config(config.as_deref(), &overrides)?;
            tracing::info!(command = "deploy", "Starting deployment");

            let store = OssClient::from_config(&config.storage).await;
            let publisher = Publisher::new(Arc::new(store), config.storage.target.clone());

            match deploy(&config.deploy, &publisher).await {
                Ok(report) => {
                    tracing::info!(
                        command = "deploy",
                        published = report.published(),
                        "Deployment complete"
                    );
                    Ok(report)
                }
                Err(e) => {
                    tracing::error!(command = "deploy", error = %e, "Deployment failed");
                    Err(e.into())
                }
            }
        }
    }
}
