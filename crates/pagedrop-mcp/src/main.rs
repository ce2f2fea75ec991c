//! Pagedrop MCP Server
//!
//! Model Context Protocol server that deploys HTML pages to object storage.
//! Run with: PAGEDROP_BUCKET=xxx PAGEDROP_ACCESS_KEY_ID=xxx PAGEDROP_SECRET_ACCESS_KEY=xxx pagedrop-mcp
//! or point it at a YAML file with --config.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagedrop_core::{write_sample_config, ServerConfig};
use pagedrop_mcp::{init_tracing, PagedropService, Publisher};
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;

#[derive(Parser)]
#[command(name = "pagedrop-mcp", about = "MCP server that deploys HTML pages to object storage")]
struct Cli {
    /// Path to a YAML configuration file (overrides PAGEDROP_* variables)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample configuration file and exit
    SampleConfig {
        /// Output path
        #[arg(default_value = "config.yaml.sample")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::SampleConfig { path }) = cli.command {
        write_sample_config(&path)
            .with_context(|| format!("Failed to write sample config to {}", path.display()))?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    let config = ServerConfig::load(cli.config.as_deref()).context(
        "Failed to load configuration. Set PAGEDROP_* environment variables or pass --config",
    )?;

    init_tracing(&config.log_level);
    tracing::info!(
        provider = %config.storage.provider,
        bucket = %config.storage.bucket,
        base_path = %config.storage.base_path,
        "Starting pagedrop MCP server"
    );

    let publisher = Publisher::new(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    let service = PagedropService::new(publisher);
    let running = service.serve(stdio()).await.context("MCP transport failed")?;
    running.waiting().await.context("MCP server error")?;

    Ok(())
}
