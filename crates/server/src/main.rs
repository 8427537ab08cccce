use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tariffscope_mcp::{init_tracing, LogFormat, LogTarget};

mod api;
mod config;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "tariffscope")]
#[command(about = "Portfolio tariff exposure tools over MCP (HTTP transport)", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tariffscope.toml")]
    config: PathBuf,

    /// JSON dataset to serve instead of the embedded portfolio
    #[arg(short, long, env = "TARIFFSCOPE_DATASET")]
    dataset: Option<PathBuf>,

    /// Server name announced to MCP clients
    #[arg(long, env = "TARIFFSCOPE_SERVER_NAME")]
    name: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value = "8001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format, LogTarget::Stdout);

    tracing::info!("Starting Tariffscope portfolio server");

    // Load configuration
    let config = ServerConfig::load(&args.config)?.with_overrides(args.name, args.dataset);

    // Start API server
    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, config).await?;

    Ok(())
}
