// Standalone MCP server binary (stdio transport)

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tariffscope_core::{Portfolio, PortfolioEngine};
use tariffscope_mcp::tools::portfolio_registry;
use tariffscope_mcp::{init_tracing, LogFormat, LogTarget, McpServer, DEFAULT_SERVER_NAME};

#[derive(Parser, Debug)]
#[command(name = "tariffscope-mcp")]
#[command(about = "Portfolio tariff exposure tools over MCP stdio", long_about = None)]
struct Args {
    /// JSON dataset to serve instead of the embedded portfolio
    #[arg(short, long, env = "TARIFFSCOPE_DATASET")]
    dataset: Option<PathBuf>,

    /// Server name announced during initialize
    #[arg(long, env = "TARIFFSCOPE_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    name: String,

    /// Log output format (always written to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format, LogTarget::Stderr);

    tracing::info!("Tariffscope MCP server starting...");

    let portfolio = Arc::new(Portfolio::load(args.dataset.as_deref())?);
    tracing::info!(
        "Loaded {} companies from {}",
        portfolio.len(),
        portfolio.source()
    );

    let registry = portfolio_registry(PortfolioEngine::new(portfolio));
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry, args.name);
    server.start().await?;

    Ok(())
}
