// Tracing subscriber setup shared by both binaries

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "tariffscope=info,tariffscope_core=info,tariffscope_mcp=info,tower_http=debug";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Where log lines go
///
/// The stdio transport owns stdout, so the MCP binary must log to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing(format: LogFormat, target: LogTarget) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match (format, target) {
        (LogFormat::Plain, LogTarget::Stdout) => builder.init(),
        (LogFormat::Plain, LogTarget::Stderr) => builder.with_writer(std::io::stderr).init(),
        (LogFormat::Json, LogTarget::Stdout) => builder.json().init(),
        (LogFormat::Json, LogTarget::Stderr) => {
            builder.json().with_writer(std::io::stderr).init()
        }
    }
}
