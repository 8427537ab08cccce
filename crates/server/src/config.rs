use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tariffscope_core::{Portfolio, PortfolioEngine};
use tariffscope_mcp::tools::{portfolio_registry, ToolRegistry};
use tariffscope_mcp::{McpServer, DEFAULT_SERVER_NAME};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub dataset: DatasetSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Name announced in MCP `initialize` and the health check
    #[serde(default = "default_server_name")]
    pub name: String,
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSection {
    /// JSON dataset file; the embedded portfolio is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Apply command-line and environment overrides on top of the file
    pub fn with_overrides(mut self, name: Option<String>, dataset: Option<PathBuf>) -> Self {
        if let Some(name) = name {
            self.server.name = name;
        }
        if dataset.is_some() {
            self.dataset.path = dataset;
        }
        self
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: PortfolioEngine,
    pub mcp: McpServer,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let portfolio = Portfolio::load(config.dataset.path.as_deref())
            .context("Failed to load portfolio dataset")?;
        tracing::info!(
            "Loaded {} companies from {}",
            portfolio.len(),
            portfolio.source()
        );

        Ok(Self::from_portfolio(Arc::new(portfolio), &config.server.name))
    }

    pub fn from_portfolio(portfolio: Arc<Portfolio>, name: &str) -> Self {
        let engine = PortfolioEngine::new(portfolio);
        let mcp = McpServer::new(portfolio_registry(engine.clone()), name);

        Self { engine, mcp }
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.mcp.registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/tariffscope.toml")).unwrap();
        assert_eq!(config.server.name, DEFAULT_SERVER_NAME);
        assert!(config.dataset.path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[dataset]\npath = \"/srv/portfolio.json\"").unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.server.name, DEFAULT_SERVER_NAME);
        assert_eq!(
            config.dataset.path.as_deref(),
            Some(Path::new("/srv/portfolio.json"))
        );
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nname = \"from-file\"").unwrap();

        let config = ServerConfig::load(file.path())
            .unwrap()
            .with_overrides(Some("from-cli".to_string()), None);
        assert_eq!(config.server.name, "from-cli");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nname = ").unwrap();
        assert!(ServerConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_state_from_embedded_dataset() {
        let state = AppState::new(&ServerConfig::default()).unwrap();
        assert_eq!(state.registry().len(), 4);
        assert_eq!(state.mcp.info().name, DEFAULT_SERVER_NAME);
        assert!(!state.engine.portfolio().is_empty());
    }
}
