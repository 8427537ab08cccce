pub mod analysis;
pub mod args;
pub mod portfolio;
mod registry;

pub use analysis::{ExposureSummaryTool, SectorAnalysisTool};
pub use portfolio::{CompanyDetailsTool, QueryPortfolioTool};
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, Tool, ToolRegistry,
};

use crate::protocol::{CallToolResult, ToolContent};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tariffscope_core::{PortfolioEngine, ToolResponse};

/// Registry holding the four portfolio tools, all sharing one engine
pub fn portfolio_registry(engine: PortfolioEngine) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(QueryPortfolioTool::new(engine.clone())));
    registry.register(Arc::new(CompanyDetailsTool::new(engine.clone())));
    registry.register(Arc::new(SectorAnalysisTool::new(engine.clone())));
    registry.register(Arc::new(ExposureSummaryTool::new(engine)));
    registry
}

/// Wrap an engine response as an MCP tool result
///
/// The JSON is sent both as text content and as structured content; failed
/// operations set `isError`.
pub(crate) fn to_call_result<T: Serialize>(response: &ToolResponse<T>) -> Result<CallToolResult> {
    let structured = serde_json::to_value(response)?;
    let text = serde_json::to_string_pretty(&structured)?;

    Ok(CallToolResult {
        content: vec![ToolContent::text(text)],
        structured_content: Some(structured),
        is_error: if response.is_success() { None } else { Some(true) },
    })
}
