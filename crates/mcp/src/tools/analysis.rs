// Aggregate tools: sector breakdown and portfolio-wide exposure

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::args;
use crate::tools::{json_schema_object, json_schema_string, to_call_result, Tool};
use anyhow::Result;
use tariffscope_core::engine::ops;
use tariffscope_core::PortfolioEngine;

/// Tool to aggregate holdings by sector
pub struct SectorAnalysisTool {
    engine: PortfolioEngine,
}

impl SectorAnalysisTool {
    pub fn new(engine: PortfolioEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Tool for SectorAnalysisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: ops::SECTOR_ANALYSIS.to_string(),
            title: Some("Get Sector Analysis".to_string()),
            description: "Analyze portfolio holdings by sector: company counts, investment, \
                revenue, COGS, tariff-affected COGS, average exposure, importer counts and the \
                five most exposed companies per sector. Leave sector empty for all sectors."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "sector": json_schema_string("Exact sector to analyze. Empty string for all sectors.")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let response = match args::sector_argument(&arguments) {
            Ok(sector) => self.engine.sector_analysis(&sector),
            Err(err) => self.engine.rejected(ops::SECTOR_ANALYSIS, err),
        };

        to_call_result(&response)
    }
}

/// Tool to summarise tariff exposure across the whole portfolio
pub struct ExposureSummaryTool {
    engine: PortfolioEngine,
}

impl ExposureSummaryTool {
    pub fn new(engine: PortfolioEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Tool for ExposureSummaryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: ops::EXPOSURE_SUMMARY.to_string(),
            title: Some("Get Tariff Exposure Summary".to_string()),
            description: "Get a summary of tariff exposure across the entire portfolio: totals, \
                exposure level breakdown, the ten most exposed companies and sectors ranked by \
                exposure. Takes no parameters."
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        to_call_result(&self.engine.exposure_summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tariffscope_core::Portfolio;

    fn engine() -> PortfolioEngine {
        PortfolioEngine::new(Arc::new(Portfolio::embedded().unwrap()))
    }

    #[tokio::test]
    async fn test_sector_analysis_all_sectors() {
        let tool = SectorAnalysisTool::new(engine());
        let result = tool
            .execute(serde_json::json!({"sector": ""}))
            .await
            .unwrap();

        let body = result.structured_content.unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["sector_count"], 10);

        let total: u64 = body["sectors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["company_count"].as_u64().unwrap())
            .sum();
        assert_eq!(total, 60);
    }

    #[tokio::test]
    async fn test_sector_analysis_unknown_sector() {
        let tool = SectorAnalysisTool::new(engine());
        let result = tool
            .execute(serde_json::json!({"sector": "Crypto"}))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.structured_content.unwrap()["status"], "not_found");
    }

    #[tokio::test]
    async fn test_exposure_summary_shape() {
        let tool = ExposureSummaryTool::new(engine());
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        let body = result.structured_content.unwrap();

        let breakdown = &body["exposure_level_breakdown"];
        let sum: u64 = ["high", "medium", "low", "none"]
            .iter()
            .map(|k| breakdown[*k].as_u64().unwrap())
            .sum();
        assert_eq!(sum, body["portfolio_overview"]["total_companies"].as_u64().unwrap());
        assert_eq!(body["top_exposed_companies"].as_array().unwrap().len(), 10);

        let ranking: Vec<f64> = body["sector_exposure_ranking"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["exposure_pct"].as_f64().unwrap())
            .collect();
        assert!(ranking.windows(2).all(|w| w[0] >= w[1]));
    }
}
