// Company-level tools: filtered listing and single-company details

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::args;
use crate::tools::{
    json_schema_boolean, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, to_call_result, Tool,
};
use anyhow::Result;
use tariffscope_core::engine::ops;
use tariffscope_core::{PortfolioEngine, DEFAULT_LIMIT};

/// Tool to query the portfolio with optional filters
pub struct QueryPortfolioTool {
    engine: PortfolioEngine,
}

impl QueryPortfolioTool {
    pub fn new(engine: PortfolioEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Tool for QueryPortfolioTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: ops::QUERY_PORTFOLIO.to_string(),
            title: Some("Query SP500 Portfolio".to_string()),
            description: "Query the portfolio dataset with flexible filtering. Use for lists of \
                companies by sector, industry, tariff exposure level, import status, revenue or \
                name. All filters are optional; pass an empty string (or 0 for numeric bounds) \
                to skip one. Returns matching companies with all data fields."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "sector": json_schema_string("Exact sector name, e.g. 'Information Technology'. Empty string to skip."),
                    "industry": json_schema_string("Exact industry name, e.g. 'Software'. Empty string to skip."),
                    "exposure_level": json_schema_string("One of 'high', 'medium', 'low', 'none'. Empty string to skip."),
                    "imports_filter": json_schema_string("'yes' for importers, 'no' for non-importers. Empty string to skip."),
                    "min_revenue": json_schema_number("Minimum revenue in USD (inclusive). 0 to skip."),
                    "max_revenue": json_schema_number("Maximum revenue in USD (inclusive). 0 to skip."),
                    "min_affected_cogs_pct": json_schema_number("Minimum fraction of COGS affected by tariffs, 0.0 to 1.0 (inclusive). 0 to skip."),
                    "company_name": json_schema_string("Case-insensitive partial company name. Empty string to skip."),
                    "ticker": json_schema_string("Exact ticker symbol. Empty string to skip."),
                    "limit": json_schema_integer("Maximum number of companies to return (at least 1)", DEFAULT_LIMIT as i64),
                    "sort_by": json_schema_string("Sort field: revenue_usd, investment_usd, cogs_usd, gross_margin_pct, affected_cogs_pct, confidence, ticker, company_name, sector, industry. Empty string keeps dataset order."),
                    "sort_desc": json_schema_boolean("Sort in descending order", true)
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let response = match args::query_arguments(&arguments) {
            Ok((filter, options)) => self.engine.query_portfolio(&filter, &options),
            Err(err) => self.engine.rejected(ops::QUERY_PORTFOLIO, err),
        };

        to_call_result(&response)
    }
}

/// Tool to get one company and its derived metrics
pub struct CompanyDetailsTool {
    engine: PortfolioEngine,
}

impl CompanyDetailsTool {
    pub fn new(engine: PortfolioEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Tool for CompanyDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: ops::COMPANY_DETAILS.to_string(),
            title: Some("Get Company Details".to_string()),
            description: "Get detailed information about one company by ticker or name, with \
                calculated tariff metrics. Provide ticker (exact) or company_name (partial, \
                case-insensitive); at least one must be non-empty. A partial name matching \
                several companies returns the first in dataset order."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ticker": json_schema_string("Company ticker symbol. Empty string if searching by name."),
                    "company_name": json_schema_string("Company name, partial match allowed. Empty string if searching by ticker.")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let response = match args::lookup_arguments(&arguments) {
            Ok(lookup) => self.engine.company_details(&lookup),
            Err(err) => self.engine.rejected(ops::COMPANY_DETAILS, err),
        };

        to_call_result(&response)
    }
}
