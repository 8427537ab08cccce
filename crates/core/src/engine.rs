//! Query engine: the four portfolio operations over a shared, read-only table.
//!
//! Every operation is a pure read of the injected [`Portfolio`]. The engine is
//! cheap to clone and safe to call from any number of tasks at once.

use crate::aggregation::{self, PortfolioSummary, SectorSummary};
use crate::dataset::Portfolio;
use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterValue, QueryFilter};
use crate::metrics::CompanyMetrics;
use crate::sort::{sort_and_limit, QueryOptions};
use crate::types::{CompanyRecord, RequestId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Operation names as exposed to callers
pub mod ops {
    pub const QUERY_PORTFOLIO: &str = "query_sp500_portfolio";
    pub const COMPANY_DETAILS: &str = "get_company_details";
    pub const SECTOR_ANALYSIS: &str = "get_sector_analysis";
    pub const EXPOSURE_SUMMARY: &str = "get_exposure_summary";
}

/// Response envelope shared by all operations
///
/// Serializes flat: `request_id`, `status`, the body's fields, then
/// `processing_time_ms`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse<T> {
    pub request_id: RequestId,
    pub status: String,
    #[serde(flatten)]
    pub body: ResponseBody<T>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody<T> {
    Success(T),
    Failure { message: String },
}

impl<T> ToolResponse<T> {
    fn new(request_id: RequestId, outcome: QueryResult<T>, processing_time_ms: f64) -> Self {
        let (status, body) = match outcome {
            Ok(value) => ("success".to_string(), ResponseBody::Success(value)),
            Err(err) => (
                err.status().to_string(),
                ResponseBody::Failure {
                    message: err.message().to_string(),
                },
            ),
        };

        Self {
            request_id,
            status,
            body,
            processing_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match &self.body {
            ResponseBody::Success(value) => Some(value),
            ResponseBody::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Success(_) => None,
            ResponseBody::Failure { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyList {
    pub total_matches: usize,
    pub returned_count: usize,
    pub companies: Vec<CompanyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetails {
    pub company: CompanyRecord,
    pub calculated_metrics: CompanyMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAnalysis {
    pub sector_count: usize,
    pub sectors: Vec<SectorSummary>,
}

/// Lookup keys for a single company; at least one must be present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyLookup {
    pub ticker: FilterValue<String>,
    pub company_name: FilterValue<String>,
}

impl CompanyLookup {
    pub fn by_ticker(ticker: impl Into<String>) -> Self {
        Self {
            ticker: FilterValue::Present(ticker.into()),
            company_name: FilterValue::Absent,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            ticker: FilterValue::Absent,
            company_name: FilterValue::Present(name.into()),
        }
    }
}

#[derive(Clone)]
pub struct PortfolioEngine {
    portfolio: Arc<Portfolio>,
}

impl PortfolioEngine {
    pub fn new(portfolio: Arc<Portfolio>) -> Self {
        Self { portfolio }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Filter, sort and truncate the table
    pub fn query_portfolio(
        &self,
        filter: &QueryFilter,
        options: &QueryOptions,
    ) -> ToolResponse<CompanyList> {
        self.run(ops::QUERY_PORTFOLIO, || {
            let matched = filter.apply(self.portfolio.companies());
            let page = sort_and_limit(matched, options)?;

            tracing::info!(
                "Returned {} of {} matches",
                page.returned_count(),
                page.total_matches
            );

            Ok(CompanyList {
                total_matches: page.total_matches,
                returned_count: page.returned_count(),
                companies: page.companies.into_iter().cloned().collect(),
            })
        })
    }

    /// One company plus its derived metrics
    pub fn company_details(&self, lookup: &CompanyLookup) -> ToolResponse<CompanyDetails> {
        self.run(ops::COMPANY_DETAILS, || {
            let company = self.find_company(lookup)?;
            tracing::info!("Found: {} ({})", company.company_name, company.ticker);

            Ok(CompanyDetails {
                company: company.clone(),
                calculated_metrics: CompanyMetrics::for_company(company),
            })
        })
    }

    /// Per-sector aggregates, optionally for a single sector
    pub fn sector_analysis(&self, sector: &FilterValue<String>) -> ToolResponse<SectorAnalysis> {
        self.run(ops::SECTOR_ANALYSIS, || {
            let sectors = aggregation::sector_analysis(&self.portfolio, sector)?;
            tracing::info!("Analyzed {} sectors", sectors.len());

            Ok(SectorAnalysis {
                sector_count: sectors.len(),
                sectors,
            })
        })
    }

    /// Portfolio-wide exposure overview
    pub fn exposure_summary(&self) -> ToolResponse<PortfolioSummary> {
        self.run(ops::EXPOSURE_SUMMARY, || {
            let summary = aggregation::portfolio_summary(&self.portfolio);
            tracing::info!(
                "Portfolio: {} companies, {} importers",
                summary.portfolio_overview.total_companies,
                summary.portfolio_overview.importers_count
            );
            Ok(summary)
        })
    }

    /// Failure envelope for a call whose arguments never reached the engine
    pub fn rejected<T>(&self, op: &str, err: QueryError) -> ToolResponse<T> {
        self.run(op, || Err(err))
    }

    /// Exact ticker first, then the first case-insensitive name match in table order
    pub fn find_company(&self, lookup: &CompanyLookup) -> QueryResult<&CompanyRecord> {
        if !lookup.ticker.is_present() && !lookup.company_name.is_present() {
            return Err(QueryError::invalid_argument(
                "Must provide either ticker or company_name",
            ));
        }

        let companies = self.portfolio.companies();

        if let FilterValue::Present(ticker) = &lookup.ticker {
            if let Some(company) = companies.iter().find(|c| c.ticker == *ticker) {
                return Ok(company);
            }
        }

        if let FilterValue::Present(name) = &lookup.company_name {
            let needle = name.to_lowercase();
            let mut matches = companies
                .iter()
                .filter(|c| c.company_name.to_lowercase().contains(&needle));

            if let Some(company) = matches.next() {
                let others = matches.count();
                if others > 0 {
                    tracing::debug!(
                        "Name '{}' matched {} more companies; using {}",
                        name,
                        others,
                        company.ticker
                    );
                }
                return Ok(company);
            }
        }

        Err(QueryError::not_found(format!(
            "No company found matching ticker='{}' or name='{}'",
            lookup.ticker.as_option().map(String::as_str).unwrap_or(""),
            lookup.company_name.as_option().map(String::as_str).unwrap_or("")
        )))
    }

    fn run<T>(&self, op: &str, f: impl FnOnce() -> QueryResult<T>) -> ToolResponse<T> {
        let request_id = RequestId::new();
        let started = Instant::now();

        let span = tracing::info_span!("tool", op, request_id = %request_id);
        let _guard = span.enter();

        tracing::info!("Tool called: {}", op);

        let outcome = f();
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => tracing::info!("Tool succeeded: {} ({:.3}s)", op, elapsed.as_secs_f64()),
            Err(err) => tracing::warn!("Tool failed: {} ({:.3}s): {}", op, elapsed.as_secs_f64(), err),
        }

        let processing_time_ms = (elapsed.as_secs_f64() * 100_000.0).round() / 100.0;
        ToolResponse::new(request_id, outcome, processing_time_ms)
    }
}
