// Sort/limit stage for list-style queries

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::types::CompanyRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Result count when the caller does not ask for one
pub const DEFAULT_LIMIT: usize = 20;

/// Field a list query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    RevenueUsd,
    InvestmentUsd,
    CogsUsd,
    GrossMarginPct,
    AffectedCogsPct,
    Confidence,
    Ticker,
    CompanyName,
    Sector,
    Industry,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::RevenueUsd,
        SortField::InvestmentUsd,
        SortField::CogsUsd,
        SortField::GrossMarginPct,
        SortField::AffectedCogsPct,
        SortField::Confidence,
        SortField::Ticker,
        SortField::CompanyName,
        SortField::Sector,
        SortField::Industry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::RevenueUsd => "revenue_usd",
            SortField::InvestmentUsd => "investment_usd",
            SortField::CogsUsd => "cogs_usd",
            SortField::GrossMarginPct => "gross_margin_pct",
            SortField::AffectedCogsPct => "affected_cogs_pct",
            SortField::Confidence => "confidence",
            SortField::Ticker => "ticker",
            SortField::CompanyName => "company_name",
            SortField::Sector => "sector",
            SortField::Industry => "industry",
        }
    }

    /// Ascending comparison of two records on this field
    pub fn compare(&self, a: &CompanyRecord, b: &CompanyRecord) -> Ordering {
        match self {
            SortField::RevenueUsd => a.revenue_usd.total_cmp(&b.revenue_usd),
            SortField::InvestmentUsd => a.investment_usd.total_cmp(&b.investment_usd),
            SortField::CogsUsd => a.cogs_usd.total_cmp(&b.cogs_usd),
            SortField::GrossMarginPct => a.gross_margin_pct.total_cmp(&b.gross_margin_pct),
            SortField::AffectedCogsPct => a.affected_cogs_pct.total_cmp(&b.affected_cogs_pct),
            SortField::Confidence => a.confidence.total_cmp(&b.confidence),
            SortField::Ticker => a.ticker.cmp(&b.ticker),
            SortField::CompanyName => a.company_name.cmp(&b.company_name),
            SortField::Sector => a.sector.cmp(&b.sector),
            SortField::Industry => a.industry.cmp(&b.industry),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        SortField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| {
                QueryError::invalid_argument(format!(
                    "unknown sort field '{}' (expected one of: {})",
                    name,
                    SortField::ALL
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Ordering and truncation options for list queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub sort_by: FilterValue<SortField>,
    pub sort_desc: bool,
    pub limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            sort_by: FilterValue::Absent,
            sort_desc: true,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryOptions {
    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort_by = FilterValue::Present(field);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.sort_desc = false;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Rejects a zero limit; "return everything" is expressed with a large limit
    pub fn validate(&self) -> QueryResult<()> {
        if self.limit == 0 {
            return Err(QueryError::invalid_argument("limit must be at least 1"));
        }
        Ok(())
    }
}

/// Ordered, truncated page of matches
#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub total_matches: usize,
    pub companies: Vec<&'a CompanyRecord>,
}

impl Page<'_> {
    pub fn returned_count(&self) -> usize {
        self.companies.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.returned_count() < self.total_matches
    }
}

/// Stable sort by the requested field, then truncate to `limit`
///
/// Equal keys keep their relative input order in both directions. With no
/// sort field the input order is kept.
pub fn sort_and_limit<'a>(
    mut companies: Vec<&'a CompanyRecord>,
    options: &QueryOptions,
) -> QueryResult<Page<'a>> {
    options.validate()?;

    let total_matches = companies.len();

    if let FilterValue::Present(field) = options.sort_by {
        if options.sort_desc {
            companies.sort_by(|a, b| field.compare(b, a));
        } else {
            companies.sort_by(|a, b| field.compare(a, b));
        }
    }

    companies.truncate(options.limit);

    Ok(Page {
        total_matches,
        companies,
    })
}
