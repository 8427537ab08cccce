// Sector grouping and portfolio-wide summaries

use crate::dataset::Portfolio;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::metrics::{mean, ratio};
use crate::types::{CompanyRecord, ExposureLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Companies listed per sector summary
pub const SECTOR_TOP_EXPOSED: usize = 5;

/// Companies listed in the portfolio summary
pub const PORTFOLIO_TOP_EXPOSED: usize = 10;

/// Aggregated metrics for one sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSummary {
    pub sector: String,
    pub company_count: usize,
    pub total_investment_usd: f64,
    pub total_revenue_usd: f64,
    pub total_cogs_usd: f64,
    pub total_affected_cogs_usd: f64,
    /// Mean of affected_cogs_pct over the sector's companies
    pub average_exposure_pct: f64,
    /// Affected COGS over total COGS
    pub weighted_exposure_pct: f64,
    pub importers_count: usize,
    pub top_exposed_companies: Vec<CompanyRecord>,
}

/// Totals across the whole table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub total_companies: usize,
    pub total_investment_usd: f64,
    pub total_revenue_usd: f64,
    pub total_cogs_usd: f64,
    pub total_affected_cogs_usd: f64,
    pub overall_exposure_pct: f64,
    pub average_exposure_pct: f64,
    pub importers_count: usize,
}

/// Company count per exposure level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

impl ExposureBreakdown {
    fn record(&mut self, level: ExposureLevel) {
        match level {
            ExposureLevel::High => self.high += 1,
            ExposureLevel::Medium => self.medium += 1,
            ExposureLevel::Low => self.low += 1,
            ExposureLevel::None => self.none += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.none
    }
}

/// Compact company projection used in the portfolio summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedCompany {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub exposure_level: ExposureLevel,
    pub affected_cogs_pct: f64,
    pub imports_into_us: bool,
}

impl From<&CompanyRecord> for ExposedCompany {
    fn from(company: &CompanyRecord) -> Self {
        Self {
            ticker: company.ticker.clone(),
            company_name: company.company_name.clone(),
            sector: company.sector.clone(),
            exposure_level: company.exposure_level,
            affected_cogs_pct: company.affected_cogs_pct,
            imports_into_us: company.imports_into_us,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorExposure {
    pub sector: String,
    pub exposure_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub portfolio_overview: PortfolioOverview,
    pub exposure_level_breakdown: ExposureBreakdown,
    pub top_exposed_companies: Vec<ExposedCompany>,
    pub sector_exposure_ranking: Vec<SectorExposure>,
}

#[derive(Default)]
struct SectorAccumulator<'a> {
    companies: Vec<&'a CompanyRecord>,
    total_investment: f64,
    total_revenue: f64,
    total_cogs: f64,
    total_affected_cogs: f64,
    importers: usize,
}

impl<'a> SectorAccumulator<'a> {
    fn add(&mut self, company: &'a CompanyRecord) {
        self.companies.push(company);
        self.total_investment += company.investment_usd;
        self.total_revenue += company.revenue_usd;
        self.total_cogs += company.cogs_usd;
        self.total_affected_cogs += company.affected_cogs_usd();
        if company.imports_into_us {
            self.importers += 1;
        }
    }

    fn into_summary(self, sector: &str) -> SectorSummary {
        let average_exposure_pct = mean(self.companies.iter().map(|c| c.affected_cogs_pct));
        let top_exposed_companies = top_exposed(&self.companies, SECTOR_TOP_EXPOSED)
            .into_iter()
            .cloned()
            .collect();

        SectorSummary {
            sector: sector.to_string(),
            company_count: self.companies.len(),
            total_investment_usd: self.total_investment,
            total_revenue_usd: self.total_revenue,
            total_cogs_usd: self.total_cogs,
            total_affected_cogs_usd: self.total_affected_cogs,
            average_exposure_pct,
            weighted_exposure_pct: ratio(self.total_affected_cogs, self.total_cogs),
            importers_count: self.importers,
            top_exposed_companies,
        }
    }
}

/// Group `companies` by sector, keyed by name
fn group_by_sector<'a>(
    companies: impl IntoIterator<Item = &'a CompanyRecord>,
) -> BTreeMap<&'a str, SectorAccumulator<'a>> {
    let mut groups: BTreeMap<&str, SectorAccumulator> = BTreeMap::new();
    for company in companies {
        groups.entry(company.sector.as_str()).or_default().add(company);
    }
    groups
}

/// Highest affected_cogs_pct first; ties keep table order
fn top_exposed<'a>(companies: &[&'a CompanyRecord], n: usize) -> Vec<&'a CompanyRecord> {
    let mut ranked = companies.to_vec();
    ranked.sort_by(|a, b| b.affected_cogs_pct.total_cmp(&a.affected_cogs_pct));
    ranked.truncate(n);
    ranked
}

/// Per-sector summaries, largest total investment first
///
/// A present sector that matches no row is reported as `NotFound`; sector
/// names are compared exactly, like the filter engine does.
pub fn sector_analysis(
    portfolio: &Portfolio,
    sector: &FilterValue<String>,
) -> QueryResult<Vec<SectorSummary>> {
    let selected = portfolio
        .companies()
        .iter()
        .filter(|c| sector.as_option().map_or(true, |s| c.sector == *s));

    let groups = group_by_sector(selected);

    if let FilterValue::Present(name) = sector {
        if groups.is_empty() {
            return Err(QueryError::not_found(format!(
                "No companies found in sector '{}'",
                name
            )));
        }
    }

    let mut summaries: Vec<SectorSummary> = groups
        .into_iter()
        .map(|(name, acc)| acc.into_summary(name))
        .collect();
    summaries.sort_by(|a, b| b.total_investment_usd.total_cmp(&a.total_investment_usd));

    Ok(summaries)
}

/// Portfolio-wide exposure summary
///
/// Totals, level counts and sector groups are gathered in one pass; the top
/// exposed list is a separate ranking over the table.
pub fn portfolio_summary(portfolio: &Portfolio) -> PortfolioSummary {
    let companies = portfolio.companies();

    let mut breakdown = ExposureBreakdown::default();
    let mut sectors: BTreeMap<&str, SectorAccumulator> = BTreeMap::new();
    let mut exposure_sum = 0.0;
    let mut total_investment = 0.0;
    let mut total_revenue = 0.0;
    let mut total_cogs = 0.0;
    let mut total_affected_cogs = 0.0;
    let mut importers = 0;

    for company in companies {
        breakdown.record(company.exposure_level);
        total_investment += company.investment_usd;
        total_revenue += company.revenue_usd;
        total_cogs += company.cogs_usd;
        total_affected_cogs += company.affected_cogs_usd();
        if company.imports_into_us {
            importers += 1;
        }
        exposure_sum += company.affected_cogs_pct;
        sectors.entry(company.sector.as_str()).or_default().add(company);
    }

    let mut sector_exposure_ranking: Vec<SectorExposure> = sectors
        .into_iter()
        .map(|(sector, acc)| SectorExposure {
            sector: sector.to_string(),
            exposure_pct: ratio(acc.total_affected_cogs, acc.total_cogs),
        })
        .collect();
    sector_exposure_ranking.sort_by(|a, b| b.exposure_pct.total_cmp(&a.exposure_pct));

    let all: Vec<&CompanyRecord> = companies.iter().collect();
    let top_exposed_companies = top_exposed(&all, PORTFOLIO_TOP_EXPOSED)
        .into_iter()
        .map(ExposedCompany::from)
        .collect();

    PortfolioSummary {
        portfolio_overview: PortfolioOverview {
            total_companies: companies.len(),
            total_investment_usd: total_investment,
            total_revenue_usd: total_revenue,
            total_cogs_usd: total_cogs,
            total_affected_cogs_usd: total_affected_cogs,
            overall_exposure_pct: ratio(total_affected_cogs, total_cogs),
            average_exposure_pct: ratio(exposure_sum, companies.len() as f64),
            importers_count: importers,
        },
        exposure_level_breakdown: breakdown,
        top_exposed_companies,
        sector_exposure_ranking,
    }
}
