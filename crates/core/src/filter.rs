// Filter engine: conjunction of optional predicates over the table

use crate::types::{CompanyRecord, ExposureLevel};
use serde::{Deserialize, Serialize};

/// An optional query parameter
///
/// `Absent` means "no constraint on this dimension". Callers that can only
/// send empty strings are normalised to `Absent` before reaching the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum FilterValue<T> {
    Present(T),
    #[default]
    Absent,
}

impl<T> FilterValue<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            FilterValue::Present(v) => Some(v),
            FilterValue::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, FilterValue::Present(_))
    }

    /// True when absent, otherwise the predicate's verdict
    fn admits(&self, predicate: impl FnOnce(&T) -> bool) -> bool {
        match self {
            FilterValue::Present(v) => predicate(v),
            FilterValue::Absent => true,
        }
    }
}

impl<T> From<Option<T>> for FilterValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FilterValue::Present(v),
            None => FilterValue::Absent,
        }
    }
}

/// Import-status constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportsFilter {
    /// imports_into_us = true
    Importers,
    /// imports_into_us = false
    NonImporters,
}

impl ImportsFilter {
    /// "yes" / "no"; anything else imposes no constraint
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(ImportsFilter::Importers),
            "no" => Some(ImportsFilter::NonImporters),
            _ => None,
        }
    }

    fn matches(&self, imports_into_us: bool) -> bool {
        match self {
            ImportsFilter::Importers => imports_into_us,
            ImportsFilter::NonImporters => !imports_into_us,
        }
    }
}

/// Predicate set for `query_sp500_portfolio`; all present predicates must hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub sector: FilterValue<String>,
    pub industry: FilterValue<String>,
    pub exposure_level: FilterValue<ExposureLevel>,
    pub imports: FilterValue<ImportsFilter>,
    pub min_revenue: FilterValue<f64>,
    pub max_revenue: FilterValue<f64>,
    pub min_affected_cogs_pct: FilterValue<f64>,
    pub company_name: FilterValue<String>,
    pub ticker: FilterValue<String>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = FilterValue::Present(sector.into());
        self
    }

    pub fn industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = FilterValue::Present(industry.into());
        self
    }

    pub fn exposure_level(mut self, level: ExposureLevel) -> Self {
        self.exposure_level = FilterValue::Present(level);
        self
    }

    pub fn imports(mut self, imports: ImportsFilter) -> Self {
        self.imports = FilterValue::Present(imports);
        self
    }

    pub fn min_revenue(mut self, value: f64) -> Self {
        self.min_revenue = FilterValue::Present(value);
        self
    }

    pub fn max_revenue(mut self, value: f64) -> Self {
        self.max_revenue = FilterValue::Present(value);
        self
    }

    pub fn min_affected_cogs_pct(mut self, value: f64) -> Self {
        self.min_affected_cogs_pct = FilterValue::Present(value);
        self
    }

    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = FilterValue::Present(name.into());
        self
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = FilterValue::Present(ticker.into());
        self
    }

    /// Whether a single record satisfies every present predicate
    pub fn matches(&self, company: &CompanyRecord) -> bool {
        let name_needle = self.company_name.as_option().map(|n| n.to_lowercase());

        self.sector.admits(|s| company.sector == *s)
            && self.industry.admits(|i| company.industry == *i)
            && self.exposure_level.admits(|l| company.exposure_level == *l)
            && self.imports.admits(|f| f.matches(company.imports_into_us))
            && self.min_revenue.admits(|min| company.revenue_usd >= *min)
            && self.max_revenue.admits(|max| company.revenue_usd <= *max)
            && self
                .min_affected_cogs_pct
                .admits(|min| company.affected_cogs_pct >= *min)
            && name_needle
                .as_deref()
                .map_or(true, |n| company.company_name.to_lowercase().contains(n))
            && self.ticker.admits(|t| company.ticker == *t)
    }

    /// Matching subset of `companies`, preserving input order
    pub fn apply<'a>(&self, companies: &'a [CompanyRecord]) -> Vec<&'a CompanyRecord> {
        let matched: Vec<&CompanyRecord> = companies.iter().filter(|c| self.matches(c)).collect();

        tracing::debug!(
            "Filter matched {} of {} companies: {:?}",
            matched.len(),
            companies.len(),
            self
        );

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Portfolio;

    fn portfolio() -> Portfolio {
        Portfolio::embedded().unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let portfolio = portfolio();
        let matched = QueryFilter::new().apply(portfolio.companies());
        assert_eq!(matched.len(), portfolio.len());
    }

    #[test]
    fn test_sector_and_exposure_conjunction() {
        let portfolio = portfolio();
        let filter = QueryFilter::new()
            .sector("Information Technology")
            .exposure_level(ExposureLevel::High);
        let matched = filter.apply(portfolio.companies());

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].ticker, "APEX0");
        assert_eq!(matched[0].company_name, "ApexTech Solutions");
        assert_eq!(matched[0].affected_cogs_pct, 0.45);
    }

    #[test]
    fn test_sector_match_is_case_sensitive() {
        let portfolio = portfolio();
        let matched = QueryFilter::new()
            .sector("information technology")
            .apply(portfolio.companies());
        assert!(matched.is_empty());
    }

    #[test]
    fn test_company_name_is_case_insensitive_substring() {
        let portfolio = portfolio();
        let matched = QueryFilter::new()
            .company_name("APEXTECH")
            .apply(portfolio.companies());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].ticker, "APEX0");
    }

    #[test]
    fn test_ticker_exact_match() {
        let portfolio = portfolio();
        assert_eq!(QueryFilter::new().ticker("APEX0").apply(portfolio.companies()).len(), 1);
        assert!(QueryFilter::new().ticker("APEX").apply(portfolio.companies()).is_empty());
    }

    #[test]
    fn test_imports_filter_partitions_table() {
        let portfolio = portfolio();
        let importers = QueryFilter::new()
            .imports(ImportsFilter::Importers)
            .apply(portfolio.companies());
        let others = QueryFilter::new()
            .imports(ImportsFilter::NonImporters)
            .apply(portfolio.companies());

        assert!(importers.iter().all(|c| c.imports_into_us));
        assert!(others.iter().all(|c| !c.imports_into_us));
        assert_eq!(importers.len() + others.len(), portfolio.len());
    }

    #[test]
    fn test_imports_filter_parse() {
        assert_eq!(ImportsFilter::parse("yes"), Some(ImportsFilter::Importers));
        assert_eq!(ImportsFilter::parse("NO"), Some(ImportsFilter::NonImporters));
        assert_eq!(ImportsFilter::parse("maybe"), None);
        assert_eq!(ImportsFilter::parse(""), None);
    }

    #[test]
    fn test_numeric_bounds_are_inclusive() {
        let portfolio = portfolio();
        let apex = &portfolio.companies()[0];

        let matched = QueryFilter::new()
            .min_revenue(apex.revenue_usd)
            .max_revenue(apex.revenue_usd)
            .min_affected_cogs_pct(apex.affected_cogs_pct)
            .apply(portfolio.companies());

        assert!(matched.iter().any(|c| c.ticker == apex.ticker));
        assert!(matched.iter().all(|c| c.revenue_usd == apex.revenue_usd));
    }

    type Case = (QueryFilter, Box<dyn Fn(&CompanyRecord) -> bool>, usize);

    fn case(
        filter: QueryFilter,
        holds: impl Fn(&CompanyRecord) -> bool + 'static,
        expected: usize,
    ) -> Case {
        (filter, Box::new(holds), expected)
    }

    #[test]
    fn test_results_agree_with_record_fields() {
        let portfolio = portfolio();
        let cases = vec![
            case(
                QueryFilter::new().min_affected_cogs_pct(0.3),
                |c| c.affected_cogs_pct >= 0.3,
                12,
            ),
            case(
                QueryFilter::new().industry("Software").imports(ImportsFilter::Importers),
                |c| c.industry == "Software" && c.imports_into_us,
                1,
            ),
            case(
                QueryFilter::new().exposure_level(ExposureLevel::None),
                |c| c.exposure_level == ExposureLevel::None,
                7,
            ),
            case(
                QueryFilter::new().min_revenue(50e9).max_revenue(100e9),
                |c| (50e9..=100e9).contains(&c.revenue_usd),
                28,
            ),
            case(
                QueryFilter::new().company_name("tech").sector("Health Care"),
                |c| c.company_name.to_lowercase().contains("tech") && c.sector == "Health Care",
                1,
            ),
        ];

        for (filter, holds, expected) in cases {
            let matched = filter.apply(portfolio.companies());
            let by_hand: Vec<&CompanyRecord> =
                portfolio.companies().iter().filter(|c| holds(c)).collect();

            assert_eq!(matched.len(), expected, "{:?}", filter);
            assert_eq!(matched, by_hand, "{:?}", filter);
        }
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let portfolio = portfolio();
        let matched = QueryFilter::new().sector("Crypto").apply(portfolio.companies());
        assert!(matched.is_empty());
    }

    #[test]
    fn test_filter_value_from_option() {
        assert_eq!(FilterValue::from(Some(3)), FilterValue::Present(3));
        assert_eq!(FilterValue::<i32>::from(None), FilterValue::Absent);
    }
}
