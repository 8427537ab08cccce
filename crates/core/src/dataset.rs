// Portfolio table: loaded once, validated, then shared read-only

use crate::error::DatasetError;
use crate::types::CompanyRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;

/// Dataset compiled into the binary, used when no path is configured
pub const EMBEDDED_DATASET: &str = include_str!("../data/portfolio.json");

/// Immutable in-memory company table
///
/// Rows keep the order they were loaded in; every "first match" and stable
/// sort in the engine is defined against that order.
#[derive(Debug, Clone)]
pub struct Portfolio {
    companies: Vec<CompanyRecord>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl Portfolio {
    /// Build a table from already-parsed records, validating every row
    pub fn new(companies: Vec<CompanyRecord>, source: impl Into<String>) -> Result<Self, DatasetError> {
        validate(&companies)?;

        Ok(Self {
            companies,
            source: source.into(),
            loaded_at: Utc::now(),
        })
    }

    /// Parse a JSON array of company records
    pub fn from_json_str(json: &str, source: impl Into<String>) -> Result<Self, DatasetError> {
        let companies: Vec<CompanyRecord> = serde_json::from_str(json)?;
        Self::new(companies, source)
    }

    /// Load the dataset compiled into the crate
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json_str(EMBEDDED_DATASET, "embedded:portfolio.json")
    }

    /// Load a dataset file from disk
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let portfolio = Self::from_json_str(&content, path.display().to_string())?;
        tracing::info!(
            "Loaded {} companies from {}",
            portfolio.len(),
            path.display()
        );
        Ok(portfolio)
    }

    /// Load from `path` when given, otherwise the embedded dataset
    pub fn load(path: Option<&Path>) -> Result<Self, DatasetError> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let portfolio = Self::embedded()?;
                tracing::info!("Loaded {} companies from embedded dataset", portfolio.len());
                Ok(portfolio)
            }
        }
    }

    pub fn companies(&self) -> &[CompanyRecord] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Distinct sector names, in first-seen order
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.companies
            .iter()
            .map(|c| c.sector.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

fn validate(companies: &[CompanyRecord]) -> Result<(), DatasetError> {
    let mut tickers = HashSet::with_capacity(companies.len());

    for (row, company) in companies.iter().enumerate() {
        if company.ticker.trim().is_empty() {
            return Err(DatasetError::EmptyTicker(row));
        }
        if !tickers.insert(company.ticker.as_str()) {
            return Err(DatasetError::DuplicateTicker(company.ticker.clone()));
        }

        let amounts = [
            ("investment_usd", company.investment_usd),
            ("revenue_usd", company.revenue_usd),
            ("cogs_usd", company.cogs_usd),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(company, field, value));
            }
        }

        let fractions = [
            ("gross_margin_pct", company.gross_margin_pct),
            ("affected_cogs_pct", company.affected_cogs_pct),
            ("confidence", company.confidence),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(company, field, value));
            }
        }
    }

    Ok(())
}

fn invalid(company: &CompanyRecord, field: &'static str, value: f64) -> DatasetError {
    DatasetError::InvalidField {
        ticker: company.ticker.clone(),
        field,
        value,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::company;
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_dataset_loads() {
        let portfolio = Portfolio::embedded().unwrap();
        assert_eq!(portfolio.len(), 60);
        assert_eq!(portfolio.sectors().len(), 10);
        assert_eq!(portfolio.companies()[0].ticker, "APEX0");
    }

    #[test]
    fn test_load_from_path() {
        let records = vec![company("AAA1", "Energy", 0.1), company("BBB2", "Energy", 0.2)];
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&records).unwrap().as_bytes())
            .unwrap();

        let portfolio = Portfolio::load(Some(file.path())).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.source(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Portfolio::from_path(Path::new("/nonexistent/portfolio.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = Portfolio::from_json_str("[{\"ticker\": 1}]", "test").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }

    #[test]
    fn test_duplicate_ticker_rejected() {
        let records = vec![company("DUP1", "Energy", 0.1), company("DUP1", "Materials", 0.2)];
        let err = Portfolio::new(records, "test").unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateTicker(t) if t == "DUP1"));
    }

    #[test]
    fn test_empty_ticker_rejected() {
        let records = vec![company("OK1", "Energy", 0.1), company("  ", "Energy", 0.1)];
        let err = Portfolio::new(records, "test").unwrap_err();
        assert!(matches!(err, DatasetError::EmptyTicker(1)));
    }

    #[test]
    fn test_out_of_range_fraction_rejected() {
        let mut bad = company("BAD1", "Energy", 0.1);
        bad.affected_cogs_pct = 1.5;
        let err = Portfolio::new(vec![bad], "test").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidField { field: "affected_cogs_pct", .. }
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut bad = company("BAD2", "Energy", 0.1);
        bad.revenue_usd = -1.0;
        assert!(Portfolio::new(vec![bad], "test").is_err());
    }

    #[test]
    fn test_cogs_above_revenue_allowed() {
        let mut odd = company("ODD1", "Energy", 0.1);
        odd.cogs_usd = odd.revenue_usd * 2.0;
        assert!(Portfolio::new(vec![odd], "test").is_ok());
    }

    #[test]
    fn test_sectors_first_seen_order() {
        let records = vec![
            company("A1", "Utilities", 0.0),
            company("B2", "Energy", 0.1),
            company("C3", "Utilities", 0.0),
        ];
        let portfolio = Portfolio::new(records, "test").unwrap();
        assert_eq!(portfolio.sectors(), vec!["Utilities", "Energy"]);
    }
}
