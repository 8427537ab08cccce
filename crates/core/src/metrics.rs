use crate::types::CompanyRecord;
use serde::{Deserialize, Serialize};

/// Tariff rate applied to affected COGS when estimating impact
pub const TARIFF_RATE: f64 = 0.25;

/// Per-company values derived from raw fields; computed per request, never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub affected_cogs_usd: f64,
    pub potential_tariff_impact_usd: f64,
    /// `None` (serialized as `null`) when COGS is zero
    pub revenue_to_cogs_ratio: Option<f64>,
    pub exposure_risk_score: f64,
}

impl CompanyMetrics {
    pub fn for_company(company: &CompanyRecord) -> Self {
        let affected_cogs_usd = company.affected_cogs_usd();

        let revenue_to_cogs_ratio = if company.cogs_usd > 0.0 {
            Some(company.revenue_usd / company.cogs_usd)
        } else {
            None
        };

        Self {
            affected_cogs_usd,
            potential_tariff_impact_usd: affected_cogs_usd * TARIFF_RATE,
            revenue_to_cogs_ratio,
            exposure_risk_score: company.affected_cogs_pct,
        }
    }
}

/// Arithmetic mean, zero for an empty input
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    ratio(sum, count as f64)
}

/// `numerator / denominator`, zero when the denominator is not positive
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::company;

    #[test]
    fn test_company_metrics() {
        let mut record = company("MET1", "Industrials", 0.3);
        record.revenue_usd = 1_000.0;
        record.cogs_usd = 400.0;

        let metrics = CompanyMetrics::for_company(&record);
        assert!((metrics.affected_cogs_usd - 120.0).abs() < 1e-9);
        assert!((metrics.potential_tariff_impact_usd - 30.0).abs() < 1e-9);
        assert_eq!(metrics.revenue_to_cogs_ratio, Some(2.5));
        assert_eq!(metrics.exposure_risk_score, 0.3);
    }

    #[test]
    fn test_zero_cogs_ratio_is_null() {
        let mut record = company("ZERO1", "Financials", 0.0);
        record.cogs_usd = 0.0;

        let metrics = CompanyMetrics::for_company(&record);
        assert_eq!(metrics.revenue_to_cogs_ratio, None);
        assert_eq!(metrics.affected_cogs_usd, 0.0);

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["revenue_to_cogs_ratio"].is_null());
    }

    #[test]
    fn test_mean_and_ratio_guard_zero() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert!((mean(vec![0.2, 0.4]) - 0.3).abs() < 1e-12);
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 2.0), 2.5);
    }
}
